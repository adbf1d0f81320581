//! Name-based routing to in-memory entries and the file system

// crate modules
use crate::error::{Error, Result};
use crate::source::{FileSource, MemorySource, TextSource};

// external crates
use log::debug;
use once_cell::sync::Lazy;

// standard library
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

// Process-wide registry of in-memory files, consulted before the file system
static MEMORY_ENTRIES: Lazy<Mutex<HashMap<String, String>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

/// Register (or replace) an in-memory entry under a source name
///
/// Registered entries shadow on-disk files of the same name in
/// [create_source]. Callers replacing entries that may already have been
/// parsed should also clear any downstream caches.
pub fn register_memory_entry(name: impl Into<String>, content: impl Into<String>) {
    let name = name.into();
    debug!("registering in-memory text entry \"{name}\"");
    MEMORY_ENTRIES
        .lock()
        .expect("text registry mutex poisoned")
        .insert(name, content.into());
}

/// Remove all registered in-memory entries
pub fn clear_memory_entries() {
    MEMORY_ENTRIES
        .lock()
        .expect("text registry mutex poisoned")
        .clear();
}

/// Resolve a source name to a [TextSource]
///
/// Resolution order:
///
/// 1. the in-memory registry,
/// 2. the name as a path (absolute or relative to the working directory),
/// 3. relative to the directory in the `NXTAL_DATADIR` environment variable.
pub fn create_source(name: &str) -> Result<Box<dyn TextSource>> {
    if let Some(content) = MEMORY_ENTRIES
        .lock()
        .expect("text registry mutex poisoned")
        .get(name)
    {
        return Ok(Box::new(MemorySource::new(name, content.clone())));
    }

    if Path::new(name).is_file() {
        return Ok(Box::new(FileSource::open(name)?));
    }

    if let Ok(datadir) = std::env::var("NXTAL_DATADIR") {
        let candidate = PathBuf::from(datadir).join(name);
        if candidate.is_file() {
            return Ok(Box::new(FileSource::open(candidate)?));
        }
    }

    Err(Error::FileNotFound(name.to_string()))
}
