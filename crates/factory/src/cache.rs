//! Process-wide build caches and their invalidation

// crate modules
use crate::error::Result;

// external crates
use log::debug;
use once_cell::sync::{Lazy, OnceCell};

// nxtal modules
use nxtal_info::Info;
use nxtal_scatter::{Absorption, Scatter};

// standard library
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// Each cache maps a key to a once-cell so that the map lock is held only
// briefly: concurrent requests for the same key block on the cell (one
// build), distinct keys build in parallel.
type CacheMap<K, T> = Mutex<HashMap<K, Arc<OnceCell<T>>>>;

static INFO_CACHE: Lazy<CacheMap<String, Arc<Info>>> = Lazy::new(|| Mutex::new(HashMap::new()));
static SCATTER_CACHE: Lazy<CacheMap<(u64, String), Arc<dyn Scatter>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));
static ABSORPTION_CACHE: Lazy<CacheMap<(u64, String), Arc<dyn Absorption>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

// External caches that want to participate in clear_caches()
static INVALIDATORS: Lazy<Mutex<Vec<Box<dyn Fn() + Send + Sync>>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

fn cached<K, T, F>(cache: &CacheMap<K, T>, key: K, build: F) -> Result<T>
where
    K: std::hash::Hash + Eq + Clone,
    T: Clone,
    F: FnOnce() -> Result<T>,
{
    let cell = {
        let mut map = cache.lock().expect("cache mutex poisoned");
        map.entry(key).or_default().clone()
    };
    cell.get_or_try_init(build).cloned()
}

pub(crate) fn cached_info<F>(key: String, build: F) -> Result<Arc<Info>>
where
    F: FnOnce() -> Result<Arc<Info>>,
{
    cached(&INFO_CACHE, key, build)
}

pub(crate) fn cached_scatter<F>(key: (u64, String), build: F) -> Result<Arc<dyn Scatter>>
where
    F: FnOnce() -> Result<Arc<dyn Scatter>>,
{
    cached(&SCATTER_CACHE, key, build)
}

pub(crate) fn cached_absorption<F>(key: (u64, String), build: F) -> Result<Arc<dyn Absorption>>
where
    F: FnOnce() -> Result<Arc<dyn Absorption>>,
{
    cached(&ABSORPTION_CACHE, key, build)
}

/// Register a callback invoked by [clear_caches]
///
/// External layers with their own expensive caches can hook into the
/// global fan-out.
pub fn register_cache_invalidator(hook: Box<dyn Fn() + Send + Sync>) {
    INVALIDATORS
        .lock()
        .expect("invalidator mutex poisoned")
        .push(hook);
}

/// Empty every process-wide cache
///
/// Objects already handed out stay valid; only subsequent lookups miss and
/// rebuild. Registered invalidation hooks run after the built-in caches
/// are emptied.
pub fn clear_caches() {
    debug!("clearing factory caches");
    INFO_CACHE.lock().expect("cache mutex poisoned").clear();
    SCATTER_CACHE.lock().expect("cache mutex poisoned").clear();
    ABSORPTION_CACHE.lock().expect("cache mutex poisoned").clear();
    for hook in INVALIDATORS.lock().expect("invalidator mutex poisoned").iter() {
        hook();
    }
}
