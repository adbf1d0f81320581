//! Observation of which parameters a consumer actually read

// standard library
use std::collections::BTreeSet;
use std::sync::Mutex;

/// Records the set of parameter names read through a [MatCfg](crate::MatCfg)
///
/// Factories install a recorder on their working copy of a configuration to
/// learn which parameters influenced a build (for diagnostics and cache-key
/// auditing). While any recorder is installed the configuration rejects
/// writes, so the recorded set cannot be invalidated mid-observation.
///
/// ```rust
/// # use std::sync::Arc;
/// # use nxtal_cfg::{AccessRecorder, MatCfg};
/// # nxtal_textsrc::register_memory_entry("rec.ncmat", "NCMAT v2\n@DYNINFO\nelement He\nfraction 1\ntype freegas\n@DENSITY\n1.0 kg_per_m3\n");
/// let cfg = MatCfg::new("rec.ncmat;temp=300").unwrap();
/// let recorder = Arc::new(AccessRecorder::default());
/// let spied = cfg.with_recorder(recorder.clone());
/// let _ = spied.temp();
/// let _ = spied.dcutoff();
/// assert_eq!(recorder.accessed(), ["dcutoff", "temp"].map(String::from).into());
/// ```
#[derive(Debug, Default)]
pub struct AccessRecorder {
    accessed: Mutex<BTreeSet<String>>,
}

impl AccessRecorder {
    pub(crate) fn notify(&self, name: &str) {
        self.accessed
            .lock()
            .expect("access recorder mutex poisoned")
            .insert(name.to_string());
    }

    /// The set of parameter names read so far
    pub fn accessed(&self) -> BTreeSet<String> {
        self.accessed
            .lock()
            .expect("access recorder mutex poisoned")
            .clone()
    }
}
