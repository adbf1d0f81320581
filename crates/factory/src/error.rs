//! Result and Error types for nxtal-factory

/// Type alias for `Result<T, factory::Error>`
pub type Result<T> = core::result::Result<T, Error>;

/// The error type for the `nxtal-factory` crate
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("configuration problem")]
    Cfg(#[from] nxtal_cfg::Error),

    #[error("could not resolve data source")]
    Source(#[from] nxtal_textsrc::Error),

    #[error("data file parsing failed")]
    Parse(#[from] nxtal_ncmat::Error),

    #[error("material building failed")]
    Material(#[from] nxtal_info::Error),

    #[error("process building failed")]
    Process(#[from] nxtal_scatter::Error),

    #[error("density of states problem")]
    Vdos(#[from] nxtal_vdos::Error),

    #[error("no registered {kind} factory named \"{name}\"")]
    UnknownFactory {
        /// Factory kind: "info", "scatter" or "absorption"
        kind: &'static str,
        /// The requested name
        name: String,
    },

    #[error("no {kind} factory can handle \"{cfgstr}\"")]
    DataLoad {
        /// Factory kind: "info", "scatter" or "absorption"
        kind: &'static str,
        /// The configuration that nothing claimed
        cfgstr: String,
    },
}
