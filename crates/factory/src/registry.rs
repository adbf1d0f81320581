//! Factory traits, registration and dispatch

// crate modules
use crate::cache::{cached_absorption, cached_info, cached_scatter};
use crate::error::{Error, Result};
use crate::std_factories::{
    StdAbsorptionFactory, StdNcmatInfoFactory, StdScatterFactory, INFO_PARAMS,
};

// external crates
use log::debug;
use once_cell::sync::Lazy;

// nxtal modules
use nxtal_cfg::{MatCfg, Param};
use nxtal_info::Info;
use nxtal_scatter::{Absorption, Scatter};

// standard library
use std::sync::{Arc, Once, RwLock};

/// A named factory able to build [Info] objects from configurations
pub trait InfoFactory: Send + Sync {
    /// Registered name, e.g. `stdncmat`
    fn name(&self) -> &'static str;

    /// Ability score for this configuration; 0 means "cannot handle"
    fn rank(&self, cfg: &MatCfg) -> u32;

    /// Build the material
    fn create_info(&self, cfg: &MatCfg) -> Result<Arc<Info>>;
}

/// A named factory able to build scatter processes
pub trait ScatterFactory: Send + Sync {
    /// Registered name, e.g. `stdscat`
    fn name(&self) -> &'static str;

    /// Ability score for this configuration; 0 means "cannot handle"
    fn rank(&self, cfg: &MatCfg) -> u32;

    /// Build the process tree for a material
    fn create_scatter(&self, cfg: &MatCfg, info: &Arc<Info>) -> Result<Arc<dyn Scatter>>;
}

/// A named factory able to build absorption processes
pub trait AbsorptionFactory: Send + Sync {
    /// Registered name, e.g. `stdabs`
    fn name(&self) -> &'static str;

    /// Ability score for this configuration; 0 means "cannot handle"
    fn rank(&self, cfg: &MatCfg) -> u32;

    /// Build the absorption process for a material
    fn create_absorption(&self, cfg: &MatCfg, info: &Arc<Info>) -> Result<Arc<dyn Absorption>>;
}

struct Registry {
    info: Vec<Arc<dyn InfoFactory>>,
    scatter: Vec<Arc<dyn ScatterFactory>>,
    absorption: Vec<Arc<dyn AbsorptionFactory>>,
}

static REGISTRY: Lazy<RwLock<Registry>> = Lazy::new(|| {
    RwLock::new(Registry {
        info: Vec::new(),
        scatter: Vec::new(),
        absorption: Vec::new(),
    })
});

static STD_INIT: Once = Once::new();

fn ensure_std_factories() {
    STD_INIT.call_once(|| {
        let mut reg = REGISTRY.write().expect("factory registry poisoned");
        reg.info.push(Arc::new(StdNcmatInfoFactory));
        reg.scatter.push(Arc::new(StdScatterFactory));
        reg.absorption.push(Arc::new(StdAbsorptionFactory));
    });
}

/// Register an additional info factory
pub fn register_info_factory(factory: Arc<dyn InfoFactory>) {
    ensure_std_factories();
    debug!("registering info factory \"{}\"", factory.name());
    REGISTRY
        .write()
        .expect("factory registry poisoned")
        .info
        .push(factory);
}

/// Register an additional scatter factory
pub fn register_scatter_factory(factory: Arc<dyn ScatterFactory>) {
    ensure_std_factories();
    debug!("registering scatter factory \"{}\"", factory.name());
    REGISTRY
        .write()
        .expect("factory registry poisoned")
        .scatter
        .push(factory);
}

/// Register an additional absorption factory
pub fn register_absorption_factory(factory: Arc<dyn AbsorptionFactory>) {
    ensure_std_factories();
    debug!("registering absorption factory \"{}\"", factory.name());
    REGISTRY
        .write()
        .expect("factory registry poisoned")
        .absorption
        .push(factory);
}

// Select by pinned name, or the highest positive rank.
fn pick<T: ?Sized>(
    factories: &[Arc<T>],
    pinned: &str,
    kind: &'static str,
    cfg: &MatCfg,
    name_of: impl Fn(&T) -> &'static str,
    rank_of: impl Fn(&T) -> u32,
) -> Result<Arc<T>> {
    if !pinned.is_empty() {
        return factories
            .iter()
            .find(|f| name_of(f) == pinned)
            .cloned()
            .ok_or_else(|| Error::UnknownFactory {
                kind,
                name: pinned.to_string(),
            });
    }
    factories
        .iter()
        .map(|f| (rank_of(f), f))
        .filter(|(rank, _)| *rank > 0)
        .max_by_key(|(rank, _)| *rank)
        .map(|(_, f)| f.clone())
        .ok_or_else(|| Error::DataLoad {
            kind,
            cfgstr: cfg.to_cfg_string(true),
        })
}

/// Build (or fetch from cache) the [Info] for a configuration
///
/// The cache key combines the data source with the info-relevant parameter
/// subset, so configurations differing only in process-level parameters
/// share one material object.
pub fn create_info(cfg: &MatCfg) -> Result<Arc<Info>> {
    ensure_std_factories();
    cfg.check_consistency().map_err(Error::Cfg)?;
    let key = format!(
        "{}|{}",
        cfg.data_name(),
        cfg.cache_signature(&INFO_PARAMS)
    );
    cached_info(key, || {
        let reg = REGISTRY.read().expect("factory registry poisoned");
        let factory = pick(
            &reg.info,
            &cfg.infofact_name(),
            "info",
            cfg,
            |f| f.name(),
            |f| f.rank(cfg),
        )?;
        debug!("building info via factory \"{}\"", factory.name());
        factory.create_info(cfg)
    })
}

/// Build (or fetch from cache) the scatter process for a configuration
pub fn create_scatter_cfg(cfg: &MatCfg) -> Result<Arc<dyn Scatter>> {
    ensure_std_factories();
    let info = create_info(cfg)?;
    let key = (info.uid(), cfg.cache_signature(&Param::ALL));
    cached_scatter(key, || {
        let reg = REGISTRY.read().expect("factory registry poisoned");
        let factory = pick(
            &reg.scatter,
            &cfg.scatfact_name(),
            "scatter",
            cfg,
            |f| f.name(),
            |f| f.rank(cfg),
        )?;
        debug!("building scatter via factory \"{}\"", factory.name());
        factory.create_scatter(cfg, &info)
    })
}

/// Build (or fetch from cache) the absorption process for a configuration
pub fn create_absorption_cfg(cfg: &MatCfg) -> Result<Arc<dyn Absorption>> {
    ensure_std_factories();
    let info = create_info(cfg)?;
    let key = (
        info.uid(),
        cfg.cache_signature(&[Param::absnfactory]),
    );
    cached_absorption(key, || {
        let reg = REGISTRY.read().expect("factory registry poisoned");
        let factory = pick(
            &reg.absorption,
            &cfg.absnfact_name(),
            "absorption",
            cfg,
            |f| f.name(),
            |f| f.rank(cfg),
        )?;
        debug!("building absorption via factory \"{}\"", factory.name());
        factory.create_absorption(cfg, &info)
    })
}

/// Convenience: parse a configuration string and build the scatter process
pub fn create_scatter(cfgstr: &str) -> Result<Arc<dyn Scatter>> {
    let cfg = MatCfg::new(cfgstr)?;
    create_scatter_cfg(&cfg)
}

/// Convenience: parse a configuration string and build the absorption
/// process
pub fn create_absorption(cfgstr: &str) -> Result<Arc<dyn Absorption>> {
    let cfg = MatCfg::new(cfgstr)?;
    create_absorption_cfg(&cfg)
}
