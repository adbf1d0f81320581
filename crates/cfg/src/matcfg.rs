//! The MatCfg configuration object

// crate modules
use crate::embedded::extract_embedded_cfg;
use crate::error::{Error, Result};
use crate::orient::OrientDir;
use crate::param::{parse_value, Param, Value, FORBIDDEN_CHARS};
use crate::recorder::AccessRecorder;

// external crates
use log::debug;

// nxtal modules
use nxtal_textsrc::create_source;
use nxtal_utils::StringExt;

// standard library
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

const LOWER_ALNUM: &str = "abcdefghijklmnopqrstuvwxyz0123456789_";

#[derive(Debug, Clone)]
struct CfgData {
    data_name: String,
    data_ext: String,
    ignored_file_cfg: bool,
    params: BTreeMap<Param, Value>,
}

/// A typed material configuration
///
/// Constructed from a string of the form `source[;ignorefilecfg][;k=v]*`.
/// The object is a persistent value type: clones share storage, and any
/// write copies the underlying representation first, so handing a `MatCfg`
/// to a factory can never mutate the caller's instance.
#[derive(Debug, Clone)]
pub struct MatCfg {
    inner: Arc<CfgData>,
    recorder: Option<Arc<AccessRecorder>>,
}

impl MatCfg {
    /// Parse a configuration string, resolving the data source
    ///
    /// Unless `ignorefilecfg` follows the source name, an embedded
    /// `NCRYSTALMATCFG[...]` in the data file is applied first so explicit
    /// parameters take precedence over file defaults.
    pub fn new(cfgstr: &str) -> Result<MatCfg> {
        let input = cfgstr.trim();
        if !input.is_ascii() {
            return Err(Error::bad("non-ASCII characters in parameter specification"));
        }
        if input.chars().any(|c| FORBIDDEN_CHARS.contains(c)) {
            return Err(Error::bad("forbidden characters in parameter specification"));
        }

        let (source_name, rest) = match input.find(';') {
            Some(i) => (input[..i].trim(), Some(&input[i + 1..])),
            None => (input, None),
        };
        if source_name.is_empty() {
            return Err(Error::bad("please supply name of data file"));
        }
        if source_name.contains('=') {
            // catch the typical typo of forgetting the source name entirely
            return Err(Error::bad(format!(
                "filename contains a forbidden character ('='): {source_name}"
            )));
        }

        let mut source = create_source(source_name)?;

        let data_ext = match source_name.rfind('.') {
            Some(i) => source_name[i + 1..].to_string(),
            None => String::new(),
        };

        let (ignored_file_cfg, extra) = match rest {
            None => (false, None),
            Some(rest) => {
                let (first, more) = match rest.find(';') {
                    Some(i) => (rest[..i].trim(), Some(&rest[i + 1..])),
                    None => (rest.trim(), None),
                };
                if first == "ignorefilecfg" {
                    (true, more)
                } else {
                    (false, Some(rest))
                }
            }
        };

        let mut cfg = MatCfg {
            inner: Arc::new(CfgData {
                data_name: source_name.to_string(),
                data_ext,
                ignored_file_cfg,
                params: BTreeMap::new(),
            }),
            recorder: None,
        };

        if !ignored_file_cfg {
            if let Some(filecfg) = extract_embedded_cfg(&mut *source)? {
                if !filecfg.is_empty() {
                    debug!("applying embedded configuration \"{filecfg}\" from {source_name}");
                    cfg.apply_str_cfg(&filecfg)?;
                }
            }
        }
        if let Some(extra) = extra {
            cfg.apply_str_cfg(extra)?;
        }

        if cfg.data_extension().is_empty() {
            return Err(Error::bad(format!(
                "unsupported data file (can not determine extension): {source_name}"
            )));
        }
        Ok(cfg)
    }

    /// Apply a `key=value;key=value` fragment on top of the current state
    ///
    /// Empty parts are ignored, so trailing semicolons are harmless. The
    /// `ignorefilecfg` keyword is only legal directly after the source name
    /// in the constructor and is rejected here.
    pub fn apply_str_cfg(&mut self, fragment: &str) -> Result<()> {
        for part in fragment.split(';') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if part == "ignorefilecfg" {
                return Err(Error::bad(
                    "the \"ignorefilecfg\" keyword can only be used directly after the \
                     filename",
                ));
            }
            let (name, value) = part.split_once('=').ok_or_else(|| {
                Error::bad(format!("bad syntax in parameter specification: \"{part}\""))
            })?;
            let name = name.trim();
            let value = value.trim();
            if name.is_empty() {
                return Err(Error::bad("missing parameter name"));
            }
            self.set_by_name(name, value)?;
        }
        Ok(())
    }

    // Back-compat aliases are rewritten here, everything else goes through
    // the typed parameter table.
    fn set_by_name(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "bragg" => return self.set_value(Param::coh_elas, parse_value(Param::coh_elas, value)?),
            "elas" => {
                let parsed = parse_value(Param::coh_elas, value)?;
                self.set_value(Param::coh_elas, parsed.clone())?;
                return self.set_value(Param::incoh_elas, parsed);
            }
            "bkgd" => {
                if value == "none" || value == "0" {
                    self.set_value(Param::incoh_elas, Value::Bool(false))?;
                    return self.set_value(Param::inelas, Value::Str("none".to_string()));
                }
                return Err(Error::bad(
                    "the \"bkgd\" parameter is obsolete and is available for backwards \
                     compatibility only with the values \"0\" or \"none\". For control of \
                     inelastic or incoherent-elastic scattering, one must now instead use \
                     the parameters \"incoh_elas\" and \"inelas\"",
                ));
            }
            _ => {}
        }
        let par = Param::from_name(name)
            .ok_or_else(|| Error::bad(format!("unknown parameter: \"{name}\"")))?;
        self.set_value(par, parse_value(par, value)?)
    }

    fn set_value(&mut self, par: Param, value: Value) -> Result<()> {
        if self.recorder.is_some() {
            return Err(Error::AccessLocked);
        }
        Arc::make_mut(&mut self.inner).params.insert(par, value);
        Ok(())
    }

    /// Clone sharing the same state, with an access recorder installed
    ///
    /// All parameter reads through the returned instance notify the
    /// recorder. Writes through it are rejected while recording.
    pub fn with_recorder(&self, recorder: Arc<AccessRecorder>) -> MatCfg {
        MatCfg {
            inner: self.inner.clone(),
            recorder: Some(recorder),
        }
    }

    // ! ------------------------------------------------------------------
    // ! Parameter access
    // ! ------------------------------------------------------------------

    fn track(&self, par: Param) {
        if let Some(recorder) = &self.recorder {
            recorder.notify(par.name());
        }
    }

    fn value(&self, par: Param) -> Option<&Value> {
        self.track(par);
        self.inner.params.get(&par)
    }

    fn has_par(&self, par: Param) -> bool {
        self.value(par).is_some()
    }

    fn dbl_or(&self, par: Param, default: f64) -> f64 {
        match self.value(par) {
            Some(Value::Dbl { value, .. }) => *value,
            _ => default,
        }
    }

    fn dbl_req(&self, par: Param) -> Result<f64> {
        match self.value(par) {
            Some(Value::Dbl { value, .. }) => Ok(*value),
            _ => Err(Error::MissingInfo(par.name())),
        }
    }

    fn bool_or(&self, par: Param, default: bool) -> bool {
        match self.value(par) {
            Some(Value::Bool(value)) => *value,
            _ => default,
        }
    }

    fn int_or(&self, par: Param, default: i64) -> i64 {
        match self.value(par) {
            Some(Value::Int(value)) => *value,
            _ => default,
        }
    }

    fn str_or(&self, par: Param, default: &str) -> String {
        match self.value(par) {
            Some(Value::Str(value)) => value.clone(),
            _ => default.to_string(),
        }
    }

    /// Material temperature \[K\]; −1 requests the data-file default
    pub fn temp(&self) -> f64 {
        self.dbl_or(Param::temp, -1.0)
    }

    /// Lower d-spacing cutoff \[Aa\] for HKL lists; 0 selects automatically
    pub fn dcutoff(&self) -> f64 {
        self.dbl_or(Param::dcutoff, 0.0)
    }

    /// Upper d-spacing cutoff \[Aa\]
    pub fn dcutoffup(&self) -> f64 {
        self.dbl_or(Param::dcutoffup, f64::INFINITY)
    }

    /// Packing factor in (0,1], scaling the effective density
    pub fn packfact(&self) -> f64 {
        self.dbl_or(Param::packfact, 1.0)
    }

    /// Mosaic spread \[rad\] (FWHM); required for single crystals
    pub fn mos(&self) -> Result<f64> {
        self.dbl_req(Param::mos)
    }

    /// Requested precision of mosaic integrals
    pub fn mosprec(&self) -> f64 {
        self.dbl_or(Param::mosprec, 1e-3)
    }

    /// d-spacing \[Aa\] below which single crystals fall back to an
    /// isotropic approximation
    pub fn sccutoff(&self) -> f64 {
        self.dbl_or(Param::sccutoff, 0.4)
    }

    /// Tolerance \[rad\] for orientation consistency
    pub fn dirtol(&self) -> f64 {
        self.dbl_or(Param::dirtol, 1e-4)
    }

    /// Whether coherent-elastic (Bragg) physics is enabled
    pub fn coh_elas(&self) -> bool {
        self.bool_or(Param::coh_elas, true)
    }

    /// Whether incoherent-elastic physics is enabled
    pub fn incoh_elas(&self) -> bool {
        self.bool_or(Param::incoh_elas, true)
    }

    /// Inelastic model selection; disabling spellings collapse to "none"
    pub fn inelas(&self) -> String {
        let value = self.str_or(Param::inelas, "auto");
        match value.as_str() {
            "none" | "0" | "sterile" | "false" => "none".to_string(),
            _ => value,
        }
    }

    /// Layered-crystal mode: 0 analytic, n>0 an n-sample reference average
    pub fn lcmode(&self) -> i64 {
        self.int_or(Param::lcmode, 0)
    }

    /// VDOS expansion quality, integer 0..=5
    pub fn vdoslux(&self) -> i64 {
        self.int_or(Param::vdoslux, 3)
    }

    /// Pinned info factory specification (possibly with options)
    pub fn infofactory(&self) -> String {
        self.str_or(Param::infofactory, "")
    }

    /// Pinned scatter factory name
    pub fn scatfactory(&self) -> String {
        self.str_or(Param::scatfactory, "")
    }

    /// Pinned absorption factory name
    pub fn absnfactory(&self) -> String {
        self.str_or(Param::absnfactory, "")
    }

    /// Extension override for factory routing
    pub fn overridefileext(&self) -> String {
        self.str_or(Param::overridefileext, "")
    }

    /// Parsed atom data override lines
    pub fn atomdb_parsed(&self) -> Vec<Vec<String>> {
        match self.value(Param::atomdb) {
            Some(Value::AtomDb { lines, .. }) => lines.clone(),
            _ => Vec::new(),
        }
    }

    /// Primary orientation pair; required for single crystals
    pub fn dir1(&self) -> Result<OrientDir> {
        match self.value(Param::dir1) {
            Some(Value::Orient(dir)) => Ok(*dir),
            _ => Err(Error::MissingInfo(Param::dir1.name())),
        }
    }

    /// Secondary orientation pair; required for single crystals
    pub fn dir2(&self) -> Result<OrientDir> {
        match self.value(Param::dir2) {
            Some(Value::Orient(dir)) => Ok(*dir),
            _ => Err(Error::MissingInfo(Param::dir2.name())),
        }
    }

    /// Preferred axis (crystal frame) of a layered crystal
    pub fn lcaxis(&self) -> Result<[f64; 3]> {
        match self.value(Param::lcaxis) {
            Some(Value::Vector { value, .. }) => Ok(*value),
            _ => Err(Error::MissingInfo(Param::lcaxis.name())),
        }
    }

    /// The data source name as specified in the configuration string
    pub fn data_name(&self) -> &str {
        &self.inner.data_name
    }

    /// Extension used for factory routing (`overridefileext` wins)
    pub fn data_extension(&self) -> String {
        let over = self.overridefileext();
        if over.is_empty() {
            self.inner.data_ext.clone()
        } else {
            over
        }
    }

    /// Whether an embedded file configuration was deliberately skipped
    pub fn ignored_embedded_cfg(&self) -> bool {
        self.inner.ignored_file_cfg
    }

    /// Typed setter for the temperature \[K\]
    pub fn set_temp(&mut self, value: f64) -> Result<()> {
        self.set_value(Param::temp, Value::Dbl { value, orig: None })
    }

    /// Typed setter for the lower d-spacing cutoff \[Aa\]
    pub fn set_dcutoff(&mut self, value: f64) -> Result<()> {
        self.set_value(Param::dcutoff, Value::Dbl { value, orig: None })
    }

    // ! ------------------------------------------------------------------
    // ! Derived views and validation
    // ! ------------------------------------------------------------------

    /// Single-crystal configurations carry any of mos/dir1/dir2/dirtol
    pub fn is_single_crystal(&self) -> bool {
        self.has_par(Param::mos)
            || self.has_par(Param::dir1)
            || self.has_par(Param::dir2)
            || self.has_par(Param::dirtol)
    }

    /// Layered-crystal configurations carry an lcaxis
    pub fn is_layered_crystal(&self) -> bool {
        self.has_par(Param::lcaxis)
    }

    /// Cross-parameter consistency checks
    ///
    /// Range checks on every recognized parameter plus the single-crystal
    /// rules (all or none of mos/dir1/dir2, sane orientations).
    pub fn check_consistency(&self) -> Result<()> {
        let temp = self.temp();
        if temp != -1.0 && !(temp > 0.0 && temp <= 1e5) {
            return Err(Error::bad("temp must be -1.0 or in the range (0.0,1e5]"));
        }
        let dcutoff = self.dcutoff();
        let dcutoffup = self.dcutoffup();
        if dcutoff != -1.0 {
            if dcutoff < 0.0 {
                return Err(Error::bad("dcutoff must be -1.0 or >=0.0"));
            }
            if dcutoff >= dcutoffup {
                return Err(Error::bad("dcutoff must be less than dcutoffup"));
            }
            if dcutoff != 0.0 && !(1e-3..=1e5).contains(&dcutoff) {
                return Err(Error::bad(
                    "dcutoff must be -1 (hkl lists disabled), 0 (for automatic selection), \
                     or in range [1e-3,1e5]",
                ));
            }
        }
        let packfact = self.packfact();
        if !(packfact > 0.0 && packfact <= 1.0) {
            return Err(Error::bad("packfact must be in range (0.0,1.0]"));
        }
        if self.sccutoff() < 0.0 {
            return Err(Error::bad("sccutoff must be >=0.0"));
        }
        let dirtol = self.dirtol();
        if !(dirtol > 0.0 && dirtol <= std::f64::consts::PI) {
            return Err(Error::bad("dirtol must be in range (0.0,pi]"));
        }
        let mosprec = self.mosprec();
        if !(0.9999e-7..=0.10000001).contains(&mosprec) {
            return Err(Error::bad("mosprec must be in the range [1e-7,1e-1]"));
        }

        let inelas = self.inelas();
        if inelas.is_empty() || !inelas.contains_only(LOWER_ALNUM) {
            return Err(Error::bad(format!("invalid inelas name specified: \"{inelas}\"")));
        }

        // the three factory parameters share the name:options grammar
        let factory_specs = [
            ("infofactory", self.infofactory()),
            ("scatfactory", self.scatfactory()),
            ("absnfactory", self.absnfactory()),
        ];
        for (label, full) in &factory_specs {
            let name = fact_name(full);
            if !name.contains_only(LOWER_ALNUM) {
                return Err(Error::bad(format!(
                    "invalid {label} name specified: \"{name}\""
                )));
            }
            if name.is_empty() && full.contains(':') {
                return Err(Error::bad(format!(
                    "{label} options not allowed when not specifying specific factory"
                )));
            }
            decode_opts(full)?;
        }

        // the single-crystal parameter cluster: all or nothing
        let n_orient = [Param::dir1, Param::dir2, Param::mos]
            .iter()
            .filter(|p| self.has_par(**p))
            .count();
        if n_orient != 0 && n_orient < 3 {
            return Err(Error::bad("must set all or none of mos, dir1 and dir2 parameters"));
        }
        if n_orient == 0 && self.has_par(Param::dirtol) {
            return Err(Error::bad(
                "mos, dir1 and dir2 parameters must all be set when dirtol is set",
            ));
        }

        if n_orient > 0 {
            let mos = self.mos()?;
            if !(mos > 0.0 && mos <= std::f64::consts::FRAC_PI_2) {
                return Err(Error::bad("mos must be in range (0.0,pi/2]"));
            }
            if packfact != 1.0 {
                return Err(Error::bad(
                    "single crystal parameters are set, so packfact must be 1.0",
                ));
            }
            let dirs = [self.dir1()?, self.dir2()?];
            for dir in &dirs {
                if mag2(dir.crystal.vector()) == 0.0 {
                    return Err(Error::bad(if dir.crystal.is_hkl() {
                        "specified point in hkl space is a null-vector"
                    } else {
                        "specified direction in crystal frame is a null-vector"
                    }));
                }
                if mag2(dir.lab) == 0.0 {
                    return Err(Error::bad(
                        "specified direction in laboratory frame is a null-vector",
                    ));
                }
            }
            if is_parallel(dirs[0].lab, dirs[1].lab) {
                return Err(Error::bad(
                    "specified primary and secondary lab directions are parallel",
                ));
            }
            // crystal directions can only be compared when in the same frame
            if dirs[0].crystal.is_hkl() == dirs[1].crystal.is_hkl()
                && is_parallel(dirs[0].crystal.vector(), dirs[1].crystal.vector())
            {
                return Err(Error::bad(if dirs[0].crystal.is_hkl() {
                    "specified primary and secondary hkl points have planes with parallel normals"
                } else {
                    "specified primary and secondary directions in the crystal frame are parallel"
                }));
            }
        }

        if self.has_par(Param::lcaxis) {
            let axis = self.lcaxis()?;
            let mag = mag2(axis).sqrt();
            if !mag.is_finite() {
                return Err(Error::bad(
                    "infinities or too large values specified in lcaxis vector",
                ));
            }
            if mag == 0.0 {
                return Err(Error::bad(
                    "null vector or too small values specified in lcaxis vector",
                ));
            }
        }

        let vdoslux = self.vdoslux();
        if !(0..=5).contains(&vdoslux) {
            return Err(Error::bad(format!(
                "specified invalid vdoslux value of {vdoslux} (must be integer from 0 to 5)"
            )));
        }
        Ok(())
    }

    // ! ------------------------------------------------------------------
    // ! String forms
    // ! ------------------------------------------------------------------

    /// The configuration as a string, reproducing original value spellings
    pub fn to_cfg_string(&self, include_source: bool) -> String {
        let mut out = String::new();
        if include_source {
            out.push_str(&self.inner.data_name);
            if self.inner.ignored_file_cfg {
                out.push_str(";ignorefilecfg");
            }
        }
        for (par, value) in &self.inner.params {
            if !out.is_empty() {
                out.push(';');
            }
            out.push_str(par.name());
            out.push('=');
            out.push_str(&value.repr(false));
        }
        out
    }

    /// The configuration as an embeddable magic comment
    pub fn to_embeddable_cfg(&self) -> String {
        format!("NCRYSTALMATCFG[{}]", self.to_cfg_string(false))
    }

    /// Deterministic cache key over a parameter subset
    ///
    /// Writes every requested parameter, set or not, in canonical order and
    /// with full-precision numeric values, so any two configurations that
    /// agree on the subset produce identical signatures regardless of input
    /// spelling or insertion order.
    pub fn cache_signature(&self, pars: &[Param]) -> String {
        let mut pars: Vec<Param> = pars.to_vec();
        pars.sort();
        let mut out = String::new();
        for par in pars {
            if !out.is_empty() {
                out.push(';');
            }
            out.push_str(par.name());
            out.push('=');
            match self.inner.params.get(&par) {
                Some(value) => out.push_str(&value.repr(true)),
                None => out.push_str("<>"),
            }
        }
        out
    }

    // ! ------------------------------------------------------------------
    // ! Factory option strings (name:opt@val:flag)
    // ! ------------------------------------------------------------------

    // All three factory parameters (infofactory, scatfactory, absnfactory)
    // share the option grammar; the public accessors below are thin
    // per-parameter wrappers over these helpers.

    /// The factory name part of the `infofactory` parameter
    pub fn infofact_name(&self) -> String {
        fact_name(&self.infofactory())
    }

    /// The factory name part of the `scatfactory` parameter
    pub fn scatfact_name(&self) -> String {
        fact_name(&self.scatfactory())
    }

    /// The factory name part of the `absnfactory` parameter
    pub fn absnfact_name(&self) -> String {
        fact_name(&self.absnfactory())
    }

    /// Whether a boolean flag is present in the `infofactory` options
    pub fn infofact_flag(&self, flag: &str) -> Result<bool> {
        fact_flag(&self.infofactory(), flag)
    }

    /// Whether a boolean flag is present in the `scatfactory` options
    pub fn scatfact_flag(&self, flag: &str) -> Result<bool> {
        fact_flag(&self.scatfactory(), flag)
    }

    /// Whether a boolean flag is present in the `absnfactory` options
    pub fn absnfact_flag(&self, flag: &str) -> Result<bool> {
        fact_flag(&self.absnfactory(), flag)
    }

    /// A double-valued option from the `infofactory` options
    pub fn infofact_dbl(&self, name: &str, default: f64) -> Result<f64> {
        fact_dbl(&self.infofactory(), name, default)
    }

    /// A double-valued option from the `scatfactory` options
    pub fn scatfact_dbl(&self, name: &str, default: f64) -> Result<f64> {
        fact_dbl(&self.scatfactory(), name, default)
    }

    /// A double-valued option from the `absnfactory` options
    pub fn absnfact_dbl(&self, name: &str, default: f64) -> Result<f64> {
        fact_dbl(&self.absnfactory(), name, default)
    }

    /// An integer-valued option from the `infofactory` options
    pub fn infofact_int(&self, name: &str, default: i64) -> Result<i64> {
        fact_int(&self.infofactory(), name, default)
    }

    /// An integer-valued option from the `scatfactory` options
    pub fn scatfact_int(&self, name: &str, default: i64) -> Result<i64> {
        fact_int(&self.scatfactory(), name, default)
    }

    /// An integer-valued option from the `absnfactory` options
    pub fn absnfact_int(&self, name: &str, default: i64) -> Result<i64> {
        fact_int(&self.absnfactory(), name, default)
    }

    /// Reject any `infofactory` option outside the recognized set
    pub fn infofact_validate(&self, recognized: &[&str]) -> Result<()> {
        fact_validate(&self.infofactory(), recognized)
    }

    /// Reject any `scatfactory` option outside the recognized set
    pub fn scatfact_validate(&self, recognized: &[&str]) -> Result<()> {
        fact_validate(&self.scatfactory(), recognized)
    }

    /// Reject any `absnfactory` option outside the recognized set
    pub fn absnfact_validate(&self, recognized: &[&str]) -> Result<()> {
        fact_validate(&self.absnfactory(), recognized)
    }
}

fn fact_name(full: &str) -> String {
    match full.split_once(':') {
        Some((name, _)) => name.trim().to_string(),
        None => full.to_string(),
    }
}

fn fact_flag(full: &str, flag: &str) -> Result<bool> {
    let opts = decode_opts(full)?;
    match opts.iter().find(|(name, _)| name == flag) {
        None => Ok(false),
        Some((_, value)) if value == OPT_FLAG => Ok(true),
        Some(_) => Err(Error::bad(format!(
            "syntax error in flag: \"{flag}\" (takes no value)"
        ))),
    }
}

fn fact_dbl(full: &str, name: &str, default: f64) -> Result<f64> {
    let opts = decode_opts(full)?;
    match opts.iter().find(|(n, _)| n == name) {
        None => Ok(default),
        Some((_, value)) => value
            .parse()
            .map_err(|_| Error::bad(format!("could not decode number \"{value}\""))),
    }
}

fn fact_int(full: &str, name: &str, default: i64) -> Result<i64> {
    let opts = decode_opts(full)?;
    match opts.iter().find(|(n, _)| n == name) {
        None => Ok(default),
        Some((_, value)) => value
            .parse()
            .map_err(|_| Error::bad(format!("could not decode integer \"{value}\""))),
    }
}

fn fact_validate(full: &str, recognized: &[&str]) -> Result<()> {
    for (name, _) in decode_opts(full)? {
        if !recognized.contains(&name.as_str()) {
            return Err(Error::bad(format!(
                "the flag \"{name}\" is not supported by the chosen factory for a \
                 mode of \"{}\"",
                fact_name(full)
            )));
        }
    }
    Ok(())
}

impl fmt::Display for MatCfg {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MatCfg(\"{}\")", self.to_cfg_string(true))
    }
}

const OPT_FLAG: &str = "<flag>";

// Decode "name:opt1@val1:flag2" option strings into (name, value) pairs,
// with the sentinel value for bare flags
fn decode_opts(optstr: &str) -> Result<Vec<(String, String)>> {
    let mut out: Vec<(String, String)> = Vec::new();
    if !optstr.contains(':') {
        return Ok(out);
    }
    for part in optstr.split(':').skip(1) {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (name, value) = match part.split_once('@') {
            Some((name, value)) => {
                let name = name.trim();
                let value = value.trim();
                if name.is_empty() || value.is_empty() || value.contains(['<', '>', ':', '=']) {
                    return Err(Error::bad(format!("syntax error in options: \"{optstr}\"")));
                }
                (name, value)
            }
            None => (part, OPT_FLAG),
        };
        if !name.contains_only(LOWER_ALNUM)
            || !name.starts_with(|c: char| c.is_ascii_lowercase())
        {
            return Err(Error::bad(format!(
                "syntax error in options. Invalid option name: \"{name}\""
            )));
        }
        if out.iter().any(|(n, _)| n == name) {
            return Err(Error::bad(format!(
                "syntax error in options. Option specified multiple times: \"{name}\""
            )));
        }
        out.push((name.to_string(), value.to_string()));
    }
    Ok(out)
}

fn mag2(v: [f64; 3]) -> f64 {
    v[0] * v[0] + v[1] * v[1] + v[2] * v[2]
}

fn is_parallel(a: [f64; 3], b: [f64; 3]) -> bool {
    let cross = [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ];
    let tol = 1e-6;
    mag2(cross) <= tol * tol * mag2(a) * mag2(b)
}
