//! Integration tests for the configuration grammar

use nxtal_cfg::{Error, MatCfg, Param};
use nxtal_textsrc::register_memory_entry;
use rstest::rstest;

const PLAIN: &str = "NCMAT v2
@DYNINFO
element He
fraction 1
type freegas
@DENSITY
1.0 kg_per_m3
";

fn register(name: &str) {
    register_memory_entry(name, PLAIN);
}

#[test]
fn grammar_basics() {
    register("basics.ncmat");
    let cfg = MatCfg::new("basics.ncmat;temp=20C;dcutoff=0.5Aa").unwrap();
    assert_eq!(cfg.data_name(), "basics.ncmat");
    assert_eq!(cfg.data_extension(), "ncmat");
    assert!((cfg.temp() - 293.15).abs() < 1e-12);
    assert!((cfg.dcutoff() - 0.5).abs() < 1e-12);
    // untouched parameters fall back to defaults
    assert_eq!(cfg.vdoslux(), 3);
    assert!(cfg.coh_elas());
    assert_eq!(cfg.inelas(), "auto");
}

#[test]
fn missing_source_and_bad_syntax() {
    assert!(MatCfg::new("").is_err());
    assert!(MatCfg::new(";temp=300").is_err());
    assert!(MatCfg::new("temp=300").is_err());
    register("syntax.ncmat");
    assert!(MatCfg::new("syntax.ncmat;temp").is_err());
    assert!(MatCfg::new("syntax.ncmat;nosuchpar=1").is_err());
    // stray semicolons are tolerated
    assert!(MatCfg::new("syntax.ncmat;;temp=300;").is_ok());
}

#[test]
fn unresolvable_source_is_typed() {
    match MatCfg::new("definitely_not_registered.ncmat") {
        Err(Error::Source(_)) => {}
        other => panic!("expected Source error, got {other:?}"),
    }
}

#[rstest]
#[case("temp=293.15", "temp=20C")] // case 1: celsius spelling
#[case("dcutoff=0.5", "dcutoff=0.05nm")] // case 2: nm spelling
#[case("mos=0.001;dir1=@crys:1,0,0@lab:1,0,0;dir2=@crys:0,1,0@lab:0,1,0",
       "dir2=@crys:0,1,0@lab:0,1,0;dir1=@crys:1,0,0@lab:1,0,0;mos=0.001rad")] // case 3: order
fn cache_signature_canonical(#[case] a: &str, #[case] b: &str) {
    register("canon.ncmat");
    let cfg_a = MatCfg::new(&format!("canon.ncmat;{a}")).unwrap();
    let cfg_b = MatCfg::new(&format!("canon.ncmat;{b}")).unwrap();
    assert_eq!(
        cfg_a.cache_signature(&Param::ALL),
        cfg_b.cache_signature(&Param::ALL)
    );
}

#[test]
fn cfg_string_round_trip_is_idempotent() {
    register("idem.ncmat");
    let first = MatCfg::new("idem.ncmat;temp=20C;vdoslux=2;coh_elas=0").unwrap();
    let canonical = first.to_cfg_string(true);
    let second = MatCfg::new(&canonical).unwrap();
    assert_eq!(second.to_cfg_string(true), canonical);
    assert_eq!(
        first.cache_signature(&Param::ALL),
        second.cache_signature(&Param::ALL)
    );
}

#[test]
fn aliases_rewrite_to_modern_parameters() {
    register("alias.ncmat");
    let cfg = MatCfg::new("alias.ncmat;bragg=0").unwrap();
    assert!(!cfg.coh_elas());

    let cfg = MatCfg::new("alias.ncmat;elas=false").unwrap();
    assert!(!cfg.coh_elas());
    assert!(!cfg.incoh_elas());

    let cfg = MatCfg::new("alias.ncmat;bkgd=none").unwrap();
    assert!(!cfg.incoh_elas());
    assert_eq!(cfg.inelas(), "none");

    assert!(MatCfg::new("alias.ncmat;bkgd=phonon").is_err());
}

#[test]
fn inelas_disabling_spellings_collapse() {
    register("inelas.ncmat");
    for spelling in ["none", "0", "sterile", "false"] {
        let cfg = MatCfg::new(&format!("inelas.ncmat;inelas={spelling}")).unwrap();
        assert_eq!(cfg.inelas(), "none");
    }
}

#[test]
fn embedded_cfg_applies_unless_ignored() {
    register_memory_entry(
        "embedded.ncmat",
        "NCMAT v2
# NCRYSTALMATCFG[temp=100K;vdoslux=1]
@DYNINFO
element He
fraction 1
type freegas
@DENSITY
1.0 kg_per_m3
",
    );
    let cfg = MatCfg::new("embedded.ncmat").unwrap();
    assert!((cfg.temp() - 100.0).abs() < 1e-12);
    assert_eq!(cfg.vdoslux(), 1);

    // explicit parameters take precedence over the file defaults
    let cfg = MatCfg::new("embedded.ncmat;temp=200K").unwrap();
    assert!((cfg.temp() - 200.0).abs() < 1e-12);
    assert_eq!(cfg.vdoslux(), 1);

    let cfg = MatCfg::new("embedded.ncmat;ignorefilecfg").unwrap();
    assert!(cfg.ignored_embedded_cfg());
    assert_eq!(cfg.temp(), -1.0);
    assert_eq!(cfg.vdoslux(), 3);

    let cfg = MatCfg::new("embedded.ncmat;ignorefilecfg;temp=50K").unwrap();
    assert!((cfg.temp() - 50.0).abs() < 1e-12);

    // only legal directly after the filename
    assert!(MatCfg::new("embedded.ncmat;temp=50K;ignorefilecfg").is_err());
}

#[test]
fn clones_share_until_written() {
    register("cow.ncmat");
    let original = MatCfg::new("cow.ncmat;temp=300").unwrap();
    let mut copy = original.clone();
    copy.apply_str_cfg("temp=600").unwrap();
    assert!((original.temp() - 300.0).abs() < 1e-12);
    assert!((copy.temp() - 600.0).abs() < 1e-12);
}

#[test]
fn recorder_blocks_writes_and_tracks_reads() {
    register("spy.ncmat");
    let cfg = MatCfg::new("spy.ncmat;temp=300").unwrap();
    let recorder = std::sync::Arc::new(nxtal_cfg::AccessRecorder::default());
    let mut spied = cfg.with_recorder(recorder.clone());
    let _ = spied.temp();
    let _ = spied.packfact();
    assert!(matches!(spied.set_temp(600.0), Err(Error::AccessLocked)));
    let accessed = recorder.accessed();
    assert!(accessed.contains("temp"));
    assert!(accessed.contains("packfact"));
    assert!(!accessed.contains("dcutoff"));
}

#[rstest]
#[case("temp=-5")] // case 1: negative non-sentinel temperature
#[case("packfact=0")] // case 2: zero packing factor
#[case("packfact=1.5")] // case 3: over-packed
#[case("mosprec=1")] // case 4: mosprec outside range
#[case("vdoslux=9")] // case 5: vdoslux outside range
#[case("mos=0.001")] // case 6: mos without dir1/dir2
#[case("dirtol=0.01")] // case 7: dirtol without the trio
#[case("dcutoff=2;dcutoffup=1")] // case 8: inverted window
#[case("mos=0.001;dir1=@crys:1,0,0@lab:0,0,1;dir2=@crys:0,1,0@lab:0,0,2")] // case 9: parallel lab dirs
#[case("mos=0.001;dir1=@crys:1,0,0@lab:0,0,1;dir2=@crys:2,0,0@lab:0,1,0")] // case 10: parallel crystal dirs
#[case("mos=0.001;dir1=@crys:0,0,0@lab:0,0,1;dir2=@crys:0,1,0@lab:0,1,0")] // case 11: null crystal dir
#[case("lcaxis=0,0,0")] // case 12: null lcaxis
fn consistency_violations(#[case] params: &str) {
    register("check.ncmat");
    let cfg = MatCfg::new(&format!("check.ncmat;{params}")).unwrap();
    assert!(cfg.check_consistency().is_err(), "accepted: {params}");
}

#[test]
fn consistent_single_crystal_accepted() {
    register("sc.ncmat");
    let cfg = MatCfg::new(
        "sc.ncmat;mos=0.5deg;dirtol=1deg;dir1=@crys_hkl:0,0,1@lab:0,0,1;dir2=@crys_hkl:1,0,0@lab:1,0,0",
    )
    .unwrap();
    cfg.check_consistency().unwrap();
    assert!(cfg.is_single_crystal());
    assert!(!cfg.is_layered_crystal());
}

#[test]
fn infofactory_options_decode() {
    register("fact.ncmat");
    let cfg = MatCfg::new("fact.ncmat;infofactory=stdncmat:expandhkl:prec@0.01").unwrap();
    assert_eq!(cfg.infofact_name(), "stdncmat");
    assert!(cfg.infofact_flag("expandhkl").unwrap());
    assert!(!cfg.infofact_flag("other").unwrap());
    assert!((cfg.infofact_dbl("prec", 1.0).unwrap() - 0.01).abs() < 1e-12);
    assert!(cfg.infofact_validate(&["expandhkl", "prec"]).is_ok());
    assert!(cfg.infofact_validate(&["expandhkl"]).is_err());
}

#[test]
fn scatter_and_absorption_factory_options_decode() {
    register("fact2.ncmat");
    let cfg =
        MatCfg::new("fact2.ncmat;scatfactory=stdscat:nref@3:fast;absnfactory=stdabs:thick@2.5")
            .unwrap();
    cfg.check_consistency().unwrap();

    // option suffixes never leak into the factory names used for pinning
    assert_eq!(cfg.scatfact_name(), "stdscat");
    assert_eq!(cfg.absnfact_name(), "stdabs");

    assert!(cfg.scatfact_flag("fast").unwrap());
    assert_eq!(cfg.scatfact_int("nref", 0).unwrap(), 3);
    assert!((cfg.absnfact_dbl("thick", 0.0).unwrap() - 2.5).abs() < 1e-12);
    assert!(cfg.scatfact_validate(&["nref", "fast"]).is_ok());
    assert!(cfg.scatfact_validate(&["nref"]).is_err());
    assert!(cfg.absnfact_validate(&["thick"]).is_ok());
    assert!(cfg.absnfact_validate(&[]).is_err());

    // options without a factory name are inconsistent for every kind
    let cfg = MatCfg::new("fact2.ncmat;scatfactory=:opt@1").unwrap();
    assert!(cfg.check_consistency().is_err());
}

#[test]
fn embeddable_cfg_format() {
    register("embed_out.ncmat");
    let cfg = MatCfg::new("embed_out.ncmat;temp=300K").unwrap();
    assert_eq!(cfg.to_embeddable_cfg(), "NCRYSTALMATCFG[temp=300K]");
}
