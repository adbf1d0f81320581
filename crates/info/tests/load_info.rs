//! Integration tests building sealed materials from NCMAT records

use nxtal_info::{load_ncmat, AtomIndex, DynamicInfo, NcmatLoadCfg};
use nxtal_ncmat::parse_ncmat;
use nxtal_textsrc::MemorySource;
use nxtal_utils::AMU_PER_AA3_TO_G_PER_CM3;

const AL_SG225: &str = "NCMAT v2
@CELL
lengths 4.04958 4.04958 4.04958
angles 90 90 90
@SPACEGROUP
225
@ATOMPOSITIONS
Al 0 0 0
Al 0 1/2 1/2
Al 1/2 0 1/2
Al 1/2 1/2 0
@DEBYETEMPERATURE
Al 410.4
";

const HE_FREEGAS: &str = "NCMAT v2
@DYNINFO
element He
fraction 1
type freegas
@DENSITY
0.178577 kg_per_m3
";

fn load(content: &str, cfg: &NcmatLoadCfg) -> std::sync::Arc<nxtal_info::Info> {
    let data = parse_ncmat(Box::new(MemorySource::new("test.ncmat", content))).unwrap();
    load_ncmat(&data, cfg).unwrap()
}

#[test]
fn aluminium_crystal_info() {
    let cfg = NcmatLoadCfg {
        dcutoff: 0.5,
        ..Default::default()
    };
    let info = load(AL_SG225, &cfg);
    assert!(info.is_crystalline());

    let s = info.structure().unwrap();
    assert_eq!(s.spacegroup, Some(225));
    assert_eq!(s.n_atoms, 4);
    let a = 4.04958_f64;
    assert!((s.volume - a.powi(3)).abs() < 1e-9);

    // number density of fcc Al, and density derived from it
    let nd = info.number_density();
    assert!((nd - 4.0 / a.powi(3)).abs() < 1e-12);
    assert!((info.density() - 2.69).abs() < 0.02, "{}", info.density());

    // per-element Debye temperature and a sensible room-temperature MSD
    let al = &info.atoms()[0];
    assert_eq!(al.debye_temp, Some(410.4));
    let msd = al.msd.unwrap();
    assert!(msd > 0.005 && msd < 0.02, "msd = {msd}");

    assert_eq!(info.display_label(AtomIndex(0)), "Al");
    assert_eq!(info.temperature(), Some(293.15));
}

#[test]
fn density_number_density_consistency() {
    let cfg = NcmatLoadCfg::default();
    for content in [AL_SG225, HE_FREEGAS] {
        let info = load(content, &cfg);
        let avg_mass: f64 = info
            .composition()
            .iter()
            .map(|(f, a)| f * a.data.mass_amu())
            .sum();
        let derived = info.number_density() * avg_mass * AMU_PER_AA3_TO_G_PER_CM3;
        assert!(
            (info.density() - derived).abs() <= 1e-10 * derived,
            "density {} vs derived {derived}",
            info.density()
        );
    }
}

#[test]
fn hkl_list_sorted_and_windowed() {
    let cfg = NcmatLoadCfg {
        dcutoff: 0.5,
        ..Default::default()
    };
    let info = load(AL_SG225, &cfg);
    let hkl = info.hkl().unwrap();
    assert!(!hkl.list.is_empty());
    assert!((hkl.dmax() - 4.04958 / 3.0_f64.sqrt()).abs() < 1e-9);
    for pair in hkl.list.windows(2) {
        assert!(pair[0].dspacing >= pair[1].dspacing);
    }
    for family in &hkl.list {
        assert!(family.dspacing >= 0.5);
        assert!(family.multiplicity > 0);
        assert!(family.fsquared >= 0.0);
    }

    // the convenience d-spacing agrees with the enumerated value
    let d111 = info.dspacing_from_hkl(1, 1, 1).unwrap();
    assert!((d111 - hkl.dmax()).abs() < 1e-12);
}

#[test]
fn dcutoff_minus_one_disables_hkl() {
    let cfg = NcmatLoadCfg {
        dcutoff: -1.0,
        ..Default::default()
    };
    let info = load(AL_SG225, &cfg);
    assert!(info.hkl().is_none());
    assert!(info.is_crystalline());
}

#[test]
fn expanded_hkl_search() {
    let cfg = NcmatLoadCfg {
        dcutoff: 1.0,
        expand_hkl: true,
        ..Default::default()
    };
    let info = load(AL_SG225, &cfg);
    let family = info.find_expanded_hkl(-1, 1, -1).unwrap();
    assert_eq!((family.h, family.k, family.l), (1, 1, 1));
    assert!(info.find_expanded_hkl(1, 0, 0).is_none());
}

#[test]
fn helium_free_gas() {
    let info = load(HE_FREEGAS, &NcmatLoadCfg::default());
    assert!(!info.is_crystalline());
    assert!((info.density() - 0.000178577).abs() < 1e-12);
    assert_eq!(info.dynamics().len(), 1);
    assert!(matches!(info.dynamics()[0], DynamicInfo::FreeGas(_)));
    assert_eq!(info.dynamics()[0].fraction(), 1.0);
}

#[test]
fn crystal_without_dyninfo_gets_debye_dynamics() {
    let cfg = NcmatLoadCfg {
        dcutoff: 1.0,
        ..Default::default()
    };
    let info = load(AL_SG225, &cfg);
    assert_eq!(info.dynamics().len(), 1);
    match &info.dynamics()[0] {
        DynamicInfo::VdosDebye { debye_temp, .. } => {
            assert_eq!(*debye_temp, 410.4);
        }
        other => panic!("expected VdosDebye dynamics, got {other:?}"),
    }
}

#[test]
fn direct_kernel_builds_once_and_canonically() {
    let content = "NCMAT v2
@DYNINFO
element V
fraction 1
type scatknl
alphagrid 0.1 0.6 1.2
betagrid 0 0.5 1.0
sab_scaled 0.9 0.8 0.2 0.5 0.4 0.1 0.2 0.15 0.05
@DENSITY
6.11 g_per_cm3
";
    let info = load(content, &NcmatLoadCfg::default());
    let sab = info.dynamics()[0].sab().unwrap().unwrap();
    // symmetric input mirrored to the full beta range
    assert_eq!(sab.beta.len(), 5);
    assert!((sab.temperature - 293.15).abs() < 1e-12);
    // the lazily built kernel is shared, not rebuilt
    let again = info.dynamics()[0].sab().unwrap().unwrap();
    assert!(std::sync::Arc::ptr_eq(&sab, &again));
}

#[test]
fn atomdb_overrides_apply_in_order() {
    let content = "NCMAT v3
@DYNINFO
element Al
fraction 1
type freegas
@DENSITY
2.7 g_per_cm3
@ATOMDB
Al 26.98u 9.9fm 0.01b 0.2b
";
    let data = parse_ncmat(Box::new(MemorySource::new("t.ncmat", content))).unwrap();

    // the file line overrides the built-in scattering length
    let info = load_ncmat(&data, &NcmatLoadCfg::default()).unwrap();
    let al = &info.composition()[0].1;
    assert!((al.data.coherent_scat_length() - 9.9).abs() < 1e-12);

    // and the cfg layer overrides the file line
    let cfg = NcmatLoadCfg {
        atomdb_lines: vec![
            "Al 26.98u 1.1fm 0.01b 0.2b"
                .split_whitespace()
                .map(str::to_string)
                .collect(),
        ],
        ..Default::default()
    };
    let info = load_ncmat(&data, &cfg).unwrap();
    let al = &info.composition()[0].1;
    assert!((al.data.coherent_scat_length() - 1.1).abs() < 1e-12);
}

#[test]
fn unknown_element_is_a_typed_error() {
    let content = "NCMAT v3
@DYNINFO
element Og
fraction 1
type freegas
@DENSITY
1.0 kg_per_m3
";
    let data = parse_ncmat(Box::new(MemorySource::new("t.ncmat", content))).unwrap();
    match load_ncmat(&data, &NcmatLoadCfg::default()) {
        Err(nxtal_info::Error::Atom(_)) => {}
        other => panic!("expected atom lookup failure, got {other:?}"),
    }
}

#[test]
fn dump_summarises_the_material() {
    let cfg = NcmatLoadCfg {
        dcutoff: 0.5,
        ..Default::default()
    };
    let dump = load(AL_SG225, &cfg).dump();
    assert!(dump.contains("density"), "{dump}");
    assert!(dump.contains("293.15 K"), "{dump}");
    assert!(dump.contains("component     : Al at 100 %"), "{dump}");
    assert!(dump.contains("hkl families"), "{dump}");

    // non-crystalline materials have no cell or hkl lines
    let dump = load(HE_FREEGAS, &NcmatLoadCfg::default()).dump();
    assert!(!dump.contains("cell"), "{dump}");
    assert!(dump.contains("dynamics      : 1 entries"), "{dump}");
}

#[test]
fn temperature_override() {
    let cfg = NcmatLoadCfg {
        temp: 600.0,
        dcutoff: 1.0,
        ..Default::default()
    };
    let info = load(AL_SG225, &cfg);
    assert_eq!(info.temperature(), Some(600.0));

    // hotter material, larger displacements
    let cold = load(
        AL_SG225,
        &NcmatLoadCfg {
            temp: 100.0,
            dcutoff: 1.0,
            ..Default::default()
        },
    );
    assert!(info.atoms()[0].msd.unwrap() > cold.atoms()[0].msd.unwrap());
}
