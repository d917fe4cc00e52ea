//! Save → load reproduces a universe exactly, and restored universes
//! keep evolving the same way.

use std::sync::Arc;

use cellua_core::Generation;
use cellua_engine::{EngineConfig, Universe, UniverseConfig};
use cellua_persist::{
    decode_image, encode_image, universe_hash, PersistError, RuleRef, RuleResolver,
    RulestringResolver, UniverseImage,
};
use cellua_rule::{Rule, TotalisticRule};
use cellua_space::BoundaryPolicy;
use cellua_test_utils::{glider, soup, IncrementRule};
use proptest::prelude::*;

fn save(u: &Universe) -> Vec<u8> {
    let mut out = Vec::new();
    encode_image(&mut out, &UniverseImage::capture(u)).unwrap();
    out
}

fn load(bytes: &[u8], resolver: &dyn RuleResolver) -> Result<Universe, PersistError> {
    let image = decode_image(&mut &bytes[..])?;
    image.restore(resolver, EngineConfig::default())
}

fn torus_life() -> Universe {
    let config = UniverseConfig::new(2, Arc::new(TotalisticRule::life()))
        .with_boundaries(vec![BoundaryPolicy::looped(0, 15); 2]);
    let mut u = Universe::new(config).unwrap();
    for c in glider(2, 3) {
        u.set_cell(&c, 1).unwrap();
    }
    u
}

#[test]
fn native_rule_round_trip() {
    let mut u = torus_life();
    u.step(5, None).unwrap();
    let mut restored = load(&save(&u), &RulestringResolver).unwrap();

    assert_eq!(restored.current_generation(), Generation(5));
    assert_eq!(universe_hash(&restored), universe_hash(&u));
    assert_eq!(restored.topology().policies(), u.topology().policies());
    assert_eq!(restored.rule().unwrap().name(), "B3/S23");

    u.step(7, None).unwrap();
    restored.step(7, None).unwrap();
    assert_eq!(universe_hash(&restored), universe_hash(&u));
    assert_eq!(restored.current_generation(), Generation(12));
}

#[test]
fn restored_generation_is_the_reset_point() {
    let mut u = torus_life();
    u.step(3, None).unwrap();
    let mut restored = load(&save(&u), &RulestringResolver).unwrap();
    let at_load = universe_hash(&restored);
    restored.step(4, None).unwrap();
    restored.reset_to_generation_zero();
    assert_eq!(restored.current_generation(), Generation(3));
    assert_eq!(universe_hash(&restored), at_load);
}

#[test]
fn script_rules_travel_with_their_source() {
    let script = "name: decay\nstates: 3\nrange: 1\ntransition: if state > 0 then state - 1 else 0\n";
    let mut config = UniverseConfig::new(3, Arc::new(TotalisticRule::life()));
    config.rule = None;
    let mut u = Universe::new(config).unwrap();
    u.load_rule_script(script).unwrap();
    u.set_cell(&[1, 2, 3], 7).unwrap();
    u.set_cell(&[-1, 0, 9], 4).unwrap();

    let no_natives = |_: &str| -> Option<Arc<dyn Rule>> { None };
    let mut restored = load(&save(&u), &no_natives).unwrap();
    assert_eq!(restored.rule().unwrap().source(), Some(script));
    assert_eq!(restored.codec().bits(), 3);
    assert_eq!(restored.get_cell(&[1, 2, 3]), 7);

    restored.step(5, None).unwrap();
    assert_eq!(restored.get_cell(&[1, 2, 3]), 2);
    assert_eq!(restored.get_cell(&[-1, 0, 9]), 0);
}

#[test]
fn unknown_native_rules_are_reported() {
    let config = UniverseConfig::new(1, Arc::new(IncrementRule::new()));
    let mut u = Universe::new(config).unwrap();
    u.set_cell(&[0], 9).unwrap();
    let err = load(&save(&u), &RulestringResolver).unwrap_err();
    assert!(matches!(err, PersistError::MissingRule { ref name } if name == "increment"));

    let with_increment = |name: &str| -> Option<Arc<dyn Rule>> {
        (name == "increment").then(|| Arc::new(IncrementRule::new()) as Arc<dyn Rule>)
    };
    let restored = load(&save(&u), &with_increment).unwrap();
    assert_eq!(restored.get_cell(&[0]), 9);
}

#[test]
fn rule_width_must_match_the_image() {
    let image = UniverseImage {
        dimensions: 1,
        boundaries: vec![BoundaryPolicy::Infinite],
        rule: Some(RuleRef {
            name: "B3/S23".into(),
            source: None,
        }),
        state_bits: 4,
        generation: Generation(0),
        cells: Vec::new(),
    };
    let err = image
        .restore(&RulestringResolver, EngineConfig::default())
        .unwrap_err();
    assert!(matches!(
        err,
        PersistError::RuleMismatch {
            expected_bits: 4,
            found_bits: 1,
            ..
        }
    ));
}

#[test]
fn invalid_geometry_is_a_config_error() {
    let image = UniverseImage {
        dimensions: 1,
        boundaries: vec![BoundaryPolicy::Finite { lo: 5, hi: 1 }],
        rule: None,
        state_bits: 1,
        generation: Generation(0),
        cells: Vec::new(),
    };
    let mut bytes = Vec::new();
    encode_image(&mut bytes, &image).unwrap();
    let err = load(&bytes, &RulestringResolver).unwrap_err();
    assert!(matches!(err, PersistError::Config(_)));
}

proptest! {
    #[test]
    fn save_load_preserves_arbitrary_soups(
        dims in 1usize..=4,
        density in 5u64..60,
        seed in any::<u64>(),
        generation in 0u64..1_000,
    ) {
        let config = UniverseConfig::new(dims, Arc::new(TotalisticRule::life()));
        let mut u = Universe::new(config).unwrap();
        let cells = soup(dims, 5, density, seed);
        u.restore_generation(Generation(generation), cells.iter().map(|c| (c.clone(), 1)))
            .unwrap();

        let bytes = save(&u);
        let restored = load(&bytes, &RulestringResolver).unwrap();
        prop_assert_eq!(universe_hash(&restored), universe_hash(&u));
        prop_assert_eq!(restored.population(), cells.len());
        prop_assert_eq!(restored.current_generation(), Generation(generation));
        // Equal universes encode to identical bytes.
        prop_assert_eq!(save(&restored), bytes);
    }
}
