//! Integration tests for randsuite-tests.
//!
//! These drive the public API end to end: sequence construction, the full
//! battery, configuration loading and the statistical behaviour of the tests
//! on seeded pseudo-random input.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use randsuite_tests::{
    Battery, BatteryConfig, BitSequence, Error, SignificanceLevel, TestCase, TestKind,
    UniversalParams, binary_matrix_rank, random_excursions,
};

fn random_sequence(seed: u64, n_bytes: usize) -> BitSequence {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; n_bytes];
    rng.fill(&mut data[..]);
    BitSequence::from_bytes(&data)
}

#[test]
fn matrix_rank_accepts_random_data_in_most_trials() {
    let level = SignificanceLevel::default();
    let trials = 20;
    let random = (0..trials)
        .filter(|&seed| {
            let seq = random_sequence(seed, 102_400 / 8);
            let p = binary_matrix_rank(&seq).unwrap().p_values()[0];
            level.is_random(p)
        })
        .count();
    assert!(
        random >= 17,
        "only {random}/{trials} trials judged random"
    );
}

#[test]
fn battery_reports_every_test_in_order() {
    let battery = Battery::new(random_sequence(7, 1 << 14), SignificanceLevel::default());
    let report = battery.run_all();
    assert_eq!(report.bits, 1 << 17);
    let kinds: Vec<TestKind> = report.entries.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, TestKind::ALL.to_vec());

    // 2^17 bits is below the universal test's minimum; everything else runs.
    for entry in &report.entries {
        match entry.kind {
            TestKind::Universal => assert!(matches!(entry.outcome, Err(Error::InvalidInput(_)))),
            kind => assert!(entry.outcome.is_ok(), "{kind}: {:?}", entry.outcome),
        }
    }

    let templates = report.get(TestKind::NonOverlappingTemplate).unwrap();
    assert_eq!(templates.outcome.as_ref().unwrap().outcomes.len(), 256);
    let variant = report.get(TestKind::RandomExcursionsVariant).unwrap();
    assert_eq!(variant.outcome.as_ref().unwrap().outcomes.len(), 18);
    assert!(report.passed_count() >= 11);
}

#[test]
fn battery_is_pure() {
    let battery = Battery::new(random_sequence(11, 4_096), SignificanceLevel::default());
    let first = battery.run_all();
    let second = battery.run_all();
    assert_eq!(first, second);
}

#[test]
fn level_changes_verdicts_not_p_values() {
    let mut battery = Battery::new(random_sequence(3, 2_048), SignificanceLevel::default());
    let lenient = battery.run(TestKind::Serial).unwrap();
    battery.set_level(0.999_999).unwrap();
    let strict = battery.run(TestKind::Serial).unwrap();
    assert_eq!(lenient.p_values(), strict.p_values());
    assert!(!strict.passed());
}

#[test]
fn empty_walk_has_no_cycles() {
    let battery = Battery::configure(Vec::new(), 0.01).unwrap();
    assert!(matches!(
        battery.run(TestKind::RandomExcursions),
        Err(Error::PreconditionNotMet(_))
    ));
    assert!(matches!(
        random_excursions(battery.sequence()),
        Err(Error::PreconditionNotMet(_))
    ));
}

#[test]
fn config_loads_from_partial_json() {
    let config: BatteryConfig = serde_json::from_str(
        r#"{
            "serial_block_len": 5,
            "universal_params": { "block_len": 6, "init_blocks": 640 },
            "overlapping_template": [1, 1, 1]
        }"#,
    )
    .unwrap();
    assert_eq!(config.serial_block_len, Some(5));
    assert_eq!(
        config.universal_params,
        Some(UniversalParams {
            block_len: 6,
            init_blocks: 640
        })
    );
    assert_eq!(config.overlapping_template, vec![1, 1, 1]);
    assert_eq!(config.linear_complexity_block_size, 500);
    assert_eq!(config.non_overlapping_blocks, 8);

    let battery = Battery::new(random_sequence(5, 1_024), SignificanceLevel::default())
        .with_config(config)
        .unwrap();
    let serial = battery.run(TestKind::Serial).unwrap();
    assert_eq!(serial.outcomes.len(), 2);
    assert!(serial.details.starts_with("m=5"));
}

#[test]
fn explicit_cases_override_defaults() {
    let battery = Battery::new(random_sequence(9, 1_250), SignificanceLevel::default());
    let suite = battery
        .run_case(&TestCase::NonOverlappingTemplateSuite {
            template_len: 4,
            block_size: 1_000,
        })
        .unwrap();
    assert_eq!(suite.outcomes.len(), 8);
    assert!(matches!(
        battery.run_case(&TestCase::NonOverlappingTemplate {
            template: vec![0, 0, 1],
            block_size: 3_000,
        }),
        Err(Error::InvalidInput(_))
    ));
}

#[test]
fn report_serializes_to_json() {
    let battery = Battery::new(random_sequence(1, 128), SignificanceLevel::default());
    let report = battery.run_all();
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["entries"].as_array().unwrap().len(), 15);
    assert_eq!(json["entries"][0]["kind"], "frequency");
    assert!(json["entries"][0]["outcome"]["Ok"]["outcomes"].is_array());
}

#[test]
#[ignore] // Run with: cargo test -- --ignored
fn full_size_battery_on_a_million_bits() {
    let battery = Battery::new(random_sequence(42, 125_000), SignificanceLevel::default());
    let report = battery.run_all();
    assert_eq!(report.error_count(), 0, "{report:#?}");
    assert!(report.passed_count() >= 13);
}
