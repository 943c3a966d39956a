//! Config validation, edits and JSON loading.

use vbp_core::{
    adjustment_subsystem::{COA_CAP, SSA_CAP},
    command::ConfigEdit,
    config::{CostSharing, Penetration, PerTrack, ProgramConfig, RateSchedule},
    engine::LedgerEngine,
    types::Track,
    ModelError,
};

fn assert_invalid(result: Result<impl std::fmt::Debug, ModelError>, field: &str) {
    match result {
        Err(ModelError::InvalidInput { field: f, .. }) => {
            assert!(f.starts_with(field), "expected field {field}, got {f}")
        }
        other => panic!("expected InvalidInput for {field}, got {other:?}"),
    }
}

#[test]
fn default_configs_are_valid() {
    ProgramConfig::default().validate().unwrap();
    ProgramConfig::default_test().validate().unwrap();
}

#[test]
fn non_positive_panel_is_rejected_by_engine() {
    for total_panel in [0.0, -5.0, f64::NAN] {
        let config = ProgramConfig { total_panel, ..ProgramConfig::default() };
        assert_invalid(LedgerEngine::new(config).run(&[]), "total_panel");
    }
}

#[test]
fn ramp_outside_six_to_eighteen_is_rejected() {
    for ramp_months in [0, 5, 19] {
        let config = ProgramConfig { ramp_months, ..ProgramConfig::default() };
        assert_invalid(config.validate(), "ramp_months");
    }
}

#[test]
fn out_of_range_rates_are_rejected() {
    let mut config = ProgramConfig::default();
    config.vendor_share = 1.5;
    assert_invalid(config.validate(), "vendor_share");

    let mut config = ProgramConfig::default();
    config.oar.bh = -0.1;
    assert_invalid(config.validate(), "oar.BH");

    let mut config = ProgramConfig::default();
    config.eligible.msk = -1.0;
    assert_invalid(config.validate(), "eligible.MSK");
}

#[test]
fn edit_returns_new_value_and_leaves_original() {
    let original = ProgramConfig::default();
    let edited = original
        .apply(&ConfigEdit::SetAnnualChurn { annual_churn: 0.3 })
        .unwrap();

    assert_eq!(original.annual_churn, 0.20);
    assert_eq!(edited.annual_churn, 0.3);
    assert_eq!(ProgramConfig { annual_churn: 0.20, ..edited }, original);
}

#[test]
fn edits_cover_per_track_fields() {
    let config = ProgramConfig::default()
        .apply(&ConfigEdit::SetOar { track: Track::Msk, oar: 0.9 })
        .unwrap()
        .apply(&ConfigEdit::SetSsr { track: Track::Msk, ssr: 0.7 })
        .unwrap()
        .apply(&ConfigEdit::SetEligible { track: Track::Bh, eligible: 500.0 })
        .unwrap()
        .apply(&ConfigEdit::SetControlGroup { year: 2, enabled: true })
        .unwrap()
        .apply(&ConfigEdit::SetCostSharing { cost_sharing: CostSharing::Collected })
        .unwrap();

    assert_eq!(config.oar.msk, 0.9);
    assert_eq!(config.ssr.msk, 0.7);
    assert_eq!(config.eligible.bh, 500.0);
    assert_eq!(config.control_group, [false, true, false]);
    assert_eq!(config.rate_multiplier(), 1.25);
}

#[test]
fn invalid_edits_are_rejected() {
    let config = ProgramConfig::default();
    assert_invalid(config.apply(&ConfigEdit::SetRampMonths { ramp_months: 24 }), "ramp_months");
    assert_invalid(
        config.apply(&ConfigEdit::SetControlGroup { year: 4, enabled: true }),
        "control_group",
    );
    assert_invalid(config.apply(&ConfigEdit::SetTotalPanel { total_panel: 0.0 }), "total_panel");
}

#[test]
fn edits_deserialize_from_tagged_json() {
    let edit: ConfigEdit =
        serde_json::from_str(r#"{"edit":"set_oar","track":"e_ckm","oar":0.4}"#).unwrap();
    assert_eq!(edit, ConfigEdit::SetOar { track: Track::ECkm, oar: 0.4 });

    let edit: ConfigEdit = serde_json::from_str(
        r#"{"edit":"set_penetration","penetration":{"mode":"uniform","rate":0.3}}"#,
    )
    .unwrap();
    assert_eq!(
        edit,
        ConfigEdit::SetPenetration { penetration: Penetration::Uniform { rate: 0.3 } }
    );
}

#[test]
fn per_track_penetration_applies_per_track() {
    let mut rates = PerTrack::splat(0.25);
    rates.set(Track::Msk, 0.0);
    let config = ProgramConfig {
        penetration: Penetration::PerTrack { rates },
        ..ProgramConfig::default()
    };

    let report = vbp_core::run_ledger(&config, &[]).unwrap();
    assert!(report
        .ledger
        .iter()
        .all(|r| r.monthly.tracks[&Track::Msk].enrolled() == 0.0));
    assert!(report.ledger[0].monthly.tracks[&Track::Bh].enrolled() > 0.0);
}

#[test]
fn config_loads_from_json_file_with_defaulted_blocks() {
    let mut value = serde_json::to_value(ProgramConfig::default()).unwrap();
    let obj = value.as_object_mut().unwrap();
    obj.remove("rates");
    obj.remove("heuristics");

    let dir = std::env::temp_dir().join(format!("vbp-config-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("program.json");
    std::fs::write(&path, serde_json::to_string_pretty(&value).unwrap()).unwrap();

    let loaded = ProgramConfig::load_dir(dir.to_str().unwrap()).unwrap();
    assert_eq!(loaded, ProgramConfig::default());
    assert_eq!(
        loaded.rates.msk,
        RateSchedule::InitialOnly { initial: 15.0 }
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn missing_config_file_is_an_error() {
    let err = ProgramConfig::load("/nonexistent/program.json").unwrap_err();
    assert!(err.to_string().contains("Cannot read"));
}

#[test]
fn adjustment_caps_and_thresholds_ignore_json_overrides() {
    let mut value = serde_json::to_value(ProgramConfig::default()).unwrap();
    let heuristics = value["heuristics"].as_object_mut().unwrap();
    heuristics.insert("coa_cap".into(), serde_json::json!(1.0));
    heuristics.insert("ssa_cap".into(), serde_json::json!(1.0));
    heuristics.insert("early_outcome_threshold".into(), serde_json::json!(0.95));
    heuristics.insert("substitute_spend_threshold".into(), serde_json::json!(1.0));
    value["oar"]["bh"] = serde_json::json!(0.0);
    value["ssr"]["bh"] = serde_json::json!(0.0);

    let config: ProgramConfig = serde_json::from_value(value).unwrap();
    config.validate().unwrap();
    assert_eq!(config.heuristics, vbp_core::config::Heuristics::default());

    let report = vbp_core::run_ledger(&config, &[Track::Bh]).unwrap();
    let state = report.adjustments[&Track::Bh];
    assert_eq!(state.coa_early, COA_CAP);
    assert_eq!(state.ssa, SSA_CAP);
    assert_eq!(state.applied_early, 0.5);
    assert_eq!(state.applied_late, 0.5);
    assert!(report.ledger.iter().all(|r| (0.0..=0.5).contains(&r.blended_adjustment)));
}
