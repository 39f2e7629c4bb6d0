use super::*;

#[test]
fn presets_order_their_ceilings() {
    let speed = ComplexityBudget::preset(Preset::Speed);
    let balanced = ComplexityBudget::preset(Preset::Balanced);
    let quality = ComplexityBudget::preset(Preset::Quality);
    assert!(speed.native_ceiling < balanced.native_ceiling);
    assert!(balanced.native_ceiling < quality.native_ceiling);
    assert!(speed.max_chain_depth < quality.max_chain_depth);
    for b in [speed, balanced, quality] {
        b.validate().unwrap();
    }
}

#[test]
fn json_fills_missing_fields_with_defaults() {
    let opts = ConvertOptions::from_json_str(
        r#"{ "budget": { "max_chain_depth": 3, "weights": { "tile": 0.0 } },
             "geometry": { "backend": "flattening" } }"#,
    )
    .unwrap();
    assert_eq!(opts.budget.max_chain_depth, 3);
    assert_eq!(opts.budget.weights.tile, 0.0);
    assert_eq!(opts.budget.weights.morphology, KindWeights::default().morphology);
    assert_eq!(opts.geometry.backend, GeometryBackend::Flattening);
    assert_eq!(opts.geometry.tolerance, 0.1);
}

#[test]
fn invalid_options_are_rejected() {
    assert!(ConvertOptions::from_json_str(r#"{ "geometry": { "tolerance": 0.0 } }"#).is_err());
    assert!(
        ConvertOptions::from_json_str(
            r#"{ "budget": { "native_ceiling": 9.0, "hybrid_ceiling": 1.0 } }"#
        )
        .is_err()
    );
    assert!(ConvertOptions::from_json_str("{ not json").is_err());
}
