//! Integration test: two-stage cascade driven through the predictor seam.

use std::time::Duration;

use fc_reactor::{
    CascadeConfig, CascadeInputs, ConcentrationPredictor, ReactorCascade, ReactorConfig,
    StageConfig,
};

fn compact_config() -> CascadeConfig {
    let defaults = CascadeConfig::default();
    let shrink = |stage: StageConfig| StageConfig {
        reactor: ReactorConfig {
            nodes: 40,
            volume_m3: 1e-6,
            ..stage.reactor
        },
        ..stage
    };
    CascadeConfig {
        primary: shrink(defaults.primary),
        secondary: shrink(defaults.secondary),
        quench_temperature_c: 25.0,
    }
}

#[test]
fn zero_flow_keeps_outlets_near_baseline() {
    let mut cascade = ReactorCascade::from_config(&compact_config()).expect("valid config");
    let idle = CascadeInputs {
        temperature_k: 298.15,
        ..CascadeInputs::default()
    };
    let prediction = cascade.step_for(&idle, Duration::from_secs(2));

    assert!(prediction.primary.abs() < 1e-2, "primary {}", prediction.primary);
    assert!(prediction.secondary.abs() < 1e-2, "secondary {}", prediction.secondary);
    let outlet_a = cascade.primary().state().concentration_a();
    assert!((outlet_a[outlet_a.len() - 1] - 1.0).abs() < 1e-3);
}

#[test]
fn hot_primary_feeds_product_into_secondary() {
    let mut cascade = ReactorCascade::from_config(&compact_config()).expect("valid config");
    let inputs = CascadeInputs {
        flow_a: 4e-8,
        flow_b: 4e-8,
        solvent_flow: 4e-8,
        temperature_k: 423.15,
    };
    let prediction = cascade.step_for(&inputs, Duration::from_secs(60));

    assert!(prediction.primary > 0.0);
    assert!(prediction.secondary.is_finite());
    assert_eq!(cascade.secondary().stock_a(), cascade.primary().outlet_concentration());
}

#[test]
fn predictor_trait_object_drives_the_cascade() {
    let cascade = ReactorCascade::from_config(&compact_config()).expect("valid config");
    let mut predictor: Box<dyn ConcentrationPredictor> = Box::new(cascade);
    let first = predictor.predict(&CascadeInputs {
        flow_a: 4e-8,
        flow_b: 4e-8,
        solvent_flow: 4e-8,
        temperature_k: 423.15,
    });
    assert!(first.primary.is_finite());
    assert!(first.secondary.is_finite());
}
