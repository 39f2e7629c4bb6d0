use super::*;
use crate::config::Preset;
use crate::emf::{Density, PatternKind, PatternParams};
use crate::foundation::core::{Point, Rect};
use crate::model::{
    ConvolveParams, DisplacementMap, DisplacementParams, MorphologyParams,
    SpecularLightingParams,
};

fn square() -> PathSpec {
    PathSpec::rect(Rect::new(0.0, 0.0, 10.0, 10.0))
}

fn node(kind: PrimitiveKind) -> FilterPrimitiveNode {
    FilterPrimitiveNode::new(kind)
}

const TOL: f64 = 0.1;

fn budget() -> ComplexityBudget {
    ComplexityBudget::default()
}

fn sobel() -> PrimitiveKind {
    PrimitiveKind::ConvolveMatrix(ConvolveParams::square(
        3,
        vec![1.0, 2.0, 1.0, 0.0, 0.0, 0.0, -1.0, -2.0, -1.0],
    ))
}

#[test]
fn sobel_is_native_and_random_5x5_falls_back() {
    let d = analyze_node(&node(sobel()), 0, &square(), &budget(), TOL);
    assert_eq!(d.strategy, Strategy::NativeVector);
    assert!(!d.is_forced());

    let random: Vec<f64> = (0..25).map(|i| ((i * 7919) % 13) as f64 - 6.0).collect();
    let d = analyze_node(
        &node(PrimitiveKind::ConvolveMatrix(ConvolveParams::square(5, random))),
        0,
        &square(),
        &budget(),
        TOL,
    );
    assert_eq!(d.strategy, Strategy::BinaryFallback);
    assert!(d.is_forced());
}

#[test]
fn chain_over_depth_budget_falls_back_entirely() {
    let nodes: Vec<_> = (0..20)
        .map(|_| node(PrimitiveKind::Morphology(MorphologyParams::dilate(1.0))))
        .collect();
    for preset in [Preset::Speed, Preset::Balanced, Preset::Quality] {
        let a = analyze_chain(
            &FilterChain::new(nodes.clone()),
            &square(),
            &ComplexityBudget::preset(preset),
            TOL,
        );
        assert_eq!(a.nodes.len(), 20);
        assert!(
            a.nodes
                .iter()
                .all(|d| d.strategy == Strategy::BinaryFallback)
        );
        assert_eq!(a.first_deferred(), Some(0));
    }
}

#[test]
fn cumulative_score_forces_the_tail() {
    let b = ComplexityBudget {
        max_total_score: 2.5,
        ..budget()
    };
    let chain = FilterChain::new(
        (0..3)
            .map(|_| node(PrimitiveKind::Morphology(MorphologyParams::dilate(1.0))))
            .collect(),
    );
    let a = analyze_chain(&chain, &square(), &b, TOL);
    let strategies: Vec<Strategy> = a.nodes.iter().map(|d| d.strategy).collect();
    assert_eq!(
        strategies,
        vec![
            Strategy::NativeVector,
            Strategy::NativeVector,
            Strategy::BinaryFallback
        ]
    );
    assert_eq!(a.overall(), Strategy::BinaryFallback);
}

#[test]
fn tile_and_unsupported_always_fall_back() {
    let tile = node(PrimitiveKind::Tile(PatternParams::new(
        PatternKind::Hatch,
        Density::Medium,
    )));
    let unsupported = node(PrimitiveKind::Unsupported {
        name: "feTurbulence".into(),
    });
    for n in [tile, unsupported] {
        let d = analyze_node(&n, 0, &square(), &budget(), TOL);
        assert_eq!(d.strategy, Strategy::BinaryFallback);
        assert!(d.is_forced());
    }
}

#[test]
fn spot_light_with_cone_falls_back() {
    let spot = |cone: Option<f64>| {
        node(PrimitiveKind::SpecularLighting(SpecularLightingParams {
            light: LightSource::Spot {
                x: 0.0,
                y: 0.0,
                z: 10.0,
                points_at_x: 5.0,
                points_at_y: 5.0,
                points_at_z: 0.0,
                specular_exponent: 1.0,
                limiting_cone_angle: cone,
            },
            ..SpecularLightingParams::default()
        }))
    };
    let with_cone = analyze_node(&spot(Some(30.0)), 0, &square(), &budget(), TOL);
    assert_eq!(with_cone.strategy, Strategy::BinaryFallback);
    let open = analyze_node(&spot(None), 0, &square(), &budget(), TOL);
    assert_eq!(open.strategy, Strategy::NativeVector);
}

#[test]
fn morphology_radius_is_bounded_by_the_bbox() {
    let ok = analyze_node(
        &node(PrimitiveKind::Morphology(MorphologyParams::dilate(5.0))),
        0,
        &square(),
        &budget(),
        TOL,
    );
    assert_eq!(ok.strategy, Strategy::NativeVector);
    let huge = analyze_node(
        &node(PrimitiveKind::Morphology(MorphologyParams::dilate(20.0))),
        0,
        &square(),
        &budget(),
        TOL,
    );
    assert!(huge.is_forced());
}

#[test]
fn geometry_complexity_moves_lighting_to_hybrid() {
    let pts: Vec<Point> = (0..300)
        .map(|i| {
            let t = i as f64 / 300.0 * std::f64::consts::TAU;
            Point::new(50.0 + 40.0 * t.cos(), 50.0 + 40.0 * t.sin())
        })
        .collect();
    let busy = PathSpec::polygon(&pts, Default::default());
    let d = analyze_node(
        &node(PrimitiveKind::SpecularLighting(
            SpecularLightingParams::default(),
        )),
        0,
        &busy,
        &budget(),
        TOL,
    );
    assert_eq!(d.strategy, Strategy::Hybrid, "{d:?}");
}

#[test]
fn displacement_vertex_budget_forces_fallback() {
    let map = DisplacementMap::new(1, 1, vec![128, 128, 128, 255]).unwrap();
    let n = node(PrimitiveKind::DisplacementMap(DisplacementParams {
        scale: 10.0,
        x_channel: Default::default(),
        y_channel: Default::default(),
        map: Some(map),
    }));
    let b = ComplexityBudget {
        displacement_max_vertices: 100,
        ..budget()
    };
    assert!(analyze_node(&n, 0, &square(), &b, TOL).is_forced());
    assert!(!analyze_node(&n, 0, &square(), &budget(), TOL).is_forced());
}

#[test]
fn displacement_budget_uses_the_flattening_tolerance() {
    let map = DisplacementMap::new(1, 1, vec![128, 128, 128, 255]).unwrap();
    // A small scale gives one piece per flattened edge, so only the flattening counts.
    let n = node(PrimitiveKind::DisplacementMap(DisplacementParams {
        scale: 0.001,
        x_channel: Default::default(),
        y_channel: Default::default(),
        map: Some(map),
    }));
    let circle = PathSpec::circle(Point::new(50.0, 50.0), 40.0, 0.1);
    let step = displacement_step(0.001, &budget());
    let coarse = subdivided_vertex_count(&circle, step, 1.0);
    let fine = subdivided_vertex_count(&circle, step, 0.001);
    assert!(fine > coarse);
    let b = ComplexityBudget {
        displacement_max_vertices: coarse,
        ..budget()
    };
    assert!(!analyze_node(&n, 0, &circle, &b, 1.0).is_forced());
    assert!(analyze_node(&n, 0, &circle, &b, 0.001).is_forced());
}

#[test]
fn analysis_is_deterministic() {
    let chain = FilterChain::new(vec![
        node(sobel()),
        node(PrimitiveKind::Morphology(MorphologyParams::erode(1.0))),
    ]);
    let a = analyze(AnalysisInput::Chain(&chain), &square(), &budget(), TOL);
    let b = analyze(AnalysisInput::Chain(&chain), &square(), &budget(), TOL);
    assert_eq!(a, b);
    assert_eq!(a.strategy, Strategy::NativeVector);
}

#[test]
fn clips_fall_back_only_past_the_segment_budget() {
    let clip = ClipDefinition::new(vec![square()]);
    let d = analyze(AnalysisInput::Clip(&clip), &square(), &budget(), TOL);
    assert_eq!(d.strategy, Strategy::NativeVector);
    let tight = ComplexityBudget {
        max_clip_segments: 3,
        ..budget()
    };
    let d = analyze_clip(&clip, &square(), &tight);
    assert_eq!(d.strategy, Strategy::BinaryFallback);
    assert!(d.is_forced());
}
