use super::*;

fn kernel(k: [f64; 9]) -> ConvolveParams {
    ConvolveParams::square(3, k.to_vec())
}

#[test]
fn sobel_matches_in_all_eight_rotations() {
    let horizontal = kernel([1.0, 2.0, 1.0, 0.0, 0.0, 0.0, -1.0, -2.0, -1.0]);
    assert_eq!(
        classify_kernel(&horizontal, 3),
        Some(KnownKernel::Sobel { rotation: 0 })
    );
    let vertical = kernel([-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0]);
    assert_eq!(
        classify_kernel(&vertical, 3),
        Some(KnownKernel::Sobel { rotation: 90 })
    );
    let flipped = kernel([-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0]);
    assert_eq!(
        classify_kernel(&flipped, 3),
        Some(KnownKernel::Sobel { rotation: 180 })
    );
    let diagonal = kernel([2.0, 1.0, 0.0, 1.0, 0.0, -1.0, 0.0, -1.0, -2.0]);
    assert!(matches!(
        classify_kernel(&diagonal, 3),
        Some(KnownKernel::Sobel { .. })
    ));
}

#[test]
fn laplacians_match_up_to_scale() {
    let l4 = kernel([0.0, -2.0, 0.0, -2.0, 8.0, -2.0, 0.0, -2.0, 0.0]);
    assert_eq!(classify_kernel(&l4, 3), Some(KnownKernel::Laplacian4));
    let l8 = kernel([1.0, 1.0, 1.0, 1.0, -8.0, 1.0, 1.0, 1.0, 1.0]);
    assert_eq!(classify_kernel(&l8, 3), Some(KnownKernel::Laplacian8));
}

#[test]
fn other_kernels_do_not_match() {
    let blur = kernel([1.0; 9]);
    assert_eq!(classify_kernel(&blur, 3), None);
    let zero = kernel([0.0; 9]);
    assert_eq!(classify_kernel(&zero, 3), None);
    let sobel = kernel([1.0, 2.0, 1.0, 0.0, 0.0, 0.0, -1.0, -2.0, -1.0]);
    assert_eq!(classify_kernel(&sobel, 2), None);
    let five = ConvolveParams::square(5, vec![1.0; 25]);
    assert_eq!(classify_kernel(&five, 5), None);
}

fn all_rgb(f: TransferFunction) -> ComponentTransferParams {
    ComponentTransferParams {
        func_r: f.clone(),
        func_g: f.clone(),
        func_b: f,
        func_a: TransferFunction::Identity,
    }
}

#[test]
fn transfer_shapes_are_classified() {
    assert_eq!(
        classify_transfer(&ComponentTransferParams::default()),
        Some(TransferShape::Identity)
    );
    assert_eq!(
        classify_transfer(&all_rgb(TransferFunction::Discrete {
            table_values: vec![0.0, 1.0]
        })),
        Some(TransferShape::BinaryThreshold { threshold: 0.5 })
    );
    assert_eq!(
        classify_transfer(&all_rgb(TransferFunction::Gamma {
            amplitude: 1.0,
            exponent: 2.2,
            offset: 0.0
        })),
        Some(TransferShape::Gamma { exponent: 2.2 })
    );
    assert_eq!(
        classify_transfer(&all_rgb(TransferFunction::Table {
            table_values: vec![0.4, 0.4]
        })),
        Some(TransferShape::Grayscale { level: 0.4 })
    );
    let duo = ComponentTransferParams {
        func_r: TransferFunction::Table {
            table_values: vec![0.0, 1.0],
        },
        func_g: TransferFunction::Table {
            table_values: vec![0.0, 0.5],
        },
        func_b: TransferFunction::Table {
            table_values: vec![1.0, 0.0],
        },
        func_a: TransferFunction::Identity,
    };
    assert_eq!(
        classify_transfer(&duo),
        Some(TransferShape::Duotone {
            dark: Rgba8::rgb(0, 0, 255),
            light: Rgba8::rgb(255, 128, 0),
        })
    );
    let fade = ComponentTransferParams {
        func_a: TransferFunction::Linear {
            slope: 0.5,
            intercept: 0.0,
        },
        ..ComponentTransferParams::default()
    };
    assert_eq!(
        classify_transfer(&fade),
        Some(TransferShape::AlphaModulate { amount: 0.5 })
    );
}

#[test]
fn unclassified_transfers_return_none() {
    let wavy = all_rgb(TransferFunction::Table {
        table_values: vec![0.0, 1.0, 0.0, 1.0],
    });
    assert_eq!(classify_transfer(&wavy), None);
    let mixed_alpha = ComponentTransferParams {
        func_a: TransferFunction::Gamma {
            amplitude: 1.0,
            exponent: 3.0,
            offset: 0.0,
        },
        ..all_rgb(TransferFunction::Gamma {
            amplitude: 1.0,
            exponent: 2.0,
            offset: 0.0,
        })
    };
    assert_eq!(classify_transfer(&mixed_alpha), None);
}

#[test]
fn linear_maps_classify_only_when_exact() {
    let linear = |slope: f64, intercept: f64| all_rgb(TransferFunction::Linear { slope, intercept });
    assert_eq!(
        classify_transfer(&linear(-1.0, 1.0)),
        Some(TransferShape::Duotone {
            dark: Rgba8::rgb(255, 255, 255),
            light: Rgba8::rgb(0, 0, 0),
        })
    );
    assert_eq!(
        classify_transfer(&linear(1.5, -0.25)),
        Some(TransferShape::Luminance {
            brightness: 0.0,
            contrast: 0.5,
        })
    );
    // Steep inversion clamps at both ends; neither shape reproduces it.
    assert_eq!(classify_transfer(&linear(-3.0, 2.0)), None);
    assert_eq!(classify_transfer(&linear(4.0, -1.5)), None);
    let out_of_range = all_rgb(TransferFunction::Table {
        table_values: vec![-0.5, 1.5],
    });
    assert_eq!(classify_transfer(&out_of_range), None);
}
