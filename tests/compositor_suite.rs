use blob_visualizer::shading::{
    DEFAULT_ASPECT, ParamRange, ParamRanges, Rgb, Rgba, ShaderParams, ShapeFormula, Vec2, composite,
    shade, sphere_distance, surface_coord,
};

fn uv_grid() -> Vec<Vec2> {
    let mut v = Vec::new();
    for i in 0..13 {
        for j in 0..13 {
            v.push(Vec2::new(
                (i as f32 / 12.0 * 2.0 - 1.0) * 1.8,
                (j as f32 / 12.0 * 2.0 - 1.0) * 1.3,
            ));
        }
    }
    v
}

/// Every parameter at both ends of its default range, plus the defaults.
fn corner_params() -> Vec<ShaderParams> {
    let r = ParamRanges::default();
    let mut out = vec![ShaderParams::default()];
    for lo in [true, false] {
        let pick = |range: ParamRange| if lo { range.min } else { range.max };
        out.push(ShaderParams {
            speed: pick(r.speed),
            complexity: pick(r.complexity),
            color_intensity: pick(r.color_intensity),
            grain_amount: pick(r.grain_amount),
            sphere_effect: pick(r.sphere_effect),
            layer_compression: pick(r.layer_compression),
            ..ShaderParams::default()
        });
    }
    out.push(ShaderParams {
        color_intensity: 2.0,
        grain_amount: 2.0,
        sphere_effect: 0.5,
        layer_compression: 1.0,
        ..ShaderParams::default()
    });
    out
}

fn assert_in_range(c: &Rgba) {
    for v in [c.r, c.g, c.b, c.a] {
        assert!(v.is_finite() && (0.0..=1.0).contains(&v), "out of range: {c:?}");
    }
}

fn bits(c: &Rgba) -> [u32; 4] {
    [c.r.to_bits(), c.g.to_bits(), c.b.to_bits(), c.a.to_bits()]
}

#[test]
fn output_stays_in_unit_range() {
    for params in corner_params() {
        for formula in [ShapeFormula::Layered, ShapeFormula::Flat] {
            for (time, seed) in [(0.0, 0.0), (3.7, 120.5), (250.0, 999.0)] {
                for uv in uv_grid() {
                    assert_in_range(&shade(uv, time, seed, &params, formula));
                }
            }
        }
    }
}

#[test]
fn zero_sphere_effect_keeps_plain_distance() {
    let params = ShaderParams::default();
    for uv in uv_grid() {
        let c = composite(uv, 1.0, 5.0, &params, ShapeFormula::Layered);
        assert_eq!(c.modified_distance, c.distance);
        assert_eq!(c.distance, uv.length());
    }
    assert_eq!(sphere_distance(0.73, 0.0), 0.73);
}

#[test]
fn sphere_effect_warps_distance() {
    assert!(sphere_distance(0.5, 0.5) < 0.5);
    assert_eq!(sphere_distance(0.0, 0.5), 0.0);
    // Full warp is pow(d, 1).
    assert!((sphere_distance(0.4, 1.0) - 0.4).abs() < 1e-6);
}

#[test]
fn zero_grain_amount_adds_no_grain() {
    let params = ShaderParams {
        grain_amount: 0.0,
        ..ShaderParams::default()
    };
    for uv in uv_grid() {
        let c = composite(uv, 2.0, 42.0, &params, ShapeFormula::Layered);
        assert_eq!(c.grain, 0.0);
    }
}

#[test]
fn zero_complexity_leaves_only_radial_shape() {
    let params = ShaderParams {
        complexity: 0.0,
        grain_amount: 0.0,
        ..ShaderParams::default()
    };
    let at = |uv| bits(&shade(uv, 1.3, 4.0, &params, ShapeFormula::Layered));
    let reference = at(Vec2::new(0.3, 0.4));
    for uv in [Vec2::new(0.4, 0.3), Vec2::new(-0.3, -0.4), Vec2::new(0.4, -0.3)] {
        assert_eq!(at(uv), reference, "{uv:?}");
    }
    assert_ne!(at(Vec2::new(0.05, 0.0)), reference);
}

#[test]
fn grain_is_never_negative() {
    let params = ShaderParams {
        grain_amount: 2.0,
        ..ShaderParams::default()
    };
    for uv in uv_grid() {
        assert!(composite(uv, 0.5, 7.0, &params, ShapeFormula::Layered).grain >= 0.0);
    }
}

#[test]
fn repeated_evaluation_is_bit_identical() {
    let params = corner_params()[3];
    for uv in uv_grid() {
        let a = shade(uv, 12.25, 333.0, &params, ShapeFormula::Layered);
        let b = shade(uv, 12.25, 333.0, &params, ShapeFormula::Layered);
        assert_eq!(bits(&a), bits(&b));
    }
}

#[test]
fn centre_is_inside_the_blob() {
    let c = composite(Vec2::ZERO, 0.0, 0.0, &ShaderParams::default(), ShapeFormula::Layered);
    assert_eq!(c.distance, 0.0);
    assert!(c.mask > 0.95, "mask {}", c.mask);
    assert!(c.color.a > 0.95, "alpha {}", c.color.a);
}

#[test]
fn far_outside_is_transparent_white() {
    let params = ShaderParams::default();
    for uv in [Vec2::new(1.6, 0.0), Vec2::new(-1.2, 1.1), Vec2::new(0.0, -2.0)] {
        for seed in [0.0, 17.0, 640.0] {
            let c = composite(uv, 3.0, seed, &params, ShapeFormula::Layered);
            assert!(c.distance > 1.5);
            assert!(c.color.a < 1e-6, "alpha {}", c.color.a);
            for v in [c.color.r, c.color.g, c.color.b] {
                assert!(v > 0.999, "not white: {:?}", c.color);
            }
        }
    }
}

#[test]
fn seeds_decorrelate_output() {
    let params = ShaderParams::default();
    let mut differing = 0;
    for uv in uv_grid() {
        let a = shade(uv, 1.0, 10.0, &params, ShapeFormula::Layered);
        let b = shade(uv, 1.0, 523.0, &params, ShapeFormula::Layered);
        assert_in_range(&a);
        assert_in_range(&b);
        if bits(&a) != bits(&b) {
            differing += 1;
        }
    }
    assert!(differing > 0);
}

#[test]
fn flat_formula_ignores_shape_controls() {
    let plain = ShaderParams::default();
    let shaped = ShaderParams {
        sphere_effect: 0.8,
        layer_compression: 0.9,
        ..plain
    };
    for uv in uv_grid() {
        let a = shade(uv, 4.0, 9.0, &plain, ShapeFormula::Flat);
        let b = shade(uv, 4.0, 9.0, &shaped, ShapeFormula::Flat);
        assert_eq!(bits(&a), bits(&b));
    }
    assert!(ShapeFormula::Layered.has_shape_controls());
    assert!(!ShapeFormula::Flat.has_shape_controls());
}

#[test]
fn layered_formula_honours_compression() {
    let plain = ShaderParams::default();
    let squeezed = ShaderParams {
        layer_compression: 1.0,
        ..plain
    };
    let differs = uv_grid().into_iter().any(|uv| {
        let a = composite(uv, 4.0, 9.0, &plain, ShapeFormula::Layered);
        let b = composite(uv, 4.0, 9.0, &squeezed, ShapeFormula::Layered);
        a.noise_sum != b.noise_sum
    });
    assert!(differs);
}

#[test]
fn non_finite_parameters_stay_in_range() {
    let params = ShaderParams {
        complexity: f32::NAN,
        color_intensity: f32::INFINITY,
        grain_amount: f32::NAN,
        sphere_effect: f32::NEG_INFINITY,
        ..ShaderParams::default()
    };
    for uv in uv_grid() {
        assert_in_range(&shade(uv, 1.0, 2.0, &params, ShapeFormula::Layered));
    }
}

#[test]
fn non_finite_coordinate_fails_closed() {
    let params = ShaderParams::default();
    let c = shade(Vec2::new(f32::NAN, 0.0), 0.0, 0.0, &params, ShapeFormula::Layered);
    assert_eq!(c.a, 0.0);
    assert_eq!((c.r, c.g, c.b), (1.0, 1.0, 1.0));
}

#[test]
fn transparent_pixel_shows_background() {
    let c = Rgba {
        r: 0.2,
        g: 0.4,
        b: 0.6,
        a: 0.0,
    };
    assert_eq!(c.over(Rgb::WHITE), Rgb::WHITE);
    let opaque = Rgba { a: 1.0, ..c };
    let shown = opaque.over(Rgb::WHITE);
    assert!((shown.r - 0.2).abs() < 1e-6);
    assert!((shown.g - 0.4).abs() < 1e-6);
    assert!((shown.b - 0.6).abs() < 1e-6);
    assert_eq!(opaque.to_u8(), [51, 102, 153, 255]);
}

#[test]
fn surface_coord_centres_and_flips() {
    let c = surface_coord(1, 1, 3, 3, DEFAULT_ASPECT);
    assert!(c.x.abs() < 1e-6 && c.y.abs() < 1e-6);

    let tl = surface_coord(0, 0, 100, 50, DEFAULT_ASPECT);
    assert!(tl.x < 0.0 && tl.y > 0.0);
    assert!(tl.x > -DEFAULT_ASPECT && tl.y < 1.0);

    let br = surface_coord(99, 49, 100, 50, DEFAULT_ASPECT);
    assert!(br.x > 0.0 && br.y < 0.0);
}

#[test]
fn surface_coord_tolerates_empty_surface() {
    let c = surface_coord(0, 0, 0, 0, 1.0);
    assert!(c.is_finite());
}
