use blob_visualizer::shading::{Vec2, mix, noise2d, rotate, smoothstep, snoise};

fn grid(n: usize, span: f32) -> impl Iterator<Item = Vec2> {
    (0..n).flat_map(move |i| {
        (0..n).map(move |j| {
            let f = |k: usize| (k as f32 / (n - 1) as f32 * 2.0 - 1.0) * span;
            Vec2::new(f(i) + 0.013, f(j) - 0.007)
        })
    })
}

#[test]
fn snoise_stays_in_unit_range() {
    for span in [1.0, 10.0, 250.0, 10_000.0] {
        for p in grid(41, span) {
            let n = snoise(p);
            assert!((-1.0..=1.0).contains(&n), "snoise({p:?}) = {n}");
        }
    }
}

#[test]
fn snoise_origin_is_zero() {
    assert_eq!(snoise(Vec2::ZERO), 0.0);
}

#[test]
fn snoise_is_not_constant() {
    let values: Vec<f32> = grid(21, 4.0).map(snoise).collect();
    let max = values.iter().cloned().fold(f32::MIN, f32::max);
    let min = values.iter().cloned().fold(f32::MAX, f32::min);
    assert!(max - min > 0.5, "range too flat: {min}..{max}");
}

#[test]
fn snoise_is_smooth() {
    const EPS: f32 = 1e-3;
    const K: f32 = 20.0;
    for p in grid(31, 8.0) {
        let n0 = snoise(p);
        for d in [Vec2::new(EPS, 0.0), Vec2::new(0.0, EPS), Vec2::new(-EPS, EPS) * 0.7] {
            let n1 = snoise(p + d);
            let diff = (n1 - n0).abs();
            assert!(diff < K * EPS, "jump {diff} at {p:?}");
        }
    }
}

#[test]
fn snoise_is_deterministic() {
    for p in grid(11, 50.0) {
        assert_eq!(snoise(p).to_bits(), snoise(p).to_bits());
    }
}

#[test]
fn snoise_non_finite_input_is_flat() {
    assert_eq!(snoise(Vec2::new(f32::NAN, 1.0)), 0.0);
    assert_eq!(snoise(Vec2::new(0.5, f32::INFINITY)), 0.0);
    assert_eq!(snoise(Vec2::new(f32::NEG_INFINITY, f32::NAN)), 0.0);
}

#[test]
fn noise2d_scales_then_offsets() {
    let p = Vec2::new(0.3, -0.8);
    let off = Vec2::new(1.5, 2.25);
    assert_eq!(noise2d(p, 2.0, off), snoise(p * 2.0 + off));
    assert_eq!(noise2d(p, 1.0, Vec2::ZERO), snoise(p));
}

#[test]
fn rotate_by_zero_is_identity() {
    for p in grid(9, 3.0) {
        assert_eq!(rotate(p, 0.0), p);
    }
}

#[test]
fn rotate_preserves_length() {
    for p in grid(9, 3.0) {
        for a in [0.1f32, 1.0, -2.5, 3.14159, 100.0] {
            let r = rotate(p, a);
            let (l0, l1) = (p.length(), r.length());
            assert!((l0 - l1).abs() <= 1e-5 * l0.max(1.0), "{l0} vs {l1}");
        }
    }
}

#[test]
fn rotate_quarter_turn_is_clockwise() {
    let r = rotate(Vec2::new(1.0, 0.0), std::f32::consts::FRAC_PI_2);
    assert!(r.x.abs() < 1e-6);
    assert!((r.y + 1.0).abs() < 1e-6);
}

#[test]
fn smoothstep_saturates_outside_edges() {
    assert_eq!(smoothstep(0.2, 0.8, -5.0), 0.0);
    assert_eq!(smoothstep(0.2, 0.8, 0.2), 0.0);
    assert_eq!(smoothstep(0.2, 0.8, 0.8), 1.0);
    assert_eq!(smoothstep(0.2, 0.8, 9.0), 1.0);
    assert!((smoothstep(0.0, 1.0, 0.5) - 0.5).abs() < 1e-6);
}

#[test]
fn smoothstep_reversed_edges_invert() {
    assert_eq!(smoothstep(1.0, 0.0, 0.0), 1.0);
    assert_eq!(smoothstep(1.0, 0.0, 1.0), 0.0);
    let a = smoothstep(1.1, 0.2, 0.5);
    let b = 1.0 - smoothstep(0.2, 1.1, 0.5);
    assert!((a - b).abs() < 1e-6);
}

#[test]
fn smoothstep_equal_edges_is_a_step() {
    assert_eq!(smoothstep(0.5, 0.5, 0.49), 0.0);
    assert_eq!(smoothstep(0.5, 0.5, 0.5), 1.0);
}

#[test]
fn mix_endpoints() {
    assert_eq!(mix(2.0, 4.0, 0.0), 2.0);
    assert_eq!(mix(2.0, 4.0, 1.0), 4.0);
    assert_eq!(mix(2.0, 4.0, 0.25), 2.5);
}
