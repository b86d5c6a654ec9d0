use proptest::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use scatter_visualiser_core::{
    classify::{route, snap, Routing},
    BackgroundDriver, NormalizedSample, Parameters, Point3, SampleFrame, ShadowProjector,
};

fn stereo_frame() -> impl Strategy<Value = SampleFrame> {
    prop::collection::vec(any::<(u8, u8)>(), 0..512).prop_map(|pairs| {
        let (left, right) = pairs.into_iter().unzip();
        SampleFrame::new(left, right).unwrap()
    })
}

proptest! {
    #[test]
    fn each_sample_lands_in_at_most_one_list(
        frame in stereo_frame(),
        quantize in 0.0f64..=1.0,
        fill in 0.0f64..=1.0,
        always in any::<bool>(),
        grid in 0.001f64..0.5,
        seed in any::<u64>(),
    ) {
        let params = Parameters {
            quantize_probability: quantize,
            grid_fill_probability: fill,
            always_show_quantized: always,
            quantize_grid: grid,
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(seed);
        let mut regular = 0;
        let mut quantized = 0;
        for sample in frame.normalized() {
            match route(sample, &params, &mut rng) {
                Routing::Regular(_) => regular += 1,
                Routing::Quantized(_) => quantized += 1,
                Routing::Dropped => prop_assert!(!always),
            }
        }
        prop_assert!(regular + quantized <= frame.len());
        if always {
            prop_assert_eq!(regular + quantized, frame.len());
        }
    }

    #[test]
    fn samples_in_one_cell_collapse_together(
        a in any::<(u8, u8)>(),
        nudge in (0u8..8, 0u8..8),
        grid in 0.001f64..0.5,
    ) {
        let b = (a.0.saturating_add(nudge.0), a.1.saturating_add(nudge.1));
        let a = NormalizedSample::from_bytes(a.0, a.1);
        let b = NormalizedSample::from_bytes(b.0, b.1);
        let same_cell = (a.x / grid).floor() == (b.x / grid).floor()
            && (a.y / grid).floor() == (b.y / grid).floor();

        if same_cell {
            prop_assert_eq!(snap(a.x, grid), snap(b.x, grid));
            prop_assert_eq!(snap(a.y, grid), snap(b.y, grid));
        }
    }

    #[test]
    fn shadow_is_an_exact_affine_copy(
        points in prop::collection::vec((-1.0f32..1.0, -1.0f32..1.0), 0..256),
        floor in -5.0f32..5.0,
        offset in -5.0f32..5.0,
    ) {
        let points: Vec<Point3> = points.into_iter().map(|(x, y)| Point3::new(x, y, 0.0)).collect();
        let shadows = ShadowProjector::new(floor, offset).project(&points);

        prop_assert_eq!(shadows.len(), points.len());
        for (shadow, point) in shadows.iter().zip(&points) {
            prop_assert_eq!(*shadow, Point3::new(point.x, floor, -point.y + offset));
        }
    }

    #[test]
    fn reaction_stays_within_damping(left in prop::collection::vec(any::<u8>(), 0..4096)) {
        let reaction = BackgroundDriver::default().reaction(&left);
        prop_assert!((0.0..=0.25).contains(&reaction));
    }
}
