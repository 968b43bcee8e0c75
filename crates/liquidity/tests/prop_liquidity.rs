// ─────────────────────────────────────────────────────────────────
// Property tests for flaunch-dash-liquidity
//
// Run: cargo test -p flaunch-dash-liquidity --test prop_liquidity
// ─────────────────────────────────────────────────────────────────

use flaunch_dash_liquidity::{
    aggregate_liquidity, compress, effective_tick_spacing, ChartConfig, LiquidityRange,
    LiquidityTag, PriceModel, TickDomain, Viewport, MAX_TICK, MIN_TICK,
};
use proptest::prelude::*;

// ─────────────────────────────────────────────────────────────────
// BIN WIDTH
// ─────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn effective_spacing_is_positive_multiple(
        min in MIN_TICK..MAX_TICK,
        width in 0i64..1_774_544,
        spacing in 1i32..=200,
        target in 1usize..=200,
    ) {
        let max = (min as i64 + width).min(MAX_TICK as i64) as i32;
        let domain = TickDomain::new(min, max);
        let effective = effective_tick_spacing(domain, spacing, target);

        prop_assert!(effective > 0);
        prop_assert_eq!(effective % spacing, 0);

        let range = domain.width();
        if range >= spacing as i64 {
            let bins = (range + effective as i64 - 1) / effective as i64;
            prop_assert!(bins <= target as i64, "{} bins for target {}", bins, target);
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// MASS CONSERVATION
// ─────────────────────────────────────────────────────────────────

fn arb_range() -> impl Strategy<Value = LiquidityRange> {
    (-8000i32..8000, 1i32..4000, 0.001f64..100.0).prop_map(|(start, len, d)| {
        LiquidityRange::new(LiquidityTag::BidWall, start, start + len, d)
    })
}

proptest! {
    #[test]
    fn raw_mass_matches_clipped_overlap(
        min in -5000i32..5000,
        width in 0i32..10_000,
        spacing in 1i32..=100,
        target in 1usize..=80,
        range in arb_range(),
    ) {
        let domain = TickDomain::new(min, min + width);
        let effective = effective_tick_spacing(domain, spacing, target);
        let model = PriceModel::new(false, 1.0);
        let bins = aggregate_liquidity(domain, effective, &[range.clone()], &model, 1.0);

        prop_assert!(!bins.is_empty());
        let covered_start = bins[0].tick as i64;
        let covered_end = bins[bins.len() - 1].end_tick();

        let overlap = (covered_end.min(range.end_tick as i64)
            - covered_start.max(range.start_tick as i64))
        .max(0);
        let expected = range.eth_per_tick * overlap as f64;

        let total: f64 = bins.iter().map(|bin| bin.value(&range.tag).raw).sum();
        let tolerance = 1e-9 * expected.max(1.0);
        prop_assert!(
            (total - expected).abs() <= tolerance,
            "total {} expected {}",
            total,
            expected
        );
    }

    #[test]
    fn bins_tile_without_gaps(
        min in -5000i32..5000,
        width in 0i32..10_000,
        spacing in 1i32..=100,
    ) {
        let domain = TickDomain::new(min, min + width);
        let effective = effective_tick_spacing(domain, spacing, 50);
        let bins = aggregate_liquidity(domain, effective, &[], &PriceModel::new(true, 1.0), 1.0);

        prop_assert_eq!(bins[0].tick, min);
        for pair in bins.windows(2) {
            prop_assert_eq!(pair[0].end_tick(), pair[1].tick as i64);
        }
        let last = &bins[bins.len() - 1];
        prop_assert!(last.tick <= domain.max);
        prop_assert!(last.end_tick() > domain.max as i64);
    }
}

// ─────────────────────────────────────────────────────────────────
// COMPRESSION
// ─────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn compress_is_monotonic(a in 0.0f64..1e12, b in 0.0f64..1e12) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(compress(lo) <= compress(hi));
        prop_assert_eq!(compress(0.0), 0.0);
    }
}

// ─────────────────────────────────────────────────────────────────
// VIEWPORT
// ─────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn viewport_stays_in_bounds(
        start in MIN_TICK..MAX_TICK,
        ops in prop::collection::vec(0u8..6, 0..40),
        eth_is_token0 in any::<bool>(),
    ) {
        let config = ChartConfig::default();
        let mut viewport = Viewport::around(start, &config);

        for op in ops {
            let width = viewport.domain().width();
            match op {
                0 => viewport.zoom_in(),
                1 => viewport.zoom_out(),
                2 => {
                    viewport.pan_left(eth_is_token0);
                    prop_assert_eq!(viewport.domain().width(), width);
                }
                3 => {
                    viewport.pan_right(eth_is_token0);
                    prop_assert_eq!(viewport.domain().width(), width);
                }
                4 => viewport.recenter(start),
                _ => viewport.reset(start),
            }

            let domain = viewport.domain();
            prop_assert!(domain.min >= MIN_TICK);
            prop_assert!(domain.max <= MAX_TICK);
            prop_assert!(domain.min < domain.max);
        }
    }
}
