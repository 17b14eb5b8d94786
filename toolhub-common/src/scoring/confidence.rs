//! Confidence scoring for aggregated reviews
//!
//! Combines three evidence signals into a score in `[0, 100]`:
//! - review volume, saturating at [`VOLUME_SATURATION`] reviews
//! - verified review volume, saturating at the same point
//! - consistency: one minus the mean per-metric standard deviation,
//!   normalized by the largest population std-dev possible on `[0, 10]`
//!
//! Both volume signals are counts, not ratios, so adding any review can
//! only hold or raise the score while the spread stays fixed.

/// Reviews past this count add no further volume confidence
pub const VOLUME_SATURATION: u32 = 20;

/// Largest population standard deviation a set of `[0, 10]` scores can have
pub const MAX_STD_DEV: f64 = 5.0;

const VOLUME_WEIGHT: f64 = 0.50;
const VERIFIED_WEIGHT: f64 = 0.20;
const CONSISTENCY_WEIGHT: f64 = 0.30;

/// Inputs to the confidence calculation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    pub total_reviews: u32,
    pub verified_reviews: u32,
    /// Mean of the per-metric standard deviations (metrics with data only)
    pub mean_std_dev: f64,
}

fn saturating_fraction(count: u32) -> f64 {
    f64::from(count.min(VOLUME_SATURATION)) / f64::from(VOLUME_SATURATION)
}

/// Confidence score in `[0, 100]`, rounded to two decimals
pub fn confidence_score(inputs: ConfidenceInputs) -> f64 {
    if inputs.total_reviews == 0 {
        return 0.0;
    }

    let volume = saturating_fraction(inputs.total_reviews);
    let verified = saturating_fraction(inputs.verified_reviews.min(inputs.total_reviews));

    let spread = if inputs.mean_std_dev.is_finite() {
        (inputs.mean_std_dev.max(0.0) / MAX_STD_DEV).min(1.0)
    } else {
        1.0
    };
    let consistency = 1.0 - spread;

    let raw = 100.0
        * (VOLUME_WEIGHT * volume + VERIFIED_WEIGHT * verified + CONSISTENCY_WEIGHT * consistency);

    ((raw * 100.0).round() / 100.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(total: u32, verified: u32, std_dev: f64) -> ConfidenceInputs {
        ConfidenceInputs {
            total_reviews: total,
            verified_reviews: verified,
            mean_std_dev: std_dev,
        }
    }

    #[test]
    fn test_zero_reviews_is_zero() {
        assert_eq!(confidence_score(inputs(0, 0, 0.0)), 0.0);
    }

    #[test]
    fn test_bounded() {
        assert_eq!(confidence_score(inputs(500, 500, 0.0)), 100.0);
        let worst = confidence_score(inputs(1, 0, 50.0));
        assert!(worst >= 0.0 && worst <= 100.0);
        assert!(confidence_score(inputs(3, 1, f64::NAN)) >= 0.0);
    }

    #[test]
    fn test_monotone_in_reviews_at_fixed_spread() {
        for std_dev in [0.0, 1.2, 3.5, 5.0] {
            let mut previous = 0.0;
            for total in 0..40 {
                let score = confidence_score(inputs(total, total / 2, std_dev));
                assert!(score >= previous, "total={} std_dev={}", total, std_dev);
                previous = score;
            }
        }
    }

    #[test]
    fn test_unverified_review_never_lowers_confidence() {
        for total in 1..30 {
            let before = confidence_score(inputs(total, total, 1.0));
            let after = confidence_score(inputs(total + 1, total, 1.0));
            assert!(after >= before);
        }
    }

    #[test]
    fn test_more_spread_never_raises_confidence() {
        let mut previous = 100.0;
        for tenth in 0..=60 {
            let score = confidence_score(inputs(10, 5, f64::from(tenth) / 10.0));
            assert!(score <= previous);
            previous = score;
        }
    }

    #[test]
    fn test_large_consistent_verified_set_is_high() {
        assert!(confidence_score(inputs(25, 22, 0.5)) >= 70.0);
    }

    #[test]
    fn test_two_divergent_reviews_is_low() {
        assert!(confidence_score(inputs(2, 2, 3.5)) < 70.0);
    }
}
