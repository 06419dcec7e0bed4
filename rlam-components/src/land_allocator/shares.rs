use super::SMALL_NUMBER;
use rlam_core::timeseries::FloatValue;

/// Logit shares of sibling land uses competing with dispersion `sigma`.
///
/// Each share is `rate_i^(1/sigma) / Σ rate_j^(1/sigma)`. The calculation is
/// carried out in log space so small values of `sigma` cannot overflow.
/// Rates that are zero or negative receive no share.
///
/// Returns the shares and the aggregate rate of the group,
/// `(Σ rate_j^(1/sigma))^sigma`, or `None` when no rate is positive.
pub fn logit_shares(
    rates: &[FloatValue],
    sigma: FloatValue,
) -> Option<(Vec<FloatValue>, FloatValue)> {
    debug_assert!(sigma > SMALL_NUMBER, "logit shares need a positive sigma");

    let exponents: Vec<FloatValue> = rates
        .iter()
        .map(|rate| {
            if *rate > 0.0 {
                rate.ln() / sigma
            } else {
                FloatValue::NEG_INFINITY
            }
        })
        .collect();

    let max = exponents
        .iter()
        .copied()
        .fold(FloatValue::NEG_INFINITY, FloatValue::max);
    if max == FloatValue::NEG_INFINITY {
        return None;
    }

    let weights: Vec<FloatValue> = exponents.iter().map(|e| (e - max).exp()).collect();
    let total: FloatValue = weights.iter().sum();
    let shares = weights.iter().map(|w| w / total).collect();
    let aggregate = (sigma * (max + total.ln())).exp();
    Some((shares, aggregate))
}

/// Rescale `shares` so they sum to one.
///
/// Returns `None` when the shares sum to zero.
pub fn normalize_shares(shares: &[FloatValue]) -> Option<Vec<FloatValue>> {
    let total: FloatValue = shares.iter().sum();
    if total > 0.0 {
        Some(shares.iter().map(|s| s / total).collect())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn unit_sigma_is_proportional() {
        let (shares, aggregate) = logit_shares(&[1.0, 3.0], 1.0).unwrap();
        assert!(is_close!(shares[0], 0.25));
        assert!(is_close!(shares[1], 0.75));
        assert!(is_close!(aggregate, 4.0));
    }

    #[test]
    fn half_sigma_squares_rates() {
        let (shares, aggregate) = logit_shares(&[1.0, 2.0], 0.5).unwrap();
        assert!(is_close!(shares[0], 0.2));
        assert!(is_close!(shares[1], 0.8));
        assert!(is_close!(aggregate, 5.0_f64.sqrt()));
    }

    #[test]
    fn tiny_sigma_does_not_overflow() {
        let (shares, aggregate) = logit_shares(&[2.0, 3.0], 1e-4).unwrap();
        assert!(shares.iter().all(|s| s.is_finite()));
        assert!(is_close!(shares[1], 1.0));
        assert!(is_close!(aggregate, 3.0, rel_tol = 1e-6));
    }

    #[test]
    fn non_positive_rates_get_no_share() {
        let (shares, _) = logit_shares(&[0.0, -1.0, 2.0], 1.0).unwrap();
        assert_eq!(shares, vec![0.0, 0.0, 1.0]);

        assert!(logit_shares(&[0.0, 0.0], 1.0).is_none());
        assert!(logit_shares(&[], 1.0).is_none());
    }

    #[test]
    fn normalize() {
        assert_eq!(normalize_shares(&[1.0, 3.0]), Some(vec![0.25, 0.75]));
        assert_eq!(normalize_shares(&[0.0, 0.0]), None);
    }
}
