use crate::CoreError;

/// Reject NaN and infinities coming from configuration or instruments.
pub fn ensure_finite(v: f64, what: &'static str) -> Result<f64, CoreError> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Ratio `num / den` that collapses to 0 when the denominator is zero.
///
/// Used wherever a flow fraction is taken over a combined flow that may be
/// stopped.
pub fn ratio_or_zero(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(f64::NAN, "flow").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
        assert_eq!(ensure_finite(2.5, "flow").unwrap(), 2.5);
    }

    #[test]
    fn ratio_or_zero_guards_zero_denominator() {
        assert_eq!(ratio_or_zero(3.0, 0.0), 0.0);
        assert_eq!(ratio_or_zero(3.0, 2.0), 1.5);
    }

    proptest! {
        #[test]
        fn split_fractions_sum_to_one(a in 0.0f64..1e-6, b in 1e-12f64..1e-6) {
            let total = ratio_or_zero(a, a + b) + ratio_or_zero(b, a + b);
            prop_assert!((total - 1.0).abs() < 1e-12);
        }
    }
}
