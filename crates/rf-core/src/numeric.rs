use crate::error::{RfError, RfResult};

/// Floating point type used throughout system
pub type Real = f64;

pub fn ensure_finite(v: Real, what: &'static str) -> RfResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(RfError::NonFinite { what, value: v })
    }
}

/// Finite and strictly greater than zero (viscosities, radii, lengths).
pub fn ensure_positive(v: Real, what: &'static str) -> RfResult<Real> {
    let v = ensure_finite(v, what)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(RfError::NonPositive { what, value: v })
    }
}

/// Min/max over a slice, skipping NaN. `None` for an empty (or all-NaN) slice.
pub fn finite_range(values: impl IntoIterator<Item = Real>) -> Option<[Real; 2]> {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some([v, v]),
            Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_finite_detects_nan() {
        let err = ensure_finite(Real::NAN, "test").unwrap_err();
        let msg = format!("{err}");
        assert!(msg.contains("Non-finite"));
    }

    #[test]
    fn ensure_positive_rejects_zero_and_negative() {
        assert!(ensure_positive(1e-5, "nu").is_ok());
        assert!(matches!(
            ensure_positive(0.0, "nu"),
            Err(RfError::NonPositive { what: "nu", .. })
        ));
        assert!(ensure_positive(-1.0, "nu").is_err());
        assert!(matches!(
            ensure_positive(Real::INFINITY, "nu"),
            Err(RfError::NonFinite { .. })
        ));
    }

    #[test]
    fn finite_range_skips_nan() {
        assert_eq!(finite_range([3.0, Real::NAN, -1.0, 2.0]), Some([-1.0, 3.0]));
        assert_eq!(finite_range(Vec::<Real>::new()), None);
    }
}
