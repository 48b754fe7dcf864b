//! Conversions between scaled and raw integer space

use crate::ErrorCode;

/// Convert a scaled value to raw space
///
/// `raw = floor((scaled - offset) / scale + 0.5)`, rounding half up. Fails
/// with [`ErrorCode::ValueNotRepresentable`] when the result is not finite
/// or does not fit in an `i64`.
pub fn raw_from_scaled(scaled: f64, scale: f64, offset: f64) -> Result<i64, ErrorCode> {
    let raw = libm::floor((scaled - offset) / scale + 0.5);

    // i64::MIN is exactly representable, i64::MAX rounds up to 2^63
    if !raw.is_finite() || raw < i64::MIN as f64 || raw >= i64::MAX as f64 {
        return Err(ErrorCode::ValueNotRepresentable);
    }

    Ok(raw as i64)
}

/// Convert a raw value to scaled space
pub fn scaled_from_raw(raw: i64, scale: f64, offset: f64) -> f64 {
    raw as f64 * scale + offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_raw_from_scaled() {
        assert_eq!(raw_from_scaled(10.0, 0.1, 0.0), Ok(100));
        assert_eq!(raw_from_scaled(0.0, 0.1, 0.0), Ok(0));
        assert_eq!(raw_from_scaled(100.0, 0.1, 0.0), Ok(1000));
        assert_eq!(raw_from_scaled(5.0, 1.0, 2.0), Ok(3));
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(raw_from_scaled(2.5, 1.0, 0.0), Ok(3));
        assert_eq!(raw_from_scaled(-2.5, 1.0, 0.0), Ok(-2));
        assert_eq!(raw_from_scaled(2.49, 1.0, 0.0), Ok(2));
    }

    #[test]
    fn test_not_representable() {
        assert_eq!(
            raw_from_scaled(1.0, 0.0, 0.0),
            Err(ErrorCode::ValueNotRepresentable)
        );
        assert_eq!(
            raw_from_scaled(f64::NAN, 1.0, 0.0),
            Err(ErrorCode::ValueNotRepresentable)
        );
        assert_eq!(
            raw_from_scaled(1e30, 1.0, 0.0),
            Err(ErrorCode::ValueNotRepresentable)
        );
    }

    #[test]
    fn test_scaled_roundtrip_within_one_step() {
        let mut rng = rand::thread_rng();
        for _ in 0..1000 {
            let scale: f64 = rng.gen_range(0.0001..10.0);
            let offset: f64 = rng.gen_range(-1000.0..1000.0);
            let scaled: f64 = rng.gen_range(-1.0e6..1.0e6);

            let raw = raw_from_scaled(scaled, scale, offset).unwrap();
            let back = scaled_from_raw(raw, scale, offset);
            assert!(
                (back - scaled).abs() <= scale,
                "scaled={scaled} scale={scale} offset={offset} back={back}"
            );
        }
    }
}
