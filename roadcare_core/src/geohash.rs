//! Location fingerprinting via standard geohash.
//!
//! The hash is an auxiliary metadata field attached to each submission for
//! audit and bucketing downstream. Matching never relies on it: two points a
//! few meters apart can straddle a cell boundary and share no prefix.

use crate::error::{DetectionError, Result};

/// Geohash base-32 alphabet (no `a`, `i`, `l`, `o`).
pub const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Default hash length (~38m x 19m cell).
pub const DEFAULT_PRECISION: usize = 8;

/// Encode a coordinate as a `precision`-character geohash.
///
/// Bits interleave starting with longitude. Each bit bisects the active
/// axis; a coordinate at or above the midpoint takes the upper half.
///
/// # Errors
/// `InvalidLatitude`/`InvalidLongitude` for out-of-range or non-finite
/// input (no clamping), `InvalidPrecision` for 0. Any positive length is
/// honoured; past about 12 characters the extra bits carry no information.
pub fn geohash(latitude: f64, longitude: f64, precision: usize) -> Result<String> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(DetectionError::InvalidLatitude(latitude));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(DetectionError::InvalidLongitude(longitude));
    }
    if precision == 0 {
        return Err(DetectionError::InvalidPrecision(precision));
    }

    let mut lat_range = (-90.0_f64, 90.0_f64);
    let mut lng_range = (-180.0_f64, 180.0_f64);
    let mut hash = String::with_capacity(precision);
    let mut on_longitude = true;
    let mut bit = 0;
    let mut ch = 0usize;

    while hash.len() < precision {
        let (range, value) = if on_longitude {
            (&mut lng_range, longitude)
        } else {
            (&mut lat_range, latitude)
        };

        let mid = (range.0 + range.1) / 2.0;
        if value >= mid {
            ch |= 1 << (4 - bit);
            range.0 = mid;
        } else {
            range.1 = mid;
        }

        on_longitude = !on_longitude;
        bit += 1;

        if bit == 5 {
            hash.push(BASE32[ch] as char);
            bit = 0;
            ch = 0;
        }
    }

    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_known_hash() {
        // Reference value shared by every geohash implementation
        assert_eq!(geohash(57.64911, 10.40744, 11).unwrap(), "u4pruydqqvj");
    }

    #[test]
    fn test_kota_kinabalu_prefix() {
        let hash = geohash(5.9804, 116.0735, DEFAULT_PRECISION).unwrap();
        assert_eq!(hash, "w94d12dn");

        // 45m north lands in a neighbouring cell
        let north = geohash(5.9808, 116.0735, DEFAULT_PRECISION).unwrap();
        assert_eq!(&north[..6], &hash[..6]);
        assert_ne!(north, hash);
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(geohash(91.0, 0.0, 8), Err(DetectionError::InvalidLatitude(91.0)));
        assert_eq!(geohash(0.0, 181.0, 8), Err(DetectionError::InvalidLongitude(181.0)));
        assert!(geohash(f64::NAN, 0.0, 8).is_err());
    }

    #[test]
    fn test_accepts_boundaries() {
        for (lat, lng) in [(-90.0, -180.0), (90.0, 180.0), (-90.0, 180.0), (90.0, -180.0)] {
            assert_eq!(geohash(lat, lng, 8).unwrap().len(), 8);
        }
        // Upper boundary sits at or above every midpoint
        assert_eq!(geohash(90.0, 180.0, 4).unwrap(), "zzzz");
        assert_eq!(geohash(-90.0, -180.0, 4).unwrap(), "0000");
    }

    #[test]
    fn test_zero_is_a_real_coordinate() {
        assert_eq!(geohash(0.0, 0.0, 5).unwrap(), "s0000");
    }

    #[test]
    fn test_rejects_bad_precision() {
        assert_eq!(geohash(0.0, 0.0, 0), Err(DetectionError::InvalidPrecision(0)));
    }

    #[test]
    fn test_long_precision_is_honoured() {
        let hash = geohash(57.64911, 10.40744, 20).unwrap();
        assert_eq!(hash.len(), 20);
        assert!(hash.starts_with("u4pruydqqvj"));
    }

    proptest! {
        #[test]
        fn prop_deterministic_and_well_formed(
            lat in -90.0f64..=90.0,
            lng in -180.0f64..=180.0,
            precision in 1usize..=24,
        ) {
            let a = geohash(lat, lng, precision).unwrap();
            let b = geohash(lat, lng, precision).unwrap();
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(a.len(), precision);
            prop_assert!(a.bytes().all(|c| BASE32.contains(&c)));
        }

        #[test]
        fn prop_longer_hash_extends_shorter(lat in -90.0f64..=90.0, lng in -180.0f64..=180.0) {
            let short = geohash(lat, lng, 5).unwrap();
            let long = geohash(lat, lng, 9).unwrap();
            prop_assert!(long.starts_with(&short));
        }
    }
}
