//! Catch zone and score multipliers

use crate::consts::*;

/// True when an object at this progress can be caught
#[inline]
pub fn in_catch_zone(progress: f32) -> bool {
    (CATCH_ZONE_START..=CATCH_ZONE_END).contains(&progress)
}

/// Multiplier for how centered a catch is (x3 perfect, x2 good, x1 edge)
pub fn zone_multiplier(progress: f32) -> u32 {
    if (TRIPLE_ZONE.0..=TRIPLE_ZONE.1).contains(&progress) {
        3
    } else if (DOUBLE_ZONE.0..=DOUBLE_ZONE.1).contains(&progress) {
        2
    } else {
        1
    }
}

/// Streak bonus: +0.2 for every 5 consecutive catches
pub fn combo_multiplier(combo: u32) -> f32 {
    1.0 + (combo / COMBO_BONUS_EVERY) as f32 * COMBO_BONUS_STEP
}

/// Points awarded for a positive catch: floor(base x combo bonus x zone)
///
/// Computed in fifths so the bonus steps stay exact.
pub fn awarded_points(base_points: i32, combo: u32, zone: u32) -> u64 {
    let base = base_points.max(0) as u64;
    let fifths = 5 + (combo / COMBO_BONUS_EVERY) as u64;
    base * fifths * zone as u64 / 5
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_zone_bands() {
        assert_eq!(zone_multiplier(90.0), 3);
        assert_eq!(zone_multiplier(88.0), 3);
        assert_eq!(zone_multiplier(92.0), 3);
        assert_eq!(zone_multiplier(85.0), 2);
        assert_eq!(zone_multiplier(96.0), 2);
        assert_eq!(zone_multiplier(78.0), 1);
        assert_eq!(zone_multiplier(99.0), 1);
    }

    #[test]
    fn test_catch_zone_edges() {
        assert!(in_catch_zone(75.0));
        assert!(in_catch_zone(100.0));
        assert!(!in_catch_zone(74.9));
        assert!(!in_catch_zone(50.0));
    }

    #[test]
    fn test_combo_bonus() {
        assert_eq!(combo_multiplier(0), 1.0);
        assert_eq!(combo_multiplier(4), 1.0);
        assert!((combo_multiplier(12) - 1.4).abs() < 1e-6);
        assert_eq!(awarded_points(10, 12, 1), 14);
        assert_eq!(awarded_points(10, 0, 3), 30);
        assert_eq!(awarded_points(15, 5, 2), 36);
    }

    proptest! {
        #[test]
        fn zone_multiplier_is_monotonic_toward_center(p in 75.0f32..=100.0) {
            let m = zone_multiplier(p);
            prop_assert!((1..=3).contains(&m));
            let distance = (p - 90.0).abs();
            if distance <= 2.0 {
                prop_assert_eq!(m, 3);
            } else if distance > 6.0 {
                prop_assert_eq!(m, 1);
            }
        }

        #[test]
        fn awarded_never_below_base(base in 1i32..=20, combo in 0u32..200, zone in 1u32..=3) {
            prop_assert!(awarded_points(base, combo, zone) >= base as u64);
        }
    }
}
