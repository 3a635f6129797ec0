use num_traits::Float;

/// Shortest signed angle (degrees) taking `from` onto `to`, in `(-180, 180]`.
pub fn circular_distance<F: Float>(from: F, to: F) -> F {
    let full = F::from(360.0).unwrap();
    let half = F::from(180.0).unwrap();

    let d = wrap_degrees(to - from);

    if d > half {
        d - full
    } else {
        d
    }
}

/// Wraps an angle into `[0, 360)`.
#[inline]
pub fn wrap_degrees<F: Float>(angle: F) -> F {
    let full = F::from(360.0).unwrap();
    let wrapped = angle % full;

    if wrapped < F::zero() {
        // -1e-20 % 360 + 360 would round to 360
        let w = wrapped + full;
        if w >= full {
            F::zero()
        } else {
            w
        }
    } else {
        wrapped
    }
}

#[inline]
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        for a in [0.0, 1.5, 90.0, 179.9, 180.0, 237.0, 359.99] {
            assert_eq!(circular_distance(a, a), 0.0);
        }
    }

    #[test]
    fn distance_is_antisymmetric() {
        let pairs = [(0.0, 10.0), (350.0, 10.0), (237.0, 0.0), (90.0, 300.0), (5.0, 184.0)];

        for (a, b) in pairs {
            let d = circular_distance(a, b);
            assert!((d + circular_distance(b, a)).abs() < 1e-9, "{} {}", a, b);
        }
    }

    #[test]
    fn distance_wraps_around_zero() {
        assert!((circular_distance(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((circular_distance(10.0, 350.0) + 20.0).abs() < 1e-9);
        assert!((circular_distance(237.0, 200.0) + 37.0).abs() < 1e-9);
        assert_eq!(circular_distance(0.0, 180.0), 180.0);
        assert_eq!(circular_distance(180.0, 0.0), 180.0);
    }

    #[test]
    fn distance_stays_in_half_open_range() {
        let mut a = -720.0;
        while a < 720.0 {
            let mut b = -400.0;
            while b < 400.0 {
                let d = circular_distance(a, b);
                assert!(d > -180.0 && d <= 180.0, "{} {} -> {}", a, b, d);
                b += 13.7;
            }
            a += 11.3;
        }
    }

    #[test]
    fn wrap_into_positive_cycle() {
        assert_eq!(wrap_degrees(360.0), 0.0);
        assert_eq!(wrap_degrees(-90.0), 270.0);
        assert_eq!(wrap_degrees(450.0f32), 90.0);
    }

    #[test]
    fn rounds_to_two_places() {
        assert_eq!(round2(4000.004), 4000.0);
        assert_eq!(round2(123.456), 123.46);
    }
}
