//! Scalar helpers for the one-dimensional battlefield.
//!
//! The field is the closed interval `[FIELD_MIN, FIELD_MAX]`. All positions
//! are `f64`; the simulation is deterministic because every operation here
//! is a plain IEEE-754 computation evaluated in a fixed order.

/// Left edge of the battlefield.
pub const FIELD_MIN: f64 = 0.0;

/// Right edge of the battlefield.
pub const FIELD_MAX: f64 = 100.0;

/// Clamp a position onto the battlefield.
#[must_use]
pub fn clamp_to_field(x: f64) -> f64 {
    x.clamp(FIELD_MIN, FIELD_MAX)
}

/// Check whether a position lies on the battlefield.
#[must_use]
pub fn on_field(x: f64) -> bool {
    (FIELD_MIN..=FIELD_MAX).contains(&x)
}

/// Unit direction (`-1.0`, `0.0` or `1.0`) pointing from `from` to `to`.
#[must_use]
pub fn direction_to(from: f64, to: f64) -> f64 {
    if to > from {
        1.0
    } else if to < from {
        -1.0
    } else {
        0.0
    }
}

/// Exponential approach of `current` toward `target`.
///
/// `current += (target - current) * (1 - e^(-agility * dt))`. Higher agility
/// converges faster; the step never overshoots.
#[must_use]
pub fn approach(current: f64, target: f64, agility: f64, dt: f64) -> f64 {
    current + (target - current) * (1.0 - (-agility * dt).exp())
}

/// Signed velocity that walks from `from` toward `to` at `speed`.
#[must_use]
pub fn walk_velocity(from: f64, to: f64, speed: f64) -> f64 {
    direction_to(from, to) * speed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_to_field() {
        assert_eq!(clamp_to_field(-3.0), 0.0);
        assert_eq!(clamp_to_field(42.5), 42.5);
        assert_eq!(clamp_to_field(104.0), 100.0);
    }

    #[test]
    fn test_direction_to() {
        assert_eq!(direction_to(10.0, 20.0), 1.0);
        assert_eq!(direction_to(20.0, 10.0), -1.0);
        assert_eq!(direction_to(5.0, 5.0), 0.0);
    }

    #[test]
    fn test_approach_never_overshoots() {
        let mut v = 0.0;
        for _ in 0..500 {
            v = approach(v, 6.0, 10.0, 0.02);
            assert!(v <= 6.0 + 1e-9);
        }
        assert!((v - 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_approach_zero_dt_is_identity() {
        assert_eq!(approach(3.0, 8.0, 12.0, 0.0), 3.0);
    }
}
