//! Q16.16 Fixed-Point Arithmetic
//!
//! Every position, velocity and box edge inside the tick is a Q16.16
//! integer. Floats only appear at the edges: when configuration is loaded
//! (`to_fixed`) and when values are shown to a human (`to_float`).
//!
//! ## Format: Q16.16
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Bit Layout: Q16.16 (32-bit signed integer)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  [S][IIIIIIIIIIIIIIII][FFFFFFFFFFFFFFFF]                    │
//! │   │  └──── 16 bits ────┘└──── 16 bits ────┘                 │
//! │   └─ Sign bit                                               │
//! │                                                             │
//! │  Range: -32768.0 to +32767.99998 world units                │
//! │  Precision: 1/65536 world units                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A 1000-unit wide stage uses ~3% of the range, which leaves plenty of
//! headroom for velocities and box offsets.

/// Q16.16 fixed-point number stored as i32.
pub type Fixed = i32;

/// Number of fractional bits (16)
pub const FIXED_SCALE: i32 = 16;

/// 1.0 in fixed-point (65536)
pub const FIXED_ONE: Fixed = 1 << FIXED_SCALE;

/// 0.5 in fixed-point (32768)
pub const FIXED_HALF: Fixed = FIXED_ONE >> 1;

/// Largest magnitude, in whole world units, of any authored coordinate,
/// extent or distance. A sum of three such values still fits in Q16.16.
pub const WORLD_LIMIT: i32 = 10_000;

/// Convert a float to fixed-point.
///
/// # Warning
/// Only use while loading configuration. NEVER in the tick loop.
///
/// # Example
/// ```
/// use tekken_lite::core::fixed::{to_fixed, FIXED_ONE};
/// const MY_VALUE: i32 = to_fixed(2.5);
/// assert_eq!(MY_VALUE, FIXED_ONE * 2 + FIXED_ONE / 2);
/// ```
#[inline]
pub const fn to_fixed(f: f64) -> Fixed {
    (f * (FIXED_ONE as f64)) as Fixed
}

/// Convert fixed-point to float for display.
///
/// # Warning
/// Only use for visual output and logs. NEVER feed the result back into the simulation.
#[inline]
pub fn to_float(f: Fixed) -> f32 {
    f as f32 / FIXED_ONE as f32
}

/// Whole world units to fixed-point.
#[inline]
pub const fn from_int(i: i32) -> Fixed {
    i << FIXED_SCALE
}

/// Multiply two fixed-point numbers.
///
/// Widens to i64 so the intermediate product cannot overflow, then
/// shifts back (arithmetic shift, rounds toward negative infinity).
#[inline]
pub fn fixed_mul(a: Fixed, b: Fixed) -> Fixed {
    let wide = (a as i64) * (b as i64);
    (wide >> FIXED_SCALE) as Fixed
}

/// Absolute value of a fixed-point number.
#[inline]
pub fn fixed_abs(x: Fixed) -> Fixed {
    if x < 0 { x.wrapping_neg() } else { x }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_constants() {
        assert_eq!(FIXED_ONE, 65536);
        assert_eq!(FIXED_HALF, 32768);
        assert_eq!(from_int(3), 3 * FIXED_ONE);
    }

    #[test]
    fn test_to_fixed() {
        assert_eq!(to_fixed(1.0), FIXED_ONE);
        assert_eq!(to_fixed(0.5), FIXED_HALF);
        assert_eq!(to_fixed(-1.0), -FIXED_ONE);
        // 0.85 friction as used by the default physics
        assert_eq!(to_fixed(0.85), 55705);
    }

    #[test]
    fn test_fixed_mul() {
        assert_eq!(fixed_mul(to_fixed(2.0), to_fixed(3.0)), to_fixed(6.0));
        assert_eq!(fixed_mul(FIXED_HALF, FIXED_HALF), to_fixed(0.25));
        assert_eq!(fixed_mul(to_fixed(-2.0), to_fixed(3.0)), to_fixed(-6.0));
    }

    #[test]
    fn test_fixed_abs() {
        assert_eq!(fixed_abs(-FIXED_ONE), FIXED_ONE);
        assert_eq!(fixed_abs(FIXED_ONE), FIXED_ONE);
        assert_eq!(fixed_abs(0), 0);
    }
}
