//! Easing curves for parameter ramps
//!
//! Easing functions map linear progress (0.0 to 1.0) to shaped progress.
//! Progress is always clamped before a curve is applied, so values outside
//! the unit range behave like the nearest endpoint.

use std::fmt;

use num_traits::Float;
use serde::{Deserialize, Serialize};

/// Available easing curves.
///
/// Deserializes from the names used in layer configuration
/// (`"linear"`, `"easeIn"`, `"easeOut"`, `"easeInOut"`). Any other name
/// falls back to [`Easing::Linear`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "String")]
pub enum Easing {
    /// Linear interpolation (no easing).
    #[default]
    Linear,
    /// Quadratic ease-in (starts slow, accelerates).
    EaseIn,
    /// Quadratic ease-out (starts fast, decelerates).
    EaseOut,
    /// Quadratic ease-in-out, symmetric about the midpoint.
    EaseInOut,
}

impl Easing {
    /// Resolve a configuration name, falling back to linear.
    pub fn from_name(name: &str) -> Self {
        match name {
            "linear" => Easing::Linear,
            "easeIn" => Easing::EaseIn,
            "easeOut" => Easing::EaseOut,
            "easeInOut" => Easing::EaseInOut,
            _ => Easing::Linear,
        }
    }

    /// Configuration name of this curve
    pub fn name(self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseIn => "easeIn",
            Easing::EaseOut => "easeOut",
            Easing::EaseInOut => "easeInOut",
        }
    }

    /// Apply the curve to a progress value.
    ///
    /// # Example
    ///
    /// ```
    /// use soundscape::actions::Easing;
    ///
    /// assert_eq!(Easing::Linear.apply(0.5_f64), 0.5);
    /// assert!(Easing::EaseIn.apply(0.5_f64) < 0.5);
    /// assert!(Easing::EaseOut.apply(0.5_f64) > 0.5);
    /// ```
    #[inline]
    pub fn apply<T: Float>(self, t: T) -> T {
        let t = clamp_unit(t);
        let two = T::one() + T::one();

        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => t * (two - t),
            Easing::EaseInOut => {
                let half = T::one() / two;
                if t < half {
                    two * t * t
                } else {
                    -T::one() + (two + two - two * t) * t
                }
            }
        }
    }
}

impl From<String> for Easing {
    fn from(name: String) -> Self {
        Easing::from_name(&name)
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Blend between two values along an easing curve.
///
/// Computes `from + (to - from) * ease(clamp(progress, 0, 1))`. The
/// endpoints are exact: progress at or below 0 yields `from`, progress at
/// or above 1 yields `to`.
///
/// # Example
///
/// ```
/// use soundscape::actions::{interpolate, Easing};
///
/// assert_eq!(interpolate(0.0_f32, 1.0, 0.25, Easing::Linear), 0.25);
/// assert_eq!(interpolate(0.2_f32, 0.9, 1.5, Easing::EaseIn), 0.9);
/// ```
#[inline]
pub fn interpolate<T: Float>(from: T, to: T, progress: T, easing: Easing) -> T {
    let eased = easing.apply(progress);
    if eased >= T::one() {
        to
    } else if eased <= T::zero() {
        from
    } else {
        from + (to - from) * eased
    }
}

#[inline]
fn clamp_unit<T: Float>(t: T) -> T {
    // NaN progress is treated as "not started"
    if t.is_nan() {
        return T::zero();
    }
    t.max(T::zero()).min(T::one())
}
