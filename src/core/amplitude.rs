// src/core/amplitude.rs

use super::constants::tolerance::{EPSILON, EPSILON_SQUARED};
use super::constants::{PI, TAU};
use num_complex::Complex64;
use num_traits::{One, Zero};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul};

/// A complex amplitude stored in polar form.
///
/// The magnitude is never negative and the phase always lies in `[0, 2π)`:
/// every constructor folds a negative magnitude into the phase (adding π) and
/// then reduces the phase modulo 2π. Values are immutable; arithmetic returns
/// new amplitudes.
///
/// Equality is tolerant: two amplitudes are equal when their rectangular forms
/// lie closer than [`EPSILON`](super::constants::tolerance::EPSILON).
#[derive(Debug, Clone, Copy)]
pub struct Amplitude {
    magnitude: f64,
    phase: f64,
}

impl Amplitude {
    /// The amplitude `0`.
    pub const ZERO: Amplitude = Amplitude { magnitude: 0.0, phase: 0.0 };

    /// The amplitude `1`.
    pub const ONE: Amplitude = Amplitude { magnitude: 1.0, phase: 0.0 };

    /// Creates an amplitude from a magnitude and a phase in radians.
    pub fn new(magnitude: f64, phase: f64) -> Self {
        let (magnitude, phase) = if magnitude < 0.0 {
            (-magnitude, phase + PI)
        } else {
            (magnitude, phase)
        };
        let mut phase = phase - TAU * (phase / TAU).floor();
        // Rounding can land a tiny negative phase exactly on 2π.
        if phase >= TAU {
            phase = 0.0;
        }
        Self { magnitude, phase }
    }

    /// Creates a real amplitude; negative values carry a phase of π.
    pub fn real(value: f64) -> Self {
        Self::new(value, 0.0)
    }

    /// Creates an amplitude from its real and imaginary parts.
    pub fn from_rectangular(re: f64, im: f64) -> Self {
        let (magnitude, phase) = Complex64::new(re, im).to_polar();
        Self::new(magnitude, phase)
    }

    /// Magnitude `r ≥ 0`.
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// Phase `θ ∈ [0, 2π)`.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Rectangular form of this amplitude.
    pub fn to_rectangular(&self) -> Complex64 {
        Complex64::from_polar(self.magnitude, self.phase)
    }

    /// Same magnitude, negated phase.
    pub fn conjugate(&self) -> Self {
        Self::new(self.magnitude, -self.phase)
    }

    /// `r²`, the Born-rule probability weight of this amplitude.
    pub fn absolute_square(&self) -> f64 {
        self.magnitude * self.magnitude
    }

    /// Scales the magnitude. A negative factor shifts the phase by π.
    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.magnitude * factor, self.phase)
    }

    /// Rotates the phase by `angle` radians.
    pub fn rotate(&self, angle: f64) -> Self {
        Self::new(self.magnitude, self.phase + angle)
    }

    /// True when the magnitude is below the crate-wide tolerance.
    pub fn is_negligible(&self) -> bool {
        self.magnitude < EPSILON
    }

    /// Sums amplitudes by accumulating real and imaginary parts separately.
    ///
    /// Adding polar values pairwise would convert back and forth on every
    /// step; the rectangular accumulator converts each term once.
    pub fn sum<'a, I>(terms: I) -> Self
    where
        I: IntoIterator<Item = &'a Amplitude>,
    {
        let total: Complex64 = terms.into_iter().map(Amplitude::to_rectangular).sum();
        Self::from(total)
    }
}

impl From<Complex64> for Amplitude {
    fn from(value: Complex64) -> Self {
        Self::from_rectangular(value.re, value.im)
    }
}

impl From<Amplitude> for Complex64 {
    fn from(value: Amplitude) -> Self {
        value.to_rectangular()
    }
}

impl From<f64> for Amplitude {
    fn from(value: f64) -> Self {
        Self::real(value)
    }
}

impl Mul for Amplitude {
    type Output = Amplitude;

    fn mul(self, rhs: Amplitude) -> Amplitude {
        Amplitude::new(self.magnitude * rhs.magnitude, self.phase + rhs.phase)
    }
}

impl Mul<f64> for Amplitude {
    type Output = Amplitude;

    fn mul(self, rhs: f64) -> Amplitude {
        self.scale(rhs)
    }
}

impl Add for Amplitude {
    type Output = Amplitude;

    fn add(self, rhs: Amplitude) -> Amplitude {
        Amplitude::sum([self, rhs].iter())
    }
}

impl Sum for Amplitude {
    fn sum<I: Iterator<Item = Amplitude>>(iter: I) -> Self {
        let total: Complex64 = iter.map(|a| a.to_rectangular()).sum();
        Amplitude::from(total)
    }
}

impl<'a> Sum<&'a Amplitude> for Amplitude {
    fn sum<I: Iterator<Item = &'a Amplitude>>(iter: I) -> Self {
        Amplitude::sum(iter)
    }
}

impl Zero for Amplitude {
    fn zero() -> Self {
        Self::ZERO
    }

    fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl One for Amplitude {
    fn one() -> Self {
        Self::ONE
    }
}

impl Default for Amplitude {
    fn default() -> Self {
        Self::ZERO
    }
}

impl PartialEq for Amplitude {
    fn eq(&self, other: &Self) -> bool {
        (self.to_rectangular() - other.to_rectangular()).norm_sqr() < EPSILON_SQUARED
    }
}

impl PartialEq<f64> for Amplitude {
    fn eq(&self, other: &f64) -> bool {
        (self.to_rectangular() - Complex64::new(*other, 0.0)).norm_sqr() < EPSILON_SQUARED
    }
}

impl fmt::Display for Amplitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.3}, {:.3})", self.magnitude, self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2};

    #[test]
    fn test_negative_magnitude_folds_into_phase() {
        let a = Amplitude::new(-2.0, 0.0);
        assert_relative_eq!(a.magnitude(), 2.0);
        assert_relative_eq!(a.phase(), PI);
        assert_relative_eq!(a.to_rectangular().re, -2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_phase_reduced_modulo_tau() {
        let a = Amplitude::new(1.0, 5.0 * PI);
        assert_relative_eq!(a.phase(), PI, epsilon = 1e-12);

        let b = Amplitude::new(1.0, -FRAC_PI_2);
        assert_relative_eq!(b.phase(), 3.0 * FRAC_PI_2, epsilon = 1e-12);

        let c = Amplitude::new(1.0, -1e-20);
        assert!(c.phase() >= 0.0 && c.phase() < TAU);
    }

    #[test]
    fn test_multiply_adds_phases() {
        let i = Amplitude::new(1.0, FRAC_PI_2);
        let minus_one = (i * i).to_rectangular();
        assert_relative_eq!(minus_one.re, -1.0, epsilon = 1e-12);
        assert_relative_eq!(minus_one.im, 0.0, epsilon = 1e-12);
        assert_relative_eq!((Amplitude::real(3.0) * 0.5).magnitude(), 1.5);
        let flipped = Amplitude::real(3.0) * -1.0;
        assert_relative_eq!(flipped.phase(), PI);
    }

    #[test]
    fn test_sum_is_rectangular() {
        let h = Amplitude::real(FRAC_1_SQRT_2);
        let terms = [h * h, h * Amplitude::real(-FRAC_1_SQRT_2)];
        let total = Amplitude::sum(terms.iter());
        assert!(total.is_negligible());

        let total: Amplitude = [Amplitude::ONE, Amplitude::new(1.0, FRAC_PI_2)].into_iter().sum();
        assert_relative_eq!(total.magnitude(), 2.0_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(total.phase(), PI / 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_conjugate_and_absolute_square() {
        let a = Amplitude::from_rectangular(0.6, 0.8);
        let c = a.conjugate();
        assert_relative_eq!(c.to_rectangular().im, -0.8, epsilon = 1e-12);
        assert_relative_eq!(a.absolute_square(), 1.0, epsilon = 1e-12);
        assert_relative_eq!((a * c).to_rectangular().re, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_tolerant_equality() {
        let a = Amplitude::real(0.5);
        assert_eq!(a, Amplitude::new(0.5, TAU));
        assert_ne!(a, Amplitude::real(0.5 + 1e-12));
        assert!(Amplitude::ZERO.is_zero());
        assert_eq!(Amplitude::one(), 1.0);
    }

    #[test]
    fn test_display_three_decimals() {
        assert_eq!(format!("{}", Amplitude::new(-1.0, 0.0)), "(1.000, 3.142)");
    }
}
