/*!
    Rational number type for time bases.
*/

use std::fmt;

/**
    A rational number represented as a numerator and denominator.

    Used for stream time bases (e.g., 1/65535 for the session video stream,
    1/48000 for a 48 kHz audio stream). A time base is the scale factor that
    converts integer tick counts into seconds.
*/
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    /**
        Create a new rational number.

        # Panics

        Panics if `den` is zero.
    */
    #[inline]
    pub const fn new(num: i32, den: i32) -> Self {
        assert!(den != 0, "denominator cannot be zero");
        Self { num, den }
    }

    /**
        Convert to f64.
    */
    #[inline]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }

    /**
        Invert the rational (swap numerator and denominator).

        # Panics

        Panics if numerator is zero.
    */
    #[inline]
    pub const fn invert(self) -> Self {
        assert!(self.num != 0, "cannot invert zero");
        Self {
            num: self.den,
            den: self.num,
        }
    }

    /**
        Convert a duration in seconds into a tick count in this time base.

        The fractional remainder is truncated, never rounded, so a timestamp
        can only map to an earlier tick, not a later one.
    */
    #[inline]
    pub fn ticks(self, seconds: f64) -> i64 {
        (seconds * self.den as f64 / self.num as f64) as i64
    }

    /**
        Convert a tick count in this time base into seconds.
    */
    #[inline]
    pub fn seconds(self, ticks: i64) -> f64 {
        ticks as f64 * self.to_f64()
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(i32, i32)> for Rational {
    fn from((num, den): (i32, i32)) -> Self {
        Self::new(num, den)
    }
}

impl From<i32> for Rational {
    fn from(num: i32) -> Self {
        Self::new(num, 1)
    }
}
