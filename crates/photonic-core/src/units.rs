use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

/// Default database unit in micrometers (1 nm grid).
pub const DEFAULT_DBU: f64 = 0.001;

/// A length in micrometers.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Um(pub f64);

/// A length in integer database units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dbu(pub i64);

impl Um {
    pub const ZERO: Um = Um(0.0);

    pub fn value(self) -> f64 {
        self.0
    }

    /// Snap to the database grid, rounding half away from zero.
    pub fn to_dbu(self, dbu: f64) -> Dbu {
        Dbu((self.0 / dbu).round() as i64)
    }

    /// Convert to database units only if the value already lies on the grid.
    ///
    /// Returns `None` when snapping would move the value by more than a
    /// thousandth of a database unit.
    pub fn to_dbu_exact(self, dbu: f64) -> Option<Dbu> {
        let units = self.0 / dbu;
        let snapped = units.round();
        if (units - snapped).abs() <= 1e-3 {
            Some(Dbu(snapped as i64))
        } else {
            None
        }
    }

    pub fn abs(self) -> Um {
        Um(self.0.abs())
    }
}

impl Dbu {
    pub const ZERO: Dbu = Dbu(0);

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn to_um(self, dbu: f64) -> Um {
        Um(self.0 as f64 * dbu)
    }

    pub fn abs(self) -> Dbu {
        Dbu(self.0.abs())
    }

    pub fn is_even(self) -> bool {
        self.0 % 2 == 0
    }
}

impl From<f64> for Um {
    fn from(value: f64) -> Self {
        Um(value)
    }
}

impl From<i64> for Dbu {
    fn from(value: i64) -> Self {
        Dbu(value)
    }
}

impl fmt::Display for Um {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}um", self.0)
    }
}

impl fmt::Display for Dbu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}dbu", self.0)
    }
}

macro_rules! impl_length_ops {
    ($ty:ident, $inner:ty) => {
        impl Add for $ty {
            type Output = $ty;
            fn add(self, rhs: $ty) -> $ty {
                $ty(self.0 + rhs.0)
            }
        }

        impl Sub for $ty {
            type Output = $ty;
            fn sub(self, rhs: $ty) -> $ty {
                $ty(self.0 - rhs.0)
            }
        }

        impl Neg for $ty {
            type Output = $ty;
            fn neg(self) -> $ty {
                $ty(-self.0)
            }
        }

        impl Mul<$inner> for $ty {
            type Output = $ty;
            fn mul(self, rhs: $inner) -> $ty {
                $ty(self.0 * rhs)
            }
        }

        impl Div<$inner> for $ty {
            type Output = $ty;
            fn div(self, rhs: $inner) -> $ty {
                $ty(self.0 / rhs)
            }
        }
    };
}

impl_length_ops!(Um, f64);
impl_length_ops!(Dbu, i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_um_to_dbu_rounds() {
        assert_eq!(Um(0.5).to_dbu(DEFAULT_DBU), Dbu(500));
        assert_eq!(Um(0.0004).to_dbu(DEFAULT_DBU), Dbu(0));
        assert_eq!(Um(-0.0016).to_dbu(DEFAULT_DBU), Dbu(-2));
    }

    #[test]
    fn test_exact_conversion_rejects_off_grid() {
        assert_eq!(Um(10.0).to_dbu_exact(DEFAULT_DBU), Some(Dbu(10_000)));
        assert_eq!(Um(0.0005).to_dbu_exact(DEFAULT_DBU), None);
    }

    #[test]
    fn test_dbu_to_um() {
        assert!((Dbu(1500).to_um(DEFAULT_DBU).0 - 1.5).abs() < 1e-12);
        assert_eq!(Dbu(7) / 2, Dbu(3));
    }
}
