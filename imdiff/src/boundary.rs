//! Boundary extension for convolution near image edges.
//!
//! Each policy maps an out-of-range coordinate to a valid index on the same
//! axis. Every convolution pass uses the same mapping, so filtering is
//! reproducible regardless of which edge a sample falls off.

use std::fmt;
use std::str::FromStr;

use crate::MetricError;

/// Named boundary extension policy.
///
/// | name          | policy           | `-1` maps to | `n` maps to |
/// |---------------|------------------|--------------|-------------|
/// | `zpd`, `const`| `Replicate`      | `0`          | `n - 1`     |
/// | `hsym`        | `HalfSymmetric`  | `0`          | `n - 1`     |
/// | `wsym`        | `WholeSymmetric` | `1`          | `n - 2`     |
/// | `per`         | `Periodic`       | `n - 1`      | `0`         |
///
/// The two symmetric policies differ further out: half-sample symmetric
/// repeats the edge sample (`-2 -> 1`), whole-sample symmetric does not
/// (`-2 -> 2`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoundaryExt {
    /// Nearest valid sample (edge replication).
    #[default]
    Replicate,
    /// Mirror about the half-sample point outside the edge.
    HalfSymmetric,
    /// Mirror about the edge sample itself.
    WholeSymmetric,
    /// Wrap around.
    Periodic,
}

impl BoundaryExt {
    /// Policy used by the MSSIM engine.
    pub const MSSIM: Self = Self::Replicate;

    /// Maps `i` onto `[0, len)`.
    ///
    /// `len` must be non-zero.
    #[inline]
    #[must_use]
    pub fn extend(self, i: isize, len: usize) -> usize {
        debug_assert!(len > 0);
        let n = len as isize;
        if (0..n).contains(&i) {
            return i as usize;
        }

        match self {
            Self::Replicate => i.clamp(0, n - 1) as usize,
            Self::HalfSymmetric => {
                let period = 2 * n;
                let m = i.rem_euclid(period);
                (if m < n { m } else { period - 1 - m }) as usize
            }
            Self::WholeSymmetric => {
                if n == 1 {
                    return 0;
                }
                let period = 2 * n - 2;
                let m = i.rem_euclid(period);
                (if m < n { m } else { period - m }) as usize
            }
            Self::Periodic => i.rem_euclid(n) as usize,
        }
    }

    /// Short policy name, the inverse of [`FromStr`].
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Replicate => "zpd",
            Self::HalfSymmetric => "hsym",
            Self::WholeSymmetric => "wsym",
            Self::Periodic => "per",
        }
    }
}

impl FromStr for BoundaryExt {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zpd" | "const" => Ok(Self::Replicate),
            "hsym" => Ok(Self::HalfSymmetric),
            "wsym" => Ok(Self::WholeSymmetric),
            "per" => Ok(Self::Periodic),
            _ => Err(MetricError::UnknownBoundary(s.to_string())),
        }
    }
}

impl fmt::Display for BoundaryExt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
