use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Proof-of-work difficulty: the number of leading `'0'` characters a
/// lowercase hex digest must start with.
///
/// Counting hex characters (not bits) means each step multiplies the
/// expected search effort by 16.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    /// Hex characters in a SHA-256 digest.
    pub const MAX: u32 = 64;

    pub const ZERO: Self = Self(0);

    pub fn leading_zeros(&self) -> u32 {
        self.0
    }

    /// Returns `true` if `digest` starts with the required zero characters.
    pub fn is_met_by(&self, digest: &str) -> bool {
        let required = self.0 as usize;
        digest.len() >= required && digest.bytes().take(required).all(|b| b == b'0')
    }

    /// Expected nonce attempts for one seal, `16^d`.
    pub fn expected_attempts(&self) -> f64 {
        16f64.powi(self.0 as i32)
    }

    /// The `"000..."` prefix a sealed digest carries.
    pub fn target_prefix(&self) -> String {
        "0".repeat(self.0 as usize)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self(4)
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = TypeError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value > Self::MAX {
            return Err(TypeError::DifficultyOutOfRange {
                requested: value,
                max: Self::MAX,
            });
        }
        Ok(Self(value))
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
