//! Unit-tagged angles
//!
//! Field of view and dataset orientation cross the API in degrees; orbit
//! angles and rates are radians. Conversion happens only through these types.

use serde::{Deserialize, Serialize};

/// An angle in degrees
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Degrees(pub f32);

/// An angle in radians
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Radians(pub f32);

impl Degrees {
    pub fn to_radians(self) -> Radians {
        Radians(self.0.to_radians())
    }
}

impl Radians {
    /// One full turn
    pub const TAU: Radians = Radians(std::f32::consts::TAU);

    pub fn to_degrees(self) -> Degrees {
        Degrees(self.0.to_degrees())
    }
}

impl From<Degrees> for Radians {
    fn from(value: Degrees) -> Self {
        value.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degree_conversion() {
        let r = Degrees(180.0).to_radians();
        assert!((r.0 - std::f32::consts::PI).abs() < 1e-6);
        assert!((r.to_degrees().0 - 180.0).abs() < 1e-4);
    }
}
