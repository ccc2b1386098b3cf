//! Water-stress level classification

use serde::{Deserialize, Serialize};

/// Three-level ordinal water-stress classification.
///
/// The ordinal values (0/1/2) and the snake_case textual tags are part of the
/// trained-artifact contract and must not change between training and serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    /// Level 0
    NoStress,
    /// Level 1
    ModerateStress,
    /// Level 2
    SevereStress,
}

impl StressLevel {
    /// Ordinal class value used as the training target.
    pub const fn level(self) -> u8 {
        match self {
            StressLevel::NoStress => 0,
            StressLevel::ModerateStress => 1,
            StressLevel::SevereStress => 2,
        }
    }

    /// Fixed textual tag (matches the serde representation).
    pub const fn as_tag(self) -> &'static str {
        match self {
            StressLevel::NoStress => "no_stress",
            StressLevel::ModerateStress => "moderate_stress",
            StressLevel::SevereStress => "severe_stress",
        }
    }

    /// Reconstruct a level from its ordinal class value.
    pub const fn from_level(level: u8) -> Option<Self> {
        match level {
            0 => Some(StressLevel::NoStress),
            1 => Some(StressLevel::ModerateStress),
            2 => Some(StressLevel::SevereStress),
            _ => None,
        }
    }

    /// All levels in ordinal order.
    pub const ALL: [StressLevel; 3] = [
        StressLevel::NoStress,
        StressLevel::ModerateStress,
        StressLevel::SevereStress,
    ];
}

impl std::fmt::Display for StressLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_round_trip() {
        for stress in StressLevel::ALL {
            assert_eq!(StressLevel::from_level(stress.level()), Some(stress));
        }
        assert_eq!(StressLevel::from_level(3), None);
    }

    #[test]
    fn tags_are_fixed() {
        assert_eq!(StressLevel::NoStress.as_tag(), "no_stress");
        assert_eq!(StressLevel::ModerateStress.as_tag(), "moderate_stress");
        assert_eq!(StressLevel::SevereStress.as_tag(), "severe_stress");
    }

    #[test]
    fn serde_uses_tags() {
        let json = serde_json::to_string(&StressLevel::SevereStress).unwrap();
        assert_eq!(json, "\"severe_stress\"");
        let back: StressLevel = serde_json::from_str("\"moderate_stress\"").unwrap();
        assert_eq!(back, StressLevel::ModerateStress);
    }

    #[test]
    fn ordering_follows_severity() {
        assert!(StressLevel::NoStress < StressLevel::ModerateStress);
        assert!(StressLevel::ModerateStress < StressLevel::SevereStress);
    }
}
