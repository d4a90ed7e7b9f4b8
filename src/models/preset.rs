use serde::{Deserialize, Serialize};
use std::fmt;

/// Riding discipline; anything unrecognized is treated as road
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Discipline {
    #[default]
    Road,
    Gravel,
    Mtb,
}

impl Discipline {
    pub const ALL: [Discipline; 3] = [Discipline::Road, Discipline::Gravel, Discipline::Mtb];

    pub fn as_str(&self) -> &'static str {
        match self {
            Discipline::Road => "road",
            Discipline::Gravel => "gravel",
            Discipline::Mtb => "mtb",
        }
    }

    /// Display label used on reports
    pub fn label(&self) -> &'static str {
        match self {
            Discipline::Road => "ROAD",
            Discipline::Gravel => "GRAVEL",
            Discipline::Mtb => "MTB",
        }
    }
}

impl From<&str> for Discipline {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "gravel" => Discipline::Gravel,
            "mtb" => Discipline::Mtb,
            _ => Discipline::Road,
        }
    }
}

impl From<String> for Discipline {
    fn from(value: String) -> Self {
        Discipline::from(value.as_str())
    }
}

impl From<Discipline> for String {
    fn from(value: Discipline) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fit goal; anything unrecognized is treated as neutral
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Goal {
    Comfort,
    #[default]
    Neutral,
    Aero,
}

impl Goal {
    pub const ALL: [Goal; 3] = [Goal::Comfort, Goal::Neutral, Goal::Aero];

    pub fn as_str(&self) -> &'static str {
        match self {
            Goal::Comfort => "comfort",
            Goal::Neutral => "neutral",
            Goal::Aero => "aero",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Goal::Comfort => "Comfort",
            Goal::Neutral => "Neutral",
            Goal::Aero => "Aero",
        }
    }
}

impl From<&str> for Goal {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "comfort" => Goal::Comfort,
            "aero" => Goal::Aero,
            _ => Goal::Neutral,
        }
    }
}

impl From<String> for Goal {
    fn from(value: String) -> Self {
        Goal::from(value.as_str())
    }
}

impl From<Goal> for String {
    fn from(value: Goal) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a value sits relative to a range
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RangeCheck {
    Below(f64),
    Within,
    Above(f64),
}

/// Closed interval of acceptable angles, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleRange {
    pub min: f64,
    pub max: f64,
}

impl AngleRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Compare a value against the range, carrying the deviation in degrees
    pub fn check(&self, value: f64) -> RangeCheck {
        if value < self.min {
            RangeCheck::Below(self.min - value)
        } else if value > self.max {
            RangeCheck::Above(value - self.max)
        } else {
            RangeCheck::Within
        }
    }
}

impl fmt::Display for AngleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}–{}°", self.min, self.max)
    }
}

/// Acceptable joint-angle ranges for one discipline and goal
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub knee: AngleRange,
    pub elbow: AngleRange,
    /// Torso lean from vertical (0° upright)
    pub torso: AngleRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_discipline_is_road() {
        assert_eq!(Discipline::from("triathlon"), Discipline::Road);
        assert_eq!(Discipline::from(" MTB "), Discipline::Mtb);
        assert_eq!(Goal::from("fast"), Goal::Neutral);
    }

    #[test]
    fn test_discipline_serializes_as_string() {
        let json = serde_json::to_string(&Discipline::Gravel).unwrap();
        assert_eq!(json, r#""gravel""#);

        let parsed: Discipline = serde_json::from_str(r#""bmx""#).unwrap();
        assert_eq!(parsed, Discipline::Road);
    }

    #[test]
    fn test_range_check() {
        let range = AngleRange::new(142.0, 152.0);
        assert_eq!(range.check(160.0), RangeCheck::Above(8.0));
        assert_eq!(range.check(140.0), RangeCheck::Below(2.0));
        assert_eq!(range.check(142.0), RangeCheck::Within);
        assert_eq!(range.check(152.0), RangeCheck::Within);
        assert_eq!(range.to_string(), "142–152°");
    }
}
