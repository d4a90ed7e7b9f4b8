/// Fit issues and their advice text
///
/// An issue is one candidate piece of feedback. Lower priority values are
/// more urgent; data-quality issues always outrank biomechanical ones.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::metrics::{format_angle, format_stability};
use super::preset::{AngleRange, RangeCheck};

pub const PRIORITY_STABILITY: u8 = 0;
pub const PRIORITY_KNEE: u8 = 10;
pub const PRIORITY_TORSO: u8 = 20;
pub const PRIORITY_ELBOW: u8 = 30;
pub const PRIORITY_ALL_OK: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKey {
    StabLow,
    /// Knee too straight at BDC
    KneeHigh,
    /// Knee too bent at BDC
    KneeLow,
    /// Torso leaning too far forward
    TorsoHigh,
    /// Torso too upright
    TorsoLow,
    /// Arms too straight
    ElbowHigh,
    /// Elbows strongly bent
    ElbowLow,
    AllOk,
}

impl IssueKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKey::StabLow => "stab_low",
            IssueKey::KneeHigh => "knee_high",
            IssueKey::KneeLow => "knee_low",
            IssueKey::TorsoHigh => "torso_high",
            IssueKey::TorsoLow => "torso_low",
            IssueKey::ElbowHigh => "elbow_high",
            IssueKey::ElbowLow => "elbow_low",
            IssueKey::AllOk => "all_ok",
        }
    }
}

impl fmt::Display for IssueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single candidate piece of fit feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: IssueKey,
    pub title: String,
    pub text: String,
    pub priority: u8,
}

impl Issue {
    pub fn new(key: IssueKey, title: impl Into<String>, text: impl Into<String>, priority: u8) -> Self {
        Self {
            key,
            title: title.into(),
            text: text.into(),
            priority,
        }
    }

    /// Data quality too low to judge the fit
    pub fn stability_low(stability: Option<f64>) -> Self {
        Issue::new(
            IssueKey::StabLow,
            "Fix framing and lighting",
            format!(
                "Landmarks are uncertain (stability {}). Brighten the scene, steady the camera and \
                 keep hip, knee and ankle in frame. Only then change the bike setup.",
                format_stability(stability)
            ),
            PRIORITY_STABILITY,
        )
    }

    /// Everything measured is within the preset
    pub fn all_ok() -> Self {
        Issue::new(
            IssueKey::AllOk,
            "Looks good",
            "All tracked angles are within the preset ranges. Save BEFORE and AFTER \
             measurements around any micro-adjustment.",
            PRIORITY_ALL_OK,
        )
    }
}

/// Angles the fit is judged on, in precedence order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AngleKind {
    Knee,
    Torso,
    Elbow,
}

impl AngleKind {
    pub const PRECEDENCE: [AngleKind; 3] = [AngleKind::Knee, AngleKind::Torso, AngleKind::Elbow];

    pub fn name(&self) -> &'static str {
        match self {
            AngleKind::Knee => "knee",
            AngleKind::Torso => "torso",
            AngleKind::Elbow => "elbow",
        }
    }

    /// Bike adjustment mainly driving this angle
    pub fn influence(&self) -> &'static str {
        match self {
            AngleKind::Knee => "saddle height",
            AngleKind::Torso => "drop / cockpit height",
            AngleKind::Elbow => "reach / stem",
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            AngleKind::Knee => PRIORITY_KNEE,
            AngleKind::Torso => PRIORITY_TORSO,
            AngleKind::Elbow => PRIORITY_ELBOW,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Low,
    High,
}

/// An angle found outside its preset range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    pub kind: AngleKind,
    pub direction: Direction,
    pub value: f64,
    pub range: AngleRange,
}

impl Deviation {
    /// Compare one angle to its range; `None` when in range
    pub fn check(kind: AngleKind, value: f64, range: AngleRange) -> Option<Self> {
        let direction = match range.check(value) {
            RangeCheck::Below(_) => Direction::Low,
            RangeCheck::Above(_) => Direction::High,
            RangeCheck::Within => return None,
        };
        Some(Self {
            kind,
            direction,
            value,
            range,
        })
    }

    pub fn key(&self) -> IssueKey {
        match (self.kind, self.direction) {
            (AngleKind::Knee, Direction::High) => IssueKey::KneeHigh,
            (AngleKind::Knee, Direction::Low) => IssueKey::KneeLow,
            (AngleKind::Torso, Direction::High) => IssueKey::TorsoHigh,
            (AngleKind::Torso, Direction::Low) => IssueKey::TorsoLow,
            (AngleKind::Elbow, Direction::High) => IssueKey::ElbowHigh,
            (AngleKind::Elbow, Direction::Low) => IssueKey::ElbowLow,
        }
    }

    /// The one adjustment to try first
    pub fn adjustment(&self) -> &'static str {
        match self.key() {
            IssueKey::KneeHigh => "lower the saddle by 3–5 mm",
            IssueKey::KneeLow => "raise the saddle by 3–5 mm",
            IssueKey::TorsoHigh => "raise the cockpit by 5–10 mm (spacers or stem angle)",
            IssueKey::TorsoLow => "lower the cockpit by 5–10 mm if the goal calls for it",
            IssueKey::ElbowHigh => "shorten the reach with a 5–10 mm shorter stem or a higher cockpit",
            IssueKey::ElbowLow => "lengthen the reach with a 5–10 mm longer stem",
            IssueKey::StabLow | IssueKey::AllOk => "",
        }
    }

    fn title(&self) -> &'static str {
        match self.key() {
            IssueKey::KneeHigh => "Knee too straight: lower the saddle",
            IssueKey::KneeLow => "Knee too bent: raise the saddle",
            IssueKey::TorsoHigh => "Torso too far forward: raise the cockpit",
            IssueKey::TorsoLow => "Torso too upright: lower the cockpit",
            IssueKey::ElbowHigh => "Arms too straight: shorten the reach",
            IssueKey::ElbowLow => "Elbows strongly bent: lengthen the reach",
            IssueKey::StabLow | IssueKey::AllOk => "",
        }
    }

    fn finding(&self) -> &'static str {
        match self.key() {
            IssueKey::KneeHigh => "Knee angle at the bottom of the stroke is too straight",
            IssueKey::KneeLow => "Knee angle at the bottom of the stroke is too bent",
            IssueKey::TorsoHigh => "Torso leans too far forward",
            IssueKey::TorsoLow => "Torso is quite upright",
            IssueKey::ElbowHigh => "Arms are too straight",
            IssueKey::ElbowLow => "Elbows are strongly bent",
            IssueKey::StabLow | IssueKey::AllOk => "",
        }
    }

    /// Live coaching issue for this deviation
    pub fn issue(&self) -> Issue {
        Issue::new(
            self.key(),
            self.title(),
            format!(
                "{}: {} (target {}). Start: {}. Make one change at a time, then save an AFTER measurement.",
                self.finding(),
                format_angle(Some(self.value)),
                self.range,
                self.adjustment()
            ),
            self.kind.priority(),
        )
    }

    /// One-line recommendation for a static report
    pub fn recommendation(&self) -> String {
        let position = match self.direction {
            Direction::High => "above",
            Direction::Low => "below",
        };
        let mut name = self.kind.name().to_string();
        if let Some(first) = name.get_mut(0..1) {
            first.make_ascii_uppercase();
        }
        format!(
            "{} {} is {} the {} target: {}.",
            name,
            format_angle(Some(self.value)),
            position,
            self.range,
            self.adjustment()
        )
    }
}
