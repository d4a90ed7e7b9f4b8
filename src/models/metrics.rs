use serde::{Deserialize, Serialize};

use super::landmark::Side;

/// Placeholder shown for any missing value
pub const MISSING_VALUE: &str = "—";

/// Per-frame measurement snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    /// Side the angles were measured on
    pub side: Option<Side>,
    /// Instantaneous knee angle (degrees)
    pub knee: Option<f64>,
    pub elbow: Option<f64>,
    /// Torso lean from vertical (degrees)
    pub torso: Option<f64>,
    /// Mean visibility of the tracked joints (0-100)
    pub stability: Option<f64>,
    /// Knee angle latched at the most recent bottom dead center
    #[serde(rename = "kneeAtBDC")]
    pub knee_at_bdc: Option<f64>,
    #[serde(rename = "kneeAtBDCAgeMs")]
    pub knee_at_bdc_age_ms: Option<u64>,
}

impl Metrics {
    /// BDC knee angle if it is young enough to advise on
    pub fn fresh_knee_at_bdc(&self, max_age_ms: u64) -> Option<f64> {
        match (self.knee_at_bdc, self.knee_at_bdc_age_ms) {
            (Some(knee), Some(age)) if age <= max_age_ms => Some(knee),
            _ => None,
        }
    }

    /// Knee value worth displaying or saving: fresh BDC first, instantaneous otherwise
    pub fn display_knee(&self, max_age_ms: u64) -> Option<f64> {
        self.fresh_knee_at_bdc(max_age_ms).or(self.knee)
    }

    /// True when nothing usable was measured yet
    pub fn is_empty(&self) -> bool {
        self.stability.is_none() && self.knee.is_none() && self.knee_at_bdc.is_none()
    }
}

/// KPI display channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kpi {
    Knee,
    Elbow,
    Torso,
    Stability,
}

impl Kpi {
    pub const ALL: [Kpi; 4] = [Kpi::Knee, Kpi::Elbow, Kpi::Torso, Kpi::Stability];

    pub fn as_str(&self) -> &'static str {
        match self {
            Kpi::Knee => "knee",
            Kpi::Elbow => "elbow",
            Kpi::Torso => "torso",
            Kpi::Stability => "stab",
        }
    }
}

/// Format an angle as `148.3°`
pub fn format_angle(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}°", v),
        _ => MISSING_VALUE.to_string(),
    }
}

/// Format a 0-100 stability score as `87%`
pub fn format_stability(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.0}%", v.clamp(0.0, 100.0)),
        _ => MISSING_VALUE.to_string(),
    }
}

/// Format a signed change, dropping a trailing `.0` (`+8°`, `-2.5°`)
pub fn format_delta(delta: f64) -> String {
    let text = format!("{:+.1}", delta);
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{}°", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_knee_respects_age() {
        let metrics = Metrics {
            knee: Some(120.0),
            knee_at_bdc: Some(148.0),
            knee_at_bdc_age_ms: Some(2500),
            ..Metrics::default()
        };
        assert_eq!(metrics.fresh_knee_at_bdc(2500), Some(148.0));
        assert_eq!(metrics.fresh_knee_at_bdc(2499), None);
        assert_eq!(metrics.display_knee(1000), Some(120.0));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_angle(Some(148.26)), "148.3°");
        assert_eq!(format_angle(None), MISSING_VALUE);
        assert_eq!(format_angle(Some(f64::NAN)), MISSING_VALUE);
        assert_eq!(format_stability(Some(87.4)), "87%");
        assert_eq!(format_delta(8.0), "+8°");
        assert_eq!(format_delta(-2.5), "-2.5°");
        assert_eq!(format_delta(-3.04), "-3°");
    }

    #[test]
    fn test_metrics_field_names() {
        let metrics = Metrics {
            knee_at_bdc: Some(150.0),
            knee_at_bdc_age_ms: Some(10),
            ..Metrics::default()
        };
        let json = serde_json::to_value(metrics).unwrap();
        assert_eq!(json["kneeAtBDC"], 150.0);
        assert_eq!(json["kneeAtBDCAgeMs"], 10);
    }
}
