/// Before/after report comparison
///
/// Produces the recommendation lines of the printed report from two saved
/// measurements: signed angle changes, then directional suggestions for
/// anything the AFTER capture still has out of range.

use crate::models::issue::{AngleKind, Deviation};
use crate::models::metrics::format_delta;
use crate::models::session::Measurement;
use crate::services::preset_resolver::resolve;

/// Line emitted when nothing noteworthy changed
pub const NO_CHANGE_LINE: &str =
    "Measurements are very similar — the change is stable or no large correction was made.";

#[derive(Debug, Clone)]
pub struct ReportComparator {
    /// Smallest change worth reporting, in degrees
    delta_threshold: f64,
}

impl ReportComparator {
    pub fn new(delta_threshold: f64) -> Self {
        Self { delta_threshold }
    }

    /// Signed change of one angle, when both captures have it
    pub fn delta(&self, kind: AngleKind, before: &Measurement, after: &Measurement) -> Option<f64> {
        let delta = after.angle(kind)? - before.angle(kind)?;
        delta.is_finite().then_some(delta)
    }

    /// Recommendation lines for a before/after pair
    pub fn compare(&self, before: &Measurement, after: &Measurement) -> Vec<String> {
        let mut lines = Vec::new();

        for kind in [AngleKind::Knee, AngleKind::Elbow, AngleKind::Torso] {
            if let Some(delta) = self.delta(kind, before, after) {
                if delta.abs() >= self.delta_threshold {
                    lines.push(format!(
                        "{} angle changed by {} (influenced by {}).",
                        capitalize(kind.name()),
                        format_delta(delta),
                        kind.influence()
                    ));
                }
            }
        }

        let preset = resolve(after.discipline, after.goal);
        for kind in AngleKind::PRECEDENCE {
            let range = match kind {
                AngleKind::Knee => preset.knee,
                AngleKind::Torso => preset.torso,
                AngleKind::Elbow => preset.elbow,
            };
            if let Some(deviation) = after
                .angle(kind)
                .and_then(|value| Deviation::check(kind, value, range))
            {
                lines.push(deviation.recommendation());
            }
        }

        if lines.is_empty() {
            lines.push(NO_CHANGE_LINE.to_string());
        }
        lines
    }
}

impl Default for ReportComparator {
    fn default() -> Self {
        Self::new(2.0)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Pick the before/after pair for a report
///
/// Explicit ids win. With nothing selected and at least two captures, the
/// first two captures are compared.
pub fn select_pair<'a>(
    measurements: &'a [Measurement],
    before_id: Option<&str>,
    after_id: Option<&str>,
) -> Option<(&'a Measurement, &'a Measurement)> {
    let find = |id: &str| measurements.iter().find(|m| m.id == id);

    match (before_id, after_id) {
        (None, None) if measurements.len() >= 2 => Some((&measurements[0], &measurements[1])),
        (Some(before), Some(after)) => Some((find(before)?, find(after)?)),
        _ => None,
    }
}
