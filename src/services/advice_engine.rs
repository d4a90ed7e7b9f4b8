/// Advice / Issue Engine
///
/// Turns per-frame metrics into a prioritized issue list and rate-limits the
/// two display channels:
/// - client channel: full list, at most every `client_interval_ms`, only when the key set changes
/// - coach channel: the single top issue, held for `coach_hold_ms` unless its key changes

use crate::config::PipelineConfig;
use crate::models::issue::{AngleKind, Deviation, Issue, IssueKey};
use crate::models::metrics::Metrics;
use crate::models::preset::Preset;

/// Evaluate one frame's metrics against a preset
///
/// Low stability short-circuits to a single `stab_low` issue. The knee is
/// only judged on a fresh BDC latch, never on an arbitrary frame. Missing
/// angles skip their check. The result is sorted by priority.
pub fn evaluate_issues(
    metrics: &Metrics,
    preset: &Preset,
    min_stability: f64,
    bdc_max_age_ms: u64,
) -> Vec<Issue> {
    match metrics.stability {
        Some(stability) if stability >= min_stability => {}
        other => return vec![Issue::stability_low(other)],
    }

    let mut issues: Vec<Issue> = AngleKind::PRECEDENCE
        .iter()
        .filter_map(|&kind| {
            let (value, range) = match kind {
                AngleKind::Knee => (metrics.fresh_knee_at_bdc(bdc_max_age_ms), preset.knee),
                AngleKind::Torso => (metrics.torso, preset.torso),
                AngleKind::Elbow => (metrics.elbow, preset.elbow),
            };
            Deviation::check(kind, value?, range)
        })
        .map(|deviation| deviation.issue())
        .collect();

    if issues.is_empty() {
        issues.push(Issue::all_ok());
    }

    issues.sort_by_key(|issue| issue.priority);
    issues
}

/// Rate limiter for the client-facing issue list
#[derive(Debug, Clone)]
pub struct ClientThrottle {
    interval_ms: u64,
    last_emit_ms: Option<u64>,
    last_keys: Vec<IssueKey>,
}

impl ClientThrottle {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms,
            last_emit_ms: None,
            last_keys: Vec::new(),
        }
    }

    /// Returns true when `issues` should be shown now
    pub fn offer(&mut self, issues: &[Issue], now_ms: u64) -> bool {
        let mut keys: Vec<IssueKey> = issues.iter().map(|issue| issue.key).collect();
        keys.sort();
        keys.dedup();

        let due = match self.last_emit_ms {
            None => true,
            Some(last) => keys != self.last_keys && now_ms.saturating_sub(last) >= self.interval_ms,
        };

        if due {
            self.last_emit_ms = Some(now_ms);
            self.last_keys = keys;
        }
        due
    }

    pub fn reset(&mut self) {
        self.last_emit_ms = None;
        self.last_keys.clear();
    }
}

/// Hold timer for the single coach message
#[derive(Debug, Clone)]
pub struct CoachThrottle {
    hold_ms: u64,
    current: Option<(IssueKey, u64)>,
}

impl CoachThrottle {
    pub fn new(hold_ms: u64) -> Self {
        Self {
            hold_ms,
            current: None,
        }
    }

    /// Returns true when `issue` should replace the shown message
    pub fn offer(&mut self, issue: &Issue, now_ms: u64) -> bool {
        let due = match self.current {
            None => true,
            Some((key, since)) => key != issue.key || now_ms.saturating_sub(since) >= self.hold_ms,
        };

        if due {
            self.current = Some((issue.key, now_ms));
        }
        due
    }

    pub fn current_key(&self) -> Option<IssueKey> {
        self.current.map(|(key, _)| key)
    }

    /// Forget the shown message, e.g. after something else took over the channel
    pub fn clear(&mut self) {
        self.current = None;
    }
}

/// What the display channels should show after one frame
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdviceUpdate {
    /// Sorted issues for this frame
    pub issues: Vec<Issue>,
    /// Set when the client list is due for an update
    pub client: Option<Vec<Issue>>,
    /// Set when the coach message is due for an update
    pub coach: Option<Issue>,
}

#[derive(Debug, Clone)]
pub struct AdviceEngine {
    min_stability: f64,
    bdc_max_age_ms: u64,
    client: ClientThrottle,
    coach: CoachThrottle,
}

impl AdviceEngine {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            min_stability: config.min_stability,
            bdc_max_age_ms: config.bdc_max_age_ms,
            client: ClientThrottle::new(config.client_interval_ms),
            coach: CoachThrottle::new(config.coach_hold_ms),
        }
    }

    pub fn evaluate(&self, metrics: &Metrics, preset: &Preset) -> Vec<Issue> {
        evaluate_issues(metrics, preset, self.min_stability, self.bdc_max_age_ms)
    }

    /// Evaluate a frame and decide which channels update
    pub fn update(&mut self, metrics: &Metrics, preset: &Preset, now_ms: u64) -> AdviceUpdate {
        let issues = self.evaluate(metrics, preset);

        let client = self
            .client
            .offer(&issues, now_ms)
            .then(|| issues.clone());

        let coach = issues
            .first()
            .filter(|top| self.coach.offer(top, now_ms))
            .cloned();

        if let Some(top) = &coach {
            tracing::debug!("Coach hint -> {} at {}ms", top.key, now_ms);
        }

        AdviceUpdate {
            issues,
            client,
            coach,
        }
    }

    /// Let the next top issue through immediately
    pub fn release_coach(&mut self) {
        self.coach.clear();
    }

    pub fn reset(&mut self) {
        self.client.reset();
        self.coach.clear();
    }
}

impl Default for AdviceEngine {
    fn default() -> Self {
        Self::new(&PipelineConfig::default())
    }
}
