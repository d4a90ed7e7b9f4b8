/// Bottom-dead-center detection
///
/// Only the knee angle at the bottom of the pedal stroke says anything about
/// saddle height. The detector follows the ankle's vertical position over a
/// short rolling window and latches the knee angle at the turning point
/// where the ankle stops descending.

use std::collections::VecDeque;

use crate::config::PipelineConfig;

/// Knee angle captured at a BDC event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BdcLatch {
    pub knee: f64,
    pub at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct BdcDetector {
    /// Recent ankle Y samples (normalized, downward)
    window: VecDeque<f64>,
    capacity: usize,
    epsilon: f64,
    max_age_ms: u64,
    previous_y: Option<f64>,
    previous_dy: Option<f64>,
    latch: Option<BdcLatch>,
}

impl BdcDetector {
    pub fn new(capacity: usize, epsilon: f64, max_age_ms: u64) -> Self {
        let capacity = capacity.max(2);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            epsilon,
            max_age_ms,
            previous_y: None,
            previous_dy: None,
            latch: None,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.bdc_window, config.bdc_epsilon, config.bdc_max_age_ms)
    }

    fn window_max(&self) -> Option<f64> {
        self.window.iter().copied().reduce(f64::max)
    }

    /// Feed one frame; returns true when a BDC event latched the knee angle
    ///
    /// Frames without an ankle position are skipped entirely. An event needs
    /// the ankle within `epsilon` of the window's lowest point and a
    /// descending-to-not-descending velocity flip.
    pub fn update(&mut self, ankle_y: Option<f64>, knee: Option<f64>, now_ms: u64) -> bool {
        let Some(y) = ankle_y.filter(|y| y.is_finite()) else {
            return false;
        };

        self.window.push_back(y);
        while self.window.len() > self.capacity {
            self.window.pop_front();
        }

        let mut fired = false;
        if let Some(previous_y) = self.previous_y {
            let dy = y - previous_y;
            let near_bottom = self.window_max().map_or(false, |max| max - y <= self.epsilon);
            let turned = self.previous_dy.map_or(false, |prev| prev > 0.0 && dy <= 0.0);

            if near_bottom && turned {
                if let Some(knee) = knee {
                    tracing::debug!("BDC at {}ms, knee {:.1}°", now_ms, knee);
                    self.latch = Some(BdcLatch { knee, at_ms: now_ms });
                    fired = true;
                }
            }
            self.previous_dy = Some(dy);
        }
        self.previous_y = Some(y);

        fired
    }

    /// Most recent latch, regardless of age
    pub fn latch(&self) -> Option<BdcLatch> {
        self.latch
    }

    pub fn age_ms(&self, now_ms: u64) -> Option<u64> {
        self.latch.map(|latch| now_ms.saturating_sub(latch.at_ms))
    }

    /// Latched knee angle if it is still young enough to advise on
    pub fn fresh_knee(&self, now_ms: u64) -> Option<f64> {
        match (self.latch, self.age_ms(now_ms)) {
            (Some(latch), Some(age)) if age <= self.max_age_ms => Some(latch.knee),
            _ => None,
        }
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.previous_y = None;
        self.previous_dy = None;
        self.latch = None;
    }
}

impl Default for BdcDetector {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}
