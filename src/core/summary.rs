//! Periodic session summaries.
//!
//! Every summary interval of frame time the analyzer condenses its smoothing
//! windows into a [`SessionSummary`]. Summaries are the only thing worth
//! persisting from a session; frames and landmarks are discarded.

use crate::core::smoothing::SignalWindows;
use crate::core::tracker::EyeContact;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Condensed view of the recent frames of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Analyzer instance this summary came from
    pub session_id: Uuid,
    /// Wall-clock time the summary was built
    pub recorded_at: DateTime<Utc>,
    /// Frame time of the summary in seconds
    pub timestamp: f64,
    /// Frames analysed since the session started
    pub frames_analyzed: u64,
    /// Share of recent frames with a face, in percent
    pub presence_pct: f64,
    /// Eye contact of the latest frame
    pub eye_contact: EyeContact,
    /// Blinks per second over the blink window
    pub blink_rate: f64,
    pub nervous: bool,
    pub avg_yaw: f64,
    pub avg_pitch: f64,
    pub avg_slouch_deg: f64,
}

impl SessionSummary {
    /// Single-line rendering for logs and terminals.
    pub fn log_line(&self) -> String {
        format!(
            "presence={:.1}% eye={} avg_yaw={:.1} avg_pitch={:.1} slouch={:.1}{}",
            self.presence_pct,
            self.eye_contact,
            self.avg_yaw,
            self.avg_pitch,
            self.avg_slouch_deg,
            if self.nervous { " (nervous)" } else { "" }
        )
    }
}

/// Latest per-frame values that go into a summary alongside the windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryContext {
    pub eye_contact: EyeContact,
    pub blink_rate: f64,
    pub nervous: bool,
    pub frames_analyzed: u64,
}

/// Decides when a summary is due and builds it.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    session_id: Uuid,
    interval_secs: f64,
    last_summary_at: f64,
}

impl SummaryBuilder {
    /// Create a builder with a fresh session ID. The first summary is due one
    /// interval after `session_start`.
    pub fn new(session_start: f64, interval: Duration) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            interval_secs: interval.as_secs_f64(),
            last_summary_at: session_start,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Whether the interval has elapsed since the previous summary.
    pub fn is_due(&self, now: f64) -> bool {
        self.interval_secs > 0.0 && now - self.last_summary_at >= self.interval_secs
    }

    /// Build a summary without affecting the schedule.
    pub fn build(
        &self,
        windows: &SignalWindows,
        context: &SummaryContext,
        now: f64,
    ) -> SessionSummary {
        SessionSummary {
            session_id: self.session_id,
            recorded_at: Utc::now(),
            timestamp: now,
            frames_analyzed: context.frames_analyzed,
            presence_pct: 100.0 * windows.presence.presence_fraction(),
            eye_contact: context.eye_contact,
            blink_rate: context.blink_rate,
            nervous: context.nervous,
            avg_yaw: windows.yaw.mean(0.0),
            avg_pitch: windows.pitch.mean(0.0),
            avg_slouch_deg: windows.slouch.mean(0.0),
        }
    }

    /// Build the summary if one is due and restart the interval.
    pub fn poll(
        &mut self,
        windows: &SignalWindows,
        context: &SummaryContext,
        now: f64,
    ) -> Option<SessionSummary> {
        if !self.is_due(now) {
            return None;
        }
        self.last_summary_at = now;
        Some(self.build(windows, context, now))
    }
}
