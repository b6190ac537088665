//! Presence, eye-contact and posture state tracking.
//!
//! The tracker turns smoothed signals into discrete states and keeps the two
//! session clocks (last time a face was seen, last time eye contact was good).
//! Alarms only fire once a condition has persisted past its grace period, so
//! a blink or a quick glance never reaches the user.
//!
//! Besides the per-frame state, the tracker records a [`BehaviorEvent`] each
//! time an alarm or the posture class changes. Events are drained with
//! [`EventTracker::take_events`].

use crate::config::AnalyzerConfig;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Upper bound on remembered blink timestamps.
const MAX_BLINK_HISTORY: usize = 50;

/// Blink counting span used when the configured one is not positive.
const DEFAULT_BLINK_WINDOW_SECS: f64 = 5.0;

/// Eye-contact classification for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EyeContact {
    Good,
    Moderate,
    Away,
    Unknown,
}

impl EyeContact {
    pub fn as_str(self) -> &'static str {
        match self {
            EyeContact::Good => "good",
            EyeContact::Moderate => "moderate",
            EyeContact::Away => "away",
            EyeContact::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for EyeContact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Posture classification for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostureState {
    Good,
    Slouching,
}

/// Classify gaze from smoothed yaw and pitch.
pub fn classify_eye_contact(yaw: f64, pitch: f64, config: &AnalyzerConfig) -> EyeContact {
    if yaw.abs() < config.good_gaze_deg && pitch.abs() < config.good_gaze_deg {
        EyeContact::Good
    } else if yaw.abs() > config.away_gaze_deg || pitch.abs() > config.away_gaze_deg {
        EyeContact::Away
    } else {
        EyeContact::Moderate
    }
}

/// Classify posture from the smoothed slouch angle.
pub fn classify_posture(slouch_deg: f64, config: &AnalyzerConfig) -> PostureState {
    if slouch_deg <= config.slouch_threshold_deg {
        PostureState::Good
    } else {
        PostureState::Slouching
    }
}

/// Session clocks. Both only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionClockState {
    pub last_seen_timestamp: f64,
    pub last_good_eye_contact_timestamp: f64,
}

impl SessionClockState {
    /// Both clocks start at the session start time.
    pub fn new(session_start: f64) -> Self {
        Self {
            last_seen_timestamp: session_start,
            last_good_eye_contact_timestamp: session_start,
        }
    }

    pub fn mark_seen(&mut self, now: f64) {
        self.last_seen_timestamp = self.last_seen_timestamp.max(now);
    }

    pub fn mark_good_eye_contact(&mut self, now: f64) {
        self.last_good_eye_contact_timestamp = self.last_good_eye_contact_timestamp.max(now);
    }

    pub fn absent_for(&self, now: f64) -> f64 {
        now - self.last_seen_timestamp
    }

    pub fn away_for(&self, now: f64) -> f64 {
        now - self.last_good_eye_contact_timestamp
    }
}

/// A state change worth telling someone about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BehaviorEvent {
    /// Face missing for longer than the absence grace period
    LeftFrame { at: f64 },
    /// Face back after an absence alarm
    ReturnedToFrame { at: f64 },
    /// Looking away for longer than the look-away grace period
    LookedAway { at: f64 },
    /// Good eye contact after a look-away alarm
    EyeContactRestored { at: f64 },
    StartedSlouching { at: f64, slouch_angle_deg: f64 },
    PostureCorrected { at: f64, slouch_angle_deg: f64 },
}

impl BehaviorEvent {
    pub fn timestamp(&self) -> f64 {
        match self {
            BehaviorEvent::LeftFrame { at }
            | BehaviorEvent::ReturnedToFrame { at }
            | BehaviorEvent::LookedAway { at }
            | BehaviorEvent::EyeContactRestored { at }
            | BehaviorEvent::StartedSlouching { at, .. }
            | BehaviorEvent::PostureCorrected { at, .. } => *at,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BehaviorEvent::LeftFrame { .. } => "left camera",
            BehaviorEvent::ReturnedToFrame { .. } => "returned to camera",
            BehaviorEvent::LookedAway { .. } => "looked away",
            BehaviorEvent::EyeContactRestored { .. } => "eye contact restored",
            BehaviorEvent::StartedSlouching { .. } => "slouching",
            BehaviorEvent::PostureCorrected { .. } => "posture corrected",
        }
    }
}

/// Smoothed signals for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerInput {
    /// Whether a face was detected this frame
    pub face_detected: bool,
    /// Smoothed (yaw, pitch), if any head pose has been observed yet
    pub gaze: Option<(f64, f64)>,
    /// Smoothed slouch angle in degrees
    pub slouch_deg: f64,
    pub now: f64,
}

/// Classification result for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerState {
    pub eye_contact: EyeContact,
    pub posture: PostureState,
    /// Face missing past the absence grace period
    pub absence_alarm: bool,
    /// Looking away past the look-away grace period
    pub look_away_alarm: bool,
}

/// Threshold and hysteresis logic for one session.
#[derive(Debug, Clone)]
pub struct EventTracker {
    config: AnalyzerConfig,
    clocks: SessionClockState,
    absence_reported: bool,
    look_away_reported: bool,
    last_posture: PostureState,
    pending: Vec<BehaviorEvent>,
}

impl EventTracker {
    pub fn new(config: AnalyzerConfig, session_start: f64) -> Self {
        Self {
            config,
            clocks: SessionClockState::new(session_start),
            absence_reported: false,
            look_away_reported: false,
            last_posture: PostureState::Good,
            pending: Vec::new(),
        }
    }

    pub fn clocks(&self) -> &SessionClockState {
        &self.clocks
    }

    /// Classify one frame and record any state changes.
    pub fn update(&mut self, input: TrackerInput) -> TrackerState {
        let now = input.now;

        if input.face_detected {
            self.clocks.mark_seen(now);
        }

        let eye_contact = match (input.face_detected, input.gaze) {
            (true, Some((yaw, pitch))) => classify_eye_contact(yaw, pitch, &self.config),
            _ => EyeContact::Unknown,
        };
        if eye_contact == EyeContact::Good {
            self.clocks.mark_good_eye_contact(now);
        }

        let absence_alarm = !input.face_detected
            && self.clocks.absent_for(now) >= self.config.absence_grace_secs;
        let look_away_alarm = eye_contact == EyeContact::Away
            && self.clocks.away_for(now) >= self.config.look_away_grace_secs;

        let posture = classify_posture(input.slouch_deg, &self.config);

        self.record_presence(absence_alarm, input.face_detected, now);
        self.record_gaze(look_away_alarm, eye_contact, now);
        self.record_posture(posture, input.slouch_deg, now);

        TrackerState {
            eye_contact,
            posture,
            absence_alarm,
            look_away_alarm,
        }
    }

    /// Get and remove recorded events.
    pub fn take_events(&mut self) -> Vec<BehaviorEvent> {
        std::mem::take(&mut self.pending)
    }

    fn record_presence(&mut self, absence_alarm: bool, face_detected: bool, now: f64) {
        if absence_alarm && !self.absence_reported {
            self.absence_reported = true;
            self.push(BehaviorEvent::LeftFrame { at: now });
        } else if face_detected && self.absence_reported {
            self.absence_reported = false;
            self.push(BehaviorEvent::ReturnedToFrame { at: now });
        }
    }

    fn record_gaze(&mut self, look_away_alarm: bool, eye_contact: EyeContact, now: f64) {
        if look_away_alarm && !self.look_away_reported {
            self.look_away_reported = true;
            self.push(BehaviorEvent::LookedAway { at: now });
        } else if eye_contact == EyeContact::Good && self.look_away_reported {
            self.look_away_reported = false;
            self.push(BehaviorEvent::EyeContactRestored { at: now });
        }
    }

    fn record_posture(&mut self, posture: PostureState, slouch_angle_deg: f64, now: f64) {
        if posture == self.last_posture {
            return;
        }
        self.last_posture = posture;
        self.push(match posture {
            PostureState::Slouching => BehaviorEvent::StartedSlouching {
                at: now,
                slouch_angle_deg,
            },
            PostureState::Good => BehaviorEvent::PostureCorrected {
                at: now,
                slouch_angle_deg,
            },
        });
    }

    fn push(&mut self, event: BehaviorEvent) {
        tracing::info!(at = event.timestamp(), "behavior event: {}", event.description());
        self.pending.push(event);
    }
}

/// Counts blinks from eye openness to flag rapid blinking.
#[derive(Debug, Clone)]
pub struct BlinkTracker {
    blinks: VecDeque<f64>,
    eyes_closed: bool,
    ratio_threshold: f64,
    window_secs: f64,
    nervous_rate: f64,
}

impl BlinkTracker {
    pub fn new(config: &AnalyzerConfig) -> Self {
        let window_secs = if config.blink_window_secs.is_finite() && config.blink_window_secs > 0.0
        {
            config.blink_window_secs
        } else {
            DEFAULT_BLINK_WINDOW_SECS
        };
        Self {
            blinks: VecDeque::with_capacity(MAX_BLINK_HISTORY),
            eyes_closed: false,
            ratio_threshold: config.blink_ratio_threshold,
            window_secs,
            nervous_rate: config.nervous_blink_rate,
        }
    }

    /// Feed the eye openness for a frame (`None` when the eyes were not seen).
    ///
    /// A blink is counted when the eyes go from open to closed.
    pub fn observe(&mut self, openness: Option<f64>, now: f64) {
        let Some(ratio) = openness else {
            return;
        };

        let closed = ratio < self.ratio_threshold;
        if closed && !self.eyes_closed {
            self.blinks.push_back(now);
            if self.blinks.len() > MAX_BLINK_HISTORY {
                self.blinks.pop_front();
            }
        }
        self.eyes_closed = closed;
        self.prune(now);
    }

    /// Blinks per second over the trailing window.
    pub fn rate(&self, now: f64) -> f64 {
        let recent = self
            .blinks
            .iter()
            .filter(|&&t| now - t <= self.window_secs)
            .count();
        recent as f64 / self.window_secs
    }

    pub fn is_nervous(&self, now: f64) -> bool {
        self.rate(now) > self.nervous_rate
    }

    fn prune(&mut self, now: f64) {
        while let Some(&front) = self.blinks.front() {
            if now - front > self.window_secs {
                self.blinks.pop_front();
            } else {
                break;
            }
        }
    }
}
