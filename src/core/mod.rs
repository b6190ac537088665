//! Core analysis pipeline.
//!
//! This module contains:
//! - Geometry estimators turning landmarks into head pose and torso tilt
//! - Rolling windows that smooth those signals
//! - The tracker that classifies presence, eye contact and posture
//! - Scoring, per-frame metrics and periodic session summaries
//! - The [`FrameAnalyzer`] facade tying them together per session

pub mod analyzer;
pub mod geometry;
pub mod metrics;
pub mod scoring;
pub mod smoothing;
pub mod summary;
pub mod tracker;

pub use analyzer::{now_secs, FrameAnalyzer};
pub use geometry::{eye_openness, head_pose, head_pose_with_gain, torso_tilt, PoseEstimate};
pub use metrics::{FrameMetrics, HeadPoseMetrics, PostureMetrics};
pub use scoring::{assess, confidence_score, feedback_lines, Assessment, OverallRating};
pub use smoothing::{SignalWindows, SmoothingWindow};
pub use summary::{SessionSummary, SummaryBuilder};
pub use tracker::{
    BehaviorEvent, BlinkTracker, EventTracker, EyeContact, PostureState, SessionClockState,
    TrackerState,
};
