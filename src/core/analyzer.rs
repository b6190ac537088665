//! Per-session frame analysis.
//!
//! [`FrameAnalyzer`] owns everything that carries over between frames: the
//! smoothing windows, the tracker clocks, the blink history and the summary
//! schedule. Create one per monitoring session and feed it frames in
//! non-decreasing timestamp order. Instances are never shared between
//! sessions; a host serving several streams keeps one analyzer per stream.

use crate::config::AnalyzerConfig;
use crate::core::geometry::{eye_openness, head_pose_with_gain, torso_tilt};
use crate::core::metrics::{FrameMetrics, HeadPoseMetrics, PostureMetrics};
use crate::core::scoring::assess;
use crate::core::smoothing::SignalWindows;
use crate::core::summary::{SessionSummary, SummaryBuilder, SummaryContext};
use crate::core::tracker::{
    BehaviorEvent, BlinkTracker, EventTracker, EyeContact, PostureState, TrackerInput,
};
use crate::decode::{decode_frame, DecodeError};
use crate::landmarks::{Detection, LandmarkProvider};
use chrono::Utc;
use image::RgbImage;
use uuid::Uuid;

/// Current wall-clock time in seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// Session-scoped analysis facade.
pub struct FrameAnalyzer<P: LandmarkProvider> {
    provider: P,
    config: AnalyzerConfig,
    windows: SignalWindows,
    tracker: EventTracker,
    blinks: BlinkTracker,
    summaries: SummaryBuilder,
    completed_summaries: Vec<SessionSummary>,
    frames_analyzed: u64,
    last_eye_contact: EyeContact,
    session_start: f64,
}

impl<P: LandmarkProvider> FrameAnalyzer<P> {
    /// Start a session now.
    pub fn new(provider: P, config: AnalyzerConfig) -> Self {
        Self::starting_at(provider, config, now_secs())
    }

    /// Start a session at an explicit time, for replays and tests.
    pub fn starting_at(provider: P, config: AnalyzerConfig, session_start: f64) -> Self {
        Self {
            provider,
            windows: SignalWindows::new(config.window_capacity),
            tracker: EventTracker::new(config.clone(), session_start),
            blinks: BlinkTracker::new(&config),
            summaries: SummaryBuilder::new(session_start, config.summary_interval),
            completed_summaries: Vec::new(),
            frames_analyzed: 0,
            last_eye_contact: EyeContact::Unknown,
            session_start,
            config,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.summaries.session_id()
    }

    pub fn session_start(&self) -> f64 {
        self.session_start
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn frames_analyzed(&self) -> u64 {
        self.frames_analyzed
    }

    /// Run landmark detection on a frame and analyse the result.
    pub fn analyze(&mut self, image: &RgbImage, timestamp: f64) -> FrameMetrics {
        let detection = self.provider.detect(image);
        self.analyze_detection(&detection, image.width(), image.height(), timestamp)
    }

    /// Analyse landmarks that were already detected for a frame of the given
    /// size.
    pub fn analyze_detection(
        &mut self,
        detection: &Detection,
        frame_w: u32,
        frame_h: u32,
        now: f64,
    ) -> FrameMetrics {
        let face_detected = detection.has_face();

        if let Some(face) = &detection.face {
            if let Some(pose) = head_pose_with_gain(face, frame_w, frame_h, self.config.pose_gain)
            {
                self.windows.yaw.push(pose.yaw);
                self.windows.pitch.push(pose.pitch);
            }
            self.blinks
                .observe(eye_openness(face, frame_w, frame_h), now);
        }
        if let Some(tilt) = detection
            .body
            .as_ref()
            .and_then(|body| torso_tilt(body, frame_w, frame_h))
        {
            self.windows.slouch.push(tilt);
        }
        self.windows.presence.push_flag(face_detected);

        let gaze = self.windows.gaze();
        let slouch_deg = self.windows.slouch_deg();
        let state = self.tracker.update(TrackerInput {
            face_detected,
            gaze,
            slouch_deg,
            now,
        });

        let nervous = face_detected && self.blinks.is_nervous(now);
        let assessment = assess(&state, nervous);

        // Without a face this frame there is no pose to report
        let head_pose = match gaze {
            Some((yaw, pitch)) if face_detected => HeadPoseMetrics { yaw, pitch },
            _ => HeadPoseMetrics::default(),
        };
        let metrics = FrameMetrics {
            presence: face_detected,
            eye_contact: state.eye_contact,
            confidence_score: assessment.confidence_score,
            posture: PostureMetrics {
                slouch_angle_deg: slouch_deg,
                is_good: state.posture == PostureState::Good,
            },
            head_pose,
            feedback: assessment.feedback,
            overall: assessment.rating.message().to_string(),
            timestamp: now,
        };

        self.frames_analyzed += 1;
        self.last_eye_contact = state.eye_contact;

        let context = self.summary_context(now);
        if let Some(summary) = self.summaries.poll(&self.windows, &context, now) {
            tracing::info!(session = %summary.session_id, "summary: {}", summary.log_line());
            self.completed_summaries.push(summary);
        }

        tracing::debug!(
            t = now,
            presence = face_detected,
            eye_contact = %metrics.eye_contact,
            score = metrics.confidence_score,
            slouch = slouch_deg,
            "frame analyzed"
        );

        metrics
    }

    /// Decode an encoded still image and analyse it at the current time.
    pub fn process_encoded_image(&mut self, data: &[u8]) -> Result<FrameMetrics, DecodeError> {
        self.process_encoded_image_at(data, now_secs())
    }

    /// Decode an encoded still image and analyse it at `timestamp`.
    ///
    /// A payload that fails to decode leaves the session untouched.
    pub fn process_encoded_image_at(
        &mut self,
        data: &[u8],
        timestamp: f64,
    ) -> Result<FrameMetrics, DecodeError> {
        let image = decode_frame(data).map_err(|e| {
            tracing::warn!(bytes = data.len(), "dropping undecodable frame: {}", e);
            e
        })?;
        Ok(self.analyze(&image, timestamp))
    }

    /// Get and remove behaviour events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<BehaviorEvent> {
        self.tracker.take_events()
    }

    /// Get and remove summaries completed since the last call.
    pub fn take_summaries(&mut self) -> Vec<SessionSummary> {
        std::mem::take(&mut self.completed_summaries)
    }

    /// Build a summary of the current windows without waiting for the
    /// schedule.
    pub fn summary(&self, now: f64) -> SessionSummary {
        self.summaries
            .build(&self.windows, &self.summary_context(now), now)
    }

    fn summary_context(&self, now: f64) -> SummaryContext {
        SummaryContext {
            eye_contact: self.last_eye_contact,
            blink_rate: self.blinks.rate(now),
            nervous: self.last_eye_contact != EyeContact::Unknown && self.blinks.is_nervous(now),
            frames_analyzed: self.frames_analyzed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scoring::MSG_NOT_IN_FRAME;
    use crate::landmarks::{
        BodyLandmarkSet, FaceLandmark, FaceLandmarkSet, LandmarkPoint, NoopProvider,
        StaticProvider,
    };
    use std::time::Duration;

    fn frontal_face() -> FaceLandmarkSet {
        FaceLandmarkSet::default()
            .with(FaceLandmark::NoseTip, LandmarkPoint::new(0.5, 0.5))
            .with(FaceLandmark::LeftEyeOuter, LandmarkPoint::new(0.4, 0.4))
            .with(FaceLandmark::RightEyeOuter, LandmarkPoint::new(0.6, 0.4))
            .with(FaceLandmark::Chin, LandmarkPoint::new(0.5, 0.6))
    }

    fn upright_body() -> BodyLandmarkSet {
        BodyLandmarkSet::new(
            LandmarkPoint::new(0.4, 0.5),
            LandmarkPoint::new(0.6, 0.5),
            LandmarkPoint::new(0.4, 0.9),
            LandmarkPoint::new(0.6, 0.9),
        )
    }

    fn attentive() -> Detection {
        Detection {
            face: Some(frontal_face()),
            body: Some(upright_body()),
        }
    }

    #[test]
    fn test_attentive_subject_scores_high() {
        let mut analyzer =
            FrameAnalyzer::starting_at(NoopProvider::new(), AnalyzerConfig::default(), 0.0);

        let mut metrics = None;
        for i in 0..10 {
            metrics = Some(analyzer.analyze_detection(&attentive(), 640, 480, i as f64 / 10.0));
        }
        let metrics = metrics.unwrap();

        assert!(metrics.presence);
        assert_eq!(metrics.eye_contact, EyeContact::Good);
        assert_eq!(metrics.confidence_score, 80);
        assert!(metrics.posture.is_good);
        assert_eq!(metrics.overall, "Excellent! Keep it up");
        assert_eq!(analyzer.frames_analyzed(), 10);
    }

    #[test]
    fn test_analyze_uses_provider() {
        let provider = StaticProvider::new(attentive());
        let mut analyzer = FrameAnalyzer::starting_at(provider, AnalyzerConfig::default(), 0.0);
        let image = RgbImage::new(64, 48);

        let metrics = analyzer.analyze(&image, 0.1);
        assert!(metrics.presence);
        assert_eq!(analyzer.provider().calls(), 1);
    }

    #[test]
    fn test_posture_kept_while_body_hidden() {
        let mut analyzer =
            FrameAnalyzer::starting_at(NoopProvider::new(), AnalyzerConfig::default(), 0.0);
        let leaning = Detection {
            face: Some(frontal_face()),
            body: Some(BodyLandmarkSet::new(
                LandmarkPoint::new(0.4, 0.5),
                LandmarkPoint::new(0.6, 0.5),
                LandmarkPoint::new(0.7, 0.9),
                LandmarkPoint::new(0.9, 0.9),
            )),
        };
        let first = analyzer.analyze_detection(&leaning, 100, 100, 0.0);
        assert!(!first.posture.is_good);

        let face_only = Detection {
            face: Some(frontal_face()),
            body: None,
        };
        let second = analyzer.analyze_detection(&face_only, 100, 100, 0.1);
        assert_eq!(second.posture, first.posture);
    }

    #[test]
    fn test_head_pose_resets_without_face() {
        let mut analyzer =
            FrameAnalyzer::starting_at(NoopProvider::new(), AnalyzerConfig::default(), 0.0);
        let turned = Detection {
            face: Some(
                frontal_face().with(FaceLandmark::NoseTip, LandmarkPoint::new(0.66, 0.5)),
            ),
            body: None,
        };
        for i in 0..5 {
            let metrics = analyzer.analyze_detection(&turned, 100, 100, i as f64);
            assert!(metrics.head_pose.yaw > 30.0);
        }

        let metrics = analyzer.analyze_detection(&Detection::empty(), 100, 100, 5.0);
        assert!(!metrics.presence);
        assert_eq!(metrics.eye_contact, EyeContact::Unknown);
        assert_eq!(metrics.head_pose, HeadPoseMetrics::default());
    }

    #[test]
    fn test_absence_zeroes_score() {
        let mut analyzer =
            FrameAnalyzer::starting_at(NoopProvider::new(), AnalyzerConfig::default(), 0.0);
        let metrics = analyzer.analyze_detection(&Detection::empty(), 640, 480, 3.5);

        assert!(!metrics.presence);
        assert_eq!(metrics.eye_contact, EyeContact::Unknown);
        assert_eq!(metrics.confidence_score, 0);
        assert_eq!(metrics.feedback, vec![MSG_NOT_IN_FRAME.to_string()]);
        assert_eq!(
            analyzer.take_events(),
            vec![BehaviorEvent::LeftFrame { at: 3.5 }]
        );
        assert!(analyzer.take_events().is_empty());
    }

    #[test]
    fn test_summaries_are_queued() {
        let config = AnalyzerConfig {
            summary_interval: Duration::from_secs(1),
            ..AnalyzerConfig::default()
        };
        let mut analyzer = FrameAnalyzer::starting_at(NoopProvider::new(), config, 0.0);
        for i in 0..=25 {
            analyzer.analyze_detection(&attentive(), 640, 480, i as f64 / 10.0);
        }

        let summaries = analyzer.take_summaries();
        assert_eq!(summaries.len(), 2);
        assert!(summaries
            .iter()
            .all(|s| s.session_id == analyzer.session_id()));
        assert!((summaries[0].presence_pct - 100.0).abs() < 1e-9);
        assert!(analyzer.take_summaries().is_empty());

        let on_demand = analyzer.summary(2.5);
        assert_eq!(on_demand.frames_analyzed, 26);
        assert_eq!(on_demand.eye_contact, EyeContact::Good);
    }

    #[test]
    fn test_decode_failure_leaves_state_alone() {
        let mut analyzer =
            FrameAnalyzer::starting_at(NoopProvider::new(), AnalyzerConfig::default(), 0.0);
        assert!(analyzer.process_encoded_image_at(b"", 1.0).is_err());
        assert!(analyzer.process_encoded_image_at(b"%%%", 1.0).is_err());
        assert_eq!(analyzer.frames_analyzed(), 0);
        assert!(analyzer.take_events().is_empty());
    }
}
