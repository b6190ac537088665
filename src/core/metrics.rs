//! The per-frame output record.
//!
//! Field names and types are the wire contract relied on by whatever relays
//! metrics to a client, so they are fixed here with serde attributes.

use crate::core::tracker::EyeContact;
use serde::{Deserialize, Serialize};

/// Posture part of the metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PostureMetrics {
    /// Smoothed torso tilt from vertical in degrees
    pub slouch_angle_deg: f64,
    pub is_good: bool,
}

/// Smoothed head orientation in pseudo-degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HeadPoseMetrics {
    pub yaw: f64,
    pub pitch: f64,
}

/// Everything derived from one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    /// Whether a face was detected in this frame
    pub presence: bool,
    pub eye_contact: EyeContact,
    /// Confidence score in `0..=100`
    pub confidence_score: u8,
    pub posture: PostureMetrics,
    pub head_pose: HeadPoseMetrics,
    /// One line per active condition, in display order
    pub feedback: Vec<String>,
    /// Overall qualitative label for the score
    pub overall: String,
    /// Frame time in seconds
    pub timestamp: f64,
}

impl FrameMetrics {
    /// The first `limit` feedback lines, for on-screen display.
    pub fn display_feedback(&self, limit: usize) -> &[String] {
        &self.feedback[..self.feedback.len().min(limit)]
    }

    /// Whether any feedback line starts with the given text.
    pub fn has_feedback(&self, prefix: &str) -> bool {
        self.feedback.iter().any(|line| line.starts_with(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrameMetrics {
        FrameMetrics {
            presence: true,
            eye_contact: EyeContact::Good,
            confidence_score: 80,
            posture: PostureMetrics {
                slouch_angle_deg: 4.5,
                is_good: true,
            },
            head_pose: HeadPoseMetrics {
                yaw: 1.0,
                pitch: -2.0,
            },
            feedback: vec![
                "Good eye contact".to_string(),
                "Good posture".to_string(),
                "Appears nervous".to_string(),
                "Extra".to_string(),
            ],
            overall: "Excellent! Keep it up".to_string(),
            timestamp: 12.5,
        }
    }

    #[test]
    fn test_display_feedback_caps_lines() {
        let metrics = sample();
        assert_eq!(metrics.display_feedback(3).len(), 3);
        assert_eq!(metrics.display_feedback(10).len(), 4);
        assert_eq!(metrics.feedback.len(), 4);
    }

    #[test]
    fn test_wire_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let object = value.as_object().unwrap();

        for field in [
            "presence",
            "eye_contact",
            "confidence_score",
            "posture",
            "head_pose",
            "feedback",
            "overall",
            "timestamp",
        ] {
            assert!(object.contains_key(field), "missing {field}");
        }
        assert_eq!(value["eye_contact"], "good");
        assert_eq!(value["posture"]["slouch_angle_deg"], 4.5);
        assert_eq!(value["posture"]["is_good"], true);
        assert_eq!(value["head_pose"]["pitch"], -2.0);
    }
}
