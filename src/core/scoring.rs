//! Confidence score and feedback for one frame.
//!
//! The score is recomputed from a baseline every frame; nothing carries over
//! between frames except through the smoothed signals and tracker clocks.

use crate::core::tracker::{EyeContact, PostureState, TrackerState};
use serde::{Deserialize, Serialize};

pub const BASELINE_SCORE: i32 = 50;
pub const GOOD_EYE_CONTACT_BONUS: i32 = 20;
pub const LOOK_AWAY_PENALTY: i32 = 15;
pub const GOOD_POSTURE_BONUS: i32 = 10;
pub const SLOUCH_PENALTY: i32 = 10;

pub const MSG_NOT_IN_FRAME: &str = "Not in camera frame";
pub const MSG_GOOD_EYE_CONTACT: &str = "Good eye contact";
pub const MSG_MODERATE_EYE_CONTACT: &str = "Moderate eye contact";
pub const MSG_LOOKING_AWAY: &str = "Looking away";
pub const MSG_LOOK_AT_CAMERA: &str = "Please look at the camera";
pub const MSG_GOOD_POSTURE: &str = "Good posture";
pub const MSG_SLOUCHING: &str = "Slouching detected - sit upright";
pub const MSG_NERVOUS: &str = "Appears nervous - slow down and breathe";

/// Three-tier banding of the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallRating {
    /// 70 and above
    Positive,
    /// 50 to 69
    Neutral,
    /// Below 50
    Negative,
}

impl OverallRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            70..=u8::MAX => OverallRating::Positive,
            50..=69 => OverallRating::Neutral,
            _ => OverallRating::Negative,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            OverallRating::Positive => "Excellent! Keep it up",
            OverallRating::Neutral => "Good, minor improvements needed",
            OverallRating::Negative => "Please improve your presence and engagement",
        }
    }
}

/// Score, label and feedback for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub confidence_score: u8,
    pub rating: OverallRating,
    pub feedback: Vec<String>,
}

/// Confidence score in `0..=100` for the frame's classifications.
pub fn confidence_score(state: &TrackerState) -> u8 {
    if state.absence_alarm {
        return 0;
    }

    let mut score = BASELINE_SCORE;

    match state.eye_contact {
        EyeContact::Good => score += GOOD_EYE_CONTACT_BONUS,
        EyeContact::Away if state.look_away_alarm => score -= LOOK_AWAY_PENALTY,
        _ => {}
    }

    match state.posture {
        PostureState::Good => score += GOOD_POSTURE_BONUS,
        PostureState::Slouching => score -= SLOUCH_PENALTY,
    }

    score.clamp(0, 100) as u8
}

/// One feedback line per active condition.
///
/// While the subject is missing from the frame only the presence line is
/// reported.
pub fn feedback_lines(state: &TrackerState, nervous: bool) -> Vec<String> {
    if state.absence_alarm {
        return vec![MSG_NOT_IN_FRAME.to_string()];
    }

    let mut lines = Vec::new();

    match state.eye_contact {
        EyeContact::Good => lines.push(MSG_GOOD_EYE_CONTACT),
        EyeContact::Moderate => lines.push(MSG_MODERATE_EYE_CONTACT),
        EyeContact::Away if state.look_away_alarm => lines.push(MSG_LOOK_AT_CAMERA),
        EyeContact::Away => lines.push(MSG_LOOKING_AWAY),
        EyeContact::Unknown => {}
    }

    lines.push(match state.posture {
        PostureState::Good => MSG_GOOD_POSTURE,
        PostureState::Slouching => MSG_SLOUCHING,
    });

    if nervous && state.eye_contact != EyeContact::Unknown {
        lines.push(MSG_NERVOUS);
    }

    lines.into_iter().map(str::to_string).collect()
}

/// Combine the score, its rating and the feedback lines.
pub fn assess(state: &TrackerState, nervous: bool) -> Assessment {
    let confidence_score = confidence_score(state);
    Assessment {
        confidence_score,
        rating: OverallRating::from_score(confidence_score),
        feedback: feedback_lines(state, nervous),
    }
}
