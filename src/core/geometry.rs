//! Pose estimation from landmark sets.
//!
//! All estimators are pure functions. They work in pixel space so that the
//! aspect ratio of the frame is respected, and return `None` when a landmark
//! they need is missing.
//!
//! Yaw and pitch are a 2-D proxy: the offset of the nose tip from the centre of
//! the face, normalized by face width/height and multiplied by an empirical
//! gain. They are not calibrated head angles.

use crate::landmarks::{BodyLandmark, BodyLandmarkSet, FaceLandmark, FaceLandmarkSet};
use serde::{Deserialize, Serialize};
use std::ops::Sub;

/// Added to normalizing lengths before dividing.
pub const EPSILON: f64 = 1e-8;

/// Default gain turning the normalized nose offset into pseudo-degrees.
pub const DEFAULT_POSE_GAIN: f64 = 50.0;

/// Head orientation estimate in degrees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    /// Positive when the nose is offset towards viewer-right
    pub yaw: f64,
    /// Positive when the nose is below the face centre (looking down)
    pub pitch: f64,
    /// Angle of the eye line from horizontal
    pub roll: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

impl Vec2 {
    fn midpoint(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: (self.x + other.x) / 2.0,
            y: (self.y + other.y) / 2.0,
        }
    }

    fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

fn face_point(face: &FaceLandmarkSet, landmark: FaceLandmark, w: f64, h: f64) -> Option<Vec2> {
    face.get(landmark).map(|p| {
        let (x, y) = p.to_pixels(w, h);
        Vec2 { x, y }
    })
}

fn body_point(body: &BodyLandmarkSet, landmark: BodyLandmark, w: f64, h: f64) -> Option<Vec2> {
    body.get(landmark).map(|p| {
        let (x, y) = p.to_pixels(w, h);
        Vec2 { x, y }
    })
}

/// Estimate head pose with the default gain.
pub fn head_pose(face: &FaceLandmarkSet, frame_w: u32, frame_h: u32) -> Option<PoseEstimate> {
    head_pose_with_gain(face, frame_w, frame_h, DEFAULT_POSE_GAIN)
}

/// Estimate head pose from nose tip, outer eye corners and chin.
pub fn head_pose_with_gain(
    face: &FaceLandmarkSet,
    frame_w: u32,
    frame_h: u32,
    gain: f64,
) -> Option<PoseEstimate> {
    let (w, h) = (f64::from(frame_w), f64::from(frame_h));
    let nose = face_point(face, FaceLandmark::NoseTip, w, h)?;
    let left_eye = face_point(face, FaceLandmark::LeftEyeOuter, w, h)?;
    let right_eye = face_point(face, FaceLandmark::RightEyeOuter, w, h)?;
    let chin = face_point(face, FaceLandmark::Chin, w, h)?;

    let eye_center = left_eye.midpoint(right_eye);
    let face_center = eye_center.midpoint(chin);
    let direction = nose - face_center;

    let face_width = (right_eye - left_eye).norm() + EPSILON;
    let face_height = (chin - eye_center).norm() + EPSILON;

    let eyes = right_eye - left_eye;

    Some(PoseEstimate {
        yaw: direction.x / face_width * gain,
        pitch: direction.y / face_height * gain,
        roll: eyes.y.atan2(eyes.x).to_degrees(),
    })
}

/// Angle in degrees between the shoulder-to-hip vector and vertical.
///
/// Always within `[0, 180]`; the direction of the lean is not reported.
pub fn torso_tilt(body: &BodyLandmarkSet, frame_w: u32, frame_h: u32) -> Option<f64> {
    let (w, h) = (f64::from(frame_w), f64::from(frame_h));
    let left_shoulder = body_point(body, BodyLandmark::LeftShoulder, w, h)?;
    let right_shoulder = body_point(body, BodyLandmark::RightShoulder, w, h)?;
    let left_hip = body_point(body, BodyLandmark::LeftHip, w, h)?;
    let right_hip = body_point(body, BodyLandmark::RightHip, w, h)?;

    let shoulder_mid = left_shoulder.midpoint(right_shoulder);
    let hip_mid = left_hip.midpoint(right_hip);
    let torso = hip_mid - shoulder_mid;

    // Dot product with the unit vertical (0, 1) is just the y component.
    let cos = (torso.y / torso.norm().max(EPSILON)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Mean eyelid gap relative to face height.
///
/// Small values mean closed eyes. Needs both eyelid pairs plus face top and
/// bottom.
pub fn eye_openness(face: &FaceLandmarkSet, frame_w: u32, frame_h: u32) -> Option<f64> {
    let (w, h) = (f64::from(frame_w), f64::from(frame_h));
    let left_up = face_point(face, FaceLandmark::LeftEyelidUpper, w, h)?;
    let left_down = face_point(face, FaceLandmark::LeftEyelidLower, w, h)?;
    let right_up = face_point(face, FaceLandmark::RightEyelidUpper, w, h)?;
    let right_down = face_point(face, FaceLandmark::RightEyelidLower, w, h)?;
    let top = face_point(face, FaceLandmark::FaceTop, w, h)?;
    let bottom = face_point(face, FaceLandmark::FaceBottom, w, h)?;

    let left_gap = (left_up - left_down).norm();
    let right_gap = (right_up - right_down).norm();
    let face_height = (top - bottom).norm().max(1.0);

    Some((left_gap + right_gap) / (2.0 * face_height + EPSILON))
}
