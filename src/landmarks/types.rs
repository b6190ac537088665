//! Landmark types produced by a detection backend.
//!
//! Points are normalized to the frame: `x` and `y` lie in `[0, 1]` relative to
//! frame width and height. Sets are produced fresh per frame and never mutated
//! by the analysis pipeline.

use serde::{Deserialize, Serialize};

/// A single landmark in normalized image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LandmarkPoint {
    /// Horizontal position relative to frame width
    pub x: f64,
    /// Vertical position relative to frame height (grows downwards)
    pub y: f64,
    /// Relative depth, when the backend provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl LandmarkPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn with_depth(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Convert to pixel space for a frame of the given size.
    pub fn to_pixels(&self, frame_w: f64, frame_h: f64) -> (f64, f64) {
        (self.x * frame_w, self.y * frame_h)
    }
}

/// The minimal set of face points the estimators need.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceLandmark {
    NoseTip,
    LeftEyeOuter,
    RightEyeOuter,
    Chin,
    LeftEyelidUpper,
    LeftEyelidLower,
    RightEyelidUpper,
    RightEyelidLower,
    FaceTop,
    FaceBottom,
}

impl FaceLandmark {
    /// All face landmarks in set order.
    pub const ALL: [FaceLandmark; 10] = [
        FaceLandmark::NoseTip,
        FaceLandmark::LeftEyeOuter,
        FaceLandmark::RightEyeOuter,
        FaceLandmark::Chin,
        FaceLandmark::LeftEyelidUpper,
        FaceLandmark::LeftEyelidLower,
        FaceLandmark::RightEyelidUpper,
        FaceLandmark::RightEyelidLower,
        FaceLandmark::FaceTop,
        FaceLandmark::FaceBottom,
    ];

    /// Index of this point in a 468-point face mesh.
    pub fn mesh_index(self) -> usize {
        match self {
            FaceLandmark::NoseTip => 1,
            FaceLandmark::LeftEyeOuter => 33,
            FaceLandmark::RightEyeOuter => 263,
            FaceLandmark::Chin => 199,
            FaceLandmark::LeftEyelidUpper => 159,
            FaceLandmark::LeftEyelidLower => 145,
            FaceLandmark::RightEyelidUpper => 386,
            FaceLandmark::RightEyelidLower => 374,
            FaceLandmark::FaceTop => 10,
            FaceLandmark::FaceBottom => 152,
        }
    }
}

/// Face landmarks for one frame. Any point may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceLandmarkSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nose_tip: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_eye_outer: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_eye_outer: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chin: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_eyelid_upper: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_eyelid_lower: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_eyelid_upper: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_eyelid_lower: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_top: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face_bottom: Option<LandmarkPoint>,
}

impl FaceLandmarkSet {
    /// Pick the named points out of a full face mesh.
    ///
    /// Points whose mesh index is out of range are left unset.
    pub fn from_mesh(mesh: &[LandmarkPoint]) -> Self {
        FaceLandmark::ALL
            .iter()
            .fold(Self::default(), |set, &landmark| {
                match mesh.get(landmark.mesh_index()) {
                    Some(&point) => set.with(landmark, point),
                    None => set,
                }
            })
    }

    /// Return a copy with one point set.
    pub fn with(mut self, landmark: FaceLandmark, point: LandmarkPoint) -> Self {
        *self.slot_mut(landmark) = Some(point);
        self
    }

    pub fn get(&self, landmark: FaceLandmark) -> Option<LandmarkPoint> {
        match landmark {
            FaceLandmark::NoseTip => self.nose_tip,
            FaceLandmark::LeftEyeOuter => self.left_eye_outer,
            FaceLandmark::RightEyeOuter => self.right_eye_outer,
            FaceLandmark::Chin => self.chin,
            FaceLandmark::LeftEyelidUpper => self.left_eyelid_upper,
            FaceLandmark::LeftEyelidLower => self.left_eyelid_lower,
            FaceLandmark::RightEyelidUpper => self.right_eyelid_upper,
            FaceLandmark::RightEyelidLower => self.right_eyelid_lower,
            FaceLandmark::FaceTop => self.face_top,
            FaceLandmark::FaceBottom => self.face_bottom,
        }
    }

    /// Present points in set order.
    pub fn iter(&self) -> impl Iterator<Item = (FaceLandmark, LandmarkPoint)> + '_ {
        FaceLandmark::ALL
            .iter()
            .filter_map(move |&landmark| self.get(landmark).map(|p| (landmark, p)))
    }

    /// Number of points that are present.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_mut(&mut self, landmark: FaceLandmark) -> &mut Option<LandmarkPoint> {
        match landmark {
            FaceLandmark::NoseTip => &mut self.nose_tip,
            FaceLandmark::LeftEyeOuter => &mut self.left_eye_outer,
            FaceLandmark::RightEyeOuter => &mut self.right_eye_outer,
            FaceLandmark::Chin => &mut self.chin,
            FaceLandmark::LeftEyelidUpper => &mut self.left_eyelid_upper,
            FaceLandmark::LeftEyelidLower => &mut self.left_eyelid_lower,
            FaceLandmark::RightEyelidUpper => &mut self.right_eyelid_upper,
            FaceLandmark::RightEyelidLower => &mut self.right_eyelid_lower,
            FaceLandmark::FaceTop => &mut self.face_top,
            FaceLandmark::FaceBottom => &mut self.face_bottom,
        }
    }
}

/// Body points used for posture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyLandmark {
    LeftShoulder,
    RightShoulder,
    LeftHip,
    RightHip,
}

impl BodyLandmark {
    pub const ALL: [BodyLandmark; 4] = [
        BodyLandmark::LeftShoulder,
        BodyLandmark::RightShoulder,
        BodyLandmark::LeftHip,
        BodyLandmark::RightHip,
    ];

    /// Index of this point in a 33-point body pose.
    pub fn pose_index(self) -> usize {
        match self {
            BodyLandmark::LeftShoulder => 11,
            BodyLandmark::RightShoulder => 12,
            BodyLandmark::LeftHip => 23,
            BodyLandmark::RightHip => 24,
        }
    }
}

/// Body landmarks for one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyLandmarkSet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_shoulder: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_shoulder: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_hip: Option<LandmarkPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_hip: Option<LandmarkPoint>,
}

impl BodyLandmarkSet {
    /// Set with all four torso points.
    pub fn new(
        left_shoulder: LandmarkPoint,
        right_shoulder: LandmarkPoint,
        left_hip: LandmarkPoint,
        right_hip: LandmarkPoint,
    ) -> Self {
        Self {
            left_shoulder: Some(left_shoulder),
            right_shoulder: Some(right_shoulder),
            left_hip: Some(left_hip),
            right_hip: Some(right_hip),
        }
    }

    /// Pick the torso points out of a full body pose.
    pub fn from_pose(pose: &[LandmarkPoint]) -> Self {
        let pick = |landmark: BodyLandmark| pose.get(landmark.pose_index()).copied();
        Self {
            left_shoulder: pick(BodyLandmark::LeftShoulder),
            right_shoulder: pick(BodyLandmark::RightShoulder),
            left_hip: pick(BodyLandmark::LeftHip),
            right_hip: pick(BodyLandmark::RightHip),
        }
    }

    pub fn get(&self, landmark: BodyLandmark) -> Option<LandmarkPoint> {
        match landmark {
            BodyLandmark::LeftShoulder => self.left_shoulder,
            BodyLandmark::RightShoulder => self.right_shoulder,
            BodyLandmark::LeftHip => self.left_hip,
            BodyLandmark::RightHip => self.right_hip,
        }
    }

    /// Swap left and right points (a horizontally mirrored subject).
    pub fn swapped_sides(&self) -> Self {
        Self {
            left_shoulder: self.right_shoulder,
            right_shoulder: self.left_shoulder,
            left_hip: self.right_hip,
            right_hip: self.left_hip,
        }
    }
}

/// What the landmark backend found in one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Detection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub face: Option<FaceLandmarkSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<BodyLandmarkSet>,
}

impl Detection {
    /// Nothing detected.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_face(&self) -> bool {
        self.face.is_some()
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// One line of a landmark recording: what was detected in a frame of the
/// given size at the given time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedFrame {
    /// Frame time in seconds
    pub timestamp: f64,
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub detection: Detection,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_set_from_mesh() {
        let mesh: Vec<LandmarkPoint> = (0..468)
            .map(|i| LandmarkPoint::new(i as f64 / 468.0, 0.5))
            .collect();
        let face = FaceLandmarkSet::from_mesh(&mesh);

        assert_eq!(face.len(), FaceLandmark::ALL.len());
        assert_eq!(face.nose_tip, Some(mesh[1]));
        assert_eq!(face.right_eye_outer, Some(mesh[263]));
    }

    #[test]
    fn test_face_set_short_mesh_leaves_gaps() {
        let mesh = vec![LandmarkPoint::new(0.5, 0.5); 40];
        let face = FaceLandmarkSet::from_mesh(&mesh);

        assert!(face.nose_tip.is_some());
        assert!(face.left_eye_outer.is_some());
        assert!(face.right_eye_outer.is_none());
        assert!(face.chin.is_none());
    }

    #[test]
    fn test_body_set_swapped_sides() {
        let body = BodyLandmarkSet::new(
            LandmarkPoint::new(0.4, 0.3),
            LandmarkPoint::new(0.6, 0.3),
            LandmarkPoint::new(0.42, 0.7),
            LandmarkPoint::new(0.58, 0.7),
        );
        let mirrored = body.swapped_sides();

        assert_eq!(mirrored.left_shoulder, body.right_shoulder);
        assert_eq!(mirrored.right_hip, body.left_hip);
        assert_eq!(mirrored.swapped_sides(), body);
    }

    #[test]
    fn test_detection_json_omits_missing_parts() {
        let detection = Detection {
            face: None,
            body: Some(BodyLandmarkSet::from_pose(&[])),
        };
        let json = serde_json::to_string(&detection).unwrap();

        assert_eq!(json, r#"{"body":{}}"#);
        let back: Detection = serde_json::from_str(&json).unwrap();
        assert_eq!(back, detection);
    }

    #[test]
    fn test_recorded_frame_json_line() {
        let line = r#"{"timestamp":1.5,"width":640,"height":480,"body":{"left_shoulder":{"x":0.4,"y":0.5}}}"#;
        let frame: RecordedFrame = serde_json::from_str(line).unwrap();

        assert_eq!(frame.timestamp, 1.5);
        assert_eq!((frame.width, frame.height), (640, 480));
        assert!(!frame.detection.has_face());
        assert!(frame.detection.has_body());

        let empty: RecordedFrame =
            serde_json::from_str(r#"{"timestamp":0.0,"width":1,"height":1}"#).unwrap();
        assert_eq!(empty.detection, Detection::empty());
    }
}
