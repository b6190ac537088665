//! Landmark input for the presence monitor.
//!
//! The landmark model itself lives outside this crate. Anything that can turn
//! an RGB frame into face and body points implements [`LandmarkProvider`].

pub mod noop;
pub mod types;

use image::RgbImage;

// Re-export commonly used types
pub use noop::{NoopProvider, StaticProvider};
pub use types::{
    BodyLandmark, BodyLandmarkSet, Detection, FaceLandmark, FaceLandmarkSet, LandmarkPoint,
    RecordedFrame,
};

/// A landmark detection backend.
///
/// Implementations run synchronously and never fail: a frame where the model
/// is below its own confidence threshold simply yields `None` for that part.
/// Implementations may be stateful (tracking across frames), hence `&mut self`.
pub trait LandmarkProvider {
    fn detect(&mut self, image: &RgbImage) -> Detection;
}

impl<P: LandmarkProvider + ?Sized> LandmarkProvider for Box<P> {
    fn detect(&mut self, image: &RgbImage) -> Detection {
        (**self).detect(image)
    }
}
