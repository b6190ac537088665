//! Providers that never run a model.
//!
//! These exist so the analyzer (and binary) can run without a landmark model:
//! `NoopProvider` finds nothing, `StaticProvider` replays one fixed detection.

use super::LandmarkProvider;
use crate::landmarks::types::Detection;
use image::RgbImage;

/// A provider that never detects anything.
#[derive(Debug, Clone, Default)]
pub struct NoopProvider;

impl NoopProvider {
    pub fn new() -> Self {
        Self
    }
}

impl LandmarkProvider for NoopProvider {
    fn detect(&mut self, _image: &RgbImage) -> Detection {
        Detection::empty()
    }
}

/// A provider that returns the same detection for every image.
#[derive(Debug, Clone, Default)]
pub struct StaticProvider {
    detection: Detection,
    calls: u64,
}

impl StaticProvider {
    pub fn new(detection: Detection) -> Self {
        Self {
            detection,
            calls: 0,
        }
    }

    /// Replace the detection returned from now on.
    pub fn set_detection(&mut self, detection: Detection) {
        self.detection = detection;
    }

    /// Number of images this provider has been asked about.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl LandmarkProvider for StaticProvider {
    fn detect(&mut self, _image: &RgbImage) -> Detection {
        self.calls += 1;
        self.detection.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::types::{BodyLandmarkSet, LandmarkPoint};

    #[test]
    fn test_noop_detects_nothing() {
        let mut provider = NoopProvider::new();
        let detection = provider.detect(&RgbImage::new(4, 4));
        assert!(!detection.has_face());
        assert!(!detection.has_body());
    }

    #[test]
    fn test_static_provider_counts_calls() {
        let body = BodyLandmarkSet::new(
            LandmarkPoint::new(0.4, 0.3),
            LandmarkPoint::new(0.6, 0.3),
            LandmarkPoint::new(0.4, 0.7),
            LandmarkPoint::new(0.6, 0.7),
        );
        let mut provider = StaticProvider::new(Detection {
            face: None,
            body: Some(body),
        });

        let image = RgbImage::new(2, 2);
        assert!(provider.detect(&image).has_body());
        assert!(provider.detect(&image).has_body());
        assert_eq!(provider.calls(), 2);

        provider.set_detection(Detection::empty());
        assert!(!provider.detect(&image).has_body());
    }
}
