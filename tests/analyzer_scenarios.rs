//! End-to-end scenarios for the frame analyzer.

use image::{Rgb, RgbImage};
use presence_monitor::core::scoring::{MSG_LOOK_AT_CAMERA, MSG_NERVOUS, MSG_NOT_IN_FRAME};
use presence_monitor::core::{BehaviorEvent, EyeContact, FrameAnalyzer};
use presence_monitor::decode::encode_png_data_url;
use presence_monitor::landmarks::{
    BodyLandmarkSet, Detection, FaceLandmark, FaceLandmarkSet, LandmarkPoint, NoopProvider,
    StaticProvider,
};
use presence_monitor::AnalyzerConfig;

fn face_with_nose(x: f64, y: f64) -> FaceLandmarkSet {
    FaceLandmarkSet::default()
        .with(FaceLandmark::NoseTip, LandmarkPoint::new(x, y))
        .with(FaceLandmark::LeftEyeOuter, LandmarkPoint::new(0.4, 0.4))
        .with(FaceLandmark::RightEyeOuter, LandmarkPoint::new(0.6, 0.4))
        .with(FaceLandmark::Chin, LandmarkPoint::new(0.5, 0.6))
}

fn frontal() -> Detection {
    Detection {
        face: Some(face_with_nose(0.5, 0.5)),
        body: None,
    }
}

/// Nose far enough right for a raw yaw of 40 on a square frame.
fn turned_away() -> Detection {
    Detection {
        face: Some(face_with_nose(0.66, 0.5)),
        body: None,
    }
}

fn analyzer() -> FrameAnalyzer<NoopProvider> {
    FrameAnalyzer::starting_at(NoopProvider::new(), AnalyzerConfig::default(), 0.0)
}

#[test]
fn test_empty_room_raises_absence_at_three_seconds() {
    let mut analyzer = analyzer();

    for i in 0..=40 {
        let t = i as f64 / 10.0;
        let metrics = analyzer.analyze_detection(&Detection::empty(), 640, 480, t);

        assert!(!metrics.presence);
        assert_eq!(metrics.eye_contact, EyeContact::Unknown);
        if t >= 3.0 {
            assert!(metrics.has_feedback(MSG_NOT_IN_FRAME), "t = {t}");
            assert_eq!(metrics.confidence_score, 0);
        } else {
            assert!(!metrics.has_feedback(MSG_NOT_IN_FRAME), "t = {t}");
            assert!(metrics.confidence_score > 0);
        }
    }

    assert_eq!(
        analyzer.take_events(),
        vec![BehaviorEvent::LeftFrame { at: 3.0 }]
    );
}

#[test]
fn test_frontal_face_has_good_eye_contact() {
    let mut analyzer = analyzer();

    for i in 0..10 {
        let metrics = analyzer.analyze_detection(&frontal(), 640, 480, i as f64 / 10.0);
        assert!(metrics.presence, "frame {i}");
        if i == 0 {
            continue;
        }

        assert_eq!(metrics.eye_contact, EyeContact::Good, "frame {i}");
        assert!(metrics.confidence_score >= 70, "frame {i}: {}", metrics.confidence_score);
        assert!(metrics.head_pose.yaw.abs() < 1e-9, "frame {i}");
        assert!(metrics.head_pose.pitch.abs() < 1e-9, "frame {i}");
    }
}

#[test]
fn test_upright_torso_is_good_posture() {
    let mut analyzer = analyzer();
    let detection = Detection {
        face: Some(face_with_nose(0.5, 0.5)),
        body: Some(BodyLandmarkSet::new(
            LandmarkPoint::new(0.4, 0.5),
            LandmarkPoint::new(0.6, 0.5),
            LandmarkPoint::new(0.4, 0.9),
            LandmarkPoint::new(0.6, 0.9),
        )),
    };

    let metrics = analyzer.analyze_detection(&detection, 640, 480, 0.0);
    assert!(metrics.posture.slouch_angle_deg.abs() < 1e-9);
    assert!(metrics.posture.is_good);
}

#[test]
fn test_brief_glance_is_not_reported() {
    let mut analyzer = analyzer();

    for i in 0..10 {
        analyzer.analyze_detection(&turned_away(), 100, 100, i as f64 / 10.0);
    }
    let mut last = None;
    for i in 10..20 {
        last = Some(analyzer.analyze_detection(&frontal(), 100, 100, i as f64 / 10.0));
    }

    let metrics = last.unwrap();
    assert_eq!(metrics.eye_contact, EyeContact::Good);
    assert!(!metrics.has_feedback(MSG_LOOK_AT_CAMERA));
    assert!(analyzer
        .take_events()
        .iter()
        .all(|e| !matches!(e, BehaviorEvent::LookedAway { .. })));
}

#[test]
fn test_sustained_look_away_is_reported_once() {
    let mut analyzer = analyzer();

    let mut alarms = Vec::new();
    for i in 0..=25 {
        let t = i as f64 / 10.0;
        let metrics = analyzer.analyze_detection(&turned_away(), 100, 100, t);
        assert_eq!(metrics.eye_contact, EyeContact::Away);
        alarms.push(metrics.has_feedback(MSG_LOOK_AT_CAMERA));
    }

    assert!(alarms[..20].iter().all(|on| !on));
    assert!(alarms[20..].iter().all(|on| *on));
    assert_eq!(
        analyzer.take_events(),
        vec![BehaviorEvent::LookedAway { at: 2.0 }]
    );

    // 50 - 15 + 10
    let metrics = analyzer.analyze_detection(&turned_away(), 100, 100, 2.6);
    assert_eq!(metrics.confidence_score, 45);
    assert!(analyzer.take_events().is_empty());
}

#[test]
fn test_rapid_blinking_flags_nervousness() {
    let mut analyzer = analyzer();

    let mut last = None;
    for i in 0..20 {
        let lower = if i % 2 == 1 { 0.401 } else { 0.42 };
        let face = face_with_nose(0.5, 0.5)
            .with(FaceLandmark::LeftEyelidUpper, LandmarkPoint::new(0.45, 0.4))
            .with(FaceLandmark::LeftEyelidLower, LandmarkPoint::new(0.45, lower))
            .with(FaceLandmark::RightEyelidUpper, LandmarkPoint::new(0.55, 0.4))
            .with(FaceLandmark::RightEyelidLower, LandmarkPoint::new(0.55, lower))
            .with(FaceLandmark::FaceTop, LandmarkPoint::new(0.5, 0.3))
            .with(FaceLandmark::FaceBottom, LandmarkPoint::new(0.5, 0.7));
        let detection = Detection {
            face: Some(face),
            body: None,
        };
        last = Some(analyzer.analyze_detection(&detection, 100, 100, i as f64 / 10.0));
    }

    assert!(last.unwrap().has_feedback(MSG_NERVOUS));
    let summary = analyzer.summary(1.9);
    assert!(summary.nervous);
    assert!((summary.blink_rate - 2.0).abs() < 1e-9);
}

fn test_frame() -> RgbImage {
    RgbImage::from_fn(32, 24, |x, y| Rgb([(x * 8) as u8, (y * 10) as u8, 128]))
}

#[test]
fn test_encoded_image_matches_direct_analysis() {
    let image = test_frame();
    let url = encode_png_data_url(&image).unwrap();

    let mut via_decode = FrameAnalyzer::starting_at(
        StaticProvider::new(frontal()),
        AnalyzerConfig::default(),
        0.0,
    );
    let mut direct = FrameAnalyzer::starting_at(
        StaticProvider::new(frontal()),
        AnalyzerConfig::default(),
        0.0,
    );

    for i in 0..5 {
        let t = i as f64 / 10.0;
        let decoded = via_decode
            .process_encoded_image_at(url.as_bytes(), t)
            .unwrap();
        let expected = direct.analyze(&image, t);
        assert_eq!(decoded, expected);
    }
}

#[test]
fn test_decode_errors_do_not_disturb_session() {
    let image = test_frame();
    let mut with_errors =
        FrameAnalyzer::starting_at(StaticProvider::new(frontal()), AnalyzerConfig::default(), 0.0);
    let mut clean =
        FrameAnalyzer::starting_at(StaticProvider::new(frontal()), AnalyzerConfig::default(), 0.0);

    for i in 0..10 {
        let t = i as f64 / 10.0;
        assert!(with_errors.process_encoded_image_at(b"", t).is_err());
        assert!(with_errors
            .process_encoded_image_at(b"data:image/png;base64,@@@@", t)
            .is_err());

        let a = with_errors.analyze(&image, t);
        let b = clean.analyze(&image, t);
        assert_eq!(a, b);
    }

    assert_eq!(with_errors.frames_analyzed(), clean.frames_analyzed());
    assert_eq!(with_errors.provider().calls(), clean.provider().calls());
}
