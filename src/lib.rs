//! Presence Monitor - interview presence signals from camera frames.
//!
//! This library turns face and body landmarks into a small set of
//! per-frame signals: whether the subject is in frame, whether they are
//! making eye contact, whether they are slouching, and an aggregate
//! confidence score with short feedback lines.
//!
//! # Privacy Guarantees
//!
//! - **No frame storage**: Frames are analysed in memory and dropped
//! - **No landmark storage**: Landmark coordinates never leave the analyzer
//! - **Derived values only**: Only scores, classifications and averages are kept
//! - **Transparency**: All processing is counted and auditable
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Presence Monitor                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Landmark   │──▶│  Geometry   │──▶│  Smoothing  │       │
//! │  │  Provider   │   │ (pose/tilt) │   │ (10 frames) │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                                              │              │
//! │                                              ▼              │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Summary    │◀──│   Scoring   │◀──│   Tracker   │       │
//! │  │  (10s)      │   │  (0..=100)  │   │ (hysteresis)│       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use presence_monitor::{AnalyzerConfig, FrameAnalyzer, NoopProvider};
//!
//! let mut analyzer = FrameAnalyzer::new(NoopProvider::new(), AnalyzerConfig::default());
//! let frame = image::RgbImage::new(640, 480);
//! let metrics = analyzer.analyze(&frame, 0.0);
//! println!("{}: {:?}", metrics.confidence_score, metrics.feedback);
//! ```

pub mod config;
pub mod core;
pub mod decode;
pub mod landmarks;
pub mod render;
pub mod transparency;

// Re-export key types at crate root for convenience
pub use config::{AnalyzerConfig, Config, ConfigError};
pub use core::{
    BehaviorEvent, EyeContact, FrameAnalyzer, FrameMetrics, OverallRating, PoseEstimate,
    SessionSummary,
};
pub use decode::{decode_frame, DecodeError};
pub use landmarks::{
    BodyLandmarkSet, Detection, FaceLandmarkSet, LandmarkPoint, LandmarkProvider, NoopProvider,
    StaticProvider,
};
pub use render::annotate;
pub use transparency::{TransparencyLog, TransparencyStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Privacy declaration that can be displayed to users.
pub const PRIVACY_DECLARATION: &str = r#"
╔══════════════════════════════════════════════════════════════════╗
║              PRESENCE MONITOR - PRIVACY DECLARATION              ║
╠══════════════════════════════════════════════════════════════════╣
║                                                                  ║
║  This monitor gives feedback on camera presence in interviews.   ║
║                                                                  ║
║  ✓ WHAT WE DERIVE:                                               ║
║    • Whether a face is in frame                                  ║
║    • Approximate head direction (eye contact)                    ║
║    • Torso tilt (posture)                                        ║
║    • Blink rate over the last few seconds                        ║
║                                                                  ║
║  ✗ WHAT WE NEVER KEEP:                                           ║
║    • Camera frames or images                                     ║
║    • Face or body landmark coordinates                           ║
║    • Anything that could identify you                            ║
║                                                                  ║
║  All frames are processed locally and discarded immediately.     ║
║  Only averaged summaries (every 10 seconds) are exported.        ║
║                                                                  ║
║  You can view processing statistics anytime with:                ║
║    presence-monitor status                                       ║
║                                                                  ║
╚══════════════════════════════════════════════════════════════════╝
"#;
