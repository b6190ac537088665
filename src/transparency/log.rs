//! Privacy-preserving transparency log.
//!
//! Counts what the monitor has processed without keeping any frame, landmark
//! or identifying data.

use crate::landmarks::Detection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};

/// Processing counters for the current session.
#[derive(Debug)]
pub struct TransparencyLog {
    /// Frames run through the analyzer
    frames_analyzed: AtomicU64,
    /// Frames in which a face was detected
    faces_detected: AtomicU64,
    /// Frames in which a body was detected
    bodies_detected: AtomicU64,
    /// Encoded frames that could not be decoded
    decode_failures: AtomicU64,
    /// Session summaries written to disk
    summaries_exported: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl TransparencyLog {
    pub fn new() -> Self {
        Self {
            frames_analyzed: AtomicU64::new(0),
            faces_detected: AtomicU64::new(0),
            bodies_detected: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            summaries_exported: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create a log backed by a JSON file, picking up any counts saved there.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            tracing::warn!("could not load previous transparency stats: {}", e);
        }

        log
    }

    /// Record one analysed frame and what was found in it.
    pub fn record_frame(&self, face_detected: bool, body_detected: bool) {
        self.frames_analyzed.fetch_add(1, Ordering::Relaxed);
        if face_detected {
            self.faces_detected.fetch_add(1, Ordering::Relaxed);
        }
        if body_detected {
            self.bodies_detected.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record one analysed frame from the landmarks detected in it.
    pub fn record_detection(&self, detection: &Detection) {
        self.record_frame(detection.has_face(), detection.has_body());
    }

    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_summaries_exported(&self, count: u64) {
        self.summaries_exported.fetch_add(count, Ordering::Relaxed);
    }

    pub fn stats(&self) -> TransparencyStats {
        TransparencyStats {
            frames_analyzed: self.frames_analyzed.load(Ordering::Relaxed),
            faces_detected: self.faces_detected.load(Ordering::Relaxed),
            bodies_detected: self.bodies_detected.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            summaries_exported: self.summaries_exported.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Human-readable statistics plus the privacy guarantee.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Session Statistics:\n\
             - Frames analyzed: {}\n\
             - Frames with a face: {}\n\
             - Frames with a body: {}\n\
             - Undecodable frames: {}\n\
             - Summaries exported: {}\n\
             - Session duration: {} seconds\n\
             \n\
             Privacy Guarantee:\n\
             - Frames are analyzed in memory and discarded\n\
             - No images or landmark coordinates are stored\n\
             - Only derived scores and averages are retained",
            stats.frames_analyzed,
            stats.faces_detected,
            stats.bodies_detected,
            stats.decode_failures,
            stats.summaries_exported,
            stats.session_duration_secs
        )
    }

    /// Save counters to the persistence file, if one is configured.
    pub fn save(&self) -> Result<(), std::io::Error> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let stats = self.stats();
        let persisted = PersistedStats {
            frames_analyzed: stats.frames_analyzed,
            faces_detected: stats.faces_detected,
            bodies_detected: stats.bodies_detected,
            decode_failures: stats.decode_failures,
            summaries_exported: stats.summaries_exported,
            last_updated: Some(Utc::now()),
        };

        let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        let Some(path) = &self.persist_path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path)?;
        let persisted: PersistedStats =
            serde_json::from_str(&content).map_err(std::io::Error::other)?;

        self.frames_analyzed
            .store(persisted.frames_analyzed, Ordering::Relaxed);
        self.faces_detected
            .store(persisted.faces_detected, Ordering::Relaxed);
        self.bodies_detected
            .store(persisted.bodies_detected, Ordering::Relaxed);
        self.decode_failures
            .store(persisted.decode_failures, Ordering::Relaxed);
        self.summaries_exported
            .store(persisted.summaries_exported, Ordering::Relaxed);
        Ok(())
    }

    pub fn reset(&self) {
        self.frames_analyzed.store(0, Ordering::Relaxed);
        self.faces_detected.store(0, Ordering::Relaxed);
        self.bodies_detected.store(0, Ordering::Relaxed);
        self.decode_failures.store(0, Ordering::Relaxed);
        self.summaries_exported.store(0, Ordering::Relaxed);
    }
}

impl Default for TransparencyLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransparencyStats {
    pub frames_analyzed: u64,
    pub faces_detected: u64,
    pub bodies_detected: u64,
    pub decode_failures: u64,
    pub summaries_exported: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// On-disk format. Missing fields load as zero.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PersistedStats {
    frames_analyzed: u64,
    faces_detected: u64,
    bodies_detected: u64,
    decode_failures: u64,
    summaries_exported: u64,
    last_updated: Option<DateTime<Utc>>,
}
