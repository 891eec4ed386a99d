//! Content classification: spectral features to a category distribution.
//!
//! Degraded inputs (undecodable, too short, model not ready) produce a
//! neutral result instead of an error so the pipeline can continue with
//! the general model.

mod features;
mod mel;

use std::path::Path;

pub use features::{ANALYSIS_SAMPLE_RATE, extract_features};

use crate::audio::{Signal, read_pcm};
use crate::model::classifier::ClassifierMlp;
use crate::model::Category;

/// Dominant content type of an input, `Unknown` when classification fell
/// back to the neutral result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DominantType {
    Voice,
    Music,
    Ambient,
    Unknown,
}

impl DominantType {
    /// Model category serving this content type.
    pub fn category(self) -> Category {
        match self {
            DominantType::Voice => Category::Voice,
            DominantType::Music => Category::Music,
            DominantType::Ambient => Category::Ambient,
            DominantType::Unknown => Category::General,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DominantType::Voice => "voice",
            DominantType::Music => "music",
            DominantType::Ambient => "ambient",
            DominantType::Unknown => "unknown",
        }
    }
}

/// Per-category confidences plus the derived dominant type. Computed once
/// per input and consumed immediately; never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentClassification {
    pub voice_confidence: f32,
    pub music_confidence: f32,
    pub ambient_confidence: f32,
    pub dominant: DominantType,
}

impl ContentClassification {
    /// Even distribution used when classification cannot run.
    pub fn neutral() -> Self {
        Self {
            voice_confidence: 1.0 / 3.0,
            music_confidence: 1.0 / 3.0,
            ambient_confidence: 1.0 / 3.0,
            dominant: DominantType::Unknown,
        }
    }

    pub fn confidences(&self) -> [f32; 3] {
        [
            self.voice_confidence,
            self.music_confidence,
            self.ambient_confidence,
        ]
    }
}

/// Classify a decoded signal.
pub fn classify_signal(signal: &Signal, classifier: &ClassifierMlp) -> ContentClassification {
    let mono = signal.downmix_mono();
    let Some(feature_vec) = extract_features(&mono, signal.sample_rate) else {
        tracing::warn!("input too short for feature extraction, using neutral classification");
        return ContentClassification::neutral();
    };
    classify_features(&feature_vec, classifier)
}

/// Classify an already-extracted feature vector.
pub fn classify_features(features: &[f32], classifier: &ClassifierMlp) -> ContentClassification {
    let proba = classifier.predict_proba(features);
    if proba.len() != 3 {
        tracing::warn!("classifier not ready for feature vector, using neutral classification");
        return ContentClassification::neutral();
    }
    ContentClassification {
        voice_confidence: proba[0],
        music_confidence: proba[1],
        ambient_confidence: proba[2],
        dominant: dominant_of(&proba),
    }
}

/// Classify an audio file; decode failures degrade to the neutral result.
pub fn classify_path(path: &Path, classifier: &ClassifierMlp) -> ContentClassification {
    match read_pcm(path) {
        Ok(signal) => classify_signal(&signal, classifier),
        Err(err) => {
            tracing::warn!("classification decode failed ({err}), using neutral result");
            ContentClassification::neutral()
        }
    }
}

/// Stable left-to-right argmax: ties resolve to the earliest class, which
/// gives the fixed priority voice > music > ambient.
fn dominant_of(proba: &[f32]) -> DominantType {
    let mut best = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &p) in proba.iter().enumerate() {
        if p > best_val {
            best_val = p;
            best = idx;
        }
    }
    match best {
        0 => DominantType::Voice,
        1 => DominantType::Music,
        _ => DominantType::Ambient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone_signal() -> Signal {
        Signal::from_mono(
            (0..44_100)
                .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 44_100.0).sin())
                .collect(),
            44_100,
        )
    }

    #[test]
    fn confidences_are_bounded_and_sum_to_one() {
        let result = classify_signal(&tone_signal(), &ClassifierMlp::fresh());
        let sum: f32 = result.confidences().iter().sum();
        assert!((sum - 1.0).abs() < 0.01);
        assert!(result
            .confidences()
            .iter()
            .all(|&c| (0.0..=1.0).contains(&c)));
    }

    #[test]
    fn pure_tone_classification_is_reproducible() {
        let classifier = ClassifierMlp::fresh();
        let signal = tone_signal();
        let a = classify_signal(&signal, &classifier);
        let b = classify_signal(&signal, &classifier);
        assert_eq!(a, b);
        assert_ne!(a.dominant, DominantType::Unknown);
    }

    #[test]
    fn all_zero_signal_classifies_without_error() {
        let signal = Signal::from_mono(vec![0.0_f32; 8192], 44_100);
        let result = classify_signal(&signal, &ClassifierMlp::fresh());
        let sum: f32 = result.confidences().iter().sum();
        assert!((sum - 1.0).abs() < 0.01);
    }

    #[test]
    fn sub_frame_input_degrades_to_neutral() {
        let signal = Signal::from_mono(vec![0.5_f32; 100], 44_100);
        let result = classify_signal(&signal, &ClassifierMlp::fresh());
        assert_eq!(result.dominant, DominantType::Unknown);
        assert!((result.voice_confidence - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn ties_resolve_in_priority_order() {
        assert_eq!(dominant_of(&[0.4, 0.4, 0.2]), DominantType::Voice);
        assert_eq!(dominant_of(&[0.2, 0.4, 0.4]), DominantType::Music);
        assert_eq!(dominant_of(&[0.1, 0.2, 0.7]), DominantType::Ambient);
    }
}
