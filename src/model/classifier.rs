//! Three-way content classifier network.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const CLASSIFIER_MODEL_VERSION: i64 = 2;
pub const CLASSIFIER_FEATURE_LEN: usize = 40;
pub const CLASSIFIER_CLASSES: [&str; 3] = ["voice", "music", "ambient"];
const DEFAULT_HIDDEN_SIZE: usize = 64;

/// One-hidden-layer MLP over the 40-dim log-mel feature vector, with a
/// softmax head over {voice, music, ambient}.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierMlp {
    pub model_version: i64,
    pub feature_len: usize,
    pub hidden_size: usize,
    pub classes: Vec<String>,
    pub weights1: Vec<f32>,
    pub bias1: Vec<f32>,
    pub weights2: Vec<f32>,
    pub bias2: Vec<f32>,
    pub feature_mean: Vec<f32>,
    pub feature_std: Vec<f32>,
}

impl ClassifierMlp {
    /// Deterministic fresh classifier so an untrained install still gives
    /// stable, reproducible predictions for identical input.
    pub fn fresh() -> Self {
        let mut rng = StdRng::seed_from_u64(0x636c_6173_7369_6679);
        let input = CLASSIFIER_FEATURE_LEN;
        let hidden = DEFAULT_HIDDEN_SIZE;
        let classes = CLASSIFIER_CLASSES.len();
        let mut weights1 = vec![0.0_f32; hidden * input];
        let mut weights2 = vec![0.0_f32; classes * hidden];
        for w in &mut weights1 {
            *w = (rng.random::<f32>() - 0.5) * 0.1;
        }
        for w in &mut weights2 {
            *w = (rng.random::<f32>() - 0.5) * 0.1;
        }
        Self {
            model_version: CLASSIFIER_MODEL_VERSION,
            feature_len: input,
            hidden_size: hidden,
            classes: CLASSIFIER_CLASSES.iter().map(|c| c.to_string()).collect(),
            weights1,
            bias1: vec![0.0_f32; hidden],
            weights2,
            bias2: vec![0.0_f32; classes],
            feature_mean: vec![0.0_f32; input],
            feature_std: vec![1.0_f32; input],
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != CLASSIFIER_MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {CLASSIFIER_MODEL_VERSION})",
                self.model_version
            ));
        }
        if self.feature_len != CLASSIFIER_FEATURE_LEN {
            return Err(format!(
                "Unsupported feature_len {} (expected {CLASSIFIER_FEATURE_LEN})",
                self.feature_len
            ));
        }
        let input = self.feature_len;
        let hidden = self.hidden_size;
        let classes = self.classes.len();
        if classes != CLASSIFIER_CLASSES.len() {
            return Err(format!("Expected 3 classes, got {classes}"));
        }
        if hidden == 0 {
            return Err("Zero hidden size".to_string());
        }
        if self.weights1.len() != input * hidden {
            return Err("weights1 length mismatch".to_string());
        }
        if self.bias1.len() != hidden {
            return Err("bias1 length mismatch".to_string());
        }
        if self.weights2.len() != classes * hidden {
            return Err("weights2 length mismatch".to_string());
        }
        if self.bias2.len() != classes {
            return Err("bias2 length mismatch".to_string());
        }
        if self.feature_mean.len() != input || self.feature_std.len() != input {
            return Err("feature normalization length mismatch".to_string());
        }
        Ok(())
    }

    /// Class probabilities over {voice, music, ambient}, in class order.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        if features.len() != self.feature_len {
            return Vec::new();
        }
        let input = self.feature_len;
        let hidden = self.hidden_size;
        let classes = self.classes.len();

        let mut normalized = vec![0.0_f32; input];
        for i in 0..input {
            let std = self.feature_std[i].max(1e-6);
            normalized[i] = (features[i] - self.feature_mean[i]) / std;
        }

        let mut hidden_act = vec![0.0_f32; hidden];
        for h in 0..hidden {
            let mut sum = self.bias1[h];
            let base = h * input;
            for i in 0..input {
                sum += self.weights1[base + i] * normalized[i];
            }
            hidden_act[h] = sum.max(0.0);
        }

        let mut logits = vec![0.0_f32; classes];
        for c in 0..classes {
            let mut sum = self.bias2[c];
            let base = c * hidden;
            for h in 0..hidden {
                sum += self.weights2[base + h] * hidden_act[h];
            }
            logits[c] = sum;
        }

        softmax(&logits)
    }
}

/// Numerically-stable softmax.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    if raw.is_empty() {
        return Vec::new();
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut exps = Vec::with_capacity(raw.len());
    let mut sum = 0.0f32;
    for &v in raw {
        let e = (v - max).exp();
        exps.push(e);
        sum += e;
    }
    if sum == 0.0 {
        return vec![1.0 / raw.len() as f32; raw.len()];
    }
    for v in &mut exps {
        *v /= sum;
    }
    exps
}
