//! Per-category segment enhancement network.
//!
//! The enhancer is a residual block MLP: the segment is processed in
//! fixed-size blocks, each pushed through one hidden layer, and the
//! network's output is added back onto the input block. A fresh
//! (untrained) enhancer therefore starts as an identity mapping with
//! small random perturbation capacity, which keeps an uninitialized
//! install usable without pretending to enhance.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::model::{Category, ModelError, SegmentModel};

pub const ENHANCER_MODEL_VERSION: i64 = 2;
pub const DEFAULT_SEGMENT_LEN: usize = 4096;
const DEFAULT_BLOCK_SIZE: usize = 128;
const DEFAULT_HIDDEN_SIZE: usize = 256;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancerNet {
    pub model_version: i64,
    pub category: Category,
    pub segment_len: usize,
    pub block_size: usize,
    pub hidden_size: usize,
    pub weights1: Vec<f32>,
    pub bias1: Vec<f32>,
    pub weights2: Vec<f32>,
    pub bias2: Vec<f32>,
}

impl EnhancerNet {
    /// Deterministic fresh network for a category. Biases start at zero
    /// and weights are small, so inference starts near identity and a
    /// given category always constructs the same network.
    pub fn fresh(category: Category) -> Self {
        let mut rng = StdRng::seed_from_u64(seed_for(category));
        let block = DEFAULT_BLOCK_SIZE;
        let hidden = DEFAULT_HIDDEN_SIZE;
        let mut weights1 = vec![0.0_f32; hidden * block];
        let mut weights2 = vec![0.0_f32; block * hidden];
        for w in &mut weights1 {
            *w = (rng.random::<f32>() - 0.5) * 0.02;
        }
        for w in &mut weights2 {
            *w = (rng.random::<f32>() - 0.5) * 0.02;
        }
        Self {
            model_version: ENHANCER_MODEL_VERSION,
            category,
            segment_len: DEFAULT_SEGMENT_LEN,
            block_size: block,
            hidden_size: hidden,
            weights1,
            bias1: vec![0.0_f32; hidden],
            weights2,
            bias2: vec![0.0_f32; block],
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != ENHANCER_MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {ENHANCER_MODEL_VERSION})",
                self.model_version
            ));
        }
        if self.block_size == 0 || self.hidden_size == 0 {
            return Err("Zero block or hidden size".to_string());
        }
        if self.segment_len == 0 || self.segment_len % self.block_size != 0 {
            return Err(format!(
                "Segment length {} is not a multiple of block size {}",
                self.segment_len, self.block_size
            ));
        }
        if self.weights1.len() != self.hidden_size * self.block_size {
            return Err("weights1 length mismatch".to_string());
        }
        if self.bias1.len() != self.hidden_size {
            return Err("bias1 length mismatch".to_string());
        }
        if self.weights2.len() != self.block_size * self.hidden_size {
            return Err("weights2 length mismatch".to_string());
        }
        if self.bias2.len() != self.block_size {
            return Err("bias2 length mismatch".to_string());
        }
        Ok(())
    }
}

impl SegmentModel for EnhancerNet {
    fn segment_len(&self) -> usize {
        self.segment_len
    }

    fn infer(&self, segment: &[f32]) -> Result<Vec<f32>, ModelError> {
        if segment.len() != self.segment_len {
            return Err(ModelError::Inference {
                message: format!(
                    "Input length {} does not match segment length {}",
                    segment.len(),
                    self.segment_len
                ),
            });
        }
        let block = self.block_size;
        let hidden = self.hidden_size;
        let mut output = Vec::with_capacity(segment.len());
        let mut hidden_act = vec![0.0_f32; hidden];
        for chunk in segment.chunks_exact(block) {
            for h in 0..hidden {
                let mut sum = self.bias1[h];
                let base = h * block;
                for i in 0..block {
                    sum += self.weights1[base + i] * chunk[i];
                }
                hidden_act[h] = sum.max(0.0);
            }
            for i in 0..block {
                let mut residual = self.bias2[i];
                let base = i * hidden;
                for h in 0..hidden {
                    residual += self.weights2[base + h] * hidden_act[h];
                }
                output.push(chunk[i] + residual);
            }
        }
        Ok(output)
    }
}

fn seed_for(category: Category) -> u64 {
    category
        .as_str()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325_u64, |acc, byte| {
            (acc ^ byte as u64).wrapping_mul(0x0000_0100_0000_01b3)
        })
}
