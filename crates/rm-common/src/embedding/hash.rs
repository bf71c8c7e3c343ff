use std::hash::{Hash, Hasher};

use async_trait::async_trait;
use siphasher::sip::SipHasher13;

use super::{EmbedError, EmbeddingConfig, EmbeddingProvider};

/// Fixed seeds keep the hashing deterministic across processes and Rust
/// versions. Changing them changes every stored vector.
const HASH_SEED_K0: u64 = 0x52e5_a1c3_9b77_0d24;
const HASH_SEED_K1: u64 = 0x1f86_42da_c05e_93b1;

/// Feature-hashing embedder: deterministic, training-free, O(tokens).
///
/// Used as the local fallback when no hosted embedding model is configured
/// and as the test double for the pipeline. Vocabulary terms from the
/// config are down-weighted so ubiquitous job-text words contribute less
/// than distinguishing ones.
pub struct HashEmbedder {
    config: EmbeddingConfig,
}

impl HashEmbedder {
    pub fn new(config: EmbeddingConfig) -> Self {
        let mut config = config;
        config.dimension = config.dimension.max(1);
        Self { config }
    }

    fn hash_token(&self, token: &str) -> usize {
        let mut hasher = SipHasher13::new_with_keys(HASH_SEED_K0, HASH_SEED_K1);
        token.hash(&mut hasher);
        (hasher.finish() as usize) % self.config.dimension
    }

    fn token_weight(&self, token: &str) -> f32 {
        if self.config.vocabulary.iter().any(|term| term == token) {
            0.5
        } else {
            1.0
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.config.dimension];

        for token in tokenize(text) {
            let idx = self.hash_token(&token);
            // Sign hashing keeps the expected dot product of unrelated
            // texts near zero.
            let sign = if self.hash_token(&format!("{token}_sign")) % 2 == 0 {
                1.0
            } else {
                -1.0
            };
            vector[idx] += sign * self.token_weight(&token);
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        vector
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.')))
        .map(|t| t.trim_matches('.').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn name(&self) -> &'static str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.embed_text(text))
    }
}
