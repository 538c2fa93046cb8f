//! Text embedding support
//!
//! Similarity search degrades gracefully when no model is available: callers
//! treat `EmbeddingError::Disabled` as "fall back to text search", so a build
//! without the `embeddings` feature still supports every operation.

use thiserror::Error;

#[cfg(test)]
use std::sync::Mutex;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embeddings are disabled in this build")]
    Disabled,

    #[error("embedding model returned no vectors")]
    EmptyResult,

    #[error("embedding model error: {0}")]
    Model(String),
}

/// Source of embedding vectors for entity content.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Cosine similarity between two vectors. Returns 0.0 for mismatched
/// dimensions or zero-norm inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Embedder for builds without a model. Every call reports `Disabled`.
pub struct DisabledEmbedder;

impl Embedder for DisabledEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::Disabled)
    }
}

#[cfg(feature = "embeddings")]
pub use fastembed_impl::FastEmbedEmbedder;

#[cfg(feature = "embeddings")]
mod fastembed_impl {
    use super::{Embedder, EmbeddingError};
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use std::sync::Mutex;

    /// Local embedding model via fastembed. The model handle is not Sync, so
    /// calls are serialized through a mutex.
    pub struct FastEmbedEmbedder {
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedEmbedder {
        pub fn new() -> Result<Self, EmbeddingError> {
            Self::with_model(EmbeddingModel::NomicEmbedTextV15)
        }

        pub fn with_model(model: EmbeddingModel) -> Result<Self, EmbeddingError> {
            let model = TextEmbedding::try_new(
                InitOptions::new(model).with_show_download_progress(false),
            )
            .map_err(|e| EmbeddingError::Model(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    impl Embedder for FastEmbedEmbedder {
        fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let mut model = self.model.lock().unwrap();
            let mut vectors = model
                .embed(vec![text.to_string()], None)
                .map_err(|e| EmbeddingError::Model(e.to_string()))?;
            vectors.pop().ok_or(EmbeddingError::EmptyResult)
        }
    }
}

/// Deterministic embedder for tests: returns a fixed vector per instance.
#[cfg(test)]
pub struct ConstantEmbedder {
    vector: Mutex<Vec<f32>>,
}

#[cfg(test)]
impl ConstantEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector: Mutex::new(vector),
        }
    }
}

#[cfg(test)]
impl Embedder for ConstantEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(self.vector.lock().unwrap().clone())
    }
}
