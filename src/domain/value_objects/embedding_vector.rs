use serde::{Deserialize, Serialize};

/// A fixed-length embedding produced by one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn magnitude(&self) -> f32 {
        self.0.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    /// Cosine similarity in `[-1, 1]`. Zero vectors and mismatched
    /// dimensions score 0.0 rather than erroring so ranking stays total.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> f32 {
        if self.dimension() != other.dimension() {
            return 0.0;
        }

        let dot_product: f32 = self
            .0
            .iter()
            .zip(other.0.iter())
            .map(|(x, y)| x * y)
            .sum();
        let norm_a = self.magnitude();
        let norm_b = other.magnitude();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}
