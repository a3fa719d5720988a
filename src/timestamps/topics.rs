use serde::Serialize;

use crate::error::{DigestError, Result};
use crate::nlp::embedding::Embedder;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TopicParams {
    pub window_size: usize,
    pub similarity_threshold: f64,
}

impl Default for TopicParams {
    fn default() -> Self {
        Self {
            window_size: 3,
            similarity_threshold: 0.5,
        }
    }
}

/// How the topic boundaries were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicMethod {
    /// Too few sentences to compare windows; first and last only.
    InsufficientSentences,
    Semantic,
    /// Embedding or similarity failed.
    EvenlySpaced,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicBoundaries {
    /// Ascending sentence indices, always starting at 0 and ending at N-1.
    pub indices: Vec<usize>,
    pub method: TopicMethod,
}

/// Find sentence indices where the subject changes.
///
/// Compares the mean embedding of each window of `window_size` sentences
/// with the window that follows it. A boundary is placed at the start of
/// the second window when similarity is under the threshold and lower than
/// at the previous position.
pub fn detect_topic_shifts(
    sentences: &[String],
    embedder: &dyn Embedder,
    params: &TopicParams,
) -> TopicBoundaries {
    let n = sentences.len();
    let w = params.window_size.max(1);

    if n == 0 {
        return TopicBoundaries {
            indices: Vec::new(),
            method: TopicMethod::InsufficientSentences,
        };
    }
    if n <= w.saturating_mul(2) {
        let mut indices = vec![0, n - 1];
        indices.dedup();
        return TopicBoundaries {
            indices,
            method: TopicMethod::InsufficientSentences,
        };
    }

    let similarities = embedder
        .embed(sentences)
        .and_then(|embeddings| window_similarities(&embeddings, n, w));

    match similarities {
        Ok(similarities) => TopicBoundaries {
            indices: local_dips(&similarities, n, w, params.similarity_threshold),
            method: TopicMethod::Semantic,
        },
        Err(e) => {
            tracing::warn!(
                "Topic detection with {} failed ({}), using evenly spaced boundaries",
                embedder.name(),
                e
            );
            TopicBoundaries {
                indices: evenly_spaced_boundaries(n),
                method: TopicMethod::EvenlySpaced,
            }
        }
    }
}

/// Cosine similarity between window `[i, i+w)` and `[i+w, i+2w)` for
/// every `i` in `0..n-w`. The second window is clipped at `n`.
pub fn window_similarities(embeddings: &[Vec<f32>], n: usize, w: usize) -> Result<Vec<f64>> {
    if embeddings.len() != n {
        return Err(DigestError::Similarity(format!(
            "expected {} embeddings, got {}",
            n,
            embeddings.len()
        )));
    }
    let dim = embeddings.first().map_or(0, Vec::len);
    if dim == 0 {
        return Err(DigestError::Similarity("zero-length embeddings".to_string()));
    }
    for (i, e) in embeddings.iter().enumerate() {
        if e.len() != dim {
            return Err(DigestError::Similarity(format!(
                "embedding {} has dimension {}, expected {}",
                i,
                e.len(),
                dim
            )));
        }
        if e.iter().any(|v| !v.is_finite()) {
            return Err(DigestError::Similarity(format!(
                "embedding {} contains non-finite values",
                i
            )));
        }
    }

    let mut similarities = Vec::with_capacity(n.saturating_sub(w));
    for i in 0..n.saturating_sub(w) {
        let first = mean(&embeddings[i..i + w]);
        let second = mean(&embeddings[i + w..(i + 2 * w).min(n)]);
        let sim = cosine(&first, &second);
        if !sim.is_finite() {
            return Err(DigestError::Similarity(format!(
                "non-finite similarity at window {}",
                i
            )));
        }
        tracing::debug!("window {} similarity {:.3}", i, sim);
        similarities.push(sim);
    }
    Ok(similarities)
}

fn local_dips(similarities: &[f64], n: usize, w: usize, threshold: f64) -> Vec<usize> {
    let mut indices = vec![0];
    for i in 1..similarities.len() {
        if similarities[i] < threshold && similarities[i] < similarities[i - 1] {
            let boundary = i + w;
            if boundary < n {
                indices.push(boundary);
            }
        }
    }
    indices.push(n - 1);
    indices.sort_unstable();
    indices.dedup();
    indices
}

fn mean(vectors: &[Vec<f32>]) -> Vec<f64> {
    let dim = vectors.first().map_or(0, Vec::len);
    let mut out = vec![0.0f64; dim];
    for v in vectors {
        for (acc, x) in out.iter_mut().zip(v) {
            *acc += f64::from(*x);
        }
    }
    let count = vectors.len().max(1) as f64;
    out.iter_mut().for_each(|x| *x /= count);
    out
}

/// Cosine similarity; a zero vector is dissimilar to everything.
fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Fallback boundaries: `clamp(n / 20, 3, 8)` evenly strided indices plus
/// the last sentence.
pub fn evenly_spaced_boundaries(n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let count = (n / 20).clamp(3, 8);
    let step = (n / count).max(1);
    let mut indices: Vec<usize> = (0..count).map(|k| k * step).filter(|&i| i < n).collect();
    indices.push(n - 1);
    indices.sort_unstable();
    indices.dedup();
    indices
}
