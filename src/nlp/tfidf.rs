use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{DigestError, Result};
use crate::nlp::embedding::Embedder;
use crate::nlp::stopwords::is_stop_word;

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("token pattern is valid"))
}

fn tokenize(text: &str) -> Vec<String> {
    token_re()
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Local embedder: TF-IDF vectors fitted on the batch being embedded.
///
/// Uses smoothed idf, `ln((1 + n) / (1 + df)) + 1`, and L2-normalized rows,
/// so cosine similarity reduces to a dot product.
#[derive(Debug, Default, Clone)]
pub struct TfIdfEmbedder;

impl Embedder for TfIdfEmbedder {
    fn name(&self) -> &str {
        "tfidf"
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let docs: Vec<Vec<String>> = texts.iter().map(|t| tokenize(t)).collect();

        let mut document_frequency: BTreeMap<&str, usize> = BTreeMap::new();
        for doc in &docs {
            let mut seen: Vec<&str> = doc.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        if document_frequency.is_empty() {
            return Err(DigestError::Embedding(
                "empty vocabulary; texts contain only stop words".to_string(),
            ));
        }

        let n = docs.len() as f32;
        let columns: HashMap<&str, (usize, f32)> = document_frequency
            .iter()
            .enumerate()
            .map(|(col, (term, &df))| {
                let idf = ((1.0 + n) / (1.0 + df as f32)).ln() + 1.0;
                (*term, (col, idf))
            })
            .collect();

        let vectors = docs
            .iter()
            .map(|doc| {
                let mut row = vec![0.0f32; columns.len()];
                for term in doc {
                    if let Some(&(col, idf)) = columns.get(term.as_str()) {
                        row[col] += idf;
                    }
                }
                let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
                if norm > 0.0 {
                    row.iter_mut().for_each(|v| *v /= norm);
                }
                row
            })
            .collect();

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_rows_are_unit_length_and_share_dimension() {
        let vectors = TfIdfEmbedder
            .embed(&texts(&["rust compilers borrow", "python interpreters", "rust borrow checker"]))
            .unwrap();
        assert_eq!(vectors.len(), 3);
        assert!(vectors.iter().all(|v| v.len() == vectors[0].len()));
        for v in &vectors {
            assert!((dot(v, v) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_related_texts_score_higher() {
        let vectors = TfIdfEmbedder
            .embed(&texts(&["rust borrow checker", "rust borrow rules", "baking sourdough bread"]))
            .unwrap();
        assert!(dot(&vectors[0], &vectors[1]) > dot(&vectors[0], &vectors[2]));
        assert_eq!(dot(&vectors[0], &vectors[2]), 0.0);
    }

    #[test]
    fn test_stop_word_only_row_is_zero() {
        let vectors = TfIdfEmbedder.embed(&texts(&["the and of", "rust crates"])).unwrap();
        assert!(vectors[0].iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_empty_vocabulary_is_an_error() {
        let err = TfIdfEmbedder.embed(&texts(&["the a", "of to"])).unwrap_err();
        assert!(matches!(err, DigestError::Embedding(_)));
    }
}
