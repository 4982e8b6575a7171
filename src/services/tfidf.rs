use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use super::stop_words::is_stop_word;

/// Error types for text vectorization
#[derive(Debug, Error, PartialEq)]
pub enum VectorizeError {
    #[error("empty vocabulary: documents contain only stop words or no terms")]
    EmptyVocabulary,
}

/// Sparse row: (term index, weight) pairs sorted by term index
type SparseRow = Vec<(usize, f64)>;

/// TF-IDF weights fitted over a fixed set of documents
///
/// Uses raw term counts, smoothed idf `ln((1 + n) / (1 + df)) + 1` and
/// L2-normalized rows, so the dot product of two rows is their cosine similarity.
#[derive(Debug, Clone)]
pub struct TfidfModel {
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    rows: Vec<SparseRow>,
}

impl TfidfModel {
    /// Learns the vocabulary and idf weights and vectorizes every document
    pub fn fit<S: AsRef<str>>(documents: &[S]) -> Result<Self, VectorizeError> {
        let tokenized: Vec<Vec<String>> = documents.iter().map(|d| tokenize(d.as_ref())).collect();

        let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
        for tokens in &tokenized {
            let unique: BTreeSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(VectorizeError::EmptyVocabulary);
        }

        let n_docs = documents.len() as f64;
        let vocabulary: Vec<String> = doc_freq.keys().map(|t| t.to_string()).collect();
        let idf: Vec<f64> = doc_freq
            .values()
            .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        let index: BTreeMap<&str, usize> = doc_freq
            .keys()
            .enumerate()
            .map(|(i, term)| (*term, i))
            .collect();

        let rows = tokenized
            .iter()
            .map(|tokens| {
                let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
                for token in tokens {
                    // every token was counted into doc_freq above
                    if let Some(&i) = index.get(token.as_str()) {
                        *counts.entry(i).or_insert(0.0) += 1.0;
                    }
                }
                let weighted: SparseRow = counts.into_iter().map(|(i, tf)| (i, tf * idf[i])).collect();
                normalize(weighted)
            })
            .collect();

        Ok(Self {
            vocabulary,
            idf,
            rows,
        })
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Cosine similarity between documents `a` and `b`
    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        sparse_dot(&self.rows[a], &self.rows[b])
    }

    /// Dense pairwise cosine similarity between every pair of documents
    pub fn similarity_matrix(&self) -> SimilarityMatrix {
        let n = self.rows.len();
        let mut values = vec![0.0; n * n];

        for i in 0..n {
            for j in i..n {
                let sim = self.similarity(i, j);
                values[i * n + j] = sim;
                values[j * n + i] = sim;
            }
        }

        SimilarityMatrix { size: n, values }
    }
}

/// Square, symmetric similarity matrix stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    size: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.size..(i + 1) * self.size]
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.size + j]
    }
}

/// Lowercases and splits on anything that is not a word character, dropping
/// single-character tokens and stop words
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|t| t.chars().count() >= 2)
        .filter(|t| !is_stop_word(t))
        .map(str::to_string)
        .collect()
}

fn normalize(mut row: SparseRow) -> SparseRow {
    let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in row.iter_mut() {
            *w /= norm;
        }
    }
    row
}

fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;

    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }

    dot
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_tokenize_lowercases_and_drops_stop_words() {
        let tokens = tokenize("The Rise of the MALI Empire, a kingdom!");
        assert_eq!(tokens, vec!["rise", "mali", "empire", "kingdom"]);
    }

    #[test]
    fn test_tokenize_drops_single_characters() {
        assert_eq!(tokenize("x y z ab"), vec!["ab"]);
    }

    #[test]
    fn test_tokenize_splits_on_combining_marks() {
        assert_eq!(tokenize("cafe\u{301} menu"), vec!["cafe", "menu"]);
        assert_eq!(tokenize("caf\u{e9} menu"), vec!["caf\u{e9}", "menu"]);
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let model = TfidfModel::fit(&["zulu kingdom", "ashanti gold"]).unwrap();
        assert_eq!(model.vocabulary(), &["ashanti", "gold", "kingdom", "zulu"]);
    }

    #[test]
    fn test_smoothed_idf() {
        let model = TfidfModel::fit(&["mali gold", "mali salt"]).unwrap();
        let mali = model.vocabulary().iter().position(|t| t == "mali").unwrap();
        let gold = model.vocabulary().iter().position(|t| t == "gold").unwrap();
        assert!((model.idf()[mali] - 1.0).abs() < EPS);
        assert!((model.idf()[gold] - ((3.0f64 / 2.0).ln() + 1.0)).abs() < EPS);
    }

    #[test]
    fn test_identical_documents_have_unit_similarity() {
        let model = TfidfModel::fit(&["great zimbabwe stone", "great zimbabwe stone"]).unwrap();
        assert!((model.similarity(0, 1) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_disjoint_documents_have_zero_similarity() {
        let model = TfidfModel::fit(&["mali kingdom", "zimbabwe architecture"]).unwrap();
        assert_eq!(model.similarity(0, 1), 0.0);
    }

    #[test]
    fn test_similarity_matrix_is_symmetric_with_unit_diagonal() {
        let model = TfidfModel::fit(&[
            "mali empire gold trade",
            "songhai empire trade routes",
            "benin bronze artifacts",
        ])
        .unwrap();
        let matrix = model.similarity_matrix();

        assert_eq!(matrix.size(), 3);
        for i in 0..3 {
            assert!((matrix.get(i, i) - 1.0).abs() < EPS);
            for j in 0..3 {
                assert!((matrix.get(i, j) - matrix.get(j, i)).abs() < EPS);
                assert!(matrix.get(i, j) >= 0.0 && matrix.get(i, j) <= 1.0 + EPS);
            }
        }
        assert!(matrix.get(0, 1) > 0.0);
        assert_eq!(matrix.get(0, 2), 0.0);
    }

    #[test]
    fn test_document_without_terms_has_zero_row() {
        let model = TfidfModel::fit(&["mali empire", "the and of"]).unwrap();
        let matrix = model.similarity_matrix();
        assert_eq!(matrix.row(1), &[0.0, 0.0]);
    }

    #[test]
    fn test_stop_word_only_documents_fail() {
        let result = TfidfModel::fit(&["the and of", "which is"]);
        assert_eq!(result.unwrap_err(), VectorizeError::EmptyVocabulary);
    }

    #[test]
    fn test_no_documents_fail() {
        let docs: Vec<String> = Vec::new();
        assert!(TfidfModel::fit(&docs).is_err());
    }
}
