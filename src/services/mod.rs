pub mod recommendations;
pub mod similarity_cache;
pub mod stop_words;
pub mod tfidf;

pub use recommendations::{recommend, recommend_cached, DEFAULT_TOP_N};
pub use similarity_cache::{catalog_fingerprint, SimilarityCache};
pub use tfidf::{SimilarityMatrix, TfidfModel, VectorizeError};
