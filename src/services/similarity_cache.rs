use std::sync::{Arc, PoisonError, RwLock};

use uuid::Uuid;

use super::tfidf::{SimilarityMatrix, TfidfModel, VectorizeError};
use crate::models::ContentRecord;

/// Stable fingerprint of a catalog snapshot
///
/// Covers item order, ids and the text that feeds vectorization, so two
/// snapshots with the same fingerprint produce the same similarity matrix.
pub fn catalog_fingerprint(catalog: &[ContentRecord]) -> Uuid {
    let mut bytes = Vec::new();
    for record in catalog {
        push_field(&mut bytes, record.id.as_str().as_bytes());
        push_field(&mut bytes, record.document().as_bytes());
    }
    Uuid::new_v5(&Uuid::NAMESPACE_OID, &bytes)
}

/// Appends a length-prefixed field so no field content can shift a boundary
pub(crate) fn push_field(bytes: &mut Vec<u8>, field: &[u8]) {
    bytes.extend_from_slice(&(field.len() as u64).to_be_bytes());
    bytes.extend_from_slice(field);
}

/// Keeps the similarity matrix of the most recently seen catalog
///
/// Lookups happen on the blocking pool, hence the std lock.
#[derive(Default)]
pub struct SimilarityCache {
    latest: RwLock<Option<(Uuid, Arc<SimilarityMatrix>)>>,
}

impl SimilarityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached matrix for this catalog or computes and stores it
    pub fn get_or_compute(
        &self,
        catalog: &[ContentRecord],
    ) -> Result<Arc<SimilarityMatrix>, VectorizeError> {
        let fingerprint = catalog_fingerprint(catalog);

        {
            let latest = self.latest.read().unwrap_or_else(PoisonError::into_inner);
            if let Some((cached, matrix)) = latest.as_ref() {
                if *cached == fingerprint {
                    tracing::debug!(%fingerprint, "Similarity cache hit");
                    return Ok(Arc::clone(matrix));
                }
            }
        }

        tracing::debug!(%fingerprint, items = catalog.len(), "Similarity cache miss");
        let documents: Vec<String> = catalog.iter().map(ContentRecord::document).collect();
        let matrix = Arc::new(TfidfModel::fit(&documents)?.similarity_matrix());

        let mut latest = self.latest.write().unwrap_or_else(PoisonError::into_inner);
        *latest = Some((fingerprint, Arc::clone(&matrix)));

        Ok(matrix)
    }

    pub fn fingerprint(&self) -> Option<Uuid> {
        self.latest
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(fingerprint, _)| *fingerprint)
    }
}
