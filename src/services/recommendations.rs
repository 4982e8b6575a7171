use std::collections::HashSet;
use std::sync::Arc;

use crate::models::{ActivityRecord, ContentRecord, ContentType, Recommendation, RecordId};

use super::similarity_cache::SimilarityCache;
use super::tfidf::{SimilarityMatrix, TfidfModel, VectorizeError};

/// Default number of recommendations per request
pub const DEFAULT_TOP_N: usize = 5;

/// Score given to every popularity-ranked item
pub const COLD_START_SCORE: f64 = 0.5;

pub const POPULAR_REASON: &str = "Popular content you might enjoy";
pub const SIMILAR_REASON: &str = "Similar to content you've viewed";

/// Generates content recommendations for a user
///
/// Users without activity get the most viewed items. Everyone else gets the
/// items whose TF-IDF text is, on average, most similar to what they already
/// interacted with. Items the user interacted with are never returned.
///
/// Never fails: a catalog that cannot be vectorized yields an empty list.
pub fn recommend(
    user_id: &RecordId,
    catalog: &[ContentRecord],
    activity: &[ActivityRecord],
    top_n: usize,
) -> Vec<Recommendation> {
    recommend_with(user_id, catalog, activity, top_n, |catalog| {
        let documents: Vec<String> = catalog.iter().map(ContentRecord::document).collect();
        Ok(Arc::new(TfidfModel::fit(&documents)?.similarity_matrix()))
    })
}

/// Same as [`recommend`], reusing the similarity matrix while the catalog is unchanged
pub fn recommend_cached(
    cache: &SimilarityCache,
    user_id: &RecordId,
    catalog: &[ContentRecord],
    activity: &[ActivityRecord],
    top_n: usize,
) -> Vec<Recommendation> {
    recommend_with(user_id, catalog, activity, top_n, |catalog| {
        cache.get_or_compute(catalog)
    })
}

fn recommend_with<F>(
    user_id: &RecordId,
    catalog: &[ContentRecord],
    activity: &[ActivityRecord],
    top_n: usize,
    similarity: F,
) -> Vec<Recommendation>
where
    F: FnOnce(&[ContentRecord]) -> Result<Arc<SimilarityMatrix>, VectorizeError>,
{
    if catalog.is_empty() || top_n == 0 {
        return Vec::new();
    }

    let user_activity: Vec<&ActivityRecord> =
        activity.iter().filter(|a| &a.user_id == user_id).collect();

    if user_activity.is_empty() {
        tracing::debug!(user_id = %user_id, "No activity for user, ranking by popularity");
        return popular_content(catalog, top_n);
    }

    match similar_content(catalog, &user_activity, top_n, similarity) {
        Ok(recommendations) => recommendations,
        Err(e) => {
            tracing::warn!(
                user_id = %user_id,
                catalog_size = catalog.len(),
                error = %e,
                "Content similarity failed, returning no recommendations"
            );
            Vec::new()
        }
    }
}

/// Cold start: most viewed first, catalog order on ties
fn popular_content(catalog: &[ContentRecord], top_n: usize) -> Vec<Recommendation> {
    let mut ranked: Vec<&ContentRecord> = catalog.iter().collect();
    ranked.sort_by(|a, b| b.view_count.cmp(&a.view_count));

    ranked
        .into_iter()
        .take(top_n)
        .map(|content| Recommendation {
            content_id: content.id.to_string(),
            score: COLD_START_SCORE,
            reason: POPULAR_REASON.to_string(),
        })
        .collect()
}

fn similar_content<F>(
    catalog: &[ContentRecord],
    user_activity: &[&ActivityRecord],
    top_n: usize,
    similarity: F,
) -> Result<Vec<Recommendation>, VectorizeError>
where
    F: FnOnce(&[ContentRecord]) -> Result<Arc<SimilarityMatrix>, VectorizeError>,
{
    let preferred_type = preferred_content_type(catalog, user_activity);
    let matrix = similarity(catalog)?;

    let seen: HashSet<&RecordId> = user_activity.iter().map(|a| &a.content_id).collect();
    let seen_indices: Vec<usize> = catalog
        .iter()
        .enumerate()
        .filter(|(_, content)| seen.contains(&content.id))
        .map(|(i, _)| i)
        .collect();

    let mut scores = vec![0.0; catalog.len()];
    for &i in &seen_indices {
        for (score, sim) in scores.iter_mut().zip(matrix.row(i)) {
            *score += sim;
        }
    }
    if !seen_indices.is_empty() {
        let count = seen_indices.len() as f64;
        scores.iter_mut().for_each(|s| *s /= count);
    }

    let mut candidates: Vec<(usize, f64)> = scores
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !seen.contains(&catalog[*i].id))
        .collect();
    candidates.sort_by(|a, b| b.1.total_cmp(&a.1));

    let recommendations = candidates
        .into_iter()
        .take(top_n)
        .map(|(i, score)| {
            let content = &catalog[i];
            let reason = match preferred_type {
                Some(preferred) if content.content_type == preferred => {
                    format!("Based on your interest in {}s", preferred)
                }
                _ => SIMILAR_REASON.to_string(),
            };

            Recommendation {
                content_id: content.id.to_string(),
                score: clamp_score(score),
                reason,
            }
        })
        .collect();

    Ok(recommendations)
}

/// Most frequent content type across the user's activity
///
/// Uses the type recorded on the activity when present, otherwise the type
/// of the referenced catalog item. Ties go to the type seen first.
fn preferred_content_type(
    catalog: &[ContentRecord],
    user_activity: &[&ActivityRecord],
) -> Option<ContentType> {
    let mut counts: Vec<(ContentType, usize)> = Vec::new();

    for activity in user_activity {
        let content_type = activity.content_type.or_else(|| {
            catalog
                .iter()
                .find(|c| c.id == activity.content_id)
                .map(|c| c.content_type)
        });

        let Some(content_type) = content_type else {
            continue;
        };

        match counts.iter_mut().find(|(t, _)| *t == content_type) {
            Some((_, count)) => *count += 1,
            None => counts.push((content_type, 1)),
        }
    }

    let mut preferred: Option<(ContentType, usize)> = None;
    for (content_type, count) in counts {
        if preferred.map_or(true, |(_, best)| count > best) {
            preferred = Some((content_type, count));
        }
    }

    preferred.map(|(content_type, _)| content_type)
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Action;

    fn view(user: i64, content: i64) -> ActivityRecord {
        ActivityRecord::new(user, content, Action::View)
    }

    fn empires() -> Vec<ContentRecord> {
        vec![
            ContentRecord::new(1, "Mali Empire", "gold trade kingdom", ContentType::Video)
                .with_tags(["mali", "empire"])
                .with_view_count(300),
            ContentRecord::new(2, "Songhai Empire", "trade kingdom on the Niger", ContentType::Video)
                .with_tags(["songhai", "empire"])
                .with_view_count(50),
            ContentRecord::new(3, "Benin Bronzes", "cast brass plaques", ContentType::Artifact)
                .with_tags(["benin"])
                .with_view_count(900),
            ContentRecord::new(4, "Ghana Empire", "gold trade", ContentType::Book)
                .with_tags(["ghana", "empire"])
                .with_view_count(10),
        ]
    }

    #[test]
    fn test_cold_start_ranks_by_view_count() {
        let recs = recommend(&RecordId::from(7), &empires(), &[], 3);
        let ids: Vec<&str> = recs.iter().map(|r| r.content_id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "2"]);
        assert!(recs.iter().all(|r| r.score == COLD_START_SCORE && r.reason == POPULAR_REASON));
    }

    #[test]
    fn test_cold_start_ties_keep_catalog_order() {
        let catalog = vec![
            ContentRecord::new("a", "One", "", ContentType::Book).with_view_count(5),
            ContentRecord::new("b", "Two", "", ContentType::Book).with_view_count(5),
            ContentRecord::new("c", "Three", "", ContentType::Book).with_view_count(5),
        ];
        let recs = recommend(&RecordId::from("u"), &catalog, &[], 5);
        let ids: Vec<&str> = recs.iter().map(|r| r.content_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_cold_start_ignores_other_users_activity() {
        let recs = recommend(&RecordId::from(7), &empires(), &[view(8, 3)], 1);
        assert_eq!(recs[0].content_id, "3");
        assert_eq!(recs[0].reason, POPULAR_REASON);
    }

    #[test]
    fn test_similar_content_ranks_shared_vocabulary_first() {
        let recs = recommend(&RecordId::from(7), &empires(), &[view(7, 1)], 5);
        let ids: Vec<&str> = recs.iter().map(|r| r.content_id.as_str()).collect();

        assert_eq!(ids.len(), 3);
        assert!(!ids.contains(&"1"));
        // Ghana shares "gold trade empire", Songhai "trade kingdom empire", Benin nothing
        assert_eq!(ids[2], "3");
        assert_eq!(recs[2].score, 0.0);
        assert!(recs[0].score > 0.0 && recs[1].score > 0.0);
    }

    #[test]
    fn test_reason_uses_preferred_type() {
        let recs = recommend(&RecordId::from(7), &empires(), &[view(7, 1)], 5);
        for rec in &recs {
            if rec.content_id == "2" {
                assert_eq!(rec.reason, "Based on your interest in videos");
            } else {
                assert_eq!(rec.reason, SIMILAR_REASON);
            }
        }
    }

    #[test]
    fn test_preferred_type_prefers_recorded_activity_type() {
        let catalog = empires();
        let activity = view(7, 1).with_content_type(ContentType::Book);
        let preferred = preferred_content_type(&catalog, &[&activity]);
        assert_eq!(preferred, Some(ContentType::Book));
    }

    #[test]
    fn test_preferred_type_ties_go_to_first_seen() {
        let catalog = empires();
        let activity = [view(7, 4), view(7, 1), view(7, 2), view(7, 4)];
        let refs: Vec<&ActivityRecord> = activity.iter().collect();
        assert_eq!(preferred_content_type(&catalog, &refs), Some(ContentType::Book));
    }

    #[test]
    fn test_preferred_type_skips_unknown_content() {
        let catalog = empires();
        let activity = [view(7, 99)];
        let refs: Vec<&ActivityRecord> = activity.iter().collect();
        assert_eq!(preferred_content_type(&catalog, &refs), None);
    }

    #[test]
    fn test_activity_for_unknown_content_scores_zero() {
        let recs = recommend(&RecordId::from(7), &empires(), &[view(7, 99)], 2);
        let ids: Vec<&str> = recs.iter().map(|r| r.content_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert!(recs.iter().all(|r| r.score == 0.0 && r.reason == SIMILAR_REASON));
    }

    #[test]
    fn test_everything_seen_returns_empty() {
        let activity: Vec<ActivityRecord> = (1..=4).map(|c| view(7, c)).collect();
        assert!(recommend(&RecordId::from(7), &empires(), &activity, 5).is_empty());
    }

    #[test]
    fn test_repeated_activity_counts_item_once() {
        let once = recommend(&RecordId::from(7), &empires(), &[view(7, 1)], 5);
        let twice = recommend(&RecordId::from(7), &empires(), &[view(7, 1), view(7, 1)], 5);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_catalog_returns_empty() {
        assert!(recommend(&RecordId::from(7), &[], &[view(7, 1)], 5).is_empty());
        assert!(recommend(&RecordId::from(7), &[], &[], 5).is_empty());
    }

    #[test]
    fn test_zero_top_n_returns_empty() {
        assert!(recommend(&RecordId::from(7), &empires(), &[], 0).is_empty());
    }

    #[test]
    fn test_empty_vocabulary_returns_empty() {
        let catalog = vec![
            ContentRecord::new(1, "The", "and of", ContentType::Article),
            ContentRecord::new(2, "Which", "is a", ContentType::Article),
        ];
        assert!(recommend(&RecordId::from(7), &catalog, &[view(7, 1)], 5).is_empty());
    }

    #[test]
    fn test_cached_matches_uncached() {
        let cache = SimilarityCache::new();
        let activity = [view(7, 1), view(7, 3)];
        let fresh = recommend(&RecordId::from(7), &empires(), &activity, 5);
        let cached = recommend_cached(&cache, &RecordId::from(7), &empires(), &activity, 5);
        let cached_again = recommend_cached(&cache, &RecordId::from(7), &empires(), &activity, 5);
        assert_eq!(fresh, cached);
        assert_eq!(cached, cached_again);
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(1.0000001), 1.0);
        assert_eq!(clamp_score(-0.2), 0.0);
        assert_eq!(clamp_score(f64::NAN), 0.0);
        assert_eq!(clamp_score(0.42), 0.42);
    }
}
