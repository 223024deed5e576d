use super::scoring::score_post;
use crate::models::{RankablePost, RankingStrategy};
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use tracing::debug;

/// Rank Sorter: score every post with `strategy` and return the permuted list.
///
/// Order is score descending, then `uri` ascending, so the result is a total
/// order and `rank_posts(rank_posts(p)) == rank_posts(p)`. No filtering.
pub fn rank_posts(
    posts: Vec<RankablePost>,
    strategy: RankingStrategy,
    now: &DateTime<Utc>,
) -> Vec<RankablePost> {
    let scores: Vec<f64> = posts
        .iter()
        .map(|post| score_post(post, strategy, now))
        .collect();

    debug!(
        strategy = %strategy,
        post_count = posts.len(),
        "Ranking posts"
    );

    order_by_scores(posts, &scores, |post| post.uri.as_str())
}

/// Permute `items` by `scores` (descending) with an ascending key tie-break.
///
/// `scores[i]` belongs to `items[i]`. Shared by every backend so the
/// tie-break never differs between them.
pub fn order_by_scores<T, K>(items: Vec<T>, scores: &[f64], key: K) -> Vec<T>
where
    K: Fn(&T) -> &str,
{
    debug_assert_eq!(items.len(), scores.len());

    let mut scored: Vec<(f64, T)> = scores.iter().copied().zip(items).collect();
    scored.sort_by(|(score_a, a), (score_b, b)| compare_desc(*score_a, *score_b, key(a), key(b)));
    scored.into_iter().map(|(_, item)| item).collect()
}

/// Higher score first, then key ascending.
pub fn compare_desc(score_a: f64, score_b: f64, key_a: &str, key_b: &str) -> Ordering {
    score_b
        .total_cmp(&score_a)
        .then_with(|| key_a.cmp(key_b))
}
