/// Scoring Library
///
/// Pure per-post score functions, one per ranking strategy. Higher scores
/// sort earlier; ties are resolved by the sorter, never here.
use crate::models::{RankablePost, RankingStrategy};
use crate::utils::{age_hours, epoch_millis};
use chrono::{DateTime, Utc};

/// z for a 95% confidence interval
pub const WILSON_Z: f64 = 1.96;

/// Score a single post under `strategy`.
///
/// `now` only matters for `trending`; it is explicit so repeated calls agree.
pub fn score_post(post: &RankablePost, strategy: RankingStrategy, now: &DateTime<Utc>) -> f64 {
    match strategy {
        RankingStrategy::Newest => newest_score(post),
        RankingStrategy::Trending => trending_score(post, now),
        RankingStrategy::Wilson => {
            let likes = u64::from(post.like_count);
            wilson_lower_bound(likes, likes + u64::from(post.downvote_count))
        }
        RankingStrategy::Score => net_score(post.like_count, post.downvote_count) as f64,
        RankingStrategy::Controversial => {
            controversy_score(post.like_count, post.downvote_count)
        }
    }
}

pub fn newest_score(post: &RankablePost) -> f64 {
    epoch_millis(&post.created_at)
}

/// `(likes + reposts) / max(1, ageHours)`
pub fn trending_score(post: &RankablePost, now: &DateTime<Utc>) -> f64 {
    let engagement = post.like_count as f64 + post.repost_count as f64;
    engagement / age_hours(now, &post.created_at).max(1.0)
}

pub fn net_score(likes: u32, downvotes: u32) -> i64 {
    likes as i64 - downvotes as i64
}

/// Wilson score interval lower bound for `likes` successes out of `total`.
///
/// Returns 0.0 when there are no votes. A single like scores well below a
/// long run of consistent likes, unlike the raw ratio.
pub fn wilson_lower_bound(likes: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }

    let n = total as f64;
    let p = likes as f64 / n;
    let z2 = WILSON_Z * WILSON_Z;

    let denominator = 1.0 + z2 / n;
    let center = p + z2 / (2.0 * n);
    let spread = WILSON_Z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();

    (center - spread) / denominator
}

/// `total × (1 − 2·|ratio − 0.5|)`, 0 when nobody voted.
pub fn controversy_score(ups: u32, downs: u32) -> f64 {
    let total = ups as f64 + downs as f64;
    if total == 0.0 {
        return 0.0;
    }
    total * balance(ups, downs)
}

/// `1 − 2·|ups/(ups+downs) − 0.5|`: 1 for an even split, 0 for unanimity.
pub fn balance(ups: u32, downs: u32) -> f64 {
    let total = ups as f64 + downs as f64;
    if total == 0.0 {
        return 0.0;
    }
    let ratio = ups as f64 / total;
    1.0 - 2.0 * (ratio - 0.5).abs()
}
