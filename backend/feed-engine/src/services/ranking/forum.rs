use super::sorter::compare_desc;
use crate::models::ForumThread;
use crate::utils::age_hours;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;

/// Recency decay exponent for thread activity.
const ACTIVITY_GRAVITY: f64 = 1.2;

/// Replies count double; age is measured from the last reply when there is one.
pub fn activity_score(thread: &ForumThread, now: &DateTime<Utc>) -> f64 {
    let engagement = 2.0 * thread.reply_count as f64 + thread.like_count as f64;
    let last_active = thread.last_reply_at.as_ref().unwrap_or(&thread.created_at);
    let age = age_hours(now, last_active).max(1.0);
    engagement / age.powf(ACTIVITY_GRAVITY)
}

/// Pinned threads first, then activity score descending, then `id`.
pub fn rank_threads(threads: Vec<ForumThread>, now: &DateTime<Utc>) -> Vec<ForumThread> {
    let mut scored: Vec<(f64, ForumThread)> = threads
        .into_iter()
        .map(|thread| (activity_score(&thread, now), thread))
        .collect();

    scored.sort_by(|(score_a, a), (score_b, b)| match (a.is_pinned, b.is_pinned) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => compare_desc(*score_a, *score_b, &a.id, &b.id),
    });

    scored.into_iter().map(|(_, thread)| thread).collect()
}
