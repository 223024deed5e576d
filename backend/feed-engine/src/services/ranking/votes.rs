use super::scoring::net_score;
use crate::models::{VoteCount, VoteSummary};

/// Net score, like ratio and total for each post, input order preserved.
pub fn score_votes(counts: &[VoteCount]) -> Vec<VoteSummary> {
    counts
        .iter()
        .map(|count| {
            let total = u64::from(count.likes) + u64::from(count.downvotes);
            VoteSummary {
                uri: count.uri.clone(),
                net_score: net_score(count.likes, count.downvotes),
                like_ratio: if total > 0 {
                    count.likes as f64 / total as f64
                } else {
                    0.0
                },
                total_votes: total,
            }
        })
        .collect()
}
