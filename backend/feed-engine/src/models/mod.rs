use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Post snapshot used by every ranking strategy. Identity is `uri`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankablePost {
    pub uri: String,
    pub created_at: DateTime<Utc>,
    pub like_count: u32,
    pub downvote_count: u32,
    pub reply_count: u32,
    pub repost_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingStrategy {
    Newest,
    Trending,
    Wilson,
    Score,
    Controversial,
}

impl RankingStrategy {
    pub const ALL: [RankingStrategy; 5] = [
        RankingStrategy::Newest,
        RankingStrategy::Trending,
        RankingStrategy::Wilson,
        RankingStrategy::Score,
        RankingStrategy::Controversial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RankingStrategy::Newest => "newest",
            RankingStrategy::Trending => "trending",
            RankingStrategy::Wilson => "wilson",
            RankingStrategy::Score => "score",
            RankingStrategy::Controversial => "controversial",
        }
    }
}

impl fmt::Display for RankingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================
// Feed remixing
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    pub uri: String,
    pub created_at: DateTime<Utc>,
}

/// One already-fetched page from a feed source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSlice {
    pub source_key: String,
    /// 0..=100, need not sum to 100 across slices
    pub percent_weight: u32,
    pub items: Vec<FeedItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemixResult {
    pub items: Vec<FeedItem>,
    /// sourceKey -> cursor for the caller's next fetch
    pub next_cursors: BTreeMap<String, String>,
}

// ============================================
// Masonry layout
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    pub uri: String,
    pub has_media: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<f64>,
    pub text_length: u32,
    pub image_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnAssignment {
    pub uri: String,
    pub column: usize,
    pub estimated_height: f64,
}

// ============================================
// Consensus (Polis-style)
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub id: String,
    pub text: String,
}

/// Ternary vote: 1 = agree, -1 = disagree, 0 = pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub voter_id: String,
    pub statement_id: String,
    pub value: i8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementConsensus {
    pub statement_id: String,
    pub agree_count: u32,
    pub disagree_count: u32,
    pub pass_count: u32,
    pub total_voters: u32,
    /// agree / (agree + disagree), 0 when nobody took a side
    pub agreement_ratio: f64,
    /// 0 = unanimous or silent, peaks when split evenly
    pub divisiveness: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpinionCluster {
    pub id: u32,
    pub member_count: u32,
    pub member_ids: Vec<String>,
    pub avg_agreement: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    pub statements: Vec<StatementConsensus>,
    pub total_participants: u32,
    pub cluster_count: u32,
    pub clusters: Vec<OpinionCluster>,
}

// ============================================
// Vote tallies and forum threads
// ============================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCount {
    pub uri: String,
    pub likes: u32,
    pub downvotes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub uri: String,
    pub net_score: i64,
    pub like_ratio: f64,
    pub total_votes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForumThread {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub reply_count: u32,
    pub like_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reply_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_pinned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_post_uses_camel_case_fields() {
        let post: RankablePost = serde_json::from_value(json!({
            "uri": "at://did:plc:abc/app.bsky.feed.post/1",
            "createdAt": "2025-01-15T12:00:00Z",
            "likeCount": 3,
            "downvoteCount": 1,
            "replyCount": 0,
            "repostCount": 2
        }))
        .unwrap();

        assert_eq!(post.like_count, 3);
        assert_eq!(post.created_at.timestamp(), 1_736_942_400);
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let result = serde_json::from_value::<RankablePost>(json!({
            "uri": "a",
            "createdAt": "2025-01-15T12:00:00Z",
            "likeCount": -1,
            "downvoteCount": 0,
            "replyCount": 0,
            "repostCount": 0
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_strategy_names() {
        for strategy in RankingStrategy::ALL {
            let encoded = serde_json::to_value(strategy).unwrap();
            assert_eq!(encoded, json!(strategy.as_str()));
        }
        let parsed: RankingStrategy = serde_json::from_str("\"controversial\"").unwrap();
        assert_eq!(parsed, RankingStrategy::Controversial);
    }

    #[test]
    fn test_slice_cursor_is_optional() {
        let slice: FeedSlice = serde_json::from_value(json!({
            "sourceKey": "following",
            "percentWeight": 60,
            "items": []
        }))
        .unwrap();
        assert_eq!(slice.next_cursor, None);
    }
}
