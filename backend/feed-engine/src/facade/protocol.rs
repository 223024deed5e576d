/// JSON contract for running the engine behind a process or language boundary.
///
/// Requests are tagged by `op`:
/// `{"op": "rank", "posts": [...], "strategy": "wilson", "now": "2025-01-15T12:00:00Z"}`
///
/// `now` accepts either an RFC 3339 string or epoch milliseconds.
use crate::error::{EngineError, Result};
use crate::models::{
    ColumnAssignment, ConsensusResult, FeedSlice, ForumThread, LayoutItem, RankablePost,
    RankingStrategy, RemixResult, Statement, Vote, VoteCount, VoteSummary,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum EngineRequest {
    Rank {
        posts: Vec<RankablePost>,
        strategy: RankingStrategy,
        now: Timestamp,
    },
    Remix {
        slices: Vec<FeedSlice>,
        limit: usize,
    },
    DistributeColumns {
        items: Vec<LayoutItem>,
        columns: usize,
    },
    AnalyzeConsensus {
        votes: Vec<Vote>,
        #[serde(default)]
        statements: Vec<Statement>,
    },
    ScoreVotes {
        counts: Vec<VoteCount>,
    },
    RankThreads {
        threads: Vec<ForumThread>,
        now: Timestamp,
    },
}

impl EngineRequest {
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn op(&self) -> &'static str {
        match self {
            EngineRequest::Rank { .. } => "rank",
            EngineRequest::Remix { .. } => "remix",
            EngineRequest::DistributeColumns { .. } => "distributeColumns",
            EngineRequest::AnalyzeConsensus { .. } => "analyzeConsensus",
            EngineRequest::ScoreVotes { .. } => "scoreVotes",
            EngineRequest::RankThreads { .. } => "rankThreads",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngineResponse {
    Posts(Vec<RankablePost>),
    Remix(RemixResult),
    Columns(Vec<ColumnAssignment>),
    Consensus(ConsensusResult),
    VoteSummaries(Vec<VoteSummary>),
    Threads(Vec<ForumThread>),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(f64),
    Rfc3339(DateTime<Utc>),
}

impl Timestamp {
    pub fn resolve(&self) -> Result<DateTime<Utc>> {
        match *self {
            Timestamp::Rfc3339(ts) => Ok(ts),
            Timestamp::Millis(ms) => {
                if !ms.is_finite() {
                    return Err(EngineError::invalid(format!("timestamp {ms} is not finite")));
                }
                DateTime::from_timestamp_millis(ms as i64).ok_or_else(|| {
                    EngineError::invalid(format!("timestamp {ms} is out of range"))
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rank_request() {
        let request = EngineRequest::parse(
            r#"{"op":"rank","posts":[],"strategy":"trending","now":1736942400000}"#,
        )
        .unwrap();

        match request {
            EngineRequest::Rank { strategy, now, .. } => {
                assert_eq!(strategy, RankingStrategy::Trending);
                assert_eq!(now.resolve().unwrap().timestamp(), 1_736_942_400);
            }
            other => panic!("unexpected request {}", other.op()),
        }
    }

    #[test]
    fn test_parse_rfc3339_now() {
        let request = EngineRequest::parse(
            r#"{"op":"rankThreads","threads":[],"now":"2025-01-15T12:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(request.op(), "rankThreads");
    }

    #[test]
    fn test_statements_default_to_empty() {
        let request = EngineRequest::parse(
            r#"{"op":"analyzeConsensus","votes":[{"voterId":"u","statementId":"s","value":1}]}"#,
        )
        .unwrap();

        match request {
            EngineRequest::AnalyzeConsensus { votes, statements } => {
                assert_eq!(votes.len(), 1);
                assert!(statements.is_empty());
            }
            other => panic!("unexpected request {}", other.op()),
        }
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let err = EngineRequest::parse(r#"{"op":"explode"}"#).unwrap_err();
        assert!(matches!(err, EngineError::Serialization(_)));
    }

    #[test]
    fn test_non_finite_millis_rejected() {
        assert!(Timestamp::Millis(f64::NAN).resolve().is_err());
        assert!(Timestamp::Millis(1e300).resolve().is_err());
    }
}
