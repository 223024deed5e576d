// ============================================
// Consensus Engine (Polis-style)
// ============================================
//
// Per-statement agree/disagree/pass aggregates plus opinion clusters of
// voters with similar vote vectors. Every call recomputes from scratch.

pub mod clustering;
pub mod matrix;

pub use clustering::{assign_clusters, ClusterAssignment};
pub use matrix::VoteMatrix;

use crate::config::ClusteringConfig;
use crate::error::Result;
use crate::models::{ConsensusResult, OpinionCluster, Statement, StatementConsensus, Vote};
use crate::services::ranking::scoring::balance;
use tracing::debug;

pub fn analyze_consensus(votes: &[Vote], config: &ClusteringConfig) -> Result<ConsensusResult> {
    analyze_consensus_with_statements(&[], votes, config)
}

/// Like [`analyze_consensus`], but reports every known statement, including
/// ones nobody voted on, in the order given.
pub fn analyze_consensus_with_statements(
    statements: &[Statement],
    votes: &[Vote],
    config: &ClusteringConfig,
) -> Result<ConsensusResult> {
    let matrix = VoteMatrix::with_statements(statements, votes)?;
    let assignment = assign_clusters(&matrix, config);
    Ok(assemble(&matrix, &assignment))
}

pub fn statement_aggregates(matrix: &VoteMatrix) -> Vec<StatementConsensus> {
    matrix
        .statements()
        .iter()
        .enumerate()
        .map(|(s, statement_id)| {
            let (mut agree, mut disagree, mut pass) = (0u32, 0u32, 0u32);
            for v in 0..matrix.voter_count() {
                match matrix.get(v, s) {
                    Some(1) => agree += 1,
                    Some(-1) => disagree += 1,
                    Some(_) => pass += 1,
                    None => {}
                }
            }

            let sided = agree + disagree;
            StatementConsensus {
                statement_id: statement_id.clone(),
                agree_count: agree,
                disagree_count: disagree,
                pass_count: pass,
                total_voters: agree + disagree + pass,
                agreement_ratio: if sided > 0 {
                    agree as f64 / sided as f64
                } else {
                    0.0
                },
                divisiveness: balance(agree, disagree),
            }
        })
        .collect()
}

/// Turn cluster labels into the public result. Empty clusters are dropped
/// and the remaining ones are numbered consecutively.
pub fn assemble(matrix: &VoteMatrix, assignment: &ClusterAssignment) -> ConsensusResult {
    let mut clusters: Vec<OpinionCluster> = Vec::new();

    for c in 0..assignment.k {
        let members: Vec<usize> = assignment
            .labels
            .iter()
            .enumerate()
            .filter(|(_, &label)| label == c)
            .map(|(v, _)| v)
            .collect();

        if members.is_empty() {
            continue;
        }

        let avg_agreement = members
            .iter()
            .map(|&v| matrix.agreement_rate(v))
            .sum::<f64>()
            / members.len() as f64;

        clusters.push(OpinionCluster {
            id: clusters.len() as u32,
            member_count: members.len() as u32,
            member_ids: members
                .iter()
                .map(|&v| matrix.voters()[v].clone())
                .collect(),
            avg_agreement,
        });
    }

    debug!(
        voters = matrix.voter_count(),
        statements = matrix.statement_count(),
        clusters = clusters.len(),
        iterations = assignment.iterations,
        "Consensus analysis complete"
    );

    ConsensusResult {
        statements: statement_aggregates(matrix),
        total_participants: matrix.voter_count() as u32,
        cluster_count: clusters.len() as u32,
        clusters,
    }
}
