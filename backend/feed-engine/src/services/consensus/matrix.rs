use crate::error::{EngineError, Result};
use crate::models::{Statement, Vote};
use std::collections::HashMap;

/// Dense voter × statement matrix of ternary votes.
///
/// Voters and statements are indexed in order of first appearance. A later
/// vote for the same (voter, statement) pair replaces the earlier one.
#[derive(Debug, Clone)]
pub struct VoteMatrix {
    voters: Vec<String>,
    statements: Vec<String>,
    /// Row-major, `None` = no vote cast
    cells: Vec<Option<i8>>,
}

impl VoteMatrix {
    pub fn build(votes: &[Vote]) -> Result<Self> {
        Self::with_statements(&[], votes)
    }

    /// Known statements come first in the given order; statements that only
    /// appear in votes follow in order of first appearance.
    pub fn with_statements(known: &[Statement], votes: &[Vote]) -> Result<Self> {
        let mut statement_index: HashMap<&str, usize> = HashMap::new();
        let mut statements: Vec<String> = Vec::new();

        for statement in known {
            if statement_index.contains_key(statement.id.as_str()) {
                return Err(EngineError::invalid(format!(
                    "duplicate statement id '{}'",
                    statement.id
                )));
            }
            statement_index.insert(statement.id.as_str(), statements.len());
            statements.push(statement.id.clone());
        }

        let mut voter_index: HashMap<&str, usize> = HashMap::new();
        let mut voters: Vec<String> = Vec::new();
        let mut entries: Vec<(usize, usize, i8)> = Vec::with_capacity(votes.len());

        for vote in votes {
            validate_value(vote)?;

            let v = *voter_index.entry(vote.voter_id.as_str()).or_insert_with(|| {
                voters.push(vote.voter_id.clone());
                voters.len() - 1
            });
            let s = *statement_index
                .entry(vote.statement_id.as_str())
                .or_insert_with(|| {
                    statements.push(vote.statement_id.clone());
                    statements.len() - 1
                });
            entries.push((v, s, vote.value));
        }

        let width = statements.len();
        let mut cells = vec![None; voters.len() * width];
        for (v, s, value) in entries {
            cells[v * width + s] = Some(value);
        }

        Ok(Self {
            voters,
            statements,
            cells,
        })
    }

    pub fn voters(&self) -> &[String] {
        &self.voters
    }

    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn statement_count(&self) -> usize {
        self.statements.len()
    }

    pub fn get(&self, voter: usize, statement: usize) -> Option<i8> {
        self.cells[voter * self.statements.len() + statement]
    }

    /// Vote vector of one voter; a missing vote counts as 0.
    pub fn row(&self, voter: usize) -> Vec<f64> {
        (0..self.statements.len())
            .map(|s| self.get(voter, s).unwrap_or(0) as f64)
            .collect()
    }

    /// Fraction of the voter's cast votes that are +1.
    pub fn agreement_rate(&self, voter: usize) -> f64 {
        let (cast, agreed) = (0..self.statements.len())
            .filter_map(|s| self.get(voter, s))
            .fold((0u32, 0u32), |(cast, agreed), value| {
                (cast + 1, agreed + u32::from(value == 1))
            });

        if cast == 0 {
            0.0
        } else {
            agreed as f64 / cast as f64
        }
    }
}

fn validate_value(vote: &Vote) -> Result<()> {
    if !matches!(vote.value, -1..=1) {
        return Err(EngineError::invalid(format!(
            "vote value for voter '{}' on statement '{}' must be -1, 0 or 1, got {}",
            vote.voter_id, vote.statement_id, vote.value
        )));
    }
    Ok(())
}
