/// Vectorized Backend
///
/// Scores whole batches as `ndarray` columns and runs k-means on a dense
/// voter × statement `Array2`. Construction runs a self-check against the
/// reference backend and refuses to build on any divergence.
use super::{BackendKind, RankingBackend, ReferenceBackend};
use crate::config::ClusteringConfig;
use crate::error::{EngineError, Result};
use crate::models::{ConsensusResult, RankablePost, RankingStrategy, Statement, Vote};
use crate::services::consensus::clustering::{cluster_count, nearest, seed_indices};
use crate::services::consensus::{self, ClusterAssignment, VoteMatrix};
use crate::services::ranking::scoring::{score_post, WILSON_Z};
use crate::services::ranking::sorter::order_by_scores;
use crate::utils::{epoch_millis, MILLIS_PER_HOUR};
use chrono::{DateTime, Duration, Utc};
use ndarray::{Array1, Array2, Axis, Zip};
use tracing::{debug, info};

pub struct VectorizedBackend {
    clustering: ClusteringConfig,
}

impl VectorizedBackend {
    /// Build and self-check. `epsilon` bounds per-score divergence from the
    /// reference backend; orderings and cluster labels must match exactly.
    pub fn new(clustering: ClusteringConfig, epsilon: f64) -> Result<Self> {
        let backend = Self { clustering };
        backend.self_check(epsilon)?;
        info!("Vectorized backend passed self-check");
        Ok(backend)
    }

    /// Score column for `posts` under `strategy`, parallel to the input.
    pub fn score_batch(
        &self,
        posts: &[RankablePost],
        strategy: RankingStrategy,
        now: &DateTime<Utc>,
    ) -> Array1<f64> {
        let likes: Array1<f64> = posts.iter().map(|p| p.like_count as f64).collect();
        let downvotes: Array1<f64> = posts.iter().map(|p| p.downvote_count as f64).collect();

        match strategy {
            RankingStrategy::Newest => posts.iter().map(|p| epoch_millis(&p.created_at)).collect(),
            RankingStrategy::Trending => {
                let reposts: Array1<f64> = posts.iter().map(|p| p.repost_count as f64).collect();
                let now_ms = epoch_millis(now);
                let age_hours: Array1<f64> = posts
                    .iter()
                    .map(|p| ((now_ms - epoch_millis(&p.created_at)) / MILLIS_PER_HOUR).max(1.0))
                    .collect();
                (&likes + &reposts) / &age_hours
            }
            RankingStrategy::Score => &likes - &downvotes,
            RankingStrategy::Wilson => {
                let totals = &likes + &downvotes;
                let z2 = WILSON_Z * WILSON_Z;
                Zip::from(&likes).and(&totals).map_collect(|&l, &n| {
                    if n == 0.0 {
                        return 0.0;
                    }
                    let p = l / n;
                    let center = p + z2 / (2.0 * n);
                    let spread = WILSON_Z * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt();
                    (center - spread) / (1.0 + z2 / n)
                })
            }
            RankingStrategy::Controversial => {
                let totals = &likes + &downvotes;
                Zip::from(&likes).and(&totals).map_collect(|&l, &n| {
                    if n == 0.0 {
                        0.0
                    } else {
                        n * (1.0 - 2.0 * (l / n - 0.5).abs())
                    }
                })
            }
        }
    }

    /// k-means over the dense vote matrix.
    pub fn cluster(&self, matrix: &VoteMatrix) -> ClusterAssignment {
        let n = matrix.voter_count();
        let m = matrix.statement_count();
        let k = cluster_count(n, &self.clustering);
        if k == 0 {
            return ClusterAssignment::empty();
        }

        let points = Array2::from_shape_fn((n, m), |(v, s)| {
            matrix.get(v, s).unwrap_or(0) as f64
        });
        let mut centroids = points.select(Axis(0), &seed_indices(n, k));
        let mut labels = vec![usize::MAX; n];
        let mut iterations = 0;

        while iterations < self.clustering.max_iterations {
            iterations += 1;

            let mut distances = Array2::<f64>::zeros((n, k));
            for (c, centroid) in centroids.outer_iter().enumerate() {
                let diff = &points - &centroid;
                distances
                    .column_mut(c)
                    .assign(&diff.mapv(|x| x * x).sum_axis(Axis(1)));
            }

            let mut changed = false;
            for (v, row) in distances.outer_iter().enumerate() {
                let best = nearest(row.iter().copied());
                if labels[v] != best {
                    labels[v] = best;
                    changed = true;
                }
            }

            if !changed {
                break;
            }

            for c in 0..k {
                let members: Vec<usize> = (0..n).filter(|&v| labels[v] == c).collect();
                if let Some(mean) = points.select(Axis(0), &members).mean_axis(Axis(0)) {
                    centroids.row_mut(c).assign(&mean);
                }
            }
        }

        ClusterAssignment {
            k,
            labels,
            iterations,
        }
    }

    fn self_check(&self, epsilon: f64) -> Result<()> {
        let reference = ReferenceBackend::new(self.clustering);
        let (posts, now) = canary_posts();

        for strategy in RankingStrategy::ALL {
            let batch = self.score_batch(&posts, strategy, &now);
            for (post, &score) in posts.iter().zip(batch.iter()) {
                let expected = score_post(post, strategy, &now);
                if (score - expected).abs() > epsilon * expected.abs().max(1.0) {
                    return Err(EngineError::BackendInit(format!(
                        "{strategy} score for {} diverged: {score} vs {expected}",
                        post.uri
                    )));
                }
            }

            if self.rank(posts.clone(), strategy, &now) != reference.rank(posts.clone(), strategy, &now)
            {
                return Err(EngineError::BackendInit(format!(
                    "{strategy} ordering diverged from reference"
                )));
            }
        }

        let votes = canary_votes();
        if self.analyze_consensus(&[], &votes)? != reference.analyze_consensus(&[], &votes)? {
            return Err(EngineError::BackendInit(
                "consensus clustering diverged from reference".to_string(),
            ));
        }

        Ok(())
    }
}

impl RankingBackend for VectorizedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Vectorized
    }

    fn rank(
        &self,
        posts: Vec<RankablePost>,
        strategy: RankingStrategy,
        now: &DateTime<Utc>,
    ) -> Vec<RankablePost> {
        let scores = self.score_batch(&posts, strategy, now);
        debug!(
            strategy = %strategy,
            post_count = posts.len(),
            "Vectorized ranking"
        );
        order_by_scores(posts, &scores.to_vec(), |post| post.uri.as_str())
    }

    fn analyze_consensus(
        &self,
        statements: &[Statement],
        votes: &[Vote],
    ) -> Result<ConsensusResult> {
        let matrix = VoteMatrix::with_statements(statements, votes)?;
        let assignment = self.cluster(&matrix);
        Ok(consensus::assemble(&matrix, &assignment))
    }
}

fn canary_posts() -> (Vec<RankablePost>, DateTime<Utc>) {
    let now = DateTime::<Utc>::UNIX_EPOCH + Duration::days(20_000);
    let shapes: [(u32, u32, u32, i64); 8] = [
        (10, 0, 1, 2),
        (2, 0, 0, 2),
        (5, 5, 3, 30),
        (0, 0, 0, 0),
        (40, 38, 12, 90),
        (1, 9, 0, 5),
        (7, 7, 7, 7),
        (3, 1, 0, 1),
    ];

    let posts = shapes
        .iter()
        .enumerate()
        .map(|(i, &(likes, downvotes, reposts, age))| RankablePost {
            uri: format!("canary:{i}"),
            created_at: now - Duration::hours(age),
            like_count: likes,
            downvote_count: downvotes,
            reply_count: 0,
            repost_count: reposts,
        })
        .collect();

    (posts, now)
}

fn canary_votes() -> Vec<Vote> {
    let patterns: [[i8; 4]; 6] = [
        [1, 1, -1, 0],
        [1, 1, -1, -1],
        [-1, -1, 1, 1],
        [-1, 0, 1, 1],
        [0, 1, 0, -1],
        [1, -1, 1, -1],
    ];

    patterns
        .iter()
        .enumerate()
        .flat_map(|(v, pattern)| {
            pattern.iter().enumerate().map(move |(s, &value)| Vote {
                voter_id: format!("voter:{v}"),
                statement_id: format!("stmt:{s}"),
                value,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::consensus::assign_clusters;

    fn backend() -> VectorizedBackend {
        VectorizedBackend::new(ClusteringConfig::default(), 1e-9).unwrap()
    }

    #[test]
    fn test_passes_self_check() {
        assert_eq!(backend().kind(), BackendKind::Vectorized);
    }

    #[test]
    fn test_matches_reference_ordering() {
        let backend = backend();
        let reference = ReferenceBackend::default();
        let (posts, now) = canary_posts();

        for strategy in RankingStrategy::ALL {
            assert_eq!(
                backend.rank(posts.clone(), strategy, &now),
                reference.rank(posts.clone(), strategy, &now),
                "strategy {strategy}"
            );
        }
    }

    #[test]
    fn test_clustering_matches_reference_labels() {
        let backend = backend();
        let mut votes = canary_votes();
        for i in 0..30 {
            for s in 0..6 {
                let value = ((i * 5 + s * 2 + i / 7) % 3) as i8 - 1;
                votes.push(Vote {
                    voter_id: format!("extra:{i}"),
                    statement_id: format!("stmt:{s}"),
                    value,
                });
            }
        }

        let matrix = VoteMatrix::build(&votes).unwrap();
        assert_eq!(
            backend.cluster(&matrix).labels,
            assign_clusters(&matrix, &ClusteringConfig::default()).labels
        );
    }

    #[test]
    fn test_wilson_batch_handles_no_votes() {
        let backend = backend();
        let (posts, now) = canary_posts();

        let scores = backend.score_batch(&posts, RankingStrategy::Wilson, &now);
        assert_eq!(scores[3], 0.0);
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
    }
}
