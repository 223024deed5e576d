/// Opinion clustering (k-means over vote vectors)
///
/// k = min(max_clusters, voters); fewer than two voters yields no clusters.
/// Centroids start at k voters spread evenly through the voter list, voters
/// join the nearest centroid by Euclidean distance, and centroids move to the
/// mean of their members until assignments settle or the iteration cap hits.
use super::matrix::VoteMatrix;
use crate::config::ClusteringConfig;

/// Distances closer than this are treated as equal; the lower index wins.
pub const DISTANCE_TIE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterAssignment {
    pub k: usize,
    /// Cluster index per voter, parallel to `VoteMatrix::voters`
    pub labels: Vec<usize>,
    pub iterations: usize,
}

impl ClusterAssignment {
    pub fn empty() -> Self {
        Self {
            k: 0,
            labels: Vec::new(),
            iterations: 0,
        }
    }
}

pub fn cluster_count(voters: usize, config: &ClusteringConfig) -> usize {
    if voters < 2 {
        0
    } else {
        config.max_clusters.min(voters)
    }
}

/// Voter indices used as initial centroids.
pub fn seed_indices(voters: usize, k: usize) -> Vec<usize> {
    (0..k).map(|i| i * voters / k).collect()
}

/// First index whose distance is within `DISTANCE_TIE_EPSILON` of the minimum.
pub fn nearest(distances: impl IntoIterator<Item = f64> + Clone) -> usize {
    let min = distances.clone().into_iter().fold(f64::INFINITY, f64::min);
    distances
        .into_iter()
        .position(|d| d <= min + DISTANCE_TIE_EPSILON)
        .unwrap_or(0)
}

/// Scalar k-means.
pub fn assign_clusters(matrix: &VoteMatrix, config: &ClusteringConfig) -> ClusterAssignment {
    let n = matrix.voter_count();
    let k = cluster_count(n, config);
    if k == 0 {
        return ClusterAssignment::empty();
    }

    let rows: Vec<Vec<f64>> = (0..n).map(|v| matrix.row(v)).collect();
    let mut centroids: Vec<Vec<f64>> = seed_indices(n, k)
        .into_iter()
        .map(|i| rows[i].clone())
        .collect();

    let mut labels = vec![usize::MAX; n];
    let mut iterations = 0;

    while iterations < config.max_iterations {
        iterations += 1;

        let mut changed = false;
        for (v, row) in rows.iter().enumerate() {
            let best = nearest(centroids.iter().map(|c| squared_distance(row, c)));
            if labels[v] != best {
                labels[v] = best;
                changed = true;
            }
        }

        if !changed {
            break;
        }

        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<&Vec<f64>> = rows
                .iter()
                .zip(&labels)
                .filter(|(_, &label)| label == c)
                .map(|(row, _)| row)
                .collect();

            // An empty cluster keeps its previous centroid
            if members.is_empty() {
                continue;
            }

            for (s, value) in centroid.iter_mut().enumerate() {
                *value = members.iter().map(|row| row[s]).sum::<f64>() / members.len() as f64;
            }
        }
    }

    ClusterAssignment {
        k,
        labels,
        iterations,
    }
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
