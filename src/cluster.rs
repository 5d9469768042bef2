use std::collections::HashMap;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::errors::KindredError;

/// Iteration cap for Lloyd's loop. Assignments on this population size
/// converge in a handful of iterations; the cap guards degenerate inputs.
const MAX_ITER: usize = 100;

/// Partition all known users into at most `k` clusters.
///
/// Dimensions are standardized to zero mean / unit variance across the
/// population first, then Lloyd's k-means runs in the standardized space.
/// Initialization is deterministic for a given `seed`: the first centroid is
/// drawn with a seeded RNG, the rest by farthest-point selection.
///
/// Fewer than 2 users is the defined insufficient-data outcome and returns
/// an empty map. `k == 0` is a contract violation. Labels are arbitrary
/// small integers, valid only within this one result.
pub fn compute_clusters(
    vectors: &HashMap<u32, Vec<f32>>,
    k: usize,
    seed: u64,
) -> Result<HashMap<u32, usize>, KindredError> {
    if k == 0 {
        return Err(KindredError::InvalidClusterCount(k));
    }
    if vectors.len() < 2 {
        return Ok(HashMap::new());
    }

    // Fix an id order so the whole computation is deterministic.
    let mut user_ids: Vec<u32> = vectors.keys().copied().collect();
    user_ids.sort_unstable();

    let dim = vectors[&user_ids[0]].len();
    let mut points = Vec::with_capacity(user_ids.len());
    for id in &user_ids {
        let v = &vectors[id];
        if v.len() != dim {
            return Err(KindredError::DimensionMismatch {
                expected: dim,
                found: v.len(),
            });
        }
        points.push(v.clone());
    }

    standardize(&mut points);

    let k_eff = k.min(points.len());
    let labels = lloyd(&points, k_eff, seed);

    Ok(user_ids.into_iter().zip(labels).collect())
}

/// All users sharing `target_user_id`'s cluster, excluding the target,
/// in ascending user-id order. Unassigned target yields an empty list.
pub fn same_cluster(target_user_id: u32, assignment: &HashMap<u32, usize>) -> Vec<u32> {
    let target_label = match assignment.get(&target_user_id) {
        Some(label) => *label,
        None => return Vec::new(),
    };

    let mut mates: Vec<u32> = assignment
        .iter()
        .filter(|(id, label)| **id != target_user_id && **label == target_label)
        .map(|(id, _)| *id)
        .collect();
    mates.sort_unstable();

    mates
}

/// Rescale every dimension to zero mean / unit variance across the
/// population. Zero-variance dimensions become 0.0 for all points.
fn standardize(points: &mut [Vec<f32>]) {
    let n = points.len();
    if n == 0 {
        return;
    }
    let dim = points[0].len();

    for j in 0..dim {
        let mean = points.iter().map(|p| p[j]).sum::<f32>() / n as f32;
        let var = points.iter().map(|p| (p[j] - mean).powi(2)).sum::<f32>() / n as f32;
        let std = var.sqrt();

        for p in points.iter_mut() {
            p[j] = if std > 0.0 { (p[j] - mean) / std } else { 0.0 };
        }
    }
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Seeded first centroid, farthest-point selection for the rest.
fn init_centroids(points: &[Vec<f32>], k: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    let first = rng.random_range(0..points.len());

    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[first].clone());

    while centroids.len() < k {
        let mut far_idx = 0;
        let mut far_dist = -1.0f32;
        for (i, p) in points.iter().enumerate() {
            let nearest = centroids
                .iter()
                .map(|c| squared_distance(p, c))
                .fold(f32::INFINITY, f32::min);
            if nearest > far_dist {
                far_dist = nearest;
                far_idx = i;
            }
        }
        centroids.push(points[far_idx].clone());
    }

    centroids
}

fn assign_labels(points: &[Vec<f32>], centroids: &[Vec<f32>]) -> Vec<usize> {
    points
        .iter()
        .map(|p| {
            let mut best = 0;
            let mut best_dist = f32::INFINITY;
            for (c_idx, c) in centroids.iter().enumerate() {
                let dist = squared_distance(p, c);
                if dist < best_dist {
                    best_dist = dist;
                    best = c_idx;
                }
            }
            best
        })
        .collect()
}

fn update_centroids(points: &[Vec<f32>], labels: &[usize], k: usize) -> Vec<Vec<f32>> {
    let dim = points[0].len();
    let mut centroids = vec![vec![0.0f32; dim]; k];
    let mut counts = vec![0usize; k];

    for (p, &label) in points.iter().zip(labels.iter()) {
        counts[label] += 1;
        for j in 0..dim {
            centroids[label][j] += p[j];
        }
    }

    for (c_idx, centroid) in centroids.iter_mut().enumerate() {
        if counts[c_idx] > 0 {
            for v in centroid.iter_mut() {
                *v /= counts[c_idx] as f32;
            }
        }
    }

    centroids
}

fn lloyd(points: &[Vec<f32>], k: usize, seed: u64) -> Vec<usize> {
    let mut centroids = init_centroids(points, k, seed);
    let mut labels = assign_labels(points, &centroids);

    for _ in 0..MAX_ITER {
        centroids = update_centroids(points, &labels, k);
        let next = assign_labels(points, &centroids);
        if next == labels {
            break;
        }
        labels = next;
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEED: u64 = 42;

    fn three_users() -> HashMap<u32, Vec<f32>> {
        let mut vectors = HashMap::new();
        vectors.insert(1, vec![9.0, 1.0, 0.0]);
        vectors.insert(2, vec![8.0, 2.0, 0.0]);
        vectors.insert(3, vec![0.0, 1.0, 9.0]);
        vectors
    }

    #[test]
    fn test_zero_k_is_rejected() {
        let err = compute_clusters(&three_users(), 0, SEED).unwrap_err();
        assert!(matches!(err, KindredError::InvalidClusterCount(0)));
    }

    #[test]
    fn test_fewer_than_two_users_yields_empty_map() {
        let mut vectors = HashMap::new();
        assert!(compute_clusters(&vectors, 3, SEED).unwrap().is_empty());

        vectors.insert(1, vec![1.0, 2.0]);
        assert!(compute_clusters(&vectors, 3, SEED).unwrap().is_empty());
    }

    #[test]
    fn test_every_user_gets_exactly_one_label() {
        let assignment = compute_clusters(&three_users(), 2, SEED).unwrap();
        assert_eq!(assignment.len(), 3);
        for id in [1, 2, 3] {
            assert!(assignment.contains_key(&id));
        }
    }

    #[test]
    fn test_k_is_clamped_to_population_size() {
        let assignment = compute_clusters(&three_users(), 10, SEED).unwrap();
        for label in assignment.values() {
            assert!(*label < 3);
        }
    }

    #[test]
    fn test_close_users_share_a_cluster() {
        let assignment = compute_clusters(&three_users(), 2, SEED).unwrap();
        assert_eq!(assignment[&1], assignment[&2]);
        assert_ne!(assignment[&1], assignment[&3]);
    }

    #[test]
    fn test_same_seed_same_assignment() {
        let a = compute_clusters(&three_users(), 2, SEED).unwrap();
        let b = compute_clusters(&three_users(), 2, SEED).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_variance_dimension_does_not_poison_distances() {
        // Last dimension is constant across the population.
        let mut vectors = HashMap::new();
        vectors.insert(1, vec![9.0, 1.0, 5.0]);
        vectors.insert(2, vec![8.0, 2.0, 5.0]);
        vectors.insert(3, vec![0.0, 9.0, 5.0]);

        let assignment = compute_clusters(&vectors, 2, SEED).unwrap();
        assert_eq!(assignment.len(), 3);
        assert_eq!(assignment[&1], assignment[&2]);
        assert_ne!(assignment[&1], assignment[&3]);
    }

    #[test]
    fn test_mismatched_dimensions_are_a_contract_violation() {
        let mut vectors = three_users();
        vectors.insert(4, vec![1.0, 2.0]);
        let err = compute_clusters(&vectors, 2, SEED).unwrap_err();
        assert!(matches!(err, KindredError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_same_cluster_excludes_target() {
        let assignment = compute_clusters(&three_users(), 2, SEED).unwrap();
        let mates = same_cluster(1, &assignment);
        assert_eq!(mates, vec![2]);
    }

    #[test]
    fn test_same_cluster_for_unassigned_user_is_empty() {
        let assignment = compute_clusters(&three_users(), 2, SEED).unwrap();
        assert!(same_cluster(99, &assignment).is_empty());
    }
}
