//! Seeded k-means clustering primitive.
//!
//! Lloyd iterations with several random restarts; the assignment with the
//! lowest inertia wins. The RNG seed is fixed by the caller so repeated runs
//! over the same batch produce identical partitions.

use rand::SeedableRng;
use rand::rngs::StdRng;

const MAX_ITERATIONS: usize = 100;

/// Partition `points` into at most `k` clusters and return the cluster index
/// assigned to each point. Empty input yields an empty assignment.
pub fn k_means(points: &[Vec<f64>], k: usize, n_init: usize, seed: u64) -> Vec<usize> {
    if points.is_empty() || k == 0 {
        return Vec::new();
    }
    let k = k.min(points.len());
    let mut rng = StdRng::seed_from_u64(seed);

    let mut best_assignments = Vec::new();
    let mut best_inertia = f64::INFINITY;
    for _ in 0..n_init.max(1) {
        let (assignments, inertia) = run_lloyd(points, k, &mut rng);
        if inertia < best_inertia {
            best_inertia = inertia;
            best_assignments = assignments;
        }
    }
    best_assignments
}

fn run_lloyd(points: &[Vec<f64>], k: usize, rng: &mut StdRng) -> (Vec<usize>, f64) {
    let seeds = rand::seq::index::sample(rng, points.len(), k);
    let mut centroids: Vec<Vec<f64>> = seeds.iter().map(|i| points[i].clone()).collect();
    let mut assignments = vec![0usize; points.len()];

    for _ in 0..MAX_ITERATIONS {
        let next: Vec<usize> = points
            .iter()
            .map(|point| nearest_centroid(point, &centroids))
            .collect();
        let converged = next == assignments;
        assignments = next;

        for (cluster, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<&Vec<f64>> = points
                .iter()
                .zip(&assignments)
                .filter(|&(_, &a)| a == cluster)
                .map(|(p, _)| p)
                .collect();
            // A cluster that lost all members keeps its previous centroid.
            if members.is_empty() {
                continue;
            }
            for (dim, slot) in centroid.iter_mut().enumerate() {
                *slot = members.iter().map(|p| p[dim]).sum::<f64>() / members.len() as f64;
            }
        }
        if converged {
            break;
        }
    }

    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(point, &a)| squared_distance(point, &centroids[a]))
        .sum();
    (assignments, inertia)
}

fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best = i;
        }
    }
    best
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}
