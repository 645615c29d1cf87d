//! Weighted step choice for the alpha-biased walk.

use rand::Rng;
use shared_types::Hash;

use super::rating::Ratings;

/// Picks the next step among candidate approvers, weighted by
/// `exp(alpha * (rating - max_rating))`. Alpha zero gives a uniform
/// choice; large alpha all but pins the walk to the heaviest branch.
/// Returns the index of the chosen candidate.
pub fn choose_step<R: Rng>(
    rng: &mut R,
    ratings: &Ratings,
    candidates: &[Hash],
    alpha: f64,
) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let rated: Vec<u64> = candidates
        .iter()
        .map(|hash| ratings.get(hash).copied().unwrap_or(0))
        .collect();
    let max = rated.iter().copied().max().unwrap_or(0);
    let weights: Vec<f64> = rated
        .iter()
        .map(|&rating| (alpha * (rating as f64 - max as f64)).exp())
        .collect();
    let total: f64 = weights.iter().sum();
    let mut roll = rng.gen_range(0.0..total);
    for (index, weight) in weights.iter().enumerate() {
        roll -= weight;
        if roll <= 0.0 {
            return Some(index);
        }
    }
    Some(candidates.len() - 1)
}
