//! Cumulative-weight rating of an entry point's future cone.

use shared_types::{Hash, StoreError, TangleStore};
use std::collections::{HashMap, HashSet, VecDeque};

/// Transient per-request ratings: `transaction -> 1 + |future cone|`,
/// restricted to the explored set and capped. Discarded after the walk.
pub type Ratings = HashMap<Hash, u64>;

/// Explores the future cone of `entry` (everything approving it, directly
/// or transitively) and rates each member by the size of its own future
/// cone within that set. Counting stops at `cap` per member, which bounds
/// the work to the explored-set size times the cap.
pub async fn rate_future_cone<S: TangleStore>(
    store: &S,
    entry: &Hash,
    cap: usize,
) -> Result<Ratings, StoreError> {
    let mut explored: HashSet<Hash> = HashSet::new();
    let mut queue: VecDeque<Hash> = VecDeque::new();
    queue.push_back(*entry);
    while let Some(hash) = queue.pop_front() {
        if !explored.insert(hash) {
            continue;
        }
        for approver in store.approvers(&hash).await? {
            queue.push_back(approver);
        }
    }

    let mut ratings = Ratings::with_capacity(explored.len());
    for &member in &explored {
        let mut seen: HashSet<Hash> = HashSet::new();
        let mut queue: VecDeque<Hash> = VecDeque::new();
        queue.push_back(member);
        seen.insert(member);
        let mut frontier_done = false;
        while let Some(hash) = queue.pop_front() {
            for approver in store.approvers(&hash).await? {
                if explored.contains(&approver) && seen.insert(approver) {
                    queue.push_back(approver);
                    if seen.len() > cap {
                        frontier_done = true;
                        break;
                    }
                }
            }
            if frontier_done {
                break;
            }
        }
        // The member itself is included, so every rating is at least one.
        ratings.insert(member, seen.len() as u64);
    }
    Ok(ratings)
}
