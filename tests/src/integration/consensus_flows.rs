//! # Consensus Flows
//!
//! End-to-end choreography of the three consensus subsystems over one
//! in-memory store:
//!
//! 1. **Tracker (02) → Ledger (02)**: validated coordinator milestones
//!    drive the solid pointer forward.
//! 2. **Ledger (02) → Bundle Validation (01)**: diff derivation validates
//!    every bundle in the referenced cone.
//! 3. **Tip Selection (03) → Ledger (02)**: the walk consults the ledger
//!    through its outbound port and routes around inconsistent cones.
//!
//! Every milestone here carries a real merkle signature folding up to the
//! coordinator root; nothing is stubbed.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use shared_crypto::MerkleTree;
    use shared_types::{Hash, MemoryTangle, TangleStore, SUPPLY};
    use tc_01_bundle_validation::BundleOutcome;
    use tc_02_ledger_state::{
        AdvanceOutcome, LedgerConfig, LedgerService, MilestoneTracker,
    };
    use tc_03_tip_selection::{TipSelector, TipSelectorConfig};

    use crate::fixtures::*;

    struct Node {
        store: Arc<MemoryTangle>,
        ledger: Arc<LedgerService<MemoryTangle>>,
        tracker: MilestoneTracker<MemoryTangle>,
        tree: MerkleTree,
        seed: [i8; shared_types::HASH_LENGTH],
    }

    /// A node with a depth-2 coordinator tree (milestone indices 1..=3)
    /// and the full supply on the given address.
    fn node(funded: Hash) -> Node {
        let seed = test_seed(9);
        let tree = MerkleTree::from_seed(MODE, &seed, 2);
        let store = Arc::new(MemoryTangle::new());
        let config = LedgerConfig {
            coordinator_address: tree.root(),
            merkle_tree_depth: 2,
            sponge_mode: MODE,
            ..LedgerConfig::default()
        };
        let ledger = Arc::new(
            LedgerService::new(Arc::clone(&store), config, genesis_funding(funded)).unwrap(),
        );
        let tracker = MilestoneTracker::new(Arc::clone(&store), Arc::clone(&ledger));
        Node {
            store,
            ledger,
            tracker,
            tree,
            seed,
        }
    }

    fn tip_selector(
        node: &Node,
        alpha: f64,
    ) -> TipSelector<MemoryTangle, LedgerAdapter<MemoryTangle>> {
        TipSelector::new(
            Arc::clone(&node.store),
            Arc::new(LedgerAdapter::new(Arc::clone(&node.ledger))),
            TipSelectorConfig {
                alpha,
                ..TipSelectorConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_end_to_end_confirmation_and_tip_selection() {
        let sender = signer(1);
        let recipient = test_hash(50);
        let node = node(sender.address);

        // A signed transfer, confirmed by a signed coordinator milestone.
        let transfer = signed_transfer(&sender, recipient, 3, Hash::NULL, Hash::NULL);
        let milestone =
            coordinator_milestone(&node.tree, &node.seed, 1, transfer[0].hash, Hash::NULL);
        store_all(&*node.store, &transfer).await;
        store_all(&*node.store, &milestone).await;

        assert_eq!(node.tracker.scan().await.unwrap(), 1);
        assert_eq!(
            node.ledger.solidify().await.unwrap(),
            AdvanceOutcome::Exhausted
        );
        assert_eq!(node.ledger.latest_solid_milestone_index().await, 1);
        assert_eq!(node.ledger.balance(&recipient).await, 3);
        assert_eq!(
            node.ledger.balance(&sender.address).await,
            (SUPPLY - 3) as u64
        );
        assert!(matches!(
            node.ledger
                .bundle_validator()
                .validate(&transfer[0].hash)
                .await
                .unwrap(),
            BundleOutcome::Valid(_)
        ));

        // A fresh unconfirmed tip on the milestone becomes the reference
        // pair for the next transaction.
        let tip = plain_tip(milestone[0].hash, milestone[0].hash);
        store_all(&*node.store, std::slice::from_ref(&tip)).await;

        let tips = tip_selector(&node, 1.0);
        assert_eq!(tips.select_tip(0, None).await.unwrap(), tip.hash);
        let (trunk, branch) = tips.transactions_to_approve(0).await.unwrap();
        assert_eq!(trunk, tip.hash);
        assert_eq!(branch, tip.hash);
    }

    #[tokio::test]
    async fn test_later_milestone_waits_for_the_earlier_cone() {
        let sender = signer(1);
        let recipient = test_hash(50);
        let node = node(sender.address);

        let transfer = signed_transfer(&sender, recipient, 5, Hash::NULL, Hash::NULL);
        let first =
            coordinator_milestone(&node.tree, &node.seed, 1, transfer[0].hash, Hash::NULL);
        let second =
            coordinator_milestone(&node.tree, &node.seed, 2, first[0].hash, Hash::NULL);

        // The transfer's second transaction is withheld: both milestones
        // validate on their signatures, but neither cone is solid yet.
        store_all(&*node.store, &transfer[..1]).await;
        store_all(&*node.store, &first).await;
        store_all(&*node.store, &second).await;

        assert_eq!(node.tracker.scan().await.unwrap(), 2);
        assert_eq!(
            node.ledger.solidify().await.unwrap(),
            AdvanceOutcome::NotSolid(1)
        );
        assert_eq!(node.ledger.latest_solid_milestone_index().await, 0);
        assert_eq!(node.ledger.balance(&recipient).await, 0);

        // The missing transaction arrives and both milestones apply in
        // index order.
        store_all(&*node.store, &transfer[1..]).await;
        assert_eq!(
            node.ledger.solidify().await.unwrap(),
            AdvanceOutcome::Exhausted
        );
        assert_eq!(node.ledger.latest_solid_milestone_index().await, 2);
        assert_eq!(node.ledger.balance(&recipient).await, 5);
    }

    #[tokio::test]
    async fn test_walk_avoids_a_double_spend_of_confirmed_funds() {
        let sender = signer(1);
        let (winner, loser) = (test_hash(60), test_hash(61));
        let node = node(sender.address);

        // The entire balance moves to `winner` and gets confirmed.
        let spent =
            signed_transfer(&sender, winner, SUPPLY, Hash::NULL, Hash::NULL);
        let milestone =
            coordinator_milestone(&node.tree, &node.seed, 1, spent[0].hash, Hash::NULL);
        store_all(&*node.store, &spent).await;
        store_all(&*node.store, &milestone).await;
        assert_eq!(node.tracker.scan().await.unwrap(), 1);
        assert_eq!(
            node.ledger.solidify().await.unwrap(),
            AdvanceOutcome::Exhausted
        );
        assert_eq!(node.ledger.balance(&sender.address).await, 0);

        // A correctly signed second spend of the same funds sits
        // unconfirmed on top of the milestone, with a tip above it. The
        // rival branch carries no conflict.
        let double_spend =
            signed_transfer(&sender, loser, 7, milestone[0].hash, milestone[0].hash);
        let tainted_tip = plain_tip(double_spend[0].hash, double_spend[0].hash);
        let clean_tip = plain_tip(milestone[0].hash, milestone[0].hash);
        store_all(&*node.store, &double_spend).await;
        store_all(&*node.store, &[tainted_tip, clean_tip.clone()]).await;

        // High alpha pulls the walk towards the heavier conflicting
        // branch; validation must push it back out every time.
        let tips = tip_selector(&node, 10.0);
        for _ in 0..10 {
            assert_eq!(tips.select_tip(0, None).await.unwrap(), clean_tip.hash);
        }
    }

    #[tokio::test]
    async fn test_late_low_milestone_hard_resets_and_reconverges() {
        let sender = signer(1);
        let recipient = test_hash(50);
        let node = node(sender.address);

        let transfer = signed_transfer(&sender, recipient, 11, Hash::NULL, Hash::NULL);
        let first = coordinator_milestone(&node.tree, &node.seed, 1, Hash::NULL, Hash::NULL);
        let second =
            coordinator_milestone(&node.tree, &node.seed, 2, transfer[0].hash, Hash::NULL);
        let third =
            coordinator_milestone(&node.tree, &node.seed, 3, second[0].hash, Hash::NULL);

        // Milestones 2 and 3 arrive and apply before 1 is ever seen.
        store_all(&*node.store, &transfer).await;
        store_all(&*node.store, &second).await;
        store_all(&*node.store, &third).await;
        assert_eq!(node.tracker.scan().await.unwrap(), 2);
        assert_eq!(
            node.ledger.solidify().await.unwrap(),
            AdvanceOutcome::Exhausted
        );
        assert_eq!(node.ledger.latest_solid_milestone_index().await, 3);
        assert_eq!(node.ledger.balance(&recipient).await, 11);

        // Milestone 1 turns up below the solid pointer: the tracker hard
        // resets the ledger so confirmations past it are re-derived.
        store_all(&*node.store, &first).await;
        assert_eq!(node.tracker.scan().await.unwrap(), 1);
        assert_eq!(node.ledger.latest_solid_milestone_index().await, 0);

        assert_eq!(
            node.ledger.solidify().await.unwrap(),
            AdvanceOutcome::Exhausted
        );
        assert_eq!(node.ledger.latest_solid_milestone_index().await, 3);
        assert_eq!(node.ledger.balance(&recipient).await, 11);

        let confirmed = node
            .store
            .transaction(&transfer[0].hash)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(confirmed.snapshot_index, 2);
    }
}
