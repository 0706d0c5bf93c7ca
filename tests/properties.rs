use std::collections::HashMap;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use werewolf_roles::{
    assign_with_rng, compute_distribution, evaluate_balance, ids, Catalog, LockSet,
    ParticipantId, PlanError, RoleId, MAX_PARTICIPANTS, MIN_PARTICIPANTS,
};

fn participants(count: usize) -> Vec<ParticipantId> {
    (0..count)
        .map(|n| ParticipantId::from(format!("p{:02}", n)))
        .collect()
}

#[test]
fn every_valid_count_plans_exactly_that_many_roles() {
    let catalog = Catalog::standard();
    for count in MIN_PARTICIPANTS..=MAX_PARTICIPANTS {
        let distribution = compute_distribution(&catalog, count).unwrap();
        assert_eq!(distribution.total(), count);
        assert!(distribution.get(ids::WEREWOLF) >= 2);
        for id in distribution.role_ids() {
            assert!(catalog.contains(id.as_str()), "{} not in catalog", id);
        }
    }
}

#[test]
fn boundary_counts_are_rejected() {
    let catalog = Catalog::standard();
    for count in [7, 21] {
        assert!(matches!(
            compute_distribution(&catalog, count),
            Err(PlanError::InvalidParticipantCount { .. })
        ));
    }
}

proptest! {
    #[test]
    fn out_of_range_counts_fail(count in prop_oneof![0_usize..MIN_PARTICIPANTS, (MAX_PARTICIPANTS + 1)..1000]) {
        let result = compute_distribution(&Catalog::standard(), count);
        prop_assert_eq!(
            result,
            Err(PlanError::InvalidParticipantCount {
                count,
                min: MIN_PARTICIPANTS,
                max: MAX_PARTICIPANTS,
            })
        );
    }

    #[test]
    fn balance_is_deterministic(count in MIN_PARTICIPANTS..=MAX_PARTICIPANTS) {
        let catalog = Catalog::standard();
        let distribution = compute_distribution(&catalog, count).unwrap();
        prop_assert_eq!(
            evaluate_balance(&catalog, &distribution),
            evaluate_balance(&catalog, &distribution)
        );
    }

    #[test]
    fn unlocked_deal_matches_distribution(count in MIN_PARTICIPANTS..=MAX_PARTICIPANTS, seed in any::<u64>()) {
        let catalog = Catalog::standard();
        let distribution = compute_distribution(&catalog, count).unwrap();
        let players = participants(count);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let assignment = assign_with_rng(&players, &LockSet::new(), &distribution, &mut rng);
        prop_assert_eq!(assignment.len(), count);
        prop_assert!(assignment.unassigned().is_empty());

        let counts = assignment.role_counts();
        for (role, quantity) in distribution.iter() {
            prop_assert_eq!(counts.get(role).copied().unwrap_or(0), quantity);
        }
    }

    #[test]
    fn locks_always_hold(
        count in MIN_PARTICIPANTS..=MAX_PARTICIPANTS,
        seed in any::<u64>(),
        picks in proptest::collection::vec((0_usize..MAX_PARTICIPANTS, 0_usize..4), 0..4),
    ) {
        let catalog = Catalog::standard();
        let distribution = compute_distribution(&catalog, count).unwrap();
        let players = participants(count);
        let lockable = [ids::WEREWOLF, ids::SEER, ids::WITCH, ids::HUNTER];

        let mut locks = LockSet::new();
        for (player, role) in picks {
            if player < count {
                locks.insert(players[player].clone(), RoleId::from(lockable[role]));
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let assignment = assign_with_rng(&players, &locks, &distribution, &mut rng);

        for (player, role) in &locks {
            prop_assert_eq!(assignment.get(player), Some(role));
        }
        for (player, role) in assignment.iter() {
            if !locks.contains_key(player) {
                prop_assert!(distribution.contains(role.as_str()));
            }
        }

        let mut dealt: HashMap<&RoleId, usize> = HashMap::new();
        for (_, role) in assignment.iter() {
            *dealt.entry(role).or_insert(0) += 1;
        }
        prop_assert_eq!(dealt.values().sum::<usize>(), count);
    }
}
