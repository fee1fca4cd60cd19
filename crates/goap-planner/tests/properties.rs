use std::collections::HashSet;

use goap_core::{Action, PropositionSet};
use goap_planner::{IdaStarPlanner, Planner};
use proptest::prelude::*;

const IDS: [&str; 4] = ["a", "b", "c", "d"];

fn arb_set() -> impl Strategy<Value = PropositionSet> {
    proptest::collection::btree_map(0usize..IDS.len(), any::<bool>(), 0..=IDS.len())
        .prop_map(|flags| {
            flags
                .into_iter()
                .map(|(i, value)| (IDS[i], value))
                .collect::<PropositionSet>()
        })
}

fn arb_catalog() -> impl Strategy<Value = Vec<Action>> {
    proptest::collection::vec((arb_set(), arb_set(), 0u32..4), 0..=5).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (preconditions, effects, cost))| {
                Action::builder(format!("act{i}"))
                    .cost(cost)
                    .preconditions(preconditions)
                    .effects(effects)
                    .build()
                    .unwrap()
            })
            .collect::<Vec<_>>()
    })
}

/// Exhaustively look for any sequence of distinct actions reaching the goal.
fn brute_force_reachable(
    actions: &[Action],
    state: &PropositionSet,
    goal: &PropositionSet,
    used: &mut Vec<usize>,
) -> bool {
    if state.meets_goal(goal) {
        return true;
    }
    for (i, action) in actions.iter().enumerate() {
        if used.contains(&i) || !action.operable_on(state) {
            continue;
        }
        used.push(i);
        let reachable = brute_force_reachable(actions, &action.act_on(state), goal, used);
        used.pop();
        if reachable {
            return true;
        }
    }
    false
}

proptest! {
    #![proptest_config(ProptestConfig {
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_meets_goal_matches_definition(state in arb_set(), goal in arb_set()) {
        let expected = goal.iter().all(|(id, value)| state.get(id.as_str()) == Some(value));
        prop_assert_eq!(state.meets_goal(&goal), expected);
    }

    #[test]
    fn prop_unrelated_keys_never_change_goal_result(state in arb_set(), goal in arb_set(), extra in any::<bool>()) {
        let mut widened = state.clone();
        widened.set("unrelated", extra);
        prop_assert_eq!(widened.meets_goal(&goal), state.meets_goal(&goal));
    }

    #[test]
    fn prop_act_on_overlays_effects(state in arb_set(), effects in arb_set()) {
        let action = Action::builder("probe").effects(effects.clone()).build().unwrap();
        let next = action.act_on(&state);
        for (id, value) in state.iter() {
            if !effects.contains(id.as_str()) {
                prop_assert_eq!(next.get(id.as_str()), Some(value));
            }
        }
        for (id, value) in effects.iter() {
            prop_assert_eq!(next.get(id.as_str()), Some(value));
        }
        prop_assert_eq!(action.act_on(&next), next);
    }

    #[test]
    fn prop_found_plans_replay_to_goal(actions in arb_catalog(), start in arb_set(), goal in arb_set()) {
        let planner = IdaStarPlanner::new(actions.clone());
        match planner.find_plan(&start, &goal) {
            Ok(plan) => {
                let end = plan.simulate(&start);
                prop_assert!(end.meets_goal(&goal));
                prop_assert!(planner.validate_plan(&plan, &start).unwrap());
                prop_assert_eq!(&planner.catalog().replay(&start, &plan).unwrap(), &end);
                if let Some(last) = plan.steps.last() {
                    prop_assert_eq!(&last.state, &end);
                }

                let names: HashSet<_> = plan.action_names().into_iter().collect();
                prop_assert_eq!(names.len(), plan.len());
                prop_assert!(plan.stats.final_bound >= u64::from(start.calculate_heuristic(&goal)));
                let bounds = &plan.stats.bounds;
                prop_assert_eq!(bounds.len(), plan.stats.iterations);
                prop_assert_eq!(bounds.first().copied(), Some(u64::from(start.calculate_heuristic(&goal))));
                prop_assert_eq!(bounds.last().copied(), Some(plan.stats.final_bound));
                prop_assert!(bounds.windows(2).all(|pair| pair[0] <= pair[1]), "bounds {:?}", bounds);
                if start.meets_goal(&goal) {
                    prop_assert!(plan.is_empty());
                }
            }
            Err(err) => {
                prop_assert!(err.is_no_plan(), "unexpected error: {}", err);
                prop_assert!(!brute_force_reachable(&actions, &start, &goal, &mut Vec::new()));
            }
        }
    }
}

#[test]
fn test_campfire_scenario() {
    let catalog = vec![
        Action::builder("ChopWood")
            .cost(1)
            .effect("hasWood", true)
            .build()
            .unwrap(),
        Action::builder("BuildFire")
            .cost(1)
            .precondition("hasWood", true)
            .effect("hasFire", true)
            .build()
            .unwrap(),
    ];
    let planner = IdaStarPlanner::new(catalog);
    let start = PropositionSet::new();
    let goal = PropositionSet::new().with("hasFire", true);

    let plan = planner.find_plan(&start, &goal).unwrap();
    assert_eq!(plan.action_names(), ["ChopWood", "BuildFire"]);
    assert_eq!(
        goap_core::simulate(&start, &plan),
        PropositionSet::new().with("hasWood", true).with("hasFire", true)
    );

    let already_there = PropositionSet::new().with("hasFire", true);
    assert!(planner.find_plan(&already_there, &goal).unwrap().is_empty());

    let unreachable = PropositionSet::new().with("hasShelter", true);
    assert!(planner.find_plan(&start, &unreachable).unwrap_err().is_no_plan());
}

#[test]
fn test_plan_roundtrips_through_json() {
    let planner = IdaStarPlanner::new(vec![Action::builder("ChopWood")
        .cost(2)
        .effect("hasWood", true)
        .build()
        .unwrap()]);
    let plan = planner
        .find_plan(&PropositionSet::new(), &PropositionSet::new().with("hasWood", true))
        .unwrap();

    let json = serde_json::to_string(&plan).unwrap();
    let back: goap_core::Plan = serde_json::from_str(&json).unwrap();
    assert_eq!(back.steps, plan.steps);
    assert_eq!(back.catalog_fingerprint, plan.catalog_fingerprint);
}
