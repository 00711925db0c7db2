//! Property tests for world state relations, composite semantics and plan validity.

use proptest::prelude::*;
use std::{cell::Cell, rc::Rc};

use ::behavior_tree_planner::{
    Action, AgentId, Behavior, BehaviorStatus, BehaviorTree, Blackboard, Context, ErrorKind, Goal,
    NullHost, Planner, Result, Task, Value, WorldState,
};

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-3i64..3).prop_map(Value::Int),
        prop_oneof![Just(f32::NAN), Just(-0f32), Just(0f32), Just(1.5f32)]
            .prop_map(Value::Float),
        "[a-c]".prop_map(Value::Str),
    ]
}

/// Small key space so that generated states overlap often.
fn arb_state(max_len: usize) -> impl Strategy<Value = WorldState> {
    prop::collection::vec((0..4usize, arb_value()), 0..max_len).prop_map(|pairs| {
        pairs
            .into_iter()
            .map(|(key, value)| (format!("k{key}"), value))
            .collect::<WorldState>()
    })
}

fn arb_action() -> impl Strategy<Value = Action> {
    (arb_state(3), arb_state(3), 0.0..3.0f32, 0..1000u32).prop_map(
        |(preconditions, effects, cost, id)| {
            Action::new(format!("action{id}"), cost)
                .with_preconditions(preconditions)
                .with_effects(effects)
        },
    )
}

// ---------------------------------------------------------------------------
// World state
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn satisfies_is_reflexive(state in arb_state(6)) {
        prop_assert!(state.satisfies(&state));
        prop_assert!(state.satisfies(&WorldState::new()));
    }

    #[test]
    fn merged_state_satisfies_merged_facts(base in arb_state(6), facts in arb_state(6)) {
        let mut merged = base.clone();
        merged.merge(&facts);
        prop_assert!(merged.satisfies(&facts));
        prop_assert!(merged.len() <= base.len() + facts.len());
    }

    #[test]
    fn unsatisfied_count_matches_satisfies(state in arb_state(6), goal in arb_state(6)) {
        prop_assert_eq!(state.unsatisfied_count(&goal) == 0, state.satisfies(&goal));
        prop_assert!(state.unsatisfied_count(&goal) <= goal.len());
    }

    #[test]
    fn mutual_satisfaction_means_same_facts(a in arb_state(6), b in arb_state(6)) {
        if a.satisfies(&b) && b.satisfies(&a) {
            prop_assert_eq!(a.len(), b.len());
            for symbol in a.iter() {
                prop_assert_eq!(b.get(symbol.key()), Some(&symbol.value));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Composites
// ---------------------------------------------------------------------------

struct Outcome {
    status: BehaviorStatus,
    starts: Rc<Cell<usize>>,
}

impl Task for Outcome {
    fn on_start(&mut self, _ctx: &mut Context) -> Result<()> {
        self.starts.set(self.starts.get() + 1);
        Ok(())
    }

    fn on_update(&mut self, _ctx: &mut Context) -> Result<BehaviorStatus> {
        Ok(self.status)
    }
}

fn run_composite(
    make: fn(Vec<Behavior>) -> Behavior,
    outcomes: &[bool],
) -> (BehaviorStatus, usize) {
    let starts = Rc::new(Cell::new(0));
    let children = outcomes
        .iter()
        .map(|&success| {
            Behavior::task(Outcome {
                status: if success {
                    BehaviorStatus::Success
                } else {
                    BehaviorStatus::Failure
                },
                starts: starts.clone(),
            })
        })
        .collect();
    let mut tree = BehaviorTree::new(make(children));
    let mut blackboard = Blackboard::new();
    let mut status = BehaviorStatus::Running;
    for _ in 0..=outcomes.len() {
        status = tree
            .tick(0.1, AgentId(0), &mut blackboard, &mut NullHost)
            .expect("composites only fail through child statuses");
        if status.is_terminal() {
            break;
        }
    }
    (status, starts.get())
}

proptest! {
    #[test]
    fn sequence_succeeds_iff_all_children_succeed(outcomes in prop::collection::vec(any::<bool>(), 0..8)) {
        let (status, starts) = run_composite(Behavior::sequence, &outcomes);
        let expected_starts = outcomes.iter().position(|s| !s).map_or(outcomes.len(), |i| i + 1);
        let expected = if outcomes.iter().all(|&s| s) {
            BehaviorStatus::Success
        } else {
            BehaviorStatus::Failure
        };
        prop_assert_eq!(status, expected);
        prop_assert_eq!(starts, expected_starts);
    }

    #[test]
    fn selector_succeeds_iff_any_child_succeeds(outcomes in prop::collection::vec(any::<bool>(), 0..8)) {
        let (status, starts) = run_composite(Behavior::selector, &outcomes);
        let expected_starts = outcomes.iter().position(|&s| s).map_or(outcomes.len(), |i| i + 1);
        let expected = if outcomes.iter().any(|&s| s) {
            BehaviorStatus::Success
        } else {
            BehaviorStatus::Failure
        };
        prop_assert_eq!(status, expected);
        prop_assert_eq!(starts, expected_starts);
    }
}

// ---------------------------------------------------------------------------
// Planner
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn plans_are_executable(
        current in arb_state(4),
        goal in arb_state(3),
        actions in prop::collection::vec(arb_action(), 0..6),
    ) {
        let goal = Goal::new("goal", goal);
        match Planner::default().plan(&current, &goal, &actions) {
            Ok(plan) => {
                let mut state = current.clone();
                let mut cost = 0f32;
                for action in &plan.actions {
                    prop_assert!(action.is_applicable(&state));
                    state = action.apply(&state);
                    cost += action.cost;
                }
                prop_assert!(goal.is_satisfied_by(&state));
                prop_assert!((cost - plan.total_cost).abs() < 1e-3);
                if current.satisfies(&goal.desired_state) {
                    prop_assert!(plan.is_empty());
                }
            }
            Err(err) => {
                prop_assert_eq!(err.kind(), ErrorKind::NoPlanFound);
                prop_assert!(!current.satisfies(&goal.desired_state));
            }
        }
    }

    #[test]
    fn single_step_goals_cost_at_most_the_cheapest_direct_action(
        current in arb_state(4),
        actions in prop::collection::vec(arb_action(), 1..6),
    ) {
        let applicable: Vec<&Action> = actions.iter().filter(|a| a.is_applicable(&current)).collect();
        for action in applicable {
            let target = action.apply(&current);
            if target == current {
                continue;
            }
            let goal = Goal::new("reach", target.clone());
            let plan = Planner::default().plan(&current, &goal, &actions);
            prop_assert!(plan.is_ok());
            if let Ok(plan) = plan {
                prop_assert!(plan.total_cost <= action.cost + 1e-4);
            }
        }
    }
}
