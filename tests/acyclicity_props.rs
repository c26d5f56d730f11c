//! Property tests for the cycle guard.
//!
//! Every create is checked against an in-memory oracle built from the edges
//! accepted so far.

use std::collections::HashSet;
use std::sync::Arc;

use proptest::prelude::*;
use proptest::test_runner::Config;
use task_deps::error::ErrorCode;
use task_deps::graph::DependencyGraph;
use task_deps::graph::cycle::{adjacency, find_cycle, reaches};
use task_deps::store::{DependencyStore, MemoryStore};
use task_deps::types::{NewDependency, TaskSummary};

const NODES: i64 = 8;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

async fn seeded_graph(nodes: i64) -> (MemoryStore, DependencyGraph) {
    let store = MemoryStore::new();
    for id in 1..=nodes {
        store.put_task(TaskSummary::new(id, format!("task {id}"))).await;
    }
    let graph = DependencyGraph::new(Arc::new(store.clone()), Arc::new(store.clone()));
    (store, graph)
}

fn expected_outcome(accepted: &[(i64, i64)], p: i64, s: i64) -> Option<ErrorCode> {
    if p == s {
        return Some(ErrorCode::SelfLoop);
    }
    if accepted.contains(&(p, s)) {
        return Some(ErrorCode::DuplicateEdge);
    }
    let edges = accepted
        .iter()
        .enumerate()
        .map(|(i, &(from, to))| task_deps::types::Dependency {
            id: i as i64 + 1,
            predecessor_id: from,
            successor_id: to,
            dep_type: Default::default(),
            lag: 0,
            created_at: 0,
            updated_at: 0,
        })
        .collect::<Vec<_>>();
    if reaches(&adjacency(&edges), s, p) {
        return Some(ErrorCode::CircularDependency);
    }
    None
}

proptest! {
    #![proptest_config(Config::with_cases(96))]

    #[test]
    fn guard_matches_reachability_oracle(
        attempts in prop::collection::vec((1..=NODES, 1..=NODES), 0..40)
    ) {
        let outcome: Result<(), TestCaseError> = runtime().block_on(async {
            let (store, graph) = seeded_graph(NODES).await;
            let mut accepted: Vec<(i64, i64)> = Vec::new();

            for (p, s) in attempts {
                let expected = expected_outcome(&accepted, p, s);
                let result = graph.create_dependency(NewDependency::new(p, s)).await;
                match (expected, result) {
                    (None, Ok(dep)) => {
                        prop_assert_eq!((dep.predecessor_id, dep.successor_id), (p, s));
                        accepted.push((p, s));
                    }
                    (Some(code), Err(err)) => prop_assert_eq!(err.code, code),
                    (expected, result) => {
                        prop_assert!(false, "({p},{s}): expected {expected:?}, got {result:?}");
                    }
                }
            }

            let all = store.list_all().await.unwrap();
            prop_assert_eq!(all.len(), accepted.len());
            prop_assert_eq!(find_cycle(&all), None);
            Ok(())
        });
        outcome?;
    }

    #[test]
    fn every_edge_of_a_dag_is_accepted_in_any_order(
        ranking in Just((1..=NODES).collect::<Vec<i64>>()).prop_shuffle(),
        picks in prop::collection::vec((0..NODES as usize, 0..NODES as usize), 0..30)
    ) {
        // Edges only go forward in `ranking`, so the set is acyclic whatever
        // order it is inserted in.
        let mut seen = HashSet::new();
        let edges: Vec<(i64, i64)> = picks
            .into_iter()
            .filter(|(i, j)| i != j)
            .map(|(i, j)| (ranking[i.min(j)], ranking[i.max(j)]))
            .filter(|pair| seen.insert(*pair))
            .collect();

        let outcome: Result<(), TestCaseError> = runtime().block_on(async {
            let (store, graph) = seeded_graph(NODES).await;
            for &(p, s) in &edges {
                let result = graph.create_dependency(NewDependency::new(p, s)).await;
                prop_assert!(result.is_ok(), "({p},{s}) rejected: {result:?}");
            }
            prop_assert_eq!(store.edge_count().await, edges.len());
            Ok(())
        });
        outcome?;
    }
}
