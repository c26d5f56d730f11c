//! Cycle guard.
//!
//! Adding `P -> S` closes a cycle exactly when `P` is already reachable from
//! `S`. The guard walks successor edges breadth-first from `S`, expanding each
//! task at most once, and stops as soon as `P` shows up.

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::error::GraphResult;
use crate::store::DependencyStore;
use crate::types::{Dependency, TaskId};

/// Check whether adding `predecessor_id -> successor_id` would create a cycle.
///
/// Reads the current edge set through `store`; nothing is cached between
/// calls. A self-loop trivially counts as a cycle.
pub async fn would_create_cycle(
    store: &dyn DependencyStore,
    predecessor_id: TaskId,
    successor_id: TaskId,
) -> GraphResult<bool> {
    if predecessor_id == successor_id {
        return Ok(true);
    }

    let mut visited: HashSet<TaskId> = HashSet::new();
    let mut queue: VecDeque<TaskId> = VecDeque::new();
    visited.insert(successor_id);
    queue.push_back(successor_id);

    while let Some(current) = queue.pop_front() {
        for next in store.successors(current).await? {
            if next == predecessor_id {
                debug!(
                    predecessor_id,
                    successor_id,
                    visited = visited.len(),
                    "cycle guard found a path back to the predecessor"
                );
                return Ok(true);
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    debug!(
        predecessor_id,
        successor_id,
        visited = visited.len(),
        "cycle guard found no path"
    );
    Ok(false)
}

/// Successor lists keyed by predecessor, in deterministic order.
pub fn adjacency(edges: &[Dependency]) -> BTreeMap<TaskId, Vec<TaskId>> {
    let mut adj: BTreeMap<TaskId, Vec<TaskId>> = BTreeMap::new();
    for edge in edges {
        adj.entry(edge.predecessor_id)
            .or_default()
            .push(edge.successor_id);
    }
    for successors in adj.values_mut() {
        successors.sort_unstable();
    }
    adj
}

/// In-memory reachability: is there a path `from -> ... -> to`?
///
/// A node reaches itself.
pub fn reaches(adj: &BTreeMap<TaskId, Vec<TaskId>>, from: TaskId, to: TaskId) -> bool {
    if from == to {
        return true;
    }

    let mut visited: HashSet<TaskId> = HashSet::from([from]);
    let mut queue: VecDeque<TaskId> = VecDeque::from([from]);

    while let Some(current) = queue.pop_front() {
        let Some(successors) = adj.get(&current) else {
            continue;
        };
        for &next in successors {
            if next == to {
                return true;
            }
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }

    false
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Find one directed cycle in an edge set.
///
/// Returns the cycle as a path whose first and last element are the same
/// task, e.g. `[1, 2, 3, 1]`. `None` means the edge set is acyclic.
pub fn find_cycle(edges: &[Dependency]) -> Option<Vec<TaskId>> {
    let adj = adjacency(edges);
    let mut marks: HashMap<TaskId, Mark> = HashMap::new();

    for &root in adj.keys() {
        if marks.contains_key(&root) {
            continue;
        }

        // Iterative DFS: `path` is the current stack, `cursors` the next
        // successor index to explore for each frame.
        let mut path: Vec<TaskId> = vec![root];
        let mut cursors: Vec<usize> = vec![0];
        marks.insert(root, Mark::OnPath);

        while let (Some(&node), Some(cursor)) = (path.last(), cursors.last_mut()) {
            let next = adj.get(&node).and_then(|s| s.get(*cursor)).copied();
            match next {
                Some(next) => {
                    *cursor += 1;
                    match marks.get(&next) {
                        Some(Mark::OnPath) => {
                            let start = path.iter().position(|&n| n == next).unwrap_or(0);
                            let mut cycle = path[start..].to_vec();
                            cycle.push(next);
                            return Some(cycle);
                        }
                        Some(Mark::Done) => {}
                        None => {
                            marks.insert(next, Mark::OnPath);
                            path.push(next);
                            cursors.push(0);
                        }
                    }
                }
                None => {
                    marks.insert(node, Mark::Done);
                    path.pop();
                    cursors.pop();
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::types::{DependencyType, NewDependency, TaskSummary};

    fn edge(id: i64, from: TaskId, to: TaskId) -> Dependency {
        Dependency {
            id,
            predecessor_id: from,
            successor_id: to,
            dep_type: DependencyType::FinishToStart,
            lag: 0,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn reaches_follows_direction() {
        let adj = adjacency(&[edge(1, 1, 2), edge(2, 2, 3)]);
        assert!(reaches(&adj, 1, 3));
        assert!(!reaches(&adj, 3, 1));
        assert!(reaches(&adj, 4, 4));
        assert!(!reaches(&adj, 4, 1));
    }

    #[test]
    fn reaches_terminates_on_diamonds() {
        let adj = adjacency(&[
            edge(1, 1, 2),
            edge(2, 1, 3),
            edge(3, 2, 4),
            edge(4, 3, 4),
            edge(5, 4, 5),
        ]);
        assert!(reaches(&adj, 1, 5));
        assert!(!reaches(&adj, 5, 1));
    }

    #[test]
    fn find_cycle_on_acyclic_graph() {
        assert_eq!(find_cycle(&[]), None);
        assert_eq!(
            find_cycle(&[edge(1, 1, 2), edge(2, 1, 3), edge(3, 2, 3)]),
            None
        );
    }

    #[test]
    fn find_cycle_reports_closed_path() {
        let cycle = find_cycle(&[edge(1, 1, 2), edge(2, 2, 3), edge(3, 3, 1), edge(4, 3, 4)])
            .expect("cycle expected");
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle, vec![1, 2, 3, 1]);
    }

    #[test]
    fn find_cycle_reports_two_node_cycle() {
        let cycle = find_cycle(&[edge(1, 5, 6), edge(2, 6, 5)]).expect("cycle expected");
        assert_eq!(cycle, vec![5, 6, 5]);
    }

    #[tokio::test]
    async fn guard_detects_transitive_path() {
        let store = MemoryStore::new();
        for id in 1..=3 {
            store.put_task(TaskSummary::new(id, format!("t{id}"))).await;
        }
        store.create(&NewDependency::new(1, 2)).await.unwrap();
        store.create(&NewDependency::new(2, 3)).await.unwrap();

        assert!(would_create_cycle(&store, 3, 1).await.unwrap());
        assert!(would_create_cycle(&store, 2, 1).await.unwrap());
        assert!(!would_create_cycle(&store, 1, 3).await.unwrap());
        assert!(!would_create_cycle(&store, 4, 1).await.unwrap());
    }

    #[tokio::test]
    async fn guard_treats_self_loop_as_cycle() {
        let store = MemoryStore::new();
        assert!(would_create_cycle(&store, 9, 9).await.unwrap());
    }
}
