//! Dependency graph construction and validation.
//!
//! Tasks are assigned dense indices in natural ID order (`T-2` before `T-10`) so
//! every per-task table downstream is a plain `Vec` indexed by position.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use thiserror::Error;

use crate::log_debug;
use crate::models::TaskMap;

/// Dense task index into a [`TaskGraph`].
pub type TaskIdx = usize;

/// Errors detected while building the dependency graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Task {task} depends on non-existent task {dependency}")]
    UnknownDependency { task: String, dependency: String },
    #[error("Circular dependency detected among tasks: {}", remaining.join(", "))]
    CyclicDependency { remaining: Vec<String> },
}

/// Compare task IDs treating a trailing number numerically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    fn split(s: &str) -> (&str, Option<u64>) {
        let prefix = s.trim_end_matches(|c: char| c.is_ascii_digit());
        (prefix, s[prefix.len()..].parse().ok())
    }
    let (prefix_a, num_a) = split(a);
    let (prefix_b, num_b) = split(b);
    prefix_a
        .cmp(prefix_b)
        .then(num_a.cmp(&num_b))
        .then(a.cmp(b))
}

/// Validated, acyclic dependency graph with one fixed topological order.
///
/// Edges run from a dependency to its dependent.
#[derive(Debug, Clone)]
pub struct TaskGraph<'a> {
    ids: Vec<&'a str>,
    index: FxHashMap<&'a str, TaskIdx>,
    predecessors: Vec<Vec<TaskIdx>>,
    successors: Vec<Vec<TaskIdx>>,
    topo_order: Vec<TaskIdx>,
}

impl<'a> TaskGraph<'a> {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.successors.iter().map(Vec::len).sum()
    }

    #[inline]
    pub fn id(&self, idx: TaskIdx) -> &'a str {
        self.ids[idx]
    }

    #[inline]
    pub fn index_of(&self, id: &str) -> Option<TaskIdx> {
        self.index.get(id).copied()
    }

    /// Tasks `idx` depends on.
    #[inline]
    pub fn predecessors(&self, idx: TaskIdx) -> &[TaskIdx] {
        &self.predecessors[idx]
    }

    /// Tasks that depend on `idx`.
    #[inline]
    pub fn successors(&self, idx: TaskIdx) -> &[TaskIdx] {
        &self.successors[idx]
    }

    /// Dependencies before dependents; ties resolved by natural ID order.
    pub fn topological_order(&self) -> &[TaskIdx] {
        &self.topo_order
    }

    /// Task IDs in topological order.
    pub fn topological_ids(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.topo_order.iter().map(move |&idx| self.ids[idx])
    }
}

/// Kahn's algorithm, always releasing the lowest ready index first.
fn topological_sort(
    predecessors: &[Vec<TaskIdx>],
    successors: &[Vec<TaskIdx>],
) -> Result<Vec<TaskIdx>, Vec<TaskIdx>> {
    let mut in_degree: Vec<usize> = predecessors.iter().map(Vec::len).collect();
    let mut ready: BTreeSet<TaskIdx> = in_degree
        .iter()
        .enumerate()
        .filter(|(_, &degree)| degree == 0)
        .map(|(idx, _)| idx)
        .collect();

    let mut order = Vec::with_capacity(predecessors.len());
    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        for &succ in &successors[idx] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.insert(succ);
            }
        }
    }

    if order.len() != predecessors.len() {
        let stuck = (0..predecessors.len())
            .filter(|&idx| in_degree[idx] > 0)
            .collect();
        return Err(stuck);
    }
    Ok(order)
}

/// Build the dependency graph, rejecting dangling references and cycles.
pub fn build_graph(tasks: &TaskMap) -> Result<TaskGraph<'_>, GraphError> {
    let mut ids: Vec<&str> = tasks.keys().map(String::as_str).collect();
    ids.sort_by(|a, b| natural_cmp(a, b));

    let index: FxHashMap<&str, TaskIdx> = ids
        .iter()
        .enumerate()
        .map(|(idx, &id)| (id, idx))
        .collect();

    let n = ids.len();
    let mut predecessors: Vec<Vec<TaskIdx>> = vec![Vec::new(); n];
    let mut successors: Vec<Vec<TaskIdx>> = vec![Vec::new(); n];

    for (idx, &id) in ids.iter().enumerate() {
        let task = &tasks[id];
        for dep in &task.depends_on {
            let Some(&dep_idx) = index.get(dep.as_str()) else {
                return Err(GraphError::UnknownDependency {
                    task: id.to_string(),
                    dependency: dep.clone(),
                });
            };
            // Duplicate entries are harmless; keep one edge
            if !predecessors[idx].contains(&dep_idx) {
                predecessors[idx].push(dep_idx);
                successors[dep_idx].push(idx);
            }
        }
    }

    let topo_order = topological_sort(&predecessors, &successors).map_err(|stuck| {
        GraphError::CyclicDependency {
            remaining: stuck.into_iter().map(|idx| ids[idx].to_string()).collect(),
        }
    })?;

    let graph = TaskGraph {
        ids,
        index,
        predecessors,
        successors,
        topo_order,
    };
    log_debug!(
        "Built dependency graph: {} tasks, {} edges",
        graph.len(),
        graph.edge_count()
    );
    Ok(graph)
}
