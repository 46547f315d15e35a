//! Simulation state for the leveling loop.

use chrono::NaiveDateTime;

use crate::graph::{TaskGraph, TaskIdx};

/// Shared clock plus the placements made so far, indexed like the task graph.
#[derive(Clone, Debug)]
pub struct LevelingState {
    /// When the person is next free for foreground work.
    pub clock: NaiveDateTime,
    /// (start, finish) per task once placed.
    pub placed: Vec<Option<(NaiveDateTime, NaiveDateTime)>>,
    /// Unplaced tasks, kept in topological order.
    pub unscheduled: Vec<TaskIdx>,
}

impl LevelingState {
    pub fn new(clock: NaiveDateTime, graph: &TaskGraph<'_>) -> Self {
        Self {
            clock,
            placed: vec![None; graph.len()],
            unscheduled: graph.topological_order().to_vec(),
        }
    }

    pub fn is_done(&self) -> bool {
        self.unscheduled.is_empty()
    }

    /// Unplaced tasks whose dependencies have all been placed, in topological order.
    ///
    /// Readiness depends only on placement order, not on simulated time.
    pub fn ready_tasks(&self, graph: &TaskGraph<'_>) -> Vec<TaskIdx> {
        self.unscheduled
            .iter()
            .copied()
            .filter(|&idx| {
                graph
                    .predecessors(idx)
                    .iter()
                    .all(|&p| self.placed[p].is_some())
            })
            .collect()
    }

    /// Latest finish among placed dependencies, or `default` when there are none.
    pub fn dependency_finish(
        &self,
        idx: TaskIdx,
        graph: &TaskGraph<'_>,
        default: NaiveDateTime,
    ) -> NaiveDateTime {
        graph
            .predecessors(idx)
            .iter()
            .filter_map(|&p| self.placed[p].map(|(_, finish)| finish))
            .max()
            .unwrap_or(default)
    }

    /// Record a placement and drop the task from the unscheduled list.
    pub fn place(&mut self, idx: TaskIdx, start: NaiveDateTime, finish: NaiveDateTime) {
        self.placed[idx] = Some((start, finish));
        self.unscheduled.retain(|&u| u != idx);
    }

    /// Move the clock forward to `to`; never backward.
    pub fn advance_clock(&mut self, to: NaiveDateTime) {
        self.clock = self.clock.max(to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::models::{Task, TaskMap};
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 2, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn chain() -> TaskMap {
        [
            Task::new("T-1", "a", 2.0),
            Task::new("T-2", "b", 2.0).with_deps(["T-1"]),
            Task::new("T-3", "c", 2.0),
        ]
        .into_iter()
        .map(|t| (t.id.clone(), t))
        .collect()
    }

    #[test]
    fn test_readiness_follows_placement() {
        let tasks = chain();
        let graph = build_graph(&tasks).unwrap();
        let mut state = LevelingState::new(at(23, 9), &graph);

        let ids = |v: Vec<TaskIdx>| v.into_iter().map(|i| graph.id(i)).collect::<Vec<_>>();
        assert_eq!(ids(state.ready_tasks(&graph)), vec!["T-1", "T-3"]);

        let t1 = graph.index_of("T-1").unwrap();
        state.place(t1, at(23, 9), at(23, 11));
        assert_eq!(ids(state.ready_tasks(&graph)), vec!["T-2", "T-3"]);
        assert!(!state.is_done());

        let t2 = graph.index_of("T-2").unwrap();
        assert_eq!(state.dependency_finish(t2, &graph, at(1, 0)), at(23, 11));
        let t3 = graph.index_of("T-3").unwrap();
        assert_eq!(state.dependency_finish(t3, &graph, at(1, 0)), at(1, 0));
    }

    #[test]
    fn test_clock_never_moves_backward() {
        let tasks = chain();
        let graph = build_graph(&tasks).unwrap();
        let mut state = LevelingState::new(at(24, 9), &graph);

        state.advance_clock(at(23, 17));
        assert_eq!(state.clock, at(24, 9));
        state.advance_clock(at(24, 15));
        assert_eq!(state.clock, at(24, 15));
    }
}
