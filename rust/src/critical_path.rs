//! Critical path calculation using forward and backward passes.
//!
//! Assumes unlimited parallelism: every task starts as soon as its dependencies
//! finish. Used for slack and critical-path analysis; see `leveling` for the
//! single-person timeline.

use chrono::{NaiveDateTime, NaiveTime};
use thiserror::Error;

use crate::calendar::{
    add_working_hours, hours_to_duration, skip_weekends_forward, snap_to_work_start,
    subtract_working_hours, working_hours_between, working_window_for,
};
use crate::config::{ConfigError, ProjectConfig};
use crate::graph::{build_graph, GraphError, TaskGraph};
use crate::log_debug;
use crate::models::{ScheduledTask, Task, TaskMap, TaskStatus};

/// Errors that abort a scheduling call. No partial schedule is ever returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("Invalid project configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Per-task timing from the forward and backward passes.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskTiming {
    pub earliest_start: NaiveDateTime,
    pub earliest_finish: NaiveDateTime,
    pub latest_start: NaiveDateTime,
    pub latest_finish: NaiveDateTime,
    /// Working hours between earliest and latest finish, rounded to 2 places.
    pub slack: f64,
}

/// Resolve a deadline to the instant it constrains: a bare date (midnight) means
/// the end of that date's working window.
pub fn resolve_deadline(deadline: NaiveDateTime, config: &ProjectConfig) -> NaiveDateTime {
    if deadline.time() != NaiveTime::MIN {
        return deadline;
    }
    let (day_start, hours) = working_window_for(deadline.date(), config);
    day_start + hours_to_duration(hours)
}

/// Start and finish for a task whose constraints allow it to begin at `floor`.
///
/// Done tasks with both timestamps keep them; in-progress tasks start at their
/// recorded start; everything else starts at the first working instant at or
/// after `floor` (and its proposed start).
pub(crate) fn place_task(
    task: &Task,
    floor: NaiveDateTime,
    config: &ProjectConfig,
) -> (NaiveDateTime, NaiveDateTime) {
    if let Some(span) = task.completed_span() {
        return span;
    }
    let start = match task.in_progress_since() {
        Some(actual) => actual,
        None => {
            let floor = task.proposed_start.map_or(floor, |p| floor.max(p));
            skip_weekends_forward(snap_to_work_start(floor, config), config)
        }
    };
    (start, add_working_hours(start, task.duration_hrs, config))
}

fn round_slack(hours: f64) -> f64 {
    (hours * 100.0).round() / 100.0
}

/// Run both passes over a validated graph. Timings are indexed like the graph.
pub(crate) fn compute_timings(
    tasks: &TaskMap,
    graph: &TaskGraph<'_>,
    config: &ProjectConfig,
    now: NaiveDateTime,
) -> Vec<TaskTiming> {
    let n = graph.len();
    let mut es = vec![config.start_date; n];
    let mut ef = vec![config.start_date; n];

    // Forward pass
    for &idx in graph.topological_order() {
        let task = &tasks[graph.id(idx)];
        let mut floor = graph
            .predecessors(idx)
            .iter()
            .map(|&p| ef[p])
            .max()
            .unwrap_or(config.start_date);
        // Not-started work cannot be planned in the past
        if task.status == TaskStatus::NotStarted {
            floor = floor.max(now);
        }
        (es[idx], ef[idx]) = place_task(task, floor, config);
        log_debug!("forward {}: es={} ef={}", task.id, es[idx], ef[idx]);
    }

    let project_end = ef.iter().copied().max().unwrap_or(config.start_date);

    // Backward pass
    let mut ls = vec![project_end; n];
    let mut lf = vec![project_end; n];
    for &idx in graph.topological_order().iter().rev() {
        let task = &tasks[graph.id(idx)];
        if let Some((start, end)) = task.completed_span() {
            ls[idx] = start;
            lf[idx] = end;
            continue;
        }

        let mut finish = graph
            .successors(idx)
            .iter()
            .map(|&s| ls[s])
            .min()
            .unwrap_or(project_end);
        if let Some(deadline) = task.deadline {
            finish = finish.min(resolve_deadline(deadline, config));
        }
        lf[idx] = finish;
        ls[idx] = subtract_working_hours(finish, task.duration_hrs, config);
        log_debug!("backward {}: ls={} lf={}", task.id, ls[idx], lf[idx]);
    }

    (0..n)
        .map(|idx| {
            let slack = if ef[idx] <= lf[idx] {
                working_hours_between(ef[idx], lf[idx], config)
            } else {
                // Projected to overrun its latest allowed finish
                -working_hours_between(lf[idx], ef[idx], config)
            };
            TaskTiming {
                earliest_start: es[idx],
                earliest_finish: ef[idx],
                latest_start: ls[idx],
                latest_finish: lf[idx],
                slack: round_slack(slack),
            }
        })
        .collect()
}

/// Full forward + backward pass schedule, one entry per task in topological order.
pub fn calculate_schedule<'a>(
    tasks: &'a TaskMap,
    config: &ProjectConfig,
    now: NaiveDateTime,
) -> Result<Vec<ScheduledTask<'a>>, ScheduleError> {
    config.validate()?;
    let graph = build_graph(tasks)?;
    let timings = compute_timings(tasks, &graph, config, now);

    Ok(graph
        .topological_order()
        .iter()
        .map(|&idx| {
            let timing = &timings[idx];
            ScheduledTask {
                task: &tasks[graph.id(idx)],
                earliest_start: timing.earliest_start,
                earliest_finish: timing.earliest_finish,
                latest_start: timing.latest_start,
                latest_finish: timing.latest_finish,
                total_slack_hrs: timing.slack,
            }
        })
        .collect())
}

/// Tasks on the critical path (slack <= 0), in the order given.
pub fn get_critical_path<'a>(scheduled: &[ScheduledTask<'a>]) -> Vec<ScheduledTask<'a>> {
    scheduled.iter().filter(|s| s.is_critical()).cloned().collect()
}
