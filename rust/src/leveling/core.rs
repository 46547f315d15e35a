//! Greedy single-resource leveling loop.

use chrono::NaiveDateTime;

use crate::calendar::{add_working_hours, skip_weekends_forward, snap_to_work_start};
use crate::config::ProjectConfig;
use crate::critical_path::{compute_timings, place_task, ScheduleError};
use crate::graph::{build_graph, TaskIdx};
use crate::models::{ScheduledTask, Task, TaskMap};
use crate::{log_changes, log_checks};

use super::state::LevelingState;

/// Placement on the shared timeline.
///
/// Same as the CPM placement except that in-progress work resumes no earlier
/// than `floor`, so it never overlaps whatever the clock has already committed.
fn place_on_clock(
    task: &Task,
    floor: NaiveDateTime,
    config: &ProjectConfig,
) -> (NaiveDateTime, NaiveDateTime) {
    let Some(actual_start) = task.in_progress_since() else {
        return place_task(task, floor, config);
    };
    let floor = task.proposed_start.map_or(floor, |p| floor.max(p));
    if floor <= actual_start {
        return place_task(task, floor, config);
    }
    let start = skip_weekends_forward(snap_to_work_start(floor, config), config);
    (start, add_working_hours(start, task.duration_hrs, config))
}

/// Single-person schedule: at most one foreground task at a time.
///
/// Runs the CPM passes first and uses their slack as the urgency key. Each round
/// places every ready background/flexible task (without touching the clock), then
/// the ready foreground task with the least slack, advancing the clock to its
/// finish. Results come back in topological order with latest start/finish taken
/// from the CPM view; flexible tasks report infinite slack.
pub fn resource_level<'a>(
    tasks: &'a TaskMap,
    config: &ProjectConfig,
    now: NaiveDateTime,
) -> Result<Vec<ScheduledTask<'a>>, ScheduleError> {
    config.validate()?;
    let graph = build_graph(tasks)?;
    let timings = compute_timings(tasks, &graph, config, now);

    let mut state = LevelingState::new(config.start_date.max(now), &graph);

    while !state.is_done() {
        let ready = state.ready_tasks(&graph);
        if ready.is_empty() {
            // Unreachable for a validated DAG
            break;
        }

        let (out_of_band, foreground): (Vec<TaskIdx>, Vec<TaskIdx>) = ready
            .into_iter()
            .partition(|&idx| tasks[graph.id(idx)].is_out_of_band());
        log_checks!(
            "Clock {}: {} out-of-band ready, {} foreground ready",
            state.clock,
            out_of_band.len(),
            foreground.len()
        );

        for idx in out_of_band {
            let task = &tasks[graph.id(idx)];
            let floor = state
                .clock
                .max(state.dependency_finish(idx, &graph, config.start_date));
            let (start, finish) = place_on_clock(task, floor, config);
            state.place(idx, start, finish);
            log_changes!("Placed {} alongside: {} -> {}", task.id, start, finish);
        }

        // Most urgent first; ties keep topological order
        let Some(chosen) = foreground
            .into_iter()
            .min_by(|&a, &b| timings[a].slack.total_cmp(&timings[b].slack))
        else {
            continue;
        };

        let task = &tasks[graph.id(chosen)];
        let floor = state
            .clock
            .max(state.dependency_finish(chosen, &graph, config.start_date));
        let (start, finish) = place_on_clock(task, floor, config);
        state.place(chosen, start, finish);

        // Completed work already happened; it does not occupy the person now
        if task.completed_span().is_none() {
            state.advance_clock(finish);
        }
        log_changes!(
            "Placed {} (slack {}): {} -> {}, clock now {}",
            task.id,
            timings[chosen].slack,
            start,
            finish,
            state.clock
        );
    }

    Ok(graph
        .topological_order()
        .iter()
        .map(|&idx| {
            let task = &tasks[graph.id(idx)];
            let timing = &timings[idx];
            let (earliest_start, earliest_finish) = state.placed[idx]
                .unwrap_or((timing.earliest_start, timing.earliest_finish));
            ScheduledTask {
                task,
                earliest_start,
                earliest_finish,
                latest_start: timing.latest_start,
                latest_finish: timing.latest_finish,
                total_slack_hrs: if task.flexible {
                    f64::INFINITY
                } else {
                    timing.slack
                },
            }
        })
        .collect())
}
