//! Read-only planning views built on top of the scheduler outputs.
//!
//! Everything here calls [`calculate_schedule`] and/or [`resource_level`] and
//! summarizes the result; nothing mutates tasks.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use crate::calendar::{
    day_end, duration_to_hours, next_day_start, skip_weekends_forward, working_hours_between,
    working_window_for,
};
use crate::config::ProjectConfig;
use crate::critical_path::{calculate_schedule, get_critical_path, resolve_deadline, ScheduleError};
use crate::graph::natural_cmp;
use crate::leveling::resource_level;
use crate::models::{ScheduledTask, Task, TaskMap, TaskStatus};

/// Blocks shorter than this are dropped from daily plans.
const MIN_BLOCK_HRS: f64 = 0.01;

/// Actual-vs-estimate difference below which a task counts as on target.
const ON_TARGET_HRS: f64 = 0.1;

fn tasks_in_natural_order(tasks: &TaskMap) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.values().collect();
    sorted.sort_by(|a, b| natural_cmp(&a.id, &b.id));
    sorted
}

/// A task whose leveled finish lands after its deadline.
#[derive(Clone, Debug, PartialEq)]
pub struct LateTask<'a> {
    pub task: &'a Task,
    pub deadline: NaiveDateTime,
    pub projected_finish: NaiveDateTime,
}

/// Project-wide progress summary.
#[derive(Clone, Debug, PartialEq)]
pub struct ProjectStatus<'a> {
    pub total: usize,
    pub done: usize,
    pub in_progress: usize,
    pub not_started: usize,
    pub total_hrs: f64,
    pub done_hrs: f64,
    pub remaining_hrs: f64,
    /// Share of estimated hours already done, 0-100.
    pub percent_complete: f64,
    /// Latest leveled finish; `None` for an empty project.
    pub projected_completion: Option<NaiveDateTime>,
    pub late: Vec<LateTask<'a>>,
    pub critical_count: usize,
    pub critical_hrs: f64,
}

impl<'a> ProjectStatus<'a> {
    pub fn compute(
        tasks: &'a TaskMap,
        config: &ProjectConfig,
        now: NaiveDateTime,
    ) -> Result<Self, ScheduleError> {
        let mut status = ProjectStatus {
            total: tasks.len(),
            done: 0,
            in_progress: 0,
            not_started: 0,
            total_hrs: 0.0,
            done_hrs: 0.0,
            remaining_hrs: 0.0,
            percent_complete: 0.0,
            projected_completion: None,
            late: Vec::new(),
            critical_count: 0,
            critical_hrs: 0.0,
        };

        for task in tasks.values() {
            status.total_hrs += task.duration_hrs;
            match task.status {
                TaskStatus::Done => {
                    status.done += 1;
                    status.done_hrs += task.duration_hrs;
                }
                TaskStatus::InProgress => status.in_progress += 1,
                TaskStatus::NotStarted => status.not_started += 1,
            }
        }
        status.remaining_hrs = status.total_hrs - status.done_hrs;
        if status.total_hrs > 0.0 {
            status.percent_complete = status.done_hrs / status.total_hrs * 100.0;
        }

        let leveled = resource_level(tasks, config, now)?;
        status.projected_completion = leveled.iter().map(|s| s.earliest_finish).max();
        status.late = leveled
            .iter()
            .filter_map(|s| {
                let deadline = resolve_deadline(s.task.deadline?, config);
                (s.earliest_finish > deadline).then_some(LateTask {
                    task: s.task,
                    deadline,
                    projected_finish: s.earliest_finish,
                })
            })
            .collect();

        let critical = get_critical_path(&calculate_schedule(tasks, config, now)?);
        status.critical_count = critical.len();
        status.critical_hrs = critical.iter().map(|s| s.task.duration_hrs).sum();

        Ok(status)
    }
}

/// What to work on right now.
#[derive(Clone, Debug, PartialEq)]
pub struct NextAction<'a> {
    /// Tasks currently in progress, in natural ID order.
    pub in_progress: Vec<&'a Task>,
    /// Ready background tasks worth kicking off now.
    pub kick_off: Vec<ScheduledTask<'a>>,
    /// First foreground task to pick up when nothing is in progress.
    pub next_up: Option<ScheduledTask<'a>>,
}

impl NextAction<'_> {
    pub fn all_done(&self) -> bool {
        self.in_progress.is_empty() && self.kick_off.is_empty() && self.next_up.is_none()
    }
}

/// Suggest the next step given the leveled schedule.
///
/// "Leveled order" is the order of leveled start times; ties keep topological
/// order.
pub fn next_action<'a>(
    tasks: &'a TaskMap,
    config: &ProjectConfig,
    now: NaiveDateTime,
) -> Result<NextAction<'a>, ScheduleError> {
    let mut leveled = resource_level(tasks, config, now)?;
    leveled.sort_by_key(|s| s.earliest_start);

    let in_progress: Vec<&Task> = tasks_in_natural_order(tasks)
        .into_iter()
        .filter(|t| t.status == TaskStatus::InProgress)
        .collect();

    let deps_done = |task: &Task| {
        task.depends_on
            .iter()
            .all(|dep| tasks.get(dep).is_some_and(|d| d.status == TaskStatus::Done))
    };
    let mut ready_background = leveled.iter().filter(|s| {
        s.task.background && s.task.status == TaskStatus::NotStarted && deps_done(s.task)
    });

    if !in_progress.is_empty() {
        let background_running = in_progress.iter().any(|t| t.background);
        let kick_off = if background_running {
            Vec::new()
        } else {
            ready_background.next().cloned().into_iter().collect()
        };
        return Ok(NextAction {
            in_progress,
            kick_off,
            next_up: None,
        });
    }

    let kick_off = ready_background.cloned().collect();
    let next_up = leveled
        .iter()
        .find(|s| s.task.status != TaskStatus::Done && !s.task.background)
        .cloned();

    Ok(NextAction {
        in_progress,
        kick_off,
        next_up,
    })
}

/// One contiguous stretch of a task within a single working day.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeBlock<'a> {
    pub task: &'a Task,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub hours: f64,
    pub critical: bool,
    pub background: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DayPlan<'a> {
    pub date: NaiveDate,
    /// Ordered by start.
    pub blocks: Vec<TimeBlock<'a>>,
}

impl DayPlan<'_> {
    /// Hours that need the person's attention.
    pub fn attended_hours(&self) -> f64 {
        self.blocks
            .iter()
            .filter(|b| !b.background)
            .map(|b| b.hours)
            .sum()
    }

    pub fn background_hours(&self) -> f64 {
        self.blocks
            .iter()
            .filter(|b| b.background)
            .map(|b| b.hours)
            .sum()
    }
}

/// Split a leveled span into per-day blocks clipped to each working window.
fn split_into_days<'a>(
    scheduled: &ScheduledTask<'a>,
    critical: bool,
    config: &ProjectConfig,
) -> Vec<TimeBlock<'a>> {
    let mut blocks = Vec::new();
    let mut remaining = scheduled.task.duration_hrs;
    let mut current = scheduled.earliest_start;

    while remaining > MIN_BLOCK_HRS && current < scheduled.earliest_finish {
        current = skip_weekends_forward(current, config);
        let date = current.date();
        let (window_start, _) = working_window_for(date, config);
        let start = current.max(window_start);
        let end = scheduled.earliest_finish.min(day_end(date, config));
        let hours = duration_to_hours(end - start).max(0.0);

        if hours > MIN_BLOCK_HRS {
            blocks.push(TimeBlock {
                task: scheduled.task,
                start,
                end,
                hours,
                critical,
                background: scheduled.task.background,
            });
            remaining -= hours;
        }
        current = next_day_start(date, config);
    }

    blocks
}

/// Day-by-day view of the remaining work, for the first `days` days that have any.
pub fn daily_plan<'a>(
    tasks: &'a TaskMap,
    config: &ProjectConfig,
    now: NaiveDateTime,
    days: usize,
) -> Result<Vec<DayPlan<'a>>, ScheduleError> {
    let leveled = resource_level(tasks, config, now)?;
    let critical_ids: Vec<&str> = get_critical_path(&calculate_schedule(tasks, config, now)?)
        .iter()
        .map(|s| s.task.id.as_str())
        .collect();

    let mut by_date: BTreeMap<NaiveDate, Vec<TimeBlock<'a>>> = BTreeMap::new();
    for scheduled in leveled.iter().filter(|s| s.task.status != TaskStatus::Done) {
        let critical = critical_ids.contains(&scheduled.id());
        for block in split_into_days(scheduled, critical, config) {
            by_date.entry(block.start.date()).or_default().push(block);
        }
    }

    Ok(by_date
        .into_iter()
        .take(days)
        .map(|(date, mut blocks)| {
            blocks.sort_by_key(|b| b.start);
            DayPlan { date, blocks }
        })
        .collect())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EstimateVerdict {
    OnTarget,
    Over,
    Under,
}

/// Estimated versus actual working hours for a finished task.
#[derive(Clone, Debug, PartialEq)]
pub struct EstimateReport {
    pub estimated_hrs: f64,
    pub actual_hrs: f64,
    /// `actual - estimated`; positive means it ran over.
    pub diff_hrs: f64,
    pub verdict: EstimateVerdict,
}

impl EstimateReport {
    /// `None` unless the task is done with both timestamps recorded.
    pub fn for_task(task: &Task, config: &ProjectConfig) -> Option<Self> {
        let (start, end) = task.completed_span()?;
        let actual_hrs = working_hours_between(start, end, config);
        let diff_hrs = actual_hrs - task.duration_hrs;
        let verdict = if diff_hrs.abs() < ON_TARGET_HRS {
            EstimateVerdict::OnTarget
        } else if diff_hrs > 0.0 {
            EstimateVerdict::Over
        } else {
            EstimateVerdict::Under
        };
        Some(Self {
            estimated_hrs: task.duration_hrs,
            actual_hrs,
            diff_hrs,
            verdict,
        })
    }
}
