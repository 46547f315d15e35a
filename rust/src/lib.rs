//! Scheduling engine for a single person's task graph.
//!
//! Two views over the same tasks: [`calculate_schedule`] runs the classic
//! critical path method (unbounded parallelism) for slack analysis, and
//! [`resource_level`] produces the realistic one-task-at-a-time timeline.
//! Both work in working hours on the calendar described by [`ProjectConfig`].
//! The planning helpers summarize those views; [`JsonFileStore`] persists tasks.

pub mod calendar;
mod config;
mod critical_path;
mod graph;
mod leveling;
pub mod logging;
mod models;
mod planning;
mod store;
pub mod timestamp;

pub use calendar::{
    add_working_hours, hours_available, skip_weekends_backward, skip_weekends_forward,
    snap_to_work_start, subtract_working_hours, working_hours_between, working_window_for,
};
pub use config::{ConfigError, ProjectConfig};
pub use critical_path::{calculate_schedule, get_critical_path, resolve_deadline, ScheduleError};
pub use graph::{build_graph, natural_cmp, GraphError, TaskGraph, TaskIdx};
pub use leveling::{resource_level, LevelingState};
pub use models::{ScheduledTask, Task, TaskMap, TaskStatus};
pub use planning::{
    daily_plan, next_action, DayPlan, EstimateReport, EstimateVerdict, LateTask, NextAction,
    ProjectStatus, TimeBlock,
};
pub use store::{generate_id, JsonFileStore, StoreError, TaskStore, DEFAULT_DB_FILE};
pub use timestamp::{format_iso_datetime, parse_iso_datetime, TimestampError};
