//! Core data types for the scheduling system.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Task table keyed by task ID, as loaded from the store.
pub type TaskMap = FxHashMap<String, Task>;

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single schedulable unit of work.
///
/// The ID is the key in the task table and is not repeated in the persisted body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    /// Estimated effort in working hours.
    pub duration_hrs: f64,
    #[serde(default)]
    pub depends_on: Vec<String>,
    /// Latest finish. A midnight value means end of that working day.
    #[serde(default, with = "crate::timestamp::iso_opt")]
    pub deadline: Option<NaiveDateTime>,
    /// Hard floor on earliest start.
    #[serde(default, with = "crate::timestamp::iso_opt")]
    pub proposed_start: Option<NaiveDateTime>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, with = "crate::timestamp::iso_opt")]
    pub actual_start: Option<NaiveDateTime>,
    #[serde(default, with = "crate::timestamp::iso_opt")]
    pub actual_end: Option<NaiveDateTime>,
    /// Runs unattended; never occupies the person's clock.
    #[serde(default)]
    pub background: bool,
    /// Excluded from urgency ordering; reported with infinite slack when leveled.
    #[serde(default)]
    pub flexible: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub project: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, name: impl Into<String>, duration_hrs: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            duration_hrs,
            depends_on: Vec::new(),
            deadline: None,
            proposed_start: None,
            status: TaskStatus::NotStarted,
            actual_start: None,
            actual_end: None,
            background: false,
            flexible: false,
            tags: Vec::new(),
            project: None,
        }
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = deps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_deadline(mut self, deadline: NaiveDateTime) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_proposed_start(mut self, start: NaiveDateTime) -> Self {
        self.proposed_start = Some(start);
        self
    }

    pub fn background(mut self) -> Self {
        self.background = true;
        self
    }

    pub fn flexible(mut self) -> Self {
        self.flexible = true;
        self
    }

    /// Recorded (start, end) if this task is done with both timestamps set.
    pub fn completed_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        match (self.status, self.actual_start, self.actual_end) {
            (TaskStatus::Done, Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }

    /// Recorded start if this task is in progress.
    pub fn in_progress_since(&self) -> Option<NaiveDateTime> {
        match self.status {
            TaskStatus::InProgress => self.actual_start,
            _ => None,
        }
    }

    /// Whether the leveler runs this task outside the shared clock.
    pub fn is_out_of_band(&self) -> bool {
        self.background || self.flexible
    }

    /// Mark in progress as of `now`.
    pub fn start(&mut self, now: NaiveDateTime) {
        self.status = TaskStatus::InProgress;
        self.actual_start = Some(now);
    }

    /// Mark done as of `now`. A task never started gets a zero-length span.
    pub fn complete(&mut self, now: NaiveDateTime) {
        self.status = TaskStatus::Done;
        self.actual_end = Some(now);
        if self.actual_start.is_none() {
            self.actual_start = Some(now);
        }
    }

    /// Undo start/done.
    pub fn reset(&mut self) {
        self.status = TaskStatus::NotStarted;
        self.actual_start = None;
        self.actual_end = None;
    }
}

/// Computed schedule for one task. Built fresh per scheduling call, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduledTask<'a> {
    pub task: &'a Task,
    pub earliest_start: NaiveDateTime,
    pub earliest_finish: NaiveDateTime,
    pub latest_start: NaiveDateTime,
    pub latest_finish: NaiveDateTime,
    /// Working hours of float; negative when projected to overrun, infinite for
    /// flexible tasks in the leveled view.
    pub total_slack_hrs: f64,
}

impl ScheduledTask<'_> {
    pub fn id(&self) -> &str {
        &self.task.id
    }

    pub fn is_critical(&self) -> bool {
        self.total_slack_hrs <= 0.0
    }
}
