//! Persistence of the project config and task table.
//!
//! The scheduler never touches storage: callers load, mutate, and save.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::ProjectConfig;
use crate::graph::natural_cmp;
use crate::log_changes;
use crate::models::{Task, TaskMap};

/// File used when no path is given.
pub const DEFAULT_DB_FILE: &str = "thesis_tasks.json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access task store: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed task store: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Task store root must be a JSON object")]
    NotAnObject,
}

/// Somewhere a project can be loaded from and saved to.
pub trait TaskStore {
    /// Config (if stored) and the task table. A store with nothing in it yet
    /// yields `(None, empty)`.
    fn load(&self) -> Result<(Option<ProjectConfig>, TaskMap), StoreError>;

    fn save(&self, config: Option<&ProjectConfig>, tasks: &TaskMap) -> Result<(), StoreError>;
}

/// Single JSON document: `{"config": {...}, "tasks": {"T-1": {...}}}`.
///
/// The older flat layout (`{"T-1": {...}}`) is still accepted on load; saving
/// always writes the current layout.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new(DEFAULT_DB_FILE)
    }
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Tasks keyed by ID, written in natural ID order.
struct OrderedTasks<'a>(&'a TaskMap);

impl Serialize for OrderedTasks<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut sorted: Vec<(&String, &Task)> = self.0.iter().collect();
        sorted.sort_by(|(a, _), (b, _)| natural_cmp(a, b));

        let mut map = serializer.serialize_map(Some(sorted.len()))?;
        for (id, task) in sorted {
            map.serialize_entry(id, task)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct Document<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<&'a ProjectConfig>,
    tasks: OrderedTasks<'a>,
}

impl TaskStore for JsonFileStore {
    fn load(&self) -> Result<(Option<ProjectConfig>, TaskMap), StoreError> {
        if !self.path.exists() {
            return Ok((None, TaskMap::default()));
        }

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&self.path)?)?;
        let Value::Object(mut root) = raw else {
            return Err(StoreError::NotAnObject);
        };

        let config = root
            .remove("config")
            .map(serde_json::from_value::<ProjectConfig>)
            .transpose()?;

        let entries = match root.remove("tasks") {
            Some(Value::Object(tasks)) => tasks,
            Some(_) => return Err(StoreError::NotAnObject),
            // Flat layout: every remaining key is a task
            None => root,
        };

        let mut tasks = TaskMap::default();
        for (id, body) in entries {
            let mut task: Task = serde_json::from_value(body)?;
            task.id = id.clone();
            tasks.insert(id, task);
        }

        log_changes!("Loaded {} tasks from {}", tasks.len(), self.path.display());
        Ok((config, tasks))
    }

    fn save(&self, config: Option<&ProjectConfig>, tasks: &TaskMap) -> Result<(), StoreError> {
        let document = Document {
            config,
            tasks: OrderedTasks(tasks),
        };

        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut serializer)?;

        std::fs::write(&self.path, buf)?;
        log_changes!("Saved {} tasks to {}", tasks.len(), self.path.display());
        Ok(())
    }
}

/// Next `T-N` ID after the highest numeric `T-` suffix in use.
pub fn generate_id(tasks: &TaskMap) -> String {
    let highest = tasks
        .keys()
        .filter_map(|id| id.strip_prefix("T-")?.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    format!("T-{}", highest + 1)
}
