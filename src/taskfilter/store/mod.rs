//! # Task Tree
//!
//! Filters run against a tree of tasks owned by the host application. The
//! [`TaskTree`] trait is the seam: it exposes the tasks, their parent/child
//! structure, and a hook for progress and schedule notifications.
//!
//! ## Implementations
//!
//! - [`memory::InMemoryTaskTree`]: the tree the CLI and the tests use. It
//!   mutates through `&self` and publishes a [`TaskEvent`] for every change
//!   that can affect filtering.
//! - [`fs::TaskFile`]: loads and saves a tree as a JSON array of tasks.
//!
//! ## Storage Format
//!
//! ```text
//! [
//!   { "id": "…", "title": "Design", "completion": 40,
//!     "start": "2024-03-01", "end": "2024-03-05" },
//!   { "id": "…", "title": "Mockups", "start": "2024-03-01",
//!     "end": "2024-03-02", "parent_id": "…" }
//! ]
//! ```
//!
//! Top-level tasks have no `parent_id`; they hang from an implicit root.

use crate::error::Result;
use crate::model::{Task, TaskEvent};
use uuid::Uuid;

pub mod fs;
pub mod memory;

pub type TaskListener = Box<dyn FnMut(&TaskEvent)>;

pub trait TaskTree {
    /// All tasks, in insertion order
    fn tasks(&self) -> Vec<Task>;

    fn get_task(&self, id: &Uuid) -> Result<Task>;

    /// Direct children of `parent`, or the top-level tasks for `None`
    fn children(&self, parent: Option<Uuid>) -> Vec<Task>;

    /// Registers a listener for progress and schedule changes.
    fn add_task_listener(&self, listener: TaskListener);
}
