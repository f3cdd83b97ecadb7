use super::{TaskListener, TaskTree};
use crate::error::{FilterError, Result};
use crate::model::{Task, TaskEvent, FULL_COMPLETION};
use chrono::NaiveDate;
use std::cell::RefCell;
use tracing::{debug, trace};
use uuid::Uuid;

/// In-memory task tree.
///
/// Mutations take `&self` so the tree can be shared with the components that
/// listen to it.
#[derive(Default)]
pub struct InMemoryTaskTree {
    tasks: RefCell<Vec<Task>>,
    listeners: RefCell<Vec<TaskListener>>,
}

impl InMemoryTaskTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: RefCell::new(tasks),
            listeners: RefCell::new(Vec::new()),
        }
    }

    /// Adds or replaces a task. No event is published.
    pub fn add_task(&self, task: Task) {
        let mut tasks = self.tasks.borrow_mut();
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(existing) => *existing = task,
            None => tasks.push(task),
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Sets a task's completion, clamped to 100.
    ///
    /// Publishes [`TaskEvent::ProgressChanged`] when the value changes.
    pub fn set_completion(&self, id: &Uuid, completion: u8) -> Result<()> {
        let completion = completion.min(FULL_COMPLETION);
        let changed = self.update(id, |task| {
            if task.completion == completion {
                return Ok(false);
            }
            task.completion = completion;
            Ok(true)
        })?;
        if changed {
            debug!(task = %id, completion, "progress changed");
            self.publish(TaskEvent::ProgressChanged { id: *id });
        }
        Ok(())
    }

    /// Moves a task to a new inclusive date range.
    ///
    /// Publishes [`TaskEvent::ScheduleChanged`] when the range changes.
    pub fn reschedule(&self, id: &Uuid, start: NaiveDate, end: NaiveDate) -> Result<()> {
        if end < start {
            return Err(FilterError::InvalidSchedule {
                id: *id,
                start,
                end,
            });
        }
        let changed = self.update(id, |task| {
            if task.start == start && task.end == end {
                return Ok(false);
            }
            task.start = start;
            task.end = end;
            Ok(true)
        })?;
        if changed {
            debug!(task = %id, %start, %end, "schedule changed");
            self.publish(TaskEvent::ScheduleChanged { id: *id });
        }
        Ok(())
    }

    fn update(&self, id: &Uuid, f: impl FnOnce(&mut Task) -> Result<bool>) -> Result<bool> {
        let mut tasks = self.tasks.borrow_mut();
        let task = tasks
            .iter_mut()
            .find(|t| t.id == *id)
            .ok_or(FilterError::TaskNotFound(*id))?;
        f(task)
    }

    fn publish(&self, event: TaskEvent) {
        // Listeners may read the tree or register more listeners.
        let mut running = std::mem::take(&mut *self.listeners.borrow_mut());
        trace!(?event, listeners = running.len(), "publishing task event");
        for listener in running.iter_mut() {
            listener(&event);
        }
        let mut listeners = self.listeners.borrow_mut();
        let added = std::mem::replace(&mut *listeners, running);
        listeners.extend(added);
    }
}

impl TaskTree for InMemoryTaskTree {
    fn tasks(&self) -> Vec<Task> {
        self.tasks.borrow().clone()
    }

    fn get_task(&self, id: &Uuid) -> Result<Task> {
        self.tasks
            .borrow()
            .iter()
            .find(|t| t.id == *id)
            .cloned()
            .ok_or(FilterError::TaskNotFound(*id))
    }

    fn children(&self, parent: Option<Uuid>) -> Vec<Task> {
        self.tasks
            .borrow()
            .iter()
            .filter(|t| t.parent_id == parent)
            .cloned()
            .collect()
    }

    fn add_task_listener(&self, listener: TaskListener) {
        self.listeners.borrow_mut().push(listener);
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    pub fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    /// A small project around 2024-03-10:
    ///
    /// ```text
    /// Release            03-01..03-20   40%
    ///   Design           03-01..03-05  100%
    ///   Build            03-06..03-10   50%   (ends on the 10th)
    ///     Backend        03-06..03-09   20%   (overdue on the 10th)
    ///   Ship             03-15..03-20    0%
    /// Retro              03-10..03-10    0%
    /// ```
    pub struct TreeFixture {
        pub tree: InMemoryTaskTree,
        pub release: Uuid,
        pub design: Uuid,
        pub build: Uuid,
        pub backend: Uuid,
        pub ship: Uuid,
        pub retro: Uuid,
    }

    impl Default for TreeFixture {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TreeFixture {
        pub fn new() -> Self {
            let release = Task::new("Release", day(1), day(20)).with_completion(40);
            let design = Task::new("Design", day(1), day(5))
                .with_completion(100)
                .with_parent(release.id);
            let build = Task::new("Build", day(6), day(10))
                .with_completion(50)
                .with_parent(release.id);
            let backend = Task::new("Backend", day(6), day(9))
                .with_completion(20)
                .with_parent(build.id);
            let ship = Task::new("Ship", day(15), day(20)).with_parent(release.id);
            let retro = Task::new("Retro", day(10), day(10));

            let fixture = Self {
                tree: InMemoryTaskTree::new(),
                release: release.id,
                design: design.id,
                build: build.id,
                backend: backend.id,
                ship: ship.id,
                retro: retro.id,
            };
            for task in [release, design, build, backend, ship, retro] {
                fixture.tree.add_task(task);
            }
            fixture
        }
    }
}
