use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const FULL_COMPLETION: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    /// Percent done, 0..=100
    #[serde(default)]
    pub completion: u8,
    pub start: NaiveDate,
    /// Last day of the task, inclusive
    pub end: NaiveDate,
    // None means a top-level task (child of the implicit root)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Uuid>,
}

impl Task {
    pub fn new(title: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            completion: 0,
            start,
            end,
            parent_id: None,
        }
    }

    pub fn with_completion(mut self, completion: u8) -> Self {
        self.completion = completion.min(FULL_COMPLETION);
        self
    }

    pub fn with_parent(mut self, parent_id: Uuid) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// The synthetic root every top-level task hangs from.
    pub fn root() -> Self {
        Self {
            id: Uuid::nil(),
            title: String::new(),
            completion: 0,
            start: NaiveDate::MIN,
            end: NaiveDate::MAX,
            parent_id: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completion >= FULL_COMPLETION
    }

    pub fn ends_on(&self, day: NaiveDate) -> bool {
        self.end == day
    }

    pub fn ends_before(&self, day: NaiveDate) -> bool {
        self.end < day
    }

    pub fn runs_on(&self, day: NaiveDate) -> bool {
        self.start <= day && self.end >= day
    }

    /// Length in days, counting both the start and the end day.
    pub fn duration_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Change notifications published by a task tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEvent {
    ProgressChanged { id: Uuid },
    ScheduleChanged { id: Uuid },
}

impl TaskEvent {
    pub fn task_id(&self) -> Uuid {
        match self {
            TaskEvent::ProgressChanged { id } | TaskEvent::ScheduleChanged { id } => *id,
        }
    }
}
