use crate::error::{FilterError, Result};
use crate::model::Task;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A task tree stored as a JSON array.
#[derive(Debug, Clone)]
pub struct TaskFile {
    path: PathBuf,
}

impl TaskFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads all tasks. A missing file is an empty tree.
    pub fn load(&self) -> Result<Vec<Task>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "task file missing, starting empty");
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).map_err(FilterError::Io)?;
        let tasks: Vec<Task> = serde_json::from_str(&content).map_err(FilterError::Serialization)?;
        validate(&tasks)?;
        debug!(path = %self.path.display(), count = tasks.len(), "loaded tasks");
        Ok(tasks)
    }

    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        validate(tasks)?;
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(FilterError::Io)?;
            }
        }
        let content = serde_json::to_string_pretty(tasks).map_err(FilterError::Serialization)?;
        fs::write(&self.path, content).map_err(FilterError::Io)?;
        Ok(())
    }
}

fn validate(tasks: &[Task]) -> Result<()> {
    let mut ids = HashSet::new();
    for task in tasks {
        if !ids.insert(task.id) {
            return Err(FilterError::Store(format!("duplicate task id {}", task.id)));
        }
        if task.end < task.start {
            return Err(FilterError::InvalidSchedule {
                id: task.id,
                start: task.start,
                end: task.end,
            });
        }
    }
    for task in tasks {
        if let Some(parent) = task.parent_id {
            if !ids.contains(&parent) {
                return Err(FilterError::Store(format!(
                    "task {} refers to unknown parent {}",
                    task.id, parent
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::fixtures::{day, TreeFixture};
    use crate::store::TaskTree;
    use uuid::Uuid;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let file = TaskFile::new(dir.path().join("tasks.json"));
        assert!(file.load().unwrap().is_empty());
    }

    #[test]
    fn save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = TaskFile::new(dir.path().join("nested").join("tasks.json"));
        let fx = TreeFixture::new();

        file.save(&fx.tree.tasks()).unwrap();
        let loaded = file.load().unwrap();

        assert_eq!(loaded, fx.tree.tasks());
    }

    #[test]
    fn rejects_dangling_parent() {
        let dir = tempfile::tempdir().unwrap();
        let file = TaskFile::new(dir.path().join("tasks.json"));
        let orphan = Task::new("Orphan", day(1), day(2)).with_parent(Uuid::new_v4());

        assert!(matches!(file.save(&[orphan]), Err(FilterError::Store(_))));
    }

    #[test]
    fn rejects_inverted_schedule_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(
            &path,
            r#"[{"id":"6f1c3c5e-2a51-4b43-9c1e-0d7f3f0b9d10","title":"Bad","start":"2024-03-05","end":"2024-03-01"}]"#,
        )
        .unwrap();

        assert!(matches!(
            TaskFile::new(path).load(),
            Err(FilterError::InvalidSchedule { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(
            TaskFile::new(path).load(),
            Err(FilterError::Serialization(_))
        ));
    }
}
