//! Host-side view sync.
//!
//! The manager leaves "what does the view show" to its host. This module is
//! that host logic for a plain tree listing: it walks the tree from the
//! implicit root, asks the active predicate about every child, and hides the
//! whole subtree under a rejected child.

use crate::filter::TaskFilterFxn;
use crate::manager::TaskFilterManager;
use crate::model::Task;
use crate::store::TaskTree;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub task: Task,
    /// 0 for top-level tasks
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredTree {
    pub rows: Vec<Row>,
    /// Tasks reachable from the root that the filter hid, subtrees included
    pub hidden: usize,
}

/// Applies `fxn` to the whole tree, depth first, in child order.
pub fn apply(tree: &dyn TaskTree, fxn: &TaskFilterFxn) -> FilteredTree {
    let index = ChildIndex::new(tree.tasks());
    let root = Task::root();
    let mut out = FilteredTree::default();

    // (parent, child, depth), popped in pre-order
    let mut pending: Vec<(&Task, &Task, usize)> = index
        .children(None)
        .iter()
        .rev()
        .map(|child| (&root, child, 0))
        .collect();

    while let Some((parent, child, depth)) = pending.pop() {
        if fxn.keeps(parent, Some(child)) {
            out.rows.push(Row {
                task: child.clone(),
                depth,
            });
            pending.extend(
                index
                    .children(Some(child.id))
                    .iter()
                    .rev()
                    .map(|grandchild| (child, grandchild, depth + 1)),
            );
        } else {
            out.hidden += 1 + index.subtree_size(child.id);
        }
    }

    trace!(
        visible = out.rows.len(),
        hidden = out.hidden,
        "filter applied"
    );
    out
}

pub fn visible_rows(tree: &dyn TaskTree, fxn: &TaskFilterFxn) -> Vec<Row> {
    apply(tree, fxn).rows
}

pub fn hidden_count(tree: &dyn TaskTree, fxn: &TaskFilterFxn) -> usize {
    apply(tree, fxn).hidden
}

/// Makes `manager` recompute its hidden-task count from `tree` on every sync.
pub fn install_sync<T: TaskTree + 'static>(manager: &TaskFilterManager, tree: Rc<T>) {
    manager.set_sync(move |ctx| {
        let hidden = hidden_count(&*tree, ctx.active_filter);
        ctx.hidden_task_count.set(hidden);
    });
}

/// Children of every task, keyed by parent id, built in one pass.
struct ChildIndex {
    children: HashMap<Option<Uuid>, Vec<Task>>,
}

impl ChildIndex {
    fn new(tasks: Vec<Task>) -> Self {
        let mut children: HashMap<Option<Uuid>, Vec<Task>> = HashMap::new();
        for task in tasks {
            children.entry(task.parent_id).or_default().push(task);
        }
        Self { children }
    }

    fn children(&self, parent: Option<Uuid>) -> &[Task] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn subtree_size(&self, id: Uuid) -> usize {
        let mut pending = vec![id];
        let mut count = 0;
        while let Some(id) = pending.pop() {
            let children = self.children(Some(id));
            count += children.len();
            pending.extend(children.iter().map(|c| c.id));
        }
        count
    }
}
