//! # Task Filter Manager
//!
//! [`TaskFilterManager`] is the registry a task view talks to. It owns:
//!
//! - four built-in filters, each tied to a persisted [`BooleanOption`];
//! - the custom (user-authored) filters, replaced wholesale by
//!   [`TaskFilterManager::import_filters`];
//! - the single active predicate;
//! - the listeners told about active-filter changes;
//! - the sync callback that recomputes what the view shows, and the
//!   hidden-task counter only that callback may write.
//!
//! ## Sync
//!
//! The manager does not know how the view lays out rows. The host installs a
//! callback with [`TaskFilterManager::set_sync`] (see [`crate::view::install_sync`]);
//! the default does nothing. The callback runs once per active-filter
//! assignment and once per progress or schedule change in the task tree, the
//! latter only while a non-void filter is active.
//!
//! ## Threading
//!
//! Everything happens on the thread that owns the manager. Listener and sync
//! dispatch is synchronous and ordered; there is no locking.

use crate::clock::Clock;
use crate::error::{FilterError, Result};
use crate::filter::{TaskFilter, TaskFilterFxn};
use crate::model::TaskEvent;
use crate::observable::{Listeners, Observable, ReadOnly};
use crate::option::BooleanOption;
use crate::predicates;
use crate::store::TaskTree;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, trace};
use uuid::Uuid;

pub const COMPLETED_TASKS: &str = "filter.completedTasks";
pub const DUE_TODAY_TASKS: &str = "filter.dueTodayTasks";
pub const OVERDUE_TASKS: &str = "filter.overdueTasks";
pub const IN_PROGRESS_TODAY_TASKS: &str = "filter.inProgressTodayTasks";

pub type FilterChangedListener = Box<dyn FnMut(&TaskFilterFxn)>;
pub type SyncFn = Box<dyn FnMut(&SyncContext<'_>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What the sync callback gets to work with.
pub struct SyncContext<'a> {
    pub active_filter: &'a TaskFilterFxn,
    pub hidden_task_count: &'a Observable<usize>,
}

struct BuiltIn {
    id: Uuid,
    option: BooleanOption,
    fxn: TaskFilterFxn,
}

impl BuiltIn {
    fn new(option_id: &'static str, fxn: TaskFilterFxn) -> Self {
        Self {
            id: Uuid::new_v4(),
            option: BooleanOption::new(option_id, false),
            fxn,
        }
    }

    fn to_filter(&self) -> TaskFilter {
        TaskFilter::built_in(
            self.id,
            self.option.id(),
            self.option.as_observable(),
            self.fxn.clone(),
        )
    }
}

/// State reachable from the task-tree subscription.
struct Shared {
    active: RefCell<TaskFilterFxn>,
    listeners: Listeners<dyn FnMut(&TaskFilterFxn)>,
    sync: RefCell<Option<SyncFn>>,
    hidden_task_count: Observable<usize>,
}

impl Shared {
    fn fire_filter_changed(&self, fxn: &TaskFilterFxn) {
        self.listeners.dispatch(|listener| listener(fxn));
    }

    fn sync(&self) {
        let Some(mut sync) = self.sync.borrow_mut().take() else {
            trace!("sync already running, skipping nested request");
            return;
        };
        let active = self.active.borrow().clone();
        trace!(void = active.is_void(), "running filter sync");
        sync(&SyncContext {
            active_filter: &active,
            hidden_task_count: &self.hidden_task_count,
        });
        // Keep a callback installed by the sync itself.
        let mut slot = self.sync.borrow_mut();
        if slot.is_none() {
            *slot = Some(sync);
        }
    }
}

pub struct TaskFilterManager {
    shared: Rc<Shared>,
    built_ins: [BuiltIn; 4],
    custom: Vec<TaskFilter>,
}

impl TaskFilterManager {
    /// Creates the manager for `tree` and subscribes to its change events.
    pub fn new(tree: &dyn TaskTree, clock: Rc<dyn Clock>) -> Self {
        let shared = Rc::new(Shared {
            active: RefCell::new(TaskFilterFxn::void()),
            listeners: Listeners::default(),
            sync: RefCell::new(Some(Box::new(|_: &SyncContext<'_>| {}))),
            hidden_task_count: Observable::new(0),
        });

        let weak = Rc::downgrade(&shared);
        tree.add_task_listener(Box::new(move |event: &TaskEvent| {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let is_void = shared.active.borrow().is_void();
            if is_void {
                trace!(?event, "no active filter, skipping sync");
                return;
            }
            shared.sync();
        }));

        let built_ins = [
            BuiltIn::new(COMPLETED_TASKS, predicates::completed_tasks()),
            BuiltIn::new(DUE_TODAY_TASKS, predicates::due_today(Rc::clone(&clock))),
            BuiltIn::new(OVERDUE_TASKS, predicates::overdue(Rc::clone(&clock))),
            BuiltIn::new(
                IN_PROGRESS_TODAY_TASKS,
                predicates::in_progress_today(Rc::clone(&clock)),
            ),
        ];

        Self {
            shared,
            built_ins,
            custom: Vec::new(),
        }
    }

    /// The options backing the built-in filters, in display order.
    pub fn options(&self) -> Vec<&BooleanOption> {
        self.built_ins.iter().map(|b| &b.option).collect()
    }

    pub fn option(&self, id: &str) -> Option<&BooleanOption> {
        self.built_ins
            .iter()
            .map(|b| &b.option)
            .find(|o| o.id() == id)
    }

    pub fn completed_tasks_filter(&self) -> TaskFilterFxn {
        self.built_ins[0].fxn.clone()
    }

    pub fn due_today_filter(&self) -> TaskFilterFxn {
        self.built_ins[1].fxn.clone()
    }

    pub fn overdue_filter(&self) -> TaskFilterFxn {
        self.built_ins[2].fxn.clone()
    }

    pub fn in_progress_today_filter(&self) -> TaskFilterFxn {
        self.built_ins[3].fxn.clone()
    }

    pub fn active_filter(&self) -> TaskFilterFxn {
        self.shared.active.borrow().clone()
    }

    /// Makes `fxn` the active filter, tells every listener, then syncs.
    pub fn set_active_filter(&self, fxn: TaskFilterFxn) {
        debug!(?fxn, "active filter changed");
        *self.shared.active.borrow_mut() = fxn.clone();
        self.shared.fire_filter_changed(&fxn);
        self.shared.sync();
    }

    pub fn add_filter_listener(
        &self,
        listener: impl FnMut(&TaskFilterFxn) + 'static,
    ) -> ListenerId {
        let listener: FilterChangedListener = Box::new(listener);
        ListenerId(self.shared.listeners.add(listener))
    }

    /// Unregisters a listener. A listener may remove itself while running.
    pub fn remove_filter_listener(&self, id: ListenerId) -> bool {
        self.shared.listeners.remove(id.0)
    }

    /// Replaces the sync callback.
    pub fn set_sync(&self, sync: impl FnMut(&SyncContext<'_>) + 'static) {
        *self.shared.sync.borrow_mut() = Some(Box::new(sync));
    }

    /// Runs the sync callback against the current active filter.
    pub fn resync(&self) {
        self.shared.sync();
    }

    pub fn hidden_task_count(&self) -> ReadOnly<usize> {
        self.shared.hidden_task_count.read_only()
    }

    /// A new list on every call, so each filter reflects the live options.
    pub fn built_in_filters(&self) -> Vec<TaskFilter> {
        self.built_ins.iter().map(BuiltIn::to_filter).collect()
    }

    pub fn custom_filters(&self) -> &[TaskFilter] {
        &self.custom
    }

    /// Built-in filters first, then custom ones.
    pub fn filters(&self) -> Vec<TaskFilter> {
        let mut filters = self.built_in_filters();
        filters.extend(self.custom.iter().cloned());
        filters
    }

    pub fn find_filter(&self, title: &str) -> Option<TaskFilter> {
        self.filters().into_iter().find(|f| f.title == title)
    }

    pub fn enabled_filters(&self) -> Vec<TaskFilter> {
        self.filters()
            .into_iter()
            .filter(TaskFilter::is_enabled)
            .collect()
    }

    pub fn set_filter_enabled(&self, title: &str, enabled: bool) -> Result<()> {
        let filter = self
            .find_filter(title)
            .ok_or_else(|| FilterError::UnknownFilter(title.to_string()))?;
        debug!(filter = title, enabled, "filter toggled");
        filter.enabled.set(enabled);
        Ok(())
    }

    /// Replaces all custom filters with the non-built-in entries of `filters`.
    pub fn import_filters(&mut self, filters: Vec<TaskFilter>) {
        let total = filters.len();
        self.custom.clear();
        self.custom
            .extend(filters.into_iter().filter(|f| !f.is_built_in()));
        let dropped = total - self.custom.len();
        if dropped > 0 {
            debug!(dropped, "ignored built-in filters passed to import");
        }
        debug!(count = self.custom.len(), "custom filters imported");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::store::memory::fixtures::{day, TreeFixture};
    use std::cell::Cell;

    fn manager(fx: &TreeFixture) -> TaskFilterManager {
        TaskFilterManager::new(&fx.tree, Rc::new(FixedClock(day(10))))
    }

    fn count_syncs(manager: &TaskFilterManager) -> Rc<Cell<usize>> {
        let count = Rc::new(Cell::new(0));
        let counter = Rc::clone(&count);
        manager.set_sync(move |_| counter.set(counter.get() + 1));
        count
    }

    fn custom(title: &str) -> TaskFilter {
        TaskFilter::new(title, "", Observable::new(false), TaskFilterFxn::void())
    }

    #[test]
    fn starts_with_void_filter() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        assert!(m.active_filter().is_void());
        assert_eq!(m.hidden_task_count().get(), 0);
    }

    #[test]
    fn built_ins_come_in_fixed_order() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        let filters = m.built_in_filters();

        let titles: Vec<_> = filters.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                COMPLETED_TASKS,
                DUE_TODAY_TASKS,
                OVERDUE_TASKS,
                IN_PROGRESS_TODAY_TASKS
            ]
        );
        assert!(filters.iter().all(TaskFilter::is_built_in));
        assert_eq!(filters[0].fxn, m.completed_tasks_filter());
        assert_eq!(filters[1].fxn, m.due_today_filter());
        assert_eq!(filters[2].fxn, m.overdue_filter());
        assert_eq!(filters[3].fxn, m.in_progress_today_filter());
    }

    #[test]
    fn built_ins_are_rebuilt_but_stay_bound_to_options() {
        let fx = TreeFixture::new();
        let m = manager(&fx);

        let first = m.built_in_filters();
        m.option(OVERDUE_TASKS).unwrap().set(true);
        let second = m.built_in_filters();

        assert!(first[2].is_enabled());
        assert!(second[2].is_enabled());
        assert_eq!(first[2].id, second[2].id);
        assert!(first[2].enabled.same_as(&second[2].enabled));
    }

    #[test]
    fn options_default_to_false() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        let ids: Vec<_> = m.options().iter().map(|o| o.id()).collect();
        assert_eq!(ids.len(), 4);
        assert!(m.options().iter().all(|o| !o.get()));
        assert!(m.option("filter.unknown").is_none());
    }

    #[test]
    fn filters_are_built_ins_then_custom() {
        let fx = TreeFixture::new();
        let mut m = manager(&fx);
        m.import_filters(vec![custom("a"), custom("b")]);

        let filters = m.filters();
        assert_eq!(
            filters.len(),
            m.built_in_filters().len() + m.custom_filters().len()
        );
        assert!(filters[..4].iter().all(TaskFilter::is_built_in));
        assert_eq!(filters[4].title, "a");
        assert_eq!(filters[5].title, "b");
    }

    #[test]
    fn import_drops_built_ins_and_replaces_previous() {
        let fx = TreeFixture::new();
        let mut m = manager(&fx);
        m.import_filters(vec![custom("old")]);

        let f1 = TaskFilter::built_in(
            Uuid::new_v4(),
            "sneaky",
            Observable::new(false),
            TaskFilterFxn::void(),
        );
        let f2 = custom("f2");
        let f2_id = f2.id;
        m.import_filters(vec![f1, f2]);

        let ids: Vec<_> = m.custom_filters().iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![f2_id]);
    }

    #[test]
    fn import_drops_duplicated_built_ins() {
        let fx = TreeFixture::new();
        let mut m = manager(&fx);
        let copy = m.built_in_filters()[0].duplicate();
        m.import_filters(vec![copy]);
        assert!(m.custom_filters().is_empty());
    }

    #[test]
    fn listeners_run_once_in_order_then_sync_once() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        let log = Rc::new(RefCell::new(Vec::new()));

        for name in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            m.add_filter_listener(move |_| log.borrow_mut().push(name));
        }
        let sync_log = Rc::clone(&log);
        m.set_sync(move |_| sync_log.borrow_mut().push("sync"));

        m.set_active_filter(m.overdue_filter());

        assert_eq!(*log.borrow(), vec!["first", "second", "third", "sync"]);
    }

    #[test]
    fn listeners_receive_the_new_filter() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        let seen = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&seen);
        m.add_filter_listener(move |f| *slot.borrow_mut() = Some(f.clone()));

        let fxn = m.due_today_filter();
        m.set_active_filter(fxn.clone());

        assert_eq!(seen.borrow().as_ref(), Some(&fxn));
        assert_eq!(m.active_filter(), fxn);
    }

    #[test]
    fn sync_sees_the_active_filter() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        let seen = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&seen);
        m.set_sync(move |ctx| *slot.borrow_mut() = Some(ctx.active_filter.clone()));

        m.set_active_filter(m.completed_tasks_filter());

        assert_eq!(*seen.borrow(), Some(m.completed_tasks_filter()));
    }

    #[test]
    fn removed_listener_is_not_called() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let id = m.add_filter_listener(move |_| counter.set(counter.get() + 1));

        m.set_active_filter(m.overdue_filter());
        assert!(m.remove_filter_listener(id));
        m.set_active_filter(m.due_today_filter());

        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn every_assignment_syncs_even_when_unchanged() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        let syncs = count_syncs(&m);

        m.set_active_filter(m.overdue_filter());
        m.set_active_filter(m.overdue_filter());
        m.set_active_filter(TaskFilterFxn::void());

        assert_eq!(syncs.get(), 3);
    }

    #[test]
    fn task_events_are_ignored_while_void() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        let syncs = count_syncs(&m);

        fx.tree.set_completion(&fx.build, 80).unwrap();
        fx.tree.reschedule(&fx.ship, day(16), day(22)).unwrap();

        assert_eq!(syncs.get(), 0);
    }

    #[test]
    fn task_events_sync_once_each_while_filtering() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        m.set_active_filter(m.completed_tasks_filter());
        let syncs = count_syncs(&m);

        fx.tree.set_completion(&fx.build, 80).unwrap();
        assert_eq!(syncs.get(), 1);
        fx.tree.reschedule(&fx.ship, day(16), day(22)).unwrap();
        assert_eq!(syncs.get(), 2);

        m.set_active_filter(TaskFilterFxn::void());
        assert_eq!(syncs.get(), 3);
        fx.tree.set_completion(&fx.build, 90).unwrap();
        assert_eq!(syncs.get(), 3);
    }

    #[test]
    fn dropped_manager_stops_listening() {
        let fx = TreeFixture::new();
        let syncs = {
            let m = manager(&fx);
            m.set_active_filter(m.overdue_filter());
            count_syncs(&m)
        };

        fx.tree.set_completion(&fx.build, 80).unwrap();
        assert_eq!(syncs.get(), 0);
    }

    #[test]
    fn only_sync_writes_hidden_count() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        m.set_sync(|ctx| {
            let hidden = if ctx.active_filter.is_void() { 0 } else { 2 };
            ctx.hidden_task_count.set(hidden);
        });
        let count = m.hidden_task_count();

        m.set_active_filter(m.completed_tasks_filter());
        assert_eq!(count.get(), 2);
        m.set_active_filter(TaskFilterFxn::void());
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn listener_may_add_listener_during_dispatch() {
        let fx = TreeFixture::new();
        let m = Rc::new(manager(&fx));
        let hits = Rc::new(Cell::new(0));
        let (weak, counter) = (Rc::downgrade(&m), Rc::clone(&hits));
        m.add_filter_listener(move |_| {
            if let Some(m) = weak.upgrade() {
                let counter = Rc::clone(&counter);
                m.add_filter_listener(move |_| counter.set(counter.get() + 1));
            }
        });

        m.set_active_filter(m.overdue_filter());
        assert_eq!(hits.get(), 0);
        m.set_active_filter(m.due_today_filter());
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn listener_may_remove_itself_during_dispatch() {
        let fx = TreeFixture::new();
        let m = Rc::new(manager(&fx));
        let hits = Rc::new(Cell::new(0));
        let own_id = Rc::new(Cell::new(None));
        let removed = Rc::new(Cell::new(false));

        let (weak, counter, slot, flag) = (
            Rc::downgrade(&m),
            Rc::clone(&hits),
            Rc::clone(&own_id),
            Rc::clone(&removed),
        );
        let id = m.add_filter_listener(move |_| {
            counter.set(counter.get() + 1);
            if let (Some(m), Some(id)) = (weak.upgrade(), slot.get()) {
                flag.set(m.remove_filter_listener(id));
            }
        });
        own_id.set(Some(id));

        m.set_active_filter(m.overdue_filter());
        m.set_active_filter(m.due_today_filter());

        assert!(removed.get());
        assert_eq!(hits.get(), 1);
        assert!(!m.remove_filter_listener(id));
    }

    #[test]
    fn toggling_unknown_filter_fails() {
        let fx = TreeFixture::new();
        let m = manager(&fx);
        assert!(matches!(
            m.set_filter_enabled("nope", true),
            Err(FilterError::UnknownFilter(_))
        ));

        m.set_filter_enabled(DUE_TODAY_TASKS, true).unwrap();
        assert!(m.option(DUE_TODAY_TASKS).unwrap().get());
        let enabled: Vec<_> = m.enabled_filters().into_iter().map(|f| f.title).collect();
        assert_eq!(enabled, vec![DUE_TODAY_TASKS]);
    }
}
