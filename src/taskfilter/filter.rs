//! Filter values.
//!
//! A [`TaskFilterFxn`] is the predicate a view applies to each row: given a
//! parent task and one of its children, it answers whether the child stays
//! visible. A `None` child means there is no child at that position; every
//! predicate shipped here keeps the row in that case.
//!
//! A [`TaskFilter`] wraps a predicate with the data a filter list shows: a
//! title, a description, an observable enabled flag and, for user-authored
//! filters, the expression it was compiled from.

use crate::clock::Clock;
use crate::error::Result;
use crate::expression;
use crate::model::Task;
use crate::observable::Observable;
use std::fmt;
use std::rc::Rc;
use uuid::Uuid;

type Predicate = dyn Fn(&Task, Option<&Task>) -> bool;

/// Shared handle to a row-visibility predicate.
///
/// Equality is identity: two handles are equal when they wrap the same
/// function instance, never because two functions behave alike.
#[derive(Clone)]
pub struct TaskFilterFxn {
    predicate: Rc<Predicate>,
    void: bool,
}

thread_local! {
    static VOID_FILTER: TaskFilterFxn = TaskFilterFxn {
        predicate: Rc::new(|_: &Task, _: Option<&Task>| true),
        void: true,
    };
}

impl TaskFilterFxn {
    pub fn new(predicate: impl Fn(&Task, Option<&Task>) -> bool + 'static) -> Self {
        Self {
            predicate: Rc::new(predicate),
            void: false,
        }
    }

    /// The "show everything" filter, used when no filter is active.
    pub fn void() -> Self {
        VOID_FILTER.with(Clone::clone)
    }

    pub fn is_void(&self) -> bool {
        self.void
    }

    /// Whether `child` of `parent` remains visible.
    pub fn keeps(&self, parent: &Task, child: Option<&Task>) -> bool {
        (self.predicate)(parent, child)
    }

    /// Keeps a row only when every filter keeps it.
    pub fn all_of(filters: Vec<TaskFilterFxn>) -> Self {
        let mut filters: Vec<_> = filters.into_iter().filter(|f| !f.is_void()).collect();
        match filters.len() {
            0 => Self::void(),
            1 => filters.remove(0),
            _ => Self::new(move |parent, child| filters.iter().all(|f| f.keeps(parent, child))),
        }
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.predicate) as *const ()
    }
}

impl PartialEq for TaskFilterFxn {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for TaskFilterFxn {}

impl fmt::Debug for TaskFilterFxn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.void {
            write!(f, "TaskFilterFxn(void)")
        } else {
            write!(f, "TaskFilterFxn({:p})", self.addr())
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskFilter {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub enabled: Observable<bool>,
    pub fxn: TaskFilterFxn,
    /// Source text for user-authored filters
    pub expression: Option<String>,
    built_in: bool,
    clone_of: Option<Uuid>,
}

impl TaskFilter {
    /// A user-defined filter around an arbitrary predicate.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        enabled: Observable<bool>,
        fxn: TaskFilterFxn,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            enabled,
            fxn,
            expression: None,
            built_in: false,
            clone_of: None,
        }
    }

    pub(crate) fn built_in(
        id: Uuid,
        title: impl Into<String>,
        enabled: Observable<bool>,
        fxn: TaskFilterFxn,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            enabled,
            fxn,
            expression: None,
            built_in: true,
            clone_of: None,
        }
    }

    /// A user-defined filter compiled from a filter expression.
    ///
    /// The filter starts disabled.
    pub fn from_expression(
        title: impl Into<String>,
        description: impl Into<String>,
        source: &str,
        clock: Rc<dyn Clock>,
    ) -> Result<Self> {
        let fxn = expression::compile(source, clock)?;
        let mut filter = Self::new(title, description, Observable::new(false), fxn);
        filter.expression = Some(source.to_string());
        Ok(filter)
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        self.enabled.set(enabled);
        self
    }

    pub fn is_built_in(&self) -> bool {
        self.built_in
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Id of the filter this one was duplicated from.
    pub fn clone_of(&self) -> Option<Uuid> {
        self.clone_of
    }

    /// Copies this filter under a new id, remembering where it came from.
    ///
    /// The copy shares the enabled flag with its source.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            clone_of: Some(self.id),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::NaiveDate;

    fn task(completion: u8) -> Task {
        let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        Task::new("T", day, day).with_completion(completion)
    }

    #[test]
    fn void_is_a_shared_sentinel() {
        let a = TaskFilterFxn::void();
        let b = TaskFilterFxn::void();
        assert!(a.is_void());
        assert_eq!(a, b);
        assert!(a.keeps(&task(0), Some(&task(100))));
        assert!(a.keeps(&task(0), None));
    }

    #[test]
    fn equality_is_identity() {
        let a = TaskFilterFxn::new(|_, _| true);
        let b = TaskFilterFxn::new(|_, _| true);
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
        assert_ne!(a, TaskFilterFxn::void());
        assert!(!a.is_void());
    }

    #[test]
    fn all_of_is_a_conjunction() {
        let below_50 = TaskFilterFxn::new(|_, c| c.map_or(true, |t| t.completion < 50));
        let above_10 = TaskFilterFxn::new(|_, c| c.map_or(true, |t| t.completion > 10));
        let both = TaskFilterFxn::all_of(vec![below_50, above_10]);

        let parent = task(0);
        assert!(both.keeps(&parent, Some(&task(20))));
        assert!(!both.keeps(&parent, Some(&task(5))));
        assert!(!both.keeps(&parent, Some(&task(60))));
        assert!(both.keeps(&parent, None));
    }

    #[test]
    fn all_of_trivial_cases_keep_identity() {
        assert!(TaskFilterFxn::all_of(vec![]).is_void());
        assert!(TaskFilterFxn::all_of(vec![TaskFilterFxn::void()]).is_void());

        let single = TaskFilterFxn::new(|_, _| false);
        assert_eq!(TaskFilterFxn::all_of(vec![single.clone()]), single);
    }

    #[test]
    fn duplicate_records_source_and_shares_flag() {
        let original = TaskFilter::new("Mine", "", Observable::new(false), TaskFilterFxn::void());
        let copy = original.duplicate();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.clone_of(), Some(original.id));
        assert_eq!(copy.title, "Mine");
        assert!(!copy.is_built_in());

        copy.enabled.set(true);
        assert!(original.is_enabled());
    }

    #[test]
    fn expression_filters_keep_their_source() {
        let clock = Rc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        let filter =
            TaskFilter::from_expression("Half done", "", "completion >= 50", clock).unwrap();

        assert_eq!(filter.expression.as_deref(), Some("completion >= 50"));
        assert!(!filter.is_enabled());
        assert!(filter.fxn.keeps(&task(0), Some(&task(60))));
        assert!(!filter.fxn.keeps(&task(0), Some(&task(40))));
    }

    #[test]
    fn bad_expression_is_an_error() {
        let clock = Rc::new(FixedClock(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()));
        assert!(TaskFilter::from_expression("Bad", "", "completion >=", clock).is_err());
    }
}
