//! The built-in predicates.
//!
//! Each one keeps a child row unless it is finished or falls outside the
//! day the predicate cares about. A missing child is always kept so the
//! parent row itself never disappears. Dates are compared as calendar days.

use crate::clock::Clock;
use crate::filter::TaskFilterFxn;
use std::rc::Rc;

/// Hides finished tasks.
pub fn completed_tasks() -> TaskFilterFxn {
    TaskFilterFxn::new(|_, child| child.map_or(true, |task| !task.is_complete()))
}

/// Keeps unfinished tasks ending today.
pub fn due_today(clock: Rc<dyn Clock>) -> TaskFilterFxn {
    TaskFilterFxn::new(move |_, child| {
        child.map_or(true, |task| {
            !task.is_complete() && task.ends_on(clock.today())
        })
    })
}

/// Keeps unfinished tasks whose end date has passed.
pub fn overdue(clock: Rc<dyn Clock>) -> TaskFilterFxn {
    TaskFilterFxn::new(move |_, child| {
        child.map_or(true, |task| {
            !task.is_complete() && task.ends_before(clock.today())
        })
    })
}

/// Keeps unfinished tasks scheduled over today.
pub fn in_progress_today(clock: Rc<dyn Clock>) -> TaskFilterFxn {
    TaskFilterFxn::new(move |_, child| {
        child.map_or(true, |task| {
            !task.is_complete() && task.runs_on(clock.today())
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::model::Task;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn clock() -> Rc<dyn Clock> {
        Rc::new(FixedClock(day(10)))
    }

    fn task(completion: u8, start: u32, end: u32) -> Task {
        Task::new("T", day(start), day(end)).with_completion(completion)
    }

    fn parent() -> Task {
        Task::root()
    }

    #[test]
    fn completed_hides_only_finished_tasks() {
        let f = completed_tasks();
        for completion in [0, 1, 50, 99] {
            assert!(f.keeps(&parent(), Some(&task(completion, 1, 2))));
        }
        assert!(!f.keeps(&parent(), Some(&task(100, 1, 2))));
        assert!(f.keeps(&parent(), None));
    }

    #[test]
    fn due_today_needs_unfinished_and_end_today() {
        let f = due_today(clock());
        assert!(f.keeps(&parent(), Some(&task(0, 1, 10))));
        assert!(f.keeps(&parent(), Some(&task(99, 10, 10))));
        assert!(!f.keeps(&parent(), Some(&task(100, 1, 10))));
        assert!(!f.keeps(&parent(), Some(&task(0, 1, 9))));
        assert!(!f.keeps(&parent(), Some(&task(0, 1, 11))));
        assert!(f.keeps(&parent(), None));
    }

    #[test]
    fn overdue_needs_unfinished_and_end_before_today() {
        let f = overdue(clock());
        assert!(f.keeps(&parent(), Some(&task(0, 1, 9))));
        assert!(!f.keeps(&parent(), Some(&task(0, 1, 10))));
        assert!(!f.keeps(&parent(), Some(&task(100, 1, 9))));
        assert!(f.keeps(&parent(), None));
    }

    #[test]
    fn in_progress_today_is_inclusive() {
        let f = in_progress_today(clock());
        assert!(f.keeps(&parent(), Some(&task(0, 10, 12))));
        assert!(f.keeps(&parent(), Some(&task(0, 8, 10))));
        assert!(f.keeps(&parent(), Some(&task(30, 10, 10))));
        assert!(!f.keeps(&parent(), Some(&task(0, 11, 12))));
        assert!(!f.keeps(&parent(), Some(&task(0, 1, 9))));
        assert!(!f.keeps(&parent(), Some(&task(100, 8, 12))));
        assert!(f.keeps(&parent(), None));
    }

    #[test]
    fn today_is_read_when_evaluated() {
        struct Moving(std::cell::Cell<u32>);
        impl Clock for Moving {
            fn today(&self) -> NaiveDate {
                day(self.0.get())
            }
        }
        let clock = Rc::new(Moving(std::cell::Cell::new(9)));
        let f = overdue(clock.clone());
        let t = task(0, 1, 9);

        assert!(!f.keeps(&parent(), Some(&t)));
        clock.0.set(10);
        assert!(f.keeps(&parent(), Some(&t)));
    }
}
