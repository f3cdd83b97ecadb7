use chrono::{Local, NaiveDate};

/// Supplies the current calendar date to date-sensitive filters.
pub trait Clock {
    fn today(&self) -> NaiveDate;
}

/// Local date of the machine running the program.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock pinned to a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
