use chrono::NaiveDate;
use colored::Colorize;
use taskfilter::filter::TaskFilter;
use taskfilter::view::Row;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const LINE_WIDTH: usize = 80;
const DATES_WIDTH: usize = 24;
const PERCENT_WIDTH: usize = 6;
const INDENT: &str = "  ";

#[derive(Debug, Clone)]
pub(super) enum MessageLevel {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Clone)]
pub(super) struct Message {
    level: MessageLevel,
    content: String,
}

impl Message {
    pub(super) fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub(super) fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub(super) fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }
}

pub(super) fn print_messages(messages: &[Message]) {
    for message in messages {
        match message.level {
            MessageLevel::Info => println!("{}", message.content.dimmed()),
            MessageLevel::Success => println!("{}", message.content.green()),
            MessageLevel::Warning => println!("{}", message.content.yellow()),
        }
    }
}

pub(super) fn print_rows(rows: &[Row], hidden: usize, today: NaiveDate) {
    if rows.is_empty() {
        println!("No tasks to show.");
    }

    for row in rows {
        let task = &row.task;
        let prefix = INDENT.repeat(row.depth);
        let id = task.id.to_string();
        let short_id = &id[..8];

        let available =
            LINE_WIDTH.saturating_sub(prefix.width() + short_id.len() + 1 + PERCENT_WIDTH + DATES_WIDTH);
        let title = truncate_to_width(&task.title, available);
        let padding = available.saturating_sub(title.width());

        let percent = format!("{:>width$}", format!("{}%", task.completion), width = PERCENT_WIDTH);
        let dates = format!(
            "{:>width$}",
            format!("{} → {}", task.start, task.end),
            width = DATES_WIDTH
        );

        let title = if task.is_complete() {
            title.dimmed()
        } else if task.ends_before(today) {
            title.red()
        } else if task.runs_on(today) {
            title.bold()
        } else {
            title.normal()
        };

        println!(
            "{}{} {}{}{}{}",
            prefix,
            short_id.yellow(),
            title,
            " ".repeat(padding),
            percent,
            dates.dimmed()
        );
    }

    if hidden > 0 {
        let noun = if hidden == 1 { "task" } else { "tasks" };
        println!("{}", format!("({} {} hidden)", hidden, noun).dimmed());
    }
}

pub(super) fn print_filters(filters: &[TaskFilter]) {
    for filter in filters {
        let marker = if filter.is_enabled() { "[x]" } else { "[ ]" };
        let kind = if filter.is_built_in() {
            "built-in"
        } else {
            "custom"
        };
        let marker = if filter.is_enabled() {
            marker.green()
        } else {
            marker.normal()
        };

        match &filter.expression {
            Some(expr) => println!(
                "{} {} {} {}",
                marker,
                filter.title.bold(),
                kind.dimmed(),
                expr.cyan()
            ),
            None => println!("{} {} {}", marker, filter.title.bold(), kind.dimmed()),
        }
    }
}

pub(super) fn print_check_ok(source: &str) {
    println!("{} {}", "ok".green(), source);
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}
