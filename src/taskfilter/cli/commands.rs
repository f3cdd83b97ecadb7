//! # CLI Layer
//!
//! This module is **one possible UI client** for taskfilter. It plays the part
//! of the host application around the library:
//!
//! - loads the task file into an [`InMemoryTaskTree`];
//! - creates the [`TaskFilterManager`] for it and installs the view sync;
//! - restores the saved option values and imports `--custom` filters;
//! - turns the result into terminal output.
//!
//! Custom filters live only for one invocation. Only the built-in option
//! values are written back, to `config.json`.

use super::print::{print_check_ok, print_filters, print_messages, print_rows, Message};
use crate::args::{Cli, Commands};
use clap::Parser;
use directories::ProjectDirs;
use std::path::PathBuf;
use std::rc::Rc;
use taskfilter::clock::{Clock, FixedClock, SystemClock};
use taskfilter::config::FilterConfig;
use taskfilter::error::{FilterError, Result};
use taskfilter::expression;
use taskfilter::filter::{TaskFilter, TaskFilterFxn};
use taskfilter::manager::TaskFilterManager;
use taskfilter::store::fs::TaskFile;
use taskfilter::store::memory::InMemoryTaskTree;
use taskfilter::store::TaskTree;
use taskfilter::view;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

const TASKS_FILENAME: &str = "tasks.json";

struct AppContext {
    home: PathBuf,
    tasks_file: TaskFile,
    tree: Rc<InMemoryTaskTree>,
    manager: TaskFilterManager,
    clock: Rc<dyn Clock>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::List { filter }) => handle_list(&ctx, filter),
        Some(Commands::Filters) => handle_filters(&ctx),
        Some(Commands::Enable { title }) => handle_toggle(&ctx, &title, true),
        Some(Commands::Disable { title }) => handle_toggle(&ctx, &title, false),
        Some(Commands::Check { expression }) => handle_check(&expression),
        Some(Commands::Progress { id, percent }) => handle_progress(&ctx, &id, percent),
        None => handle_list(&ctx, None),
    }
}

fn init_logging(verbose: bool) {
    if !verbose && std::env::var("TASKFILTER_DEBUG").is_err() {
        return;
    }
    let filter = EnvFilter::try_from_env("TASKFILTER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("taskfilter=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let home = match &cli.home {
        Some(dir) => dir.clone(),
        None => ProjectDirs::from("com", "taskfilter", "taskfilter")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| FilterError::Store("Could not determine data dir".to_string()))?,
    };

    let clock: Rc<dyn Clock> = match cli.today {
        Some(day) => Rc::new(FixedClock(day)),
        None => Rc::new(SystemClock),
    };

    let tasks_file = TaskFile::new(
        cli.tasks
            .clone()
            .unwrap_or_else(|| home.join(TASKS_FILENAME)),
    );
    let tree = Rc::new(InMemoryTaskTree::from_tasks(tasks_file.load()?));

    let mut manager = TaskFilterManager::new(&*tree, Rc::clone(&clock));
    view::install_sync(&manager, Rc::clone(&tree));
    manager.add_filter_listener(|fxn| debug!(?fxn, "view filter switched"));

    FilterConfig::load(&home)?.apply_to(&manager);
    manager.import_filters(parse_custom_filters(&cli.custom, &clock)?);

    Ok(AppContext {
        home,
        tasks_file,
        tree,
        manager,
        clock,
    })
}

fn parse_custom_filters(args: &[String], clock: &Rc<dyn Clock>) -> Result<Vec<TaskFilter>> {
    args
        .iter()
        .map(|arg| {
            let (title, source) = arg
                .split_once('=')
                .ok_or_else(|| FilterError::InvalidCustomFilter(arg.clone()))?;
            let filter = TaskFilter::from_expression(title.trim(), "", source, Rc::clone(clock))?;
            Ok(filter.with_enabled(true))
        })
        .collect()
}

/// The filter a listing uses: the named one, or every enabled filter at once.
fn resolve_filter(ctx: &AppContext, title: Option<&str>) -> Result<TaskFilterFxn> {
    match title {
        Some(title) => ctx
            .manager
            .find_filter(title)
            .map(|f| f.fxn)
            .ok_or_else(|| FilterError::UnknownFilter(title.to_string())),
        None => Ok(TaskFilterFxn::all_of(
            ctx.manager
                .enabled_filters()
                .into_iter()
                .map(|f| f.fxn)
                .collect(),
        )),
    }
}

fn handle_list(ctx: &AppContext, filter: Option<String>) -> Result<()> {
    let fxn = resolve_filter(ctx, filter.as_deref())?;
    ctx.manager.set_active_filter(fxn.clone());

    let rows = view::visible_rows(&*ctx.tree, &fxn);
    let hidden = ctx.manager.hidden_task_count().get();
    print_rows(&rows, hidden, ctx.clock.today());
    Ok(())
}

fn handle_filters(ctx: &AppContext) -> Result<()> {
    print_filters(&ctx.manager.filters());
    Ok(())
}

fn handle_toggle(ctx: &AppContext, title: &str, enabled: bool) -> Result<()> {
    let filter = ctx
        .manager
        .find_filter(title)
        .ok_or_else(|| FilterError::UnknownFilter(title.to_string()))?;

    if !filter.is_built_in() {
        print_messages(&[Message::warning(format!(
            "{} is a custom filter; custom filters are not saved",
            title
        ))]);
        return Ok(());
    }

    ctx.manager.set_filter_enabled(title, enabled)?;
    FilterConfig::capture(&ctx.manager).save(&ctx.home)?;

    let verb = if enabled { "Enabled" } else { "Disabled" };
    print_messages(&[Message::success(format!("{} {}", verb, title))]);
    Ok(())
}

fn handle_check(source: &str) -> Result<()> {
    expression::parse(source)?;
    print_check_ok(source);
    Ok(())
}

fn handle_progress(ctx: &AppContext, id: &str, percent: u8) -> Result<()> {
    let id = resolve_task_id(&*ctx.tree, id)?;

    // Filtering must be active for the tree change to trigger a resync.
    ctx.manager.set_active_filter(resolve_filter(ctx, None)?);
    let hidden = ctx.manager.hidden_task_count();
    let before = hidden.get();

    ctx.tree.set_completion(&id, percent)?;
    ctx.tasks_file.save(&ctx.tree.tasks())?;

    let task = ctx.tree.get_task(&id)?;
    let mut messages = vec![Message::success(format!(
        "{} is now {}% complete",
        task.title, task.completion
    ))];
    if hidden.get() != before {
        messages.push(Message::info(format!(
            "Hidden tasks: {} -> {}",
            before,
            hidden.get()
        )));
    }
    print_messages(&messages);
    Ok(())
}

/// Accepts a full task id or an unambiguous prefix of one.
fn resolve_task_id(tree: &dyn TaskTree, input: &str) -> Result<Uuid> {
    if let Ok(id) = Uuid::parse_str(input) {
        return tree.get_task(&id).map(|t| t.id);
    }

    let needle = input.to_ascii_lowercase();
    let matches: Vec<Uuid> = tree
        .tasks()
        .iter()
        .map(|t| t.id)
        .filter(|id| id.to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(FilterError::Store(format!("No task matches '{}'", input))),
        _ => Err(FilterError::Store(format!(
            "'{}' matches {} tasks, use a longer prefix",
            input,
            matches.len()
        ))),
    }
}
