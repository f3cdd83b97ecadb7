//! # Taskfilter Architecture
//!
//! Taskfilter decides which rows of a task tree a view shows. It is a
//! **UI-agnostic library**: the CLI in this crate is one client, a GUI task
//! table would be another.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  View Sync (view.rs)                                        │
//! │  - Walks the tree with the active predicate                 │
//! │  - Recomputes the hidden-task count when asked to sync      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Filter Manager (manager.rs)                                │
//! │  - Built-in and custom filters, the active predicate        │
//! │  - Ordered listener dispatch, the sync extension point      │
//! │  - Re-syncs on progress/schedule changes in the tree        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Task Tree (store/)                                         │
//! │  - Abstract TaskTree trait with change notifications        │
//! │  - InMemoryTaskTree, JSON TaskFile                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Predicates
//!
//! A predicate gets a parent task and one of its children and answers
//! "does the child stay visible?". The four built-ins (completed, due today,
//! overdue, in progress today) are each bound to a boolean option; custom
//! filters are compiled from a small expression language (see [`expression`]).
//! The void filter keeps everything and doubles as "no filter active".
//!
//! ## Threading
//!
//! The whole crate is single-threaded: shared state lives in `Rc`/`RefCell`
//! and callbacks run synchronously on the caller's thread.
//!
//! ## Module Overview
//!
//! - [`manager`]: `TaskFilterManager`, the filter registry
//! - [`filter`]: `TaskFilter` and the `TaskFilterFxn` predicate handle
//! - [`predicates`]: the built-in predicates
//! - [`expression`]: custom filter expressions
//! - [`view`]: tree walking and the default sync
//! - [`store`]: task tree abstraction and implementations
//! - [`model`]: `Task` and `TaskEvent`
//! - [`option`] / [`observable`]: observable settings and values
//! - [`clock`]: the "today" supplier
//! - [`config`]: saved option values
//! - [`error`]: error types

pub mod clock;
pub mod config;
pub mod error;
pub mod expression;
pub mod filter;
pub mod manager;
pub mod model;
pub mod observable;
pub mod option;
pub mod predicates;
pub mod store;
pub mod view;
