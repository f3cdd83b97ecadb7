mod commands;
mod print;

pub use commands::run;
