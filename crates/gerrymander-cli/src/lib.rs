mod args;
mod commands;
mod handlers;
pub mod logging;
pub mod output;
pub mod types;

pub use args::{CacheArgs, ChangesArgs, Cli, Commands, ProjectArgs, RawArgs, WatchArgs};
pub use commands::run;
