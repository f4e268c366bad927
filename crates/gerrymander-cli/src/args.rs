use crate::types::{LogLevel, OutputFormat};
use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use gerrymander_core::{CachePurpose, Config};

#[derive(Parser)]
#[command(name = "gerrymander")]
#[command(about = "Reports on changes in a Gerrit code review server", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to $GERRYMANDER_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[arg(long, default_value = "warn", global = true)]
    pub log_level: LogLevel,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "List changes matching a query")]
    Changes(ChangesArgs),

    #[command(about = "Run a raw gerrit command and print its JSON output")]
    Raw(RawArgs),

    #[command(about = "Follow the live event stream")]
    Watch(WatchArgs),
}

#[derive(Debug, Clone, Default, Args)]
pub struct CacheArgs {
    #[arg(long, help = "Talk to the server directly, bypassing the cache")]
    pub no_cache: bool,

    #[arg(long, help = "Re-run commands and replace cached output", conflicts_with = "no_cache")]
    pub refresh: bool,

    #[arg(long, help = "Use the long-lived cache")]
    pub long_cache: bool,
}

impl CacheArgs {
    pub fn purpose(&self) -> CachePurpose {
        if self.long_cache {
            CachePurpose::Long
        } else {
            CachePurpose::Short
        }
    }
}

/// Which projects to report on. At most one of the three may be given.
#[derive(Debug, Clone, Default, Args)]
pub struct ProjectArgs {
    #[arg(short = 'p', long, value_name = "PROJECT", conflicts_with_all = ["group", "all_groups"])]
    pub project: Vec<String>,

    #[arg(
        short = 'g',
        long,
        value_name = "GROUP",
        help = "Projects of a group from the config file",
        conflicts_with = "all_groups"
    )]
    pub group: Vec<String>,

    #[arg(long, help = "Projects of every group in [organization] groups")]
    pub all_groups: bool,
}

impl ProjectArgs {
    /// Project names to filter on; empty means every project.
    pub fn resolve(&self, config: &Config) -> Result<Vec<String>> {
        if !self.project.is_empty() {
            return Ok(self.project.clone());
        }

        let projects = if self.all_groups {
            config.all_group_projects()?
        } else if !self.group.is_empty() {
            config.group_projects(self.group.as_slice())?
        } else {
            return Ok(Vec::new());
        };

        if projects.is_empty() {
            bail!("The selected project groups contain no projects");
        }
        Ok(projects)
    }
}

#[derive(Debug, Clone, Args)]
pub struct ChangesArgs {
    #[command(flatten)]
    pub projects: ProjectArgs,

    #[arg(long, value_name = "USER")]
    pub owner: Vec<String>,

    #[arg(long, value_name = "STATUS")]
    pub status: Vec<String>,

    #[arg(long, value_name = "BRANCH")]
    pub branch: Vec<String>,

    #[arg(long, value_name = "TOPIC")]
    pub topic: Vec<String>,

    #[arg(long, value_name = "USER")]
    pub reviewer: Vec<String>,

    #[arg(long, value_name = "TEXT")]
    pub message: Vec<String>,

    #[arg(long, value_name = "QUERY", help = "Extra query text, AND-ed with the filters")]
    pub query: Option<String>,

    #[arg(long, value_name = "REGEX", help = "Only changes touching a matching file")]
    pub file: Vec<String>,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value = "plain")]
    pub format: OutputFormat,

    #[arg(long, help = "Colorize plain output even when not writing to a terminal")]
    pub color: bool,

    #[command(flatten)]
    pub cache: CacheArgs,
}

#[derive(Debug, Clone, Args)]
pub struct RawArgs {
    #[command(flatten)]
    pub cache: CacheArgs,

    /// Gerrit subcommand and its arguments, e.g. `query --format=JSON status:open`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Args)]
pub struct WatchArgs {
    #[command(flatten)]
    pub projects: ProjectArgs,
}
