use clap::{ArgAction, ArgGroup, CommandFactory, Parser, ValueHint};
use console::style;
use std::process::ExitCode;

use sherpa_worktree::Result;
use sherpa_worktree::commands::create::CreateOptions;
use sherpa_worktree::commands::init::Shell;
use sherpa_worktree::commands::{create, init, list, remove, remove_all};
use sherpa_worktree::location::{self, Location};

/// Modes that exclude the creation-only flags
const OTHER_MODES: [&str; 5] = ["clean", "clean_all", "list", "init", "completions"];

#[derive(Parser)]
#[command(name = "sherpa-worktree")]
#[command(about = "Create, list and clean up git worktrees for gh-sherpa issue branches")]
#[command(version)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["issue", "clean", "clean_all", "list", "init", "completions"])
))]
pub struct Cli {
    /// Issue key to create a branch and worktree for (e.g. PROJ-123)
    #[arg(short, long, value_name = "ID", value_hint = ValueHint::Other)]
    issue: Option<String>,
    /// Base branch (defaults to the remote's default branch)
    #[arg(short, long, value_name = "NAME", requires = "issue", conflicts_with_all = OTHER_MODES)]
    base: Option<String>,
    /// Do not fetch the remote before creating the branch
    #[arg(long, requires = "issue", conflicts_with_all = OTHER_MODES)]
    no_fetch: bool,
    /// Prefer a hotfix branch name
    #[arg(long, requires = "issue", conflicts_with_all = OTHER_MODES)]
    prefer_hotfix: bool,
    /// Stay in the current directory instead of moving into the new worktree
    #[arg(long, requires = "issue", conflicts_with_all = OTHER_MODES)]
    no_cd: bool,
    /// Remove a worktree by directory name or path; opens a menu without NAME
    #[arg(long, value_name = "NAME", num_args = 0..=1, value_hint = ValueHint::Other)]
    clean: Option<Option<String>>,
    /// Remove every worktree after typing the confirmation word
    #[arg(long)]
    clean_all: bool,
    /// List worktrees
    #[arg(short, long)]
    list: bool,
    /// Print shell integration (the `swt` wrapper function)
    #[arg(long, value_enum, value_name = "SHELL")]
    init: Option<Shell>,
    /// Print shell completions
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        _ => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    if let Some(shell) = cli.init {
        init::generate_shell_integration(shell);
        return Ok(());
    }
    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        init::generate_completions(shell, &mut cmd);
        return Ok(());
    }

    let start = Location::current()?;
    let mut location = start.clone();

    let result = if let Some(issue) = cli.issue {
        tracing::info!(%issue, "mode: create");
        let options = CreateOptions {
            issue,
            base: cli.base,
            no_fetch: cli.no_fetch,
            prefer_hotfix: cli.prefer_hotfix,
            no_cd: cli.no_cd,
        };
        create::create_worktree(&options, &mut location)
    } else if let Some(target) = cli.clean {
        tracing::info!(target = ?target, "mode: clean");
        remove::remove_worktree(target.as_deref(), &mut location)
    } else if cli.clean_all {
        tracing::info!("mode: clean-all");
        remove_all::remove_all_worktrees(&mut location)
    } else {
        tracing::info!("mode: list");
        list::list_worktrees(&location)
    };

    // The location is handed back even when the command failed part-way
    if let Err(e) = location::hand_off(&start, &location) {
        if result.is_err() {
            tracing::warn!("{:#}", e);
        } else {
            return Err(e);
        }
    }
    result
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", style("✗").red().for_stderr(), e);
            ExitCode::FAILURE
        }
    }
}
