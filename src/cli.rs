use crate::{
    banner,
    contributions::{self, ContributionSet},
    error::{self, SyncError},
    git::{self, GitHistory, MatchPolicy},
    prompt::{self, ConfirmPrompter, DialoguerConfirmPrompter, DialoguerStringPrompter},
    script::{self, DEFAULT_TEMPLATE, Identity, MessageTemplate, Outcome},
};

use clap::Parser;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const SPINNER_FRAMES: &[&str] = &[
    "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿",
];

/// Replay a GitHub contribution graph as empty, back-dated commits.
#[derive(Parser, Debug)]
#[command(name = "git-synced", version)]
#[command(about = "Generate a script that replays a GitHub contribution graph as empty commits")]
pub struct Args {
    /// Saved HTML of your GitHub profile page (prompted for when omitted)
    pub file: Option<PathBuf>,

    /// Committer name (defaults to `git config user.name` when prompted)
    #[arg(long)]
    pub name: Option<String>,

    /// Committer email (defaults to `git config user.email` when prompted)
    #[arg(long)]
    pub email: Option<String>,

    /// Commit message template; `{{date}}` and `{{count}}` are substituted
    #[arg(long, short)]
    pub message: Option<String>,

    /// Where to write the generated script
    #[arg(long, short, default_value = "script.sh")]
    pub output: PathBuf,

    /// Only treat a commit as existing when its whole message matches
    #[arg(long)]
    pub exact: bool,

    /// Run the generated script without asking
    #[arg(long, conflicts_with = "no_execute")]
    pub execute: bool,

    /// Never offer to run the generated script
    #[arg(long)]
    pub no_execute: bool,

    /// Enable debug logging on stderr
    #[arg(long, short)]
    pub verbose: bool,
}

impl Args {
    fn match_policy(&self) -> MatchPolicy {
        if self.exact {
            MatchPolicy::Exact
        } else {
            MatchPolicy::Substring
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG` takes precedence over
/// `--verbose`.
fn init_logging(verbose: bool) {
    let default_filter = if verbose {
        "git_synced=debug"
    } else {
        "git_synced=warn"
    };

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init();
}

fn spinner(message: &str) -> ProgressBar {
    let style = ProgressStyle::default_spinner()
        .tick_strings(SPINNER_FRAMES)
        .template("{spinner:.yellow} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Hides the spinner while a confirmation is on screen.
struct SuspendingConfirm<'a, P> {
    spinner: &'a ProgressBar,
    inner: P,
}

impl<P: ConfirmPrompter> ConfirmPrompter for SuspendingConfirm<'_, P> {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String> {
        let inner = &mut self.inner;
        self.spinner.suspend(|| inner.confirm(prompt, default))
    }
}

/// Uses `given` when present (it must pass `validate`), otherwise prompts.
fn value_or_prompt(
    given: Option<&str>,
    label: &str,
    default_value: &str,
    validate: fn(&str) -> Result<(), String>,
) -> error::Result<String> {
    match given {
        Some(v) => {
            validate(v).map_err(SyncError::InvalidInput)?;
            Ok(v.trim().to_string())
        }
        None => {
            let mut prompter = DialoguerStringPrompter;
            prompt::ask_validated(&mut prompter, label, default_value, validate)
                .map_err(SyncError::Prompt)
        }
    }
}

/// Reads the saved profile page, rejecting empty files.
pub fn read_page(path: &Path) -> error::Result<String> {
    let page = fs::read_to_string(path).map_err(|source| SyncError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if page.trim().is_empty() {
        return Err(SyncError::EmptyInput(path.to_path_buf()));
    }

    Ok(page)
}

fn resolve_input(args: &Args) -> error::Result<PathBuf> {
    let given = args.file.as_ref().map(|p| p.to_string_lossy().to_string());
    let name = value_or_prompt(
        given.as_deref(),
        "Enter the html file name with your GitHub profile page content.",
        "index.html",
        prompt::validate_file_name,
    )?;
    Ok(PathBuf::from(name))
}

fn resolve_identity(args: &Args) -> error::Result<Identity> {
    println!(
        "{}",
        style(
            "To ensure your commits are linked to your primary account, \
             please input the following details:"
        )
        .blue()
    );

    let name = value_or_prompt(
        args.name.as_deref(),
        "Committer name:",
        &git::config_get("user.name"),
        prompt::validate_name,
    )?;
    let email = value_or_prompt(
        args.email.as_deref(),
        "Committer email:",
        &git::config_get("user.email"),
        prompt::validate_email,
    )?;

    Ok(Identity::new(name, email))
}

/// Takes the template from `--message` or a prompt. Both paths trim it.
fn resolve_template(args: &Args) -> error::Result<MessageTemplate> {
    let template = match &args.message {
        Some(m) => m.trim().to_string(),
        None => {
            let mut prompter = DialoguerStringPrompter;
            prompt::ask_validated(
                &mut prompter,
                "Enter commit message format:",
                DEFAULT_TEMPLATE,
                |_| Ok(()),
            )
            .map_err(SyncError::Prompt)?
        }
    };
    Ok(MessageTemplate::new(template))
}

/// Dimmed lines printed for a commit that already exists.
fn skip_report(entry: &str) -> String {
    format!(
        "{}\n{}",
        style("Skipping commit that already exists").dim(),
        style(entry).dim()
    )
}

/// Generates the script and, if asked to, runs it.
fn run(args: &Args) -> error::Result<i32> {
    banner::print_logo();

    git::ensure_available()?;
    git::rev_parse("--is-inside-work-tree")
        .map_err(|e| SyncError::Git(format!("not inside a git repo ({})", e)))?;
    let repo = env::current_dir()?;

    let input = resolve_input(args)?;
    let page = read_page(&input)?;
    println!(
        "Successfully read file containing {} lines.",
        page.split('\n').count()
    );

    let identity = resolve_identity(args)?;
    let template = resolve_template(args)?;

    let set: ContributionSet = contributions::extract(&page);
    println!("{} days with contributions found.", set.len());

    banner::print_summary(
        &identity.name,
        &identity.email,
        template.as_str(),
        set.len(),
        set.total_commits(),
    );

    let history = GitHistory::new(&repo, args.match_policy())?;
    let pb = spinner("Generating commits");
    let mut confirm = SuspendingConfirm {
        spinner: &pb,
        inner: DialoguerConfirmPrompter,
    };
    let outcome = script::synthesize_to_file(
        &set,
        &identity,
        &template,
        &history,
        &mut confirm,
        &args.output,
        |_, entry| pb.println(skip_report(entry)),
    );
    pb.finish_and_clear();

    let generated = match outcome? {
        Outcome::Ready(script) => script,
        Outcome::Cancelled => {
            println!("Operation cancelled.");
            return Ok(0);
        }
    };

    let script_name = args.output.display().to_string();
    println!(
        "{}",
        style(format!(
            "✔ Success! {} has been generated with {} commits.",
            script_name,
            generated.len()
        ))
        .green()
    );
    if generated.skipped > 0 {
        println!(
            "{}",
            style(format!(
                "Skipped {} commits that already exist.",
                generated.skipped
            ))
            .dim()
        );
    }

    let execute = if args.execute {
        true
    } else if args.no_execute {
        false
    } else {
        let mut prompter = DialoguerConfirmPrompter;
        prompt::confirm_execute(&mut prompter, &script_name).map_err(SyncError::Prompt)?
    };
    if !execute {
        return Ok(0);
    }

    let pb = spinner(&format!(
        "Running {}",
        style(format!("bash {}", script_name)).blue()
    ));
    let result = git::run_script(&repo, &args.output);
    pb.finish_and_clear();
    let output = result?;

    println!("{}", style(&output.stdout).dim());
    if !output.stderr.is_empty() {
        println!("{}", output.stderr);
    }
    println!("Process terminated without errors.");
    banner::print_after_run();

    Ok(0)
}

/// Main CLI entry point for `git-synced`.
///
/// 1. Prints the logo and checks that `git` is installed and that the
///    current directory is a work tree.
/// 2. Reads the saved profile page (argument or prompt).
/// 3. Collects committer identity and message template (flags or prompts).
/// 4. Extracts contribution days and synthesizes the commit script,
///    skipping commits already present in history.
/// 5. Writes the script and optionally runs it.
///
/// # Exit Codes
///
/// * `0` – Success, including user cancellation and declining to execute.
/// * Non-zero – Any failure; nothing is written unless the script was
///   fully generated.
pub fn entry() -> Result<i32, ()> {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(code) => Ok(code),
        Err(e) => {
            tracing::debug!(error = ?e, "run failed");
            eprintln!("{}", style(format!("✘ Error: {}", e)).red().bold());
            Err(())
        }
    }
}
