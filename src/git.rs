use crate::error::{Result, SyncError};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};

/// Upper bound for a single history lookup.
pub const HISTORY_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Stderr fragment git prints when `HEAD` does not resolve in a repository
/// without commits. Only reliable in the C locale, see [`GitHistory`].
const UNBORN_HEAD: &str = "Needed a single revision";

/// Read-only view of the target repository's commit log.
///
/// The synthesizer only ever queries history; commits are created later,
/// when the generated script runs.
pub trait CommitHistory {
    /// Whether `HEAD` resolves, i.e. the repository has at least one commit.
    fn has_commits(&self) -> Result<bool>;

    /// Looks for an existing commit carrying `message`.
    ///
    /// Returns the matching log text, or `None` when nothing matches.
    fn find_message(&self, message: &str) -> Result<Option<String>>;
}

/// How a rendered message is compared against existing commit messages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    /// Any commit whose message contains the rendered message counts as a
    /// duplicate (`git log --grep`).
    #[default]
    Substring,
    /// Only a commit whose full message equals the rendered message counts.
    Exact,
}

/// [`CommitHistory`] backed by the `git` binary.
///
/// Every query runs on a private single-threaded tokio runtime so it can be
/// bounded by [`HISTORY_QUERY_TIMEOUT`]; a query that overruns is killed.
/// Commands run with `LC_ALL=C` so git's messages can be matched.
#[derive(Debug)]
pub struct GitHistory {
    repo: PathBuf,
    policy: MatchPolicy,
    timeout: Duration,
    runtime: Runtime,
}

impl GitHistory {
    /// Creates a history view of the repository at `repo`.
    ///
    /// # Parameters
    ///
    /// * `repo` – Working directory of the repository to query.
    /// * `policy` – How rendered messages are matched against the log.
    ///
    /// # Returns
    ///
    /// * `Ok(GitHistory)` ready to answer queries.
    /// * `Err(SyncError::Io)` if the query runtime cannot be started.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use git_synced::git::{CommitHistory, GitHistory, MatchPolicy};
    /// use std::path::Path;
    ///
    /// let history = GitHistory::new(Path::new("."), MatchPolicy::Substring)?;
    /// if history.has_commits()? {
    ///     println!("{:?}", history.find_message("git-synced 2024-01-01 commit 1")?);
    /// }
    /// # Ok::<(), git_synced::error::SyncError>(())
    /// ```
    pub fn new(repo: &Path, policy: MatchPolicy) -> Result<Self> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        Ok(Self {
            repo: repo.to_path_buf(),
            policy,
            timeout: HISTORY_QUERY_TIMEOUT,
            runtime,
        })
    }

    fn git(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.current_dir(&self.repo);
        cmd.env("LC_ALL", "C");
        cmd
    }
}

impl CommitHistory for GitHistory {
    fn has_commits(&self) -> Result<bool> {
        let mut cmd = self.git();
        cmd.args(["rev-parse", "--verify", "HEAD"]);
        let out = capture_with_timeout(&self.runtime, cmd, self.timeout)?;
        head_exists_from(&out)
    }

    fn find_message(&self, message: &str) -> Result<Option<String>> {
        let mut cmd = self.git();
        cmd.args(["log", "--fixed-strings"]);
        cmd.arg(format!("--grep={}", message));

        if self.policy == MatchPolicy::Exact {
            cmd.arg("--format=%H%x1f%B%x1e");
        }

        let out = capture_with_timeout(&self.runtime, cmd, self.timeout)?;
        if !out.success {
            return Err(SyncError::Git(out.stderr));
        }

        let found = match self.policy {
            MatchPolicy::Substring => Some(out.stdout).filter(|s| !s.is_empty()),
            MatchPolicy::Exact => exact_match(&out.stdout, message),
        };

        if let Some(entry) = &found {
            tracing::debug!(
                rendered = message,
                entry = entry.as_str(),
                "existing commit found"
            );
        }

        Ok(found)
    }
}

/// Output of a finished child process.
#[derive(Debug)]
struct Captured {
    success: bool,
    stdout: String,
    stderr: String,
}

impl From<Output> for Captured {
    fn from(out: Output) -> Self {
        Self {
            success: out.status.success(),
            stdout: String::from_utf8_lossy(&out.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
        }
    }
}

/// Interprets `git rev-parse --verify HEAD`.
///
/// A failure caused by an unborn `HEAD` means "no commits yet"; any other
/// failure is a real error.
fn head_exists_from(out: &Captured) -> Result<bool> {
    if out.success {
        Ok(true)
    } else if out.stderr.contains(UNBORN_HEAD) {
        Ok(false)
    } else {
        Err(SyncError::Git(out.stderr.clone()))
    }
}

/// Picks the commit whose full message equals `message` out of
/// `%H%x1f%B%x1e` formatted log output.
fn exact_match(log: &str, message: &str) -> Option<String> {
    log.split('\x1e')
        .map(str::trim)
        .filter(|record| !record.is_empty())
        .filter_map(|record| record.split_once('\x1f'))
        .find(|(_, body)| body.trim() == message)
        .map(|(hash, body)| format!("commit {}\n\n    {}", hash.trim(), body.trim()))
}

fn capture(mut cmd: Command) -> Result<Captured> {
    Ok(cmd.output()?.into())
}

/// Like [`capture`], but gives up after `timeout`.
///
/// The child is spawned with `kill_on_drop`, so dropping the output future
/// on timeout kills it.
fn capture_with_timeout(runtime: &Runtime, cmd: Command, timeout: Duration) -> Result<Captured> {
    let mut cmd = tokio::process::Command::from(cmd);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    runtime.block_on(async {
        match tokio::time::timeout(timeout, cmd.output()).await {
            Ok(Ok(out)) => Ok(out.into()),
            Ok(Err(e)) => Err(SyncError::Io(e)),
            Err(_) => {
                tracing::error!(?timeout, "git command timed out");
                Err(SyncError::GitTimeout(timeout))
            }
        }
    })
}

/// Runs a command and returns its trimmed standard output on success,
/// or its trimmed standard error as [`SyncError::Git`] on failure.
fn run_output(cmd: Command) -> Result<String> {
    let out = capture(cmd)?;
    if out.success {
        Ok(out.stdout)
    } else {
        Err(SyncError::Git(out.stderr))
    }
}

/// Fails with [`SyncError::GitNotFound`] when `git` is not on `PATH`.
pub fn ensure_available() -> Result<()> {
    which::which("git").map(|_| ()).map_err(|_| SyncError::GitNotFound)
}

/// Runs `git rev-parse <flag>` in the current directory and returns its
/// output as a trimmed string.
///
/// # Examples
///
/// ```ignore
/// // Ignored because it depends on being inside a Git repository.
/// use git_synced::git::rev_parse;
///
/// match rev_parse("--show-toplevel") {
///     Ok(path) => println!("Repository root: {}", path),
///     Err(err) => eprintln!("Git error: {}", err),
/// }
/// ```
pub fn rev_parse(flag: &str) -> Result<String> {
    let mut cmd = Command::new("git");
    cmd.arg("rev-parse").arg(flag);
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    run_output(cmd)
}

/// Runs `git config --get <key>` and returns the trimmed value.
///
/// A missing key (or any failure) yields an empty string rather than an
/// error; callers use the value only as a prompt default.
pub fn config_get(key: &str) -> String {
    let mut cmd = Command::new("git");
    cmd.arg("config").arg("--get").arg(key);
    run_output(cmd).unwrap_or_default()
}

/// Captured output of a generated script run.
#[derive(Debug, Clone, Default)]
pub struct ScriptOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes `bash <script>` inside `repo`.
///
/// # Errors
///
/// [`SyncError::ScriptFailed`] with the script's stderr when it exits
/// non-zero.
pub fn run_script(repo: &Path, script: &Path) -> Result<ScriptOutput> {
    let mut cmd = Command::new("bash");
    cmd.arg(script).current_dir(repo);
    cmd.stdin(Stdio::null());

    let out = capture(cmd)?;
    if !out.success {
        return Err(SyncError::ScriptFailed(out.stderr));
    }

    Ok(ScriptOutput {
        stdout: out.stdout,
        stderr: out.stderr,
    })
}
