use crate::contributions::ContributionSet;
use crate::error::{Result, SyncError};
use crate::git::CommitHistory;
use crate::prompt::{self, ConfirmPrompter};
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

/// Consecutive skips tolerated before the run pauses for confirmation.
pub const SKIP_THRESHOLD: usize = 20;

pub const DEFAULT_TEMPLATE: &str = ":green_square: git-synced {{date}} commit {{count}}";

const DATE_TOKEN: &str = "{{date}}";
const INDEX_TOKEN: &str = "{{count}}";

/// Committer (and author) identity stamped on every generated commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Creates an identity from a display name and an email address.
    ///
    /// # Parameters
    ///
    /// * `name` – Value for `GIT_COMMITTER_NAME` and the author name.
    /// * `email` – Value for `GIT_COMMITTER_EMAIL` and the author email.
    ///
    /// # Examples
    ///
    /// ```
    /// use git_synced::script::Identity;
    ///
    /// let me = Identity::new("Jane Doe", "jane@example.com");
    /// assert_eq!(me.author(), "Jane Doe <jane@example.com>");
    /// ```
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// `"Name <email>"`, as accepted by `git commit --author`.
    pub fn author(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }
}

/// Commit message template with `{{date}}` and `{{count}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate(String);

impl MessageTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Substitutes the first `{{date}}` with the ISO date and the first
    /// `{{count}}` with the 1-based index of the commit within that day.
    ///
    /// The result is cleaned up the way `git commit` stores a message, so
    /// it can be looked up again after the commit exists.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use git_synced::script::MessageTemplate;
    ///
    /// let template = MessageTemplate::new("synced {{date}} commit {{count}} ");
    /// let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    /// assert_eq!(template.render(day, 2), "synced 2024-01-01 commit 2");
    /// ```
    pub fn render(&self, date: NaiveDate, index: u32) -> String {
        let raw = self
            .0
            .replacen(DATE_TOKEN, &iso_date(date), 1)
            .replacen(INDEX_TOKEN, &index.to_string(), 1);
        clean_message(&raw)
    }
}

impl Default for MessageTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

/// Whitespace cleanup applied by `git commit -m`: trailing whitespace is
/// dropped from every line, runs of blank lines collapse into one, and the
/// message is trimmed.
fn clean_message(raw: &str) -> String {
    let mut lines: Vec<&str> = Vec::new();
    for line in raw.lines().map(str::trim_end) {
        if line.is_empty() && lines.last().is_none_or(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(line);
    }
    lines.join("\n").trim().to_string()
}

/// One empty commit, pinned to midnight UTC of its day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitDirective {
    pub committer: Identity,
    pub author: Identity,
    pub date: NaiveDate,
    pub message: String,
}

impl CommitDirective {
    pub fn timestamp(&self) -> String {
        format!("{}T00:00:00.000Z", iso_date(self.date))
    }

    /// Renders the directive as a single shell command line (no newline).
    pub fn to_command(&self) -> String {
        let ts = self.timestamp();
        [
            format!("GIT_COMMITTER_NAME={}", quote(&self.committer.name)),
            format!("GIT_COMMITTER_EMAIL={}", quote(&self.committer.email)),
            format!("GIT_COMMITTER_DATE={}", quote(&ts)),
            String::from("git commit"),
            String::from("--allow-empty"),
            format!("-m {}", quote(&self.message)),
            format!("--date={}", quote(&ts)),
            format!("--author={}", quote(&self.author.author())),
        ]
        .join(" ")
    }
}

/// Directives decided by a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    pub directives: Vec<CommitDirective>,
    /// Candidates dropped because a matching commit already existed.
    pub skipped: usize,
}

impl Script {
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    /// Full script text, one command per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for directive in &self.directives {
            out.push_str(&directive.to_command());
            out.push('\n');
        }
        out
    }
}

/// Result of [`synthesize`] when nothing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ready(Script),
    /// The user declined to continue past the skip threshold.
    Cancelled,
}

/// Tracks consecutive skips and whether the confirmation is still armed.
#[derive(Debug, Clone, Copy)]
struct SkipValve {
    consecutive: usize,
    armed: bool,
}

impl SkipValve {
    fn new() -> Self {
        Self {
            consecutive: 0,
            armed: true,
        }
    }

    fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Counts one skip and reports whether the user must now be asked.
    fn record_skip(&mut self) -> bool {
        self.consecutive += 1;
        self.armed && self.consecutive > SKIP_THRESHOLD
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

/// Turns contribution days into commit directives, skipping every commit
/// whose message already appears in `history`.
///
/// Same as [`synthesize_with`] without a skip callback.
pub fn synthesize<H, P>(
    set: &ContributionSet,
    identity: &Identity,
    template: &MessageTemplate,
    history: &H,
    prompter: &mut P,
) -> Result<Outcome>
where
    H: CommitHistory + ?Sized,
    P: ConfirmPrompter + ?Sized,
{
    synthesize_with(set, identity, template, history, prompter, |_, _| {})
}

/// Turns contribution days into commit directives, skipping every commit
/// whose message already appears in `history`.
///
/// Days are walked in set order and each day yields `count` candidates with
/// indices `1..=count`. When the repository has no commits yet, history is
/// not consulted at all.
///
/// Every skip is reported to `on_skip` with the rendered message and the
/// matching log entry.
///
/// After more than [`SKIP_THRESHOLD`] consecutive skips the user is asked
/// once whether the input is right; declining returns
/// [`Outcome::Cancelled`], confirming silences the check for the rest of
/// the run.
///
/// # Errors
///
/// * [`SyncError::NoCommits`] when no directive would be emitted.
/// * Any history or prompt failure.
pub fn synthesize_with<H, P, F>(
    set: &ContributionSet,
    identity: &Identity,
    template: &MessageTemplate,
    history: &H,
    prompter: &mut P,
    mut on_skip: F,
) -> Result<Outcome>
where
    H: CommitHistory + ?Sized,
    P: ConfirmPrompter + ?Sized,
    F: FnMut(&str, &str),
{
    let has_commits = history.has_commits()?;
    if !has_commits {
        tracing::debug!("repository has no commits; skipping history lookups");
    }

    let mut script = Script::default();
    let mut valve = SkipValve::new();

    for day in set {
        for index in 1..=day.count {
            let message = template.render(day.date, index);

            let existing = if has_commits {
                history.find_message(&message)?
            } else {
                None
            };

            match existing {
                None => {
                    valve.reset();
                    script.directives.push(CommitDirective {
                        committer: identity.clone(),
                        author: identity.clone(),
                        date: day.date,
                        message,
                    });
                }
                Some(entry) => {
                    tracing::info!(
                        rendered = message.as_str(),
                        existing = entry.as_str(),
                        "skipping commit that already exists"
                    );
                    on_skip(&message, &entry);
                    script.skipped += 1;

                    if valve.record_skip() {
                        let proceed =
                            prompt::confirm_continue_after_skips(prompter, SKIP_THRESHOLD)
                                .map_err(SyncError::Prompt)?;
                        if !proceed {
                            tracing::info!("run cancelled at skip threshold");
                            return Ok(Outcome::Cancelled);
                        }
                        valve.disarm();
                    }
                }
            }
        }
    }

    if script.is_empty() {
        return Err(SyncError::NoCommits);
    }

    tracing::info!(
        commits = script.len(),
        skipped = script.skipped,
        "script synthesized"
    );
    Ok(Outcome::Ready(script))
}

/// Runs [`synthesize_with`] and writes the script to `output` only when the
/// run ends in [`Outcome::Ready`].
///
/// A cancelled run, or one that fails (including [`SyncError::NoCommits`]),
/// leaves `output` untouched.
///
/// # Parameters
///
/// * `set` – Contribution days to replay.
/// * `identity` – Committer and author of every generated commit.
/// * `template` – Message template rendered per commit.
/// * `history` – Existing commits used for deduplication.
/// * `prompter` – Asked once if too many commits in a row already exist.
/// * `output` – Path of the script file.
/// * `on_skip` – Called for every commit that already exists.
///
/// # Returns
///
/// * `Ok(Outcome::Ready(script))` after `script` was written to `output`.
/// * `Ok(Outcome::Cancelled)` if the user stopped the run.
/// * `Err(SyncError)` if synthesis or writing failed.
pub fn synthesize_to_file<H, P, F>(
    set: &ContributionSet,
    identity: &Identity,
    template: &MessageTemplate,
    history: &H,
    prompter: &mut P,
    output: &Path,
    on_skip: F,
) -> Result<Outcome>
where
    H: CommitHistory + ?Sized,
    P: ConfirmPrompter + ?Sized,
    F: FnMut(&str, &str),
{
    let outcome = synthesize_with(set, identity, template, history, prompter, on_skip)?;
    if let Outcome::Ready(script) = &outcome {
        write_script(output, script)?;
        tracing::debug!(path = %output.display(), "script written");
    }
    Ok(outcome)
}

/// Writes the whole script to `path` in one go, replacing any existing file.
///
/// # Errors
///
/// [`SyncError::Write`] naming `path` if the file cannot be written.
pub fn write_script(path: &Path, script: &Script) -> Result<()> {
    fs::write(path, script.render()).map_err(|source| SyncError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Single-quotes `value` for POSIX shells.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}
