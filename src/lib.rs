//! # git-synced
//!
//! Replay a GitHub contribution graph in a local repository.
//!
//! Given the saved HTML of a GitHub profile page, this crate:
//! - Extracts per-day contribution counts from the contribution calendar
//! - Generates a shell script with one empty, back-dated commit per contribution
//! - Skips commits whose message already exists in the repository history
//! - Optionally runs the script
//!
//! ## Usage
//!
//! ```bash
//! # Interactive: prompts for file, identity and message template
//! git-synced
//!
//! # Non-interactive generation
//! git-synced profile.html --name "Jane Doe" --email jane@example.com --no-execute
//! ```
//!
//! ## Modules
//!
//! - [`contributions`] - Contribution calendar extraction
//! - [`script`] - Commit script synthesis
//! - [`git`] - Git command wrappers and history lookups
//! - [`prompt`] - User input abstractions
//! - [`banner`] - Logo and closing notes
//! - [`cli`] - Command-line interface and main entry point
//! - [`error`] - Error type

pub mod banner;
pub mod cli;
pub mod contributions;
pub mod error;
pub mod git;
pub mod prompt;
pub mod script;
