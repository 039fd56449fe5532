use console::style;
use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use regex::Regex;
use std::sync::LazyLock;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("static regex"));

/// Abstraction over a string input prompt.
///
/// Implementors define how string input is collected from the user,
/// including any styling or interactivity. This trait enables testability
/// by decoupling user input from the logic that consumes it.
pub trait StringPrompter {
    /// Prompt the user for a string input.
    ///
    /// # Parameters
    /// - `prompt`: The message shown to the user.
    /// - `default`: Default value if the user presses Enter without input.
    ///   An empty default means "no default".
    ///
    /// # Returns
    /// `Ok(String)` if input is successfully collected, or an `Err(String)` describing the failure.
    fn prompt(&mut self, prompt: &str, default: &str) -> Result<String, String>;
}

/// Abstraction over a boolean (yes/no) confirmation prompt.
pub trait ConfirmPrompter {
    /// Prompt the user for a yes/no confirmation.
    ///
    /// # Returns
    /// `Ok(true)` if confirmed, `Ok(false)` if declined, or `Err(String)` on input failure.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String>;
}

/// Default implementation of `StringPrompter` using `dialoguer::Input`.
pub struct DialoguerStringPrompter;

impl StringPrompter for DialoguerStringPrompter {
    fn prompt(&mut self, prompt: &str, default: &str) -> Result<String, String> {
        let theme = ColorfulTheme::default();
        let mut input = Input::<String>::with_theme(&theme)
            .with_prompt(prompt)
            .allow_empty(true);
        if !default.is_empty() {
            input = input.default(default.to_string());
        }
        match input.interact_text() {
            Ok(v) => Ok(v),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Default implementation of `ConfirmPrompter` using `dialoguer::Confirm`.
pub struct DialoguerConfirmPrompter;

impl ConfirmPrompter for DialoguerConfirmPrompter {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String> {
        let theme = ColorfulTheme::default();
        let confirm = Confirm::with_theme(&theme)
            .with_prompt(prompt)
            .default(default);
        match confirm.interact() {
            Ok(v) => Ok(v),
            Err(e) => Err(e.to_string()),
        }
    }
}

/// Prompts until `validate` accepts the answer.
///
/// Each rejected answer prints the validator's message in red and asks
/// again. The accepted answer is returned trimmed.
pub fn ask_validated<P, V>(
    prompter: &mut P,
    label: &str,
    default_value: &str,
    validate: V,
) -> Result<String, String>
where
    P: StringPrompter + ?Sized,
    V: Fn(&str) -> Result<(), String>,
{
    loop {
        let answer = prompter.prompt(label, default_value)?;
        match validate(&answer) {
            Ok(()) => return Ok(answer.trim().to_string()),
            Err(reason) => eprintln!("{}", style(reason).red()),
        }
    }
}

/// Checks the profile page file name entered by the user.
///
/// # Parameters
///
/// * `value` – Raw answer; surrounding whitespace is ignored.
///
/// # Returns
///
/// * `Ok(())` if the name is non-empty and ends with `.html`.
/// * `Err(String)` with the message shown to the user otherwise.
///
/// # Examples
///
/// ```
/// use git_synced::prompt::validate_file_name;
///
/// assert!(validate_file_name("index.html").is_ok());
/// assert!(validate_file_name("index.htm").is_err());
/// ```
pub fn validate_file_name(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(String::from("HTML file name is required."));
    }
    if !value.ends_with(".html") {
        return Err(String::from("File name must end with \".html\"."));
    }
    Ok(())
}

/// Rejects a blank committer name.
pub fn validate_name(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(String::from("Committer name is required."))
    } else {
        Ok(())
    }
}

/// Checks a committer email.
///
/// Only the rough shape `something@domain.tld` is enforced; whether the
/// address belongs to the GitHub account is up to the user.
///
/// # Examples
///
/// ```
/// use git_synced::prompt::validate_email;
///
/// assert!(validate_email("jane@example.com").is_ok());
/// assert_eq!(validate_email("jane@example"), Err("Invalid email format.".to_string()));
/// ```
pub fn validate_email(value: &str) -> Result<(), String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(String::from("Committer email is required."));
    }
    if !EMAIL.is_match(value) {
        return Err(String::from("Invalid email format."));
    }
    Ok(())
}

/// Ask whether to keep going after many already-existing commits were
/// skipped in a row. Defaults to "no".
pub fn confirm_continue_after_skips<P: ConfirmPrompter + ?Sized>(
    prompter: &mut P,
    threshold: usize,
) -> Result<bool, String> {
    let prompt = format!(
        "More than {} consecutive commits have been skipped.\n\
         Are you sure your HTML file has the correct content and want to continue?",
        threshold
    );
    prompter.confirm(&prompt, false)
}

/// Ask whether to run the generated script now. Defaults to "no".
pub fn confirm_execute<P: ConfirmPrompter + ?Sized>(
    prompter: &mut P,
    script_name: &str,
) -> Result<bool, String> {
    let prompt = format!("Do you want to execute the {} file?", script_name);
    prompter.confirm(&prompt, false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedStringPrompter {
        answers: VecDeque<Result<String, String>>,
        asked: usize,
        expected_prompt: String,
        expected_default: String,
    }

    impl ScriptedStringPrompter {
        fn new(answers: &[&str], prompt: &str, default: &str) -> Self {
            Self {
                answers: answers.iter().map(|a| Ok(a.to_string())).collect(),
                asked: 0,
                expected_prompt: prompt.to_string(),
                expected_default: default.to_string(),
            }
        }
    }

    impl StringPrompter for ScriptedStringPrompter {
        fn prompt(&mut self, prompt: &str, default: &str) -> Result<String, String> {
            assert_eq!(prompt, self.expected_prompt);
            assert_eq!(default, self.expected_default);
            self.asked += 1;
            self.answers
                .pop_front()
                .unwrap_or_else(|| Err("no more answers".to_string()))
        }
    }

    struct MockConfirmPrompter {
        pub response: Result<bool, String>,
        pub expected_prompt: String,
        pub expected_default: bool,
    }

    impl ConfirmPrompter for MockConfirmPrompter {
        fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, String> {
            assert_eq!(prompt, self.expected_prompt);
            assert_eq!(default, self.expected_default);
            self.response.clone()
        }
    }

    #[test]
    fn ask_validated_returns_first_valid_answer() {
        let mut prompter = ScriptedStringPrompter::new(&["  Alice  "], "Committer name:", "");
        let result = ask_validated(&mut prompter, "Committer name:", "", validate_name);
        assert_eq!(result.unwrap(), "Alice");
        assert_eq!(prompter.asked, 1);
    }

    #[test]
    fn ask_validated_reprompts_until_valid() {
        let mut prompter = ScriptedStringPrompter::new(
            &["", "page.txt", "profile.html"],
            "HTML file",
            "index.html",
        );
        let result = ask_validated(&mut prompter, "HTML file", "index.html", validate_file_name);
        assert_eq!(result.unwrap(), "profile.html");
        assert_eq!(prompter.asked, 3);
    }

    #[test]
    fn ask_validated_propagates_prompt_errors() {
        let mut prompter = ScriptedStringPrompter::new(&["not-an-email"], "Committer email:", "");
        let result = ask_validated(&mut prompter, "Committer email:", "", validate_email);
        assert_eq!(result.unwrap_err(), "no more answers");
    }

    #[test]
    fn file_name_rules() {
        assert_eq!(
            validate_file_name("   ").unwrap_err(),
            "HTML file name is required."
        );
        assert_eq!(
            validate_file_name("index.htm").unwrap_err(),
            "File name must end with \".html\"."
        );
        assert!(validate_file_name("index.html").is_ok());
    }

    #[test]
    fn email_rules() {
        assert_eq!(validate_email("").unwrap_err(), "Committer email is required.");
        assert_eq!(validate_email("jane").unwrap_err(), "Invalid email format.");
        assert_eq!(validate_email("jane@host").unwrap_err(), "Invalid email format.");
        assert!(validate_email("jane@example.com").is_ok());
        assert!(validate_email(" jane@example.com ").is_ok());
    }

    #[test]
    fn name_rules() {
        assert!(validate_name("").is_err());
        assert!(validate_name("Jane Doe").is_ok());
    }

    #[test]
    fn test_confirm_continue_after_skips_defaults_to_no() {
        let mut prompter = MockConfirmPrompter {
            response: Ok(true),
            expected_prompt: "More than 20 consecutive commits have been skipped.\n\
                              Are you sure your HTML file has the correct content \
                              and want to continue?"
                .to_string(),
            expected_default: false,
        };
        assert_eq!(confirm_continue_after_skips(&mut prompter, 20).unwrap(), true);
    }

    #[test]
    fn test_confirm_execute_false() {
        let mut prompter = MockConfirmPrompter {
            response: Ok(false),
            expected_prompt: "Do you want to execute the script.sh file?".to_string(),
            expected_default: false,
        };
        assert_eq!(confirm_execute(&mut prompter, "script.sh").unwrap(), false);
    }

    #[test]
    fn test_confirm_execute_error() {
        let mut prompter = MockConfirmPrompter {
            response: Err("confirm failed".to_string()),
            expected_prompt: "Do you want to execute the script.sh file?".to_string(),
            expected_default: false,
        };
        assert!(confirm_execute(&mut prompter, "script.sh").is_err());
    }
}
