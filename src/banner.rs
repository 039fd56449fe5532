use console::{measure_text_width, style};
use rand::Rng;
use std::iter;

const LOGO: [&str; 16] = [
    "                                                 .",
    "                                               .o#",
    "                             .#######= %###% .o###oo",
    "                            ###' `##\\  `###    ###",
    "                            ###   ###   ###    ###",
    "                            `##bod#Y'   ###    ### .",
    "                            `#oooooo.  %###%   \"###\"",
    "                            d\"     YD                      .o#",
    "                            \"Y#####P'                     \"###",
    " .====.# ====    === ===. .==.    .ooooo.   .ooooo.   .oooo###",
    "d##(  \"#  `##.  .#'  `###P\"Y##b  d##' `\"Y# d##' `##b d##' `###",
    "`\"Y##b.    `##..#'    ###   ###  ###       ###ooo##Y ###   ###",
    "#.  )##b    `###'     ###   ###  ###   .o# ###    .o ###   ###",
    "#\"\"###P'     .#'     o###o o###o `Y#bod#P' `Y#bod#P' `Y#bod##P\"",
    "         .o..P'",
    "         `Y#P'",
];

const CONTRIBUTIONS_DOCS: &str = "https://docs.github.com/en/account-and-profile/setting-up-and-managing-your-github-profile/managing-contribution-settings-on-your-profile/why-are-my-contributions-not-showing-up-on-my-profile#contributions-that-are-counted";

/// Prints the speckled green logo.
pub fn print_logo() {
    let mut rng = rand::thread_rng();
    for line in logo_lines(&mut rng) {
        println!("{line}");
    }
    println!("\n");
}

/// Colors each `#` of the logo bright or dim at random; everything else is
/// dim green.
fn logo_lines<R: Rng>(rng: &mut R) -> Vec<String> {
    LOGO.iter()
        .map(|line| {
            line.chars()
                .map(|c| {
                    if c == '#' {
                        if rng.gen_bool(0.6) {
                            style('#').green().bold().to_string()
                        } else {
                            style('#').green().bright().dim().to_string()
                        }
                    } else {
                        style(c).green().dim().to_string()
                    }
                })
                .collect::<String>()
        })
        .collect()
}

/// Prints a framed summary of what is about to be generated.
///
/// Width is computed from the visible text so inline colors do not break
/// the frame.
pub fn print_summary(name: &str, email: &str, template: &str, days: usize, commits: u64) {
    let lines = summary_lines(name, email, template, days, commits);

    let max_width = lines
        .iter()
        .map(|l| measure_text_width(l))
        .max()
        .unwrap_or(0)
        + 2;

    let border = "═".repeat(max_width);
    let top = style(format!("╔{}╗", border)).green().bold();
    let bottom = style(format!("╚{}╝", border)).green().bold();
    let left = style("║ ").green().bold().to_string();
    let right = style("║").green().bold().to_string();

    println!();
    println!("{top}");
    for line in lines {
        let visible = measure_text_width(&line);
        let pad = max_width - visible;
        println!("{}{}{}{}", left, line, " ".repeat(pad - 1), right);
    }
    println!("{bottom}");
    println!();
}

fn summary_lines(
    name: &str,
    email: &str,
    template: &str,
    days: usize,
    commits: u64,
) -> Vec<String> {
    let top = ["Replay contributions as empty commits", ""]
        .into_iter()
        .map(|s| s.to_string());

    let details = iter::once(format!("Committer: {} <{}>", name, email))
        .chain(iter::once(format!(
            "Message:   {}",
            style(template).cyan()
        )))
        .chain(iter::once(format!(
            "Found {} days, up to {} commits",
            style(days).yellow().bold(),
            style(commits).yellow().bold()
        )));

    let bottom = iter::once(String::new()).chain(
        [
            "Commits already in this repository are skipped.",
            "Nothing is committed until the script runs.",
        ]
        .into_iter()
        .map(|s| s.to_string()),
    );

    top.chain(details).chain(bottom).collect()
}

/// Prints the closing notes after a successful script run.
pub fn print_after_run() {
    println!("{}", style("✔ Success! All commits have been made locally.").green());
    println!(
        "You may review the commits and, when ready, run {}",
        style("git push").blue()
    );
    println!(
        "\n{}\n",
        style("Why are my contributions not showing up on my profile?")
            .blue()
            .bright()
            .bold()
    );
    println!(
        "After making a commit that meets the requirements to count as a contribution, you may need to {} to see the contribution appear on your contributions graph.",
        style("wait for up to 24 hours").yellow().bold()
    );
    println!(
        "Please refer to GitHub Docs: {}",
        style("Contributions that are counted").yellow().bold()
    );
    println!("{}", style(CONTRIBUTIONS_DOCS).black().bright().italic());
}
