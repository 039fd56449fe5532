use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;

static DAY_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td[data-date]").expect("static selector"));

static TOOLTIP: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tool-tip[for]").expect("static selector"));

static CONTRIBUTION_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([0-9]+) contribution").expect("static regex"));

/// A calendar day with at least one contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContributionDay {
    pub date: NaiveDate,
    pub count: u32,
}

/// Contribution days keyed by date, iterated in the order the dates were
/// first seen in the page.
///
/// Inserting a date that is already present replaces its count but keeps its
/// original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionSet {
    days: Vec<ContributionDay>,
    index: HashMap<NaiveDate, usize>,
}

impl ContributionSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `count` contributions on `date`, overwriting any earlier entry.
    ///
    /// A `count` of zero is ignored: days without contributions are never
    /// stored.
    pub fn insert(&mut self, date: NaiveDate, count: u32) {
        if count == 0 {
            return;
        }

        match self.index.get(&date) {
            Some(&pos) => self.days[pos].count = count,
            None => {
                self.index.insert(date, self.days.len());
                self.days.push(ContributionDay { date, count });
            }
        }
    }

    /// Looks up the count recorded for `date`.
    ///
    /// # Parameters
    ///
    /// * `date` – Calendar day to look up.
    ///
    /// # Returns
    ///
    /// * `Some(count)` with `count >= 1` if the day had contributions.
    /// * `None` if the day is not in the set.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use git_synced::contributions::ContributionSet;
    ///
    /// let day = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
    /// let mut set = ContributionSet::new();
    /// set.insert(day, 3);
    /// set.insert(day, 5);
    ///
    /// assert_eq!(set.get(&day), Some(5));
    /// assert_eq!(set.len(), 1);
    /// ```
    pub fn get(&self, date: &NaiveDate) -> Option<u32> {
        self.index.get(date).map(|&pos| self.days[pos].count)
    }

    /// Number of distinct days, not commits; see [`Self::total_commits`].
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContributionDay> {
        self.days.iter()
    }

    /// Sum of all per-day counts, i.e. the number of commits a run would
    /// create against an empty repository.
    pub fn total_commits(&self) -> u64 {
        self.days.iter().map(|d| u64::from(d.count)).sum()
    }
}

impl<'a> IntoIterator for &'a ContributionSet {
    type Item = &'a ContributionDay;
    type IntoIter = std::slice::Iter<'a, ContributionDay>;

    fn into_iter(self) -> Self::IntoIter {
        self.days.iter()
    }
}

/// Extracts contribution days from the HTML of a GitHub profile page.
///
/// Every `td` carrying a `data-date` attribute and a `data-level` greater
/// than zero becomes one entry. The count is read from the `tool-tip` whose
/// `for` attribute names the cell's `id` (text such as `"5 contributions on
/// February 1st."`); when there is no tooltip or its text carries no count,
/// the day counts as a single contribution.
///
/// The HTML5 parser recovers from malformed markup, so this never fails; a
/// page without matching cells yields an empty set.
///
/// # Examples
///
/// ```
/// use git_synced::contributions::extract;
///
/// let html = r#"<table><tr>
///   <td data-date="2024-02-01" data-level="3" id="day-1"></td>
/// </tr></table>
/// <tool-tip for="day-1">5 contributions on February 1st.</tool-tip>"#;
///
/// let set = extract(html);
/// assert_eq!(set.len(), 1);
/// assert_eq!(set.total_commits(), 5);
/// ```
pub fn extract(page: &str) -> ContributionSet {
    let document = Html::parse_document(page);
    let tooltips = tooltip_texts(&document);

    let mut set = ContributionSet::new();

    for cell in document.select(&DAY_CELL) {
        let attrs = cell.value();
        let Some(raw_date) = attrs.attr("data-date") else {
            continue;
        };

        if !has_activity(attrs.attr("data-level")) {
            continue;
        }

        let date = match NaiveDate::parse_from_str(raw_date.trim(), "%Y-%m-%d") {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(date = raw_date, error = %e, "skipping cell with invalid date");
                continue;
            }
        };

        let tooltip = attrs.id().and_then(|id| tooltips.get(id));
        let count = match tooltip {
            Some(text) => parse_count(text),
            None => 1,
        };

        tracing::debug!(%date, count, "contribution day");
        set.insert(date, count);
    }

    tracing::info!(days = set.len(), "extracted contribution days");
    set
}

/// Text of every `tool-tip[for]` keyed by its `for` target.
///
/// Several tooltips pointing at the same cell have their text concatenated.
fn tooltip_texts(document: &Html) -> HashMap<String, String> {
    let mut texts: HashMap<String, String> = HashMap::new();

    for tip in document.select(&TOOLTIP) {
        if let Some(target) = tip.value().attr("for") {
            texts
                .entry(target.to_string())
                .or_default()
                .push_str(&element_text(tip));
        }
    }

    texts
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>()
}

/// `true` when the level attribute starts with an integer above zero.
///
/// The leading integer is read like JavaScript's `parseInt`: surrounding
/// whitespace, an optional sign and a `0x` prefix are accepted and anything
/// after the digits is ignored, so `"2x"` and `"1.5"` both count as active.
fn has_activity(level: Option<&str>) -> bool {
    let Some(level) = level.map(str::trim_start) else {
        return false;
    };

    let (negative, rest) = match level.as_bytes().first() {
        Some(b'-') => (true, &level[1..]),
        Some(b'+') => (false, &level[1..]),
        _ => (false, level),
    };

    let (radix, digits) = match rest.get(..2) {
        Some("0x" | "0X") => (16, &rest[2..]),
        _ => (10, rest),
    };

    let mut leading = digits.chars().take_while(|c| c.is_digit(radix)).peekable();
    if leading.peek().is_none() {
        return false;
    }
    let nonzero = leading.any(|c| c != '0');
    nonzero && !negative
}

/// Reads `"<n> contribution"` out of tooltip text, defaulting to 1.
///
/// A count too large for `u32` also falls back to 1.
fn parse_count(text: &str) -> u32 {
    CONTRIBUTION_COUNT
        .captures(text.trim())
        .and_then(|caps| caps[1].parse::<u32>().ok())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid test date")
    }

    fn cell(date: &str, level: u8, id: &str) -> String {
        format!(
            r#"<td data-date="{date}" data-level="{level}" id="{id}" class="ContributionCalendar-day"></td>"#
        )
    }

    fn page(cells: &[String], tooltips: &[(&str, &str)]) -> String {
        let tips: String = tooltips
            .iter()
            .map(|(id, text)| format!(r#"<tool-tip for="{id}" popover="manual">{text}</tool-tip>"#))
            .collect();
        format!(
            "<html><body><table><tbody><tr>{}</tr></tbody></table>{}</body></html>",
            cells.concat(),
            tips
        )
    }

    #[test]
    fn cells_without_tooltips_count_once() {
        let html = page(
            &[
                cell("2024-01-01", 1, "d0"),
                cell("2024-01-02", 2, "d1"),
                cell("2024-01-03", 4, "d2"),
            ],
            &[],
        );

        let set = extract(&html);
        let got: Vec<_> = set.iter().map(|d| (d.date, d.count)).collect();
        assert_eq!(
            got,
            vec![
                (date("2024-01-01"), 1),
                (date("2024-01-02"), 1),
                (date("2024-01-03"), 1),
            ]
        );
    }

    #[test]
    fn tooltip_count_is_used() {
        let html = page(
            &[cell("2024-02-01", 3, "d0")],
            &[("d0", "5 contributions on February 1st.")],
        );

        let set = extract(&html);
        assert_eq!(set.get(&date("2024-02-01")), Some(5));
    }

    #[test]
    fn singular_contribution_matches() {
        let html = page(
            &[cell("2024-02-02", 1, "d0")],
            &[("d0", "  1 contribution on February 2nd.  ")],
        );

        assert_eq!(extract(&html).get(&date("2024-02-02")), Some(1));
    }

    #[test]
    fn tooltip_without_count_defaults_to_one() {
        let html = page(
            &[cell("2024-02-03", 2, "d0")],
            &[("d0", "Some contributions on February 3rd.")],
        );

        assert_eq!(extract(&html).get(&date("2024-02-03")), Some(1));
    }

    #[test]
    fn zero_level_cells_are_skipped() {
        let html = page(
            &[
                cell("2024-01-01", 0, "d0"),
                cell("2024-01-02", 1, "d1"),
                cell("2024-01-03", 0, "d2"),
            ],
            &[("d0", "No contributions on January 1st.")],
        );

        let set = extract(&html);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&date("2024-01-01")), None);
        assert!(set.iter().all(|d| d.count >= 1));
    }

    #[test]
    fn page_without_activity_is_empty() {
        let html = page(&[cell("2024-01-01", 0, "d0")], &[]);
        let set = extract(&html);
        assert!(set.is_empty());
        assert_eq!(set.total_commits(), 0);

        assert!(extract("").is_empty());
        assert!(extract("<div><p>not a profile").is_empty());
    }

    #[test]
    fn missing_or_garbage_level_is_skipped() {
        let html = r#"<table><tr>
            <td data-date="2024-01-01" id="a"></td>
            <td data-date="2024-01-02" data-level="high" id="b"></td>
            <td data-date="2024-01-03" data-level="-1" id="c"></td>
            <td data-date="2024-01-04" data-level=" 2 " id="d"></td>
        </tr></table>"#;

        let set = extract(html);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&date("2024-01-04")), Some(1));
    }

    #[test]
    fn invalid_dates_are_skipped() {
        let html = page(
            &[cell("2024-13-45", 1, "d0"), cell("yesterday", 1, "d1"), cell("2024-03-01", 1, "d2")],
            &[],
        );

        let set = extract(&html);
        assert_eq!(set.len(), 1);
        assert_eq!(set.get(&date("2024-03-01")), Some(1));
    }

    #[test]
    fn duplicate_dates_overwrite_but_keep_position() {
        let html = page(
            &[
                cell("2024-01-05", 1, "d0"),
                cell("2024-01-01", 1, "d1"),
                cell("2024-01-05", 2, "d2"),
            ],
            &[("d0", "2 contributions"), ("d2", "7 contributions")],
        );

        let set = extract(&html);
        let got: Vec<_> = set.iter().map(|d| (d.date, d.count)).collect();
        assert_eq!(got, vec![(date("2024-01-05"), 7), (date("2024-01-01"), 1)]);
    }

    #[test]
    fn order_follows_markup_not_calendar() {
        let html = page(
            &[
                cell("2024-03-01", 1, "d0"),
                cell("2023-12-31", 1, "d1"),
                cell("2024-01-15", 1, "d2"),
            ],
            &[],
        );

        let first = extract(&html);
        let second = extract(&html);
        assert_eq!(first, second);

        let dates: Vec<_> = first.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date("2024-03-01"), date("2023-12-31"), date("2024-01-15")]);
    }

    #[test]
    fn tooltip_for_other_cell_is_ignored() {
        let html = page(
            &[cell("2024-04-01", 1, "d0"), cell("2024-04-02", 1, "d1")],
            &[("d1", "9 contributions on April 2nd.")],
        );

        let set = extract(&html);
        assert_eq!(set.get(&date("2024-04-01")), Some(1));
        assert_eq!(set.get(&date("2024-04-02")), Some(9));
        assert_eq!(set.total_commits(), 10);
    }

    #[test]
    fn insert_ignores_zero_counts() {
        let mut set = ContributionSet::new();
        set.insert(date("2024-01-01"), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn parse_count_handles_nested_text() {
        assert_eq!(parse_count("12 contributions on May 5th."), 12);
        assert_eq!(parse_count("No contributions on May 5th."), 1);
        assert_eq!(parse_count("99999999999 contributions"), 1);
    }

    #[test]
    fn level_is_read_like_parse_int() {
        for active in ["1", " 4 ", "+2", "2x", "1.5", "007", "0x1", "99999999999999999999"] {
            assert!(has_activity(Some(active)), "{active:?} should be active");
        }
        for idle in [None, Some(""), Some("0"), Some("-1"), Some("0.5"), Some("x2"), Some("0x")] {
            assert!(!has_activity(idle), "{idle:?} should be idle");
        }
    }

    #[test]
    fn cells_with_trailing_junk_in_level_are_kept() {
        let html = page(
            &[
                r#"<td data-date="2024-05-01" data-level="2x" id="a"></td>"#.to_string(),
                r#"<td data-date="2024-05-02" data-level="1.5" id="b"></td>"#.to_string(),
            ],
            &[],
        );

        let set = extract(&html);
        assert_eq!(set.len(), 2);
        assert_eq!(set.get(&date("2024-05-01")), Some(1));
    }

    #[test]
    fn only_ascii_digits_are_counted() {
        assert_eq!(parse_count("\u{0663} contributions"), 1);
        assert_eq!(parse_count("1,234 contributions"), 234);
    }
}
