//! Reading votes out of the wikitext of a section.
//!
//! Assumptions:
//! * every vote starts with `#` (numbered list item). Other lines, including
//!   those starting with `##`, `#:` or `#*`, are replies or comments.
//! * the first user page or user talk page link in the line is that of the voter.
//!   This fails when a voter links to somebody else before signing.
//! * the first date string in the line is the time of the vote.

use std::sync::LazyLock;

use chrono::{NaiveDateTime, TimeZone, Utc};
use log::{debug, warn};
use regex::Regex;

use crate::config::*;

static VOTE_LINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#[^#*:]").unwrap());

static USER_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[\s*(?i:User(?:[ _]talk)?)\s*:\s*([^|\]#/]+)").unwrap()
});

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<.*?>").unwrap());

const ENGLISH_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// True for top-level numbered list items.
pub fn is_vote_line(line: &str) -> bool {
    VOTE_LINE_RE.is_match(line)
}

/// Iterates through a set of lines and only returns those which seem to be votes.
pub fn filter_vote_lines<'a, I>(lines: I) -> impl Iterator<Item = &'a str> + Clone
where
    I: IntoIterator<Item = &'a str>,
    I::IntoIter: Clone,
{
    lines.into_iter().filter(|line| is_vote_line(line))
}

/// The name in the first user (talk) page link of the line.
pub fn extract_username(line: &str) -> Extracted<String> {
    match USER_LINK_RE.captures(line).and_then(|c| c.get(1)) {
        Some(m) => {
            let name = m.as_str().replace('_', " ").trim().to_string();
            if name.is_empty() {
                Extracted::Missing(MissingReason::NoUserLink)
            } else {
                Extracted::Found(name)
            }
        }
        None => Extracted::Missing(MissingReason::NoUserLink),
    }
}

/// Removes HTML-like tags.
pub fn strip_tags(text: &str) -> String {
    TAG_RE.replace_all(text, "").to_string()
}

/// The compiled form of `DateSettings`.
#[derive(Debug, Clone)]
pub struct DatePattern {
    regex: Regex,
    format: String,
    // Localized month name -> English month name, longest names first.
    months: Vec<(String, &'static str)>,
}

impl DatePattern {
    pub fn new(settings: &DateSettings) -> WikiResult<DatePattern> {
        let regex = Regex::new(&settings.pattern).map_err(|e| WikiError::InvalidSettings {
            message: format!("date pattern {:?}: {}", settings.pattern, e),
        })?;
        let mut months: Vec<(String, &'static str)> = match &settings.month_names {
            Some(names) if names.len() == 12 => names
                .iter()
                .cloned()
                .zip(ENGLISH_MONTHS.iter().copied())
                .collect(),
            Some(names) => {
                return InvalidSettingsSnafu {
                    message: format!("expected 12 month names, got {}", names.len()),
                }
                .fail()
            }
            None => {
                if !settings.locale.to_lowercase().starts_with("en") {
                    warn!(
                        "Date locale {} has no month names configured, English names will be expected",
                        settings.locale
                    );
                }
                vec![]
            }
        };
        months.sort_by_key(|(name, _)| std::cmp::Reverse(name.chars().count()));
        Ok(DatePattern {
            regex,
            format: settings.format.clone(),
            months,
        })
    }

    /// Finds and parses the first signature date in the line.
    pub fn extract(&self, line: &str) -> Extracted<Timestamp> {
        let text = match self.regex.find(line) {
            Some(m) => m.as_str(),
            None => return Extracted::Missing(MissingReason::NoDateMatch),
        };
        let english = self.to_english(text);
        match NaiveDateTime::parse_from_str(&english, &self.format) {
            Ok(naive) => Extracted::Found(Utc.from_utc_datetime(&naive)),
            Err(e) => {
                debug!("extract: could not parse {:?}: {}", text, e);
                Extracted::Missing(MissingReason::UnparsableDate(text.to_string()))
            }
        }
    }

    fn to_english(&self, text: &str) -> String {
        // Only one month name appears in a date.
        for (local, english) in self.months.iter() {
            if text.contains(local.as_str()) {
                return text.replacen(local.as_str(), english, 1);
            }
        }
        text.to_string()
    }
}

/// Creates a Vote from a line of text (which should contain a signature).
///
/// There is no check that the line is a vote, and nothing fails: the fields
/// that cannot be extracted record the reason instead. The voter is not
/// looked up.
pub fn parse_vote(line: &str, section_label: &str, dates: &DatePattern) -> Vote {
    let vote = Vote {
        section_label: section_label.to_string(),
        raw_text: line.to_string(),
        username: extract_username(line),
        timestamp: dates.extract(line),
        voter: Voter::Unknown,
        local_gap: None,
        global_gap: None,
        gap_failures: Vec::new(),
    };
    debug!(
        "parse_vote: {:?} -> {:?} {:?}",
        line, vote.username, vote.timestamp
    );
    vote
}
