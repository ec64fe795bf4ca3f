// ********* Extraction results ***********

use std::collections::BTreeSet;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use snafu::Snafu;

use crate::wikitext::strip_tags;

/// All the timestamps handled by this crate are in UTC, which is what
/// both the API and the default signature format use.
pub type Timestamp = DateTime<Utc>;

/// The reason a field could not be read out of a vote line.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum MissingReason {
    /// The line does not contain a link to a user page or a user talk page.
    NoUserLink,
    /// No part of the line matches the signature date pattern.
    NoDateMatch,
    /// The date pattern matched this text, but the date format could not parse it.
    UnparsableDate(String),
}

impl Display for MissingReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingReason::NoUserLink => write!(f, "no user link"),
            MissingReason::NoDateMatch => write!(f, "no signature date"),
            MissingReason::UnparsableDate(s) => write!(f, "unparsable date {:?}", s),
        }
    }
}

/// The outcome of a best-effort extraction: either the value, or why it is missing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Extracted<T> {
    Found(T),
    Missing(MissingReason),
}

impl<T> Extracted<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Extracted::Found(x) => Some(x),
            Extracted::Missing(_) => None,
        }
    }

    pub fn missing_reason(&self) -> Option<&MissingReason> {
        match self {
            Extracted::Found(_) => None,
            Extracted::Missing(r) => Some(r),
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Extracted::Found(_))
    }
}

// ********* Voter profiles ***********

/// A wiki where a unified identity holds an attached local account.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MemberWiki {
    /// Database name, e.g. `enwiki` or `commonswiki`.
    pub wiki: String,
    /// Scheme and domain, without a trailing slash.
    pub url: String,
}

/// A member wiki that could not be taken into account during aggregation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MemberFailure {
    pub wiki: String,
    pub reason: String,
}

/// A cross-wiki identity and its activity merged over all the member wikis.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct GlobalIdentity {
    pub username: String,
    /// Database name of the home wiki, if the API designates one.
    pub home_wiki: Option<String>,
    pub member_wikis: Vec<MemberWiki>,
    pub global_edit_count: u64,
    /// True when `global_edit_count` is the total reported by the API.
    /// Per-wiki edit counts are then not added to it.
    pub edit_count_reported: bool,
    /// A union of all the groups held at some member wiki
    pub groups: BTreeSet<String>,
    pub first_edit: Option<Timestamp>,
    /// Member wikis skipped during aggregation. Empty when the figures are complete.
    pub warnings: Vec<MemberFailure>,
}

impl GlobalIdentity {
    pub fn is_admin(&self) -> bool {
        self.groups.contains(ADMIN_GROUP)
    }

    pub fn is_complete(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// The cross-wiki status of a local account.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum GlobalStatus {
    /// The identity payload has not been examined yet.
    Unresolved,
    /// The account is not attached to a unified identity.
    NotUnified,
    Unified(GlobalIdentity),
}

/// The profile of a voter on the wiki hosting the vote.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct User {
    /// Username without the `User:` prefix
    pub username: String,
    /// Endpoint of the wiki this profile was read from.
    pub home_api: String,
    pub edit_count: u64,
    pub groups: BTreeSet<String>,
    /// None if the user never edited on this wiki.
    pub first_edit: Option<Timestamp>,
    /// None for accounts created before registration dates were recorded.
    pub registration: Option<Timestamp>,
    pub global_identity: GlobalStatus,
}

pub const ADMIN_GROUP: &str = "sysop";

impl User {
    pub fn is_admin(&self) -> bool {
        self.groups.contains(ADMIN_GROUP)
    }

    pub fn global(&self) -> Option<&GlobalIdentity> {
        match &self.global_identity {
            GlobalStatus::Unified(g) => Some(g),
            _ => None,
        }
    }

    pub fn global_edit_count(&self) -> Option<u64> {
        self.global().map(|g| g.global_edit_count)
    }

    pub fn home_wiki(&self) -> Option<&str> {
        self.global().and_then(|g| g.home_wiki.as_deref())
    }
}

// ********* Votes ***********

/// What is known about the author of a vote.
#[derive(Debug)]
pub enum Voter {
    /// No username could be extracted, so no lookup was attempted.
    Unknown,
    Resolved(Box<User>),
    /// The username was extracted but its profile could not be loaded.
    LookupFailed(WikiError),
}

/// Data about a single vote
#[derive(Debug)]
pub struct Vote {
    /// One of the section labels
    pub section_label: String,
    /// Full text of the line
    pub raw_text: String,
    pub username: Extracted<String>,
    /// Time of the vote
    pub timestamp: Extracted<Timestamp>,
    pub voter: Voter,
    /// Months spent inactive on the local wiki before the vote (rounded down)
    pub local_gap: Option<u32>,
    /// Months spent inactive everywhere before the vote (rounded down)
    pub global_gap: Option<u32>,
    /// Wikis whose contributions could not be read while computing the gaps.
    /// A gap is only absent for lack of activity when this is empty.
    pub gap_failures: Vec<MemberFailure>,
}

impl Vote {
    pub fn user(&self) -> Option<&User> {
        match &self.voter {
            Voter::Resolved(u) => Some(u.as_ref()),
            _ => None,
        }
    }

    /// The text of the vote without any HTML markup.
    pub fn plain_text(&self) -> String {
        strip_tags(&self.raw_text)
    }
}

// ********* Errors **********

/// Errors raised while talking to a wiki.
///
/// None of these abort a whole run: they are attached to the vote or the
/// member wiki that triggered them.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum WikiError {
    #[snafu(display("Request to {endpoint} failed: {message}"))]
    Transport { endpoint: String, message: String },
    #[snafu(display("{endpoint} returned the API error {code}: {info}"))]
    Api {
        endpoint: String,
        code: String,
        info: String,
    },
    #[snafu(display("User {username} does not exist on {endpoint}"))]
    UserNotFound { username: String, endpoint: String },
    #[snafu(display("Page {page} not found on {endpoint}"))]
    PageNotFound { page: String, endpoint: String },
    #[snafu(display("Section {section} not found in {page}"))]
    SectionNotFound { page: String, section: u32 },
    #[snafu(display("Malformed response from {endpoint}: missing {what}"))]
    MalformedResponse { endpoint: String, what: String },
    #[snafu(display("Invalid settings: {message}"))]
    InvalidSettings { message: String },
}

pub type WikiResult<T> = Result<T, WikiError>;

// ********* Configuration **********

/// How signatures write dates on the wiki.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DateSettings {
    /// chrono format string of the signature date.
    pub format: String,
    /// Regular expression matching the signature date within a line.
    pub pattern: String,
    /// Locale of the month names (e.g. `en_US.utf8`).
    pub locale: String,
    /// The twelve month names of the locale, January first. Only needed when
    /// the locale is not English.
    pub month_names: Option<Vec<String>>,
}

pub const DEFAULT_DATE_FORMAT: &str = "%H:%M, %d %B %Y (UTC)";
pub const DEFAULT_DATE_PATTERN: &str = r"\d{2}:\d{2}, \d{1,2} (January|February|March|April|May|June|July|August|September|October|November|December) \d{4} \(UTC\)";
pub const DEFAULT_DATE_LOCALE: &str = "en_US.utf8";

impl Default for DateSettings {
    fn default() -> Self {
        DateSettings {
            format: DEFAULT_DATE_FORMAT.to_string(),
            pattern: DEFAULT_DATE_PATTERN.to_string(),
            locale: DEFAULT_DATE_LOCALE.to_string(),
            month_names: None,
        }
    }
}

/// Which version of the RFC page to read.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum PageSource {
    /// The current revision of the page with this title.
    Title(String),
    /// A fixed revision id.
    Revision(u64),
}

impl Display for PageSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PageSource::Title(t) => write!(f, "{}", t),
            PageSource::Revision(r) => write!(f, "revision {}", r),
        }
    }
}

/// The wiki database whose presence among the attached accounts marks a
/// unified identity.
pub const DEFAULT_ANCHOR_WIKI: &str = "commonswiki";

/// Everything the pipeline needs to know about the RFC page.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PageSettings {
    pub source: PageSource,
    /// Section labels (used in the output) and the matching section numbers,
    /// in the order they should be processed.
    pub sections: IndexMap<String, u32>,
    pub dates: DateSettings,
    pub anchor_wiki: String,
    /// Compute the inactivity gaps of every voter. This costs one more call
    /// per voter and per member wiki.
    pub inactivity_gaps: bool,
}
