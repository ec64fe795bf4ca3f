//! Inactivity before a vote.
//!
//! The gap is the number of whole months between the last contribution made
//! before the vote and the vote itself. Contributions to the RFC page are not
//! activity: a voter typically edits it only to vote.

use chrono::{Datelike, Timelike};
use log::{debug, warn};

use crate::api::*;
use crate::config::*;

// Enough to step over a few edits to the RFC page.
const GAP_SCAN_LIMIT: u32 = 50;

/// Calendar months from `earlier` to `later`, rounded down. Zero if `later`
/// is not after `earlier`.
pub fn months_between(earlier: &Timestamp, later: &Timestamp) -> u32 {
    let mut months = (later.year() - earlier.year()) * 12 + later.month() as i32
        - earlier.month() as i32;
    let later_in_month = (later.day(), later.num_seconds_from_midnight());
    let earlier_in_month = (earlier.day(), earlier.num_seconds_from_midnight());
    if later_in_month < earlier_in_month {
        months -= 1;
    }
    months.max(0) as u32
}

/// The latest contribution of the user strictly before `before`, ignoring
/// contributions to the page titled `excluded_title`.
///
/// Follows the continuation of the contribution list until such a
/// contribution turns up or the history of the user ends.
pub fn last_activity_before(
    api: &dyn WikiApi,
    username: &str,
    before: &Timestamp,
    excluded_title: &str,
) -> WikiResult<Option<Timestamp>> {
    let endpoint = api.endpoint();
    let base_params = [
        ("action", "query".to_string()),
        ("list", "usercontribs".to_string()),
        ("ucuser", username.to_string()),
        ("ucstart", format_api_timestamp(before)),
        ("ucdir", "older".to_string()),
        ("uclimit", GAP_SCAN_LIMIT.to_string()),
        ("ucprop", "title|timestamp".to_string()),
    ];
    let mut continuation: Vec<(String, String)> = Vec::new();
    let mut pages = 0;
    loop {
        let mut params: Vec<(&str, String)> = base_params.to_vec();
        params.extend(continuation.iter().map(|(k, v)| (k.as_str(), v.clone())));
        let js = api.call(&params)?;
        pages += 1;
        let q = query(endpoint, &js)?;
        for contrib in array(endpoint, q, "usercontribs")?.iter() {
            if contrib.get("title").and_then(|t| t.as_str()) == Some(excluded_title) {
                continue;
            }
            let ts = parse_api_timestamp(endpoint, string(endpoint, contrib, "timestamp")?)?;
            if ts < *before {
                return Ok(Some(ts));
            }
        }
        continuation = match js.get("continue").and_then(|c| c.as_object()) {
            Some(c) => c
                .iter()
                .map(|(k, v)| {
                    let v = match v.as_str() {
                        Some(s) => s.to_string(),
                        None => v.to_string(),
                    };
                    (k.clone(), v)
                })
                .collect(),
            None => break,
        };
        debug!(
            "last_activity_before: {} on {}: reading page {} of contributions",
            username,
            endpoint,
            pages + 1
        );
    }
    debug!(
        "last_activity_before: no activity for {} on {} before {}",
        username, endpoint, before
    );
    Ok(None)
}

/// Months of inactivity on the voter's wiki before the vote.
pub fn local_gap(
    api: &dyn WikiApi,
    user: &User,
    cast_at: &Timestamp,
    page_title: &str,
) -> WikiResult<Option<u32>> {
    let last = last_activity_before(api, &user.username, cast_at, page_title)?;
    Ok(last.map(|ts| months_between(&ts, cast_at)))
}

/// Months of inactivity on every member wiki before the vote. The latest
/// activity anywhere counts. Member wikis that fail are skipped and returned.
pub fn global_gap(
    factory: &dyn WikiApiFactory,
    identity: &GlobalIdentity,
    cast_at: &Timestamp,
    page_title: &str,
) -> (Option<u32>, Vec<MemberFailure>) {
    let mut failures: Vec<MemberFailure> = Vec::new();
    let latest = identity
        .member_wikis
        .iter()
        .filter_map(|member| {
            let res = factory.open(&member.url).and_then(|api| {
                last_activity_before(api.as_ref(), &identity.username, cast_at, page_title)
            });
            match res {
                Ok(ts) => ts,
                Err(e) => {
                    warn!(
                        "global_gap: skipping {} for {}: {}",
                        member.wiki, identity.username, e
                    );
                    failures.push(MemberFailure {
                        wiki: member.wiki.clone(),
                        reason: e.to_string(),
                    });
                    None
                }
            }
        })
        .max();
    (latest.map(|ts| months_between(&ts, cast_at)), failures)
}

/// The gaps of a vote.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct InactivityGaps {
    pub local: Option<u32>,
    pub global: Option<u32>,
    /// Wikis whose contributions could not be read. The local wiki is
    /// identified by its endpoint.
    pub failures: Vec<MemberFailure>,
}

/// Local and global gaps of a resolved voter. Not unified users have the
/// same global gap as their local one.
pub fn inactivity_gaps(
    api: &dyn WikiApi,
    factory: &dyn WikiApiFactory,
    user: &User,
    cast_at: &Timestamp,
    page_title: &str,
) -> InactivityGaps {
    let mut failures: Vec<MemberFailure> = Vec::new();
    let local = match local_gap(api, user, cast_at, page_title) {
        Ok(g) => g,
        Err(e) => {
            warn!("inactivity_gaps: local gap of {}: {}", user.username, e);
            failures.push(MemberFailure {
                wiki: api.endpoint().to_string(),
                reason: e.to_string(),
            });
            None
        }
    };
    let global = match user.global() {
        Some(identity) => {
            let (global, member_failures) = global_gap(factory, identity, cast_at, page_title);
            failures.extend(member_failures);
            // The smaller gap wins: activity anywhere ends global inactivity.
            match (local, global) {
                (Some(l), Some(g)) => Some(l.min(g)),
                (l, g) => l.or(g),
            }
        }
        None => local,
    };
    InactivityGaps {
        local,
        global,
        failures,
    }
}
