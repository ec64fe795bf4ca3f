use std::collections::BTreeSet;

use log::{debug, info, warn};

use crate::api::WikiApiFactory;
use crate::config::*;
use crate::profile::{load_local_account, LocalAccount};

/// Activity merged over any number of wikis.
///
/// `merge` is commutative and associative, so the member wikis can be
/// visited in any order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ActivityTotals {
    pub edit_count: u64,
    pub groups: BTreeSet<String>,
    pub first_edit: Option<Timestamp>,
    /// Number of wikis folded into these totals.
    pub wikis: usize,
}

impl ActivityTotals {
    pub fn merge(mut self, other: ActivityTotals) -> ActivityTotals {
        self.edit_count += other.edit_count;
        self.groups.extend(other.groups);
        self.first_edit = earliest(self.first_edit, other.first_edit);
        self.wikis += other.wikis;
        self
    }
}

impl From<LocalAccount> for ActivityTotals {
    fn from(account: LocalAccount) -> ActivityTotals {
        ActivityTotals {
            edit_count: account.edit_count,
            groups: account.groups,
            first_edit: account.first_edit,
            wikis: 1,
        }
    }
}

/// The earlier of two optional timestamps. A missing timestamp (no
/// contributions) is never the earliest.
pub fn earliest(a: Option<Timestamp>, b: Option<Timestamp>) -> Option<Timestamp> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) => x,
        (None, y) => y,
    }
}

/// Visits every member wiki of the identity once and merges the results
/// into its global figures.
///
/// A member wiki that cannot be queried is skipped and recorded in the
/// warnings of the identity. This never fails.
pub fn aggregate_activity(factory: &dyn WikiApiFactory, identity: &mut GlobalIdentity) {
    let username = identity.username.clone();
    let (totals, failures) = identity.member_wikis.iter().fold(
        (ActivityTotals::default(), Vec::new()),
        |(totals, mut failures), member| match visit_member(factory, member, &username) {
            Ok(activity) => (totals.merge(activity), failures),
            Err(e) => {
                warn!(
                    "aggregate_activity: skipping {} for {}: {}",
                    member.wiki, username, e
                );
                failures.push(MemberFailure {
                    wiki: member.wiki.clone(),
                    reason: e.to_string(),
                });
                (totals, failures)
            }
        },
    );
    info!(
        "aggregate_activity: {}: {} of {} member wikis read",
        username,
        totals.wikis,
        identity.member_wikis.len()
    );
    apply_totals(identity, totals);
    identity.warnings.extend(failures);
}

fn visit_member(
    factory: &dyn WikiApiFactory,
    member: &MemberWiki,
    username: &str,
) -> WikiResult<ActivityTotals> {
    let api = factory.open(&member.url)?;
    let account = load_local_account(api.as_ref(), username)?;
    debug!("visit_member: {} on {}: {:?}", username, member.wiki, account);
    Ok(account.into())
}

/// The reported total takes precedence over the sum of the member wikis.
fn apply_totals(identity: &mut GlobalIdentity, totals: ActivityTotals) {
    if !identity.edit_count_reported {
        identity.global_edit_count += totals.edit_count;
    }
    identity.groups.extend(totals.groups);
    identity.first_edit = earliest(identity.first_edit, totals.first_edit);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::resolve_identity;
    use crate::testing::*;
    use chrono::{TimeZone, Utc};

    fn unified(merged: &[(&str, &str)], reported: Option<u64>) -> GlobalIdentity {
        match resolve_identity(
            "Ann",
            &global_info("enwiki", merged, reported),
            DEFAULT_ANCHOR_WIKI,
        )
        .unwrap()
        {
            GlobalStatus::Unified(g) => g,
            x => panic!("unexpected {:?}", x),
        }
    }

    fn ts(y: i32, m: u32, d: u32) -> Timestamp {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn merge_is_commutative() {
        let a = ActivityTotals {
            edit_count: 3,
            groups: ["sysop".to_string()].into_iter().collect(),
            first_edit: None,
            wikis: 1,
        };
        let b = ActivityTotals {
            edit_count: 5,
            groups: ["bot".to_string()].into_iter().collect(),
            first_edit: Some(ts(2019, 1, 1)),
            wikis: 1,
        };
        let c = ActivityTotals {
            edit_count: 1,
            groups: BTreeSet::new(),
            first_edit: Some(ts(2018, 6, 1)),
            wikis: 1,
        };
        let abc = a.clone().merge(b.clone()).merge(c.clone());
        let cba = c.merge(b.merge(a));
        assert_eq!(abc, cba);
        assert_eq!(abc.edit_count, 9);
        assert_eq!(abc.first_edit, Some(ts(2018, 6, 1)));
        assert_eq!(abc.groups.len(), 2);
        assert_eq!(abc.wikis, 3);
    }

    #[test]
    fn no_contributions_is_no_signal() {
        assert_eq!(earliest(None, Some(ts(2020, 1, 1))), Some(ts(2020, 1, 1)));
        assert_eq!(earliest(Some(ts(2020, 1, 1)), None), Some(ts(2020, 1, 1)));
        assert_eq!(earliest(None, None), None);

        let factory = ScriptedFactory::default()
            .with("https://a.example.org", |_| {
                Ok(member_response("Ann", 0, &[], None))
            })
            .with("https://commons.wikimedia.org", |_| {
                Ok(member_response("Ann", 4, &[], Some("2020-01-01T00:00:00Z")))
            });
        let mut identity = unified(
            &[
                ("awiki", "https://a.example.org"),
                ("commonswiki", "https://commons.wikimedia.org"),
            ],
            None,
        );
        aggregate_activity(&factory, &mut identity);
        assert_eq!(identity.first_edit, Some(ts(2020, 1, 1)));
    }

    #[test]
    fn sums_and_unions() {
        let factory = ScriptedFactory::default()
            .with("https://en.wikipedia.org", |_| {
                Ok(member_response(
                    "Ann",
                    100,
                    &["autoconfirmed"],
                    Some("2012-03-01T10:00:00Z"),
                ))
            })
            .with("https://de.wikipedia.org", |_| {
                Ok(member_response(
                    "Ann",
                    20,
                    &["sysop"],
                    Some("2009-07-04T08:00:00Z"),
                ))
            })
            .with("https://commons.wikimedia.org", |_| {
                Ok(member_response("Ann", 3, &[], Some("2015-01-01T00:00:00Z")))
            });
        let mut identity = unified(
            &[
                ("enwiki", "https://en.wikipedia.org"),
                ("dewiki", "https://de.wikipedia.org"),
                ("commonswiki", "https://commons.wikimedia.org"),
            ],
            None,
        );
        aggregate_activity(&factory, &mut identity);
        assert_eq!(identity.global_edit_count, 123);
        // An admin anywhere is an admin globally.
        assert!(identity.is_admin());
        assert!(identity.groups.contains("autoconfirmed"));
        assert_eq!(
            identity.first_edit,
            Some(Utc.with_ymd_and_hms(2009, 7, 4, 8, 0, 0).unwrap())
        );
        assert!(identity.is_complete());
        // Each member wiki exactly once.
        let mut opened = factory.opened();
        opened.sort();
        assert_eq!(
            opened,
            vec![
                "https://commons.wikimedia.org",
                "https://de.wikipedia.org",
                "https://en.wikipedia.org",
            ]
        );
        assert_eq!(factory.total_calls(), 3);
    }

    #[test]
    fn reported_count_wins() {
        let factory = ScriptedFactory::default().with("https://commons.wikimedia.org", |_| {
            Ok(member_response("Ann", 3, &[], None))
        });
        let mut identity = unified(
            &[("commonswiki", "https://commons.wikimedia.org")],
            Some(5000),
        );
        aggregate_activity(&factory, &mut identity);
        assert_eq!(identity.global_edit_count, 5000);
    }

    #[test]
    fn partial_failure() {
        let factory = ScriptedFactory::default()
            .with("https://one.example.org", |_| {
                Ok(member_response("Ann", 10, &["sysop"], Some("2016-01-01T00:00:00Z")))
            })
            .with("https://two.example.org", |_| {
                TransportSnafu {
                    endpoint: "https://two.example.org/w/api.php",
                    message: "timed out",
                }
                .fail()
            })
            .with("https://commons.wikimedia.org", |_| {
                Ok(member_response("Ann", 5, &[], Some("2014-01-01T00:00:00Z")))
            });
        let mut identity = unified(
            &[
                ("onewiki", "https://one.example.org"),
                ("twowiki", "https://two.example.org"),
                ("commonswiki", "https://commons.wikimedia.org"),
            ],
            None,
        );
        aggregate_activity(&factory, &mut identity);
        assert_eq!(identity.global_edit_count, 15);
        assert!(identity.is_admin());
        assert_eq!(identity.first_edit, Some(ts(2014, 1, 1)));
        assert_eq!(identity.warnings.len(), 1);
        assert_eq!(identity.warnings[0].wiki, "twowiki");
        assert!(identity.warnings[0].reason.contains("timed out"));
    }

    #[test]
    fn unreachable_and_missing_accounts() {
        // The first wiki is not in the federation at all, the second does not know the user.
        let factory = ScriptedFactory::default()
            .with("https://gone.example.org", |_| {
                Ok(serde_json::json!({"query": {
                    "users": [{"name": "Ann", "missing": true}],
                    "usercontribs": []
                }}))
            })
            .with("https://commons.wikimedia.org", |_| {
                Ok(member_response("Ann", 1, &[], None))
            });
        let mut identity = unified(
            &[
                ("closedwiki", "https://closed.example.org"),
                ("gonewiki", "https://gone.example.org"),
                ("commonswiki", "https://commons.wikimedia.org"),
            ],
            None,
        );
        aggregate_activity(&factory, &mut identity);
        assert_eq!(identity.global_edit_count, 1);
        let skipped: Vec<&str> = identity.warnings.iter().map(|w| w.wiki.as_str()).collect();
        assert_eq!(skipped, vec!["closedwiki", "gonewiki"]);
    }
}
