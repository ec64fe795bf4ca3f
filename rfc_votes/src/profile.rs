use std::collections::BTreeSet;

use log::debug;
use serde_json::Value as JSValue;

use crate::api::*;
use crate::config::*;

/// What a single wiki knows about an account.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct LocalAccount {
    pub edit_count: u64,
    pub groups: BTreeSet<String>,
    pub first_edit: Option<Timestamp>,
    pub registration: Option<Timestamp>,
}

/// The result of the profile call on the voter's wiki: the local profile,
/// and the unprocessed cross-wiki payload for the identity resolver.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ProfileData {
    pub user: User,
    pub global_info: JSValue,
}

fn account_params(username: &str) -> Vec<(&'static str, String)> {
    vec![
        ("action", "query".to_string()),
        ("list", "users|usercontribs".to_string()),
        ("ususers", username.to_string()),
        ("usprop", "editcount|groups|registration".to_string()),
        ("ucuser", username.to_string()),
        ("ucdir", "newer".to_string()),
        ("uclimit", "1".to_string()),
        ("ucprop", "timestamp".to_string()),
    ]
}

/// Reads the `users` and `usercontribs` lists of a query response.
pub(crate) fn parse_local_account(
    endpoint: &str,
    q: &JSValue,
    username: &str,
) -> WikiResult<LocalAccount> {
    let local = array(endpoint, q, "users")?
        .first()
        .ok_or_else(|| WikiError::MalformedResponse {
            endpoint: endpoint.to_string(),
            what: "users".to_string(),
        })?;
    if flag(local, "missing") || flag(local, "invalid") {
        return UserNotFoundSnafu { username, endpoint }.fail();
    }

    let edit_count = field(endpoint, local, "editcount")?
        .as_u64()
        .ok_or_else(|| WikiError::MalformedResponse {
            endpoint: endpoint.to_string(),
            what: "editcount (number)".to_string(),
        })?;
    let groups: BTreeSet<String> = match local.get("groups") {
        Some(JSValue::Array(gs)) => gs
            .iter()
            .filter_map(|g| g.as_str())
            .map(|g| g.to_string())
            .collect(),
        _ => BTreeSet::new(),
    };
    // Null for accounts older than registration tracking.
    let registration = match local.get("registration").and_then(|r| r.as_str()) {
        Some(ts) => Some(parse_api_timestamp(endpoint, ts)?),
        None => None,
    };
    // Oldest first, at most one entry. Empty if the user never edited here.
    let first_edit = match array(endpoint, q, "usercontribs")?.first() {
        Some(c) => Some(parse_api_timestamp(endpoint, string(endpoint, c, "timestamp")?)?),
        None => None,
    };

    Ok(LocalAccount {
        edit_count,
        groups,
        first_edit,
        registration,
    })
}

/// Fetches the edit count, groups and first contribution of an account.
pub fn load_local_account(api: &dyn WikiApi, username: &str) -> WikiResult<LocalAccount> {
    let js = api.call(&account_params(username))?;
    parse_local_account(api.endpoint(), query(api.endpoint(), &js)?, username)
}

/// Loads the profile of a voter with a single call, which also returns the
/// cross-wiki identity payload.
///
/// The global identity of the returned user is left unresolved.
pub fn load_profile(api: &dyn WikiApi, username: &str) -> WikiResult<ProfileData> {
    let endpoint = api.endpoint();
    let mut params = account_params(username);
    params.extend([
        ("meta", "globaluserinfo".to_string()),
        ("guiuser", username.to_string()),
        ("guiprop", "editcount|groups|merged".to_string()),
    ]);
    let js = api.call(&params)?;
    let q = query(endpoint, &js)?;
    let local = parse_local_account(endpoint, q, username)?;
    // Some wikis do not run the extension at all.
    let global_info = q.get("globaluserinfo").cloned().unwrap_or(JSValue::Null);
    debug!(
        "load_profile: {} on {}: {:?}",
        username, endpoint, local
    );

    Ok(ProfileData {
        user: User {
            username: username.to_string(),
            home_api: endpoint.to_string(),
            edit_count: local.edit_count,
            groups: local.groups,
            first_edit: local.first_edit,
            registration: local.registration,
            global_identity: GlobalStatus::Unresolved,
        },
        global_info,
    })
}
