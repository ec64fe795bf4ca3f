use std::collections::BTreeSet;

use log::debug;
use serde_json::Value as JSValue;

use crate::config::*;

/// True if the list of attached accounts contains an account on the anchor wiki.
///
/// Attachment to other wikis alone does not count: some accounts were only
/// partially unified.
pub fn is_unified(global_info: &JSValue, anchor_wiki: &str) -> bool {
    match global_info.get("merged") {
        Some(JSValue::Array(accounts)) => accounts
            .iter()
            .any(|a| a.get("wiki").and_then(|w| w.as_str()) == Some(anchor_wiki)),
        _ => false,
    }
}

/// Decides the cross-wiki status of an account from its `globaluserinfo` payload.
///
/// This does not call any wiki. The activity of a unified identity is still
/// to be aggregated.
pub fn resolve_identity(
    username: &str,
    global_info: &JSValue,
    anchor_wiki: &str,
) -> WikiResult<GlobalStatus> {
    if !is_unified(global_info, anchor_wiki) {
        debug!("resolve_identity: {} is not unified", username);
        return Ok(GlobalStatus::NotUnified);
    }

    let mut member_wikis: Vec<MemberWiki> = Vec::new();
    if let Some(JSValue::Array(accounts)) = global_info.get("merged") {
        for account in accounts.iter() {
            let wiki = account.get("wiki").and_then(|w| w.as_str());
            let url = account.get("url").and_then(|u| u.as_str());
            match (wiki, url) {
                (Some(wiki), Some(url)) => member_wikis.push(MemberWiki {
                    wiki: wiki.to_string(),
                    url: url.trim_end_matches('/').to_string(),
                }),
                _ => {
                    return MalformedResponseSnafu {
                        endpoint: "globaluserinfo",
                        what: format!("wiki or url in {}", account),
                    }
                    .fail()
                }
            }
        }
    }

    let reported = global_info.get("editcount").and_then(|c| c.as_u64());
    let identity = GlobalIdentity {
        username: username.to_string(),
        home_wiki: global_info
            .get("home")
            .and_then(|h| h.as_str())
            .map(|h| h.to_string()),
        member_wikis,
        global_edit_count: reported.unwrap_or(0),
        edit_count_reported: reported.is_some(),
        groups: BTreeSet::new(),
        first_edit: None,
        warnings: Vec::new(),
    };
    debug!(
        "resolve_identity: {} is unified, home {:?}, {} member wikis",
        username,
        identity.home_wiki,
        identity.member_wikis.len()
    );
    Ok(GlobalStatus::Unified(identity))
}
