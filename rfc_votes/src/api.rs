// The boundary with the remote wikis.

use chrono::{DateTime, Utc};
use log::debug;
use serde_json::Value as JSValue;

use crate::config::*;

/// A client to the `api.php` endpoint of a single wiki.
///
/// Implementations add the transport-level parameters (response format, etc.)
/// and turn API-level error objects into `WikiError::Api`.
pub trait WikiApi {
    /// The URL of the endpoint, for error messages and user profiles.
    fn endpoint(&self) -> &str;

    /// Makes a call to the API, with the documented API parameters:
    /// `[("action", "query".to_string()), ("list", "users".to_string()), ...]`
    fn call(&self, params: &[(&str, String)]) -> WikiResult<JSValue>;
}

/// Opens clients for the member wikis of a unified identity.
pub trait WikiApiFactory {
    /// `base_url` is scheme and domain without a trailing slash, as reported
    /// in the list of attached accounts.
    fn open(&self, base_url: &str) -> WikiResult<Box<dyn WikiApi>>;
}

/// The `query` object of a response.
pub(crate) fn query<'a>(endpoint: &str, js: &'a JSValue) -> WikiResult<&'a JSValue> {
    field(endpoint, js, "query")
}

pub(crate) fn field<'a>(endpoint: &str, js: &'a JSValue, key: &str) -> WikiResult<&'a JSValue> {
    match js.get(key) {
        Some(x) if !x.is_null() => Ok(x),
        _ => MalformedResponseSnafu {
            endpoint,
            what: key.to_string(),
        }
        .fail(),
    }
}

pub(crate) fn array<'a>(endpoint: &str, js: &'a JSValue, key: &str) -> WikiResult<&'a Vec<JSValue>> {
    match field(endpoint, js, key)? {
        JSValue::Array(xs) => Ok(xs),
        _ => MalformedResponseSnafu {
            endpoint,
            what: format!("{} (list)", key),
        }
        .fail(),
    }
}

pub(crate) fn string<'a>(endpoint: &str, js: &'a JSValue, key: &str) -> WikiResult<&'a str> {
    field(endpoint, js, key)?
        .as_str()
        .ok_or_else(|| WikiError::MalformedResponse {
            endpoint: endpoint.to_string(),
            what: format!("{} (string)", key),
        })
}

/// The API flags booleans by the presence of the key (`"missing": ""` in the
/// first response format, `"missing": true` in the second).
pub(crate) fn flag(js: &JSValue, key: &str) -> bool {
    match js.get(key) {
        None | Some(JSValue::Null) | Some(JSValue::Bool(false)) => false,
        Some(_) => true,
    }
}

/// Parses the timestamps used by the API: `2020-01-01T10:00:00Z`
pub fn parse_api_timestamp(endpoint: &str, s: &str) -> WikiResult<Timestamp> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| WikiError::MalformedResponse {
            endpoint: endpoint.to_string(),
            what: format!("valid timestamp (got {:?})", s),
        })
}

pub fn format_api_timestamp(ts: &Timestamp) -> String {
    ts.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// The wikitext of one section of the page, with the title of the page it belongs to.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SectionText {
    pub title: String,
    pub text: String,
}

/// Returns the text of the given section, from the current revision of a page
/// or from a fixed revision.
pub fn get_section_text(
    api: &dyn WikiApi,
    source: &PageSource,
    section: u32,
) -> WikiResult<SectionText> {
    let endpoint = api.endpoint();
    let mut params: Vec<(&str, String)> = vec![
        ("action", "query".to_string()),
        ("prop", "revisions".to_string()),
        ("rvsection", section.to_string()),
        ("rvprop", "content".to_string()),
        ("rvslots", "main".to_string()),
    ];
    match source {
        PageSource::Revision(rev) => params.push(("revids", rev.to_string())),
        PageSource::Title(title) => params.push(("titles", title.clone())),
    }
    debug!("get_section_text: {} section {}", source, section);

    let js = match api.call(&params) {
        Err(WikiError::Api { code, .. }) if code == "rvnosuchsection" => {
            return SectionNotFoundSnafu {
                page: source.to_string(),
                section,
            }
            .fail()
        }
        x => x?,
    };
    let q = query(endpoint, &js)?;
    if q.get("badrevids").is_some() {
        return PageNotFoundSnafu {
            page: source.to_string(),
            endpoint,
        }
        .fail();
    }

    // An array in the second response format, an object keyed by page id in the first.
    let pages: Vec<&JSValue> = match field(endpoint, q, "pages")? {
        JSValue::Array(xs) => xs.iter().collect(),
        JSValue::Object(m) => m.values().collect(),
        _ => {
            return MalformedResponseSnafu {
                endpoint,
                what: "pages",
            }
            .fail()
        }
    };
    let page = match pages.first() {
        Some(p) if !flag(p, "missing") && !flag(p, "invalid") => *p,
        _ => {
            return PageNotFoundSnafu {
                page: source.to_string(),
                endpoint,
            }
            .fail()
        }
    };
    let title = string(endpoint, page, "title")?.to_string();
    let revision = array(endpoint, page, "revisions")?
        .first()
        .ok_or_else(|| WikiError::MalformedResponse {
            endpoint: endpoint.to_string(),
            what: "revisions".to_string(),
        })?;
    let content = revision
        .pointer("/slots/main/content")
        .or_else(|| revision.pointer("/slots/main/*"))
        .or_else(|| revision.get("content"))
        .or_else(|| revision.get("*"))
        .and_then(|c| c.as_str())
        .ok_or_else(|| WikiError::MalformedResponse {
            endpoint: endpoint.to_string(),
            what: "revision content".to_string(),
        })?;
    Ok(SectionText {
        title,
        text: content.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn api_timestamps() {
        let ts = parse_api_timestamp("x", "2020-01-01T10:00:00Z").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2020, 1, 1, 10, 0, 0).unwrap());
        assert_eq!(format_api_timestamp(&ts), "2020-01-01T10:00:00Z");
        assert!(parse_api_timestamp("x", "yesterday").is_err());
    }

    #[test]
    fn section_text_by_title() {
        let api = ScriptedApi::new("https://example.com/w/api.php", |_| {
            Ok(section_response("Project:RFC", "# Support [[User:Ann]]"))
        });
        let s = get_section_text(&api, &PageSource::Title("Project:RFC".to_string()), 2).unwrap();
        assert_eq!(s.title, "Project:RFC");
        assert_eq!(s.text, "# Support [[User:Ann]]");
        let calls = api.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].get("titles").map(|s| s.as_str()), Some("Project:RFC"));
        assert_eq!(calls[0].get("rvsection").map(|s| s.as_str()), Some("2"));
        assert!(calls[0].get("revids").is_none());
    }

    #[test]
    fn section_text_first_format() {
        let api = ScriptedApi::new("https://example.com/w/api.php", |_| {
            Ok(json!({"query": {"pages": {"12": {
                "title": "Project:RFC",
                "revisions": [{"*": "# Oppose"}]
            }}}}))
        });
        let s = get_section_text(&api, &PageSource::Revision(42), 1).unwrap();
        assert_eq!(s.text, "# Oppose");
        assert_eq!(
            api.calls()[0].get("revids").map(|s| s.as_str()),
            Some("42")
        );
    }

    #[test]
    fn missing_page() {
        let api = ScriptedApi::new("https://example.com/w/api.php", |_| {
            Ok(json!({"query": {"pages": [{"title": "Nope", "missing": true}]}}))
        });
        let res = get_section_text(&api, &PageSource::Title("Nope".to_string()), 1);
        assert!(matches!(res, Err(WikiError::PageNotFound { .. })));
    }

    #[test]
    fn missing_section() {
        let api = ScriptedApi::new("https://example.com/w/api.php", |_| {
            ApiSnafu {
                endpoint: "https://example.com/w/api.php",
                code: "rvnosuchsection",
                info: "There is no section 9.",
            }
            .fail()
        });
        let res = get_section_text(&api, &PageSource::Title("Project:RFC".to_string()), 9);
        assert!(matches!(
            res,
            Err(WikiError::SectionNotFound { section: 9, .. })
        ));
    }

    #[test]
    fn malformed_response() {
        let api = ScriptedApi::new("https://example.com/w/api.php", |_| Ok(json!({"batchcomplete": true})));
        let res = get_section_text(&api, &PageSource::Title("Project:RFC".to_string()), 1);
        assert!(matches!(res, Err(WikiError::MalformedResponse { .. })));
    }
}
