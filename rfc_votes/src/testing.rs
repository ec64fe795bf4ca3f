// In-memory wikis for the tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::json;
use serde_json::Value as JSValue;

use crate::api::{WikiApi, WikiApiFactory};
use crate::config::*;

pub(crate) type CallParams = HashMap<String, String>;

type Responder = Box<dyn Fn(&CallParams) -> WikiResult<JSValue>>;

/// A wiki answering with a closure, which records every call made to it.
pub(crate) struct ScriptedApi {
    endpoint: String,
    responder: Responder,
    calls: RefCell<Vec<CallParams>>,
}

impl ScriptedApi {
    pub(crate) fn new(
        endpoint: &str,
        responder: impl Fn(&CallParams) -> WikiResult<JSValue> + 'static,
    ) -> ScriptedApi {
        ScriptedApi {
            endpoint: endpoint.to_string(),
            responder: Box::new(responder),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<CallParams> {
        self.calls.borrow().clone()
    }

    /// The calls that asked for information about the given user.
    pub(crate) fn calls_about(&self, username: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.get("ususers").map(|s| s.as_str()) == Some(username))
            .count()
    }
}

impl WikiApi for ScriptedApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn call(&self, params: &[(&str, String)]) -> WikiResult<JSValue> {
        let p: CallParams = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        self.calls.borrow_mut().push(p.clone());
        (self.responder)(&p)
    }
}

struct SharedApi(Rc<ScriptedApi>);

impl WikiApi for SharedApi {
    fn endpoint(&self) -> &str {
        self.0.endpoint()
    }

    fn call(&self, params: &[(&str, String)]) -> WikiResult<JSValue> {
        self.0.call(params)
    }
}

/// A federation of scripted wikis, keyed by base URL. Unknown URLs fail to open.
#[derive(Default)]
pub(crate) struct ScriptedFactory {
    wikis: HashMap<String, Rc<ScriptedApi>>,
    opened: RefCell<Vec<String>>,
}

impl ScriptedFactory {
    pub(crate) fn with(
        mut self,
        base_url: &str,
        responder: impl Fn(&CallParams) -> WikiResult<JSValue> + 'static,
    ) -> ScriptedFactory {
        let api = ScriptedApi::new(&format!("{}/w/api.php", base_url), responder);
        self.wikis.insert(base_url.to_string(), Rc::new(api));
        self
    }

    pub(crate) fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.wikis.values().map(|w| w.calls().len()).sum()
    }
}

impl WikiApiFactory for ScriptedFactory {
    fn open(&self, base_url: &str) -> WikiResult<Box<dyn WikiApi>> {
        self.opened.borrow_mut().push(base_url.to_string());
        match self.wikis.get(base_url) {
            Some(api) => Ok(Box::new(SharedApi(api.clone()))),
            None => TransportSnafu {
                endpoint: base_url,
                message: "connection refused",
            }
            .fail(),
        }
    }
}

// ******** Canned responses *********

pub(crate) fn section_response(title: &str, text: &str) -> JSValue {
    json!({"batchcomplete": true, "query": {"pages": [{
        "pageid": 1,
        "ns": 4,
        "title": title,
        "revisions": [{"slots": {"main": {"contentmodel": "wikitext", "content": text}}}]
    }]}})
}

pub(crate) fn user_entry(name: &str, edit_count: u64, groups: &[&str]) -> JSValue {
    json!({
        "userid": 7,
        "name": name,
        "editcount": edit_count,
        "registration": "2010-05-01T12:00:00Z",
        "groups": groups,
    })
}

pub(crate) fn contribs(first_edit: Option<&str>) -> JSValue {
    match first_edit {
        Some(ts) => json!([{"timestamp": ts}]),
        None => json!([]),
    }
}

/// The answer to the batched profile call on the voter's wiki.
pub(crate) fn profile_response(
    name: &str,
    edit_count: u64,
    groups: &[&str],
    first_edit: Option<&str>,
    global_info: JSValue,
) -> JSValue {
    json!({"batchcomplete": true, "query": {
        "users": [user_entry(name, edit_count, groups)],
        "usercontribs": contribs(first_edit),
        "globaluserinfo": global_info,
    }})
}

/// The answer to the profile call on a member wiki.
pub(crate) fn member_response(
    name: &str,
    edit_count: u64,
    groups: &[&str],
    first_edit: Option<&str>,
) -> JSValue {
    json!({"batchcomplete": true, "query": {
        "users": [user_entry(name, edit_count, groups)],
        "usercontribs": contribs(first_edit),
    }})
}

pub(crate) fn global_info(home: &str, merged: &[(&str, &str)], edit_count: Option<u64>) -> JSValue {
    let merged: Vec<JSValue> = merged
        .iter()
        .map(|(wiki, url)| json!({"wiki": wiki, "url": url, "method": "login"}))
        .collect();
    let mut js = json!({"home": home, "id": 99, "merged": merged});
    if let Some(c) = edit_count {
        js["editcount"] = json!(c);
    }
    js
}

pub(crate) fn not_global() -> JSValue {
    json!({"missing": true})
}

/// Shows the logs of the crate in the output of the failing tests.
pub(crate) fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}
