// HTTP clients for the api.php endpoints of the wikis.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::stats::{HttpClientSnafu, RfcResult};
use rfc_votes::*;

/// Wikimedia asks API clients to identify themselves.
pub const USER_AGENT: &str = concat!(
    "rfcstats/",
    env!("CARGO_PKG_VERSION"),
    " (MediaWiki RFC participant statistics)"
);

const TIMEOUT_SECS: u64 = 60;

/// Shared connection pool. One `HttpApi` is opened per wiki.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new() -> RfcResult<HttpClient> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .context(HttpClientSnafu {})?;
        Ok(HttpClient { client })
    }

    /// The wiki at this domain name, e.g. `en.wikipedia.org`.
    pub fn from_domain(&self, domain: &str) -> HttpApi {
        let domain = domain
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        self.from_globaluserinfo_url(&format!("https://{}", domain))
    }

    /// The wiki at this base URL, as listed in the attached accounts of a
    /// global user: `https://de.wikipedia.org`
    pub fn from_globaluserinfo_url(&self, url: &str) -> HttpApi {
        let url = url.trim().trim_end_matches('/');
        let base = if let Some(rest) = url.strip_prefix("//") {
            format!("https://{}", rest)
        } else {
            url.to_string()
        };
        HttpApi {
            client: self.client.clone(),
            endpoint: format!("{}/w/api.php", base),
        }
    }
}

impl WikiApiFactory for HttpClient {
    fn open(&self, base_url: &str) -> WikiResult<Box<dyn WikiApi>> {
        Ok(Box::new(self.from_globaluserinfo_url(base_url)))
    }
}

pub struct HttpApi {
    client: Client,
    endpoint: String,
}

impl HttpApi {
    fn transport_error(&self, e: reqwest::Error) -> WikiError {
        WikiError::Transport {
            endpoint: self.endpoint.clone(),
            message: e.to_string(),
        }
    }
}

impl WikiApi for HttpApi {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn call(&self, params: &[(&str, String)]) -> WikiResult<JSValue> {
        let mut all_params: Vec<(&str, String)> = params.to_vec();
        all_params.push(("format", "json".to_string()));
        all_params.push(("formatversion", "2".to_string()));
        debug!("call: {} {:?}", self.endpoint, params);

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&all_params)
            .send()
            .map_err(|e| self.transport_error(e))?;
        let status = resp.status();
        if !status.is_success() {
            return TransportSnafu {
                endpoint: self.endpoint.clone(),
                message: format!("HTTP status {}", status),
            }
            .fail();
        }
        let js: JSValue = resp.json().map_err(|e| self.transport_error(e))?;
        check_response(&self.endpoint, js)
    }
}

/// Turns the error object of a response into an error.
fn check_response(endpoint: &str, js: JSValue) -> WikiResult<JSValue> {
    if let Some(err) = js.get("error") {
        let code = err.get("code").and_then(|c| c.as_str()).unwrap_or("unknown");
        let info = err.get("info").and_then(|c| c.as_str()).unwrap_or("");
        return ApiSnafu {
            endpoint,
            code,
            info,
        }
        .fail();
    }
    if let Some(w) = js.get("warnings") {
        debug!("warnings from {}: {}", endpoint, w);
    }
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn endpoints() {
        let client = HttpClient::new().unwrap();
        assert_eq!(
            client.from_domain("en.wikipedia.org").endpoint(),
            "https://en.wikipedia.org/w/api.php"
        );
        assert_eq!(
            client.from_domain("https://meta.wikimedia.org/").endpoint(),
            "https://meta.wikimedia.org/w/api.php"
        );
        assert_eq!(
            client
                .from_globaluserinfo_url("https://commons.wikimedia.org")
                .endpoint(),
            "https://commons.wikimedia.org/w/api.php"
        );
        assert_eq!(
            client
                .from_globaluserinfo_url("//de.wikipedia.org")
                .endpoint(),
            "https://de.wikipedia.org/w/api.php"
        );
        let opened = client.open("https://fr.wikipedia.org").unwrap();
        assert_eq!(opened.endpoint(), "https://fr.wikipedia.org/w/api.php");
    }

    #[test]
    fn api_errors() {
        let res = check_response(
            "https://en.wikipedia.org/w/api.php",
            json!({"error": {"code": "rvnosuchsection", "info": "There is no section 9."}}),
        );
        match res {
            Err(WikiError::Api { code, info, .. }) => {
                assert_eq!(code, "rvnosuchsection");
                assert_eq!(info, "There is no section 9.");
            }
            x => panic!("unexpected {:?}", x),
        }

        let ok = check_response(
            "https://en.wikipedia.org/w/api.php",
            json!({"warnings": {"main": {"warnings": "Unrecognized parameter"}}, "query": {}}),
        )
        .unwrap();
        assert!(ok.get("query").is_some());
    }
}
