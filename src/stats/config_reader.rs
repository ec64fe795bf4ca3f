use std::fs;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

use crate::args::Args;
use crate::stats::*;
use rfc_votes::builder::Builder;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RfcConfig {
    /// Domain name of the wiki.
    pub wiki: String,
    /// Page which contains the RFC.
    pub page: Option<String>,
    /// Which revision of the page to use (None means current)
    pub revision: Option<u64>,
    /// Section labels and numbers, as numbers or strings.
    pub sections: IndexMap<String, JSValue>,
    #[serde(rename = "dateFormat")]
    pub date_format: Option<String>,
    #[serde(rename = "dateRegexp")]
    pub date_regexp: Option<String>,
    #[serde(rename = "dateLocale")]
    pub date_locale: Option<String>,
    #[serde(rename = "monthNames")]
    pub month_names: Option<Vec<String>>,
    #[serde(rename = "anchorWiki")]
    pub anchor_wiki: Option<String>,
    #[serde(rename = "inactivityGaps")]
    pub inactivity_gaps: Option<bool>,
}

impl RfcConfig {
    /// The command line takes precedence over the file.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(w) = &args.wiki {
            self.wiki = w.clone();
        }
        if let Some(p) = &args.page {
            self.page = Some(p.clone());
            // A page given on the command line is meant to be read in its current state.
            if args.revision.is_none() {
                self.revision = None;
            }
        }
        if args.revision.is_some() {
            self.revision = args.revision;
        }
        if args.gaps {
            self.inactivity_gaps = Some(true);
        }
    }

    pub fn page_source(&self) -> RfcResult<PageSource> {
        match (&self.revision, &self.page) {
            (Some(rev), _) => Ok(PageSource::Revision(*rev)),
            (None, Some(page)) if !page.trim().is_empty() => Ok(PageSource::Title(page.clone())),
            _ => whatever!("Either a page or a revision is required"),
        }
    }

    pub fn date_settings(&self) -> DateSettings {
        let default = DateSettings::default();
        DateSettings {
            format: self.date_format.clone().unwrap_or(default.format),
            pattern: self.date_regexp.clone().unwrap_or(default.pattern),
            locale: self.date_locale.clone().unwrap_or(default.locale),
            month_names: self.month_names.clone(),
        }
    }

    pub fn page_settings(&self) -> RfcResult<PageSettings> {
        ensure_whatever!(!self.wiki.trim().is_empty(), "The wiki is required");
        let sections = self
            .sections
            .iter()
            .map(|(label, id)| -> RfcResult<(String, u32)> {
                Ok((label.clone(), read_js_int(id)?))
            })
            .collect::<RfcResult<IndexMap<String, u32>>>()?;
        let mut builder = Builder::new(self.page_source()?)
            .sections(&sections)
            .context(SettingsSnafu {})?
            .dates(self.date_settings())
            .inactivity_gaps(self.inactivity_gaps.unwrap_or(false));
        if let Some(anchor) = &self.anchor_wiki {
            builder = builder.anchor_wiki(anchor);
        }
        builder.build().context(SettingsSnafu {})
    }
}

pub fn read_config(path: &str) -> RfcResult<RfcConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    parse_config(&contents)
}

pub fn parse_config(contents: &str) -> RfcResult<RfcConfig> {
    serde_json::from_str(contents).context(ParsingJsonSnafu {})
}

fn read_js_int(x: &JSValue) -> RfcResult<u32> {
    match x {
        JSValue::Number(n) => n
            .as_u64()
            .and_then(|x| u32::try_from(x).ok())
            .context(ParsingJsonNumberSnafu {
                value: n.to_string(),
            }),
        JSValue::String(s) => s
            .trim()
            .parse::<u32>()
            .ok()
            .context(ParsingJsonNumberSnafu { value: s.clone() }),
        _ => None.context(ParsingJsonNumberSnafu {
            value: x.to_string(),
        }),
    }
}
