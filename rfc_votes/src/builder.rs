use indexmap::IndexMap;

pub use crate::config::*;

/// A builder for the settings of a vote page.
///
/// ```
/// use rfc_votes::builder::Builder;
/// use rfc_votes::PageSource;
/// # use rfc_votes::WikiError;
///
/// let settings = Builder::new(PageSource::Title("Project:RFC/Some RFC".to_string()))
///     .section("support", 1)?
///     .section("oppose", 3)?
///     .build()?;
///
/// assert_eq!(settings.sections.get_index(1), Some((&"oppose".to_string(), &3)));
/// # Ok::<(), WikiError>(())
/// ```
pub struct Builder {
    pub(crate) _source: PageSource,
    pub(crate) _sections: IndexMap<String, u32>,
    pub(crate) _dates: DateSettings,
    pub(crate) _anchor_wiki: String,
    pub(crate) _inactivity_gaps: bool,
}

impl Builder {
    pub fn new(source: PageSource) -> Builder {
        Builder {
            _source: source,
            _sections: IndexMap::new(),
            _dates: DateSettings::default(),
            _anchor_wiki: DEFAULT_ANCHOR_WIKI.to_string(),
            _inactivity_gaps: false,
        }
    }

    /// Adds a section. The label will be used in the output to identify what
    /// the user voted for, the number is the one in the section edit link.
    /// Sections are processed in the order they are added.
    pub fn section(mut self, label: &str, id: u32) -> WikiResult<Builder> {
        if self._sections.contains_key(label) {
            return InvalidSettingsSnafu {
                message: format!("section label {:?} used twice", label),
            }
            .fail();
        }
        self._sections.insert(label.to_string(), id);
        Ok(self)
    }

    pub fn sections(self, sections: &IndexMap<String, u32>) -> WikiResult<Builder> {
        sections
            .iter()
            .try_fold(self, |b, (label, id)| b.section(label, *id))
    }

    pub fn dates(mut self, dates: DateSettings) -> Builder {
        self._dates = dates;
        self
    }

    pub fn anchor_wiki(mut self, wiki: &str) -> Builder {
        self._anchor_wiki = wiki.to_string();
        self
    }

    pub fn inactivity_gaps(mut self, enabled: bool) -> Builder {
        self._inactivity_gaps = enabled;
        self
    }

    pub fn build(self) -> WikiResult<PageSettings> {
        if self._sections.is_empty() {
            return InvalidSettingsSnafu {
                message: "at least one section is required",
            }
            .fail();
        }
        if let PageSource::Title(t) = &self._source {
            if t.trim().is_empty() {
                return InvalidSettingsSnafu {
                    message: "a page title or a revision is required",
                }
                .fail();
            }
        }
        Ok(PageSettings {
            source: self._source,
            sections: self._sections,
            dates: self._dates,
            anchor_wiki: self._anchor_wiki,
            inactivity_gaps: self._inactivity_gaps,
        })
    }
}
