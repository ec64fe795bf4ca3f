use log::{debug, info, warn};

use crate::aggregate::aggregate_activity;
use crate::api::*;
use crate::config::*;
use crate::gaps::inactivity_gaps;
use crate::identity::resolve_identity;
use crate::profile::{load_profile, ProfileData};
use crate::wikitext::{filter_vote_lines, parse_vote, DatePattern};

/// An RFC page on a wiki, and the clients needed to profile its voters.
pub struct VotePage<'a> {
    api: &'a dyn WikiApi,
    factory: &'a dyn WikiApiFactory,
    settings: PageSettings,
    dates: DatePattern,
}

impl<'a> VotePage<'a> {
    /// `api` is the wiki hosting the page, `factory` opens the other wikis of
    /// the federation.
    pub fn new(
        api: &'a dyn WikiApi,
        factory: &'a dyn WikiApiFactory,
        settings: PageSettings,
    ) -> WikiResult<VotePage<'a>> {
        let dates = DatePattern::new(&settings.dates)?;
        Ok(VotePage {
            api,
            factory,
            settings,
            dates,
        })
    }

    pub fn settings(&self) -> &PageSettings {
        &self.settings
    }

    /// Iterates over the votes of the page, in section order then in page order.
    ///
    /// Arguments:
    /// * `section` only return the votes of this section (label or section number)
    /// * `limit` only return this many votes in total
    ///
    /// Each vote is fully resolved before it is returned. A section whose text
    /// cannot be fetched yields an error, and the iteration continues with the
    /// next section.
    pub fn votes(&self, section: Option<&str>, limit: Option<usize>) -> Votes<'_, 'a> {
        let sections: Vec<(String, u32)> = self
            .settings
            .sections
            .iter()
            .filter(|(label, id)| match section {
                Some(s) => s == label.as_str() || s == id.to_string(),
                None => true,
            })
            .map(|(label, id)| (label.clone(), *id))
            .collect();
        if sections.is_empty() {
            warn!("votes: no section matches {:?}", section);
        }
        Votes {
            page: self,
            sections: sections.into_iter(),
            current: None,
            emitted: 0,
            limit,
        }
    }

    /// The title of the page and the vote lines of a section.
    pub fn get_vote_lines(&self, section: u32) -> WikiResult<(String, Vec<String>)> {
        let st = get_section_text(self.api, &self.settings.source, section)?;
        let lines: Vec<String> = filter_vote_lines(st.text.lines())
            .map(|l| l.to_string())
            .collect();
        info!(
            "get_vote_lines: section {} of {}: {} vote lines",
            section,
            st.title,
            lines.len()
        );
        Ok((st.title, lines))
    }

    /// Parses a vote line and profiles its author.
    ///
    /// Lookup failures are recorded in the vote rather than returned.
    pub fn resolve_vote(&self, line: &str, section_label: &str, page_title: &str) -> Vote {
        let mut vote = parse_vote(line, section_label, &self.dates);
        let username = match vote.username.value() {
            Some(u) => u.clone(),
            None => {
                warn!("resolve_vote: no voter found in {:?}", line);
                return vote;
            }
        };
        match self.load_voter(&username) {
            Ok(user) => {
                if self.settings.inactivity_gaps {
                    if let Some(cast_at) = vote.timestamp.value() {
                        let gaps =
                            inactivity_gaps(self.api, self.factory, &user, cast_at, page_title);
                        vote.local_gap = gaps.local;
                        vote.global_gap = gaps.global;
                        vote.gap_failures = gaps.failures;
                    }
                }
                vote.voter = Voter::Resolved(Box::new(user));
            }
            Err(e) => {
                warn!("resolve_vote: could not load {}: {}", username, e);
                vote.voter = Voter::LookupFailed(e);
            }
        }
        vote
    }

    /// Loads the local profile of a voter, then their global identity and its
    /// activity when the account is unified.
    pub fn load_voter(&self, username: &str) -> WikiResult<User> {
        let ProfileData {
            mut user,
            global_info,
        } = load_profile(self.api, username)?;
        user.global_identity = resolve_identity(username, &global_info, &self.settings.anchor_wiki)?;
        if let GlobalStatus::Unified(identity) = &mut user.global_identity {
            aggregate_activity(self.factory, identity);
        }
        debug!("load_voter: {:?}", user);
        Ok(user)
    }
}

/// The lazy sequence of votes of a page. See `VotePage::votes`.
pub struct Votes<'p, 'a> {
    page: &'p VotePage<'a>,
    sections: std::vec::IntoIter<(String, u32)>,
    // Label, page title and remaining lines of the current section.
    current: Option<(String, String, std::vec::IntoIter<String>)>,
    emitted: usize,
    limit: Option<usize>,
}

impl<'p, 'a> Iterator for Votes<'p, 'a> {
    type Item = WikiResult<Vote>;

    fn next(&mut self) -> Option<Self::Item> {
        // Checked before touching the next line, so no call is wasted.
        if let Some(limit) = self.limit {
            if self.emitted >= limit {
                return None;
            }
        }
        loop {
            if let Some((label, title, lines)) = self.current.as_mut() {
                if let Some(line) = lines.next() {
                    self.emitted += 1;
                    return Some(Ok(self.page.resolve_vote(&line, label, title)));
                }
            }
            let (label, section) = self.sections.next()?;
            match self.page.get_vote_lines(section) {
                Ok((title, lines)) => self.current = Some((label, title, lines.into_iter())),
                Err(e) => {
                    warn!("votes: skipping section {} ({}): {}", label, section, e);
                    self.current = None;
                    return Some(Err(e));
                }
            }
        }
    }
}
