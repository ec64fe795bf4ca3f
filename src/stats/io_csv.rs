// Writes the votes and the profiles of their voters in CSV format.

use std::io::Write;

use log::debug;
use serde::Serialize;
use snafu::prelude::*;

use crate::stats::{RfcResult, WritingCsvSnafu};
use rfc_votes::api::format_api_timestamp;
use rfc_votes::*;

/// One line of the output.
#[derive(Serialize, Debug, PartialEq)]
pub struct VoteRow {
    pub section: String,
    pub username: String,
    #[serde(rename = "vote time")]
    pub vote_time: String,
    #[serde(rename = "local edit count")]
    pub local_edit_count: Option<u64>,
    #[serde(rename = "local admin")]
    pub local_admin: Option<bool>,
    #[serde(rename = "local first edit")]
    pub local_first_edit: String,
    pub registration: String,
    pub unified: Option<bool>,
    #[serde(rename = "home wiki")]
    pub home_wiki: String,
    #[serde(rename = "global edit count")]
    pub global_edit_count: Option<u64>,
    #[serde(rename = "global admin")]
    pub global_admin: Option<bool>,
    #[serde(rename = "global first edit")]
    pub global_first_edit: String,
    #[serde(rename = "member wikis")]
    pub member_wikis: Option<usize>,
    #[serde(rename = "local gap")]
    pub local_gap: Option<u32>,
    #[serde(rename = "global gap")]
    pub global_gap: Option<u32>,
    pub status: String,
    pub text: String,
}

fn time_cell(ts: Option<&Timestamp>) -> String {
    ts.map(format_api_timestamp).unwrap_or_default()
}

fn status(vote: &Vote) -> String {
    match (&vote.username, &vote.voter) {
        (Extracted::Missing(reason), _) => format!("no user: {}", reason),
        (_, Voter::LookupFailed(e)) => format!("lookup failed: {}", e),
        (_, Voter::Resolved(user)) => {
            let aggregation = user.global().map(|g| g.warnings.as_slice()).unwrap_or(&[]);
            let skipped: Vec<String> = aggregation
                .iter()
                .map(|w| format!("{} ({})", w.wiki, w.reason))
                .chain(
                    vote.gap_failures
                        .iter()
                        .map(|w| format!("gaps on {} ({})", w.wiki, w.reason)),
                )
                .collect();
            if skipped.is_empty() {
                "ok".to_string()
            } else {
                format!("partial: {}", skipped.join(", "))
            }
        }
        (_, Voter::Unknown) => "ok".to_string(),
    }
}

impl VoteRow {
    pub fn from_vote(vote: &Vote) -> VoteRow {
        let user = vote.user();
        let global = user.and_then(|u| u.global());
        VoteRow {
            section: vote.section_label.clone(),
            username: vote.username.value().cloned().unwrap_or_default(),
            vote_time: time_cell(vote.timestamp.value()),
            local_edit_count: user.map(|u| u.edit_count),
            local_admin: user.map(|u| u.is_admin()),
            local_first_edit: time_cell(user.and_then(|u| u.first_edit.as_ref())),
            registration: time_cell(user.and_then(|u| u.registration.as_ref())),
            unified: user.map(|u| u.global().is_some()),
            home_wiki: user
                .and_then(|u| u.home_wiki())
                .unwrap_or_default()
                .to_string(),
            global_edit_count: global.map(|g| g.global_edit_count),
            global_admin: global.map(|g| g.is_admin()),
            global_first_edit: time_cell(global.and_then(|g| g.first_edit.as_ref())),
            member_wikis: global.map(|g| g.member_wikis.len()),
            local_gap: vote.local_gap,
            global_gap: vote.global_gap,
            status: status(vote),
            text: vote.plain_text().trim().to_string(),
        }
    }
}

pub struct VoteWriter<W: Write> {
    writer: csv::Writer<W>,
    count: usize,
}

impl<W: Write> VoteWriter<W> {
    pub fn new(out: W) -> VoteWriter<W> {
        VoteWriter {
            writer: csv::Writer::from_writer(out),
            count: 0,
        }
    }

    pub fn write_vote(&mut self, vote: &Vote) -> RfcResult<()> {
        debug!("write_vote: {:?} {:?}", vote.section_label, vote.username);
        self.writer
            .serialize(VoteRow::from_vote(vote))
            .context(WritingCsvSnafu {})?;
        self.count += 1;
        Ok(())
    }

    /// Flushes the output and returns the number of votes written.
    pub fn finish(mut self) -> RfcResult<usize> {
        self.writer
            .flush()
            .map_err(csv::Error::from)
            .context(WritingCsvSnafu {})?;
        Ok(self.count)
    }
}
