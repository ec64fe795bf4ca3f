use log::{debug, info, warn};

use rfc_votes::*;
use snafu::{prelude::*, Snafu};

use std::fs::File;
use std::io::Write;

use crate::args::Args;
use crate::stats::config_reader::*;
use crate::stats::http_api::HttpClient;
use crate::stats::io_csv::VoteWriter;

pub mod config_reader;
pub mod http_api;
pub mod io_csv;

#[derive(Debug, Snafu)]
pub enum RfcError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the configuration: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Expected a section number, got {value}"))]
    ParsingJsonNumber { value: String },
    #[snafu(display("Invalid configuration: {source}"))]
    Settings { source: WikiError },
    #[snafu(display("Could not create the HTTP client: {source}"))]
    HttpClient { source: reqwest::Error },
    #[snafu(display("Error opening output {path}"))]
    OpeningOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing CSV: {source}"))]
    WritingCsv { source: csv::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RfcResult<T> = Result<T, RfcError>;

fn open_output(out: &Option<String>) -> RfcResult<Box<dyn Write>> {
    match out.as_deref() {
        None | Some("") | Some("stdout") => Ok(Box::new(std::io::stdout())),
        Some(path) => {
            info!("Writing votes to {:?}", path);
            let f = File::create(path).context(OpeningOutputSnafu { path })?;
            Ok(Box::new(f))
        }
    }
}

/// Reads the votes of the page described by the configuration and writes
/// them, with the profiles of their voters, in CSV format.
pub fn run_stats(args: &Args) -> RfcResult<()> {
    let mut config = read_config(&args.config)?;
    config.apply_args(args);
    debug!("config: {:?}", config);
    let settings = config.page_settings()?;

    let client = HttpClient::new()?;
    let api = client.from_domain(&config.wiki);
    let page = VotePage::new(&api, &client, settings).context(SettingsSnafu {})?;
    info!(
        "Reading {} on {}, sections {:?}",
        page.settings().source,
        api.endpoint(),
        page.settings().sections.keys().collect::<Vec<_>>()
    );

    let mut writer = VoteWriter::new(open_output(&args.out)?);
    let mut skipped_sections = 0;
    for item in page.votes(args.section.as_deref(), args.limit) {
        match item {
            Ok(vote) => writer.write_vote(&vote)?,
            Err(e) => {
                warn!("Skipping a section: {}", e);
                skipped_sections += 1;
            }
        }
    }
    let written = writer.finish()?;
    info!(
        "{} votes written, {} sections skipped",
        written, skipped_sections
    );
    if written == 0 && skipped_sections > 0 {
        whatever!("None of the sections could be read from {}", config.wiki)
    }
    Ok(())
}
