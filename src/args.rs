use clap::Parser;

/// Calculates participant statistics for MediaWiki RFCs, votes, etc.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the wiki, the page and its sections.
    /// For more information about the file format, read the manual of the rfc_votes crate.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (domain name, optional) Overrides the wiki of the configuration file.
    #[clap(short, long, value_parser)]
    pub wiki: Option<String>,

    /// (page title, optional) Overrides the page of the configuration file.
    #[clap(short, long, value_parser)]
    pub page: Option<String>,

    /// (revision id, optional) Analyze this revision of the page instead of the current one.
    #[clap(short, long, value_parser)]
    pub revision: Option<u64>,

    /// (section label or number, optional) Only return the votes of this section.
    #[clap(short, long, value_parser)]
    pub section: Option<String>,

    /// (number, optional) Only return this many votes.
    #[clap(short, long, value_parser)]
    pub limit: Option<usize>,

    /// (file path, 'stdout' or empty) Where to write the votes in CSV format. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// If passed as an argument, also computes how long each voter was inactive before voting.
    #[clap(long, takes_value = false)]
    pub gaps: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
