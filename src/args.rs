use clap::Parser;

/// This is a tabulation program for multi-rater job evaluation sheets.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The spreadsheet containing the evaluation data. Only the first worksheet
    /// is read. The accepted formats are .xlsx and .xls.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path) A session file produced by a previous run. It is read at startup when no
    /// --input is given, and rewritten after a successful ingest.
    #[clap(short, long, value_parser)]
    pub state: Option<String>,

    /// (job key or empty) If specified, only the averages of this job are computed and
    /// written out. The key has the form <group>-<series>-<title>, with the same values as
    /// the corresponding spreadsheet columns.
    #[clap(short, long, value_parser)]
    pub job: Option<String>,

    /// (rater name or empty) If specified, the scores given by this rater are written out
    /// instead of the per-job summary.
    #[clap(short, long, value_parser)]
    pub evaluator: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON
    /// format to the given location instead of the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing an expected summary in JSON format. If
    /// provided, jobeval will check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
