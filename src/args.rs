use clap::Parser;

/// This is an election results report generator.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The configuration file of the report, in JSON format. It points to the election
    /// description and to the result files. See the documentation of results_tabulation::manual.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference summary in JSON format. If provided, resultsrpt will check that the
    /// English summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (directory) If specified, the report is written to this directory. Setting this option overrides
    /// the directory that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// The build time printed in the report. Overrides the configuration.
    #[clap(long, value_parser)]
    pub build_time: Option<String>,

    /// If passed, the output only depends on the inputs: the build time is never taken from the clock.
    #[clap(long, takes_value = false)]
    pub deterministic: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
