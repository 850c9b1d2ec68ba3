use clap::Parser;

/// This is a multi-seat ranked voting tabulation program, using a single transferable vote.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election configuration, in JSON.
    /// For more information about the file format, read the manual of the stv_tally crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, stvtab will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the ballots are read from this file. Setting this option overrides the
    /// sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// If specified, only the columns with a header shaped as '<question> [<candidate>]' are read.
    #[clap(short, long, value_parser)]
    pub question: Option<String>,

    /// (default 1) The number of seats to fill.
    #[clap(short, long, value_parser)]
    pub seats: Option<u32>,

    /// (repeated or not specified) If specified, the labels of the ranks, in order. This is useful when the
    /// ranks are written as text in the input, such as 'First choice'.
    #[clap(long, value_parser)]
    pub choices: Option<Vec<String>>,

    /// When using an Excel file, indicates the name of the worksheet to use. The first worksheet by default.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
