use clap::{Parser, ValueHint};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about, version, name = "sparaudit")]
/// Audits RDF datasets hosted in a SPARQL service against OWL and RDFS ontologies
pub struct Args {
    /// URL of the SPARQL query endpoint
    #[arg(short, long, value_hint = ValueHint::Url)]
    pub endpoint: Option<String>,
    /// URL of the SPARQL update endpoint
    ///
    /// Required by --fix. Without it, fixes are reported as failures.
    #[arg(long, value_hint = ValueHint::Url)]
    pub update_endpoint: Option<String>,
    /// Named graph holding a dataset to audit
    ///
    /// Can be repeated to audit several datasets at once.
    #[arg(short, long = "dataset", value_hint = ValueHint::Url)]
    pub datasets: Vec<String>,
    /// Named graph holding an ontology the datasets are audited against
    #[arg(short, long = "ontology", value_hint = ValueHint::Url)]
    pub ontologies: Vec<String>,
    /// Remove dangling references from the datasets
    #[arg(long)]
    pub fix: bool,
    /// Format of the generated report
    ///
    /// By default, it is guessed from the --output file extension and falls back to JSON.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
    /// File to write the report to
    ///
    /// By default the standard output is used.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,
    /// Timeout of each SPARQL request, in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Run the checks concurrently
    #[arg(long)]
    pub parallel: bool,
    /// Only consider direct sub-classes when resolving class hierarchies
    #[arg(long)]
    pub no_reasoning: bool,
    /// Name of a check to run
    ///
    /// Can be repeated. By default all checks are run.
    #[arg(short, long = "check")]
    pub checks: Vec<String>,
    /// JSON configuration file
    ///
    /// Options given on the command line take precedence over the file ones.
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Format of the log lines written to the standard error
    #[arg(long, value_enum, default_value = "text")]
    pub log_format: LogFormat,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, clap::ValueEnum)]
pub enum ReportFormat {
    Json,
    Xml,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, clap::ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
