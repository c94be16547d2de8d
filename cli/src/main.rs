#![allow(clippy::print_stderr)]
use crate::cli::{Args, LogFormat, ReportFormat};
use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use oxrdf::NamedNode;
use serde::Deserialize;
use sparaudit::{AuditMode, AuditOptions, AuditReport, Auditor, HttpGateway, Scope};
use std::ffi::OsStr;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write, stdout};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

/// Content of the `--config` file.
///
/// Every key is optional, the command line flags take precedence.
#[derive(Deserialize, Default)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
struct Config {
    endpoint: Option<String>,
    update_endpoint: Option<String>,
    datasets: Vec<String>,
    ontologies: Vec<String>,
    fix: bool,
    format: Option<String>,
    output: Option<PathBuf>,
    timeout: Option<u64>,
    parallel: bool,
    reasoning: Option<bool>,
    checks: Vec<String>,
}

struct Settings {
    endpoint: String,
    update_endpoint: Option<String>,
    scope: Scope,
    format: ReportFormat,
    output: Option<PathBuf>,
    timeout: Option<Duration>,
    options: AuditOptions,
}

pub fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.log_format);
    match run(args) {
        Ok(report) if report.is_clean() => ExitCode::SUCCESS,
        Ok(report) => {
            info!(errors = report.error_count(), "The audit found errors");
            ExitCode::from(1)
        }
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn run(args: Args) -> anyhow::Result<AuditReport> {
    let settings = settings(args)?;
    let gateway = HttpGateway::new(
        settings.endpoint.as_str(),
        settings.update_endpoint.as_deref(),
        settings.timeout,
    )
    .context("Failed to build the SPARQL client")?;
    let auditor = Auditor::with_default_checks(settings.scope).with_options(settings.options);
    if let Some(checks) = &auditor.options().checks {
        for name in checks {
            if !auditor.check_names().any(|known| known == name) {
                bail!(
                    "The check '{name}' is unknown, the known ones are: {}",
                    auditor.check_names().collect::<Vec<_>>().join(", ")
                )
            }
        }
    }
    info!(endpoint = gateway.query_endpoint(), "Starting audit");
    let report = auditor.run(&gateway);
    info!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "Audit done"
    );

    if let Some(output) = &settings.output {
        let mut writer = BufWriter::new(
            File::create(output)
                .with_context(|| format!("Failed to create the file {}", output.display()))?,
        );
        write_report(&report, settings.format, &mut writer)?;
        writer.flush()?;
    } else {
        let mut writer = stdout().lock();
        write_report(&report, settings.format, &mut writer)?;
        writeln!(writer)?;
    }
    Ok(report)
}

fn settings(args: Args) -> anyhow::Result<Settings> {
    let config = if let Some(path) = &args.config {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read the configuration file {}", path.display()))?;
        serde_json::from_str::<Config>(&content)
            .with_context(|| format!("Invalid configuration file {}", path.display()))?
    } else {
        Config::default()
    };

    let Some(endpoint) = args.endpoint.or(config.endpoint) else {
        bail!("The SPARQL endpoint must be set with --endpoint or in the configuration file")
    };
    let datasets = if args.datasets.is_empty() {
        config.datasets
    } else {
        args.datasets
    };
    let ontologies = if args.ontologies.is_empty() {
        config.ontologies
    } else {
        args.ontologies
    };
    let checks = if args.checks.is_empty() {
        config.checks
    } else {
        args.checks
    };
    let output = args.output.or(config.output);
    let format = if let Some(format) = args.format {
        format
    } else if let Some(name) = &config.format {
        <ReportFormat as ValueEnum>::from_str(name, true)
            .map_err(|_| anyhow::anyhow!("The report format '{name}' is unknown"))?
    } else if let Some(output) = &output {
        format_from_path(output)?
    } else {
        ReportFormat::Json
    };

    Ok(Settings {
        endpoint,
        update_endpoint: args.update_endpoint.or(config.update_endpoint),
        scope: Scope::new(graph_names(datasets)?, graph_names(ontologies)?),
        format,
        output,
        timeout: args.timeout.or(config.timeout).map(Duration::from_secs),
        options: AuditOptions {
            mode: if args.fix || config.fix {
                AuditMode::ReportAndFix
            } else {
                AuditMode::ReportOnly
            },
            parallel: args.parallel || config.parallel,
            reasoning: !args.no_reasoning && config.reasoning.unwrap_or(true),
            checks: (!checks.is_empty()).then_some(checks),
        },
    })
}

fn graph_names(iris: Vec<String>) -> anyhow::Result<Vec<NamedNode>> {
    iris.into_iter()
        .map(|iri| {
            NamedNode::new(iri.as_str()).with_context(|| format!("The graph name {iri} is invalid"))
        })
        .collect()
}

fn format_from_path(path: &Path) -> anyhow::Result<ReportFormat> {
    match path.extension().and_then(OsStr::to_str) {
        Some("xml") => Ok(ReportFormat::Xml),
        Some("json") | None => Ok(ReportFormat::Json),
        Some(ext) => bail!(
            "The file extension '{ext}' is unknown, please set the report format with --format"
        ),
    }
}

fn write_report(
    report: &AuditReport,
    format: ReportFormat,
    writer: &mut impl Write,
) -> anyhow::Result<()> {
    match format {
        ReportFormat::Json => report.write_json(writer),
        ReportFormat::Xml => report.write_xml(writer),
    }
    .context("Failed to write the report")
}
