//! `gibran run`: regenerate every package's broker.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, instrument, warn};

use gibran_adapters::{
    CachingResolver, GoParser, LocalFilesystem, PackageWalker, TeraBrokerRenderer,
};
use gibran_core::{
    application::{
        ApplicationError, BrokerSynthesizer, CancellationFlag, RunService, SymbolExtractor,
        ports::Filesystem,
    },
    domain::{PackageStatus, RunReport},
    error::GibranError,
};

use crate::{
    cli::{OutputFormat, RunArgs},
    config::AppConfig,
    error::{CliError, CliResult},
    output::OutputManager,
};

#[instrument(skip_all)]
pub fn execute(args: RunArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let requested = args.root.clone().unwrap_or_else(|| PathBuf::from("."));
    let root = requested
        .canonicalize()
        .map_err(|_| GibranError::from(ApplicationError::NotFound { path: requested }))?;

    let markers = config.markers(args.marker_matching.map(Into::into))?;
    let resolver_config = config
        .resolver_config(&args.search_paths, args.goroot.as_deref())
        .with_project_root(&root);
    let resolver = CachingResolver::new(resolver_config, markers.clone())?;

    let template = args.template.clone().or_else(|| config.run.broker_template.clone());
    let renderer = match &template {
        Some(path) => TeraBrokerRenderer::from_file(path)?,
        None => TeraBrokerRenderer::new(),
    };

    let filesystem: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    let service = RunService::new(
        Box::new(PackageWalker::new(markers.clone())),
        SymbolExtractor::new(Box::new(GoParser::new()?), Arc::new(resolver)),
        BrokerSynthesizer::new(Box::new(renderer), Arc::clone(&filesystem)),
        filesystem,
        markers,
    )
    .with_jobs(args.jobs.unwrap_or(config.run.jobs));

    let cancel = install_interrupt_handler();
    let report = service.run(&root, &cancel)?;

    if output.format() == OutputFormat::Json {
        output.json(&report)?;
    } else {
        summarize(&report, &root, &output)?;
    }
    print_failures(&report, &output)?;

    outcome(&report)
}

/// Ctrl-C flips the returned flag; the pipeline stops between packages.
fn install_interrupt_handler() -> CancellationFlag {
    let cancel = CancellationFlag::new();
    let handle = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        warn!("Interrupt received, finishing packages in flight");
        handle.cancel();
    }) {
        warn!(error = %e, "Could not install Ctrl-C handler");
    }
    cancel
}

fn summarize(report: &RunReport, root: &Path, output: &OutputManager) -> CliResult<()> {
    for outcome in &report.outcomes {
        match &outcome.status {
            PackageStatus::Synthesized { broker } => output.print(&format!("  wrote {broker}"))?,
            PackageStatus::Failed => output.print(&format!("  failed {}", outcome.directory))?,
            PackageStatus::Skipped => output.print(&format!("  skipped {}", outcome.directory))?,
        }
    }
    for warning in report.diagnostics().filter(|d| !d.is_error()) {
        output.warning(&warning.to_string())?;
    }

    let written = report.synthesized_count();
    let total = report.outcomes.len();
    if report.has_failures() {
        output.print(&format!(
            "{written} of {total} brokers regenerated under {}",
            root.display()
        ))?;
    } else {
        output.success(&format!(
            "{written} brokers regenerated under {}",
            root.display()
        ))?;
    }
    info!(written, total, "Run finished");
    Ok(())
}

/// Failure summary on stderr, one `unit: Kind: message` line per error.
///
/// Printed for every output format so a JSON consumer still sees failures.
fn print_failures(report: &RunReport, output: &OutputManager) -> CliResult<()> {
    for diagnostic in report.diagnostics().filter(|d| d.is_error()) {
        output.error(&diagnostic.to_string())?;
    }
    Ok(())
}

fn outcome(report: &RunReport) -> CliResult<()> {
    if report.cancelled {
        return Err(CliError::Cancelled);
    }
    let failed = report.failures().count() + usize::from(report.walk_error.is_some());
    if failed > 0 {
        return Err(CliError::UnitsFailed { failed });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gibran_core::domain::{Diagnostic, ErrorKind, PackageOutcome};

    fn outcome_with(status: PackageStatus, diagnostics: Vec<Diagnostic>) -> PackageOutcome {
        PackageOutcome {
            directory: "models".into(),
            import_path: Some("shop/models".into()),
            status,
            diagnostics,
        }
    }

    #[test]
    fn clean_report_succeeds() {
        let report = RunReport {
            outcomes: vec![outcome_with(
                PackageStatus::Synthesized {
                    broker: "models/broker.go".into(),
                },
                vec![Diagnostic::new("models", ErrorKind::UnresolvedImport, "x")],
            )],
            ..RunReport::default()
        };
        assert!(outcome(&report).is_ok());
    }

    #[test]
    fn failed_packages_and_walk_errors_are_counted() {
        let report = RunReport {
            outcomes: vec![outcome_with(PackageStatus::Failed, vec![])],
            walk_error: Some(Diagnostic::new("views", ErrorKind::IoFailure, "denied")),
            cancelled: false,
        };
        let err = outcome(&report).unwrap_err();
        assert!(matches!(err, CliError::UnitsFailed { failed: 2 }));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn cancellation_wins_over_failures() {
        let report = RunReport {
            outcomes: vec![outcome_with(PackageStatus::Skipped, vec![])],
            walk_error: None,
            cancelled: true,
        };
        assert_eq!(outcome(&report).unwrap_err().exit_code(), 130);
    }
}
