//! Run Service - walk, extract and synthesize every package under a root.
//!
//! Packages are independent units: each one is extracted and synthesized on
//! a bounded rayon pool, and a failure in one never stops its siblings.
//! Outcomes are collected and reported in directory order.

use std::path::{Path, PathBuf};
use std::sync::{Arc, mpsc};

use tracing::{info, instrument, warn};

use crate::{
    application::{
        ApplicationError, CancellationFlag,
        ports::{EntryKind, Filesystem, PackageBatch, PackageSource},
        services::{BrokerSynthesizer, SymbolExtractor},
    },
    domain::{
        BrokerSlot, Diagnostic, ErrorKind, Markers, PackageOutcome, PackageStatus,
        ProjectContext, RunReport, is_generated_broker,
    },
    error::{GibranError, GibranResult},
};

/// Name of the module file read from the run root.
const GO_MOD: &str = "go.mod";

pub struct RunService {
    source: Box<dyn PackageSource>,
    extractor: SymbolExtractor,
    synthesizer: BrokerSynthesizer,
    filesystem: Arc<dyn Filesystem>,
    markers: Markers,
    jobs: usize,
}

impl RunService {
    pub fn new(
        source: Box<dyn PackageSource>,
        extractor: SymbolExtractor,
        synthesizer: BrokerSynthesizer,
        filesystem: Arc<dyn Filesystem>,
        markers: Markers,
    ) -> Self {
        Self {
            source,
            extractor,
            synthesizer,
            filesystem,
            markers,
            jobs: 0,
        }
    }

    /// Worker count; `0` uses the available parallelism.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs;
        self
    }

    /// Regenerate every broker under `root`.
    ///
    /// Returns `Err` only if the run could not start. Per-unit failures,
    /// the walk error and cancellation are reported in the [`RunReport`].
    #[instrument(skip_all, fields(root = %root.display(), jobs = self.jobs))]
    pub fn run(&self, root: &Path, cancel: &CancellationFlag) -> GibranResult<RunReport> {
        if self.filesystem.entry_kind(root)? != Some(EntryKind::Directory) {
            return Err(ApplicationError::NotFound {
                path: root.to_path_buf(),
            }
            .into());
        }

        let go_mod = self.filesystem.read_to_string(&root.join(GO_MOD)).ok();
        let project = ProjectContext::from_go_mod(root, go_mod.as_deref());
        info!(module = project.module_path(), "Starting run");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.jobs)
            .thread_name(|i| format!("gibran-worker-{i}"))
            .build()
            .map_err(|e| GibranError::Internal {
                message: format!("failed to start worker pool: {e}"),
            })?;

        let (tx, rx) = mpsc::channel::<PackageOutcome>();
        let mut report = RunReport::default();

        pool.scope(|scope| {
            for item in self.source.walk(root) {
                if cancel.is_cancelled() {
                    report.cancelled = true;
                    break;
                }
                match item {
                    Ok(batch) => {
                        let tx = tx.clone();
                        let project = &project;
                        scope.spawn(move |_| {
                            let outcome = self.process(batch, project, cancel);
                            // Receiver outlives the scope.
                            let _ = tx.send(outcome);
                        });
                    }
                    Err(e) => {
                        warn!(error = %e, "Walk aborted");
                        report.walk_error =
                            Some(Diagnostic::new(walk_unit(&e, &project), e.kind(), e.detail()));
                        break;
                    }
                }
            }
        });
        drop(tx);

        report.outcomes = rx.into_iter().collect();
        report.outcomes.sort_by(|a, b| a.directory.cmp(&b.directory));
        if report.outcomes.iter().any(|o| o.status == PackageStatus::Skipped) {
            report.cancelled = true;
        }

        info!(
            packages = report.outcomes.len(),
            synthesized = report.synthesized_count(),
            failed = report.failures().count(),
            cancelled = report.cancelled,
            "Run finished"
        );
        Ok(report)
    }

    fn process(
        &self,
        batch: PackageBatch,
        project: &ProjectContext,
        cancel: &CancellationFlag,
    ) -> PackageOutcome {
        let directory = project.relative_dir(&batch.directory);
        let mut outcome = PackageOutcome {
            directory: directory.clone(),
            import_path: Some(project.import_path_for(&batch.directory)),
            status: PackageStatus::Skipped,
            diagnostics: batch.read_failures.clone(),
        };
        if cancel.is_cancelled() {
            return outcome;
        }

        let extraction = self.extractor.extract(&batch, project);
        outcome.diagnostics.extend(extraction.diagnostics);

        let Some(record) = extraction.record else {
            warn!(dir = %directory, "No file of the package could be parsed");
            outcome.status = PackageStatus::Failed;
            return outcome;
        };

        if cancel.is_cancelled() {
            return outcome;
        }

        let generated: Vec<PathBuf> = batch
            .brokers
            .iter()
            .filter(|path| {
                self.filesystem
                    .read_to_string(path)
                    .is_ok_and(|contents| is_generated_broker(&contents))
            })
            .cloned()
            .collect();
        let slot = match BrokerSlot::resolve(&batch.directory, &generated, &self.markers) {
            Ok(slot) => slot,
            Err(e) => {
                let e = GibranError::from(e);
                outcome
                    .diagnostics
                    .push(Diagnostic::new(directory, e.kind(), e.detail()));
                outcome.status = PackageStatus::Failed;
                return outcome;
            }
        };
        let broker = project.relative_dir(slot.path());

        match self.synthesizer.synthesize(&record, &slot) {
            Ok(_) => {
                info!(package = record.name(), broker = %broker, "Broker synthesized");
                outcome.status = PackageStatus::Synthesized { broker };
            }
            Err(e) => {
                warn!(package = record.name(), error = %e, "Synthesis failed");
                outcome
                    .diagnostics
                    .push(Diagnostic::new(broker, e.kind(), e.detail()));
                outcome.status = PackageStatus::Failed;
            }
        }
        outcome
    }
}

fn walk_unit(error: &GibranError, project: &ProjectContext) -> String {
    match error {
        GibranError::Application(ApplicationError::FilesystemError { path, .. }) => {
            project.relative_dir(path)
        }
        _ => ".".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        MockBrokerRenderer, MockFilesystem, MockImportResolver, MockSourceParser, PackageStream,
    };
    use crate::domain::{FileRole, ParsedFile, SourceFile};
    use std::sync::Mutex;

    /// Replays a fixed list of batches.
    struct FixedSource(Mutex<Vec<GibranResult<PackageBatch>>>);

    impl PackageSource for FixedSource {
        fn walk(&self, _root: &Path) -> PackageStream {
            let items = std::mem::take(&mut *self.0.lock().unwrap());
            Box::new(items.into_iter())
        }
    }

    fn batch(dir: &str, files: &[&str]) -> PackageBatch {
        let directory = PathBuf::from("/work/shop").join(dir);
        PackageBatch {
            files: files
                .iter()
                .map(|f| SourceFile::new(directory.join(f), FileRole::Regular, *f))
                .collect(),
            directory,
            ..Default::default()
        }
    }

    fn filesystem(written: Arc<Mutex<Vec<PathBuf>>>) -> MockFilesystem {
        let mut fs = MockFilesystem::new();
        fs.expect_entry_kind()
            .returning(|_| Ok(Some(EntryKind::Directory)));
        fs.expect_read_to_string().returning(|path| {
            if path.ends_with("gen_broker.go") {
                Ok("// Code generated by gibran. DO NOT EDIT.\n\npackage pkg\n".into())
            } else {
                Ok("module shop\n".into())
            }
        });
        fs.expect_write_atomic().returning(move |p, _| {
            written.lock().unwrap().push(p.to_path_buf());
            Ok(())
        });
        fs
    }

    fn service(
        items: Vec<GibranResult<PackageBatch>>,
        written: Arc<Mutex<Vec<PathBuf>>>,
    ) -> RunService {
        let mut parser = MockSourceParser::new();
        parser.expect_parse().returning(|name, contents| {
            if contents.contains("broken") {
                return Err(ApplicationError::ParseFailed {
                    file: name.to_string(),
                    message: "unexpected token".into(),
                }
                .into());
            }
            Ok(ParsedFile {
                file_name: name.to_string(),
                package_name: "pkg".into(),
                ..Default::default()
            })
        });
        let mut renderer = MockBrokerRenderer::new();
        renderer
            .expect_render()
            .returning(|view| Ok(format!("package {}\n", view.package_name)));

        let fs: Arc<dyn Filesystem> = Arc::new(filesystem(written));
        RunService::new(
            Box::new(FixedSource(Mutex::new(items))),
            SymbolExtractor::new(Box::new(parser), Arc::new(MockImportResolver::new())),
            BrokerSynthesizer::new(Box::new(renderer), Arc::clone(&fs)),
            fs,
            Markers::default(),
        )
        .with_jobs(2)
    }

    #[test]
    fn failing_package_does_not_stop_sibling() {
        let written = Arc::default();
        let svc = service(
            vec![Ok(batch("a", &["broken"])), Ok(batch("b", &["ok.go"]))],
            Arc::clone(&written),
        );

        let report = svc
            .run(Path::new("/work/shop"), &CancellationFlag::new())
            .unwrap();

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].directory, "a");
        assert_eq!(report.outcomes[0].status, PackageStatus::Failed);
        assert_eq!(
            report.outcomes[1].status,
            PackageStatus::Synthesized {
                broker: "b/broker.go".into()
            }
        );
        assert!(report.has_failures());
        assert_eq!(
            *written.lock().unwrap(),
            vec![PathBuf::from("/work/shop/b/broker.go")]
        );
    }

    #[test]
    fn only_a_generated_broker_is_reused_as_the_slot() {
        let written = Arc::default();
        let mut hand_written = batch("a", &["ok.go"]);
        hand_written.brokers = vec![PathBuf::from("/work/shop/a/mybroker_helper.go")];
        let mut generated = batch("b", &["ok.go"]);
        generated.brokers = vec![PathBuf::from("/work/shop/b/gen_broker.go")];
        let svc = service(
            vec![Ok(hand_written), Ok(generated)],
            Arc::clone(&written),
        );

        let report = svc
            .run(Path::new("/work/shop"), &CancellationFlag::new())
            .unwrap();
        assert!(!report.has_failures());

        let mut paths = written.lock().unwrap().clone();
        paths.sort();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/work/shop/a/broker.go"),
                PathBuf::from("/work/shop/b/gen_broker.go"),
            ]
        );
    }

    #[test]
    fn walk_error_stops_walk_and_is_reported() {
        let written = Arc::default();
        let svc = service(
            vec![
                Ok(batch("a", &["ok.go"])),
                Err(ApplicationError::FilesystemError {
                    path: PathBuf::from("/work/shop/locked"),
                    reason: "permission denied".into(),
                }
                .into()),
                Ok(batch("z", &["ok.go"])),
            ],
            written,
        );

        let report = svc
            .run(Path::new("/work/shop"), &CancellationFlag::new())
            .unwrap();
        assert_eq!(report.outcomes.len(), 1);
        let walk_error = report.walk_error.unwrap();
        assert_eq!(walk_error.unit, "locked");
        assert_eq!(walk_error.kind, ErrorKind::IoFailure);
    }

    #[test]
    fn cancelled_run_writes_nothing() {
        let written: Arc<Mutex<Vec<PathBuf>>> = Arc::default();
        let svc = service(vec![Ok(batch("a", &["ok.go"]))], Arc::clone(&written));
        let cancel = CancellationFlag::new();
        cancel.cancel();

        let report = svc.run(Path::new("/work/shop"), &cancel).unwrap();
        assert!(report.cancelled);
        assert!(report.outcomes.is_empty());
        assert!(written.lock().unwrap().is_empty());
    }

    #[test]
    fn missing_root_is_not_found() {
        let mut fs = MockFilesystem::new();
        fs.expect_entry_kind().returning(|_| Ok(None));
        let fs: Arc<dyn Filesystem> = Arc::new(fs);
        let svc = RunService::new(
            Box::new(FixedSource(Mutex::new(vec![]))),
            SymbolExtractor::new(
                Box::new(MockSourceParser::new()),
                Arc::new(MockImportResolver::new()),
            ),
            BrokerSynthesizer::new(Box::new(MockBrokerRenderer::new()), Arc::clone(&fs)),
            fs,
            Markers::default(),
        );

        let err = svc
            .run(Path::new("/nope"), &CancellationFlag::new())
            .unwrap_err();
        assert!(matches!(
            err,
            GibranError::Application(ApplicationError::NotFound { .. })
        ));
    }
}
