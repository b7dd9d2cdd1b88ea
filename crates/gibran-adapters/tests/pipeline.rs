//! End-to-end runs of scaffold and broker regeneration over real directories.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use gibran_adapters::{
    CachingResolver, GoParser, LocalFilesystem, PackageWalker, TeraBrokerRenderer,
};
use gibran_core::prelude::*;
use tempfile::TempDir;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn run_with(root: &Path, markers: Markers) -> RunReport {
    run_configured(root, markers, ResolverConfig::default())
}

fn run_configured(root: &Path, markers: Markers, config: ResolverConfig) -> RunReport {
    let fs: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    let resolver =
        CachingResolver::new(config.with_project_root(root), markers.clone()).unwrap();

    RunService::new(
        Box::new(PackageWalker::new(markers.clone())),
        SymbolExtractor::new(Box::new(GoParser::new().unwrap()), Arc::new(resolver)),
        BrokerSynthesizer::new(Box::new(TeraBrokerRenderer::new()), Arc::clone(&fs)),
        fs,
        markers,
    )
    .with_jobs(2)
    .run(root, &CancellationFlag::new())
    .unwrap()
}

fn run(root: &Path) -> RunReport {
    run_with(root, Markers::default())
}

/// Contents of every file whose name is not broker-classified.
fn snapshot_non_brokers(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    let markers = Markers::default();
    WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| markers.classify(&e.file_name().to_string_lossy()) != Some(FileRole::Broker))
        .map(|e| (e.path().to_path_buf(), fs::read(e.path()).unwrap()))
        .collect()
}

fn shop(root: &Path) {
    write(root, "go.mod", "module shop\n");
    write(
        root,
        "models/user.go",
        "package models\n\nimport \"fmt\"\n\ntype User struct{}\n\nfunc (u User) String() string { return fmt.Sprint(\"user\") }\n",
    );
    write(
        root,
        "controllers/basic.go",
        "package controllers\n\nimport \"shop/models\"\n\nfunc Current() models.User { return models.User{} }\n",
    );
}

#[test]
fn user_package_lists_fmt_and_user_stably() {
    let tmp = TempDir::new().unwrap();
    shop(tmp.path());

    let first = run(tmp.path());
    assert!(!first.has_failures(), "{:?}", first.diagnostics().collect::<Vec<_>>());
    let broker = read(tmp.path(), "models/broker.go");
    assert!(broker.contains("package models\n"));
    assert!(broker.contains("\t_ \"fmt\"\n"));
    assert!(broker.contains("type User at user.go:5:6"));
    assert!(broker.contains("method (User) String"));

    run(tmp.path());
    assert_eq!(read(tmp.path(), "models/broker.go"), broker);
}

#[test]
fn intra_project_imports_resolve_through_go_mod() {
    let tmp = TempDir::new().unwrap();
    shop(tmp.path());

    let report = run(tmp.path());
    let controllers = report
        .outcomes
        .iter()
        .find(|o| o.directory == "controllers")
        .unwrap();
    assert!(controllers.diagnostics.is_empty());

    let broker = read(tmp.path(), "controllers/broker.go");
    assert!(broker.contains("//\tmodels \"shop/models\"\n"));
    assert!(broker.contains("models.User at basic.go:5:23"));
    assert!(!broker.contains("(unresolved)"));
}

#[test]
fn unresolved_import_is_a_warning_not_a_failure() {
    let tmp = TempDir::new().unwrap();
    shop(tmp.path());

    let report = run(tmp.path());
    let models = report
        .outcomes
        .iter()
        .find(|o| o.directory == "models")
        .unwrap();
    assert_eq!(models.diagnostics.len(), 1);
    assert_eq!(models.diagnostics[0].kind, ErrorKind::UnresolvedImport);
    assert_eq!(models.diagnostics[0].severity, Severity::Warning);
    assert!(!report.has_failures());
    assert!(read(tmp.path(), "models/broker.go").contains("(unresolved)"));
}

#[test]
fn reordered_files_give_identical_brokers() {
    let a = TempDir::new().unwrap();
    let b = TempDir::new().unwrap();
    let files = [
        ("go.mod", "module shop\n"),
        ("views/a.go", "package views\n\nconst Title = \"a\"\n"),
        ("views/b.go", "package views\n\nimport \"strings\"\n\nvar Upper = strings.ToUpper\n"),
        ("views/c.go", "package views\n\ntype Page struct{}\n"),
    ];
    for (rel, body) in files {
        write(a.path(), rel, body);
    }
    for (rel, body) in files.iter().rev() {
        write(b.path(), rel, body);
    }

    run(a.path());
    run(b.path());
    assert_eq!(
        read(a.path(), "views/broker.go"),
        read(b.path(), "views/broker.go")
    );
}

#[test]
fn run_never_touches_regular_or_generated_files() {
    let tmp = TempDir::new().unwrap();
    shop(tmp.path());
    write(tmp.path(), "models/@.go", "package models\n");
    write(tmp.path(), "models/broker.go", "package models\n// stale\n");

    let before = snapshot_non_brokers(tmp.path());
    run(tmp.path());
    assert_eq!(snapshot_non_brokers(tmp.path()), before);
    assert!(!read(tmp.path(), "models/broker.go").contains("stale"));
}

#[test]
fn parse_failure_stays_inside_its_package() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "go.mod", "module shop\n");
    write(tmp.path(), "alpha/good.go", "package alpha\n\nfunc Good() {}\n");
    write(tmp.path(), "alpha/bad.go", "package alpha\n\nfunc {\n");
    write(tmp.path(), "beta/b.go", "package beta\n\ntype B int\n");

    let report = run(tmp.path());
    assert!(report.has_failures());

    let alpha = &report.outcomes[0];
    assert_eq!(alpha.directory, "alpha");
    assert!(
        alpha
            .diagnostics
            .iter()
            .any(|d| d.kind == ErrorKind::ParseFailure && d.unit == "alpha/bad.go")
    );
    let alpha_broker = read(tmp.path(), "alpha/broker.go");
    assert!(alpha_broker.contains("func Good"));

    assert_eq!(
        report.outcomes[1].status,
        PackageStatus::Synthesized {
            broker: "beta/broker.go".into()
        }
    );
    assert!(read(tmp.path(), "beta/broker.go").contains("type B"));
}

#[test]
fn package_with_only_broken_files_fails_without_broker() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "go.mod", "module shop\n");
    write(tmp.path(), "broken/x.go", "not go at all\n");

    let report = run(tmp.path());
    assert_eq!(report.outcomes[0].status, PackageStatus::Failed);
    assert!(!tmp.path().join("broken/broker.go").exists());
}

#[test]
fn scaffold_then_run_round_trips() {
    let tmp = TempDir::new().unwrap();
    let markers = Markers::default();
    let scaffold = ScaffoldService::new(
        Box::new(LocalFilesystem::new()),
        ScaffoldManifest::standard(&markers).unwrap(),
    );

    let summary = scaffold.scaffold("myapp", tmp.path()).unwrap();
    let root = summary.root.clone();
    assert!(root.join("models/@.go").is_file());
    assert_eq!(read(&root, "models/user.go"), "package models\n");
    assert_eq!(read(&root, "go.mod"), "module myapp\n");
    assert!(root.join("brokers").is_dir());

    let report = run(&root);
    assert!(!report.has_failures());
    let dirs: Vec<&str> = report.outcomes.iter().map(|o| o.directory.as_str()).collect();
    assert_eq!(dirs, vec![".", "controllers", "models", "routers", "views"]);

    let models = read(&root, "models/broker.go");
    assert!(models.contains("// Definitions:\n//\t(none)\n"));
    assert!(models.contains("// Uses:\n//\t(none)\n"));

    let again = scaffold.scaffold("myapp", tmp.path()).unwrap();
    assert!(again.is_noop());
}

#[test]
fn scaffold_reports_conflict_and_leaves_it_alone() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "myapp/models", "not a directory\n");

    let scaffold = ScaffoldService::new(
        Box::new(LocalFilesystem::new()),
        ScaffoldManifest::standard(&Markers::default()).unwrap(),
    );
    let err = scaffold.scaffold("myapp", tmp.path()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConflictFailure);
    assert_eq!(read(tmp.path(), "myapp/models"), "not a directory\n");
    assert!(!tmp.path().join("myapp/main.go").exists());
}

#[test]
fn suffix_markers_keep_lookalike_names_regular() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "go.mod", "module shop\n");
    write(
        tmp.path(),
        "svc/mybroker_helper.go",
        "package svc\n\nfunc Help() {}\n",
    );

    let substring = run(tmp.path());
    assert!(substring.outcomes.is_empty());

    let suffix = Markers::new("@", "broker", MarkerMatching::Suffix).unwrap();
    let report = run_with(tmp.path(), suffix);
    assert_eq!(report.synthesized_count(), 1);
    assert!(read(tmp.path(), "svc/broker.go").contains("func Help"));
    assert!(read(tmp.path(), "svc/mybroker_helper.go").starts_with("package svc"));
}

#[test]
fn standard_library_generator_files_do_not_hide_uses() {
    let goroot = TempDir::new().unwrap();
    write(
        goroot.path(),
        "src/sort/gen_sort_variants.go",
        "//go:build ignore\n\npackage main\n\nfunc main() {}\n",
    );
    write(goroot.path(), "src/sort/sort.go", "package sort\n\nfunc Ints(x []int) {}\n");

    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "go.mod", "module shop\n");
    write(
        tmp.path(),
        "models/user.go",
        "package models\n\nimport \"sort\"\n\nfunc Order() { sort.Ints(nil) }\n",
    );

    let config = ResolverConfig::new(Vec::new(), Some(goroot.path().to_path_buf()));
    let report = run_configured(tmp.path(), Markers::default(), config);
    assert!(report.outcomes[0].diagnostics.is_empty());

    let broker = read(tmp.path(), "models/broker.go");
    assert!(broker.contains("//\tsort \"sort\"\n//\t\tsort.Ints at user.go:5:21\n"));
    assert!(!broker.contains("(unresolved)"));
}

#[test]
fn hand_written_broker_lookalike_is_never_overwritten() {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "go.mod", "module shop\n");
    write(tmp.path(), "svc/s.go", "package svc\n\nfunc Serve() {}\n");
    write(tmp.path(), "svc/mybroker_helper.go", "package svc\n\nfunc Help() {}\n");
    write(tmp.path(), "api/a.go", "package api\n\nfunc Get() {}\n");
    write(
        tmp.path(),
        "api/api_broker.go",
        "// Code generated by gibran. DO NOT EDIT.\n\npackage api\n",
    );

    let report = run(tmp.path());
    assert_eq!(report.synthesized_count(), 2);

    assert_eq!(
        read(tmp.path(), "svc/mybroker_helper.go"),
        "package svc\n\nfunc Help() {}\n"
    );
    assert!(read(tmp.path(), "svc/broker.go").contains("func Serve"));

    assert!(read(tmp.path(), "api/api_broker.go").contains("func Get"));
    assert!(!tmp.path().join("api/broker.go").exists());
}
