//! Import resolver that locates Go packages on disk.
//!
//! Lookup order for an import path:
//! 1. a search path whose `go.mod` declares a module prefix of the import
//! 2. `<search path>/src/<import>` then `<search path>/<import>`
//! 3. `<goroot>/src/<import>`
//!
//! The located package is parsed to learn its name and exported
//! identifiers. Results, failures included, are cached per import path and
//! computed at most once even when workers ask concurrently.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use gibran_core::{
    application::{
        ApplicationError,
        ports::{ImportResolver, SourceParser},
    },
    domain::{
        FileRole, Markers, ResolvedPackage, ResolverConfig, choose_package_name, is_build_ignored,
        parse_module_path,
    },
    error::GibranResult,
};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::parser::GoParser;

type Slot = Arc<OnceLock<Result<Arc<ResolvedPackage>, String>>>;

pub struct CachingResolver {
    config: ResolverConfig,
    markers: Markers,
    parser: GoParser,
    /// Module path declared by each search path, read once up front.
    modules: Vec<(PathBuf, Option<String>)>,
    cache: DashMap<String, Slot>,
}

impl CachingResolver {
    pub fn new(config: ResolverConfig, markers: Markers) -> GibranResult<Self> {
        let modules = config
            .search_paths
            .iter()
            .map(|sp| {
                let module = fs::read_to_string(sp.join("go.mod"))
                    .ok()
                    .and_then(|body| parse_module_path(&body));
                (sp.clone(), module)
            })
            .collect();

        Ok(Self {
            config,
            markers,
            parser: GoParser::new()?,
            modules,
            cache: DashMap::new(),
        })
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Number of import paths looked up so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    fn candidates(&self, import_path: &str) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for (root, module) in &self.modules {
            let Some(module) = module else { continue };
            if import_path == module {
                dirs.push(root.clone());
            } else if let Some(rest) = import_path
                .strip_prefix(module.as_str())
                .and_then(|r| r.strip_prefix('/'))
            {
                dirs.push(root.join(rest));
            }
        }
        for sp in &self.config.search_paths {
            dirs.push(sp.join("src").join(import_path));
            dirs.push(sp.join(import_path));
        }
        if let Some(goroot) = &self.config.goroot {
            dirs.push(goroot.join("src").join(import_path));
        }
        dirs
    }

    fn locate(&self, import_path: &str) -> Result<Arc<ResolvedPackage>, String> {
        if import_path.is_empty() || import_path.starts_with('.') || import_path.starts_with('/') {
            return Err("relative and absolute import paths are not supported".into());
        }

        for dir in self.candidates(import_path) {
            trace!(dir = %dir.display(), "Probing");
            if let Some(package) = self.load(import_path, &dir)? {
                debug!(import = import_path, dir = %dir.display(), name = %package.name, "Resolved");
                return Ok(Arc::new(package));
            }
        }
        Err("package not found in any search path".into())
    }

    /// Parse the Regular files of `dir`.
    ///
    /// `Ok(None)` means the directory holds no Go package.
    fn load(&self, import_path: &str, dir: &Path) -> Result<Option<ResolvedPackage>, String> {
        if !dir.is_dir() {
            return Ok(None);
        }

        let mut parsed_files = Vec::new();
        let mut seen = 0usize;

        let listing = WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name();
        for entry in listing.into_iter().filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let file_name = entry.file_name().to_string_lossy();
            if self.markers.classify(&file_name) != Some(FileRole::Regular) {
                continue;
            }

            let src = match fs::read_to_string(entry.path()) {
                Ok(src) => src,
                Err(e) => {
                    debug!(file = %entry.path().display(), error = %e, "Skipping unreadable file");
                    seen += 1;
                    continue;
                }
            };
            if is_build_ignored(&src) {
                trace!(file = %entry.path().display(), "Excluded by build constraint");
                continue;
            }
            seen += 1;

            match self.parser.parse(&file_name, &src) {
                Ok(parsed) => parsed_files.push(parsed),
                Err(e) => {
                    debug!(file = %entry.path().display(), reason = %e.detail(), "Skipping unparsable file");
                }
            }
        }

        let Some(name) = choose_package_name(parsed_files.iter().map(|f| f.package_name.as_str()))
            .map(str::to_string)
        else {
            return if seen > 0 {
                Err(format!("no file of {} could be parsed", dir.display()))
            } else {
                Ok(None)
            };
        };
        if name == "main" {
            return Err(format!("{} holds a main package, which is not importable", dir.display()));
        }

        let exports: BTreeSet<String> = parsed_files
            .iter()
            .filter(|f| f.package_name == name)
            .flat_map(|f| f.definitions.iter())
            .filter(|d| d.is_package_scope() && d.is_exported())
            .map(|d| d.name.clone())
            .collect();

        Ok(Some(ResolvedPackage {
            import_path: import_path.to_string(),
            name,
            exports,
        }))
    }
}

impl ImportResolver for CachingResolver {
    fn resolve(&self, import_path: &str) -> GibranResult<Arc<ResolvedPackage>> {
        let slot: Slot = self
            .cache
            .entry(import_path.to_string())
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .clone();

        slot.get_or_init(|| self.locate(import_path))
            .clone()
            .map_err(|reason| {
                ApplicationError::UnresolvedImport {
                    import_path: import_path.to_string(),
                    reason,
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn resolver(search: &[&Path], goroot: Option<&Path>) -> CachingResolver {
        let config = ResolverConfig::new(
            search.iter().map(|p| p.to_path_buf()).collect(),
            goroot.map(Path::to_path_buf),
        );
        CachingResolver::new(config, Markers::default()).unwrap()
    }

    #[test]
    fn resolves_standard_library_under_goroot() {
        let goroot = TempDir::new().unwrap();
        write(
            goroot.path(),
            "src/fmt/print.go",
            "package fmt\n\nfunc Println(a ...any) {}\nfunc newPrinter() {}\n",
        );

        let r = resolver(&[], Some(goroot.path()));
        let fmt = r.resolve("fmt").unwrap();
        assert_eq!(fmt.name, "fmt");
        assert!(fmt.exports("Println"));
        assert!(!fmt.exports("newPrinter"));
    }

    #[test]
    fn module_prefix_maps_into_project_root() {
        let project = TempDir::new().unwrap();
        write(project.path(), "go.mod", "module example.com/shop\n");
        write(
            project.path(),
            "models/user.go",
            "package models\n\ntype User struct{}\n\nfunc (u User) Save() {}\n",
        );

        let r = resolver(&[project.path()], None);
        let models = r.resolve("example.com/shop/models").unwrap();
        assert_eq!(models.name, "models");
        assert!(models.exports("User"));
        assert!(!models.exports("Save"));
    }

    #[test]
    fn package_name_may_differ_from_directory() {
        let gopath = TempDir::new().unwrap();
        write(
            gopath.path(),
            "src/github.com/x/go-yaml/yaml.go",
            "package yaml\n\nfunc Marshal() {}\n",
        );

        let r = resolver(&[gopath.path()], None);
        assert_eq!(r.resolve("github.com/x/go-yaml").unwrap().name, "yaml");
    }

    #[test]
    fn broker_and_generated_files_do_not_contribute_exports() {
        let goroot = TempDir::new().unwrap();
        write(goroot.path(), "src/lib/lib.go", "package lib\n\nfunc A() {}\n");
        write(goroot.path(), "src/lib/broker.go", "package lib\n\nfunc B() {}\n");
        write(goroot.path(), "src/lib/@.go", "package lib\n\nfunc C() {}\n");

        let lib = resolver(&[], Some(goroot.path())).resolve("lib").unwrap();
        assert_eq!(lib.exports.iter().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn ignore_constrained_generator_does_not_rename_the_package() {
        let goroot = TempDir::new().unwrap();
        write(
            goroot.path(),
            "src/sort/gen_sort_variants.go",
            "//go:build ignore\n\npackage main\n\nfunc Generate() {}\n",
        );
        write(goroot.path(), "src/sort/sort.go", "package sort\n\nfunc Ints(x []int) {}\n");

        let sort = resolver(&[], Some(goroot.path())).resolve("sort").unwrap();
        assert_eq!(sort.name, "sort");
        assert!(sort.exports("Ints"));
        assert!(!sort.exports("Generate"));
    }

    #[test]
    fn stray_main_file_yields_to_the_library_name() {
        let goroot = TempDir::new().unwrap();
        write(goroot.path(), "src/lib/a_tool.go", "package main\n\nfunc Tool() {}\n");
        write(goroot.path(), "src/lib/lib.go", "package lib\n\nfunc A() {}\n");

        let lib = resolver(&[], Some(goroot.path())).resolve("lib").unwrap();
        assert_eq!(lib.name, "lib");
        assert_eq!(lib.exports.iter().collect::<Vec<_>>(), vec!["A"]);
    }

    #[test]
    fn main_package_is_not_importable() {
        let goroot = TempDir::new().unwrap();
        write(goroot.path(), "src/cmd/tool/main.go", "package main\n\nfunc Run() {}\n");

        let err = resolver(&[], Some(goroot.path())).resolve("cmd/tool").unwrap_err();
        assert_eq!(err.kind(), gibran_core::domain::ErrorKind::UnresolvedImport);
        assert!(err.detail().contains("main package"));
    }

    #[test]
    fn missing_package_is_unresolved() {
        let err = resolver(&[], None).resolve("nowhere/pkg").unwrap_err();
        assert_eq!(
            err.kind(),
            gibran_core::domain::ErrorKind::UnresolvedImport
        );
    }

    #[test]
    fn lookups_are_cached_across_threads() {
        let goroot = TempDir::new().unwrap();
        write(goroot.path(), "src/strings/s.go", "package strings\n\nfunc Trim() {}\n");
        let r = resolver(&[], Some(goroot.path()));

        let first: Vec<_> = (0..16)
            .into_par_iter()
            .map(|_| r.resolve("strings").unwrap())
            .collect();
        assert!(first.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(r.cached(), 1);

        fs::remove_dir_all(goroot.path().join("src/strings")).unwrap();
        assert!(r.resolve("strings").is_ok());
    }
}
