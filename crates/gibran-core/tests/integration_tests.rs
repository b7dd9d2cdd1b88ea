//! Integration tests for gibran-core, against an in-test filesystem.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use gibran_core::application::ApplicationError;
use gibran_core::domain::{
    BrokerView, DefinitionKind, DefinitionRecord, ErrorKind, ImportRecord, PackageRecord,
    Position,
};
use gibran_core::prelude::*;

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Dir,
    File(String),
}

#[derive(Default)]
struct MapFs(Mutex<BTreeMap<PathBuf, Node>>);

impl MapFs {
    fn with_dir(path: &str) -> Self {
        let fs = Self::default();
        fs.0.lock().unwrap().insert(PathBuf::from(path), Node::Dir);
        fs
    }
}

impl Filesystem for MapFs {
    fn entry_kind(&self, path: &Path) -> GibranResult<Option<EntryKind>> {
        Ok(self.0.lock().unwrap().get(path).map(|n| match n {
            Node::Dir => EntryKind::Directory,
            Node::File(_) => EntryKind::File,
        }))
    }

    fn create_dir(&self, path: &Path) -> GibranResult<()> {
        self.0.lock().unwrap().insert(path.to_path_buf(), Node::Dir);
        Ok(())
    }

    fn create_file(&self, path: &Path, content: &str) -> GibranResult<()> {
        let mut map = self.0.lock().unwrap();
        if map.contains_key(path) {
            return Err(ApplicationError::FilesystemError {
                path: path.to_path_buf(),
                reason: "exists".into(),
            }
            .into());
        }
        map.insert(path.to_path_buf(), Node::File(content.to_string()));
        Ok(())
    }

    fn read_to_string(&self, path: &Path) -> GibranResult<String> {
        match self.0.lock().unwrap().get(path) {
            Some(Node::File(c)) => Ok(c.clone()),
            _ => Err(ApplicationError::NotFound {
                path: path.to_path_buf(),
            }
            .into()),
        }
    }

    fn write_atomic(&self, path: &Path, content: &str) -> GibranResult<()> {
        self.0
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), Node::File(content.to_string()));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> GibranResult<()> {
        self.0.lock().unwrap().remove(path);
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> GibranResult<()> {
        self.0.lock().unwrap().remove(path);
        Ok(())
    }
}

#[test]
fn standard_scaffold_creates_full_layout() {
    let manifest = ScaffoldManifest::standard(&Markers::default()).unwrap();
    let service = ScaffoldService::new(Box::new(MapFs::with_dir("/work")), manifest);

    let first = service.scaffold("shop", Path::new("/work")).unwrap();
    assert_eq!(first.root, PathBuf::from("/work/shop"));
    assert!(first.created.contains(&PathBuf::from("/work/shop/models/user.go")));
    assert!(first.created.contains(&PathBuf::from("/work/shop/brokers")));
    assert!(first.existing.is_empty());
}

#[test]
fn scaffold_twice_on_shared_filesystem_creates_nothing_new() {
    use std::sync::Arc;

    struct Shared(Arc<MapFs>);
    impl Filesystem for Shared {
        fn entry_kind(&self, p: &Path) -> GibranResult<Option<EntryKind>> {
            self.0.entry_kind(p)
        }
        fn create_dir(&self, p: &Path) -> GibranResult<()> {
            self.0.create_dir(p)
        }
        fn create_file(&self, p: &Path, c: &str) -> GibranResult<()> {
            self.0.create_file(p, c)
        }
        fn read_to_string(&self, p: &Path) -> GibranResult<String> {
            self.0.read_to_string(p)
        }
        fn write_atomic(&self, p: &Path, c: &str) -> GibranResult<()> {
            self.0.write_atomic(p, c)
        }
        fn remove_file(&self, p: &Path) -> GibranResult<()> {
            self.0.remove_file(p)
        }
        fn remove_dir(&self, p: &Path) -> GibranResult<()> {
            self.0.remove_dir(p)
        }
    }

    let fs = Arc::new(MapFs::with_dir("/work"));
    let manifest = ScaffoldManifest::standard(&Markers::default()).unwrap();

    let first = ScaffoldService::new(Box::new(Shared(Arc::clone(&fs))), manifest.clone())
        .scaffold("shop", Path::new("/work"))
        .unwrap();
    fs.write_atomic(Path::new("/work/shop/models/user.go"), "package models\n\ntype User struct{}\n")
        .unwrap();

    let second = ScaffoldService::new(Box::new(Shared(Arc::clone(&fs))), manifest)
        .scaffold("shop", Path::new("/work"))
        .unwrap();

    assert!(second.is_noop());
    assert_eq!(second.existing.len(), first.created.len() - 1);
    assert_eq!(
        fs.read_to_string(Path::new("/work/shop/models/user.go")).unwrap(),
        "package models\n\ntype User struct{}\n"
    );
}

#[test]
fn conflicting_file_is_reported_not_overwritten() {
    let fs = MapFs::with_dir("/work");
    fs.create_dir(Path::new("/work/shop")).unwrap();
    fs.create_file(Path::new("/work/shop/models"), "notes").unwrap();

    let manifest = ScaffoldManifest::standard(&Markers::default()).unwrap();
    let service = ScaffoldService::new(Box::new(fs), manifest);
    let err = service.scaffold("shop", Path::new("/work")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConflictFailure);
}

#[test]
fn broker_view_is_stable_for_reordered_input() {
    let a = ImportRecord::new("fmt", None, Position::new("a.go", 3, 8));
    let b = ImportRecord::new("os", None, Position::new("b.go", 3, 8));
    let d1 = DefinitionRecord::new("User", DefinitionKind::Type, Position::new("a.go", 5, 6));
    let d2 = DefinitionRecord::new("Save", DefinitionKind::Func, Position::new("b.go", 5, 6));

    let forward = PackageRecord::new(
        "models",
        "shop/models",
        "models",
        vec![a.clone(), b.clone()],
        vec![d1.clone(), d2.clone()],
        vec![],
        vec![],
    );
    let reversed = PackageRecord::new(
        "models",
        "shop/models",
        "models",
        vec![b, a],
        vec![d2, d1],
        vec![],
        vec![],
    );

    assert_eq!(
        BrokerView::from_record(&forward),
        BrokerView::from_record(&reversed)
    );
}
