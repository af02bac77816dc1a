//! Fixtures shared by the dispatch behaviour suites.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use actuate_config::Config;
use camino::Utf8PathBuf;
use rstest::fixture;
use tempfile::TempDir;

use crate::dispatch::{
    EncMethod, FileMethod, Kind, KindRegistry, Method, ParamSchema, ParamSpec,
};
use crate::handlers::HandlerRef;
use crate::Dispatcher;

static NO_PARAMS: [ParamSpec; 0] = [];
static EMPTY_SCHEMA: ParamSchema = ParamSchema::new(&NO_PARAMS);

/// A temporary directory tree with a dispatcher confined to a nested root.
///
/// Layout:
///
/// ```text
/// <tmp>/Cargo.toml
/// <tmp>/outer/root/notes.txt   ("hello")
/// ```
pub struct Sandbox {
    dir: TempDir,
    pub dispatcher: Arc<Dispatcher>,
}

impl Sandbox {
    /// Root the dispatcher is confined to.
    pub fn root(&self) -> PathBuf {
        self.dir.path().join("outer/root")
    }

    /// Path of a file above the root.
    pub fn outside(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn nested_root() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("temp dir");
    let root = dir.path().join("outer/root");
    fs::create_dir_all(&root).expect("create root");
    fs::write(dir.path().join("Cargo.toml"), b"[package]\n").expect("write outside file");
    fs::write(root.join("notes.txt"), b"hello").expect("write notes");
    (dir, root)
}

fn config_for(root: &Path) -> Config {
    Config {
        root: Utf8PathBuf::from_path_buf(root.to_path_buf()).expect("utf8 root"),
        ..Config::default()
    }
}

#[fixture]
pub fn sandbox() -> Sandbox {
    let (dir, root) = nested_root();
    let dispatcher = Dispatcher::new(&config_for(&root)).expect("dispatcher");
    Sandbox {
        dir,
        dispatcher: Arc::new(dispatcher),
    }
}

/// A sandbox whose registry routes every built-in pair to the counting
/// handler, so tests can count handler invocations.
#[fixture]
pub fn counting_sandbox() -> Sandbox {
    let (dir, root) = nested_root();
    let mut builder = KindRegistry::builder();
    for method in [
        Method::File(FileMethod::Read),
        Method::File(FileMethod::Write),
        Method::Enc(EncMethod::Hash),
    ] {
        builder
            .register(method.kind(), method, HandlerRef::Counting, &EMPTY_SCHEMA)
            .expect("register counting handler");
    }
    let registry = Arc::new(builder.build());
    let dispatcher =
        Dispatcher::with_registry(&config_for(&root), registry).expect("counting dispatcher");
    assert!(dispatcher.registry().has_kind(Kind::File));
    Sandbox {
        dir,
        dispatcher: Arc::new(dispatcher),
    }
}
