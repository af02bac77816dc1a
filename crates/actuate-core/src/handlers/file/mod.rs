//! Handler for the `file` kind.
//!
//! All filesystem work runs on tokio's blocking pool. Reads and listings
//! race that work against the caller's cancellation token; writes and
//! deletes run to completion once started so their reported outcome always
//! matches what happened on disk.

mod confine;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::dispatch::{
    ActionError, DISPATCH_TARGET, FileMethod, ListEntry, ParamSchema, ParamShape, ParamSpec,
    Parameters, Payload,
};

pub use self::confine::{ConfinedRoot, RootError};

pub(crate) const PATH: &str = "path";
pub(crate) const CONTENTS: &str = "contents";
pub(crate) const RECURSIVE: &str = "recursive";

static READ_PARAMS: [ParamSpec; 1] = [ParamSpec::required(PATH, ParamShape::Path)];
static WRITE_PARAMS: [ParamSpec; 2] = [
    ParamSpec::required(PATH, ParamShape::Path),
    ParamSpec::required(CONTENTS, ParamShape::Bytes),
];
static LIST_PARAMS: [ParamSpec; 2] = [
    ParamSpec::required(PATH, ParamShape::Path),
    ParamSpec::optional(RECURSIVE, ParamShape::Bool),
];

/// Parameters of `file READ`.
pub(crate) static READ_SCHEMA: ParamSchema = ParamSchema::new(&READ_PARAMS);
/// Parameters of `file WRITE`.
pub(crate) static WRITE_SCHEMA: ParamSchema = ParamSchema::new(&WRITE_PARAMS);
/// Parameters of `file DELETE`.
pub(crate) static DELETE_SCHEMA: ParamSchema = ParamSchema::new(&READ_PARAMS);
/// Parameters of `file LIST`.
pub(crate) static LIST_SCHEMA: ParamSchema = ParamSchema::new(&LIST_PARAMS);

/// Executes file actions below a confinement root.
#[derive(Debug, Clone)]
pub struct FileHandler {
    root: Arc<ConfinedRoot>,
}

impl FileHandler {
    /// Creates a handler confined to `root`.
    pub fn new(root: ConfinedRoot) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    /// Confinement root.
    pub fn root(&self) -> &ConfinedRoot {
        &self.root
    }

    /// Runs `method` with validated `params`.
    ///
    /// # Errors
    ///
    /// Returns confinement, filesystem, and cancellation errors as
    /// [`ActionError`] values.
    pub async fn execute(
        &self,
        method: FileMethod,
        mut params: Parameters,
        cancel: &CancellationToken,
    ) -> Result<Payload, ActionError> {
        let path = params.text(PATH)?.to_owned();
        let root = Arc::clone(&self.root);
        debug!(target: DISPATCH_TARGET, ?method, path = %path, "running file action");
        match method {
            FileMethod::Read => run_cancellable(cancel, move || read(&root, &path)).await,
            FileMethod::Write => {
                let contents = params.take_bytes(CONTENTS)?;
                run_to_completion(move || write(&root, &path, &contents)).await
            }
            FileMethod::Delete => run_to_completion(move || delete(&root, &path)).await,
            FileMethod::List => {
                let recursive = params.flag(RECURSIVE);
                run_cancellable(cancel, move || list(&root, &path, recursive)).await
            }
        }
    }
}

async fn run_cancellable<F>(cancel: &CancellationToken, work: F) -> Result<Payload, ActionError>
where
    F: FnOnce() -> Result<Payload, ActionError> + Send + 'static,
{
    let worker = tokio::task::spawn_blocking(work);
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ActionError::Cancelled),
        joined = worker => flatten(joined),
    }
}

async fn run_to_completion<F>(work: F) -> Result<Payload, ActionError>
where
    F: FnOnce() -> Result<Payload, ActionError> + Send + 'static,
{
    flatten(tokio::task::spawn_blocking(work).await)
}

fn flatten(
    joined: Result<Result<Payload, ActionError>, tokio::task::JoinError>,
) -> Result<Payload, ActionError> {
    joined.map_err(ActionError::from_join)?
}

fn read(root: &ConfinedRoot, path: &str) -> Result<Payload, ActionError> {
    let resolved = root.resolve(path)?;
    let metadata = fs::metadata(&resolved).map_err(|error| ActionError::from_io(path, &error))?;
    if !metadata.is_file() {
        return Err(ActionError::is_a_directory(path));
    }
    let bytes = fs::read(&resolved).map_err(|error| ActionError::from_io(path, &error))?;
    Ok(Payload::Bytes(bytes))
}

fn write(root: &ConfinedRoot, path: &str, contents: &[u8]) -> Result<Payload, ActionError> {
    let resolved = root.resolve(path)?;
    if resolved.is_dir() {
        return Err(ActionError::is_a_directory(path));
    }
    if let Some(parent) = resolved.parent() {
        fs::create_dir_all(parent).map_err(|error| match error.kind() {
            io::ErrorKind::AlreadyExists => {
                ActionError::not_found_because(path, "a parent component is not a directory")
            }
            _ => ActionError::from_io(path, &error),
        })?;
    }
    fs::write(&resolved, contents).map_err(|error| ActionError::from_io(path, &error))?;
    Ok(Payload::Ack)
}

fn delete(root: &ConfinedRoot, path: &str) -> Result<Payload, ActionError> {
    let resolved = root.resolve_entry(path)?;
    let metadata =
        fs::symlink_metadata(&resolved).map_err(|error| ActionError::from_io(path, &error))?;
    if metadata.is_dir() {
        return Err(ActionError::is_a_directory(path));
    }
    fs::remove_file(&resolved).map_err(|error| ActionError::from_io(path, &error))?;
    Ok(Payload::Ack)
}

fn list(root: &ConfinedRoot, path: &str, recursive: bool) -> Result<Payload, ActionError> {
    let resolved = root.resolve(path)?;
    let metadata = fs::metadata(&resolved).map_err(|error| ActionError::from_io(path, &error))?;
    if !metadata.is_dir() {
        return Err(ActionError::not_found_because(path, "not a directory"));
    }

    let mut entries = Vec::new();
    let mut pending: Vec<PathBuf> = vec![resolved];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir).map_err(|error| ActionError::from_io(path, &error))? {
            let entry = entry.map_err(|error| ActionError::from_io(path, &error))?;
            // Does not follow symlinks, so linked directories are never descended.
            let metadata = entry
                .metadata()
                .map_err(|error| ActionError::from_io(path, &error))?;
            let entry_path = entry.path();
            if recursive && metadata.is_dir() {
                pending.push(entry_path.clone());
            }
            entries.push(list_entry(root, &entry_path, &metadata)?);
        }
    }
    entries.sort_by(|left, right| left.path.cmp(&right.path));
    Ok(Payload::Entries(entries))
}

fn list_entry(
    root: &ConfinedRoot,
    entry_path: &Path,
    metadata: &fs::Metadata,
) -> Result<ListEntry, ActionError> {
    let relative = root.relative(entry_path).ok_or_else(|| {
        ActionError::internal(format!(
            "listed entry '{}' is outside the root",
            entry_path.display()
        ))
    })?;
    let name = entry_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let last_modified = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .and_then(|elapsed| u64::try_from(elapsed.as_micros()).ok());
    Ok(ListEntry {
        path: relative,
        name,
        is_dir: metadata.is_dir(),
        size: if metadata.is_dir() { 0 } else { metadata.len() },
        last_modified,
    })
}
