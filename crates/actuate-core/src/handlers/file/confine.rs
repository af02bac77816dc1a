//! Path confinement for file actions.
//!
//! Every requested path is resolved against a canonical root directory in
//! two stages. First the joined path is normalised lexically and must stay
//! below the root, so `..` traversal is rejected whether or not the target
//! exists. Then the deepest existing ancestor is canonicalised, resolving
//! symlinks, and the result must still be below the root. Dangling symlinks
//! are followed by hand so a link to a not-yet-existing file outside the root
//! cannot be used to create it.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::dispatch::ActionError;

/// Upper bound on dangling symlinks followed during one resolution.
const MAX_SYMLINK_HOPS: usize = 40;

/// Errors raised while opening the confinement root.
#[derive(Debug, Clone, Error)]
pub enum RootError {
    /// The root could not be canonicalised.
    #[error("root directory '{path}' is unavailable: {source}")]
    Unavailable {
        path: String,
        #[source]
        source: Arc<io::Error>,
    },

    /// The root exists but is not a directory.
    #[error("root '{path}' is not a directory")]
    NotDirectory { path: String },
}

/// A canonical directory that file actions may not leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfinedRoot {
    root: PathBuf,
}

impl ConfinedRoot {
    /// Canonicalises `path` and uses it as the root.
    ///
    /// # Errors
    ///
    /// Returns [`RootError::Unavailable`] when the path cannot be resolved
    /// and [`RootError::NotDirectory`] when it is not a directory.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, RootError> {
        let path = path.as_ref();
        let root = path.canonicalize().map_err(|source| RootError::Unavailable {
            path: path.display().to_string(),
            source: Arc::new(source),
        })?;
        if !root.is_dir() {
            return Err(RootError::NotDirectory {
                path: root.display().to_string(),
            });
        }
        Ok(Self { root })
    }

    /// Canonical root directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves `requested`, following symlinks in every component.
    ///
    /// # Errors
    ///
    /// Returns `PathEscapesRoot` when the path leaves the root lexically or
    /// through a symlink. Filesystem errors met while probing ancestors are
    /// classified with [`ActionError::from_io`].
    pub fn resolve(&self, requested: &str) -> Result<PathBuf, ActionError> {
        let lexical = self.confine_lexically(requested)?;
        self.resolve_existing(requested, &lexical, 0)
    }

    /// Resolves `requested` without following a symlink in the final
    /// component, so the link itself can be acted on.
    ///
    /// # Errors
    ///
    /// Same as [`ConfinedRoot::resolve`].
    pub fn resolve_entry(&self, requested: &str) -> Result<PathBuf, ActionError> {
        let lexical = self.confine_lexically(requested)?;
        let (Some(parent), Some(name)) = (lexical.parent(), lexical.file_name()) else {
            return Ok(self.root.clone());
        };
        if lexical == self.root {
            return Ok(self.root.clone());
        }
        let parent = self.resolve_existing(requested, parent, 0)?;
        Ok(parent.join(name))
    }

    /// Renders `path` relative to the root with `/` separators.
    pub fn relative(&self, path: &Path) -> Option<String> {
        let suffix = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<String> = suffix
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        Some(parts.join("/"))
    }

    fn confine_lexically(&self, requested: &str) -> Result<PathBuf, ActionError> {
        let joined = normalize(&self.root.join(requested));
        if joined.starts_with(&self.root) {
            Ok(joined)
        } else {
            Err(ActionError::path_escapes_root(requested))
        }
    }

    fn resolve_existing(
        &self,
        requested: &str,
        path: &Path,
        hops: usize,
    ) -> Result<PathBuf, ActionError> {
        let (existing, metadata) = deepest_existing(requested, path)?;
        let suffix = path
            .strip_prefix(&existing)
            .map_err(|_| ActionError::internal(format!("'{requested}': ancestor walk failed")))?
            .to_path_buf();

        let canonical = match fs::canonicalize(&existing) {
            Ok(canonical) => canonical,
            Err(error) if metadata.is_symlink() && error.kind() == io::ErrorKind::NotFound => {
                return self.follow_dangling(requested, &existing, &suffix, hops);
            }
            Err(error) => return Err(ActionError::from_io(requested, &error)),
        };
        if !canonical.starts_with(&self.root) {
            return Err(ActionError::path_escapes_root(requested));
        }

        let resolved = normalize(&canonical.join(suffix));
        if resolved.starts_with(&self.root) {
            Ok(resolved)
        } else {
            Err(ActionError::path_escapes_root(requested))
        }
    }

    fn follow_dangling(
        &self,
        requested: &str,
        link: &Path,
        suffix: &Path,
        hops: usize,
    ) -> Result<PathBuf, ActionError> {
        if hops >= MAX_SYMLINK_HOPS {
            return Err(ActionError::not_found_because(
                requested,
                "too many levels of symbolic links",
            ));
        }
        let target = fs::read_link(link).map_err(|error| ActionError::from_io(requested, &error))?;
        let parent = link.parent().unwrap_or(&self.root);
        let parent = fs::canonicalize(parent).map_err(|error| ActionError::from_io(requested, &error))?;
        let next = normalize(&parent.join(target).join(suffix));
        if !next.starts_with(&self.root) {
            return Err(ActionError::path_escapes_root(requested));
        }
        self.resolve_existing(requested, &next, hops + 1)
    }
}

/// Finds the deepest ancestor of `path` (including itself) that exists,
/// without following a symlink in that ancestor's final component.
fn deepest_existing(requested: &str, path: &Path) -> Result<(PathBuf, fs::Metadata), ActionError> {
    for ancestor in path.ancestors() {
        match fs::symlink_metadata(ancestor) {
            Ok(metadata) => return Ok((ancestor.to_path_buf(), metadata)),
            Err(error)
                if matches!(
                    error.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) => {}
            Err(error) => return Err(ActionError::from_io(requested, &error)),
        }
    }
    Err(ActionError::not_found(requested))
}

/// Lexically normalises `path`, dropping `.` and folding `..` into its
/// parent. `..` at the filesystem root is discarded.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    use super::*;
    use crate::ErrorKind;

    struct Sandbox {
        _dir: TempDir,
        root: ConfinedRoot,
    }

    #[fixture]
    fn sandbox() -> Sandbox {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir(dir.path().join("sub")).expect("create sub");
        fs::write(dir.path().join("sub/a.txt"), b"a").expect("write a");
        let root = ConfinedRoot::new(dir.path()).expect("root");
        Sandbox { _dir: dir, root }
    }

    #[rstest]
    #[case::plain("sub/a.txt", "sub/a.txt")]
    #[case::dot("./sub/./a.txt", "sub/a.txt")]
    #[case::inner_parent("sub/../sub/a.txt", "sub/a.txt")]
    #[case::missing("sub/new/b.txt", "sub/new/b.txt")]
    fn resolves_inside_root(sandbox: Sandbox, #[case] requested: &str, #[case] expected: &str) {
        let resolved = sandbox.root.resolve(requested).expect("resolve");
        assert_eq!(resolved, sandbox.root.path().join(expected));
    }

    #[rstest]
    #[case::parent("../outside.txt")]
    #[case::deep_parent("sub/../../outside.txt")]
    #[case::absolute("/etc/passwd")]
    fn rejects_lexical_escapes(sandbox: Sandbox, #[case] requested: &str) {
        let error = sandbox.root.resolve(requested).expect_err("escape");
        assert_eq!(error.kind(), ErrorKind::PathEscapesRoot);
    }

    #[rstest]
    fn absolute_path_inside_root_is_accepted(sandbox: Sandbox) {
        let inside = sandbox.root.path().join("sub/a.txt");
        let resolved = sandbox
            .root
            .resolve(inside.to_str().expect("utf8 path"))
            .expect("resolve");
        assert_eq!(resolved, inside);
    }

    #[rstest]
    fn dot_resolves_to_root(sandbox: Sandbox) {
        assert_eq!(sandbox.root.resolve(".").expect("resolve"), sandbox.root.path());
        assert_eq!(
            sandbox.root.resolve_entry(".").expect("resolve"),
            sandbox.root.path()
        );
    }

    #[test]
    fn root_must_exist() {
        let error = ConfinedRoot::new("/nonexistent/actuate-root").expect_err("missing root");
        assert!(matches!(error, RootError::Unavailable { .. }));
    }

    #[test]
    fn root_must_be_directory() {
        let dir = TempDir::new().expect("temp dir");
        let file = dir.path().join("file.txt");
        fs::write(&file, b"x").expect("write file");
        let error = ConfinedRoot::new(&file).expect_err("file root");
        assert!(matches!(error, RootError::NotDirectory { .. }));
    }

    #[rstest]
    fn relative_uses_forward_slashes(sandbox: Sandbox) {
        let path = sandbox.root.path().join("sub").join("a.txt");
        assert_eq!(sandbox.root.relative(&path).as_deref(), Some("sub/a.txt"));
        assert_eq!(sandbox.root.relative(Path::new("/elsewhere")), None);
    }

    #[cfg(unix)]
    mod symlinks {
        use std::os::unix::fs::symlink;

        use super::*;

        #[rstest]
        fn rejects_symlinked_directory_escape(sandbox: Sandbox) {
            let outside = TempDir::new().expect("outside dir");
            fs::write(outside.path().join("secret.txt"), b"s").expect("write secret");
            symlink(outside.path(), sandbox.root.path().join("link")).expect("symlink");

            let error = sandbox.root.resolve("link/secret.txt").expect_err("escape");
            assert_eq!(error.kind(), ErrorKind::PathEscapesRoot);
        }

        #[rstest]
        fn rejects_dangling_symlink_escape(sandbox: Sandbox) {
            let outside = TempDir::new().expect("outside dir");
            symlink(
                outside.path().join("not-yet.txt"),
                sandbox.root.path().join("dangling"),
            )
            .expect("symlink");

            let error = sandbox.root.resolve("dangling").expect_err("escape");
            assert_eq!(error.kind(), ErrorKind::PathEscapesRoot);
        }

        #[rstest]
        fn follows_dangling_symlink_inside_root(sandbox: Sandbox) {
            symlink("sub/later.txt", sandbox.root.path().join("pending")).expect("symlink");
            let resolved = sandbox.root.resolve("pending").expect("resolve");
            assert_eq!(resolved, sandbox.root.path().join("sub/later.txt"));
        }

        #[rstest]
        fn bounded_symlink_loops(sandbox: Sandbox) {
            symlink("loop-b", sandbox.root.path().join("loop-a")).expect("symlink a");
            symlink("loop-a", sandbox.root.path().join("loop-b")).expect("symlink b");
            let error = sandbox.root.resolve("loop-a").expect_err("loop");
            assert_ne!(error.kind(), ErrorKind::PathEscapesRoot);
        }

        #[rstest]
        fn resolve_entry_keeps_final_symlink(sandbox: Sandbox) {
            let outside = TempDir::new().expect("outside dir");
            symlink(outside.path(), sandbox.root.path().join("link")).expect("symlink");
            let resolved = sandbox.root.resolve_entry("link").expect("resolve entry");
            assert_eq!(resolved, sandbox.root.path().join("link"));
        }
    }
}
