//! Entry points for parsing Sable sources.
//!
//! Text goes straight to the parser; files are resolved first: symlinks are
//! followed to a final target, and a directory target is read through its
//! conventional `default.sbl`. The containing directory of whatever file is
//! finally read becomes the base directory for relative path literals.

use std::fs;
use std::path::{Path, PathBuf};

use crate::ast::AstNode;
use crate::errors::{io_error, ErrorKind, SableError};
use crate::syntax::parser;

/// The file read when a parse entry point names a directory.
pub const DEFAULT_FILE: &str = "default.sbl";

/// Symlink hops followed before giving up on a cycle.
const MAX_SYMLINK_HOPS: usize = 32;

/// Parses in-memory source text.
///
/// `name` is the logical path label used in diagnostics; `base_dir` anchors
/// relative path literals embedded in the source.
pub fn parse_text(source: &str, name: &str, base_dir: &Path) -> Result<AstNode, SableError> {
    parser::parse(source, name, base_dir)
}

/// Parses the file named by `path`, following symlinks and descending into
/// directories via [`DEFAULT_FILE`].
pub fn parse_file(path: &Path) -> Result<AstNode, SableError> {
    let resolved = resolve_symlinks(path)?;

    let metadata = fs::metadata(&resolved)
        .map_err(|e| fs_error("stat", &resolved, &e.to_string()))?;
    let file = if metadata.is_dir() {
        resolved.join(DEFAULT_FILE)
    } else {
        resolved
    };

    let source = fs::read_to_string(&file)
        .map_err(|e| fs_error("read", &file, &e.to_string()))?;
    let base_dir = file.parent().unwrap_or_else(|| Path::new("."));
    parse_text(&source, &file.display().to_string(), base_dir)
}

/// Follows symlinks iteratively to a final path. Relative link targets are
/// resolved against the link's own directory.
fn resolve_symlinks(path: &Path) -> Result<PathBuf, SableError> {
    let mut current = path.to_path_buf();

    for _ in 0..MAX_SYMLINK_HOPS {
        let metadata = fs::symlink_metadata(&current)
            .map_err(|e| fs_error("stat", &current, &e.to_string()))?;
        if !metadata.file_type().is_symlink() {
            return Ok(current);
        }
        let target = fs::read_link(&current)
            .map_err(|e| fs_error("read symlink", &current, &e.to_string()))?;
        current = if target.is_absolute() {
            target
        } else {
            match current.parent() {
                Some(parent) => parent.join(target),
                None => target,
            }
        };
    }

    let label = path.display().to_string();
    Err(io_error(ErrorKind::SymlinkLoop { path: label.clone() }, &label))
}

fn fs_error(operation: &str, path: &Path, message: &str) -> SableError {
    let label = path.display().to_string();
    io_error(
        ErrorKind::Filesystem {
            operation: operation.to_string(),
            path: label.clone(),
            message: message.to_string(),
        },
        &label,
    )
}
