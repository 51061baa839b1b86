// tests/loader_tests.rs
//
// Entry-driver behavior against a real filesystem: directory defaults,
// symlink chasing, and base-directory anchoring of relative path literals.

use std::fs;

use sable::ast::Expr;
use sable::errors::{ErrorCategory, ErrorKind};
use sable::loader::{parse_file, DEFAULT_FILE};
use tempfile::TempDir;

#[test]
fn parses_a_plain_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("expr.sbl");
    fs::write(&file, "{ a = 1; }").unwrap();

    let ast = parse_file(&file).unwrap();
    assert!(matches!(&*ast, Expr::AttrSet { .. }));
}

#[test]
fn directory_targets_read_the_default_file() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(DEFAULT_FILE), "[ 1 2 3 ]").unwrap();

    let ast = parse_file(dir.path()).unwrap();
    let Expr::List(items, _) = &*ast else {
        panic!("expected a list, got {}", ast.type_name());
    };
    assert_eq!(items.len(), 3);
}

#[test]
fn relative_path_literals_anchor_at_the_containing_directory() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("expr.sbl");
    fs::write(&file, "./lib/util.sbl").unwrap();

    let ast = parse_file(&file).unwrap();
    let Expr::Path(resolved, _) = &*ast else {
        panic!("expected a path literal, got {}", ast.type_name());
    };
    assert_eq!(resolved, &dir.path().join("lib/util.sbl"));
}

#[cfg(unix)]
#[test]
fn symlink_to_a_directory_uses_that_directory_as_base() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    let target = dir.path().join("pkg");
    fs::create_dir(&target).unwrap();
    fs::write(target.join(DEFAULT_FILE), "./inner.sbl").unwrap();

    let link = dir.path().join("link");
    symlink(&target, &link).unwrap();

    let ast = parse_file(&link).unwrap();
    let Expr::Path(resolved, _) = &*ast else {
        panic!("expected a path literal");
    };
    // The base is the real directory behind the link, not the link itself.
    assert_eq!(resolved, &target.join("inner.sbl"));
}

#[cfg(unix)]
#[test]
fn chained_symlinks_resolve_hop_by_hop() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("expr.sbl");
    fs::write(&file, "42").unwrap();

    let first = dir.path().join("first");
    let second = dir.path().join("second");
    symlink("first", &second).unwrap();
    symlink("expr.sbl", &first).unwrap();

    let ast = parse_file(&second).unwrap();
    assert!(matches!(&*ast, Expr::Int(42, _)));
}

#[cfg(unix)]
#[test]
fn symlink_cycles_are_reported_not_followed_forever() {
    use std::os::unix::fs::symlink;

    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    symlink("b", &a).unwrap();
    symlink("a", &b).unwrap();

    let err = parse_file(&a).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::SymlinkLoop { .. }));
    assert_eq!(err.kind.category(), ErrorCategory::Io);
}

#[test]
fn missing_files_surface_a_filesystem_error() {
    let dir = TempDir::new().unwrap();
    let err = parse_file(&dir.path().join("nope.sbl")).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Filesystem { .. }));
    assert_eq!(err.kind.category(), ErrorCategory::Io);
}

#[test]
fn parse_errors_name_the_file_on_disk() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("broken.sbl");
    fs::write(&file, "{ a = ; }").unwrap();

    let err = parse_file(&file).unwrap_err();
    assert_eq!(err.path(), file.display().to_string());
    assert_eq!(err.line(), 1);
}
