use gatehouse_tools::error::ToolError;
use gatehouse_tools::sandbox::PathGuard;
use std::fs;
use tempfile::TempDir;

/// Outer directory with a sandbox root inside it plus a file outside the
/// root, so escapes have a real target to resolve to.
fn setup() -> (TempDir, PathGuard) {
    let outer = TempDir::new().unwrap();
    let root = outer.path().join("sandbox");
    fs::create_dir_all(&root).unwrap();
    fs::write(outer.path().join("secret.txt"), "outside").unwrap();
    let guard = PathGuard::new(&root).unwrap();
    (outer, guard)
}

#[test]
fn resolves_file_in_root() {
    let (outer, guard) = setup();
    fs::write(outer.path().join("sandbox/valid.txt"), "content").unwrap();
    let resolved = guard.resolve("valid.txt").unwrap();
    assert!(resolved.starts_with(guard.root()));
}

#[test]
fn resolves_file_in_subdirectory() {
    let (outer, guard) = setup();
    fs::create_dir_all(outer.path().join("sandbox/subdir")).unwrap();
    fs::write(outer.path().join("sandbox/subdir/file.txt"), "content").unwrap();
    assert!(guard.resolve("subdir/file.txt").is_ok());
}

#[test]
fn rejects_parent_traversal_to_existing_file() {
    let (_outer, guard) = setup();
    let result = guard.resolve("../secret.txt");
    assert!(matches!(result, Err(ToolError::PathEscape(_))));
}

#[test]
fn rejects_absolute_path_outside_root() {
    let (outer, guard) = setup();
    let outside = outer.path().join("secret.txt");
    assert!(matches!(
        guard.resolve(&outside),
        Err(ToolError::PathEscape(_))
    ));
    assert!(matches!(
        guard.resolve_new(&outside),
        Err(ToolError::PathEscape(_))
    ));
}

#[test]
fn allows_parent_segments_that_stay_inside() {
    let (outer, guard) = setup();
    fs::create_dir_all(outer.path().join("sandbox/notes")).unwrap();
    fs::write(outer.path().join("sandbox/notes/a.txt"), "hi").unwrap();
    assert!(guard.resolve("notes/../notes/a.txt").is_ok());
    assert!(guard.resolve_new("notes/../notes/b.txt").is_ok());
}

#[test]
fn missing_file_is_not_an_escape() {
    let (_outer, guard) = setup();
    assert!(matches!(
        guard.resolve("missing.txt"),
        Err(ToolError::ExecutionFailed(_))
    ));
}

#[test]
fn resolve_new_rejects_traversal() {
    let (_outer, guard) = setup();
    assert!(matches!(
        guard.resolve_new("../escape.txt"),
        Err(ToolError::PathEscape(_))
    ));
    assert!(matches!(
        guard.resolve_new("a/../../escape.txt"),
        Err(ToolError::PathEscape(_))
    ));
}

#[test]
fn resolve_new_accepts_nested_target() {
    let (_outer, guard) = setup();
    let resolved = guard.resolve_new("a/b/c.txt").unwrap();
    assert!(resolved.starts_with(guard.root()));
    assert!(resolved.ends_with("a/b/c.txt"));
}

#[cfg(unix)]
#[test]
fn rejects_symlink_escape() {
    let (outer, guard) = setup();
    let target = outer.path().join("elsewhere");
    fs::create_dir_all(&target).unwrap();
    fs::write(target.join("secret.txt"), "outside").unwrap();
    std::os::unix::fs::symlink(&target, outer.path().join("sandbox/link")).unwrap();

    assert!(matches!(
        guard.resolve("link/secret.txt"),
        Err(ToolError::PathEscape(_))
    ));
    assert!(matches!(
        guard.resolve_new("link/new.txt"),
        Err(ToolError::PathEscape(_))
    ));
}
