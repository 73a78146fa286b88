//! Copy stage: populate the cleaned checkout with generated content

use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::PathMatcher;
use crate::Result;

/// Copy the contents of each source directory into the checkout root.
///
/// Paths matching an exclude glob are skipped, as is anything that would
/// land inside `.git`. Later sources overwrite files copied from earlier
/// ones. A missing source directory contributes nothing.
///
/// Returns the number of files copied.
pub fn copy_contents(sources: &[PathBuf], exclude: &PathMatcher, dest: &Path) -> Result<usize> {
    let mut copied = 0;

    for source in sources {
        if !source.is_dir() {
            tracing::warn!(source = %source.display(), "source directory not found, skipping");
            continue;
        }

        copied += copy_tree(source, Path::new(""), exclude, dest)?;
        tracing::debug!(source = %source.display(), "copied source directory");
    }

    Ok(copied)
}

fn copy_tree(dir: &Path, prefix: &Path, exclude: &PathMatcher, dest: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let relative = prefix.join(entry.file_name());

        if relative.starts_with(".git") {
            continue;
        }
        if exclude.matches(&relative) {
            continue;
        }

        if entry.file_type()?.is_dir() {
            copied += copy_tree(&path, &relative, exclude, dest)?;
        } else {
            let target = dest.join(&relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&path, &target)?;
            copied += 1;
        }
    }

    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn no_excludes() -> PathMatcher {
        PathMatcher::new(Vec::<String>::new()).unwrap()
    }

    #[test]
    fn test_copies_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("out");
        fs::create_dir_all(source.join("assets")).unwrap();
        fs::write(source.join("index.html"), "hello").unwrap();
        fs::write(source.join("assets/site.css"), "body {}").unwrap();

        let dest = dir.path().join("checkout");
        fs::create_dir_all(&dest).unwrap();

        let copied = copy_contents(&[source], &no_excludes(), &dest).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dest.join("index.html")).unwrap(), "hello");
        assert_eq!(
            fs::read_to_string(dest.join("assets/site.css")).unwrap(),
            "body {}"
        );
    }

    #[test]
    fn test_exclude_globs_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("out");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("index.html"), "hello").unwrap();
        fs::write(source.join("scratch.tmp"), "x").unwrap();
        fs::write(source.join("sub/scratch.tmp"), "x").unwrap();

        let dest = dir.path().join("checkout");
        fs::create_dir_all(&dest).unwrap();

        let exclude = PathMatcher::new(["**/*.tmp"]).unwrap();
        let copied = copy_contents(&[source], &exclude, &dest).unwrap();
        assert_eq!(copied, 1);
        assert!(dest.join("index.html").exists());
        assert!(!dest.join("scratch.tmp").exists());
        assert!(!dest.join("sub/scratch.tmp").exists());
    }

    #[test]
    fn test_missing_source_contributes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("checkout");
        fs::create_dir_all(&dest).unwrap();

        let copied = copy_contents(
            &[dir.path().join("does-not-exist")],
            &no_excludes(),
            &dest,
        )
        .unwrap();
        assert_eq!(copied, 0);
    }

    #[test]
    fn test_later_sources_overwrite_earlier() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("index.html"), "old").unwrap();
        fs::write(second.join("index.html"), "new").unwrap();

        let dest = dir.path().join("checkout");
        fs::create_dir_all(&dest).unwrap();

        let copied = copy_contents(&[first, second], &no_excludes(), &dest).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(fs::read_to_string(dest.join("index.html")).unwrap(), "new");
    }

    #[test]
    fn test_never_writes_into_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("out");
        fs::create_dir_all(source.join(".git")).unwrap();
        fs::write(source.join(".git/config"), "sneaky").unwrap();
        fs::write(source.join("index.html"), "hello").unwrap();

        let dest = dir.path().join("checkout");
        fs::create_dir_all(&dest).unwrap();

        let copied = copy_contents(&[source], &no_excludes(), &dest).unwrap();
        assert_eq!(copied, 1);
        assert!(!dest.join(".git").exists());
    }
}
