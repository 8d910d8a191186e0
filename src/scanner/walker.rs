//! Candidate-file enumeration with non-negotiable security exclusions.
//!
//! Hidden files, dependency and build directories, virtual environments,
//! lockfiles, and minified assets are always excluded, regardless of any
//! configuration. `.env` files in particular must never reach a parser.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

/// Directory names that are never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "venv",
    "env",
    "__pycache__",
    "dist",
    "build",
    ".next",
    "coverage",
];

/// Exact file names that are never scanned.
const EXCLUDED_FILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    ".DS_Store",
];

/// Extensions of files worth parsing.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "ts", "tsx", "py", "java", "go", "rs", "rb", "php", "swift", "kt", "scala",
];

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

fn is_excluded_dir(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| EXCLUDED_DIRS.contains(&name))
        .unwrap_or(false)
}

fn is_candidate_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with(".env") || EXCLUDED_FILES.contains(&name) {
        return false;
    }
    if name.ends_with(".min.js") || name.ends_with(".min.css") {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| SOURCE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Enumerates candidate source files under `root`, applying the security
/// exclusions. Unreadable directories are skipped silently; enumeration is
/// best-effort, never fatal.
pub fn collect_files(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            // Keep the root itself even if the directory name looks hidden.
            if entry.depth() == 0 {
                return true;
            }
            !is_hidden(entry) && !is_excluded_dir(entry)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_candidate_file(path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, rel: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "content").unwrap();
    }

    #[test]
    fn test_collects_source_files_only() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/app.ts");
        touch(tmp.path(), "bot.py");
        touch(tmp.path(), "README.md");
        touch(tmp.path(), "image.png");

        let mut names: Vec<_> = collect_files(tmp.path())
            .into_iter()
            .map(|p| p.strip_prefix(tmp.path()).unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();

        assert_eq!(names, vec!["bot.py", "src/app.ts"]);
    }

    #[test]
    fn test_env_files_are_always_excluded() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), ".env");
        touch(tmp.path(), ".env.production");
        touch(tmp.path(), "ok.py");

        let files = collect_files(tmp.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("ok.py"));
    }

    #[test]
    fn test_dependency_and_vcs_dirs_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "node_modules/openai/index.js");
        touch(tmp.path(), ".git/hooks/pre-commit.py");
        touch(tmp.path(), "venv/lib/site.py");
        touch(tmp.path(), "__pycache__/mod.py");
        touch(tmp.path(), "src/main.py");

        let files = collect_files(tmp.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("src/main.py"));
    }

    #[test]
    fn test_minified_assets_and_lockfiles_are_skipped() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "bundle.min.js");
        touch(tmp.path(), "package-lock.json");
        touch(tmp.path(), "app.js");

        let files = collect_files(tmp.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("app.js"));
    }
}
