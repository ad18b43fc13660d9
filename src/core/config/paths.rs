use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub working_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let working_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let project_root = discover_project_root(&working_dir);
        let log_dir = env::var("RAG_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| project_root.join("logs"));

        let _ = fs::create_dir_all(&log_dir);

        AppPaths {
            project_root,
            working_dir,
            log_dir,
        }
    }

    /// Rooted at the given directory; used by tests and tools that must not touch the cwd.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        AppPaths {
            log_dir: root.join("logs"),
            working_dir: root.clone(),
            project_root: root,
        }
    }

    /// Relative paths resolve against the process working directory.
    pub fn resolve(&self, raw: &Path) -> PathBuf {
        if raw.is_absolute() {
            raw.to_path_buf()
        } else {
            self.working_dir.join(raw)
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root(working_dir: &Path) -> PathBuf {
    if let Ok(root) = env::var("RAG_ROOT") {
        return PathBuf::from(root);
    }

    if working_dir.join("config.yml").exists() {
        return working_dir.to_path_buf();
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    working_dir.to_path_buf()
}
