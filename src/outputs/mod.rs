//! Output generation: the article store and every view derived from it.
//!
//! # Submodules
//!
//! - [`json`]: load and persist JSON files (store, per-date, latest, weekly)
//! - [`indexes`]: the per-date navigation index
//! - [`markdown`]: the weekly report as Markdown
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── all.json              # accumulated store, never pruned
//! ├── latest.json           # group of the newest date
//! ├── weekly.json           # WeeklySummary
//! ├── weekly.md             # same summary, rendered
//! └── by_date/
//!     ├── index.json        # [{date, count}], newest first
//!     ├── 2025-06-01.json
//!     └── 2025-06-02.json
//! ```

pub mod indexes;
pub mod json;
pub mod markdown;

use std::path::{Path, PathBuf};

/// Locations of every file under the data directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub root: PathBuf,
    pub all: PathBuf,
    pub latest: PathBuf,
    pub weekly_json: PathBuf,
    pub weekly_md: PathBuf,
    pub by_date_dir: PathBuf,
    pub date_index: PathBuf,
}

impl OutputPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let by_date_dir = root.join("by_date");
        Self {
            all: root.join("all.json"),
            latest: root.join("latest.json"),
            weekly_json: root.join("weekly.json"),
            weekly_md: root.join("weekly.md"),
            date_index: by_date_dir.join("index.json"),
            by_date_dir,
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths_layout() {
        let paths = OutputPaths::new("data");
        assert_eq!(paths.all, Path::new("data/all.json"));
        assert_eq!(paths.latest, Path::new("data/latest.json"));
        assert_eq!(paths.date_index, Path::new("data/by_date/index.json"));
        assert_eq!(paths.weekly_md, Path::new("data/weekly.md"));
    }
}
