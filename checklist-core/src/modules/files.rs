use super::{Collector, Host};
use crate::error::Result;
use std::path::Path;
use tracing::warn;

/// Regular files directly inside each requested folder
pub struct FilesCollector {
    folders: Vec<String>,
}

impl FilesCollector {
    pub fn new(folders: &[String]) -> Self {
        let mut folders = folders.to_vec();
        folders.sort();
        Self { folders }
    }

    /// Sorted file names; an unreadable folder has none
    fn get_files(&self, host: &Host<'_>, folder: &str) -> Vec<String> {
        let entries = match host.source.list_dir(Path::new(folder)) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(folder = %folder, error = %e, "failed to list folder");
                return Vec::new();
            }
        };

        let mut files: Vec<String> = entries
            .into_iter()
            .filter(|e| !e.is_dir)
            .map(|e| e.name)
            .collect();
        files.sort();
        files
    }

    pub fn collect(&self, host: &Host<'_>) -> String {
        let mut output = String::new();
        for folder in &self.folders {
            let files = self.get_files(host, folder);
            output.push_str(&format!("\"{}\": {}\n", folder, files.join(", ")));
        }
        output
    }
}

impl Collector for FilesCollector {
    fn collect(&self, host: &Host<'_>) -> Result<String> {
        Ok(self.collect(host))
    }

    fn name(&self) -> &'static str {
        "files"
    }
}
