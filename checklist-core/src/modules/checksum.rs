use super::{Collector, Host};
use crate::error::Result;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::warn;

/// SHA-256 of requested files, `"<path>": <hex digest>` per readable file
pub struct ChecksumCollector {
    files: Vec<String>,
}

impl ChecksumCollector {
    pub fn new(files: &[String]) -> Self {
        let mut files = files.to_vec();
        files.sort();
        Self { files }
    }

    pub fn collect(&self) -> String {
        let mut output = String::new();

        for file in &self.files {
            match sha256_file(Path::new(file)) {
                Ok(digest) => output.push_str(&format!("\"{}\": {}\n", file, digest)),
                Err(e) => warn!(path = %file, error = %e, "skipping unreadable file"),
            }
        }

        output
    }
}

impl Collector for ChecksumCollector {
    fn collect(&self, _host: &Host<'_>) -> Result<String> {
        Ok(self.collect())
    }

    fn name(&self) -> &'static str {
        "file_checksums"
    }
}

/// Hex-encoded SHA-256 of a file's content, streamed
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}
