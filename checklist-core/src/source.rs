//! Raw fact sources
//!
//! Every collector reads the host through a [`FactSource`]: a file or the
//! captured standard output of a command, split into lines the same way
//! regardless of origin. Reads are side-effect free, so reading the same
//! source twice is always safe.

use crate::error::SourceError;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

/// Where a sequence of lines comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceRef {
    File(PathBuf),
    Command(CommandSpec),
}

/// External command whose output is read as lines
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// When false, a non-zero exit still yields the combined stdout/stderr
    pub require_success: bool,
}

impl SourceRef {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        SourceRef::File(path.into())
    }

    pub fn command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SourceRef::Command(CommandSpec {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            require_success: true,
        })
    }

    /// Keep the output of a command even if it exits non-zero
    pub fn allow_failure(mut self) -> Self {
        if let SourceRef::Command(ref mut spec) = self {
            spec.require_success = false;
        }
        self
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::File(path) => write!(f, "{}", path.display()),
            SourceRef::Command(spec) => {
                write!(f, "{}", spec.program)?;
                for arg in &spec.args {
                    write!(f, " {}", arg)?;
                }
                Ok(())
            }
        }
    }
}

/// Directory entry as seen by discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

/// Capability for reading raw host facts
pub trait FactSource: Send + Sync {
    /// Read every line of a file or command output
    fn read_lines(&self, source: &SourceRef) -> Result<Vec<String>, SourceError>;

    /// Enumerate a directory
    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Whether `path` exists and is a regular file
    fn is_file(&self, path: &Path) -> bool;
}

/// Reads the live host: the real filesystem and real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSource;

impl HostSource {
    pub fn new() -> Self {
        Self
    }

    fn run(&self, spec: &CommandSpec) -> Result<Vec<String>, SourceError> {
        debug!(program = %spec.program, args = ?spec.args, "running command");

        let output = Command::new(&spec.program).args(&spec.args).output()?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if output.status.success() {
            return Ok(split_lines(&stdout));
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if spec.require_success {
            return Err(SourceError::ExecutionFailed(format!(
                "{} exited with {}: {}",
                spec.program,
                output.status,
                stderr.trim()
            )));
        }

        let mut lines = split_lines(&stdout);
        lines.extend(split_lines(&stderr));
        Ok(lines)
    }
}

impl FactSource for HostSource {
    fn read_lines(&self, source: &SourceRef) -> Result<Vec<String>, SourceError> {
        match source {
            SourceRef::File(path) => {
                let bytes = fs::read(path)?;
                Ok(split_lines(&String::from_utf8_lossy(&bytes)))
            }
            SourceRef::Command(spec) => self.run(spec),
        }
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir,
            });
        }
        Ok(entries)
    }

    fn is_file(&self, path: &Path) -> bool {
        fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }
}

/// Canned fact source for fixtures and dry runs
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<PathBuf, Vec<String>>,
    dirs: BTreeSet<PathBuf>,
    responses: HashMap<String, Result<Vec<String>, SourceError>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file with the given content
    pub fn with_file(mut self, path: impl Into<PathBuf>, content: &str) -> Self {
        let path = path.into();
        self.responses.insert(
            path.display().to_string(),
            Ok(split_lines(content)),
        );
        self.files.insert(path, split_lines(content));
        self
    }

    /// Register an empty directory
    pub fn with_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.dirs.insert(path.into());
        self
    }

    /// Register the output of a command
    pub fn with_output(mut self, source: SourceRef, output: &str) -> Self {
        self.responses.insert(source.to_string(), Ok(split_lines(output)));
        self
    }

    /// Make reading a source fail
    pub fn with_failure(mut self, source: SourceRef, error: SourceError) -> Self {
        self.responses.insert(source.to_string(), Err(error));
        self
    }

    fn is_known_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
            || self.dirs.iter().any(|d| d.starts_with(path) && d != path)
            || self.files.keys().any(|f| f.starts_with(path) && f != path)
    }
}

impl FactSource for MemorySource {
    fn read_lines(&self, source: &SourceRef) -> Result<Vec<String>, SourceError> {
        self.responses
            .get(&source.to_string())
            .cloned()
            .unwrap_or(Err(SourceError::NotFound))
    }

    fn list_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        if !self.is_known_dir(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        }

        let mut children: BTreeMap<String, bool> = BTreeMap::new();
        let known = self
            .files
            .keys()
            .map(|p| (p, false))
            .chain(self.dirs.iter().map(|p| (p, true)));

        for (candidate, is_dir_itself) in known {
            let Ok(rest) = candidate.strip_prefix(path) else {
                continue;
            };
            let mut components = rest.components();
            let Some(first) = components.next() else {
                continue;
            };
            let nested = components.next().is_some();
            let name = first.as_os_str().to_string_lossy().to_string();
            let is_dir = nested || is_dir_itself;
            let entry = children.entry(name).or_insert(is_dir);
            *entry |= is_dir;
        }

        Ok(children
            .into_iter()
            .map(|(name, is_dir)| DirEntry { name, is_dir })
            .collect())
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }
}

/// Split raw text into lines, dropping a trailing `\r` on each
pub fn split_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|l| l.trim_end_matches('\r').to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_source_ref_display() {
        let cmd = SourceRef::command("iptables", ["-t", "nat", "-vL"]);
        assert_eq!(cmd.to_string(), "iptables -t nat -vL");
        assert_eq!(SourceRef::file("/etc/passwd").to_string(), "/etc/passwd");
    }

    #[test]
    fn test_split_lines_crlf() {
        assert_eq!(split_lines("a\r\nb\n\nc"), vec!["a", "b", "", "c"]);
    }

    #[test]
    fn test_host_source_file_is_restartable() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("group");
        fs::write(&path, "root:x:0:\nwheel:x:10:alice\n").unwrap();

        let source = HostSource::new();
        let first = source.read_lines(&SourceRef::file(&path)).unwrap();
        let second = source.read_lines(&SourceRef::file(&path)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert!(source.is_file(&path));
        assert!(!source.is_file(temp.path()));
    }

    #[test]
    fn test_host_source_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = HostSource::new()
            .read_lines(&SourceRef::file(temp.path().join("nope")))
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound));
    }

    #[test]
    fn test_host_source_missing_program() {
        let err = HostSource::new()
            .read_lines(&SourceRef::command("definitely-not-a-real-binary-xyz", ["-h"]))
            .unwrap_err();
        assert!(matches!(err, SourceError::NotFound));
    }

    #[test]
    fn test_memory_source_lists_children() {
        let source = MemorySource::new()
            .with_file("/home/alice/.ssh/authorized_keys", "ssh-ed25519 AAAA")
            .with_file("/home/notes.txt", "hi")
            .with_dir("/home/bob");

        let entries = source.list_dir(Path::new("/home")).unwrap();
        assert_eq!(
            entries,
            vec![
                DirEntry { name: "alice".into(), is_dir: true },
                DirEntry { name: "bob".into(), is_dir: true },
                DirEntry { name: "notes.txt".into(), is_dir: false },
            ]
        );
        assert!(source.list_dir(Path::new("/srv")).is_err());
        assert!(source.is_file(Path::new("/home/notes.txt")));
    }

    #[test]
    fn test_memory_source_failure() {
        let cmd = SourceRef::command("net", ["user"]);
        let source = MemorySource::new()
            .with_failure(cmd.clone(), SourceError::ExecutionFailed("exit 2".into()));
        assert!(matches!(
            source.read_lines(&cmd),
            Err(SourceError::ExecutionFailed(_))
        ));
    }
}
