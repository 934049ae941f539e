//! SSH trust anchors
//!
//! Finds every account's `authorized_keys` file and reads them all in
//! parallel. One task per account; each task owns a disjoint key in the result
//! map, so the shared map's lock is only taken for the single insert.
//!
//! Discovery goes through the host's [`FactSource`](crate::source::FactSource);
//! the key files themselves are read from the local filesystem by the workers.

use super::Host;
use crate::error::{CollectError, Result};
use std::collections::{BTreeMap, HashMap};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, error, warn};

/// Locate the trust file of every account that has one.
///
/// Well-known superuser files come first; regular accounts are the directories
/// under the home root with a `.ssh/authorized_keys` file. Only files that
/// exist are returned.
pub fn discover(host: &Host<'_>) -> Result<HashMap<String, PathBuf>> {
    let mut paths = HashMap::new();

    for (account, path) in &host.layout.privileged_key_files {
        if host.source.is_file(path) {
            paths.insert(account.clone(), path.clone());
        }
    }

    let home_root = &host.layout.home_root;
    let entries = host
        .source
        .list_dir(home_root)
        .map_err(|cause| CollectError::HomeRootUnavailable {
            path: home_root.clone(),
            cause,
        })?;

    for entry in entries.into_iter().filter(|e| e.is_dir) {
        let path = home_root.join(&entry.name).join(".ssh").join("authorized_keys");
        if host.source.is_file(&path) {
            paths.insert(entry.name, path);
        }
    }

    debug!(root = %home_root.display(), accounts = paths.len(), "discovered trust files");
    Ok(paths)
}

/// Concurrent authorized-keys reader
pub struct SshKeyCollector;

impl SshKeyCollector {
    pub fn new() -> Self {
        Self
    }

    /// Read every trust file in parallel and wait for all of them.
    ///
    /// An account whose file cannot be read is left out; it never affects the
    /// other accounts.
    pub async fn collect(&self, paths: HashMap<String, PathBuf>) -> HashMap<String, Vec<String>> {
        let keys = Arc::new(Mutex::new(HashMap::with_capacity(paths.len())));
        let mut handles = Vec::with_capacity(paths.len());

        for (account, path) in paths {
            let keys = Arc::clone(&keys);

            let handle = tokio::spawn(async move {
                match read_keys(&path).await {
                    Ok(lines) => {
                        keys.lock().await.insert(account, lines);
                    }
                    Err(e) => {
                        warn!(account = %account, path = %path.display(), error = %e, "failed to read trust file");
                    }
                }
            });

            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "trust file worker aborted");
            }
        }

        match Arc::try_unwrap(keys) {
            Ok(keys) => keys.into_inner(),
            Err(shared) => shared.lock().await.clone(),
        }
    }

    /// Discover, read and render the trust files of `host`
    pub async fn collect_host(&self, host: &Host<'_>) -> Result<String> {
        let paths = discover(host)?;
        let keys = self.collect(paths).await;
        Ok(render(&keys))
    }
}

impl Default for SshKeyCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-empty lines of one trust file, verbatim.
///
/// Bytes that are not UTF-8 are replaced rather than failing the whole file,
/// so malformed entries still show up next to the valid keys.
async fn read_keys(path: &Path) -> io::Result<Vec<String>> {
    let file = File::open(path).await?;
    let mut reader = BufReader::new(file);

    let mut keys = Vec::new();
    let mut buf = Vec::new();
    while reader.read_until(b'\n', &mut buf).await? > 0 {
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r');
        if !line.is_empty() {
            keys.push(line.to_string());
        }
        buf.clear();
    }
    Ok(keys)
}

/// One block per account, `"<account>":\n<keys>`, separated by blank lines
pub fn render(keys: &HashMap<String, Vec<String>>) -> String {
    let sorted: BTreeMap<&String, &Vec<String>> = keys.iter().collect();

    let mut output = String::new();
    for (account, lines) in sorted {
        output.push_str(&format!("\"{}\":\n{}\n\n", account, lines.join("\n")));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChecklistConfig, PrivilegedKeyFile};
    use crate::platform::Platform;
    use crate::source::{HostSource, MemorySource};
    use std::fs;
    use tempfile::TempDir;

    fn write_keys(root: &Path, account: &str, content: &str) -> PathBuf {
        let dir = root.join(account).join(".ssh");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("authorized_keys");
        fs::write(&path, content).unwrap();
        path
    }

    fn config_for(home: &Path, root_keys: PathBuf) -> ChecklistConfig {
        ChecklistConfig {
            home_root: Some(home.to_path_buf()),
            privileged_key_files: Some(vec![PrivilegedKeyFile {
                account: "root".to_string(),
                path: root_keys,
            }]),
            ..ChecklistConfig::default()
        }
    }

    #[test]
    fn test_discover_only_existing_files() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        let alice = write_keys(&home, "alice", "ssh-ed25519 AAAA alice@laptop\n");
        fs::create_dir_all(home.join("bob")).unwrap();
        fs::create_dir_all(home.join("carol/.ssh/authorized_keys")).unwrap();
        fs::write(home.join("README"), "not a home").unwrap();

        let config = config_for(&home, temp.path().join("root/.ssh/authorized_keys"));
        let source = HostSource::new();
        let host = Host::new(&source, Platform::Linux, config.layout_for(Platform::Linux));

        let paths = discover(&host).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths["alice"], alice);
    }

    #[test]
    fn test_discover_includes_privileged_file() {
        let source = MemorySource::new()
            .with_dir("/home")
            .with_file("/root/.ssh/authorized_keys", "ssh-rsa AAAA root@host");
        let host = Host::new(&source, Platform::Linux, Platform::Linux.layout());

        let paths = discover(&host).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths["root"], PathBuf::from("/root/.ssh/authorized_keys"));
    }

    #[test]
    fn test_discover_missing_home_root() {
        let temp = TempDir::new().unwrap();
        let config = config_for(&temp.path().join("missing"), temp.path().join("nope"));
        let source = HostSource::new();
        let host = Host::new(&source, Platform::Linux, config.layout_for(Platform::Linux));

        let err = discover(&host).unwrap_err();
        assert!(matches!(err, CollectError::HomeRootUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_collect_keeps_non_empty_lines_verbatim() {
        let temp = TempDir::new().unwrap();
        let path = write_keys(
            temp.path(),
            "alice",
            "ssh-ed25519 AAAA alice@laptop\n\n  not-a-valid-key  \nssh-rsa BBBB alice@desktop\n",
        );

        let keys = SshKeyCollector::new()
            .collect(HashMap::from([("alice".to_string(), path)]))
            .await;

        assert_eq!(
            keys["alice"],
            vec![
                "ssh-ed25519 AAAA alice@laptop",
                "  not-a-valid-key  ",
                "ssh-rsa BBBB alice@desktop",
            ]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_collect_many_accounts() {
        let temp = TempDir::new().unwrap();
        let mut paths = HashMap::new();
        for i in 0..64 {
            let account = format!("user{:02}", i);
            let path = write_keys(temp.path(), &account, &format!("ssh-ed25519 KEY{} {}\n", i, account));
            paths.insert(account, path);
        }

        let keys = SshKeyCollector::new().collect(paths).await;
        assert_eq!(keys.len(), 64);
        assert_eq!(keys["user07"], vec!["ssh-ed25519 KEY7 user07"]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_failed_read_is_isolated() {
        let temp = TempDir::new().unwrap();
        let alice = write_keys(temp.path(), "alice", "ssh-ed25519 AAAA alice\n");
        let bob = write_keys(temp.path(), "bob", "ssh-rsa BBBB bob\nssh-rsa CCCC bob\n");

        // A directory cannot be read as a key file
        let broken = temp.path().join("mallory/.ssh/authorized_keys");
        fs::create_dir_all(&broken).unwrap();
        let vanished = temp.path().join("eve/.ssh/authorized_keys");

        let paths = HashMap::from([
            ("alice".to_string(), alice),
            ("bob".to_string(), bob),
            ("mallory".to_string(), broken),
            ("eve".to_string(), vanished),
        ]);

        let keys = SshKeyCollector::new().collect(paths).await;
        assert_eq!(keys.len(), 2);
        assert_eq!(keys["alice"], vec!["ssh-ed25519 AAAA alice"]);
        assert_eq!(keys["bob"], vec!["ssh-rsa BBBB bob", "ssh-rsa CCCC bob"]);
        assert!(!keys.contains_key("mallory"));
        assert!(!keys.contains_key("eve"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_keeps_account() {
        let temp = TempDir::new().unwrap();
        let path = write_keys(temp.path(), "alice", "");
        fs::write(&path, b"ssh-ed25519 AAAA alice@laptop\n\xff\xfe junk\r\nssh-rsa BBBB alice@desktop".as_slice()).unwrap();

        let keys = SshKeyCollector::new()
            .collect(HashMap::from([("alice".to_string(), path)]))
            .await;

        assert_eq!(keys["alice"].len(), 3);
        assert_eq!(keys["alice"][0], "ssh-ed25519 AAAA alice@laptop");
        assert_eq!(keys["alice"][1], "\u{FFFD}\u{FFFD} junk");
        assert_eq!(keys["alice"][2], "ssh-rsa BBBB alice@desktop");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_permission_denied_is_isolated() {
        use std::os::unix::fs::PermissionsExt;

        // root bypasses file modes
        if crate::types::report::is_root() {
            return;
        }

        let temp = TempDir::new().unwrap();
        let alice = write_keys(temp.path(), "alice", "ssh-ed25519 AAAA alice\n");
        let locked = write_keys(temp.path(), "mallory", "ssh-rsa MMMM mallory\n");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let keys = SshKeyCollector::new()
            .collect(HashMap::from([
                ("alice".to_string(), alice),
                ("mallory".to_string(), locked.clone()),
            ]))
            .await;

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o600)).unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys["alice"], vec!["ssh-ed25519 AAAA alice"]);
        assert!(!keys.contains_key("mallory"));
    }

    #[tokio::test]
    async fn test_empty_home_root() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        fs::create_dir_all(&home).unwrap();

        let config = config_for(&home, temp.path().join("root/.ssh/authorized_keys"));
        let source = HostSource::new();
        let host = Host::new(&source, Platform::Linux, config.layout_for(Platform::Linux));

        let paths = discover(&host).unwrap();
        assert!(paths.is_empty());
        assert!(SshKeyCollector::new().collect(paths).await.is_empty());
        assert_eq!(SshKeyCollector::new().collect_host(&host).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_collect_host_renders_sorted_blocks() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        write_keys(&home, "zoe", "ssh-ed25519 ZZZZ zoe\n");
        write_keys(&home, "adam", "ssh-rsa AAAA adam\nssh-ed25519 BBBB adam\n");
        let root_keys = write_keys(temp.path(), "root", "ssh-rsa RRRR root\n");

        let config = config_for(&home, root_keys);
        let source = HostSource::new();
        let host = Host::new(&source, Platform::Linux, config.layout_for(Platform::Linux));

        let output = SshKeyCollector::new().collect_host(&host).await.unwrap();
        assert_eq!(
            output,
            "\"adam\":\nssh-rsa AAAA adam\nssh-ed25519 BBBB adam\n\n\
             \"root\":\nssh-rsa RRRR root\n\n\
             \"zoe\":\nssh-ed25519 ZZZZ zoe\n\n"
        );
    }
}
