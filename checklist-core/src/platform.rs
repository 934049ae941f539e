use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Operating system family a collection pass targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    #[serde(rename = "macos")]
    MacOs,
    Windows,
}

impl Platform {
    /// Platform of the running binary
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Whether account data comes from colon-delimited databases
    pub fn is_unix(&self) -> bool {
        !matches!(self, Platform::Windows)
    }

    pub fn layout(&self) -> PlatformLayout {
        match self {
            Platform::Linux => PlatformLayout {
                passwd: PathBuf::from("/etc/passwd"),
                group: PathBuf::from("/etc/group"),
                sudoers: PathBuf::from("/etc/sudoers"),
                sudoers_dir: PathBuf::from("/etc/sudoers.d"),
                home_root: PathBuf::from("/home"),
                privileged_key_files: vec![(
                    "root".to_string(),
                    PathBuf::from("/root/.ssh/authorized_keys"),
                )],
            },
            Platform::MacOs => PlatformLayout {
                passwd: PathBuf::from("/etc/passwd"),
                group: PathBuf::from("/etc/group"),
                sudoers: PathBuf::from("/etc/sudoers"),
                sudoers_dir: PathBuf::from("/etc/sudoers.d"),
                home_root: PathBuf::from("/Users"),
                privileged_key_files: vec![(
                    "root".to_string(),
                    PathBuf::from("/var/root/.ssh/authorized_keys"),
                )],
            },
            Platform::Windows => PlatformLayout {
                passwd: PathBuf::new(),
                group: PathBuf::new(),
                sudoers: PathBuf::new(),
                sudoers_dir: PathBuf::new(),
                home_root: PathBuf::from(r"C:\Users"),
                privileged_key_files: vec![(
                    "administrator".to_string(),
                    PathBuf::from(r"C:\ProgramData\ssh\administrators_authorized_keys"),
                )],
            },
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Linux => write!(f, "linux"),
            Platform::MacOs => write!(f, "macos"),
            Platform::Windows => write!(f, "windows"),
        }
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linux" => Ok(Platform::Linux),
            "macos" | "darwin" => Ok(Platform::MacOs),
            "windows" => Ok(Platform::Windows),
            other => Err(format!("unsupported platform '{}'", other)),
        }
    }
}

/// Well-known locations of account and trust data on a platform.
///
/// The database paths are empty on Windows, where the same facts come from
/// `net` commands instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformLayout {
    pub passwd: PathBuf,
    pub group: PathBuf,
    pub sudoers: PathBuf,
    pub sudoers_dir: PathBuf,
    pub home_root: PathBuf,
    /// Superuser accounts whose trust file lives outside the home root
    pub privileged_key_files: Vec<(String, PathBuf)>,
}
