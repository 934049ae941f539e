use std::collections::HashSet;

/// A local account and the groups it has been resolved into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub name: String,
    /// Primary group id, compared verbatim against group ids
    pub primary_gid: String,
    pub groups: HashSet<String>,
}

impl Account {
    pub fn new(name: impl Into<String>, primary_gid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_gid: primary_gid.into(),
            groups: HashSet::new(),
        }
    }

    /// Parse one `/etc/passwd` record; records with fewer than seven fields are dropped
    pub fn from_passwd_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 7 || parts[0].is_empty() {
            return None;
        }
        Some(Self::new(parts[0], parts[3]))
    }

    /// Group names in display order
    pub fn sorted_groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = self.groups.iter().map(String::as_str).collect();
        groups.sort_unstable();
        groups
    }
}

/// A group record with its explicit members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub name: String,
    pub gid: String,
    pub members: Vec<String>,
}

impl Group {
    pub fn new<I, S>(name: impl Into<String>, gid: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            gid: gid.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse one `/etc/group` record (`name:password:gid:member,member`)
    pub fn from_group_line(line: &str) -> Option<Self> {
        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() < 4 || parts[0].is_empty() {
            return None;
        }

        let members = parts[3]
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect();

        Some(Self {
            name: parts[0].to_string(),
            gid: parts[2].to_string(),
            members,
        })
    }
}
