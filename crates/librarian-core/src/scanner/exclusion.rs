use ahash::AHashSet;
use std::path::{Component, Path};

/// Filenames the OS drops into folders. Never cataloged, whatever the profile says.
pub const OS_ARTIFACTS: [&str; 3] = [".DS_Store", "Thumbs.db", "desktop.ini"];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExclusionRule {
    /// Skip any file with exactly this name, anywhere in the tree.
    File(String),
    /// Skip the whole subtree below any directory with this name.
    Subtree(String),
}

impl ExclusionRule {
    /// Parse the profile string form: a trailing `/` or `\` marks a folder.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let folder = raw.trim_end_matches(['/', '\\']);
        if folder.is_empty() {
            return None;
        }
        if folder.len() != raw.len() {
            Some(ExclusionRule::Subtree(folder.to_string()))
        } else {
            Some(ExclusionRule::File(folder.to_string()))
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    files: AHashSet<String>,
    subtrees: AHashSet<String>,
}

impl ExclusionSet {
    pub fn new(rules: impl IntoIterator<Item = ExclusionRule>) -> Self {
        let mut set = ExclusionSet::default();
        for rule in rules {
            set.push(rule);
        }
        set
    }

    pub fn from_strings<S: AsRef<str>>(raw: &[S]) -> Self {
        Self::new(raw.iter().filter_map(|s| ExclusionRule::parse(s.as_ref())))
    }

    pub fn push(&mut self, rule: ExclusionRule) {
        match rule {
            ExclusionRule::File(name) => self.files.insert(name),
            ExclusionRule::Subtree(name) => self.subtrees.insert(name),
        };
    }

    pub fn excludes_file_name(&self, name: &str) -> bool {
        OS_ARTIFACTS.contains(&name) || self.files.contains(name)
    }

    pub fn excludes_dir_name(&self, name: &str) -> bool {
        self.subtrees.contains(name)
    }

    /// `relative` is a file path relative to the scan root.
    pub fn is_excluded(&self, relative: &Path) -> bool {
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        if self.excludes_file_name(&name) {
            return true;
        }
        relative
            .parent()
            .map(|parent| {
                parent.components().any(|c| match c {
                    Component::Normal(segment) => self.excludes_dir_name(&segment.to_string_lossy()),
                    _ => false,
                })
            })
            .unwrap_or(false)
    }
}
