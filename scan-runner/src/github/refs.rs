//! Branch and tag listings for the ref picker.

use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Kind of a pickable ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefKind {
    Tag,
    Branch,
}

/// A branch or tag offered to the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RefChoice {
    pub kind: RefKind,
    pub name: String,
}

impl fmt::Display for RefChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RefKind::Tag => write!(f, "tag: {}", self.name),
            RefKind::Branch => write!(f, "branch: {}", self.name),
        }
    }
}

/// Branches and tags of a repository.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefCatalog {
    pub branches: Vec<String>,
    pub tags: Vec<String>,
}

impl RefCatalog {
    /// Returns tags then branches, with `main` and `master` moved to the top.
    #[must_use]
    pub fn choices(&self) -> Vec<RefChoice> {
        let all: Vec<RefChoice> = self
            .tags
            .iter()
            .map(|name| RefChoice {
                kind: RefKind::Tag,
                name: name.clone(),
            })
            .chain(self.branches.iter().map(|name| RefChoice {
                kind: RefKind::Branch,
                name: name.clone(),
            }))
            .collect();

        let preferred = ["main", "master"]
            .into_iter()
            .flat_map(|default| all.iter().filter(move |choice| choice.name == default));

        let mut seen = HashSet::new();
        preferred
            .chain(all.iter())
            .filter(|choice| seen.insert((*choice).clone()))
            .cloned()
            .collect()
    }
}
