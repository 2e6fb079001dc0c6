//! Environment variable policy for stack updates.

use psu_common::types::Pair;

/// How caller-supplied variables combine with the ones a stack already has.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvPolicy {
    /// Upsert by name: existing names keep their position and take the new
    /// value, new names are appended, untouched names are kept.
    #[default]
    Merge,
    /// Use the caller's variables verbatim.
    Replace,
}

impl EnvPolicy {
    /// Picks the policy from a `--replace-env` style flag.
    #[must_use]
    pub const fn from_replace_flag(replace: bool) -> Self {
        if replace { Self::Replace } else { Self::Merge }
    }

    /// Computes the effective variables.
    #[must_use]
    pub fn apply(self, existing: &[Pair], supplied: &[Pair]) -> Vec<Pair> {
        match self {
            Self::Merge => merge_env(existing, supplied),
            Self::Replace => supplied.to_vec(),
        }
    }
}

/// Left-biased upsert of `supplied` into `existing`, keyed by name.
///
/// Duplicate names within `supplied` resolve last-wins at the position of
/// their first occurrence.
#[must_use]
pub fn merge_env(existing: &[Pair], supplied: &[Pair]) -> Vec<Pair> {
    let mut merged = existing.to_vec();
    for pair in supplied {
        match merged.iter_mut().find(|current| current.name == pair.name) {
            Some(current) => current.value.clone_from(&pair.value),
            None => merged.push(pair.clone()),
        }
    }
    merged
}
