//! Dotenv-style environment files for stack deployments.

use std::path::Path;

use anyhow::Context;
use psu_common::types::Pair;
use psu_deploy::env::merge_env;

/// Reads `KEY=VALUE` lines from `path`.
///
/// Duplicate keys resolve last-line-wins, keeping the position of the first
/// occurrence.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or a line does not parse.
pub fn load_env_file(path: &Path) -> anyhow::Result<Vec<Pair>> {
    let entries = dotenvy::from_path_iter(path)
        .with_context(|| format!("failed to read env file {}", path.display()))?;
    let mut pairs = Vec::new();
    for entry in entries {
        let (name, value) =
            entry.with_context(|| format!("failed to parse env file {}", path.display()))?;
        pairs.push(Pair::new(name, value));
    }
    Ok(merge_env(&[], &pairs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_in_file_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.env");
        std::fs::write(&path, "# comment\nFOO=1\n\nBAR=\"two words\"\n").expect("write");

        let pairs = load_env_file(&path).expect("load");
        assert_eq!(
            pairs,
            vec![Pair::new("FOO", "1"), Pair::new("BAR", "two words")]
        );
    }

    #[test]
    fn duplicate_keys_are_last_line_wins() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.env");
        std::fs::write(&path, "A=1\nB=2\nA=3\n").expect("write");

        let pairs = load_env_file(&path).expect("load");
        assert_eq!(pairs, vec![Pair::new("A", "3"), Pair::new("B", "2")]);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_env_file(&dir.path().join("missing.env")).expect_err("missing");
        assert!(err.to_string().contains("missing.env"));
    }
}
