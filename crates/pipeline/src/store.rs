//! Snapshot store: loading and saving the configuration file.
//!
//! The snapshot is one pretty-printed JSON document with fixed field
//! order, so successive saves diff cleanly. Saving writes the whole file
//! to `{path}.tmp` and renames over the target; an interrupted run never
//! leaves a half-written snapshot behind.

use std::fs;
use std::path::{Path, PathBuf};

use journal_core::{ConfigSnapshot, Result};

/// Load a snapshot from disk.
pub fn load(path: &Path) -> Result<ConfigSnapshot> {
    let text = fs::read_to_string(path)?;
    let snapshot = serde_json::from_str(&text)?;
    tracing::debug!(path = %path.display(), "loaded snapshot");
    Ok(snapshot)
}

/// Load a snapshot, treating a missing file as an empty one.
pub fn load_or_default(path: &Path) -> Result<ConfigSnapshot> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no snapshot file, starting empty");
        return Ok(ConfigSnapshot::default());
    }
    load(path)
}

/// Save a snapshot with an atomic whole-file replace.
pub fn save(path: &Path, snapshot: &ConfigSnapshot) -> Result<()> {
    let mut text = serde_json::to_string_pretty(snapshot)?;
    text.push('\n');

    let tmp = tmp_path(path);
    fs::write(&tmp, &text)?;
    fs::rename(&tmp, path)?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "saved snapshot");
    Ok(())
}

/// Sibling path with `.tmp` appended to the full file name, so
/// `journal.json` stages through `journal.json.tmp`.
fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use journal_core::config::{Account, ChainRecord, Link};

    fn make_snapshot() -> ConfigSnapshot {
        ConfigSnapshot {
            accounts: vec![Account {
                account: "x1234".to_string(),
                nickname: "main".to_string(),
            }],
            chains: vec![ChainRecord {
                chain_id: "main.240102_103000.XYZ".to_string(),
                transaction_ids: vec!["t1".to_string(), "t2".to_string()],
                comment: Some("earnings play".to_string()),
                ..Default::default()
            }],
            links: vec![Link {
                comment: "roll".to_string(),
                ids: vec!["t2".to_string(), "t3".to_string()],
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");

        save(&path, &make_snapshot()).unwrap();
        let back = load(&path).unwrap();
        assert_eq!(back.accounts[0].nickname, "main");
        assert_eq!(back.chains[0].comment.as_deref(), Some("earnings play"));
        assert_eq!(back.links[0].ids, vec!["t2", "t3"]);
    }

    #[test]
    fn test_save_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");

        save(&path, &make_snapshot()).unwrap();
        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_save_overwrites_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");

        save(&path, &make_snapshot()).unwrap();
        save(&path, &ConfigSnapshot::default()).unwrap();
        let back = load(&path).unwrap();
        assert!(back.accounts.is_empty());
        assert!(back.chains.is_empty());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        let snapshot = load_or_default(&path).unwrap();
        assert!(snapshot.accounts.is_empty());
        // The file stays absent until an explicit save.
        assert!(!path.exists());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load(&path).unwrap_err();
        assert_eq!(err.kind(), "json");
    }

    #[test]
    fn test_saved_file_is_diff_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal.json");
        let snapshot = make_snapshot();

        save(&path, &snapshot).unwrap();
        let first = fs::read_to_string(&path).unwrap();
        save(&path, &snapshot).unwrap();
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
        assert!(first.ends_with('\n'));
    }
}
