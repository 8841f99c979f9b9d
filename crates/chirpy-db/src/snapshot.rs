use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

use chirpy_types::models::{Chirp, User};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::{Result, StoreError};

/// Full in-memory image of the store file.
///
/// `last_chirp_id` and `last_user_id` are high-water marks: they only ever
/// grow, so ids stay unique after deletions. Files written before the marks
/// existed are upgraded on read by taking the largest id present.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub chirps: BTreeMap<u64, Chirp>,
    #[serde(default)]
    pub users: BTreeMap<u64, User>,
    #[serde(default)]
    pub last_chirp_id: u64,
    #[serde(default)]
    pub last_user_id: u64,
}

impl Snapshot {
    pub(crate) fn next_chirp_id(&mut self) -> u64 {
        self.last_chirp_id += 1;
        self.last_chirp_id
    }

    pub(crate) fn next_user_id(&mut self) -> u64 {
        self.last_user_id += 1;
        self.last_user_id
    }

    pub fn user_by_email(&self, email: &str) -> Option<&User> {
        self.users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
    }

    pub fn user_by_refresh_token(&self, token: &str) -> Option<&User> {
        self.users.values().find(|u| u.has_refresh_token(token))
    }

    /// True if some user other than `except` already holds `email`.
    pub(crate) fn email_taken(&self, email: &str, except: Option<u64>) -> bool {
        self.users
            .values()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }

    fn raise_marks(&mut self) {
        let max_chirp = self.chirps.keys().next_back().copied().unwrap_or(0);
        let max_user = self.users.keys().next_back().copied().unwrap_or(0);
        self.last_chirp_id = self.last_chirp_id.max(max_chirp);
        self.last_user_id = self.last_user_id.max(max_user);
    }
}

pub(crate) fn read(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path).map_err(StoreError::Unreadable)?;
    let mut snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(StoreError::Corrupt)?;
    snapshot.raise_marks();
    Ok(snapshot)
}

/// Serialize into a sibling temp file and rename it over `path`, so readers
/// see either the old file or the new one.
pub(crate) fn write(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let bytes = encode(snapshot)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(StoreError::Unwritable)?;
    tmp.write_all(&bytes).map_err(StoreError::Unwritable)?;
    tmp.as_file().sync_all().map_err(StoreError::Unwritable)?;
    tmp.persist(path).map_err(|e| StoreError::Unwritable(e.error))?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// An encoding failure is a failed save, not a corrupt file.
fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StoreError::Unwritable(e.into()))
}

/// Create an empty store file unless one exists. Returns true if created.
pub(crate) fn ensure(path: &Path) -> Result<bool> {
    if path.try_exists().map_err(StoreError::Unreadable)? {
        return Ok(false);
    }

    write(path, &Snapshot::default())?;
    info!("Created empty store at {}", path.display());
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: u64, email: &str) -> User {
        User {
            id,
            email: email.to_string(),
            password_hash: "hash".to_string(),
            refresh_token: String::new(),
            upgraded: false,
        }
    }

    #[test]
    fn ensure_keeps_existing_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");

        assert!(ensure(&path).unwrap());

        let mut snap = read(&path).unwrap();
        snap.users.insert(1, user(1, "a@x.com"));
        write(&path, &snap).unwrap();

        assert!(!ensure(&path).unwrap());
        assert_eq!(read(&path).unwrap().users.len(), 1);
    }

    #[test]
    fn persisted_layout_uses_named_collections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");

        let mut snap = Snapshot::default();
        snap.users.insert(7, user(7, "a@x.com"));
        snap.chirps.insert(
            3,
            Chirp { id: 3, body: "hi".to_string(), author_id: 7 },
        );
        write(&path, &snap).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["chirps"]["3"]["author_id"], 7);
        assert_eq!(raw["users"]["7"]["email"], "a@x.com");
        assert_eq!(raw["users"]["7"]["password_hash"], "hash");
        assert_eq!(raw["users"]["7"]["refresh_token"], "");
        assert_eq!(raw["users"]["7"]["upgraded"], false);
    }

    #[test]
    fn legacy_file_without_marks_is_upgraded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        fs::write(
            &path,
            r#"{"chirps":{"1":{"id":1,"body":"a","author_id":2},"4":{"id":4,"body":"b","author_id":2}},
                "users":{"2":{"id":2,"email":"a@x.com","password_hash":"h"}}}"#,
        )
        .unwrap();

        let snap = read(&path).unwrap();
        assert_eq!(snap.last_chirp_id, 4);
        assert_eq!(snap.last_user_id, 2);
        assert_eq!(snap.users[&2].refresh_token, "");
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        fs::write(&path, b"{not json").unwrap();

        assert!(matches!(read(&path), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn encode_failure_is_unwritable() {
        // JSON object keys must be strings.
        let mut bad = BTreeMap::new();
        bad.insert(vec![1u8, 2], 3u8);

        assert!(matches!(encode(&bad), Err(StoreError::Unwritable(_))));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert!(matches!(read(&path), Err(StoreError::Unreadable(_))));
    }

    #[test]
    fn failed_write_leaves_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("database.json");
        let mut snap = Snapshot::default();
        snap.users.insert(1, user(1, "a@x.com"));
        write(&path, &snap).unwrap();

        // Target is a directory, so the rename cannot succeed.
        let blocked = dir.path().join("blocked");
        fs::create_dir(&blocked).unwrap();
        fs::write(blocked.join("keep"), b"x").unwrap();
        assert!(matches!(
            write(&blocked, &Snapshot::default()),
            Err(StoreError::Unwritable(_))
        ));

        assert_eq!(read(&path).unwrap().users, snap.users);
        let leftovers = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(leftovers, 2);
    }
}
