//! Local files: cached display name and the pending session draft
//!
//! Neither file is authoritative. The server owns history and stats; the
//! draft only holds climbs that have not been saved yet, so a failed finish
//! (or a closed terminal) never loses them.
//!
//! Commands that change the draft or submit it hold a [`DraftLock`], an
//! advisory `flock` on `active_session.json.lock`, for their whole run. Two
//! overlapping `finish` runs therefore cannot both post the same climbs.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::SessionState;

#[derive(Debug, Serialize, Deserialize)]
struct Profile {
    user_name: String,
}

/// Reads and writes cragbook's local JSON files
#[derive(Debug, Clone)]
pub struct LocalStore {
    draft_path: PathBuf,
    profile_path: PathBuf,
}

impl LocalStore {
    pub fn new(draft_path: impl Into<PathBuf>, profile_path: impl Into<PathBuf>) -> Self {
        Self {
            draft_path: draft_path.into(),
            profile_path: profile_path.into(),
        }
    }

    /// Store at the XDG locations from [`Config`]
    pub fn from_xdg() -> Self {
        Self::new(Config::draft_path(), Config::profile_path())
    }

    /// Store rooted in one directory (used by tests)
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join("active_session.json"), dir.join("profile.json"))
    }

    pub fn draft_path(&self) -> &Path {
        &self.draft_path
    }

    /// Take the exclusive draft lock without waiting.
    ///
    /// Fails with [`Error::SaveInProgress`] while another process holds it.
    pub fn lock_draft(&self) -> Result<DraftLock> {
        if let Some(parent) = self.draft_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let path = self.draft_path.with_extension("json.lock");
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        match lock_file_nonblocking(&file) {
            Ok(()) => {
                // Owner info for debugging only.
                let _ = file.set_len(0);
                let _ = file.seek(SeekFrom::Start(0));
                let _ = writeln!(file, "pid={}", std::process::id());
                let _ = file.flush();
                Ok(DraftLock { file })
            }
            Err(e) if is_lock_busy(&e) => {
                tracing::warn!(path = %path.display(), "Draft is locked by another cragbook process");
                Err(Error::SaveInProgress)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Last display name that started a session.
    ///
    /// A missing or unreadable file yields `None`; this is a convenience only.
    pub fn load_user_name(&self) -> Option<String> {
        let content = match fs::read_to_string(&self.profile_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.profile_path.display(), error = %e, "Could not read profile");
                return None;
            }
        };
        match serde_json::from_str::<Profile>(&content) {
            Ok(profile) if !profile.user_name.trim().is_empty() => Some(profile.user_name),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(path = %self.profile_path.display(), error = %e, "Ignoring corrupt profile");
                None
            }
        }
    }

    pub fn save_user_name(&self, user_name: &str) -> Result<()> {
        let profile = Profile {
            user_name: user_name.trim().to_string(),
        };
        write_json(&self.profile_path, &profile)
    }

    /// The pending session, if one was left open
    pub fn load_draft(&self) -> Result<Option<SessionState>> {
        let content = match fs::read_to_string(&self.draft_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session: SessionState = serde_json::from_str(&content)?;
        Ok(Some(session.validated()?))
    }

    pub fn save_draft(&self, session: &SessionState) -> Result<()> {
        write_json(&self.draft_path, session)?;
        tracing::debug!(path = %self.draft_path.display(), climbs = session.len(), "Saved session draft");
        Ok(())
    }

    /// Remove the draft; a missing file is fine
    pub fn clear_draft(&self) -> Result<()> {
        match fs::remove_file(&self.draft_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Exclusive hold on the session draft, released on drop.
///
/// The lock file itself is left in place; removing it would let a waiting
/// process lock an unlinked inode.
#[derive(Debug)]
pub struct DraftLock {
    file: File,
}

impl Drop for DraftLock {
    fn drop(&mut self) {
        let _ = unlock_file(&self.file);
    }
}

fn is_lock_busy(error: &io::Error) -> bool {
    matches!(error.kind(), io::ErrorKind::WouldBlock)
        || matches!(error.raw_os_error(), Some(11) | Some(35))
}

const LOCK_EX: i32 = 2;
const LOCK_NB: i32 = 4;
const LOCK_UN: i32 = 8;

fn lock_file_nonblocking(file: &File) -> io::Result<()> {
    // SAFETY: flock is called with a valid file descriptor and constant flags.
    let rc = unsafe { flock(file.as_raw_fd(), LOCK_EX | LOCK_NB) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

fn unlock_file(file: &File) -> io::Result<()> {
    // SAFETY: flock is called with a valid file descriptor and constant flags.
    let rc = unsafe { flock(file.as_raw_fd(), LOCK_UN) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

extern "C" {
    fn flock(fd: i32, operation: i32) -> i32;
}

#[cfg(not(unix))]
compile_error!("cragbook draft locks currently require Unix (macOS/Linux)");

/// Write via a sibling temp file so a crash never leaves half a file behind
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, serde_json::to_vec_pretty(value)?)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grades::GradeRegistry;
    use crate::types::{AscentType, ClimbInput, Discipline};
    use tempfile::TempDir;

    #[test]
    fn test_user_name_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::in_dir(&dir.path().join("nested"));

        assert_eq!(store.load_user_name(), None);
        store.save_user_name("  Priya ").unwrap();
        assert_eq!(store.load_user_name().as_deref(), Some("Priya"));
    }

    #[test]
    fn test_corrupt_profile_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::in_dir(dir.path());
        fs::write(dir.path().join("profile.json"), "{not json").unwrap();
        assert_eq!(store.load_user_name(), None);
    }

    #[test]
    fn test_draft_keeps_climbs_and_order() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::in_dir(dir.path());
        let registry = GradeRegistry::builtin();

        assert!(store.load_draft().unwrap().is_none());

        let mut session = SessionState::start("Mark", Discipline::Bouldering, "Stonegoat").unwrap();
        session
            .log_climb(&registry, ClimbInput::new("Orange", AscentType::Send))
            .unwrap();
        session
            .log_climb(&registry, ClimbInput::new("Red", AscentType::Attempt).with_notes("slab"))
            .unwrap();
        store.save_draft(&session).unwrap();

        let restored = store.load_draft().unwrap().unwrap();
        assert_eq!(restored.user_name(), "Mark");
        assert_eq!(restored.gym(), "Stonegoat");
        assert_eq!(restored.climbs(), session.climbs());
        assert!(!restored.is_saving());

        store.clear_draft().unwrap();
        assert!(store.load_draft().unwrap().is_none());
        store.clear_draft().unwrap();
    }

    #[test]
    fn test_draft_lock_is_exclusive() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::in_dir(&dir.path().join("data"));

        let held = store.lock_draft().unwrap();
        // flock conflicts between separate opens, even within one process
        let second = store.lock_draft();
        assert!(matches!(second, Err(Error::SaveInProgress)));

        drop(held);
        let again = store.lock_draft().unwrap();
        drop(again);
    }

    #[test]
    fn test_invalid_draft_is_rejected() {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::in_dir(dir.path());
        fs::write(store.draft_path(), "[]").unwrap();
        assert!(store.load_draft().is_err());
    }
}
