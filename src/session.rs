//! One caption edit, from the moment the dialog opens until it is saved or
//! cancelled.

use crate::error::{CaptionError, Result};
use crate::storage::CaptionStore;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// An open caption edit.
///
/// `original` is the text as it was on disk when the session opened and is
/// never modified; `working` is what the user is typing. Saving or closing
/// consumes the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionSession {
    target: PathBuf,
    original: String,
    working: String,
}

/// A commit that could not be persisted. The session comes back unchanged so
/// the edit can be retried.
#[derive(Debug, Error)]
#[error("{error}")]
pub struct CommitFailed {
    pub session: CaptionSession,
    #[source]
    pub error: CaptionError,
}

impl CaptionSession {
    pub fn open<S: CaptionStore + ?Sized>(target: impl Into<PathBuf>, store: &S) -> Result<Self> {
        let target = target.into();
        let original = store.read(&target)?;
        debug!("opened caption session for {}", target.display());
        Ok(Self {
            working: original.clone(),
            original,
            target,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn original_text(&self) -> &str {
        &self.original
    }

    pub fn working_text(&self) -> &str {
        &self.working
    }

    /// Buffer handed to the text box; edits stay in memory.
    pub fn working_text_mut(&mut self) -> &mut String {
        &mut self.working
    }

    pub fn edit(&mut self, text: impl Into<String>) {
        self.working = text.into();
    }

    /// Throw away in-session edits. Storage is not touched.
    pub fn discard(&mut self) {
        self.working.clone_from(&self.original);
    }

    pub fn is_modified(&self) -> bool {
        self.working != self.original
    }

    /// Persist the working text and end the session.
    pub fn commit<S: CaptionStore + ?Sized>(
        self,
        store: &S,
    ) -> std::result::Result<String, CommitFailed> {
        match store.write(&self.target, &self.working) {
            Ok(()) => {
                info!("saved caption {}", self.target.display());
                Ok(self.working)
            }
            Err(error) => {
                warn!("could not save {}: {error}", self.target.display());
                Err(CommitFailed {
                    session: self,
                    error,
                })
            }
        }
    }

    /// End the session without saving.
    pub fn close(self) {
        if self.is_modified() {
            debug!("dropping unsaved edits to {}", self.target.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::io;

    #[derive(Default)]
    struct MemoryStore {
        files: RefCell<HashMap<PathBuf, String>>,
        read_only: bool,
    }

    impl MemoryStore {
        fn with(files: &[(&str, &str)]) -> Self {
            let files = files
                .iter()
                .map(|(p, t)| (PathBuf::from(p), t.to_string()))
                .collect();
            Self {
                files: RefCell::new(files),
                read_only: false,
            }
        }

        fn get(&self, path: &str) -> Option<String> {
            self.files.borrow().get(Path::new(path)).cloned()
        }
    }

    impl CaptionStore for MemoryStore {
        fn read(&self, path: &Path) -> Result<String> {
            self.files
                .borrow()
                .get(path)
                .cloned()
                .ok_or_else(|| CaptionError::read(path, io::Error::from(io::ErrorKind::NotFound)))
        }

        fn write(&self, path: &Path, text: &str) -> Result<()> {
            if self.read_only {
                return Err(CaptionError::write(
                    path,
                    io::Error::from(io::ErrorKind::PermissionDenied),
                ));
            }
            self.files
                .borrow_mut()
                .insert(path.to_path_buf(), text.to_owned());
            Ok(())
        }
    }

    #[test]
    fn open_snapshots_original() {
        let store = MemoryStore::with(&[("a.txt", "cat")]);
        let s = CaptionSession::open("a.txt", &store).unwrap();
        assert_eq!(s.original_text(), "cat");
        assert_eq!(s.working_text(), "cat");
        assert!(!s.is_modified());
    }

    #[test]
    fn open_missing_caption_fails() {
        let store = MemoryStore::default();
        let err = CaptionSession::open("a.txt", &store).unwrap_err();
        assert!(matches!(err, CaptionError::Read { .. }));
    }

    #[test]
    fn discard_always_restores_original() {
        let store = MemoryStore::with(&[("a.txt", "cat")]);
        let mut s = CaptionSession::open("a.txt", &store).unwrap();
        for text in ["kitten", "", "a much longer caption"] {
            s.edit(text);
            assert!(s.is_modified());
            s.discard();
            assert_eq!(s.working_text(), "cat");
            s.discard();
            assert_eq!(s.working_text(), s.original_text());
        }
    }

    #[test]
    fn edit_after_discard_keeps_session_usable() {
        let store = MemoryStore::with(&[("a.txt", "cat")]);
        let mut s = CaptionSession::open("a.txt", &store).unwrap();
        s.working_text_mut().push_str(" on a mat");
        s.discard();
        s.edit("tabby");
        assert_eq!(store.get("a.txt").as_deref(), Some("cat"));
        assert_eq!(s.commit(&store).unwrap(), "tabby");
    }

    #[test]
    fn commit_persists_and_reopen_sees_it() {
        let store = MemoryStore::with(&[("a.txt", "cat"), ("b.txt", "dog")]);
        let mut s = CaptionSession::open("a.txt", &store).unwrap();
        s.edit("kitten");
        assert_eq!(s.working_text(), "kitten");
        s.discard();
        assert_eq!(s.working_text(), "cat");
        s.edit("kitten");
        let saved = s.commit(&store).unwrap();
        assert_eq!(saved, "kitten");
        assert_eq!(store.get("a.txt").as_deref(), Some("kitten"));
        assert_eq!(store.get("b.txt").as_deref(), Some("dog"));

        let again = CaptionSession::open("a.txt", &store).unwrap();
        assert_eq!(again.original_text(), "kitten");
    }

    #[test]
    fn failed_commit_hands_back_edits() {
        let mut store = MemoryStore::with(&[("a.txt", "cat")]);
        store.read_only = true;
        let mut s = CaptionSession::open("a.txt", &store).unwrap();
        s.edit("kitten");
        let failed = s.commit(&store).unwrap_err();
        assert!(matches!(failed.error, CaptionError::Write { .. }));
        assert_eq!(failed.session.working_text(), "kitten");
        assert_eq!(failed.session.original_text(), "cat");
        assert_eq!(store.get("a.txt").as_deref(), Some("cat"));

        store.read_only = false;
        assert_eq!(failed.session.commit(&store).unwrap(), "kitten");
    }

    #[test]
    fn close_writes_nothing() {
        let store = MemoryStore::with(&[("a.txt", "cat")]);
        let mut s = CaptionSession::open("a.txt", &store).unwrap();
        s.edit("kitten");
        s.close();
        assert_eq!(store.get("a.txt").as_deref(), Some("cat"));
    }
}
