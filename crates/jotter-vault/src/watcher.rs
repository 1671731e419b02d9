//! Posts folder watcher.
//!
//! Translates `notify` events into [`VaultEvent`]s for post files only, so
//! `jotter watch` can re-migrate a post as soon as its file is saved.
//! Editors tend to emit several events per save; [`VaultWatcher::next_batch`]
//! folds those into one event per file.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use jotter_core::error::{BlogError, Result};

use crate::is_post_file;

/// Something happened to a post file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    /// Written, created, or renamed into place.
    Changed(PathBuf),
    /// Deleted or renamed away.
    Removed(PathBuf),
}

impl VaultEvent {
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Changed(path) | Self::Removed(path) => path,
        }
    }
}

/// Map one raw file system event on `path` to a post event.
///
/// Returns `None` for files that are not posts and for access or metadata
/// only events.
#[must_use]
pub fn classify(kind: &EventKind, path: &Path) -> Option<VaultEvent> {
    if !is_post_file(path) {
        return None;
    }
    let path = path.to_path_buf();
    match kind {
        EventKind::Create(_) => Some(VaultEvent::Changed(path)),
        EventKind::Modify(ModifyKind::Metadata(_)) => None,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(VaultEvent::Removed(path)),
        EventKind::Modify(_) => Some(VaultEvent::Changed(path)),
        EventKind::Remove(_) => Some(VaultEvent::Removed(path)),
        _ => None,
    }
}

/// Watches one posts folder (not its subfolders).
pub struct VaultWatcher {
    // Dropping the notify handle stops the watch.
    _handle: RecommendedWatcher,
    events: Receiver<VaultEvent>,
}

impl VaultWatcher {
    /// Start watching `posts_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`BlogError::Vault`] if the platform watcher cannot be set up
    /// or the folder cannot be watched.
    pub fn start(posts_dir: &Path) -> Result<Self> {
        let (sender, events) = mpsc::channel();

        let mut handle = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for vault_event in event.paths.iter().filter_map(|p| classify(&event.kind, p)) {
                    if sender.send(vault_event).is_err() {
                        return;
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "watch error"),
        })
        .map_err(|e| BlogError::Vault(format!("cannot start watcher: {e}")))?;

        handle
            .watch(posts_dir, RecursiveMode::NonRecursive)
            .map_err(|e| BlogError::Vault(format!("cannot watch {}: {e}", posts_dir.display())))?;

        Ok(Self {
            _handle: handle,
            events,
        })
    }

    /// Block until the next post event. `None` once the watcher is gone.
    pub fn next_event(&self) -> Option<VaultEvent> {
        self.events.recv().ok()
    }

    /// Like [`VaultWatcher::next_event`], giving up after `timeout`.
    pub fn next_event_timeout(&self, timeout: Duration) -> Option<VaultEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Block for the next event, then wait `settle` for the rest of the
    /// burst and return one event per file, latest state wins, in the order
    /// files were first seen.
    pub fn next_batch(&self, settle: Duration) -> Vec<VaultEvent> {
        let Some(first) = self.next_event() else {
            return Vec::new();
        };
        let mut batch = vec![first];
        while let Some(event) = self.next_event_timeout(settle) {
            batch.push(event);
        }
        coalesce(batch)
    }
}

/// Keep the last event per path, positioned where the path first appeared.
fn coalesce(events: Vec<VaultEvent>) -> Vec<VaultEvent> {
    let mut merged: Vec<VaultEvent> = Vec::with_capacity(events.len());
    for event in events {
        match merged.iter_mut().find(|seen| seen.path() == event.path()) {
            Some(seen) => *seen = event,
            None => merged.push(event),
        }
    }
    merged
}
