//! Clipboard handling with auto-clear.
//!
//! Copied secrets are forgotten on a timer: [`ClipboardManager::copy`]
//! schedules a clear that only runs if the clipboard still holds what we
//! put there, so content the user has since copied elsewhere is never
//! clobbered. Ownership is an exact string comparison; if a platform turns
//! out to normalize clipboard content (line endings, trailing whitespace),
//! the comparison should move to a content hash plus copy timestamp.
//!
//! The platform clipboard sits behind the [`Clipboard`] trait:
//! [`SystemClipboard`] talks to the OS, [`MemoryClipboard`] backs tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::error::SessionError;

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Minimal platform clipboard capability.
pub trait Clipboard: Send + Sync {
    /// Current clipboard text; empty string when the clipboard is empty.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Clipboard`] when the platform read fails.
    fn read(&self) -> Result<String, SessionError>;

    /// Replace the clipboard content with `text`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Clipboard`] when the platform write fails.
    fn write(&self, text: &str) -> Result<(), SessionError>;

    /// `false` on platforms with no usable clipboard.
    fn is_supported(&self) -> bool;
}

/// System clipboard via `arboard`.
///
/// A fresh handle is opened per call; keeping one open would hold the
/// selection on X11 and block other clients.
#[cfg(feature = "system-clipboard")]
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClipboard;

#[cfg(feature = "system-clipboard")]
impl Clipboard for SystemClipboard {
    fn read(&self) -> Result<String, SessionError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| SessionError::Clipboard(format!("clipboard unavailable: {e}")))?;
        match clipboard.get_text() {
            Ok(text) => Ok(text),
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(e) => Err(SessionError::Clipboard(format!("clipboard read failed: {e}"))),
        }
    }

    fn write(&self, text: &str) -> Result<(), SessionError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| SessionError::Clipboard(format!("clipboard unavailable: {e}")))?;
        clipboard
            .set_text(text.to_owned())
            .map_err(|e| SessionError::Clipboard(format!("clipboard write failed: {e}")))
    }

    fn is_supported(&self) -> bool {
        arboard::Clipboard::new().is_ok()
    }
}

/// In-memory clipboard for tests.
///
/// Supports simulating an unsupported platform and external overwrites
/// (another application taking the clipboard).
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    content: Mutex<String>,
    unsupported: bool,
}

impl MemoryClipboard {
    /// A working, empty clipboard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A clipboard that reports itself unsupported.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            content: Mutex::new(String::new()),
            unsupported: true,
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn read(&self) -> Result<String, SessionError> {
        if self.unsupported {
            return Err(SessionError::ClipboardUnavailable);
        }
        Ok(self
            .content
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn write(&self, text: &str) -> Result<(), SessionError> {
        if self.unsupported {
            return Err(SessionError::ClipboardUnavailable);
        }
        *self.content.lock().unwrap_or_else(PoisonError::into_inner) = text.to_owned();
        Ok(())
    }

    fn is_supported(&self) -> bool {
        !self.unsupported
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Clipboard front end with auto-clear.
///
/// All mutation is serialized by one internal lock. The scheduled clear
/// task holds no lock while sleeping; when it wakes it re-acquires the
/// lock, and a generation check discards tasks that lost a race against a
/// newer `copy` or a `cancel_clear`. Must be used from within a tokio
/// runtime when a clear timeout is configured.
pub struct ClipboardManager {
    backend: Arc<dyn Clipboard>,
    state: Arc<Mutex<ClipState>>,
}

struct ClipState {
    timeout: Duration,
    last_copied: Option<String>,
    clear_task: Option<JoinHandle<()>>,
    generation: u64,
}

impl ClipboardManager {
    /// Create a manager over `backend`; `timeout` of zero disables
    /// auto-clear.
    #[must_use]
    pub fn new(backend: Arc<dyn Clipboard>, timeout: Duration) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(ClipState {
                timeout,
                last_copied: None,
                clear_task: None,
                generation: 0,
            })),
        }
    }

    /// Copy `text` and schedule the auto-clear.
    ///
    /// Any previously pending clear is cancelled first.
    ///
    /// # Errors
    ///
    /// [`SessionError::ClipboardUnavailable`] on unsupported platforms;
    /// [`SessionError::Clipboard`] when the write fails.
    pub fn copy(&self, text: &str) -> Result<(), SessionError> {
        let mut state = self.lock();
        self.write_and_remember(&mut state, text)?;
        self.schedule_clear(&mut state, None);
        Ok(())
    }

    /// [`copy`](Self::copy), plus a one-shot signal that resolves with
    /// `true` once the scheduled clear has run.
    ///
    /// If no clear is scheduled (zero timeout) or the schedule is later
    /// cancelled, the sender side is dropped and the receiver resolves to
    /// an error instead — the caller learns that no clear will fire.
    ///
    /// # Errors
    ///
    /// As [`copy`](Self::copy).
    pub fn copy_with_notification(
        &self,
        text: &str,
    ) -> Result<oneshot::Receiver<bool>, SessionError> {
        let mut state = self.lock();
        self.write_and_remember(&mut state, text)?;
        let (sender, receiver) = oneshot::channel();
        self.schedule_clear(&mut state, Some(sender));
        Ok(receiver)
    }

    /// Clear the clipboard iff it still holds the last copied text; the
    /// remembered text is forgotten either way.
    ///
    /// # Errors
    ///
    /// [`SessionError::ClipboardUnavailable`] on unsupported platforms;
    /// [`SessionError::Clipboard`] when the read or write fails (the
    /// remembered text is kept on failure so a retry can still match).
    pub fn clear(&self) -> Result<(), SessionError> {
        let mut state = self.lock();
        Self::clear_now(&self.backend, &mut state)
    }

    /// Drop the pending auto-clear without touching clipboard contents.
    pub fn cancel_clear(&self) {
        let mut state = self.lock();
        Self::cancel_pending(&mut state);
    }

    /// Change the auto-clear timeout for subsequent copies.
    pub fn set_timeout(&self, timeout: Duration) {
        self.lock().timeout = timeout;
    }

    /// Returns `true` if the platform clipboard is usable.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_supported()
    }

    fn lock(&self) -> MutexGuard<'_, ClipState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_and_remember(
        &self,
        state: &mut ClipState,
        text: &str,
    ) -> Result<(), SessionError> {
        if !self.backend.is_supported() {
            return Err(SessionError::ClipboardUnavailable);
        }
        Self::cancel_pending(state);
        self.backend.write(text)?;
        state.last_copied = Some(text.to_owned());
        Ok(())
    }

    fn schedule_clear(&self, state: &mut ClipState, notify: Option<oneshot::Sender<bool>>) {
        if state.timeout.is_zero() {
            return;
        }

        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let timeout = state.timeout;
        let backend = Arc::clone(&self.backend);
        let shared = Arc::clone(&self.state);

        state.clear_task = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let fired = Self::clear_if_current(&backend, &shared, generation);
            if let Some(sender) = notify {
                let _ = sender.send(fired);
            }
        }));
    }

    fn clear_if_current(
        backend: &Arc<dyn Clipboard>,
        shared: &Arc<Mutex<ClipState>>,
        generation: u64,
    ) -> bool {
        let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation != generation {
            // A newer copy or cancel superseded this schedule.
            return false;
        }
        state.clear_task = None;
        if let Err(error) = Self::clear_now(backend, &mut state) {
            tracing::warn!(%error, "scheduled clipboard clear failed");
        }
        true
    }

    fn clear_now(
        backend: &Arc<dyn Clipboard>,
        state: &mut ClipState,
    ) -> Result<(), SessionError> {
        if !backend.is_supported() {
            return Err(SessionError::ClipboardUnavailable);
        }

        let current = backend.read()?;
        if state.last_copied.as_deref() == Some(current.as_str()) {
            backend.write("")?;
        }
        state.last_copied = None;
        Ok(())
    }

    fn cancel_pending(state: &mut ClipState) {
        if let Some(task) = state.clear_task.take() {
            task.abort();
        }
        state.generation = state.generation.wrapping_add(1);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
