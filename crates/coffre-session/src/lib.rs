//! `coffre-session` — session guards for an unlocked coffre vault.
//!
//! Wall-clock protections that bound how long decrypted material stays
//! reachable: an auto-lock countdown that asks the owner to drop its MEK
//! copy, and a clipboard manager that clears copied secrets after a
//! timeout. Neither component touches key material itself.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::arithmetic_side_effects))]

pub mod autolock;
pub mod clipboard;
pub mod error;

pub use autolock::AutoLockTimer;
#[cfg(feature = "system-clipboard")]
pub use clipboard::SystemClipboard;
pub use clipboard::{Clipboard, ClipboardManager, MemoryClipboard};
pub use error::SessionError;
