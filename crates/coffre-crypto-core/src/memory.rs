//! Secret-holding memory types and the process CSPRNG front end.
//!
//! Every buffer that carries key material lives in one of the wrappers
//! here: [`SecretBuffer`] for variable-length data, [`SecretBytes`] for
//! fixed-length keys. Both zero their contents on drop, lock their pages
//! in RAM where the platform allows it, and mask `Debug`/`Display` output.
//!
//! Random material comes from [`random_bytes`] / [`random_array`], which
//! read the OS CSPRNG and fail only when it does — with no partial output.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretSlice};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

// ---------------------------------------------------------------------------
// CSPRNG front end
// ---------------------------------------------------------------------------

/// Read `len` bytes from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::EntropySource`] if the OS source is unavailable.
/// Nothing is returned on failure; the buffer never leaves this function
/// partially filled.
pub fn random_bytes(len: usize) -> Result<Vec<u8>, CryptoError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::EntropySource(format!("OS CSPRNG read failed: {e}")))?;
    Ok(bytes)
}

/// Read a fixed-size array from the OS CSPRNG.
///
/// # Errors
///
/// Returns [`CryptoError::EntropySource`] if the OS source is unavailable.
pub fn random_array<const N: usize>() -> Result<[u8; N], CryptoError> {
    let mut bytes = [0u8; N];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| CryptoError::EntropySource(format!("OS CSPRNG read failed: {e}")))?;
    Ok(bytes)
}

// ---------------------------------------------------------------------------
// Page locking
// ---------------------------------------------------------------------------

/// RAII guard that `mlock`s a memory region and unlocks it on drop.
///
/// Locking is best-effort: if `mlock` fails (privileges, `RLIMIT_MEMLOCK`),
/// the region stays unlocked, a one-time warning is printed, and no error
/// is raised. Zeroization on drop does not depend on lock status.
pub struct LockedRegion {
    ptr: *const u8,
    len: usize,
    locked: bool,
}

// SAFETY: the pointer is only handed to mlock/munlock, which are
// thread-safe; the pointed-to data is owned by the enclosing secret type
// and never dereferenced through LockedRegion.
unsafe impl Send for LockedRegion {}
unsafe impl Sync for LockedRegion {}

impl LockedRegion {
    /// Attempt to lock `len` bytes at `ptr`. The caller guarantees the
    /// region stays valid for the guard's lifetime; external consumers go
    /// through [`SecretBuffer`] / [`SecretBytes`], which manage this.
    #[must_use]
    pub(crate) fn try_lock(ptr: *const u8, len: usize) -> Self {
        let locked = platform::try_mlock(ptr, len);
        if !locked && len > 0 {
            static WARNED: std::sync::Once = std::sync::Once::new();
            WARNED.call_once(|| {
                eprintln!(
                    "[coffre-crypto-core] WARNING: mlock failed — key material \
                     may be swapped to disk (check RLIMIT_MEMLOCK)"
                );
            });
        }
        Self { ptr, len, locked }
    }

    /// Returns `true` if the region is currently locked.
    #[must_use]
    pub const fn is_locked(&self) -> bool {
        self.locked
    }

    const fn unlocked() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
            locked: false,
        }
    }
}

impl Drop for LockedRegion {
    fn drop(&mut self) {
        if self.locked {
            platform::try_munlock(self.ptr, self.len);
        }
    }
}

// ---------------------------------------------------------------------------
// SecretBuffer — variable-length
// ---------------------------------------------------------------------------

/// Variable-length buffer for sensitive data.
///
/// Backed by [`SecretSlice<u8>`], which zeroizes on drop; the allocation is
/// additionally `mlock`'d (soft fallback) and `Debug`/`Display` print a
/// fixed mask.
pub struct SecretBuffer {
    inner: SecretSlice<u8>,
    lock: LockedRegion,
}

impl SecretBuffer {
    /// Copy `data` into a new secret allocation. The caller should zeroize
    /// the source afterwards.
    #[must_use]
    pub fn new(data: &[u8]) -> Self {
        let inner: SecretSlice<u8> = data.to_vec().into();
        let exposed = inner.expose_secret();
        let lock = LockedRegion::try_lock(exposed.as_ptr(), exposed.len());
        Self { inner, lock }
    }

    /// A buffer of `len` bytes drawn from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EntropySource`] if the CSPRNG fails.
    pub fn random(len: usize) -> Result<Self, CryptoError> {
        let mut bytes = random_bytes(len)?;
        let buffer = Self::new(&bytes);
        bytes.zeroize();
        Ok(buffer)
    }

    /// Expose the underlying bytes. Keep the exposure scope minimal —
    /// prefer using the slice within a single expression.
    #[must_use]
    pub fn expose(&self) -> &[u8] {
        self.inner.expose_secret()
    }

    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Returns `true` if the buffer holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the allocation is `mlock`'d.
    #[must_use]
    pub const fn is_mlocked(&self) -> bool {
        self.lock.is_locked()
    }
}

impl fmt::Debug for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

impl fmt::Display for SecretBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretBuffer(***)")
    }
}

// ---------------------------------------------------------------------------
// SecretBytes<N> — fixed-length
// ---------------------------------------------------------------------------

/// Fixed-length container for keys and other fixed-size secrets.
///
/// Derives `Zeroize + ZeroizeOnDrop`, so the bytes are erased when the
/// value goes out of scope on any path.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes<const N: usize> {
    bytes: [u8; N],
    // The lock guard manages its own Drop; it must not be zeroized.
    #[zeroize(skip)]
    lock: LockedRegion,
}

impl<const N: usize> SecretBytes<N> {
    /// Wrap a fixed-size array.
    ///
    /// The lock is taken at the array's current address. If the value is
    /// later moved the guard keeps pointing at the old address; `munlock`
    /// on a stale address is a harmless no-op and zeroize-on-drop is
    /// unaffected, so this stays best-effort rather than unsound.
    #[must_use]
    pub fn new(data: [u8; N]) -> Self {
        let mut secret = Self {
            bytes: data,
            lock: LockedRegion::unlocked(),
        };
        secret.lock = LockedRegion::try_lock(secret.bytes.as_ptr(), N);
        secret
    }

    /// A fresh secret drawn from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EntropySource`] if the CSPRNG fails.
    pub fn random() -> Result<Self, CryptoError> {
        let mut bytes = random_array::<N>()?;
        let secret = Self::new(bytes);
        bytes.zeroize();
        Ok(secret)
    }

    /// Expose the underlying bytes for a cryptographic operation.
    #[must_use]
    pub const fn expose(&self) -> &[u8; N] {
        &self.bytes
    }

    /// Returns `true` if the bytes are `mlock`'d.
    #[must_use]
    pub const fn is_mlocked(&self) -> bool {
        self.lock.is_locked()
    }
}

impl<const N: usize> fmt::Debug for SecretBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes<{N}>(***)")
    }
}

impl<const N: usize> fmt::Display for SecretBytes<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes<{N}>(***)")
    }
}

impl<const N: usize> From<[u8; N]> for SecretBytes<N> {
    fn from(data: [u8; N]) -> Self {
        Self::new(data)
    }
}

// ---------------------------------------------------------------------------
// Process hardening
// ---------------------------------------------------------------------------

/// Disable core dumps for the current process.
///
/// On Unix this sets `RLIMIT_CORE` to zero (soft and hard); elsewhere it is
/// a no-op. Call once at startup, before any secret is in memory.
///
/// # Errors
///
/// Returns [`CryptoError::SecureMemory`] if the `setrlimit` call fails.
pub fn disable_core_dumps() -> Result<(), CryptoError> {
    platform::disable_core_dumps_impl()
}

// ---------------------------------------------------------------------------
// Platform back ends
// ---------------------------------------------------------------------------

#[cfg(unix)]
mod platform {
    use crate::error::CryptoError;

    pub(super) fn try_mlock(ptr: *const u8, len: usize) -> bool {
        if len == 0 {
            return true;
        }
        // SAFETY: mlock accepts any valid pointer/length pair; an invalid
        // range makes the kernel return an error we treat as "not locked".
        unsafe { libc::mlock(ptr.cast(), len) == 0 }
    }

    pub(super) fn try_munlock(ptr: *const u8, len: usize) {
        if len == 0 {
            return;
        }
        // SAFETY: munlock failure is non-critical and ignored.
        unsafe {
            libc::munlock(ptr.cast(), len);
        }
    }

    pub(super) fn disable_core_dumps_impl() -> Result<(), CryptoError> {
        let limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        // SAFETY: setrlimit with RLIMIT_CORE is a standard POSIX call.
        let ret = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &raw const limit) };
        if ret != 0 {
            return Err(CryptoError::SecureMemory(
                "failed to disable core dumps via RLIMIT_CORE".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(not(unix))]
mod platform {
    use crate::error::CryptoError;

    pub(super) fn try_mlock(_ptr: *const u8, _len: usize) -> bool {
        false
    }

    pub(super) fn try_munlock(_ptr: *const u8, _len: usize) {}

    pub(super) fn disable_core_dumps_impl() -> Result<(), CryptoError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
