//! Small shared identifiers used across the registry, channels and handlers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque handle identifying one connected session. Stable for the lifetime of the
/// connection; never reused while the session is still registered anywhere.
pub type SessionId = u64;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_session_id() -> SessionId {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}

pub type ChannelName = String;
