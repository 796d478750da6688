//! Per-connection session state, per `SPEC_FULL.md` §3. A `Session` is shared (`Arc`)
//! between its own reader/writer tasks and any other session's handler that needs to
//! read its identity (e.g. to resolve a PRIVMSG target by nickname) or push a line onto
//! its outbound queue (e.g. a channel broadcast). Mutable fields live behind a single
//! `RwLock` rather than one lock per field, since registration and channel membership
//! change together and are read together (the names/mode-line burst on JOIN needs a
//! consistent snapshot).

use std::collections::HashSet;
use std::net::SocketAddr;
use tokio::sync::{mpsc, RwLock};

use crate::types::{ChannelName, SessionId};

/// Three-valued registration tag (SPEC_FULL.md §9): replaces two independent booleans so
/// `registered ∧ ¬authenticated` is not representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationState {
    New,
    Authed,
    Registered,
}

#[derive(Debug, Default)]
struct SessionInner {
    nickname: Option<String>,
    username: Option<String>,
    realname: Option<String>,
    modes: HashSet<char>,
    channels: HashSet<ChannelName>,
}

pub struct Session {
    pub id: SessionId,
    pub addr: SocketAddr,
    outbound: mpsc::UnboundedSender<String>,
    state: RwLock<RegistrationState>,
    inner: RwLock<SessionInner>,
}

impl Session {
    pub fn new(id: SessionId, addr: SocketAddr, outbound: mpsc::UnboundedSender<String>) -> Self {
        Session {
            id,
            addr,
            outbound,
            state: RwLock::new(RegistrationState::New),
            inner: RwLock::new(SessionInner::default()),
        }
    }

    /// Enqueues `line` on the session's outbound queue. Never blocks; a send to a
    /// session whose writer has already gone away (peer disconnected, task torn down)
    /// is silently dropped rather than propagated, matching the fire-and-forget nature
    /// of a broadcast (SPEC_FULL.md §5: a broadcast enqueues into every recipient's
    /// queue regardless of that recipient's own fate).
    pub fn send_line(&self, line: String) {
        let _ = self.outbound.send(line);
    }

    pub async fn state(&self) -> RegistrationState {
        *self.state.read().await
    }

    pub async fn set_state(&self, new_state: RegistrationState) {
        *self.state.write().await = new_state;
    }

    pub async fn nickname(&self) -> Option<String> {
        self.inner.read().await.nickname.clone()
    }

    pub async fn username(&self) -> Option<String> {
        self.inner.read().await.username.clone()
    }

    pub async fn set_nickname(&self, nick: String) {
        self.inner.write().await.nickname = Some(nick);
    }

    pub async fn set_user(&self, username: String, realname: String) {
        let mut inner = self.inner.write().await;
        inner.username = Some(username);
        inner.realname = Some(realname);
    }

    /// If both nickname and username are now set and the session was only `Authed`,
    /// transitions to `Registered` and returns `true` (the caller should send the
    /// welcome burst). Idempotent: already-`Registered` sessions return `false`.
    pub async fn maybe_complete_registration(&self) -> bool {
        let has_identity = {
            let inner = self.inner.read().await;
            inner.nickname.is_some() && inner.username.is_some()
        };
        if !has_identity {
            return false;
        }
        let mut state = self.state.write().await;
        if *state == RegistrationState::Authed {
            *state = RegistrationState::Registered;
            true
        } else {
            false
        }
    }

    pub async fn channels(&self) -> HashSet<ChannelName> {
        self.inner.read().await.channels.clone()
    }

    pub async fn record_join(&self, channel: ChannelName) {
        self.inner.write().await.channels.insert(channel);
    }

    pub async fn record_part(&self, channel: &str) {
        self.inner.write().await.channels.remove(channel);
    }

    pub async fn user_modes(&self) -> HashSet<char> {
        self.inner.read().await.modes.clone()
    }

    pub async fn apply_user_mode(&self, sign: char, letter: char) {
        let mut inner = self.inner.write().await;
        match sign {
            '+' => {
                inner.modes.insert(letter);
            }
            '-' => {
                inner.modes.remove(&letter);
            }
            _ => unreachable!("mode sign is always '+' or '-'"),
        }
    }
}
