//! Shared server state: the session table, the channel table, and the nickname index,
//! per `SPEC_FULL.md` §3 and §9. `dashmap` replaces the single global lock a naive
//! translation of the reactor's single-threaded data structures would need — each
//! session and channel is independently lockable, so two unrelated JOINs never
//! contend with each other.

use std::net::IpAddr;
use std::sync::Arc;

use dashmap::DashMap;

use crate::channel::Channel;
use crate::config::Config;
use crate::session::Session;
use crate::types::{ChannelName, SessionId};

pub struct Registry {
    pub server_name: String,
    pub config: Config,
    password: String,
    sessions: DashMap<SessionId, Arc<Session>>,
    channels: DashMap<ChannelName, Arc<Channel>>,
    /// Nickname to `SessionId`, byte-exact (SPEC_FULL.md §9: nicknames are
    /// case-sensitive, compared as-is, not folded per the historical IRC casemap).
    nicknames: DashMap<String, SessionId>,
    /// Per-IP connection counts, enforcing `config.limits.max_connections_per_ip`
    /// (SPEC_FULL.md §10.3).
    ip_counts: DashMap<IpAddr, usize>,
}

impl Registry {
    pub fn new(server_name: String, password: String, config: Config) -> Self {
        Registry {
            server_name,
            config,
            password,
            sessions: DashMap::new(),
            channels: DashMap::new(),
            nicknames: DashMap::new(),
            ip_counts: DashMap::new(),
        }
    }

    /// `true` if accepting one more connection from `ip` would stay within both the
    /// global `max_connections` cap and the per-IP `max_connections_per_ip` cap.
    /// Reserves the slot on success; callers that decide not to proceed must call
    /// [`Registry::release_connection`] to give it back.
    pub fn try_reserve_connection(&self, ip: IpAddr) -> bool {
        if self.sessions.len() >= self.config.network.max_connections {
            return false;
        }
        let mut count = self.ip_counts.entry(ip).or_insert(0);
        if *count >= self.config.limits.max_connections_per_ip {
            return false;
        }
        *count += 1;
        true
    }

    pub fn release_connection(&self, ip: IpAddr) {
        if let dashmap::mapref::entry::Entry::Occupied(mut entry) = self.ip_counts.entry(ip) {
            let count = entry.get_mut();
            *count -= 1;
            if *count == 0 {
                entry.remove();
            }
        }
    }

    pub fn check_password(&self, given: &str) -> bool {
        given == self.password
    }

    pub fn insert_session(&self, session: Arc<Session>) {
        self.sessions.insert(session.id, session);
    }

    pub fn get_session(&self, id: SessionId) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Drops the session's entry and its nickname reservation, if any. Does not touch
    /// channel membership; the caller (QUIT / connection-loss handling) is responsible
    /// for removing the session from every channel it belongs to and broadcasting the
    /// departure, since that needs the session's own record of which channels it was in.
    pub fn remove_session(&self, id: SessionId) -> Option<Arc<Session>> {
        let removed = self.sessions.remove(&id).map(|(_, session)| session);
        self.nicknames.retain(|_, owner| *owner != id);
        removed
    }

    pub fn lookup_by_nickname(&self, nick: &str) -> Option<Arc<Session>> {
        let id = *self.nicknames.get(nick)?.value();
        self.get_session(id)
    }

    pub fn nickname_in_use(&self, nick: &str) -> bool {
        self.nicknames.contains_key(nick)
    }

    /// Reserves `nick` for `id`, releasing any prior reservation `id` held. Fails (and
    /// changes nothing) if `nick` is already owned by a different session.
    ///
    /// Claims `nick` through a single `entry` call so the check-and-insert is atomic
    /// under DashMap's per-shard locking: two sessions racing to claim the same name can
    /// never both observe it free, unlike a separate `get` followed by `insert`.
    pub fn reserve_nickname(&self, id: SessionId, nick: &str) -> Result<(), ()> {
        match self.nicknames.entry(nick.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                if *entry.get() != id {
                    return Err(());
                }
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(id);
            }
        }
        // Release any other nickname `id` previously held; the entry just claimed above
        // is excluded so this can't undo its own claim.
        self.nicknames.retain(|owned_nick, owner| *owner != id || owned_nick == nick);
        Ok(())
    }

    pub fn get_channel(&self, name: &str) -> Option<Arc<Channel>> {
        self.channels.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn get_or_create_channel(&self, name: &str) -> Arc<Channel> {
        Arc::clone(
            self.channels
                .entry(name.to_string())
                .or_insert_with(|| Arc::new(Channel::new(name.to_string())))
                .value(),
        )
    }

    pub fn remove_channel(&self, name: &str) {
        self.channels.remove(name);
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    fn make_session(id: SessionId) -> Arc<Session> {
        let (tx, _rx) = mpsc::unbounded_channel();
        let addr: SocketAddr = "127.0.0.1:1234".parse().unwrap();
        Arc::new(Session::new(id, addr, tx))
    }

    fn make_registry() -> Registry {
        Registry::new(
            "irc.test".to_string(),
            "secret".to_string(),
            crate::config::Config::default(),
        )
    }

    #[test]
    fn nickname_reservation_rejects_conflicts() {
        let registry = make_registry();
        registry.insert_session(make_session(1));
        registry.insert_session(make_session(2));

        assert!(registry.reserve_nickname(1, "alice").is_ok());
        assert!(registry.reserve_nickname(2, "alice").is_err());
        assert!(registry.reserve_nickname(2, "bob").is_ok());
    }

    #[test]
    fn concurrent_claims_of_the_same_nickname_have_exactly_one_winner() {
        let registry = Arc::new(make_registry());
        for id in 1..=8u64 {
            registry.insert_session(make_session(id));
        }

        let handles: Vec<_> = (1..=8u64)
            .map(|id| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.reserve_nickname(id, "alice").is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(winners, 1, "exactly one session should have claimed the nickname");
        assert!(registry.nickname_in_use("alice"));
    }

    #[test]
    fn renaming_releases_old_nickname() {
        let registry = make_registry();
        registry.insert_session(make_session(1));
        registry.reserve_nickname(1, "alice").unwrap();
        registry.reserve_nickname(1, "alicia").unwrap();
        assert!(!registry.nickname_in_use("alice"));
        assert!(registry.nickname_in_use("alicia"));
    }

    #[test]
    fn password_check() {
        let registry = make_registry();
        assert!(registry.check_password("secret"));
        assert!(!registry.check_password("wrong"));
    }

    #[test]
    fn per_ip_connection_cap_is_enforced_and_released() {
        let mut config = crate::config::Config::default();
        config.limits.max_connections_per_ip = 2;
        let registry = Registry::new("irc.test".to_string(), "secret".to_string(), config);
        let ip: IpAddr = "127.0.0.1".parse().unwrap();

        assert!(registry.try_reserve_connection(ip));
        assert!(registry.try_reserve_connection(ip));
        assert!(!registry.try_reserve_connection(ip));

        registry.release_connection(ip);
        assert!(registry.try_reserve_connection(ip));
    }

    #[test]
    fn global_connection_cap_is_enforced() {
        let mut config = crate::config::Config::default();
        config.network.max_connections = 1;
        config.limits.max_connections_per_ip = 100;
        let registry = Registry::new("irc.test".to_string(), "secret".to_string(), config);
        registry.insert_session(make_session(1));

        let ip: IpAddr = "10.0.0.1".parse().unwrap();
        assert!(!registry.try_reserve_connection(ip));
    }
}
