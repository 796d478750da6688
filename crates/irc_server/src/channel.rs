//! Channel state, per `SPEC_FULL.md` §3 and §4.5. A `Channel` is looked up by name in the
//! registry and shared (`Arc`) across every session that touches it; membership,
//! operator, and invitation sets live behind one `RwLock` since a JOIN reads and writes
//! several of them atomically (an invitee joining must be removed from `invitees` and
//! added to `members` as one step, never observed half-done).

use std::collections::HashSet;
use tokio::sync::RwLock;

use crate::types::SessionId;

#[derive(Debug, Default)]
struct ChannelInner {
    topic: Option<String>,
    password: Option<String>,
    invite_only: bool,
    topic_restricted: bool,
    user_limit: Option<usize>,
    members: HashSet<SessionId>,
    operators: HashSet<SessionId>,
    invitees: HashSet<SessionId>,
}

pub struct Channel {
    pub name: String,
    inner: RwLock<ChannelInner>,
}

impl Channel {
    pub fn new(name: String) -> Self {
        Channel {
            name,
            inner: RwLock::new(ChannelInner::default()),
        }
    }

    pub async fn members(&self) -> HashSet<SessionId> {
        self.inner.read().await.members.clone()
    }

    pub async fn member_count(&self) -> usize {
        self.inner.read().await.members.len()
    }

    pub async fn is_member(&self, id: SessionId) -> bool {
        self.inner.read().await.members.contains(&id)
    }

    pub async fn is_operator(&self, id: SessionId) -> bool {
        self.inner.read().await.operators.contains(&id)
    }

    pub async fn is_invited(&self, id: SessionId) -> bool {
        self.inner.read().await.invitees.contains(&id)
    }

    pub async fn topic(&self) -> Option<String> {
        self.inner.read().await.topic.clone()
    }

    pub async fn set_topic(&self, topic: Option<String>) {
        self.inner.write().await.topic = topic;
    }

    pub async fn password(&self) -> Option<String> {
        self.inner.read().await.password.clone()
    }

    pub async fn set_password(&self, password: Option<String>) {
        self.inner.write().await.password = password;
    }

    pub async fn invite_only(&self) -> bool {
        self.inner.read().await.invite_only
    }

    pub async fn set_invite_only(&self, value: bool) {
        self.inner.write().await.invite_only = value;
    }

    pub async fn topic_restricted(&self) -> bool {
        self.inner.read().await.topic_restricted
    }

    pub async fn set_topic_restricted(&self, value: bool) {
        self.inner.write().await.topic_restricted = value;
    }

    pub async fn user_limit(&self) -> Option<usize> {
        self.inner.read().await.user_limit
    }

    pub async fn set_user_limit(&self, limit: Option<usize>) {
        self.inner.write().await.user_limit = limit;
    }

    /// Adds `id` to `members`, making it the channel's first operator if it is the
    /// first member to ever join (SPEC_FULL.md §9: first-joiner-is-operator is decided
    /// inside JOIN, not as a standalone rule re-evaluated later). Also clears any
    /// pending invitation for `id`, since it has now been consumed.
    pub async fn add_member(&self, id: SessionId) {
        let mut inner = self.inner.write().await;
        let is_first = inner.members.is_empty();
        inner.members.insert(id);
        inner.invitees.remove(&id);
        if is_first {
            inner.operators.insert(id);
        }
    }

    /// Removes `id` from every set it could appear in. Returns `true` if the channel
    /// has no members left, in which case the registry should delete it
    /// (SPEC_FULL.md §4.5: an empty channel does not persist).
    pub async fn remove_member(&self, id: SessionId) -> bool {
        let mut inner = self.inner.write().await;
        inner.members.remove(&id);
        inner.operators.remove(&id);
        inner.invitees.remove(&id);
        inner.members.is_empty()
    }

    pub async fn add_invitee(&self, id: SessionId) {
        self.inner.write().await.invitees.insert(id);
    }

    pub async fn grant_operator(&self, id: SessionId) {
        self.inner.write().await.operators.insert(id);
    }

    pub async fn revoke_operator(&self, id: SessionId) {
        self.inner.write().await.operators.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_joiner_becomes_operator() {
        let chan = Channel::new("#room".to_string());
        chan.add_member(1).await;
        chan.add_member(2).await;
        assert!(chan.is_operator(1).await);
        assert!(!chan.is_operator(2).await);
    }

    #[tokio::test]
    async fn removing_last_member_reports_empty() {
        let chan = Channel::new("#room".to_string());
        chan.add_member(1).await;
        chan.add_member(2).await;
        assert!(!chan.remove_member(1).await);
        assert!(chan.remove_member(2).await);
    }

    #[tokio::test]
    async fn invite_is_consumed_on_join() {
        let chan = Channel::new("#room".to_string());
        chan.add_invitee(7).await;
        assert!(chan.is_invited(7).await);
        chan.add_member(7).await;
        assert!(!chan.is_invited(7).await);
    }
}
