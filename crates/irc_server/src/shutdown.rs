//! The shutdown coordinator: an external flag flipped once by a signal handler and
//! observed by the reactor and every session task between ticks, per `SPEC_FULL.md`
//! §4.7. Built on `tokio::sync::watch` rather than a raw `AtomicBool` so waiters can
//! `select!` on it alongside their normal I/O instead of polling.

use tokio::sync::watch;

#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

pub fn channel() -> (ShutdownHandle, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownHandle { tx }, Shutdown { rx })
}

impl ShutdownHandle {
    /// Flips the flag. Idempotent: a second call is a harmless no-op.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

impl Shutdown {
    /// Resolves once the flag is set. Safe to call after the flag was already set before
    /// this waiter started watching.
    pub async fn recv(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }

    pub fn is_set(&self) -> bool {
        *self.rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn recv_resolves_after_trigger() {
        let (handle, shutdown) = channel();
        assert!(!shutdown.is_set());
        handle.trigger();
        shutdown.recv().await;
        assert!(shutdown.is_set());
    }

    #[tokio::test]
    async fn recv_resolves_immediately_if_already_set() {
        let (handle, shutdown) = channel();
        handle.trigger();
        tokio::time::timeout(std::time::Duration::from_millis(50), shutdown.recv())
            .await
            .expect("recv should not block once the flag is already set");
    }
}
