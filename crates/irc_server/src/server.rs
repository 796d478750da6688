//! The I/O reactor, per `SPEC_FULL.md` §4.1: an accept loop plus one reader/writer task
//! pair per connection. Tokio's scheduler plays the role a manual readiness-multiplexed
//! `select`/`poll` loop would, and the registry (not a global lock) is what keeps
//! concurrent handlers safe.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::codec::LineFramer;
use crate::config::Config;
use crate::errors::{BootstrapError, SessionError};
use crate::handlers::{self, Context};
use crate::message::parse_line;
use crate::registry::Registry;
use crate::session::{RegistrationState, Session};
use crate::shutdown::Shutdown;
use crate::types::next_session_id;

/// Size of the scratch buffer each `recv` reads into, matching `SPEC_FULL.md` §4.1's
/// 1 KiB per-tick read.
const READ_CHUNK: usize = 1024;

pub struct Server {
    registry: Arc<Registry>,
    idle_timeout: Duration,
    unregistered_timeout: Duration,
}

impl Server {
    pub fn new(server_name: String, password: String, config: &Config) -> Self {
        Server {
            registry: Arc::new(Registry::new(server_name, password, config.clone())),
            idle_timeout: Duration::from_secs(config.limits.idle_timeout_secs),
            unregistered_timeout: Duration::from_secs(config.limits.unregistered_timeout_secs),
        }
    }

    pub fn session_count(&self) -> usize {
        self.registry.session_count()
    }

    /// Binds `bind_addr` and serves connections until `shutdown` fires.
    pub async fn run(&self, bind_addr: &str, shutdown: Shutdown) -> Result<(), BootstrapError> {
        let listener = self.bind(bind_addr).await?;
        self.serve(listener, shutdown).await;
        Ok(())
    }

    /// Binds the listening socket without starting the accept loop. Split out from
    /// [`Server::run`] so callers that need the OS-assigned port (tests binding `:0`)
    /// can read it back via [`TcpListener::local_addr`] before serving.
    pub async fn bind(&self, bind_addr: &str) -> Result<TcpListener, BootstrapError> {
        let listener =
            TcpListener::bind(bind_addr)
                .await
                .map_err(|source| BootstrapError::Bind {
                    addr: bind_addr.to_string(),
                    source,
                })?;
        info!("listening on {bind_addr}");
        Ok(listener)
    }

    /// Accept loop: serves connections on an already-bound `listener` until `shutdown`
    /// fires. On shutdown the loop stops taking new connections and returns once every
    /// in-flight connection task has been told to close; it does not itself wait for
    /// their writers to finish draining (each session task bounds that on its own, see
    /// `handle_connection`).
    pub async fn serve(&self, listener: TcpListener, shutdown: Shutdown) {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("shutdown signal received, closing listener");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            if !self.registry.try_reserve_connection(addr.ip()) {
                                warn!("rejecting connection from {addr}: connection limit reached");
                                drop(stream);
                                continue;
                            }
                            let registry = Arc::clone(&self.registry);
                            let idle_timeout = self.idle_timeout;
                            let unregistered_timeout = self.unregistered_timeout;
                            let shutdown = shutdown.clone();
                            tokio::spawn(async move {
                                handle_connection(
                                    stream,
                                    addr,
                                    registry,
                                    idle_timeout,
                                    unregistered_timeout,
                                    shutdown,
                                )
                                .await;
                            });
                        }
                        Err(err) => warn!("accept failed: {err}"),
                    }
                }
            }
        }
    }
}

async fn handle_connection(
    stream: tokio::net::TcpStream,
    addr: SocketAddr,
    registry: Arc<Registry>,
    idle_timeout: Duration,
    unregistered_timeout: Duration,
    shutdown: Shutdown,
) {
    stream.set_nodelay(true).ok();
    let (mut reader, mut writer) = tokio::io::split(stream);
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let id = next_session_id();
    let session = Arc::new(Session::new(id, addr, tx));
    registry.insert_session(Arc::clone(&session));
    info!("session {id} connected from {addr}");

    let writer_task = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if let Err(source) = writer.write_all(line.as_bytes()).await {
                debug!("session {id} write failed: {}", SessionError::Write(source));
                break;
            }
            if let Err(source) = writer.write_all(b"\r\n").await {
                debug!("session {id} write failed: {}", SessionError::Write(source));
                break;
            }
            if let Err(source) = writer.flush().await {
                debug!("session {id} write failed: {}", SessionError::Write(source));
                break;
            }
        }
    });

    let mut framer = LineFramer::new(registry.config.limits.max_message_length);
    let mut buf = [0u8; READ_CHUNK];
    let mut disconnect_reason = "peer closed the connection".to_string();

    'read_loop: loop {
        // The server allows a registered client to stay idle longer than one still
        // working through PASS/NICK/USER (SPEC_FULL.md §10.3's
        // `unregistered_timeout_secs`), so the applicable timeout is re-read every pass.
        let read_timeout = if session.state().await == RegistrationState::Registered {
            idle_timeout
        } else {
            unregistered_timeout
        };

        tokio::select! {
            _ = shutdown.recv() => {
                disconnect_reason = "server shutdown".to_string();
                break 'read_loop;
            }
            read_result = timeout(read_timeout, reader.read(&mut buf)) => {
                let n = match read_result {
                    Err(_) => {
                        disconnect_reason = SessionError::Idle.to_string();
                        break 'read_loop;
                    }
                    Ok(Err(source)) => {
                        let err = SessionError::Read(source);
                        debug!("session {id} read error: {err}");
                        disconnect_reason = err.to_string();
                        break 'read_loop;
                    }
                    Ok(Ok(0)) => {
                        disconnect_reason = SessionError::Closed.to_string();
                        break 'read_loop;
                    }
                    Ok(Ok(n)) => n,
                };

                let lines = match framer.push(&buf[..n]) {
                    Ok(lines) => lines,
                    Err(err @ SessionError::BufferOverflow(cap)) => {
                        warn!("session {id} exceeded the {cap}-byte read buffer, disconnecting");
                        disconnect_reason = err.to_string();
                        break 'read_loop;
                    }
                    Err(err @ SessionError::LineTooLong(cap)) => {
                        warn!("session {id} sent a line over {cap} bytes, disconnecting");
                        disconnect_reason = err.to_string();
                        break 'read_loop;
                    }
                    Err(_) => Vec::new(),
                };

                for line in lines {
                    let Some(parsed) = parse_line(&line) else { continue };
                    let ctx = Context { registry: &registry, session: &session };
                    if handlers::dispatch(&ctx, parsed).await {
                        disconnect_reason = "client quit".to_string();
                        break 'read_loop;
                    }
                }
            }
        }
    }

    debug!("session {id} disconnecting: {disconnect_reason}");
    teardown_session(&registry, &session).await;
    registry.release_connection(addr.ip());
    writer_task.abort();
}

/// Removes the session from every channel it still belongs to (pruning channels left
/// empty) and then from the registry itself. A no-op for membership QUIT already cleaned
/// up; always needed for an abrupt disconnect (EOF, transport error, idle timeout).
async fn teardown_session(registry: &Registry, session: &Arc<Session>) {
    for name in session.channels().await {
        if let Some(channel) = registry.get_channel(&name) {
            if channel.remove_member(session.id).await {
                registry.remove_channel(&name);
            }
        }
    }
    registry.remove_session(session.id);
    info!("session {} disconnected", session.id);
}
