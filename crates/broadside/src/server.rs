//! `BroadsideServer` builder and accept loop.
//!
//! This ties the layers together: transport → protocol → session → match.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use broadside_match::{MatchConfig, MatchRegistry, RuleSet};
use broadside_protocol::{Codec, JsonCodec};
use broadside_session::{SessionConfig, SessionManager};
use broadside_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::{BroadsideError, ConfigError, ServerConfig};

/// Shared server state passed to each connection handler task.
///
/// The two registries sit behind separate locks. Handlers hold a lock
/// only for one registry call and never while writing to a socket.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) registry: Mutex<MatchRegistry>,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Broadside server.
///
/// # Example
///
/// ```rust,no_run
/// use broadside::prelude::*;
///
/// # async fn start() -> Result<(), BroadsideError> {
/// let server = BroadsideServer::builder()
///     .bind("0.0.0.0:3000")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct BroadsideServerBuilder {
    config: ServerConfig,
}

impl BroadsideServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
        }
    }

    /// Replaces every setting at once.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets the board and fleet rules used by every match.
    pub fn rules(mut self, rules: RuleSet) -> Self {
        self.config.matches.rules = rules;
        self
    }

    pub fn match_config(mut self, config: MatchConfig) -> Self {
        self.config.matches = config;
        self
    }

    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`. Fails before binding if
    /// the rule set is unplayable.
    pub async fn build(self) -> Result<BroadsideServer<JsonCodec>, BroadsideError> {
        self.config
            .matches
            .rules
            .check()
            .map_err(ConfigError::from)?;
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(self.config.session)),
            registry: Mutex::new(MatchRegistry::new(self.config.matches)),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(BroadsideServer { transport, state })
    }
}

impl Default for BroadsideServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Broadside server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct BroadsideServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl BroadsideServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> BroadsideServerBuilder {
        BroadsideServerBuilder::new()
    }
}

impl<C: Codec> BroadsideServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), BroadsideError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` completes, then stops
    /// accepting. Connections already open keep running.
    pub async fn run_until(
        mut self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), BroadsideError> {
        let addr = self.local_addr().ok();
        tracing::info!(?addr, "Broadside server running");
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(error = %e, "connection ended with error");
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        self.transport.shutdown().await?;
        tracing::info!("Broadside server stopped");
        Ok(())
    }
}
