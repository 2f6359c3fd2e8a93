//! # Broadside
//!
//! Two-player battleship over WebSockets.
//!
//! A player opens a lobby and shares its six-character code; a second
//! player joins with it. Both place a fleet, then they take turns firing
//! at each other's grid until one fleet is sunk. The server is
//! authoritative: every placement and every shot is checked here, and
//! clients only render the events they are sent.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use broadside::prelude::*;
//!
//! # async fn start() -> Result<(), BroadsideError> {
//! let config = ServerConfig::from_env()?;
//! let server = BroadsideServer::builder().config(config).build().await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::BroadsideError;
pub use server::{BroadsideServer, BroadsideServerBuilder};

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{BroadsideError, BroadsideServer, BroadsideServerBuilder, ConfigError, ServerConfig};
    pub use broadside_match::{
        FleetRule, LobbyCode, MatchConfig, MatchError, PlacementError, RuleSet, RuleSetError,
    };
    pub use broadside_protocol::{ClientIntent, Coordinate, Envelope, PlayerId, ServerEvent};
    pub use broadside_session::SessionConfig;
}
