//! Player session tracking for Broadside.
//!
//! This is the identity half of the session gateway: it turns an opaque
//! [`ConnectionId`](broadside_transport::ConnectionId) into an opaque
//! [`PlayerId`](broadside_protocol::PlayerId). Which match a player sits
//! in, and routing intents there, is the match registry's business.
//!
//! ```text
//! Match layer (above)   ← keyed by PlayerId and lobby code
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Transport (below)     ← keyed by ConnectionId
//! ```

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{Session, SessionConfig};
