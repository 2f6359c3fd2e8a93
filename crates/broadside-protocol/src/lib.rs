//! Wire protocol for Broadside.
//!
//! - **Types** ([`ClientIntent`], [`ServerEvent`], [`Envelope`],
//!   [`Coordinate`], [`PlayerId`], [`Recipient`]): what travels on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how it becomes bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! The protocol layer knows nothing about connections or matches:
//!
//! ```text
//! Transport (frames) → Protocol (Envelope<ClientIntent>) → Gateway → Match
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientIntent, Coordinate, Envelope, PlayerId, Recipient, ServerEvent};
