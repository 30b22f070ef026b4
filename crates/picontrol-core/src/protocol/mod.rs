//! Protocol module: inbound request decoding, outbound envelopes and
//! parameter helpers.

pub mod messages;
pub mod params;
pub mod request;

pub use messages::{ServerMessage, Status};
pub use request::{decode_request, CommandRequest, DecodeError};
