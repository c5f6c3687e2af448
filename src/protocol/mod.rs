//! Wire-level types shared by commands, responses, and events.
//!
//! ```text
//! ┌────────────┐   ┌──────────────────┐   ┌──────────────────────┐
//! │ Transport  │──▶│ Codec (assembler)│──▶│ Packet (header+data) │──▶ dispatch
//! │ (trait)    │◀──│ encode_packet    │◀──│ response packet      │◀──
//! └────────────┘   └──────────────────┘   └──────────────────────┘
//! ```

pub mod codec;
pub mod header;
pub mod packet;
pub mod transport;

pub use header::{Header, MessageType};
pub use packet::{LengthFieldWidth, Packet};
