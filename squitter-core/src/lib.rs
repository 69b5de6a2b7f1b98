//! squitter-core: Pure decode library for ADS-B extended squitters (DF17).
//!
//! Pure algorithms with no I/O and no state between calls. Frames go in as
//! 112 bits and typed messages come out; pairs of airborne position messages
//! resolve to a latitude/longitude through CPR.

pub mod bits;
pub mod cpr;
pub mod crc;
pub mod decode;
pub mod frame;
pub mod types;

// Re-export commonly used items at crate root
pub use cpr::{resolve, resolve_local, try_resolve};
pub use decode::{decode, decode_at, try_decode, try_decode_at};
pub use frame::Frame;
pub use types::*;
