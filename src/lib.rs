//! Host-side driver for the LEGO EV3 brick over a serial link.
//!
//! Commands are assembled with [protocol::Bytecode], pushed through a
//! [channel::AsyncChannel] that serializes them onto one transport, and the
//! replies are decoded on a dedicated executor. [Ev3] ties those together
//! and runs at most one job at a time.

pub mod channel;
pub mod devices;
pub mod errors;
pub mod ev3;
pub mod executor;
pub mod pending;
pub mod ports;
pub mod protocol;

pub use ev3::{Api, Ev3, JobState};
pub use pending::Pending;
pub use ports::{InputPort, OutputMask, OutputPort};
