//! Relay module
//!
//! The duplex-and-log engine: pumps copying bytes between the client and the
//! local streams, the line tap, the session transcript and the supervisor
//! that sequences them.

mod lines;
mod logger;
mod pump;
mod server;
mod session;
mod supervisor;

pub use lines::LineAccumulator;
pub use logger::SessionLogger;
pub use pump::{Direction, DuplexPump, Liveness, PumpExit, PumpReport};
pub use server::{serve, Listener};
pub use session::Session;
pub use supervisor::{SessionState, SessionSupervisor};
