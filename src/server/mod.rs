//! Server core functionality
//!
//! The control-connection accept loop and the context shared by sessions.

pub mod context;
pub mod core;

pub use self::context::SessionContext;
pub use self::core::Server;
