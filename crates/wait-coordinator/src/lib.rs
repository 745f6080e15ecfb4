//! Intelligent waiting for dynamic page state.
//!
//! Every interaction with a resolved element goes through a wait: the
//! coordinator blocks the calling flow until a condition holds or its
//! timeout elapses. Six condition kinds are supported (element state,
//! network idle, response matching, animation settlement, geometric
//! stability, script predicate), plus arbitrary Rust closures via
//! [`WaitCoordinator::await_predicate`].
//!
//! Only the primary condition's timeout is fatal; optional enhancement
//! conditions degrade to warnings.

pub mod conditions;
pub mod coordinator;
pub mod errors;
pub mod types;

pub use conditions::WaitCondition;
pub use coordinator::WaitCoordinator;
pub use errors::WaitError;
pub use types::WaitOptions;
