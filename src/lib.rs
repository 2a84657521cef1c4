//! # Curtains
//! Controller contract for motorized window coverings, plus a simulator.
//!
//! A [`Curtain`] is driven to a target position between 0 (fully open) and
//! 100 (fully closed). Progress is reported asynchronously on two
//! [`Subscription`]s, one for the position and one for the
//! [`CurtainState`]. The [`Completion`] returned by [`Curtain::init`]
//! resolves once, when the controller is gone.
//!
//! [`SimulatedCurtain`] implements the contract with a background worker
//! that moves one unit per tick.

pub mod api;
pub mod cli;
pub mod config;
pub mod curtain;
pub mod delivery;
pub mod error;
pub mod limit;
mod motion;
pub mod sim;

pub use api::CurtainState;
pub use config::{Backlog, SimConfig};
pub use curtain::{completion, Completer, Completion, Curtain};
pub use delivery::Subscription;
pub use error::{Error, Result};
pub use limit::Travel;
pub use sim::SimulatedCurtain;
