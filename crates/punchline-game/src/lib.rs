//! Game rules for Punchline.
//!
//! Players join a lobby, then each round they write punchlines for
//! prompts, vote on each other's answers prompt by prompt, and collect
//! points. This crate holds those rules as plain synchronous state; it
//! knows nothing about tasks, timers or sockets.
//!
//! # Key types
//!
//! - [`Instance`]: one session's state machine
//! - [`Round`]: prompts, assignments and votes of a single round
//! - [`PromptCorpus`]: the shared pool of prompt texts
//! - [`GameConfig`]: player limits, round count, scoring and phase timings
//! - [`Fingerprint`]: identifies a transition point, for deferred advances

mod config;
mod corpus;
mod error;
mod instance;
mod round;

pub use config::GameConfig;
pub use corpus::PromptCorpus;
pub use error::GameError;
pub use instance::{Fingerprint, Instance};
pub use round::{PromptTally, Round, UserAnswer};
