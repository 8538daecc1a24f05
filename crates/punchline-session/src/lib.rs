//! Live sessions for Punchline.
//!
//! Each session runs as its own Tokio task (actor model) owning one game
//! [`Instance`](punchline_game::Instance). Commands reach it through a
//! bounded mailbox and are applied one at a time; phase timers post
//! guarded advances into the same mailbox.
//!
//! # Key types
//!
//! - [`SessionManager`]: creates sessions under unique codes, finds them
//! - [`SessionHandle`]: talks to one running session actor
//! - [`CodeSource`] / [`CodeGenerator`]: where session codes come from
//! - [`SessionError`]: everything that can go wrong at this layer

mod actor;
mod code;
mod error;
mod manager;

pub use actor::SessionHandle;
pub use code::{CODE_ALPHABET, CodeGenerator, CodeSource};
pub use error::SessionError;
pub use manager::{MAX_CODE_ATTEMPTS, SessionManager};
