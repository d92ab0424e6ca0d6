//! # TillSync Protocol
//!
//! The remote gateway wire contract: two JSON RPCs over a single endpoint.
//!
//! - **Push**: `{"action":"SYNC_OUTBOX","data":[entries...]}` →
//!   `{"success":bool}`
//! - **Pull**: `{"action":"FETCH_UPDATES","table":name,"since":ms}` →
//!   `{"data":[records...]}`
//!
//! Both calls are idempotent-safe upserts on the far side; re-delivering a
//! batch after a crash must converge to the same remote state.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod messages;

pub use error::{ProtocolError, ProtocolResult};
pub use messages::{PullRequest, PullResponse, PushRequest, PushResponse, PULL_ACTION, PUSH_ACTION};
