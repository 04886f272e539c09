//! Request admission control.

mod access;
mod decision;

pub use access::AccessGate;
pub use decision::{Decision, DenyReason};
