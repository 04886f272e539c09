//! xmlrpc-warden - Admission-Control Gateway for XML-RPC Endpoints
//!
//! This crate implements a request-gating layer that sits in front of an
//! XML-RPC handler. Each inbound request is checked against a shared-secret
//! token, an optional IP whitelist, and a per-IP fixed-window rate limit;
//! rejected attempts are appended to an audit log and permitted requests are
//! forwarded upstream.

pub mod audit;
pub mod config;
pub mod error;
pub mod gate;
pub mod http;
pub mod ident;
pub mod ratelimit;
pub mod status;
pub mod token;
