//! Client library for the Madrasa learning platform API.
//!
//! The [`session`] module is the single source of truth for "who is the
//! current actor and what may they do"; the [`api`] module wraps the remote
//! HTTP API and routes every gated call through the session authority so
//! expired or unverified sessions are handled in one place.

pub mod api;
pub mod cli;
pub mod session;
pub mod validate;
