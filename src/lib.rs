//! Customer feedback portal
//!
//! - [`workflow`]: the feedback form state machine, written against the
//!   [`CatalogSource`](workflow::CatalogSource) and
//!   [`FeedbackStore`](workflow::FeedbackStore) contracts
//! - [`handlers`] and [`db`]: the axum + Postgres backend behind those contracts
//! - [`client`]: the same contracts over HTTP, for running the workflow
//!   against a deployed backend

pub mod client;
pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod validation;
pub mod workflow;
