//! # Home Historian Backend Library
//!
//! A REST backend for recording named, typed measurable quantities ("datas"),
//! their time-series readings ("data points") and free-form metadata attached
//! to them, owned by authenticated users.
//!
//! ## Architecture
//!
//! Requests flow router → service → repository → SQLite:
//!
//! - [`routes`]: HTTP handlers and the router with its middleware stack
//! - [`services`]: transactional business operations and referential checks
//! - [`repositories`]: SQL per entity, store errors classified at this boundary
//! - [`validator`]: coercion of loosely typed values to a declared [`validator::ValueType`]
//! - [`pagination`]: the `{total, limit, offset, items}` list contract
//! - [`auth`]: Argon2id password hashing and JWT bearer tokens
//! - [`config`], [`db`], [`error`], [`metrics`], [`middleware`], [`state`], [`types`]

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod metrics;
pub mod middleware;
pub mod pagination;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod types;
pub mod validator;

#[cfg(test)]
mod tests;
