//! # IO Module
//!
//! Interface layer between HTTP clients and the domain services: REST
//! endpoints for every wallet action plus a WebSocket stream of snapshots.

pub mod rest;

pub use rest::*;
