#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Production-ready s402 facilitator server.
//!
//! Exposes the engine from `s402-evm` over the facilitator HTTP protocol:
//! `POST /verify`, `POST /settle`, `GET /supported`, and `GET /health`.
//! Configuration is loaded once at startup from a TOML file with
//! environment-variable expansion; there is no hot-reload path.

pub mod config;
pub mod error;
pub mod handlers;
