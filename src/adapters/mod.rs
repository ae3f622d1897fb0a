//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - OpenAI chat completions and a scripted mock
//! - `storage` - in-memory and YAML file session stores
//! - `postgres` - PostgreSQL session store
//! - `websocket` - live session rooms
//! - `http` - REST API and router assembly

pub mod ai;
pub mod http;
pub mod postgres;
pub mod storage;
pub mod websocket;
