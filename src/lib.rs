//! Google Drive HPC log MCP server core library.
//! Modules are split by responsibility so the tool surface stays thin.

pub mod analyzer;
pub mod auth;
pub mod config;
pub mod drive;
pub mod error;
pub mod mcp;
pub mod model;
pub mod setup;
pub mod token_store;
pub mod tools;
