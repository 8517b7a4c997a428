//! Shopcheck library
//!
//! Wires the workspace crates into a runnable acceptance scenario:
//! `selector-catalog` holds the durable selector knowledge,
//! `element-locator` runs the resolution cascade, and `page-probe` drives
//! the browser. This crate adds configuration, the retail search flow, and
//! the parsers the flow's verifications need.

pub mod config;
pub mod flow;
pub mod parsers;

pub use config::{load_config, Config};
pub use flow::SearchFlow;
