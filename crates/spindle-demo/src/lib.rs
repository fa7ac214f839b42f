//! # spindle-demo
//!
//! The worked example for the Spindle container: a small object graph with
//! two qualified implementations of one contract that reference each other,
//! a singleton root, and fresh leaves pointing back at the root.
//!
//! The library half exposes the graph so tests can exercise it; the
//! `spindle` binary wires and prints it.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod graph;
pub mod report;
