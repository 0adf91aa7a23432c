//! Intermediate Representation structures.
//!
//! This module defines the tool-agnostic build graph that every backend
//! populates. A graph is an append-only list of targets, each carrying its
//! outputs, dependencies, and argv-style commands, plus one default target.
//! The representation holds no Makefile syntax; see
//! [`crate::makefile`] for serialisation.
//!
//! # Examples
//!
//! ```
//! use edagraph::ir::{BuildGraph, Command};
//!
//! let mut graph = BuildGraph::default();
//! graph.declare_input("hello.c");
//! graph
//!     .add_target(
//!         vec![Command::program("cc").arg("-o").arg("hello").arg("hello.c")],
//!         ["hello"],
//!         ["hello.c"],
//!     )
//!     .expect("valid target");
//! graph.set_default("hello").expect("known output");
//! assert_eq!(graph.targets().len(), 1);
//! ```

mod command;
mod graph;

pub use command::{Arg, Command};
pub use graph::{BuildGraph, GraphError, RESERVED_OUTPUT, Target, Variable};
