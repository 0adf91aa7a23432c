//! Edagraph core library.
//!
//! Turns a declarative HDL design description into a Makefile-driven build
//! for a simulator backend. The pipeline runs in stages:
//!
//! 1. [`design`] loads the YAML description into the [`ast`] types.
//! 2. [`classify`] partitions the files by role and [`group`] batches the
//!    compiled sources into analysis commands.
//! 3. A [`backend`] populates an [`ir::BuildGraph`] and renders its option
//!    files.
//! 4. [`makefile`] serialises the graph, and [`runner`] writes everything to
//!    the work root and invokes `make`.

pub mod ast;
pub mod backend;
pub mod classify;
pub mod cli;
pub mod design;
pub mod group;
pub mod ir;
pub mod makefile;
pub mod param;
pub mod runner;
