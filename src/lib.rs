//! `shader_ssair`: an SSA intermediate representation and mid-end
//! optimization core for a Maxwell-class GPU shader recompiler.
//!
//! This crate owns the data model (arenas, instructions, blocks, values)
//! and the mid-end passes that run over it (constant propagation, dead
//! code elimination, dual-vertex stitching, and the driver that sequences
//! them). Decoding machine shader code into this IR, reconstructing
//! structured control flow, and emitting SPIR-V/GLSL/GLASM from it are
//! external collaborators whose interfaces are pinned in [`translate`] and
//! [`emit`] but whose bodies are out of scope for this crate.
//!
//! Grounded on the teacher crate's (`cranelift-codegen`) top-level layout:
//! an `ir` module for the data model, a sibling pass-module tree, a single
//! crate-wide error type, and `log` for pass diagnostics rather than a
//! bespoke tracing facility.

pub mod emit;
pub mod error;
pub mod ir;
pub mod opt;
pub mod translate;

pub use error::{CoreError, CoreResult};
pub use ir::{BlockRef, InstRef, Program, Stage};
pub use opt::run_passes;
