//! The mid-end pass pipeline (C9, §4.9).
//!
//! Grounded on the teacher's `Context::compile`: a fixed sequence of passes
//! run over one compile unit, each bracketed by a `log::debug!` so a
//! `RUST_LOG=shader_ssair=debug` run shows exactly which passes ran and in
//! what order. Unlike the teacher, there is no `OptLevel` gate here — this
//! crate has one optimization level, matching the spec's pipeline (§4.9):
//! dual-vertex stitching runs first (only when the stage calls for it),
//! then constant propagation, then dead code elimination.
//!
//! Structured control-flow reconstruction and the backend emitters are
//! external collaborators (§6) that run before and after this pipeline
//! respectively; they are not steps of this function.

use crate::error::CoreError;
use crate::ir::program::{Program, Stage};
use crate::opt::constant_propagation::propagate_constants;
use crate::opt::dead_code_elimination::eliminate_dead_code;
use crate::opt::dual_vertex::{transform_vertex_a, transform_vertex_b};

/// Runs the full mid-end pipeline over `program` in place.
///
/// `program` must already have its AST root and block order set by the
/// front end (§6); this function computes and refreshes the post-order
/// traversal itself before each pass that depends on it.
pub fn run_passes(program: &mut Program) -> Result<(), CoreError> {
    log::debug!("running mid-end passes for {:?}", program.stage());

    if program.stage().is_dual_vertex() {
        log::trace!("dual-vertex stitching");
        match program.stage() {
            Stage::VertexA => transform_vertex_a(program)?,
            Stage::VertexB => transform_vertex_b(program)?,
            _ => unreachable!("is_dual_vertex() only true for VertexA/VertexB"),
        }
    }

    program.compute_post_order();
    log::trace!("constant propagation");
    propagate_constants(program)?;

    program.compute_post_order();
    log::trace!("dead code elimination");
    eliminate_dead_code(program)?;

    log::debug!("mid-end passes complete for {:?}", program.stage());
    Ok(())
}
