//! Dual-vertex stitching (C8, §4.7).
//!
//! A combined vertex program is decoded as two halves, A and B, sharing one
//! IR; each half's own epilogue/prologue marker is redundant once they are
//! stitched into a single program, so one marker from each half is dropped.
//! Grounded directly on `dual_vertex_pass.cpp`'s `VertexATransformPass`/
//! `VertexBTransformPass`: a single forward scan that invalidates the first
//! matching instruction and returns, rather than a full-program fold.

use crate::error::CoreError;
use crate::ir::opcode::Opcode;
use crate::ir::program::Program;

/// Drops this program's `Epilogue` marker (§4.7, vertex-A half): the
/// B half's prologue/epilogue pair becomes the seam between the two halves
/// once stitched, so A's own epilogue is no longer meaningful.
pub fn transform_vertex_a(program: &mut Program) -> Result<(), CoreError> {
    invalidate_first(program, Opcode::Epilogue)
}

/// Drops this program's `Prologue` marker (§4.7, vertex-B half).
pub fn transform_vertex_b(program: &mut Program) -> Result<(), CoreError> {
    invalidate_first(program, Opcode::Prologue)
}

fn invalidate_first(program: &mut Program, opcode: Opcode) -> Result<(), CoreError> {
    let blocks: Vec<_> = program.block_order().to_vec();
    for block in blocks {
        let insts: Vec<_> = program.block_insts(block).collect();
        for inst in insts {
            if program.insts()[inst].opcode() == opcode {
                return program.invalidate(inst);
            }
        }
    }
    Ok(())
}
