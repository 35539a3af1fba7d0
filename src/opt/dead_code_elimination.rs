//! Dead code elimination (C7).
//!
//! Grounded on the teacher's `dce.rs::do_dce`: a post-order walk over
//! blocks (children before their parent), and within each block a walk
//! from the last instruction backward to the first, deleting whatever is
//! provably dead as it goes so that deleting a consumer can make its
//! producer dead in the same sweep.
//!
//! The teacher tracks liveness in a side `Vec<bool>` keyed by value index,
//! set as each live instruction's arguments are visited. This IR instead
//! keeps `use_count` as a property of the def-use list itself
//! ([`crate::ir::instruction::Instruction`]'s doc comment), so there is no
//! separate liveness bitmap to build or tear down: `Invalidate` already
//! decrements the producer's use-list when an instruction is removed, which
//! is exactly the update the teacher's `live[v.index()] = true` marking
//! achieves by other means.

use crate::error::CoreError;
use crate::ir::program::Program;
use crate::opt::predicates::is_dead;

/// Run one dead code elimination sweep over `program`.
///
/// `program.post_order_blocks()` must already reflect the current AST
/// (the pass driver, C9, calls [`Program::compute_post_order`] before
/// running any pass). A single sweep is sufficient to collapse an entire
/// dead chain within one block, since later instructions are considered
/// for deletion before their producers; it is not sufficient across blocks
/// in the opposite direction, matching the teacher's own single-sweep
/// contract (repeated sweeps are the pass driver's responsibility if ever
/// needed, not this function's).
pub fn eliminate_dead_code(program: &mut Program) -> Result<(), CoreError> {
    let blocks: Vec<_> = program.post_order_blocks().to_vec();
    for block in blocks {
        let insts: Vec<_> = program.block_insts_rev(block).collect();
        for inst in insts {
            if is_dead(&program.insts()[inst]) {
                program.invalidate(inst)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::opcode::Opcode;
    use crate::ir::program::Stage;
    use crate::ir::value::{Immediate, Value};
    use smallvec::smallvec;

    fn imm(v: u32) -> Value {
        Value::Immediate(Immediate::U32(v))
    }

    #[test]
    fn dead_chain_collapses_in_a_single_sweep() {
        let mut program = Program::new(Stage::Fragment);
        let block = program.new_block();
        program.set_ast_root(block);

        let a = program.alloc_instruction(Opcode::GetRegister, smallvec![imm(0)]);
        program.append_inst(block, a);
        let b = program.alloc_instruction(Opcode::IAdd32, smallvec![Value::Inst(a), imm(1)]);
        program.append_inst(block, b);
        // `c` is the only instruction whose result escapes this block (kept
        // alive by an external `Epilogue` read), so `a` and `b` are both
        // unreachable dead code once nothing refers to them.
        let c = program.alloc_instruction(Opcode::Epilogue, smallvec![]);
        program.append_inst(block, c);

        program.compute_post_order();
        eliminate_dead_code(&mut program).unwrap();

        assert!(program.insts()[a].is_invalidated());
        assert!(program.insts()[b].is_invalidated());
        assert!(!program.insts()[c].is_invalidated());
        assert_eq!(program.block_insts(block).collect::<Vec<_>>(), vec![c]);
    }

    #[test]
    fn live_instruction_and_its_producers_survive() {
        let mut program = Program::new(Stage::Fragment);
        let block = program.new_block();
        program.set_ast_root(block);

        let a = program.alloc_instruction(Opcode::GetRegister, smallvec![imm(0)]);
        program.append_inst(block, a);
        let add = program.alloc_instruction(Opcode::IAdd32, smallvec![Value::Inst(a), imm(1)]);
        program.append_inst(block, add);
        let vertex = program.alloc_instruction(Opcode::EmitVertex, smallvec![Value::Inst(add)]);
        program.append_inst(block, vertex);

        program.compute_post_order();
        eliminate_dead_code(&mut program).unwrap();

        assert!(!program.insts()[a].is_invalidated());
        assert!(!program.insts()[add].is_invalidated());
        assert!(!program.insts()[vertex].is_invalidated());
    }

    #[test]
    fn parent_with_a_live_pseudo_op_survives_even_with_no_direct_uses() {
        let mut program = Program::new(Stage::Fragment);
        let block = program.new_block();
        program.set_ast_root(block);

        let add = program.alloc_instruction(Opcode::IAdd32, smallvec![imm(1), imm(2)]);
        program.append_inst(block, add);
        let carry = program.alloc_instruction(Opcode::GetCarryFromOp, smallvec![Value::Inst(add)]);
        program.append_inst(block, carry);
        program.attach_pseudo_op(add, carry);
        let select = program.alloc_instruction(Opcode::Select, smallvec![Value::Inst(carry), imm(1), imm(2)]);
        program.append_inst(block, select);
        let vertex = program.alloc_instruction(Opcode::EmitVertex, smallvec![Value::Inst(select)]);
        program.append_inst(block, vertex);

        // `add`'s own result is never read directly; only its carry output
        // (the pseudo-op, itself kept live through `select`/`vertex`) is.
        assert_eq!(program.insts()[add].use_count(), 0);

        program.compute_post_order();
        eliminate_dead_code(&mut program).unwrap();

        assert!(!program.insts()[add].is_invalidated());
        assert!(!program.insts()[carry].is_invalidated());
        assert!(!program.insts()[select].is_invalidated());
    }

    #[test]
    fn side_effecting_instruction_with_no_uses_survives() {
        let mut program = Program::new(Stage::Fragment);
        let block = program.new_block();
        program.set_ast_root(block);
        let vertex = program.alloc_instruction(Opcode::EmitVertex, smallvec![imm(0)]);
        program.append_inst(block, vertex);

        program.compute_post_order();
        eliminate_dead_code(&mut program).unwrap();

        assert!(!program.insts()[vertex].is_invalidated());
    }
}
