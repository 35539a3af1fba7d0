//! Constant propagation and algebraic folding (C6, §4.5).
//!
//! A single forward sweep over the reverse of [`Program::post_order_blocks`]
//! (definitions dominate uses in this ordering, so a use is never folded
//! before its producer has already been visited and possibly rewritten),
//! dispatching per-opcode on the current instruction and rewriting it in place with
//! [`Program::replace_uses_with`]/[`Program::set_arg`]/
//! [`Program::replace_opcode`]. Left-behind dead operands are not removed
//! here; C7 sweeps them in the pass driver's next step (§4.9).
//!
//! Grounded on `constant_propagation_pass.cpp`'s per-opcode `Fold*`
//! functions: this keeps the same shape (commutative canonicalization, then
//! an all-immediate check, then identities, then opcode-specific structural
//! folds) but collapses the original's template-heavy `LambdaTraits`
//! machinery into plain functions over this crate's smaller, non-generic
//! `Immediate` enum.

use crate::error::CoreError;
use crate::ir::entities::InstRef;
use crate::ir::instruction::Instruction;
use crate::ir::opcode::Opcode;
use crate::ir::program::Program;
use crate::ir::value::{Immediate, Predicate, Register, Value};
use crate::opt::patterns::{self, Derivative};
use smallvec::smallvec;

fn as_u32(value: Value) -> Option<u32> {
    match value {
        Value::Immediate(Immediate::U32(v)) => Some(v),
        _ => None,
    }
}

fn as_bool(value: Value) -> Option<bool> {
    match value {
        Value::Immediate(Immediate::Bool(v)) => Some(v),
        _ => None,
    }
}

fn as_f32(value: Value) -> Option<f32> {
    match value {
        Value::Immediate(Immediate::F32(v)) => Some(v),
        _ => None,
    }
}

/// `FoldCommutative<u32>`: folds two all-immediate arguments, otherwise
/// combines an immediate argument with a same-opcode producer's own
/// immediate argument, otherwise canonicalizes by moving the immediate
/// argument to the right (§4.5.1). Returns `true` when the instruction was
/// only normalized and the caller should keep applying opcode-specific
/// identities; `false` when it was fully folded to a constant.
fn fold_commutative_u32(
    program: &mut Program,
    inst: InstRef,
    combine: impl Fn(u32, u32) -> u32,
) -> Result<bool, CoreError> {
    let lhs = program.arg(inst, 0).expect("binary opcode has two args");
    let rhs = program.arg(inst, 1).expect("binary opcode has two args");
    match (as_u32(lhs), as_u32(rhs)) {
        (Some(a), Some(b)) => {
            program.replace_uses_with(inst, Value::Immediate(Immediate::U32(combine(a, b))))?;
            Ok(false)
        }
        (Some(a), None) => {
            if let Some(combined) = try_combine_with_producer(program, inst, rhs, a, &combine)? {
                program.set_arg(inst, 1, Value::Immediate(Immediate::U32(combined)))?;
            } else {
                program.set_arg(inst, 0, rhs)?;
                program.set_arg(inst, 1, lhs)?;
            }
            Ok(true)
        }
        (None, Some(b)) => {
            if let Some(combined) = try_combine_with_producer(program, inst, lhs, b, &combine)? {
                program.set_arg(inst, 1, Value::Immediate(Immediate::U32(combined)))?;
            }
            Ok(true)
        }
        (None, None) => Ok(true),
    }
}

/// If `operand` is produced by another instance of `inst`'s own opcode whose
/// second argument is also immediate, combine the two immediates and
/// re-point `inst`'s first argument at that producer's first argument.
fn try_combine_with_producer(
    program: &mut Program,
    inst: InstRef,
    operand: Value,
    immediate: u32,
    combine: &impl Fn(u32, u32) -> u32,
) -> Result<Option<u32>, CoreError> {
    let Value::Inst(producer) = operand else {
        return Ok(None);
    };
    if program.insts()[producer].opcode() != program.insts()[inst].opcode() {
        return Ok(None);
    }
    let Some(other_immediate) = program.arg(producer, 1).and_then(as_u32) else {
        return Ok(None);
    };
    let new_lhs = program.arg(producer, 0).expect("binary opcode has two args");
    program.set_arg(inst, 0, new_lhs)?;
    Ok(Some(combine(immediate, other_immediate)))
}

fn fold_commutative_bool(
    program: &mut Program,
    inst: InstRef,
    combine: impl Fn(bool, bool) -> bool,
) -> Result<bool, CoreError> {
    let lhs = program.arg(inst, 0).expect("binary opcode has two args");
    let rhs = program.arg(inst, 1).expect("binary opcode has two args");
    match (as_bool(lhs), as_bool(rhs)) {
        (Some(a), Some(b)) => {
            program.replace_uses_with(inst, Value::Immediate(Immediate::Bool(combine(a, b))))?;
            Ok(false)
        }
        (Some(_), None) => {
            program.set_arg(inst, 0, rhs)?;
            program.set_arg(inst, 1, lhs)?;
            Ok(true)
        }
        _ => Ok(true),
    }
}

fn is_get_cbuf(inst: &Instruction) -> bool {
    inst.opcode() == Opcode::GetCbufU32
}

fn same_cbuf_slot(program: &Program, a: InstRef, b: InstRef) -> bool {
    let pool = program.insts();
    is_get_cbuf(&pool[a])
        && is_get_cbuf(&pool[b])
        && pool[a].arg(0).unwrap().resolve(pool) == pool[b].arg(0).unwrap().resolve(pool)
        && pool[a].arg(1).unwrap().resolve(pool) == pool[b].arg(1).unwrap().resolve(pool)
}

/// `FoldGetRegister`: the hardwired zero register always reads as `0`.
fn fold_get_register(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    if program.arg(inst, 0) == Some(Value::Register(Register::Rz)) {
        program.replace_uses_with(inst, Value::Immediate(Immediate::U32(0)))?;
    }
    Ok(())
}

/// `FoldGetPred`: the hardwired true predicate always reads as `true`.
fn fold_get_pred(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    if program.arg(inst, 0) == Some(Value::Predicate(Predicate::Pt)) {
        program.replace_uses_with(inst, Value::Immediate(Immediate::Bool(true)))?;
    }
    Ok(())
}

fn fold_iadd32(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    if program.insts()[inst].has_associated_pseudo_operation() {
        return Ok(());
    }
    if !fold_commutative_u32(program, inst, |a, b| a.wrapping_add(b))? {
        return Ok(());
    }
    let lhs = program.arg(inst, 0).unwrap();
    let rhs = program.arg(inst, 1).unwrap();
    if as_u32(rhs) == Some(0) {
        program.replace_uses_with(inst, lhs)?;
        return Ok(());
    }
    if let Some((a, b)) = patterns::match_xmad_multiply(program, lhs, rhs) {
        let product = program.alloc_instruction(Opcode::IMul32, smallvec![a, b]);
        program.insert_inst_before(inst, product);
        program.replace_uses_with(inst, Value::Inst(product))?;
        return Ok(());
    }
    if let Some((a, b, c)) = patterns::match_xmad_multiply_add(program, lhs, rhs) {
        let product = program.alloc_instruction(Opcode::IMul32, smallvec![a, b]);
        program.insert_inst_before(inst, product);
        let sum = program.alloc_instruction(Opcode::IAdd32, smallvec![Value::Inst(product), c]);
        program.insert_inst_before(inst, sum);
        program.replace_uses_with(inst, Value::Inst(sum))?;
    }
    Ok(())
}

/// `FoldISub32`: all-immediate fold, then the constant-buffer difference
/// idioms (§4.5.2) — `cbuf - cbuf` (same slot) folds to zero, and
/// `(x + cbuf) - cbuf` (same slot) folds to `x`.
fn fold_isub32(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    let lhs = program.arg(inst, 0).unwrap();
    let rhs = program.arg(inst, 1).unwrap();
    if let (Some(a), Some(b)) = (as_u32(lhs), as_u32(rhs)) {
        program.replace_uses_with(inst, Value::Immediate(Immediate::U32(a.wrapping_sub(b))))?;
        return Ok(());
    }
    if lhs.is_immediate() || rhs.is_immediate() {
        return Ok(());
    }
    let (Value::Inst(mut op_a), Value::Inst(mut op_b)) = (lhs, rhs) else {
        return Ok(());
    };
    if same_cbuf_slot(program, op_a, op_b) {
        program.replace_uses_with(inst, Value::Immediate(Immediate::U32(0)))?;
        return Ok(());
    }
    if program.insts()[op_b].opcode() == Opcode::IAdd32 {
        std::mem::swap(&mut op_a, &mut op_b);
    }
    if program.insts()[op_b].opcode() != Opcode::GetCbufU32 {
        return Ok(());
    }
    if program.insts()[op_a].opcode() != Opcode::IAdd32 {
        return Ok(());
    }
    let mut add_op_a = program.arg(op_a, 0).unwrap();
    let mut add_op_b = program.arg(op_a, 1).unwrap();
    if add_op_b.is_immediate() {
        std::mem::swap(&mut add_op_a, &mut add_op_b);
    }
    if add_op_b.is_immediate() {
        return Ok(());
    }
    let Value::Inst(add_cbuf) = add_op_b else {
        return Ok(());
    };
    if same_cbuf_slot(program, add_cbuf, op_b) {
        program.replace_uses_with(inst, add_op_a)?;
    }
    Ok(())
}

fn fold_imul32(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    if !fold_commutative_u32(program, inst, |a, b| a.wrapping_mul(b))? {
        return Ok(());
    }
    let lhs = program.arg(inst, 0).unwrap();
    let rhs = program.arg(inst, 1).unwrap();
    match as_u32(rhs) {
        Some(0) => program.replace_uses_with(inst, Value::Immediate(Immediate::U32(0)))?,
        Some(1) => program.replace_uses_with(inst, lhs)?,
        _ => {}
    }
    Ok(())
}

fn fold_bitwise(
    program: &mut Program,
    inst: InstRef,
    combine: impl Fn(u32, u32) -> u32,
    absorbing: Option<u32>,
    identity: Option<u32>,
) -> Result<(), CoreError> {
    if !fold_commutative_u32(program, inst, combine)? {
        return Ok(());
    }
    let lhs = program.arg(inst, 0).unwrap();
    let rhs = program.arg(inst, 1).unwrap();
    if let Some(a) = absorbing {
        if as_u32(rhs) == Some(a) {
            program.replace_uses_with(inst, Value::Immediate(Immediate::U32(a)))?;
            return Ok(());
        }
    }
    if let Some(i) = identity {
        if as_u32(rhs) == Some(i) {
            program.replace_uses_with(inst, lhs)?;
        }
    }
    Ok(())
}

fn fold_logical_and(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    if !fold_commutative_bool(program, inst, |a, b| a && b)? {
        return Ok(());
    }
    let lhs = program.arg(inst, 0).unwrap();
    let rhs = program.arg(inst, 1).unwrap();
    if let Some(b) = as_bool(rhs) {
        if b {
            program.replace_uses_with(inst, lhs)?;
        } else {
            program.replace_uses_with(inst, Value::Immediate(Immediate::Bool(false)))?;
        }
    }
    Ok(())
}

fn fold_logical_or(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    if !fold_commutative_bool(program, inst, |a, b| a || b)? {
        return Ok(());
    }
    let lhs = program.arg(inst, 0).unwrap();
    let rhs = program.arg(inst, 1).unwrap();
    if let Some(b) = as_bool(rhs) {
        if b {
            program.replace_uses_with(inst, Value::Immediate(Immediate::Bool(true)))?;
        } else {
            program.replace_uses_with(inst, lhs)?;
        }
    }
    Ok(())
}

/// `FoldLogicalNot`: folds an immediate operand, and cancels a double
/// negation (`!!x == x`).
fn fold_logical_not(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    let value = program.arg(inst, 0).unwrap();
    if let Some(b) = as_bool(value) {
        program.replace_uses_with(inst, Value::Immediate(Immediate::Bool(!b)))?;
        return Ok(());
    }
    if let Value::Inst(producer) = value {
        if program.insts()[producer].opcode() == Opcode::LogicalNot {
            let inner = program.arg(producer, 0).unwrap();
            program.replace_uses_with(inst, inner)?;
        }
    }
    Ok(())
}

fn fold_select(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    let cond = program.arg(inst, 0).unwrap();
    if let Some(c) = as_bool(cond) {
        let chosen = program.arg(inst, if c { 1 } else { 2 }).unwrap();
        program.replace_uses_with(inst, chosen)?;
    }
    Ok(())
}

/// `FoldBitCast`: folds an immediate reinterpret, cancels back-to-back
/// casts (`BitCastU32F32(BitCastF32U32(x)) == x`), and fuses
/// `BitCastF32U32(GetCbufU32(a, b))` into the typed `GetCbufF32(a, b)` read
/// (§4.5.3).
fn fold_bitcast_f32_u32(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    let value = program.arg(inst, 0).unwrap();
    if let Some(bits) = as_u32(value) {
        program.replace_uses_with(inst, Value::Immediate(Immediate::F32(f32::from_bits(bits))))?;
        return Ok(());
    }
    let Value::Inst(producer) = value else {
        return Ok(());
    };
    match program.insts()[producer].opcode() {
        Opcode::BitCastU32F32 => {
            let inner = program.arg(producer, 0).unwrap();
            program.replace_uses_with(inst, inner)?;
        }
        Opcode::GetCbufU32 => {
            let slot = program.arg(producer, 0).unwrap();
            let offset = program.arg(producer, 1).unwrap();
            program.replace_opcode(inst, Opcode::GetCbufF32)?;
            program.set_arg(inst, 0, slot)?;
            program.set_arg(inst, 1, offset)?;
        }
        _ => {}
    }
    Ok(())
}

fn fold_bitcast_u32_f32(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    let value = program.arg(inst, 0).unwrap();
    if let Some(f) = as_f32(value) {
        program.replace_uses_with(inst, Value::Immediate(Immediate::U32(f.to_bits())))?;
        return Ok(());
    }
    if let Value::Inst(producer) = value {
        if program.insts()[producer].opcode() == Opcode::BitCastF32U32 {
            let inner = program.arg(producer, 0).unwrap();
            program.replace_uses_with(inst, inner)?;
        }
    }
    Ok(())
}

/// `FoldInverseFunc`: cancels a pack immediately undone by its matching
/// unpack, or vice versa (§4.5.4). Does not attempt the all-immediate case;
/// composite immediates are out of scope for this fold.
fn fold_inverse(program: &mut Program, inst: InstRef, reverse: Opcode) -> Result<(), CoreError> {
    let value = program.arg(inst, 0).unwrap();
    if let Value::Inst(producer) = value {
        if program.insts()[producer].opcode() == reverse {
            let inner = program.arg(producer, 0).unwrap();
            program.replace_uses_with(inst, inner)?;
        }
    }
    Ok(())
}

/// `FoldCompositeExtractImpl`/`FoldCompositeExtract`: walks a chain of
/// `CompositeInsert`s looking for the one that wrote `first_index` (or the
/// originating `CompositeConstruct`), so an extract immediately following
/// an insert/construct fuses instead of reading back through the composite
/// (§4.5.5).
fn fold_composite_extract_impl(program: &Program, mut value: Value, first_index: u32) -> Option<Value> {
    loop {
        let Value::Inst(producer) = value else {
            return None;
        };
        let inst = &program.insts()[producer];
        if inst.opcode() == Opcode::CompositeConstruct {
            return inst.arg(first_index as usize);
        }
        if inst.opcode() != Opcode::CompositeInsert {
            return None;
        }
        let second_index = as_u32(inst.arg(2)?)?;
        if first_index == second_index {
            return inst.arg(1);
        }
        let composite = inst.arg(0)?;
        if composite.is_immediate() {
            return None;
        }
        value = composite;
    }
}

fn fold_composite_extract(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    let composite = program.arg(inst, 0).unwrap();
    let index = program.arg(inst, 1).unwrap();
    if composite.is_immediate() {
        return Ok(());
    }
    let Some(first_index) = as_u32(index) else {
        return Ok(());
    };
    if let Some(result) = fold_composite_extract_impl(program, composite, first_index) {
        program.replace_uses_with(inst, result)?;
    }
    Ok(())
}

/// `FoldFPMul32`: the perspective-divide identity `a * (1 / b)` where `a`
/// is itself `FPMul32(_, attr_b)` and `b` reads the same attribute as `a`'s
/// own second factor (`attr_a == attr_b`) folds to that shared factor,
/// i.e. `attr * (x / attr) == x` once both attribute reads resolve to the
/// same varying slot. Does not attempt full perspective correctness beyond
/// the tag-equality check the original performs; `no_contraction` vetoes
/// the fold outright since it marks the multiply as required to stay
/// literal (§4.5.2).
fn fold_fpmul32(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    if program.insts()[inst].flags().no_contraction {
        return Ok(());
    }
    let lhs = program.arg(inst, 0).unwrap();
    let rhs = program.arg(inst, 1).unwrap();
    if lhs.is_immediate() || rhs.is_immediate() {
        return Ok(());
    }
    let (Value::Inst(lhs_op), Value::Inst(rhs_op)) = (lhs, rhs) else {
        return Ok(());
    };
    if program.insts()[lhs_op].opcode() != Opcode::FPMul32 || program.insts()[rhs_op].opcode() != Opcode::FPRecip32 {
        return Ok(());
    }
    let recip_source = program.arg(rhs_op, 0).unwrap().resolve(program.insts());
    let lhs_mul_source = program.arg(lhs_op, 1).unwrap().resolve(program.insts());
    if recip_source.is_immediate() || lhs_mul_source.is_immediate() {
        return Ok(());
    }
    let (Value::Inst(attr_a), Value::Inst(attr_b)) = (recip_source, lhs_mul_source) else {
        return Ok(());
    };
    if program.insts()[attr_a].opcode() != Opcode::GetAttribute || program.insts()[attr_b].opcode() != Opcode::GetAttribute {
        return Ok(());
    }
    if program.arg(attr_a, 0) == program.arg(attr_b, 0) {
        let replacement = program.arg(lhs_op, 0).unwrap();
        program.replace_uses_with(inst, replacement)?;
    }
    Ok(())
}

/// `FoldFSwizzleAdd`: recognizes the quad-swizzle derivative idiom and
/// replaces it with the matching `DPdxFine`/`DPdyFine` instruction
/// (§4.5.7).
fn fold_fswizzle_add(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    let lhs = program.arg(inst, 0).unwrap();
    let rhs = program.arg(inst, 1).unwrap();
    let swizzle = program.arg(inst, 2).unwrap();
    if !swizzle.is_immediate() {
        return Ok(());
    }
    if let Some((derivative, source)) = patterns::match_fswizzle_derivative(program, lhs, rhs, swizzle) {
        let opcode = match derivative {
            Derivative::DpdxFine => Opcode::DPdxFine,
            Derivative::DpdyFine => Opcode::DPdyFine,
        };
        let replacement = program.alloc_instruction(opcode, smallvec![source]);
        program.insert_inst_before(inst, replacement);
        program.replace_uses_with(inst, Value::Inst(replacement))?;
    }
    Ok(())
}

/// Dispatches one instruction's fold by opcode; the `match` arms are the
/// direct analogue of `ConstantPropagation`'s `switch` in the original pass.
fn fold_instruction(program: &mut Program, inst: InstRef) -> Result<(), CoreError> {
    match program.insts()[inst].opcode() {
        Opcode::GetRegister => fold_get_register(program, inst),
        Opcode::GetPred => fold_get_pred(program, inst),
        Opcode::IAdd32 => fold_iadd32(program, inst),
        Opcode::ISub32 => fold_isub32(program, inst),
        Opcode::IMul32 => fold_imul32(program, inst),
        Opcode::FPMul32 => fold_fpmul32(program, inst),
        Opcode::IAnd32 => fold_bitwise(program, inst, |a, b| a & b, Some(0), Some(u32::MAX)),
        Opcode::IOr32 => fold_bitwise(program, inst, |a, b| a | b, Some(u32::MAX), Some(0)),
        Opcode::IXor32 => fold_bitwise(program, inst, |a, b| a ^ b, None, Some(0)),
        Opcode::LogicalAnd => fold_logical_and(program, inst),
        Opcode::LogicalOr => fold_logical_or(program, inst),
        Opcode::LogicalNot => fold_logical_not(program, inst),
        Opcode::Select => fold_select(program, inst),
        Opcode::BitCastF32U32 => fold_bitcast_f32_u32(program, inst),
        Opcode::BitCastU32F32 => fold_bitcast_u32_f32(program, inst),
        Opcode::PackHalf2x16 => fold_inverse(program, inst, Opcode::UnpackHalf2x16),
        Opcode::UnpackHalf2x16 => fold_inverse(program, inst, Opcode::PackHalf2x16),
        Opcode::PackFloat2x16 => fold_inverse(program, inst, Opcode::UnpackFloat2x16),
        Opcode::UnpackFloat2x16 => fold_inverse(program, inst, Opcode::PackFloat2x16),
        Opcode::CompositeExtract => fold_composite_extract(program, inst),
        Opcode::FSwizzleAdd => fold_fswizzle_add(program, inst),
        _ => Ok(()),
    }
}

/// Runs one forward sweep of constant propagation over `program` (C6).
///
/// `program.post_order_blocks()` must already be current (the pass driver,
/// C9, computes it before running any pass); this walks it in reverse so
/// each block is visited before its children.
pub fn propagate_constants(program: &mut Program) -> Result<(), CoreError> {
    let blocks: Vec<_> = program.post_order_blocks().iter().rev().copied().collect();
    for block in blocks {
        let insts: Vec<_> = program.block_insts(block).collect();
        for inst in insts {
            if program.insts()[inst].is_invalidated() {
                continue;
            }
            fold_instruction(program, inst)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::attribute::{Attribute, Component};
    use crate::ir::program::Stage;

    fn imm(v: u32) -> Value {
        Value::Immediate(Immediate::U32(v))
    }

    fn single_block_program() -> (Program, crate::ir::entities::BlockRef) {
        let mut program = Program::new(Stage::Fragment);
        let block = program.new_block();
        program.set_ast_root(block);
        (program, block)
    }

    #[test]
    fn folds_all_immediate_add() {
        let (mut program, block) = single_block_program();
        let add = program.alloc_instruction(Opcode::IAdd32, smallvec![imm(2), imm(3)]);
        program.append_inst(block, add);
        let vertex = program.alloc_instruction(Opcode::EmitVertex, smallvec![Value::Inst(add)]);
        program.append_inst(block, vertex);

        program.compute_post_order();
        propagate_constants(&mut program).unwrap();
        assert_eq!(program.arg(vertex, 0), Some(imm(5)));
        assert_eq!(program.insts()[add].use_count(), 0);
    }

    #[test]
    fn folds_cbuf_self_subtraction_to_zero() {
        let (mut program, block) = single_block_program();
        let cbuf_a = program.alloc_instruction(Opcode::GetCbufU32, smallvec![imm(0), imm(16)]);
        program.append_inst(block, cbuf_a);
        let cbuf_b = program.alloc_instruction(Opcode::GetCbufU32, smallvec![imm(0), imm(16)]);
        program.append_inst(block, cbuf_b);
        let sub = program.alloc_instruction(
            Opcode::ISub32,
            smallvec![Value::Inst(cbuf_a), Value::Inst(cbuf_b)],
        );
        program.append_inst(block, sub);
        let vertex = program.alloc_instruction(Opcode::EmitVertex, smallvec![Value::Inst(sub)]);
        program.append_inst(block, vertex);

        program.compute_post_order();
        propagate_constants(&mut program).unwrap();
        assert_eq!(program.arg(vertex, 0), Some(imm(0)));
        assert_eq!(program.insts()[sub].use_count(), 0);
    }

    #[test]
    fn folds_logical_not_double_negation() {
        let (mut program, block) = single_block_program();
        let src = program.alloc_instruction(Opcode::GetPred, smallvec![Value::Predicate(Predicate::Named(3))]);
        program.append_inst(block, src);
        let not1 = program.alloc_instruction(Opcode::LogicalNot, smallvec![Value::Inst(src)]);
        program.append_inst(block, not1);
        let not2 = program.alloc_instruction(Opcode::LogicalNot, smallvec![Value::Inst(not1)]);
        program.append_inst(block, not2);
        let vertex = program.alloc_instruction(Opcode::EmitVertex, smallvec![Value::Inst(not2)]);
        program.append_inst(block, vertex);

        program.compute_post_order();
        propagate_constants(&mut program).unwrap();
        assert_eq!(program.arg(vertex, 0), Some(Value::Inst(src)));
        assert_eq!(program.insts()[not1].use_count(), 0);
        assert_eq!(program.insts()[not2].use_count(), 0);
    }

    #[test]
    fn folds_perspective_divide_identity() {
        let (mut program, block) = single_block_program();
        let attr = Attribute::generic(0, Component::X).unwrap();
        let attr_a = program.alloc_instruction(Opcode::GetAttribute, smallvec![Value::Attribute(attr)]);
        program.append_inst(block, attr_a);
        let attr_b = program.alloc_instruction(Opcode::GetAttribute, smallvec![Value::Attribute(attr)]);
        program.append_inst(block, attr_b);
        let x = program.alloc_instruction(Opcode::GetRegister, smallvec![Value::Register(Register::Named(7))]);
        program.append_inst(block, x);
        let mul = program.alloc_instruction(Opcode::FPMul32, smallvec![Value::Inst(x), Value::Inst(attr_b)]);
        program.append_inst(block, mul);
        let recip = program.alloc_instruction(Opcode::FPRecip32, smallvec![Value::Inst(attr_a)]);
        program.append_inst(block, recip);
        let divide = program.alloc_instruction(Opcode::FPMul32, smallvec![Value::Inst(mul), Value::Inst(recip)]);
        program.append_inst(block, divide);
        let vertex = program.alloc_instruction(Opcode::EmitVertex, smallvec![Value::Inst(divide)]);
        program.append_inst(block, vertex);

        program.compute_post_order();
        propagate_constants(&mut program).unwrap();
        assert_eq!(program.arg(vertex, 0), Some(Value::Inst(x)));
    }

    #[test]
    fn no_contraction_flag_vetoes_perspective_divide_fold() {
        let (mut program, block) = single_block_program();
        let attr = Attribute::generic(0, Component::X).unwrap();
        let attr_a = program.alloc_instruction(Opcode::GetAttribute, smallvec![Value::Attribute(attr)]);
        program.append_inst(block, attr_a);
        let attr_b = program.alloc_instruction(Opcode::GetAttribute, smallvec![Value::Attribute(attr)]);
        program.append_inst(block, attr_b);
        let x = program.alloc_instruction(Opcode::GetRegister, smallvec![Value::Register(Register::Named(7))]);
        program.append_inst(block, x);
        let mul = program.alloc_instruction(Opcode::FPMul32, smallvec![Value::Inst(x), Value::Inst(attr_b)]);
        program.append_inst(block, mul);
        let recip = program.alloc_instruction(Opcode::FPRecip32, smallvec![Value::Inst(attr_a)]);
        program.append_inst(block, recip);
        let divide = program.alloc_instruction(Opcode::FPMul32, smallvec![Value::Inst(mul), Value::Inst(recip)]);
        program.set_flags(divide, crate::ir::instruction::InstFlags { no_contraction: true });
        program.append_inst(block, divide);
        let vertex = program.alloc_instruction(Opcode::EmitVertex, smallvec![Value::Inst(divide)]);
        program.append_inst(block, vertex);

        program.compute_post_order();
        propagate_constants(&mut program).unwrap();
        assert_eq!(program.arg(vertex, 0), Some(Value::Inst(divide)));
    }

    #[test]
    fn fuses_composite_construct_then_extract() {
        let (mut program, block) = single_block_program();
        let a = program.alloc_instruction(Opcode::GetRegister, smallvec![Value::Register(Register::Named(1))]);
        program.append_inst(block, a);
        let b = program.alloc_instruction(Opcode::GetRegister, smallvec![Value::Register(Register::Named(2))]);
        program.append_inst(block, b);
        let construct = program.alloc_instruction(
            Opcode::CompositeConstruct,
            smallvec![Value::Inst(a), Value::Inst(b)],
        );
        program.append_inst(block, construct);
        let extract = program.alloc_instruction(
            Opcode::CompositeExtract,
            smallvec![Value::Inst(construct), imm(1)],
        );
        program.append_inst(block, extract);
        let vertex = program.alloc_instruction(Opcode::EmitVertex, smallvec![Value::Inst(extract)]);
        program.append_inst(block, vertex);

        program.compute_post_order();
        propagate_constants(&mut program).unwrap();
        assert_eq!(program.arg(vertex, 0), Some(Value::Inst(b)));
        assert_eq!(program.insts()[extract].use_count(), 0);
    }
}
