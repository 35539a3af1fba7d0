//! Maxwell-specific macro-op pattern recognition (§4.5.6, §4.5.7).
//!
//! The front end lowers integer multiplies and FMAs to chains of `XMAD`
//! half-word multiply instructions (decoded here as `BitFieldUExtract` /
//! `BitFieldInsert` / `IMul32` / `ShiftLeftLogical32` trees), and lowers a
//! quad-swizzle derivative idiom to `ShuffleButterfly` + `FSwizzleAdd`. Both
//! patterns are reconstructed back to their source-level operation so the
//! backends (§6) emit a single native instruction instead of the expanded
//! tree. Grounded on `FoldXmadMultiplyAdd`/`FoldXmadMultiply`/
//! `FoldFSwizzleAdd` in the original constant propagation pass: each match
//! function walks the producer chain with early returns on mismatch,
//! translated here into a chain of `?`-using `Option` combinators per the
//! design note favoring pattern-matching-with-capture over open-coded
//! nested `if`s (§9).

use crate::ir::entities::InstRef;
use crate::ir::instruction::Instruction;
use crate::ir::opcode::Opcode;
use crate::ir::program::Program;
use crate::ir::value::{Immediate, Value};

fn resolve_inst_ref(program: &Program, value: Value) -> Option<InstRef> {
    match value.resolve(program.insts()) {
        Value::Inst(inst_ref) => Some(inst_ref),
        _ => None,
    }
}

fn producer(program: &Program, value: Value) -> Option<(Opcode, &Instruction)> {
    let inst_ref = resolve_inst_ref(program, value)?;
    let inst = &program.insts()[inst_ref];
    Some((inst.opcode(), inst))
}

fn as_u32(value: Value) -> Option<u32> {
    match value {
        Value::Immediate(Immediate::U32(v)) => Some(v),
        _ => None,
    }
}

fn is_u32_const(program: &Program, value: Value, expected: u32) -> bool {
    as_u32(value.resolve(program.insts())) == Some(expected)
}

/// A half-word extract: `BitFieldUExtract(source, offset, #16)` with
/// `offset` either `0` or `16`. Returns the extracted source value.
fn match_half_extract(program: &Program, value: Value, offset: u32) -> Option<Value> {
    let (opcode, inst) = producer(program, value)?;
    if opcode != Opcode::BitFieldUExtract {
        return None;
    }
    if !is_u32_const(program, inst.arg(1)?, offset) || !is_u32_const(program, inst.arg(2)?, 16) {
        return None;
    }
    Some(inst.arg(0)?)
}

/// Replaces the pattern generated by two `XMAD` half-word multiplications
/// with a single full-width multiply (`FoldXmadMultiply`): given the two
/// arguments of an `IAdd32`, recognizes
///
/// ```text
/// lhs_shl = ShiftLeftLogical32(IMul32(BitFieldUExtract(a, 16, 16), b), 16)
/// rhs_mul = IMul32(BitFieldUExtract(a, 0, 16), b)
/// result  = IAdd32(lhs_shl, rhs_mul)
/// ```
///
/// and returns `(a, b)` when it matches.
pub fn match_xmad_multiply(program: &Program, add_lhs: Value, add_rhs: Value) -> Option<(Value, Value)> {
    let (shl_opcode, shl_inst) = producer(program, add_lhs)?;
    if shl_opcode != Opcode::ShiftLeftLogical32 || !is_u32_const(program, shl_inst.arg(1)?, 16) {
        return None;
    }
    let (hi_mul_opcode, hi_mul_inst) = producer(program, shl_inst.arg(0)?)?;
    let (lo_mul_opcode, lo_mul_inst) = producer(program, add_rhs)?;
    if hi_mul_opcode != Opcode::IMul32 || lo_mul_opcode != Opcode::IMul32 {
        return None;
    }

    let factor_b = hi_mul_inst.arg(1)?;
    if factor_b.resolve(program.insts()) != lo_mul_inst.arg(1)?.resolve(program.insts()) {
        return None;
    }

    let factor_a_hi = match_half_extract(program, hi_mul_inst.arg(0)?, 16)?;
    let factor_a_lo = match_half_extract(program, lo_mul_inst.arg(0)?, 0)?;
    if factor_a_hi.resolve(program.insts()) != factor_a_lo.resolve(program.insts()) {
        return None;
    }

    Some((factor_a_hi, factor_b))
}

/// Replaces the 16-instruction `XMAD`-chain rendering of a 32-bit integer
/// FMA with `IAdd32(IMul32(a, b), c)` (`FoldXmadMultiplyAdd`). Ported
/// instruction-for-instruction from the original pass's `_6`.."_27" chain
/// (comment numbering kept below to cross-reference it):
///
/// ```text
/// _6  = BitFieldUExtract(op_b, 0, 16)    _7  = BitFieldUExtract(op_a, 16, 16)
/// _8  = IMul32(_6, _7)                   _10 = BitFieldUExtract(op_a, 0, 16)
/// _11 = BitFieldInsert(_8, _10, 16, 16)
/// _15 = BitFieldUExtract(op_b, 0, 16)    _16 = BitFieldUExtract(op_a, 0, 16)
/// _17 = IMul32(_15, _16)                 _18 = IAdd32(_17, op_c)
/// _22 = BitFieldUExtract(op_b, 16, 16)   _23 = BitFieldUExtract(_11, 16, 16)
/// _24 = IMul32(_22, _23)                 _25 = ShiftLeftLogical32(_24, 16)
/// _26 = ShiftLeftLogical32(_11, 16)      _27 = IAdd32(_26, _18)
/// result = IAdd32(_25, _27)
/// ```
///
/// `_23`'s extract of `_11` is the detail this is easiest to get wrong:
/// `_24`'s second operand is not `_11` itself but a half-extract *of* it, and
/// `_26` must shift that exact `_11` node (checked by comparing resolved
/// `InstRef`s, the Rust analogue of the original's pointer-identity check).
pub fn match_xmad_multiply_add(
    program: &Program,
    add_lhs: Value,
    add_rhs: Value,
) -> Option<(Value, Value, Value)> {
    // add_lhs = _25 = ShiftLeftLogical32(_24, 16), _24 = IMul32(_22, _23)
    let (shl_25_opcode, shl_25) = producer(program, add_lhs)?;
    if shl_25_opcode != Opcode::ShiftLeftLogical32 || !is_u32_const(program, shl_25.arg(1)?, 16) {
        return None;
    }
    let (mul_24_opcode, mul_24) = producer(program, shl_25.arg(0)?)?;
    if mul_24_opcode != Opcode::IMul32 {
        return None;
    }
    let op_b_hi = match_half_extract(program, mul_24.arg(0)?, 16)?; // _22
    let inst_11_value = match_half_extract(program, mul_24.arg(1)?, 16)?; // _23 -> _11

    // _11 = BitFieldInsert(_8, _10, 16, 16)
    let (insert_11_opcode, insert_11) = producer(program, inst_11_value)?;
    if insert_11_opcode != Opcode::BitFieldInsert {
        return None;
    }
    if !is_u32_const(program, insert_11.arg(2)?, 16) || !is_u32_const(program, insert_11.arg(3)?, 16) {
        return None;
    }
    let (mul_8_opcode, mul_8) = producer(program, insert_11.arg(0)?)?;
    if mul_8_opcode != Opcode::IMul32 {
        return None;
    }
    let op_b_lo = match_half_extract(program, mul_8.arg(0)?, 0)?; // _6
    let op_a_hi = match_half_extract(program, mul_8.arg(1)?, 16)?; // _7
    let op_a_from_insert = match_half_extract(program, insert_11.arg(1)?, 0)?; // _10

    // add_rhs = _27 = IAdd32(_26, _18), _26 = ShiftLeftLogical32(_11, 16)
    let (add_27_opcode, add_27) = producer(program, add_rhs)?;
    if add_27_opcode != Opcode::IAdd32 {
        return None;
    }
    let (shl_26_opcode, shl_26) = producer(program, add_27.arg(0)?)?;
    if shl_26_opcode != Opcode::ShiftLeftLogical32 || !is_u32_const(program, shl_26.arg(1)?, 16) {
        return None;
    }
    if resolve_inst_ref(program, shl_26.arg(0)?) != resolve_inst_ref(program, inst_11_value) {
        return None;
    }

    // _18 = IAdd32(_17, op_c), _17 = IMul32(_15, _16)
    let (add_18_opcode, add_18) = producer(program, add_27.arg(1)?)?;
    if add_18_opcode != Opcode::IAdd32 {
        return None;
    }
    let op_c = add_18.arg(1)?;
    let (mul_17_opcode, mul_17) = producer(program, add_18.arg(0)?)?;
    if mul_17_opcode != Opcode::IMul32 {
        return None;
    }
    let op_b_lo2 = match_half_extract(program, mul_17.arg(0)?, 0)?; // _15
    let op_a_lo = match_half_extract(program, mul_17.arg(1)?, 0)?; // _16

    let op_a_candidates = [op_a_hi, op_a_from_insert, op_a_lo];
    let op_b_candidates = [op_b_hi, op_b_lo, op_b_lo2];
    if !all_resolve_equal(program, &op_a_candidates) || !all_resolve_equal(program, &op_b_candidates) {
        return None;
    }

    Some((op_a_candidates[0], op_b_candidates[0], op_c))
}

fn all_resolve_equal(program: &Program, values: &[Value]) -> bool {
    let first = values[0].resolve(program.insts());
    values[1..].iter().all(|v| v.resolve(program.insts()) == first)
}

/// A screen-space partial derivative reconstructed from a quad-swizzle
/// shuffle + weighted add (`FoldFSwizzleAdd`).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Derivative {
    DpdxFine,
    DpdyFine,
}

fn get_through_cast(program: &Program, value: Value, cast_opcode: Opcode) -> Value {
    let resolved = value.resolve(program.insts());
    match producer(program, resolved) {
        Some((opcode, inst)) if opcode == cast_opcode => inst.arg(0).unwrap_or(resolved),
        _ => resolved,
    }
}

/// Recognizes `FSwizzleAdd(a, b, swizzle)` over a `ShuffleButterfly`-shuffled
/// operand as a coarse derivative idiom, returning the derivative kind and
/// the source value to differentiate.
pub fn match_fswizzle_derivative(
    program: &Program,
    lhs: Value,
    rhs: Value,
    swizzle: Value,
) -> Option<(Derivative, Value)> {
    let swizzle_value = as_u32(swizzle.resolve(program.insts()))?;
    if swizzle_value != 0x99 && swizzle_value != 0xA5 {
        return None;
    }

    let value_1 = get_through_cast(program, lhs, Opcode::BitCastF32U32);
    if value_1.is_immediate() {
        return None;
    }
    let value_2 = get_through_cast(program, rhs, Opcode::BitCastF32U32);

    let (shuffle_opcode, shuffle_inst) = producer(program, value_1)?;
    if shuffle_opcode != Opcode::ShuffleButterfly {
        return None;
    }
    let value_3 = get_through_cast(program, shuffle_inst.arg(0)?, Opcode::BitCastU32F32);
    if value_2.resolve(program.insts()) != value_3.resolve(program.insts()) {
        return None;
    }

    let index = as_u32(shuffle_inst.arg(1)?.resolve(program.insts()))?;
    let clamp = as_u32(shuffle_inst.arg(2)?.resolve(program.insts()))?;
    let segmentation_mask = as_u32(shuffle_inst.arg(3)?.resolve(program.insts()))?;
    if clamp != 3 || segmentation_mask != 28 {
        return None;
    }

    match (swizzle_value, index) {
        (0x99, 1) => Some((Derivative::DpdxFine, rhs)),
        (0xA5, 2) => Some((Derivative::DpdyFine, rhs)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::entities::InstRef;
    use crate::ir::program::Stage;
    use smallvec::smallvec;

    fn imm(v: u32) -> Value {
        Value::Immediate(Immediate::U32(v))
    }

    fn bfe(program: &mut Program, source: Value, offset: u32) -> InstRef {
        program.alloc_instruction(Opcode::BitFieldUExtract, smallvec![source, imm(offset), imm(16)])
    }

    #[test]
    fn recognizes_two_xmad_halves_as_a_full_multiply() {
        let mut program = Program::new(Stage::Fragment);
        let a = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(0)]));
        let b = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(1)]));

        let a_lo = Value::Inst(bfe(&mut program, a, 0));
        let a_hi = Value::Inst(bfe(&mut program, a, 16));
        let rhs_mul = Value::Inst(program.alloc_instruction(Opcode::IMul32, smallvec![a_lo, b]));
        let lhs_mul = Value::Inst(program.alloc_instruction(Opcode::IMul32, smallvec![a_hi, b]));
        let lhs_shl = Value::Inst(program.alloc_instruction(Opcode::ShiftLeftLogical32, smallvec![lhs_mul, imm(16)]));

        let matched = match_xmad_multiply(&program, lhs_shl, rhs_mul).expect("pattern should match");
        assert_eq!(matched.0.resolve(program.insts()), a.resolve(program.insts()));
        assert_eq!(matched.1.resolve(program.insts()), b.resolve(program.insts()));
    }

    #[test]
    fn mismatched_shift_amount_does_not_match() {
        let mut program = Program::new(Stage::Fragment);
        let a = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(0)]));
        let b = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(1)]));
        let a_lo = Value::Inst(bfe(&mut program, a, 0));
        let rhs_mul = Value::Inst(program.alloc_instruction(Opcode::IMul32, smallvec![a_lo, b]));
        let lhs_shl = Value::Inst(program.alloc_instruction(Opcode::ShiftLeftLogical32, smallvec![a, imm(8)]));
        assert!(match_xmad_multiply(&program, lhs_shl, rhs_mul).is_none());
    }

    #[test]
    fn recognizes_full_xmad_multiply_add_chain() {
        let mut program = Program::new(Stage::Fragment);
        let op_a = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(0)]));
        let op_b = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(1)]));
        let op_c = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(2)]));

        // _6, _7, _8, _10, _11
        let v6 = Value::Inst(bfe(&mut program, op_b, 0));
        let v7 = Value::Inst(bfe(&mut program, op_a, 16));
        let v8 = Value::Inst(program.alloc_instruction(Opcode::IMul32, smallvec![v6, v7]));
        let v10 = Value::Inst(bfe(&mut program, op_a, 0));
        let v11 =
            Value::Inst(program.alloc_instruction(Opcode::BitFieldInsert, smallvec![v8, v10, imm(16), imm(16)]));

        // _15, _16, _17, _18
        let v15 = Value::Inst(bfe(&mut program, op_b, 0));
        let v16 = Value::Inst(bfe(&mut program, op_a, 0));
        let v17 = Value::Inst(program.alloc_instruction(Opcode::IMul32, smallvec![v15, v16]));
        let v18 = Value::Inst(program.alloc_instruction(Opcode::IAdd32, smallvec![v17, op_c]));

        // _22, _23, _24, _25
        let v22 = Value::Inst(bfe(&mut program, op_b, 16));
        let v23 = Value::Inst(bfe(&mut program, v11, 16));
        let v24 = Value::Inst(program.alloc_instruction(Opcode::IMul32, smallvec![v22, v23]));
        let v25 = Value::Inst(program.alloc_instruction(Opcode::ShiftLeftLogical32, smallvec![v24, imm(16)]));

        // _26, _27
        let v26 = Value::Inst(program.alloc_instruction(Opcode::ShiftLeftLogical32, smallvec![v11, imm(16)]));
        let v27 = Value::Inst(program.alloc_instruction(Opcode::IAdd32, smallvec![v26, v18]));

        let (a, b, c) = match_xmad_multiply_add(&program, v25, v27).expect("pattern should match");
        assert_eq!(a.resolve(program.insts()), op_a.resolve(program.insts()));
        assert_eq!(b.resolve(program.insts()), op_b.resolve(program.insts()));
        assert_eq!(c.resolve(program.insts()), op_c.resolve(program.insts()));
    }

    #[test]
    fn xmad_multiply_add_rejects_mismatched_insert_identity() {
        let mut program = Program::new(Stage::Fragment);
        let op_a = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(0)]));
        let op_b = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(1)]));
        let op_c = Value::Inst(program.alloc_instruction(Opcode::GetRegister, smallvec![imm(2)]));

        let v6 = Value::Inst(bfe(&mut program, op_b, 0));
        let v7 = Value::Inst(bfe(&mut program, op_a, 16));
        let v8 = Value::Inst(program.alloc_instruction(Opcode::IMul32, smallvec![v6, v7]));
        let v10 = Value::Inst(bfe(&mut program, op_a, 0));
        let v11 =
            Value::Inst(program.alloc_instruction(Opcode::BitFieldInsert, smallvec![v8, v10, imm(16), imm(16)]));
        // A second, distinct BitFieldInsert with the same shape stands in for
        // `_11` on the `_26` side, so the `_26.Arg(0) == _11` identity check
        // must reject this even though the two nodes are structurally equal.
        let v11_b =
            Value::Inst(program.alloc_instruction(Opcode::BitFieldInsert, smallvec![v8, v10, imm(16), imm(16)]));

        let v15 = Value::Inst(bfe(&mut program, op_b, 0));
        let v16 = Value::Inst(bfe(&mut program, op_a, 0));
        let v17 = Value::Inst(program.alloc_instruction(Opcode::IMul32, smallvec![v15, v16]));
        let v18 = Value::Inst(program.alloc_instruction(Opcode::IAdd32, smallvec![v17, op_c]));

        let v22 = Value::Inst(bfe(&mut program, op_b, 16));
        let v23 = Value::Inst(bfe(&mut program, v11, 16));
        let v24 = Value::Inst(program.alloc_instruction(Opcode::IMul32, smallvec![v22, v23]));
        let v25 = Value::Inst(program.alloc_instruction(Opcode::ShiftLeftLogical32, smallvec![v24, imm(16)]));

        let v26 = Value::Inst(program.alloc_instruction(Opcode::ShiftLeftLogical32, smallvec![v11_b, imm(16)]));
        let v27 = Value::Inst(program.alloc_instruction(Opcode::IAdd32, smallvec![v26, v18]));

        assert!(match_xmad_multiply_add(&program, v25, v27).is_none());
    }
}
