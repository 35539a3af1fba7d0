//! Instruction predicates shared by the mid-end passes (C6/C7/C8).
//!
//! Grounded on the teacher's `inst_predicates.rs`: a handful of small,
//! independently testable boolean queries over one instruction, called from
//! dead code elimination and from the constant-propagation rewrites rather
//! than inlined at each call site. The teacher derives side-effect-ness from
//! several opcode-category checks (`is_call`, `can_trap`, `can_store`, ...)
//! because cranelift's opcode set spans calls, memory, and control flow;
//! this IR's opcode table instead carries a single `may_have_side_effects`
//! bit per row (§4.1), so the query here is a direct lookup rather than a
//! disjunction of category checks.

use crate::ir::instruction::Instruction;
use crate::ir::opcode::Opcode;

/// Whether `inst` may have a side effect that precludes deleting it even
/// when its result is unused (§4.6 deletion test, second conjunct).
pub fn has_side_effect(inst: &Instruction) -> bool {
    inst.opcode().meta().may_have_side_effects
}

/// Whether `inst`'s result is read by at least one surviving consumer,
/// i.e. `use_count() > 0` (§4.6 deletion test, first conjunct, negated).
pub fn result_is_used(inst: &Instruction) -> bool {
    inst.use_count() > 0
}

/// Whether `inst` is eligible for deletion by dead code elimination: no
/// live consumer reads its result, it carries no side effect, and it is not
/// still serving as the flag source for a pseudo-operation that itself
/// survives (§3 I3: a pseudo-op's parent cannot be deleted out from under
/// it while the pseudo-op is still live).
pub fn is_dead(inst: &Instruction) -> bool {
    !result_is_used(inst) && !has_side_effect(inst) && !inst.has_associated_pseudo_operation()
}

/// Whether `opcode` ever produces a result at all; void opcodes
/// (`Prologue`/`Epilogue`/`EmitVertex`/`EndPrimitive`/`Join`) are always
/// side-effecting by construction and never reach the dead code check via
/// `result_is_used`, but callers assembling diagnostics still want to
/// distinguish "no result to use" from "result unused".
pub fn produces_result(opcode: Opcode) -> bool {
    opcode.meta().result_kind.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::value::{Immediate, Value};
    use smallvec::smallvec;

    fn imm(v: u32) -> Value {
        Value::Immediate(Immediate::U32(v))
    }

    #[test]
    fn pure_unused_instruction_is_dead() {
        let inst = Instruction::new(Opcode::IAdd32, smallvec![imm(1), imm(2)]);
        assert!(is_dead(&inst));
    }

    #[test]
    fn side_effecting_instruction_is_never_dead() {
        let inst = Instruction::new(Opcode::EmitVertex, smallvec![imm(0)]);
        assert!(has_side_effect(&inst));
        assert!(!is_dead(&inst));
    }

    #[test]
    fn void_opcode_produces_no_result() {
        assert!(!produces_result(Opcode::Epilogue));
        assert!(produces_result(Opcode::IAdd32));
    }
}
