//! The SSA instruction node (C2).
//!
//! This module defines the instruction's data; the operations that mutate
//! it across the arena (`Arg`/`SetArg`/`ReplaceUsesWith`/`ReplaceOpcode`/
//! `Invalidate` from §4.3) live on [`InstPool`](super::arena::InstPool)
//! instead, mirroring the teacher's split between `ir::instructions`
//! (plain data) and `ir::dfg::DataFlowGraph` (the operations that need to
//! see more than one instruction at a time, e.g. to update a producer's
//! use-list when a consumer's argument changes).

use crate::ir::entities::{BlockRef, InstRef};
use crate::ir::opcode::Opcode;
use crate::ir::value::Value;
use smallvec::SmallVec;

/// Opcode-specific modifiers that do not change argument shape, e.g.
/// floating-point control flags (§3 `flags`).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InstFlags {
    /// Forbids contracting this instruction into an FMA-like fold; gates
    /// the `FPMul32`×`FPRecip32` perspective-divide identity (§4.5.2).
    pub no_contraction: bool,
}

/// One consumer of an instruction's result: which instruction, and at
/// which argument slot, references it. Forms the def-use edge that backs
/// `use_count` and lets `ReplaceUsesWith` find every consumer to rewrite.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Use {
    pub consumer: InstRef,
    pub slot: u8,
}

/// An SSA instruction node.
///
/// `use_count` (§3) is not stored as a separate counter field; it is the
/// length of the def-use list (`uses`), which is the information
/// `ReplaceUsesWith` actually needs to rewrite every consumer. Storing
/// both a counter and a use-list invites the two falling out of sync;
/// deriving the counter from the list makes (P1) true by construction.
#[derive(Clone, Debug)]
pub struct Instruction {
    opcode: Opcode,
    args: SmallVec<[Value; 4]>,
    pub(crate) uses: Vec<Use>,
    /// Pseudo-instructions reading this instruction's flag outputs
    /// (carry/overflow/zero/sparse/in-bounds); see §3 (I3).
    pseudo_ops: SmallVec<[InstRef; 2]>,
    /// Set on a pseudo-operation instruction, pointing back at its parent.
    pub(crate) pseudo_parent: Option<InstRef>,
    flags: InstFlags,
    pub(crate) block: Option<BlockRef>,
    pub(crate) prev: Option<InstRef>,
    pub(crate) next: Option<InstRef>,
}

impl Instruction {
    pub(crate) fn new(opcode: Opcode, args: SmallVec<[Value; 4]>) -> Self {
        Instruction {
            opcode,
            args,
            uses: Vec::new(),
            pseudo_ops: SmallVec::new(),
            pseudo_parent: None,
            flags: InstFlags::default(),
            block: None,
            prev: None,
            next: None,
        }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// `ReplaceOpcode(op)`'s field-level half; arity compatibility is
    /// checked by the caller (`Program::replace_opcode`), which has
    /// access to the opcode metadata table.
    pub(crate) fn set_opcode(&mut self, opcode: Opcode) {
        self.opcode = opcode;
    }

    /// `Arg(i)`: read the `i`-th argument.
    pub fn arg(&self, i: usize) -> Option<Value> {
        self.args.get(i).copied()
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub(crate) fn args_mut(&mut self) -> &mut SmallVec<[Value; 4]> {
        &mut self.args
    }

    /// Number of distinct consumer argument-slots reading this
    /// instruction's result (§3 `use_count`).
    pub fn use_count(&self) -> usize {
        self.uses.len()
    }

    /// `HasAssociatedPseudoOperation()` (§3 I3).
    pub fn has_associated_pseudo_operation(&self) -> bool {
        !self.pseudo_ops.is_empty()
    }

    pub fn pseudo_ops(&self) -> &[InstRef] {
        &self.pseudo_ops
    }

    pub(crate) fn pseudo_ops_mut(&mut self) -> &mut SmallVec<[InstRef; 2]> {
        &mut self.pseudo_ops
    }

    /// The parent instruction this pseudo-operation reads flags from, if
    /// this instruction is itself a pseudo-operation.
    pub fn pseudo_parent(&self) -> Option<InstRef> {
        self.pseudo_parent
    }

    pub fn flags(&self) -> InstFlags {
        self.flags
    }

    pub fn flags_mut(&mut self) -> &mut InstFlags {
        &mut self.flags
    }

    /// The block this instruction is currently linked into, if any
    /// (`None` after `Invalidate()`).
    pub fn block(&self) -> Option<BlockRef> {
        self.block
    }

    pub fn is_invalidated(&self) -> bool {
        self.block.is_none()
    }
}
