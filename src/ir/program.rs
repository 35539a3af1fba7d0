//! `Program`: the compile-unit-level owner of both arenas (C2/C3).
//!
//! The instruction-mutation operations from §4.3 (`SetArg`, `ReplaceUsesWith`,
//! `ReplaceOpcode`, `Invalidate`) live here rather than on `Instruction`
//! itself, because each one touches more than one arena slot at a time (for
//! example `SetArg` must update the old producer's use-list, the new
//! producer's use-list, *and* the consumer's argument slot). This mirrors
//! the teacher's split between `ir::instructions` (plain per-instruction
//! data) and `ir::dfg::DataFlowGraph` (the type that owns cross-instruction
//! bookkeeping, including `DataFlowGraph::change_to_alias` and
//! `replace_results_with_aliases`, which is the closest teacher analogue of
//! `ReplaceUsesWith`).

use crate::error::CoreError;
use crate::ir::arena::{BlockPool, InstPool};
use crate::ir::block::BlockData;
use crate::ir::entities::{BlockRef, InstRef};
use crate::ir::instruction::{Instruction, Use};
use crate::ir::opcode::{Arity, Opcode};
use crate::ir::value::Value;
use cranelift_entity::SecondaryMap;
use smallvec::SmallVec;

/// Which shader stage this program was decoded for (§2, C10). The pass
/// driver (C9) and the dual-vertex passes (C8) key off this to decide which
/// passes apply; the front end populates it before handing a `Program` to
/// this core (§6).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    VertexA,
    VertexB,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
    Compute,
}

impl Stage {
    /// Whether dual-vertex stitching (C8) applies to this stage (§4.7: only
    /// the two vertex-shader halves of a combined vertex program).
    pub fn is_dual_vertex(self) -> bool {
        matches!(self, Stage::VertexA | Stage::VertexB)
    }
}

/// A compile unit: every instruction and block allocated for one shader,
/// plus the block order the front end established and the post-order this
/// core computes for its own traversals (C3).
pub struct Program {
    insts: InstPool,
    blocks: BlockPool,
    /// Root of the reconstructed AST, set once by the front end (§6) before
    /// any pass runs.
    ast_root: Option<BlockRef>,
    /// Pre-order block listing as handed down by the front end; used for
    /// structural iteration (printing, validation) where traversal order
    /// doesn't matter.
    block_order: Vec<BlockRef>,
    /// True post-order block listing (children visited before their
    /// parent), computed on demand by [`Program::compute_post_order`].
    /// Dead code elimination (C7) consumes this directly; constant
    /// propagation (C6) wants the reverse (definitions before uses) and
    /// reverses it at its own call site.
    post_order_blocks: Vec<BlockRef>,
    stage: Stage,
}

impl Program {
    /// An empty program for the given stage, with no blocks yet.
    pub fn new(stage: Stage) -> Self {
        Program {
            insts: InstPool::new(),
            blocks: BlockPool::new(),
            ast_root: None,
            block_order: Vec::new(),
            post_order_blocks: Vec::new(),
            stage,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn insts(&self) -> &InstPool {
        &self.insts
    }

    pub fn blocks(&self) -> &BlockPool {
        &self.blocks
    }

    /// Allocate a fresh, unlinked block and register it in the pre-order
    /// listing. Linking it into the AST (`push_ast_child` on its parent) is
    /// the caller's responsibility, matching the front end's incremental
    /// construction order (§6).
    pub fn new_block(&mut self) -> BlockRef {
        let block = self.blocks.alloc();
        self.block_order.push(block);
        block
    }

    pub fn set_ast_root(&mut self, root: BlockRef) {
        self.ast_root = Some(root);
    }

    pub fn ast_root(&self) -> Option<BlockRef> {
        self.ast_root
    }

    pub fn block_order(&self) -> &[BlockRef] {
        &self.block_order
    }

    /// The reverse-post-order block listing last computed by
    /// [`Program::compute_post_order`]. Empty until that is called at least
    /// once (the pass driver, C9, does this before running any pass).
    pub fn post_order_blocks(&self) -> &[BlockRef] {
        &self.post_order_blocks
    }

    /// Allocate a new, unlinked instruction and register its argument uses
    /// with their producers. The instruction is not yet part of any block;
    /// callers place it with [`Program::append_inst`] or
    /// [`Program::insert_inst_before`] (used by the builder, C5).
    pub fn alloc_instruction(&mut self, opcode: Opcode, args: SmallVec<[Value; 4]>) -> InstRef {
        let inst_ref = self.insts.alloc(Instruction::new(opcode, args));
        let arg_list: SmallVec<[Value; 4]> = SmallVec::from_slice(self.insts[inst_ref].args());
        for (slot, value) in arg_list.iter().enumerate() {
            if let Value::Inst(producer) = value {
                self.insts[*producer].uses.push(Use {
                    consumer: inst_ref,
                    slot: slot as u8,
                });
            }
        }
        inst_ref
    }

    /// `Arg(i)` (§4.3).
    pub fn arg(&self, inst: InstRef, i: usize) -> Option<Value> {
        self.insts[inst].arg(i)
    }

    /// Sets `inst`'s flags (§3 `flags`), e.g. the front end marking a
    /// multiply `no_contraction` to veto the perspective-divide fold
    /// (§4.5.2).
    pub fn set_flags(&mut self, inst: InstRef, flags: crate::ir::instruction::InstFlags) {
        *self.insts[inst].flags_mut() = flags;
    }

    fn register_use(&mut self, producer: InstRef, consumer: InstRef, slot: u8) {
        self.insts[producer].uses.push(Use { consumer, slot });
    }

    fn unregister_use(&mut self, producer: InstRef, consumer: InstRef, slot: u8) {
        let uses = &mut self.insts[producer].uses;
        if let Some(pos) = uses.iter().position(|u| u.consumer == consumer && u.slot == slot) {
            uses.swap_remove(pos);
        }
    }

    /// `SetArg(i, v)` (§4.3): rewrites one argument slot, maintaining the
    /// def-use lists of both the old and new producers so `use_count` (P1)
    /// stays accurate without a separate bookkeeping pass.
    pub fn set_arg(&mut self, inst: InstRef, i: usize, new_value: Value) -> Result<(), CoreError> {
        let old_value = self.insts[inst].arg(i).ok_or_else(|| {
            CoreError::invalid_argument("Program::set_arg", format!("argument slot {i} out of range"))
        })?;
        if let Value::Inst(old_producer) = old_value {
            self.unregister_use(old_producer, inst, i as u8);
        }
        self.insts[inst].args_mut()[i] = new_value;
        if let Value::Inst(new_producer) = new_value {
            self.register_use(new_producer, inst, i as u8);
        }
        Ok(())
    }

    /// `ReplaceUsesWith(v)` (§4.3): every instruction currently reading this
    /// instruction's result is rewritten to read `v` instead, and any
    /// pseudo-operations reading this instruction's flag outputs are
    /// re-homed onto `v`'s producer. Fails if `v` cannot supply those flag
    /// outputs (e.g. it is an immediate, not an arithmetic instruction).
    ///
    /// Does not invalidate `inst` itself; the now-unused instruction is left
    /// for dead code elimination (C7) to sweep, matching how constant
    /// propagation (C6) uses this operation.
    pub fn replace_uses_with(&mut self, inst: InstRef, new_value: Value) -> Result<(), CoreError> {
        let pseudo_ops: SmallVec<[InstRef; 2]> = SmallVec::from_slice(self.insts[inst].pseudo_ops());
        if !pseudo_ops.is_empty() {
            match new_value {
                Value::Inst(new_producer) => {
                    for pseudo in &pseudo_ops {
                        self.insts[*pseudo].pseudo_parent = Some(new_producer);
                        self.insts[new_producer].pseudo_ops_mut().push(*pseudo);
                    }
                    self.insts[inst].pseudo_ops_mut().clear();
                }
                _ => {
                    return Err(CoreError::logic_error(
                        "Program::replace_uses_with",
                        format!(
                            "{new_value:?} cannot supply the pseudo-operation outputs associated with {inst:?}"
                        ),
                    ));
                }
            }
        }

        let uses = std::mem::take(&mut self.insts[inst].uses);
        for use_ in uses {
            self.set_arg(use_.consumer, use_.slot as usize, new_value)?;
        }
        Ok(())
    }

    /// `ReplaceOpcode(op)` (§4.3): swaps this instruction's opcode in place,
    /// keeping its arguments and identity (and therefore every existing use
    /// edge) intact. Fails if the new opcode's fixed arity does not match
    /// the instruction's current argument count — the XMAD-chain folds
    /// (§4.5.6) rely on this check to catch a malformed rewrite rather than
    /// silently truncating or leaving stale trailing arguments.
    pub fn replace_opcode(&mut self, inst: InstRef, new_opcode: Opcode) -> Result<(), CoreError> {
        let current_arity = self.insts[inst].args().len();
        if let Arity::Fixed(expected) = new_opcode.meta().arity {
            if expected != current_arity {
                return Err(CoreError::logic_error(
                    "Program::replace_opcode",
                    format!(
                        "{new_opcode:?} expects {expected} argument(s), {inst:?} has {current_arity}"
                    ),
                ));
            }
        }
        self.insts[inst].set_opcode(new_opcode);
        Ok(())
    }

    /// `Invalidate()` (§4.3): detaches the instruction from its block and
    /// drops its argument references (unregistering this instruction as a
    /// consumer from each producer's use-list), and detaches it from its
    /// pseudo-operation parent if it is one. Left in the arena per §5 —
    /// never deallocated, only marked invalid by clearing `block`.
    pub fn invalidate(&mut self, inst: InstRef) -> Result<(), CoreError> {
        let args: SmallVec<[Value; 4]> = SmallVec::from_slice(self.insts[inst].args());
        for (slot, value) in args.iter().enumerate() {
            if let Value::Inst(producer) = value {
                self.unregister_use(*producer, inst, slot as u8);
            }
        }
        self.insts[inst].args_mut().clear();

        if let Some(parent) = self.insts[inst].pseudo_parent() {
            self.insts[parent].pseudo_ops_mut().retain(|p| *p != inst);
            self.insts[inst].pseudo_parent = None;
        }

        self.unlink_from_block(inst);
        Ok(())
    }

    /// Associate `pseudo` (already allocated via `alloc_instruction` with
    /// one of the `GetCarryFromOp`/`GetOverflowFromOp`/`GetZeroFromOp`/
    /// `GetSparseFromOp`/`GetInBoundsFromOp` opcodes) with `parent` as the
    /// instruction whose flag outputs it reads (§3 I3). Used by the builder
    /// (C5) right after emitting both instructions.
    pub fn attach_pseudo_op(&mut self, parent: InstRef, pseudo: InstRef) {
        self.insts[parent].pseudo_ops_mut().push(pseudo);
        self.insts[pseudo].pseudo_parent = Some(parent);
    }

    /// Append `inst` at the tail of `block`'s instruction list. Used by the
    /// builder (C5) when emitting in program order.
    pub(crate) fn append_inst(&mut self, block: BlockRef, inst: InstRef) {
        let last = self.blocks[block].last();
        self.insts[inst].block = Some(block);
        self.insts[inst].prev = last;
        self.insts[inst].next = None;
        match last {
            Some(l) => self.insts[l].next = Some(inst),
            None => self.blocks[block].set_first(Some(inst)),
        }
        self.blocks[block].set_last(Some(inst));
    }

    /// Splice `inst` into its eventual block immediately before `before`.
    /// Used by the builder's cursor (C5) for insert-before positioning.
    pub(crate) fn insert_inst_before(&mut self, before: InstRef, inst: InstRef) {
        let block = self.insts[before]
            .block()
            .expect("insert_inst_before: `before` must already be linked into a block");
        let prev = self.insts[before].prev;
        self.insts[inst].block = Some(block);
        self.insts[inst].prev = prev;
        self.insts[inst].next = Some(before);
        match prev {
            Some(p) => self.insts[p].next = Some(inst),
            None => self.blocks[block].set_first(Some(inst)),
        }
        self.insts[before].prev = Some(inst);
    }

    fn unlink_from_block(&mut self, inst: InstRef) {
        let block = match self.insts[inst].block() {
            Some(b) => b,
            None => return,
        };
        let prev = self.insts[inst].prev;
        let next = self.insts[inst].next;
        match prev {
            Some(p) => self.insts[p].next = next,
            None => self.blocks[block].set_first(next),
        }
        match next {
            Some(n) => self.insts[n].prev = prev,
            None => self.blocks[block].set_last(prev),
        }
        self.insts[inst].block = None;
        self.insts[inst].prev = None;
        self.insts[inst].next = None;
    }

    /// Forward iterator over `block`'s live instructions, in program order.
    pub fn block_insts(&self, block: BlockRef) -> BlockInstIter<'_> {
        BlockInstIter {
            insts: &self.insts,
            next: self.blocks[block].first(),
        }
    }

    /// Reverse iterator over `block`'s live instructions, program-order
    /// last to first. Dead code elimination (C7) walks each block this way
    /// so that a pseudo-operation (which always comes after its parent) is
    /// considered for deletion before the parent it might still be keeping
    /// alive.
    pub fn block_insts_rev(&self, block: BlockRef) -> BlockInstRevIter<'_> {
        BlockInstRevIter {
            insts: &self.insts,
            next: self.blocks[block].last(),
        }
    }

    /// Recomputes [`Program::post_order_blocks`] as a true post-order DFS
    /// from the AST root (C3, §4.9), walking `BlockData::ast_children`:
    /// every child appears before its parent. Callers that want the reverse
    /// (parent before children, i.e. definitions before uses for a forward
    /// sweep) reverse the returned slice themselves.
    ///
    /// Grounded on the teacher's `dominator_tree.rs::compute_postorder`: an
    /// explicit work-stack of `(block, next unvisited child index)` pairs
    /// rather than function recursion, so arbitrarily deep shader control
    /// flow cannot overflow the call stack. Unlike the teacher, which walks
    /// CFG successor edges, this walks the already-reconstructed AST parent/
    /// child edges (§6: control-flow reconstruction is an external,
    /// upstream step for this core).
    pub fn compute_post_order(&mut self) {
        self.post_order_blocks.clear();
        let root = match self.ast_root {
            Some(r) => r,
            None => return,
        };

        let mut visited: SecondaryMap<BlockRef, bool> = SecondaryMap::new();
        let mut stack: Vec<(BlockRef, usize)> = Vec::new();
        visited[root] = true;
        stack.push((root, 0));

        let mut post_order = Vec::new();
        while let Some((block, child_idx)) = stack.pop() {
            let children = self.blocks[block].ast_children();
            if let Some(&child) = children.get(child_idx) {
                stack.push((block, child_idx + 1));
                if !visited[child] {
                    visited[child] = true;
                    stack.push((child, 0));
                }
            } else {
                post_order.push(block);
            }
        }

        // `post_order` is already children-before-parent visit order; store
        // it as-is (true post-order).
        self.post_order_blocks = post_order;
    }
}

/// Forward iterator produced by [`Program::block_insts`].
pub struct BlockInstIter<'a> {
    insts: &'a InstPool,
    next: Option<InstRef>,
}

impl<'a> Iterator for BlockInstIter<'a> {
    type Item = InstRef;
    fn next(&mut self) -> Option<InstRef> {
        let current = self.next?;
        self.next = self.insts[current].next;
        Some(current)
    }
}

/// Reverse iterator produced by [`Program::block_insts_rev`].
pub struct BlockInstRevIter<'a> {
    insts: &'a InstPool,
    next: Option<InstRef>,
}

impl<'a> Iterator for BlockInstRevIter<'a> {
    type Item = InstRef;
    fn next(&mut self) -> Option<InstRef> {
        let current = self.next?;
        self.next = self.insts[current].prev;
        Some(current)
    }
}
