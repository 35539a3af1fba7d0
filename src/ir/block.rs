//! `Block`: an intrusive doubly-linked list of instructions (C2/C3).
//!
//! Instruction linkage (`prev`/`next`) lives on [`Instruction`](super::instruction::Instruction)
//! itself rather than in a side `Layout` table (contrast the teacher's
//! `ir::layout::Layout`, which keeps block/instruction order separate from
//! `DataFlowGraph`): §3 describes the block itself as "an intrusive
//! doubly-linked list of instructions", so this crate keeps the links on
//! the node, matching that description directly.

use crate::ir::entities::{BlockRef, InstRef};
use smallvec::SmallVec;

/// A basic block: a run of instructions plus the successor/predecessor
/// metadata the traversal in [`crate::ir::program`] needs.
#[derive(Clone, Debug, Default)]
pub struct BlockData {
    first: Option<InstRef>,
    last: Option<InstRef>,
    /// Children in the reconstructed AST, used by the post-order DFS
    /// (§4.9). Populated by the front end (§6); this core never mutates
    /// CFG topology itself.
    pub(crate) ast_children: SmallVec<[BlockRef; 2]>,
}

impl BlockData {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Sentinel begin iterator: the first instruction, or `None` if empty.
    pub fn first(&self) -> Option<InstRef> {
        self.first
    }

    /// Sentinel end iterator: the last instruction, or `None` if empty.
    pub fn last(&self) -> Option<InstRef> {
        self.last
    }

    pub fn is_empty(&self) -> bool {
        self.first.is_none()
    }

    pub(crate) fn set_first(&mut self, inst: Option<InstRef>) {
        self.first = inst;
    }

    pub(crate) fn set_last(&mut self, inst: Option<InstRef>) {
        self.last = inst;
    }

    pub fn ast_children(&self) -> &[BlockRef] {
        &self.ast_children
    }

    pub fn push_ast_child(&mut self, child: BlockRef) {
        self.ast_children.push(child);
    }
}
