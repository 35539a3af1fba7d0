//! Bulk-owned, append-only storage for instructions and blocks (C4).
//!
//! Grounded directly on the teacher's `cranelift-entity` crate: arenas are
//! `PrimaryMap`s keyed by the entity references from
//! [`crate::ir::entities`]. Nothing is ever removed from a `PrimaryMap`
//! (dead instructions are unlinked from their block and marked invalid,
//! never deallocated — see [`crate::ir::instruction::Instruction::is_invalidated`]),
//! so every `InstRef`/`BlockRef` handed out stays valid for the arena's
//! lifetime, matching §5's "stable addresses ... no deallocation until the
//! arena is destroyed".

use crate::ir::block::BlockData;
use crate::ir::entities::{BlockRef, InstRef};
use crate::ir::instruction::Instruction;
use cranelift_entity::PrimaryMap;
use std::ops::{Index, IndexMut};

/// The arena that owns every instruction allocated for one compile.
#[derive(Default)]
pub struct InstPool {
    insts: PrimaryMap<InstRef, Instruction>,
}

impl InstPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc(&mut self, inst: Instruction) -> InstRef {
        self.insts.push(inst)
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// Iterate every instruction ever allocated, live or invalidated.
    pub fn iter(&self) -> impl Iterator<Item = (InstRef, &Instruction)> {
        self.insts.iter()
    }
}

impl Index<InstRef> for InstPool {
    type Output = Instruction;
    fn index(&self, index: InstRef) -> &Instruction {
        &self.insts[index]
    }
}

impl IndexMut<InstRef> for InstPool {
    fn index_mut(&mut self, index: InstRef) -> &mut Instruction {
        &mut self.insts[index]
    }
}

/// The arena that owns every block allocated for one compile.
#[derive(Default)]
pub struct BlockPool {
    blocks: PrimaryMap<BlockRef, BlockData>,
}

impl BlockPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn alloc(&mut self) -> BlockRef {
        self.blocks.push(BlockData::new())
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

impl Index<BlockRef> for BlockPool {
    type Output = BlockData;
    fn index(&self, index: BlockRef) -> &BlockData {
        &self.blocks[index]
    }
}

impl IndexMut<BlockRef> for BlockPool {
    fn index_mut(&mut self, index: BlockRef) -> &mut BlockData {
        &mut self.blocks[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::opcode::Opcode;
    use smallvec::smallvec;

    #[test]
    fn allocation_hands_out_stable_distinct_refs() {
        let mut pool = InstPool::new();
        let a = pool.alloc(Instruction::new(Opcode::Join, smallvec![]));
        let b = pool.alloc(Instruction::new(Opcode::Join, smallvec![]));
        assert_ne!(a, b);
        assert_eq!(pool[a].opcode(), Opcode::Join);
        assert_eq!(pool.len(), 2);
    }
}
