//! Entity references into the instruction and block arenas (C4).
//!
//! Grounded directly on the teacher's `ir::entities` module: each entity is
//! a `Copy` newtype wrapping a `u32` index, built with
//! `cranelift_entity::entity_impl!`. Nothing is ever removed from the
//! backing `PrimaryMap`s (§5: "every allocation bumps a monotonic counter;
//! no deallocation occurs until the arena is destroyed"), so a reference
//! never dangles for the lifetime of the arena that produced it.

use cranelift_entity::entity_impl;

/// A non-owning, stable reference to an [`Instruction`](super::instruction::Instruction)
/// in an [`InstPool`](super::arena::InstPool).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstRef(u32);
entity_impl!(InstRef, "inst");

/// A non-owning, stable reference to a [`BlockData`](super::block::BlockData)
/// in a [`BlockPool`](super::arena::BlockPool).
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockRef(u32);
entity_impl!(BlockRef, "block");
