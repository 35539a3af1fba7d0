//! The SSA intermediate representation (§3).
//!
//! Layout mirrors the teacher's `ir` module: entity references, the
//! arena(s) that own instruction/block storage, the value/instruction/block
//! data types, and the `Program`/`BlockCursor` pair that ties them together
//! for construction and mutation.

pub mod arena;
pub mod attribute;
pub mod block;
pub mod builder;
pub mod entities;
pub mod instruction;
pub mod opcode;
pub mod program;
pub mod value;

pub use arena::{BlockPool, InstPool};
pub use attribute::{Attribute, Component};
pub use block::BlockData;
pub use builder::{BlockCursor, CursorPosition};
pub use entities::{BlockRef, InstRef};
pub use instruction::{InstFlags, Instruction};
pub use opcode::{Arity, Opcode, OpcodeMeta, ScalarKind, TypeKind};
pub use program::{Program, Stage};
pub use value::{Immediate, Predicate, Register, Value, F16, F32, F64, U1, U16, U32, U64, U8};
