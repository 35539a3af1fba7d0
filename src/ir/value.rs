//! `Value`: the tagged union carried in instruction argument slots (C1).

use crate::error::CoreError;
use crate::ir::arena::InstPool;
use crate::ir::attribute::Attribute;
use crate::ir::entities::InstRef;
use crate::ir::opcode::{Opcode, ScalarKind};
use core::fmt;

#[cfg(feature = "enable-serde")]
use serde_derive::{Deserialize, Serialize};

/// A fixed machine register name, including the always-zero `RZ`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Register {
    /// The hardwired zero register.
    Rz,
    /// A general-purpose register by index.
    Named(u8),
}

/// A fixed predicate register name, including the always-true `PT`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Predicate {
    /// The hardwired true predicate.
    Pt,
    /// A named predicate register by index.
    Named(u8),
}

/// An immediate of one of the scalar kinds listed in §3.
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Immediate {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    /// IEEE-754 binary16, stored as its bit pattern (no native `f16` in
    /// stable Rust).
    F16(u16),
    F32(f32),
    F64(f64),
}

impl Immediate {
    /// The scalar kind of this immediate.
    pub fn kind(self) -> ScalarKind {
        match self {
            Immediate::Bool(_) => ScalarKind::Bool,
            Immediate::U8(_) => ScalarKind::U8,
            Immediate::U16(_) => ScalarKind::U16,
            Immediate::U32(_) => ScalarKind::U32,
            Immediate::U64(_) => ScalarKind::U64,
            Immediate::F16(_) => ScalarKind::F16,
            Immediate::F32(_) => ScalarKind::F32,
            Immediate::F64(_) => ScalarKind::F64,
        }
    }
}

impl PartialEq for Immediate {
    fn eq(&self, other: &Self) -> bool {
        use Immediate::*;
        match (*self, *other) {
            (Bool(a), Bool(b)) => a == b,
            (U8(a), U8(b)) => a == b,
            (U16(a), U16(b)) => a == b,
            (U32(a), U32(b)) => a == b,
            (U64(a), U64(b)) => a == b,
            (F16(a), F16(b)) => a == b,
            // Compare by bit pattern: "equality on values compares by
            // tag+payload" (§3), which for floats means the literal bits,
            // including NaN payloads, not IEEE `==`.
            (F32(a), F32(b)) => a.to_bits() == b.to_bits(),
            (F64(a), F64(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}
impl Eq for Immediate {}

impl fmt::Display for Immediate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Immediate::Bool(v) => write!(f, "{v}"),
            Immediate::U8(v) => write!(f, "{v}u8"),
            Immediate::U16(v) => write!(f, "{v}u16"),
            Immediate::U32(v) => write!(f, "{v}u32"),
            Immediate::U64(v) => write!(f, "{v}u64"),
            Immediate::F16(bits) => write!(f, "0x{bits:04x}f16"),
            Immediate::F32(v) => write!(f, "{v}f32"),
            Immediate::F64(v) => write!(f, "{v}f64"),
        }
    }
}

/// The tagged union carried in every instruction argument slot (§3).
///
/// Equality on immediate-like variants compares tag+payload; on the
/// `Inst` variant it compares identity (i.e. the referenced instruction
/// index), since two distinct instructions are never the same SSA
/// definition even if they happen to compute the same thing.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Value {
    Immediate(Immediate),
    Register(Register),
    Predicate(Predicate),
    Attribute(Attribute),
    /// A weak, non-owning reference to the producing instruction. Never an
    /// ownership edge (see §3 Ownership).
    Inst(InstRef),
}

impl Value {
    /// `IsImmediate()`: true for every variant except `Inst`.
    pub fn is_immediate(self) -> bool {
        !matches!(self, Value::Inst(_))
    }

    /// Build an immediate `Value` directly.
    pub fn immediate(imm: Immediate) -> Self {
        Value::Immediate(imm)
    }

    /// If this value is an immediate, return it.
    pub fn as_immediate(self) -> Option<Immediate> {
        match self {
            Value::Immediate(imm) => Some(imm),
            _ => None,
        }
    }

    /// `Resolve()`: returns the underlying immediate when this references
    /// an [`Opcode::Identity`] (single-argument pass-through) instruction,
    /// recursively unwrapping chains of identities; otherwise returns
    /// `self` unchanged. Pattern matching throughout constant propagation
    /// calls this before comparing captured operands (§9: "pattern
    /// equality is modulo trivial identity forwarding").
    pub fn resolve(self, pool: &InstPool) -> Value {
        let mut current = self;
        loop {
            match current {
                Value::Inst(inst_ref) => {
                    let inst = &pool[inst_ref];
                    if inst.opcode() == Opcode::Identity {
                        current = inst.arg(0).expect("Identity has exactly one argument");
                    } else {
                        return current;
                    }
                }
                _ => return current,
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Immediate(imm) => write!(f, "{imm}"),
            Value::Register(Register::Rz) => write!(f, "RZ"),
            Value::Register(Register::Named(n)) => write!(f, "R{n}"),
            Value::Predicate(Predicate::Pt) => write!(f, "PT"),
            Value::Predicate(Predicate::Named(n)) => write!(f, "P{n}"),
            Value::Attribute(attr) => write!(f, "{attr}"),
            Value::Inst(inst_ref) => write!(f, "%{inst_ref}"),
        }
    }
}

macro_rules! typed_wrapper {
    ($name:ident, $kind:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Copy, Clone, Debug, PartialEq, Eq)]
        pub struct $name(Value);

        impl $name {
            /// Wrap a `Value`, validating its scalar kind.
            ///
            /// # Errors
            /// Returns [`CoreError::InvalidArgument`] if `value` is an
            /// immediate of the wrong scalar kind. Non-immediate values
            /// (instruction references, registers, etc.) are accepted
            /// without a kind check, since their kind is determined by
            /// their producer's declared result kind.
            pub fn new(value: Value) -> Result<Self, CoreError> {
                if let Value::Immediate(imm) = value {
                    if imm.kind() != $kind {
                        return Err(CoreError::invalid_argument(
                            concat!(stringify!($name), "::new"),
                            format!("expected {:?} immediate, got {:?}", $kind, imm.kind()),
                        ));
                    }
                }
                Ok(Self(value))
            }

            /// The wrapped `Value`.
            pub fn value(self) -> Value {
                self.0
            }

            /// Read the immediate payload.
            ///
            /// # Errors
            /// Returns [`CoreError::InvalidArgument`] if this wrapper does
            /// not hold an immediate.
            pub fn as_immediate(self) -> Result<Immediate, CoreError> {
                self.0.as_immediate().ok_or_else(|| {
                    CoreError::invalid_argument(
                        concat!(stringify!($name), "::as_immediate"),
                        format!("{:?} is not an immediate", self.0),
                    )
                })
            }
        }
    };
}

typed_wrapper!(U1, ScalarKind::Bool, "A `Value` statically known to be `bool`-typed.");
typed_wrapper!(U8, ScalarKind::U8, "A `Value` statically known to be `u8`-typed.");
typed_wrapper!(U16, ScalarKind::U16, "A `Value` statically known to be `u16`-typed.");
typed_wrapper!(U32, ScalarKind::U32, "A `Value` statically known to be `u32`-typed.");
typed_wrapper!(U64, ScalarKind::U64, "A `Value` statically known to be `u64`-typed.");
typed_wrapper!(F16, ScalarKind::F16, "A `Value` statically known to be `f16`-typed.");
typed_wrapper!(F32, ScalarKind::F32, "A `Value` statically known to be `f32`-typed.");
typed_wrapper!(F64, ScalarKind::F64, "A `Value` statically known to be `f64`-typed.");
