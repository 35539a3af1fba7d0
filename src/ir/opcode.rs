//! Opcode metadata table (C1).
//!
//! A single declarative listing is the source of truth for every opcode's
//! printable name, argument/result type kinds, and side-effect bit; every
//! other component (the builder in [`crate::ir::builder`], DCE in
//! [`crate::opt::dead_code_elimination`]) reads from [`Opcode::meta`]
//! rather than re-deriving this information.
//!
//! The teacher (`cranelift-codegen`) generates an analogous table from a
//! `build.rs` + `cranelift-codegen-meta` out-of-tree code generator across
//! several hundred opcodes spanning multiple target ISAs. At the scale of
//! this shader IR (on the order of 80 opcodes, one target), that machinery
//! is disproportionate; the declarative listing here is instead a single
//! `macro_rules!` invocation, per the design note in the spec that favors
//! "a tiny DSL or macro" for pattern/table generation.

use core::fmt;

#[cfg(feature = "enable-serde")]
use serde_derive::{Deserialize, Serialize};

/// The scalar kind of an immediate, argument, or result.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum ScalarKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    F16,
    F32,
    F64,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ScalarKind::Bool => "bool",
            ScalarKind::U8 => "u8",
            ScalarKind::U16 => "u16",
            ScalarKind::U32 => "u32",
            ScalarKind::U64 => "u64",
            ScalarKind::F16 => "f16",
            ScalarKind::F32 => "f32",
            ScalarKind::F64 => "f64",
        };
        f.write_str(s)
    }
}

/// The type kind of an opcode argument slot or its result, for validation
/// and for the emitter's formatter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Scalar(ScalarKind),
    /// A boolean predicate-typed value (`PT`/named predicates).
    Predicate,
    /// A register-typed value (`RZ`/named registers).
    Register,
    /// A GPU-visible attribute tag.
    Attribute,
    /// A vector composite of scalars; arity is opcode-specific and is not
    /// re-encoded in this table (it is carried on the instruction itself).
    Composite,
    /// The opcode produces no result (control-flow, stores, barriers).
    Void,
}

/// The number of argument slots an opcode takes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// `CompositeConstruct`-style opcodes: 2, 3, or 4 arguments.
    Variadic,
}

/// Static per-opcode metadata: name, arity, argument type kinds, result
/// type kind, and whether the opcode may have side effects (used by DCE).
pub struct OpcodeMeta {
    pub name: &'static str,
    pub arity: Arity,
    pub arg_kinds: &'static [TypeKind],
    pub result_kind: Option<TypeKind>,
    pub may_have_side_effects: bool,
    pub commutative: bool,
}

macro_rules! type_kind {
    (bool) => {
        TypeKind::Scalar(ScalarKind::Bool)
    };
    (u8) => {
        TypeKind::Scalar(ScalarKind::U8)
    };
    (u16) => {
        TypeKind::Scalar(ScalarKind::U16)
    };
    (u32) => {
        TypeKind::Scalar(ScalarKind::U32)
    };
    (u64) => {
        TypeKind::Scalar(ScalarKind::U64)
    };
    (f16) => {
        TypeKind::Scalar(ScalarKind::F16)
    };
    (f32) => {
        TypeKind::Scalar(ScalarKind::F32)
    };
    (f64) => {
        TypeKind::Scalar(ScalarKind::F64)
    };
    (pred) => {
        TypeKind::Predicate
    };
    (reg) => {
        TypeKind::Register
    };
    (attr) => {
        TypeKind::Attribute
    };
    (composite) => {
        TypeKind::Composite
    };
    (void) => {
        TypeKind::Void
    };
}

macro_rules! result_kind {
    (void) => {
        None
    };
    ($kind:tt) => {
        Some(type_kind!($kind))
    };
}

/// The declarative opcode listing: one row per opcode.
///
/// Columns: name, arity (`[kinds...]` or `variadic`), result kind (or
/// `void`), `side_effects` flag, `commutative` flag.
macro_rules! define_opcodes {
    (
        $( $name:ident ( $($arg:tt),* $(,)? ) -> $result:tt
            $(, side_effects: $side_effects:literal)?
            $(, commutative: $commutative:literal)?
        ;)+
    ) => {
        /// The opcode enumeration. See module docs for the metadata table.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
        #[allow(non_camel_case_types)]
        pub enum Opcode {
            $( $name, )+
        }

        impl Opcode {
            /// All opcodes, in declaration order.
            pub const ALL: &'static [Opcode] = &[ $( Opcode::$name ),+ ];

            /// Look up this opcode's static metadata row.
            pub fn meta(self) -> &'static OpcodeMeta {
                static TABLE: &[OpcodeMeta] = &[
                    $(
                        OpcodeMeta {
                            name: stringify!($name),
                            arity: define_opcodes!(@arity $($arg),*),
                            arg_kinds: define_opcodes!(@kinds $($arg),*),
                            result_kind: result_kind!($result),
                            may_have_side_effects: define_opcodes!(@bool_default false $($side_effects)?),
                            commutative: define_opcodes!(@bool_default false $($commutative)?),
                        },
                    )+
                ];
                &TABLE[self as usize]
            }

            /// Printable opcode name, e.g. `"IAdd32"`.
            pub fn name(self) -> &'static str {
                self.meta().name
            }
        }

        impl fmt::Display for Opcode {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };

    (@arity variadic) => { Arity::Variadic };
    (@arity $($arg:tt),*) => { Arity::Fixed(define_opcodes!(@count $($arg),*)) };
    (@count) => { 0 };
    (@count $head:tt $(, $rest:tt)*) => { 1 + define_opcodes!(@count $($rest),*) };

    (@kinds variadic) => { &[] };
    (@kinds $($arg:tt),*) => { &[ $( type_kind!($arg) ),* ] };

    (@bool_default $default:literal) => { $default };
    (@bool_default $default:literal $value:literal) => { $value };
}

define_opcodes! {
    // --- register / predicate reads (§4.5.8) ---
    GetRegister(reg) -> u32;
    GetPred(pred) -> bool;

    // --- constant buffer reads ---
    GetCbufU32(u32, u32) -> u32, side_effects: true;
    GetCbufF32(u32, u32) -> f32, side_effects: true;

    // --- integer arithmetic ---
    IAdd32(u32, u32) -> u32, commutative: true;
    IAdd64(u64, u64) -> u64, commutative: true;
    ISub32(u32, u32) -> u32;
    IMul32(u32, u32) -> u32, commutative: true;
    IAnd32(u32, u32) -> u32, commutative: true;
    IOr32(u32, u32) -> u32, commutative: true;
    IXor32(u32, u32) -> u32, commutative: true;
    ShiftLeftLogical32(u32, u32) -> u32;
    BitFieldUExtract(u32, u32, u32) -> u32;
    BitFieldSExtract(u32, u32, u32) -> u32;
    BitFieldInsert(u32, u32, u32, u32) -> u32;

    // --- floating point ---
    FPMul32(f32, f32) -> f32, commutative: true;
    FPRecip32(f32) -> f32;
    FPAdd32(f32, f32) -> f32, commutative: true;

    // --- logical ---
    LogicalAnd(bool, bool) -> bool, commutative: true;
    LogicalOr(bool, bool) -> bool, commutative: true;
    LogicalNot(bool) -> bool;
    Select(bool, u32, u32) -> u32;

    // --- bit casts ---
    BitCastF32U32(u32) -> f32;
    BitCastU32F32(f32) -> u32;

    // --- pack / unpack inverse pairs (§4.5.4) ---
    PackHalf2x16(composite) -> u32;
    UnpackHalf2x16(u32) -> composite;
    PackFloat2x16(composite) -> u32;
    UnpackFloat2x16(u32) -> composite;

    // --- composite extract/insert/construct (§4.5.5) ---
    CompositeConstruct(variadic) -> composite;
    CompositeExtract(composite, u32) -> u32;
    CompositeInsert(composite, u32, u32) -> composite;

    // --- attributes & derivatives ---
    GetAttribute(attr) -> f32, side_effects: true;
    FSwizzleAdd(f32, f32, u32) -> f32;
    ShuffleButterfly(f32, u32, u32, u32) -> f32, side_effects: true;
    DPdxFine(f32) -> f32;
    DPdyFine(f32) -> f32;

    // --- identity / pass-through, used by Resolve() (§3) ---
    Identity(u32) -> u32;

    // --- pseudo-operations reading a parent's flag outputs (§3 I3) ---
    GetCarryFromOp(u32) -> bool;
    GetOverflowFromOp(u32) -> bool;
    GetZeroFromOp(u32) -> bool;
    GetSparseFromOp(u32) -> bool;
    GetInBoundsFromOp(u32) -> bool;

    // --- stage boundary / special-emit-contract opcodes (§6) ---
    Prologue() -> void, side_effects: true;
    Epilogue() -> void, side_effects: true;
    EmitVertex(u32) -> void, side_effects: true;
    EndPrimitive(u32) -> void, side_effects: true;

    // --- structured-control-flow leftovers that must not reach this core (§7) ---
    Join() -> void, side_effects: true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_is_internally_consistent() {
        for &op in Opcode::ALL {
            let meta = op.meta();
            if let Arity::Fixed(n) = meta.arity {
                assert_eq!(meta.arg_kinds.len(), n, "{op:?} arity/arg_kinds mismatch");
            }
        }
    }

    #[test]
    fn side_effect_flags_match_spec_examples() {
        assert!(Opcode::Prologue.meta().may_have_side_effects);
        assert!(Opcode::Epilogue.meta().may_have_side_effects);
        assert!(!Opcode::IAdd32.meta().may_have_side_effects);
        assert!(!Opcode::IMul32.meta().may_have_side_effects);
    }

    #[test]
    fn commutative_flags_match_spec_list() {
        for op in [
            Opcode::IAdd32,
            Opcode::IMul32,
            Opcode::IAnd32,
            Opcode::IOr32,
            Opcode::IXor32,
            Opcode::LogicalAnd,
            Opcode::LogicalOr,
        ] {
            assert!(op.meta().commutative, "{op:?} should be commutative");
        }
        assert!(!Opcode::ISub32.meta().commutative);
    }

    #[test]
    fn names_round_trip_through_display() {
        assert_eq!(Opcode::IAdd32.to_string(), "IAdd32");
        assert_eq!(Opcode::GetCbufU32.to_string(), "GetCbufU32");
    }
}
