//! GPU-visible input/output attribute slots.
//!
//! `Attribute` is a dense numeric code space, following the same "newtype
//! wrapping a small integer, with named constructors" idiom the teacher
//! uses for entity references (see `ir::entities::Block::with_number`).
//! The first 128 codes are the 32 generic attribute slots (4 components
//! each, laid out `Generic{i}{X|Y|Z|W}` in increasing code order); codes
//! at or above [`Attribute::FIRST_BUILTIN`] name fixed-function slots.

use crate::error::CoreError;
use core::fmt;

#[cfg(feature = "enable-serde")]
use serde_derive::{Deserialize, Serialize};

/// A GPU-visible attribute slot: a generic varying, a built-in output like
/// `Position`, or a legacy fixed-function slot.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Attribute(u32);

/// One vector component of a generic or built-in attribute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum Component {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}

macro_rules! builtin_attributes {
    ($( $name:ident ),+ $(,)?) => {
        #[allow(non_upper_case_globals)]
        impl Attribute {
            builtin_attributes!(@consts 0u32; $($name),+);
        }

        impl fmt::Debug for Attribute {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if let Some((index, element)) = self.generic_parts() {
                    return write!(f, "Generic{index}{:?}", match element {
                        0 => Component::X,
                        1 => Component::Y,
                        2 => Component::Z,
                        _ => Component::W,
                    });
                }
                $(
                    if *self == Self::$name {
                        return f.write_str(stringify!($name));
                    }
                )+
                write!(f, "Attribute({})", self.0)
            }
        }
    };
    (@consts $offset:expr; $head:ident $(, $rest:ident)*) => {
        #[doc = concat!("Fixed-function / built-in attribute code for `", stringify!($head), "`.")]
        pub const $head: Attribute = Attribute($offset);
        builtin_attributes!(@consts $offset + 1; $($rest),*);
    };
    (@consts $offset:expr;) => {};
}

builtin_attributes! {
    PositionX, PositionY, PositionZ, PositionW,
    PointSize,
    Layer,
    ViewportIndex,
    ViewportMask,
    PrimitiveId,
    FrontFace,
    ClipDistance0, ClipDistance1, ClipDistance2, ClipDistance3,
    ClipDistance4, ClipDistance5, ClipDistance6, ClipDistance7,
    ColorFrontDiffuseR, ColorFrontDiffuseG, ColorFrontDiffuseB, ColorFrontDiffuseA,
    ColorFrontSpecularR, ColorFrontSpecularG, ColorFrontSpecularB, ColorFrontSpecularA,
    TexCoord0X, TexCoord0Y, TexCoord0Z, TexCoord0Q,
    FogCoord,
    TessEvalPointU,
    TessEvalPointV,
    InstanceId,
    VertexId,
}

impl Attribute {
    /// Number of generic slots (§3: "32 slots × 4 components").
    pub const GENERIC_SLOT_COUNT: u32 = 32;
    /// Components per generic slot.
    pub const GENERIC_COMPONENT_COUNT: u32 = 4;
    /// First code that is not part of the generic range.
    pub const FIRST_BUILTIN: u32 = Self::GENERIC_SLOT_COUNT * Self::GENERIC_COMPONENT_COUNT;

    /// Build the attribute code for `Generic{index}{element}`.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] if `index` or `element` is out
    /// of range.
    pub fn generic(index: u32, element: Component) -> Result<Self, CoreError> {
        if index >= Self::GENERIC_SLOT_COUNT {
            return Err(CoreError::invalid_argument(
                "Attribute::generic",
                format!("generic index {index} out of range [0, {})", Self::GENERIC_SLOT_COUNT),
            ));
        }
        Ok(Attribute(index * Self::GENERIC_COMPONENT_COUNT + element as u32))
    }

    fn generic_parts(self) -> Option<(u32, u32)> {
        if self.0 < Self::FIRST_BUILTIN {
            Some((self.0 / Self::GENERIC_COMPONENT_COUNT, self.0 % Self::GENERIC_COMPONENT_COUNT))
        } else {
            None
        }
    }

    /// True iff this code lies in the generic attribute range.
    pub fn is_generic(self) -> bool {
        self.0 < Self::FIRST_BUILTIN
    }

    /// `index = (code − Generic0X) / 4`. (P4): defined only for generics.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] for non-generic attributes.
    pub fn generic_attribute_index(self) -> Result<u32, CoreError> {
        self.generic_parts().map(|(index, _)| index).ok_or_else(|| {
            CoreError::invalid_argument(
                "generic_attribute_index",
                format!("{self:?} is not a generic attribute"),
            )
        })
    }

    /// `element = code mod 4`. (P4): defined only for generics.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidArgument`] for non-generic attributes.
    pub fn generic_attribute_element(self) -> Result<u32, CoreError> {
        self.generic_parts().map(|(_, element)| element).ok_or_else(|| {
            CoreError::invalid_argument(
                "generic_attribute_element",
                format!("{self:?} is not a generic attribute"),
            )
        })
    }

    /// Raw numeric code, mostly useful for equality/ordering in the
    /// constant-buffer/attribute folds of the constant-propagation pass.
    pub fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
