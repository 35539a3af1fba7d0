//! Mid-end optimization passes (§4).
//!
//! Mirrors the teacher's flat pass-module layout (`dce.rs`, `simple_gvn.rs`,
//! ... each a free function taking `&mut Function`) rather than a trait
//! object per pass: passes here are free functions over `&mut Program`,
//! sequenced by [`pass_driver::run_passes`].

pub mod constant_propagation;
pub mod dead_code_elimination;
pub mod dual_vertex;
pub mod pass_driver;
pub mod patterns;
pub mod predicates;

pub use pass_driver::run_passes;
