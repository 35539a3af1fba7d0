//! Back-end interface (§6, "To the back ends").
//!
//! `emit_spirv`/`emit_glsl`/`emit_glasm` are external collaborators: each
//! walks a fully mid-end-optimized [`Program`] and lowers it to a target's
//! native representation. This module pins their shared signature and the
//! capability/state structs they read (`Profile`, `RuntimeInfo`,
//! `Bindings`) without implementing any of the three lowerings — that is
//! backend-specific code generation, out of this crate's scope.
//!
//! Grounded on `backend/spirv/emit_spirv.h` and `backend/glsl/emit_glsl.h`
//! for the `(profile, runtime_info, program, bindings)` call shape, and on
//! the teacher's `isa::TargetIsa` trait for the idiom of a capability
//! struct threaded immutably through code generation while a separate
//! mutable allocator (here, `Bindings`; there, `RegisterAllocator`)
//! accumulates side effects.

use crate::error::CoreError;
use crate::ir::program::Program;

/// Host/driver feature flags that bend how the three backends lower a
/// program (§6). Populated once per target by the caller; read-only to the
/// emitters.
#[derive(Clone, Debug, Default)]
pub struct Profile {
    /// `OpDemoteToHelperInvocationEXT` or equivalent is available.
    pub support_demote_to_helper_invocation: bool,
    /// The target can express NDC directly; skips `Epilogue`'s depth-mode
    /// rewrite (§6).
    pub support_native_ndc: bool,
    /// The SPIR-V driver's access-chain optimizer is known broken;
    /// `Prologue` emits a defeat load when this is set (§6).
    pub has_broken_spirv_access_chain_opt: bool,
    /// Texture formats this target can sample without emulation.
    pub supported_formats: Vec<TextureFormat>,
}

/// A GPU-visible image/sampler texel format, named generically enough to
/// be shared by all three backends' format-capability queries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    R8Unorm,
    R8G8B8A8Unorm,
    R16Float,
    R32Float,
    R32G32B32A32Float,
    Bc1RgbaUnorm,
    Bc3Unorm,
    Bc7Unorm,
}

/// The alpha-test function a fragment `Epilogue` (§6) compares against,
/// when the runtime has legacy alpha testing enabled.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AlphaTestFunc {
    Never,
    Less,
    Equal,
    LessOrEqual,
    Greater,
    NotEqual,
    GreaterOrEqual,
    Always,
}

/// Per-draw state that must be baked into the program at emit time because
/// it is not known until draw submission (§6): fixed-function state this
/// core's IR cannot itself represent as instructions.
#[derive(Clone, Debug, Default)]
pub struct RuntimeInfo {
    /// Fixed-state point size, when point rasterization uses a host
    /// constant rather than a per-vertex `PointSize` write (`Prologue`,
    /// §6).
    pub fixed_state_point_size: Option<f32>,
    /// Legacy alpha-test function and reference value (`Epilogue`, §6);
    /// `None` disables alpha testing.
    pub alpha_test_func: Option<AlphaTestFunc>,
    pub alpha_test_ref: f32,
    /// Whether `Epilogue` must rewrite `Position.Z` from `[-1, 1]` to
    /// `[0, 1]` NDC (§6); only consulted when `!profile.support_native_ndc`.
    pub convert_depth_mode: bool,
    /// Per-generic-attribute component layout the vertex fetch stage
    /// established, consulted by `ConvertLegacyToGeneric`-style lowering.
    pub generic_input_components: Vec<u8>,
}

/// A bump allocator for descriptor slots (uniform buffers, storage
/// buffers, textures, images) that an emitter grows as it lowers resource
/// accesses. Each `bind_*` call returns the binding index just allocated;
/// callers (the host's pipeline layout builder) read the final counts back
/// out after emission completes.
#[derive(Clone, Debug, Default)]
pub struct Bindings {
    uniform_buffers: u32,
    storage_buffers: u32,
    textures: u32,
    images: u32,
}

impl Bindings {
    pub fn bind_uniform_buffer(&mut self) -> u32 {
        let slot = self.uniform_buffers;
        self.uniform_buffers += 1;
        slot
    }

    pub fn bind_storage_buffer(&mut self) -> u32 {
        let slot = self.storage_buffers;
        self.storage_buffers += 1;
        slot
    }

    pub fn bind_texture(&mut self) -> u32 {
        let slot = self.textures;
        self.textures += 1;
        slot
    }

    pub fn bind_image(&mut self) -> u32 {
        let slot = self.images;
        self.images += 1;
        slot
    }
}

/// `emit_spirv` (§6): lowers `program` to a SPIR-V module, as a word
/// stream. Not implemented here — SPIR-V code generation is an external
/// collaborator; this core hands it a mid-end-optimized [`Program`] and
/// nothing more.
pub fn emit_spirv(
    _profile: &Profile,
    _runtime_info: &RuntimeInfo,
    _program: &Program,
    _bindings: &mut Bindings,
) -> Result<Vec<u32>, CoreError> {
    Err(CoreError::not_implemented("SPIR-V code generation (emit_spirv)"))
}

/// `emit_glsl` (§6): lowers `program` to GLSL source text.
pub fn emit_glsl(
    _profile: &Profile,
    _runtime_info: &RuntimeInfo,
    _program: &Program,
    _bindings: &mut Bindings,
) -> Result<String, CoreError> {
    Err(CoreError::not_implemented("GLSL code generation (emit_glsl)"))
}

/// `emit_glasm` (§6): lowers `program` to the NV_gpu_program5-style GLASM
/// assembly text the OpenGL ARB program path consumes.
pub fn emit_glasm(
    _profile: &Profile,
    _runtime_info: &RuntimeInfo,
    _program: &Program,
    _bindings: &mut Bindings,
) -> Result<String, CoreError> {
    Err(CoreError::not_implemented("GLASM code generation (emit_glasm)"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::program::Stage;

    #[test]
    fn bindings_hands_out_increasing_slots_per_kind() {
        let mut bindings = Bindings::default();
        assert_eq!(bindings.bind_texture(), 0);
        assert_eq!(bindings.bind_texture(), 1);
        assert_eq!(bindings.bind_uniform_buffer(), 0);
    }

    #[test]
    fn emit_spirv_reports_not_implemented() {
        let program = Program::new(Stage::Fragment);
        let profile = Profile::default();
        let runtime_info = RuntimeInfo::default();
        let mut bindings = Bindings::default();
        let err = emit_spirv(&profile, &runtime_info, &program, &mut bindings).unwrap_err();
        assert!(matches!(err, CoreError::NotImplemented { .. }));
    }
}
