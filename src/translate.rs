//! Front-end interface (§6, "To the front end").
//!
//! Decoding machine shader code into [`Program`], and reconstructing
//! structured control flow into an abstract syntax tree, are external
//! collaborators: this module pins their contract (the traits a front end
//! implements, and the signatures this core exposes to call into) without
//! implementing either side. A caller wiring in a real Maxwell decoder
//! supplies `Environment` and `Cfg` impls and gets a populated [`Program`]
//! back; this core never reaches for a decoder on its own.
//!
//! Grounded on `frontend/maxwell/translate_program.h`'s `TranslateProgram`/
//! `MergeDualVertexPrograms` pair, rendered as free functions over trait
//! objects rather than header-declared C++ functions taking object-pool
//! references, matching the teacher's own preference for trait-bounded
//! free functions (e.g. `Context::compile`) over methods on a god object.

use crate::error::CoreError;
use crate::ir::entities::BlockRef;
use crate::ir::program::{Program, Stage};

/// Per-invocation access to the GPU state a decoder needs: the raw
/// instruction stream, the stage being compiled, and the local/shared
/// memory sizes in scope. Implemented by the caller; this core only reads
/// through it during front-end translation, which this crate does not
/// itself perform (see the module docs).
pub trait Environment {
    /// Reads the 64-bit instruction word at `address` (a byte offset into
    /// the shader's code segment).
    fn read_instruction(&self, address: u32) -> u64;

    /// The shader stage this invocation is compiling.
    fn stage(&self) -> Stage;

    /// Size in bytes of local memory visible to this invocation.
    fn local_memory_size(&self) -> u32;

    /// Size in bytes of shared memory visible to this invocation
    /// (compute/mesh stages only; zero elsewhere).
    fn shared_memory_size(&self) -> u32;
}

/// The already-reconstructed control-flow graph a structured-control-flow
/// component hands to this core. Opaque from this crate's point of view:
/// translation only needs to ask it for its entry block and the successors
/// of a given block, never to build or mutate it.
pub trait Cfg {
    /// The graph's single entry block.
    fn entry_block(&self) -> BlockRef;

    /// The blocks `block` can fall through or branch to, in the order the
    /// structured-control-flow reconstructor wants them visited.
    fn successors(&self, block: BlockRef) -> Vec<BlockRef>;
}

/// Host capabilities and workarounds that bend how the front end and the
/// `Prologue`/`Epilogue` emit contracts (§6) behave for a given target.
/// Populated by the caller from driver/feature queries; this core only
/// reads it.
#[derive(Clone, Debug, Default)]
pub struct HostTranslateInfo {
    /// The host can express native normalized device coordinates directly,
    /// so `Epilogue`'s depth-mode conversion (§6) is skipped.
    pub support_native_ndc: bool,
    /// The host supports `OpDemoteToHelperInvocationEXT` (or equivalent);
    /// affects how discard-like constructs lower.
    pub support_demote_to_helper_invocation: bool,
    /// The host's SPIR-V driver has a known-broken access-chain
    /// optimization; `Prologue` (§6) emits an "unoptimised zero" load to
    /// defeat it when this is set.
    pub has_broken_spirv_access_chain_opt: bool,
}

/// `TranslateProgram` (§6): decodes `env`'s instruction stream into a fresh
/// [`Program`] using the control flow already reconstructed in `cfg`.
///
/// This core does not implement Maxwell instruction decoding or structured
/// control-flow reconstruction — both are external collaborators whose
/// contracts are pinned by the `Environment`/`Cfg` traits above. A real
/// front end replaces this stub; it exists so the mid-end (this crate's
/// actual scope) has a typed entry point to receive a `Program` through.
pub fn translate_program(
    env: &dyn Environment,
    _cfg: &dyn Cfg,
    _host_info: &HostTranslateInfo,
) -> Result<Program, CoreError> {
    let _ = env.stage();
    Err(CoreError::not_implemented(
        "Maxwell instruction decoding (translate_program)",
    ))
}

/// `MergeDualVertexPrograms` (§6): concatenates a vertex-A and a vertex-B
/// program decoded from the same draw into one combined vertex program,
/// after [`crate::opt::dual_vertex`] has dropped the seam markers from
/// each half.
///
/// Left unimplemented here: splicing two arenas together is a front-end
/// concern (it must renumber `InstRef`/`BlockRef` across pools), not a
/// mid-end pass. Call [`crate::opt::dual_vertex::transform_vertex_a`] and
/// [`crate::opt::dual_vertex::transform_vertex_b`] on the two halves
/// before a front end performs the actual merge.
pub fn merge_dual_vertex_programs(
    vertex_a: &Program,
    vertex_b: &Program,
) -> Result<Program, CoreError> {
    if vertex_a.stage() != Stage::VertexA || vertex_b.stage() != Stage::VertexB {
        return Err(CoreError::invalid_argument(
            "translate::merge_dual_vertex_programs",
            "expected one VertexA program and one VertexB program",
        ));
    }
    Err(CoreError::not_implemented(
        "dual-vertex arena merge (merge_dual_vertex_programs)",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubEnvironment {
        stage: Stage,
    }

    impl Environment for StubEnvironment {
        fn read_instruction(&self, _address: u32) -> u64 {
            0
        }
        fn stage(&self) -> Stage {
            self.stage
        }
        fn local_memory_size(&self) -> u32 {
            0
        }
        fn shared_memory_size(&self) -> u32 {
            0
        }
    }

    struct StubCfg {
        entry: BlockRef,
    }

    impl Cfg for StubCfg {
        fn entry_block(&self) -> BlockRef {
            self.entry
        }
        fn successors(&self, _block: BlockRef) -> Vec<BlockRef> {
            Vec::new()
        }
    }

    #[test]
    fn translate_program_reports_not_implemented() {
        let mut program = Program::new(Stage::Fragment);
        let entry = program.new_block();
        let env = StubEnvironment {
            stage: Stage::Fragment,
        };
        let cfg = StubCfg { entry };
        let err = translate_program(&env, &cfg, &HostTranslateInfo::default()).unwrap_err();
        assert!(matches!(err, CoreError::NotImplemented { .. }));
    }

    #[test]
    fn merge_dual_vertex_programs_validates_stages_before_reporting_not_implemented() {
        let vertex_a = Program::new(Stage::Fragment);
        let vertex_b = Program::new(Stage::VertexB);
        let err = merge_dual_vertex_programs(&vertex_a, &vertex_b).unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument { .. }));
    }
}
