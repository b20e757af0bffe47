use shadercross_reflect::ReflectError;
use thiserror::Error;

/// An error surfaced by a translation, reflection or shader-construction
/// operation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ShaderCrossError {
    /// The native library backing the required backend did not load.
    #[error("{backend} backend is not available (native library not loaded)")]
    BackendUnavailable {
        /// Name of the missing backend (`"DXC"`, `"FXC"`, `"DXIL"`,
        /// `"SPIRV-Cross"`).
        backend: &'static str,
    },

    /// A compiler backend reported failure; the text is the backend's error
    /// output, verbatim.
    #[error("shader compilation failed: {0}")]
    CompilationFailed(String),

    /// SPIRV-Cross reported failure; the text is the context's last-error
    /// string.
    #[error("SPIR-V transpilation failed: {0}")]
    TranspileFailed(String),

    /// The input is not a plausible SPIR-V module.
    #[error("invalid SPIR-V module: {0}")]
    InvalidSpirv(String),

    /// A reflected resource violated the binding contract.
    #[error(transparent)]
    Reflect(#[from] ReflectError),

    /// The requested (source, destination) pair has no translation route.
    #[error("unsupported translation: {0}")]
    UnsupportedRoute(String),

    /// The GPU device rejected the compiled shader.
    #[error("device rejected shader: {0}")]
    Device(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, ShaderCrossError>;
