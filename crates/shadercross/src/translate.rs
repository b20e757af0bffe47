//! The translation orchestrator: picks the backend sequence for each
//! (source, destination) pair and threads the intermediate artifacts through
//! it.
//!
//! Intermediates are owned values moved from stage to stage, so every buffer
//! is dropped as soon as the next backend has consumed it, on success and
//! error paths alike.

use std::path::Path;

use shadercross_reflect::ShaderStage;

use crate::dxc::{self, DxcOutputKind};
use crate::error::{Result, ShaderCrossError};
use crate::formats::ShaderModel;
use crate::fxc;
use crate::loader::ShaderCross;
use crate::spvc::{self, TranspileTarget};

/// A shader source handed to the orchestrator.
#[derive(Debug, Clone, Copy)]
pub enum ShaderSource<'a> {
    /// SPIR-V bytecode.
    Spirv(&'a [u8]),
    /// HLSL source text.
    Hlsl(&'a str),
}

/// The artifact the orchestrator should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// SPIR-V bytecode.
    Spirv,
    /// Legacy Direct3D bytecode.
    Dxbc,
    /// DXIL bytecode.
    Dxil,
    /// Metal Shading Language text.
    Msl,
    /// HLSL text (requires a shader model).
    Hlsl,
    /// One-line JSON reflection metadata.
    Json,
}

/// Per-call translation options.
#[derive(Debug, Clone)]
pub struct TranslateOptions<'a> {
    /// The shader stage of the input module.
    pub stage: ShaderStage,
    /// The entry-point function name.
    pub entrypoint: &'a str,
    /// Include directory for HLSL `#include` resolution.
    pub include_dir: Option<&'a Path>,
    /// Preprocessor defines (`NAME` or `NAME=VALUE`).
    pub defines: &'a [String],
    /// Shader model for HLSL text destinations.
    pub shader_model: Option<ShaderModel>,
    /// Request debug-friendly output from the backends (best effort).
    pub debug: bool,
}

impl<'a> TranslateOptions<'a> {
    /// Options with the conventional `main` entrypoint and nothing else set.
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            entrypoint: "main",
            include_dir: None,
            defines: &[],
            shader_model: None,
            debug: false,
        }
    }
}

/// A produced artifact: bytecode or text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Translated {
    /// Bytecode output (SPIR-V, DXBC, DXIL).
    Binary(Vec<u8>),
    /// Text output (MSL, HLSL, JSON).
    Text(String),
}

impl Translated {
    /// The artifact as raw bytes, however it was produced.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            Self::Binary(bytes) => bytes,
            Self::Text(text) => text.into_bytes(),
        }
    }
}

/// Translates `source` into `destination`, selecting the backend route from
/// the (source, destination) pair.
///
/// Failures are logged and returned; any intermediate artifact is dropped on
/// the way out.
pub fn translate(
    context: &ShaderCross,
    source: ShaderSource<'_>,
    destination: OutputFormat,
    options: &TranslateOptions<'_>,
) -> Result<Translated> {
    let result = translate_inner(context, source, destination, options);
    if let Err(error) = &result {
        tracing::error!("shader translation failed: {error}");
    }
    result
}

fn translate_inner(
    context: &ShaderCross,
    source: ShaderSource<'_>,
    destination: OutputFormat,
    options: &TranslateOptions<'_>,
) -> Result<Translated> {
    match source {
        ShaderSource::Spirv(spirv) => from_spirv(context, spirv, destination, options),
        ShaderSource::Hlsl(hlsl) => from_hlsl(context, hlsl, destination, options),
    }
}

fn from_spirv(
    context: &ShaderCross,
    spirv: &[u8],
    destination: OutputFormat,
    options: &TranslateOptions<'_>,
) -> Result<Translated> {
    match destination {
        OutputFormat::Spirv => Err(ShaderCrossError::UnsupportedRoute(
            "Input and output are both SPIRV. Did you mean to do that?".into(),
        )),
        OutputFormat::Msl => {
            let transpiled = spvc::transpile(
                context.spvc()?,
                spirv,
                options.entrypoint,
                options.stage,
                TranspileTarget::Msl,
                context.convention(),
            )?;
            Ok(Translated::Text(transpiled.source))
        }
        OutputFormat::Hlsl => {
            let model = require_shader_model(options)?;
            let transpiled = spvc::transpile(
                context.spvc()?,
                spirv,
                options.entrypoint,
                options.stage,
                TranspileTarget::Hlsl(model),
                context.convention(),
            )?;
            Ok(Translated::Text(transpiled.source))
        }
        OutputFormat::Dxbc => spirv_to_dxbc(context, spirv, options).map(Translated::Binary),
        OutputFormat::Dxil => spirv_to_dxil(context, spirv, options).map(Translated::Binary),
        OutputFormat::Json => reflect_json(context, spirv, options.stage).map(Translated::Text),
    }
}

fn from_hlsl(
    context: &ShaderCross,
    hlsl: &str,
    destination: OutputFormat,
    options: &TranslateOptions<'_>,
) -> Result<Translated> {
    match destination {
        OutputFormat::Spirv => hlsl_to_spirv(context, hlsl, options).map(Translated::Binary),
        // Every other destination is forced through a SPIR-V round trip so
        // the binding conventions (notably structured-buffer layouts) are
        // normalized by the transpiler first.
        OutputFormat::Dxbc => {
            let spirv = hlsl_to_spirv(context, hlsl, options)?;
            spirv_to_dxbc(context, &spirv, options).map(Translated::Binary)
        }
        OutputFormat::Dxil => {
            let spirv = hlsl_to_spirv(context, hlsl, options)?;
            spirv_to_dxil(context, &spirv, options).map(Translated::Binary)
        }
        OutputFormat::Msl => {
            let spirv = hlsl_to_spirv(context, hlsl, options)?;
            let transpiled = spvc::transpile(
                context.spvc()?,
                &spirv,
                options.entrypoint,
                options.stage,
                TranspileTarget::Msl,
                context.convention(),
            )?;
            Ok(Translated::Text(transpiled.source))
        }
        OutputFormat::Hlsl => {
            let model = require_shader_model(options)?;
            let spirv = hlsl_to_spirv(context, hlsl, options)?;
            let transpiled = spvc::transpile(
                context.spvc()?,
                &spirv,
                options.entrypoint,
                options.stage,
                TranspileTarget::Hlsl(model),
                context.convention(),
            )?;
            Ok(Translated::Text(transpiled.source))
        }
        OutputFormat::Json => {
            let spirv = hlsl_to_spirv(context, hlsl, options)?;
            reflect_json(context, &spirv, options.stage).map(Translated::Text)
        }
    }
}

fn require_shader_model(options: &TranslateOptions<'_>) -> Result<ShaderModel> {
    options.shader_model.ok_or_else(|| {
        ShaderCrossError::UnsupportedRoute(
            "HLSL destination requires a shader model (50 or 60)".into(),
        )
    })
}

fn hlsl_to_spirv(
    context: &ShaderCross,
    hlsl: &str,
    options: &TranslateOptions<'_>,
) -> Result<Vec<u8>> {
    dxc::compile_hlsl(
        context.dxc()?,
        hlsl,
        options.entrypoint,
        options.include_dir,
        options.defines,
        options.stage,
        DxcOutputKind::Spirv,
        options.debug,
    )
}

fn spirv_to_dxbc(
    context: &ShaderCross,
    spirv: &[u8],
    options: &TranslateOptions<'_>,
) -> Result<Vec<u8>> {
    // Resolve the legacy compiler before transpiling so a missing backend
    // fails without doing work.
    let fxc_backend = context.fxc()?;
    let transpiled = spvc::transpile(
        context.spvc()?,
        spirv,
        options.entrypoint,
        options.stage,
        TranspileTarget::Hlsl(ShaderModel::Sm50),
        context.convention(),
    )?;
    fxc::compile_hlsl(
        fxc_backend,
        &transpiled.source,
        &transpiled.entrypoint,
        options.stage,
        ShaderModel::Sm50,
        options.debug,
    )
}

fn spirv_to_dxil(
    context: &ShaderCross,
    spirv: &[u8],
    options: &TranslateOptions<'_>,
) -> Result<Vec<u8>> {
    let dxc_backend = context.dxc_for_dxil()?;
    let transpiled = spvc::transpile(
        context.spvc()?,
        spirv,
        options.entrypoint,
        options.stage,
        TranspileTarget::Hlsl(ShaderModel::Sm60),
        context.convention(),
    )?;
    // The transpiled source is self-contained: no include path or defines
    // carry over, and the entrypoint is the cleansed one.
    dxc::compile_hlsl(
        dxc_backend,
        &transpiled.source,
        &transpiled.entrypoint,
        None,
        &[],
        options.stage,
        DxcOutputKind::Dxil,
        options.debug,
    )
}

fn reflect_json(context: &ShaderCross, spirv: &[u8], stage: ShaderStage) -> Result<String> {
    let backend = context.spvc()?;
    match stage {
        ShaderStage::Vertex | ShaderStage::Fragment => {
            Ok(spvc::reflect_graphics(backend, spirv)?.to_json())
        }
        ShaderStage::Compute => {
            Ok(spvc::reflect_compute(backend, spirv, context.convention())?.to_json())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> TranslateOptions<'static> {
        TranslateOptions::new(ShaderStage::Vertex)
    }

    #[test]
    fn spirv_to_spirv_is_rejected() {
        let context = ShaderCross::unloaded();
        let err = translate(
            &context,
            ShaderSource::Spirv(&[0; 4]),
            OutputFormat::Spirv,
            &options(),
        )
        .unwrap_err();
        assert!(matches!(err, ShaderCrossError::UnsupportedRoute(_)));
        assert!(err.to_string().contains("Input and output are both SPIRV"));
    }

    #[test]
    fn hlsl_text_destination_requires_model() {
        let context = ShaderCross::unloaded();
        let err = translate(
            &context,
            ShaderSource::Spirv(&[0; 4]),
            OutputFormat::Hlsl,
            &options(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("shader model"));
    }

    #[test]
    fn routes_report_their_missing_backend() {
        let context = ShaderCross::unloaded();

        let msl = translate(
            &context,
            ShaderSource::Spirv(&[0; 4]),
            OutputFormat::Msl,
            &options(),
        )
        .unwrap_err();
        assert!(
            matches!(msl, ShaderCrossError::BackendUnavailable { backend: "SPIRV-Cross" }),
            "unexpected error: {msl}"
        );

        let spirv = translate(
            &context,
            ShaderSource::Hlsl("float4 main() : SV_Position { return 0; }"),
            OutputFormat::Spirv,
            &options(),
        )
        .unwrap_err();
        assert!(matches!(
            spirv,
            ShaderCrossError::BackendUnavailable { backend: "DXC" }
        ));

        let dxbc = translate(
            &context,
            ShaderSource::Spirv(&[0; 4]),
            OutputFormat::Dxbc,
            &options(),
        )
        .unwrap_err();
        assert!(matches!(
            dxbc,
            ShaderCrossError::BackendUnavailable { backend: "FXC" }
        ));

        let dxil = translate(
            &context,
            ShaderSource::Spirv(&[0; 4]),
            OutputFormat::Dxil,
            &options(),
        )
        .unwrap_err();
        assert!(matches!(
            dxil,
            ShaderCrossError::BackendUnavailable { backend: "DXIL" }
        ));
    }

    #[test]
    fn json_route_needs_the_transpiler() {
        let context = ShaderCross::unloaded();
        let err = translate(
            &context,
            ShaderSource::Spirv(&[0; 4]),
            OutputFormat::Json,
            &TranslateOptions::new(ShaderStage::Compute),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ShaderCrossError::BackendUnavailable {
                backend: "SPIRV-Cross"
            }
        ));
    }

    #[test]
    fn translated_text_round_trips_to_bytes() {
        let text = Translated::Text("kernel void main0() {}".into());
        assert_eq!(text.into_bytes(), b"kernel void main0() {}".to_vec());
    }
}
