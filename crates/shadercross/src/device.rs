//! Runtime GPU-shader construction against a caller-provided device.
//!
//! The device itself is a collaborator: callers implement [`GpuDevice`] over
//! whatever GPU API they drive. The orchestrator picks the best format the
//! device accepts, runs the corresponding translation route, reflects the
//! SPIR-V to fill in the creation descriptor, and hands the result to the
//! device's create call.

use shadercross_reflect::{ComputePipelineMetadata, GraphicsShaderMetadata, ShaderStage};

use crate::dxc::{self, DxcOutputKind};
use crate::error::{Result, ShaderCrossError};
use crate::formats::{ShaderFormats, ShaderModel};
use crate::fxc;
use crate::loader::ShaderCross;
use crate::spvc::{self, TranspileTarget};

/// Everything a device needs to create a graphics shader.
#[derive(Debug, Clone)]
pub struct GraphicsShaderDescriptor<'a> {
    /// The shader code in `format`.
    pub code: &'a [u8],
    /// The single format bit `code` is in.
    pub format: ShaderFormats,
    /// The entry-point name valid for `code` (already cleansed when the code
    /// went through the transpiler).
    pub entrypoint: &'a str,
    /// Vertex or fragment.
    pub stage: ShaderStage,
    /// Reflected resource counts.
    pub metadata: GraphicsShaderMetadata,
}

/// Everything a device needs to create a compute pipeline.
#[derive(Debug, Clone)]
pub struct ComputePipelineDescriptor<'a> {
    /// The shader code in `format`.
    pub code: &'a [u8],
    /// The single format bit `code` is in.
    pub format: ShaderFormats,
    /// The entry-point name valid for `code`.
    pub entrypoint: &'a str,
    /// Reflected resource counts and threadgroup size.
    pub metadata: ComputePipelineMetadata,
}

/// A GPU device that can consume compiled shaders.
///
/// Implementations report which formats they accept and turn descriptors
/// into their own opaque handles.
pub trait GpuDevice {
    /// The device's graphics shader handle.
    type GraphicsShader;
    /// The device's compute pipeline handle.
    type ComputePipeline;

    /// The shader formats this device accepts.
    fn shader_formats(&self) -> ShaderFormats;

    /// Creates a graphics shader from `descriptor`.
    fn create_graphics_shader(
        &self,
        descriptor: &GraphicsShaderDescriptor<'_>,
    ) -> Result<Self::GraphicsShader>;

    /// Creates a compute pipeline from `descriptor`.
    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor<'_>,
    ) -> Result<Self::ComputePipeline>;
}

/// Picks the format to feed a device, in preference order: SPIR-V untouched,
/// then DXIL, then DXBC, then MSL.
pub fn select_device_format(accepted: ShaderFormats) -> Option<ShaderFormats> {
    [
        ShaderFormats::SPIRV,
        ShaderFormats::DXIL,
        ShaderFormats::DXBC,
        ShaderFormats::MSL,
    ]
    .into_iter()
    .find(|format| accepted.contains(*format))
}

/// Compiles SPIR-V into whatever format `device` accepts and creates a
/// graphics shader from it, returning the handle and the reflected metadata.
pub fn compile_graphics_shader<D: GpuDevice>(
    context: &ShaderCross,
    device: &D,
    spirv: &[u8],
    entrypoint: &str,
    stage: ShaderStage,
) -> Result<(D::GraphicsShader, GraphicsShaderMetadata)> {
    if stage == ShaderStage::Compute {
        return Err(ShaderCrossError::UnsupportedRoute(
            "compute shaders build a compute pipeline, not a graphics shader".into(),
        ));
    }

    let metadata = spvc::reflect_graphics(context.spvc()?, spirv)?;
    let format = select_device_format(device.shader_formats()).ok_or_else(no_common_format)?;
    let (code, entrypoint) = prepare_code(context, spirv, entrypoint, stage, format)?;

    let descriptor = GraphicsShaderDescriptor {
        code: &code,
        format,
        entrypoint: &entrypoint,
        stage,
        metadata,
    };
    let shader = device.create_graphics_shader(&descriptor)?;
    Ok((shader, metadata))
}

/// Compiles compute SPIR-V for `device` and creates a compute pipeline,
/// returning the handle and the reflected metadata.
pub fn compile_compute_pipeline<D: GpuDevice>(
    context: &ShaderCross,
    device: &D,
    spirv: &[u8],
    entrypoint: &str,
) -> Result<(D::ComputePipeline, ComputePipelineMetadata)> {
    let metadata = spvc::reflect_compute(context.spvc()?, spirv, context.convention())?;
    let format = select_device_format(device.shader_formats()).ok_or_else(no_common_format)?;
    let (code, entrypoint) =
        prepare_code(context, spirv, entrypoint, ShaderStage::Compute, format)?;

    let descriptor = ComputePipelineDescriptor {
        code: &code,
        format,
        entrypoint: &entrypoint,
        metadata,
    };
    let pipeline = device.create_compute_pipeline(&descriptor)?;
    Ok((pipeline, metadata))
}

fn no_common_format() -> ShaderCrossError {
    ShaderCrossError::UnsupportedRoute(
        "device accepts none of the formats shadercross can produce".into(),
    )
}

/// Produces (code, entrypoint) in `format`; the entrypoint is the cleansed
/// name whenever the code went through the transpiler.
fn prepare_code(
    context: &ShaderCross,
    spirv: &[u8],
    entrypoint: &str,
    stage: ShaderStage,
    format: ShaderFormats,
) -> Result<(Vec<u8>, String)> {
    if format == ShaderFormats::SPIRV {
        return Ok((spirv.to_vec(), entrypoint.to_owned()));
    }
    if format == ShaderFormats::MSL {
        let transpiled = spvc::transpile(
            context.spvc()?,
            spirv,
            entrypoint,
            stage,
            TranspileTarget::Msl,
            context.convention(),
        )?;
        return Ok((transpiled.source.into_bytes(), transpiled.entrypoint));
    }
    if format == ShaderFormats::DXIL {
        let dxc_backend = context.dxc_for_dxil()?;
        let transpiled = spvc::transpile(
            context.spvc()?,
            spirv,
            entrypoint,
            stage,
            TranspileTarget::Hlsl(ShaderModel::Sm60),
            context.convention(),
        )?;
        let code = dxc::compile_hlsl(
            dxc_backend,
            &transpiled.source,
            &transpiled.entrypoint,
            None,
            &[],
            stage,
            DxcOutputKind::Dxil,
            false,
        )?;
        return Ok((code, transpiled.entrypoint));
    }
    if format == ShaderFormats::DXBC {
        let fxc_backend = context.fxc()?;
        let transpiled = spvc::transpile(
            context.spvc()?,
            spirv,
            entrypoint,
            stage,
            TranspileTarget::Hlsl(ShaderModel::Sm50),
            context.convention(),
        )?;
        let code = fxc::compile_hlsl(
            fxc_backend,
            &transpiled.source,
            &transpiled.entrypoint,
            stage,
            ShaderModel::Sm50,
            false,
        )?;
        return Ok((code, transpiled.entrypoint));
    }
    Err(no_common_format())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubDevice {
        formats: ShaderFormats,
    }

    impl GpuDevice for StubDevice {
        type GraphicsShader = ();
        type ComputePipeline = ();

        fn shader_formats(&self) -> ShaderFormats {
            self.formats
        }

        fn create_graphics_shader(
            &self,
            _descriptor: &GraphicsShaderDescriptor<'_>,
        ) -> Result<()> {
            Ok(())
        }

        fn create_compute_pipeline(
            &self,
            _descriptor: &ComputePipelineDescriptor<'_>,
        ) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn format_preference_order() {
        assert_eq!(
            select_device_format(ShaderFormats::all()),
            Some(ShaderFormats::SPIRV)
        );
        assert_eq!(
            select_device_format(ShaderFormats::DXBC | ShaderFormats::DXIL | ShaderFormats::MSL),
            Some(ShaderFormats::DXIL)
        );
        assert_eq!(
            select_device_format(ShaderFormats::DXBC | ShaderFormats::MSL),
            Some(ShaderFormats::DXBC)
        );
        assert_eq!(
            select_device_format(ShaderFormats::MSL),
            Some(ShaderFormats::MSL)
        );
        assert_eq!(select_device_format(ShaderFormats::empty()), None);
    }

    #[test]
    fn graphics_rejects_compute_stage() {
        let context = ShaderCross::unloaded();
        let device = StubDevice {
            formats: ShaderFormats::SPIRV,
        };
        let err =
            compile_graphics_shader(&context, &device, &[0; 4], "main", ShaderStage::Compute)
                .unwrap_err();
        assert!(matches!(err, ShaderCrossError::UnsupportedRoute(_)));
    }

    #[test]
    fn construction_requires_the_reflection_backend() {
        // Even a SPIRV-native device needs reflection to fill its creation
        // descriptor, so an unloaded context cannot build anything.
        let context = ShaderCross::unloaded();
        let device = StubDevice {
            formats: ShaderFormats::SPIRV,
        };
        let err = compile_graphics_shader(&context, &device, &[0; 4], "main", ShaderStage::Vertex)
            .unwrap_err();
        assert!(matches!(
            err,
            ShaderCrossError::BackendUnavailable {
                backend: "SPIRV-Cross"
            }
        ));
    }
}
