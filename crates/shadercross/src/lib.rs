//! Shader cross-compilation by driving native compiler backends.
//!
//! Accepts SPIR-V bytecode or HLSL text and produces SPIR-V, DXBC, DXIL, MSL,
//! HLSL text, or JSON reflection metadata. Three external compilers do the
//! actual work, each consumed through its C ABI at runtime:
//!
//! - DXC (`dxcompiler`) as the HLSL front-end, for DXIL and SPIR-V;
//! - the legacy compiler (`d3dcompiler` / vkd3d-utils) for DXBC;
//! - SPIRV-Cross (`spirv-cross-c-shared`) for MSL/HLSL transpilation and
//!   SPIR-V reflection.
//!
//! Build a [`ShaderCross`] context once — whichever libraries are present
//! determine the reported capabilities — then call [`translate`] per shader,
//! or the [`device`] helpers to construct GPU objects directly. The context
//! is read-only after construction, so translations may run concurrently;
//! each call creates and releases its own backend instances.

mod com;
mod device;
mod dxc;
mod error;
mod formats;
mod fxc;
mod loader;
mod spvc;
mod translate;

pub use crate::device::{
    compile_compute_pipeline, compile_graphics_shader, select_device_format,
    ComputePipelineDescriptor, GpuDevice, GraphicsShaderDescriptor,
};
pub use crate::error::{Result, ShaderCrossError};
pub use crate::formats::{ShaderFormats, ShaderModel};
pub use crate::loader::ShaderCross;
pub use crate::translate::{translate, OutputFormat, ShaderSource, Translated, TranslateOptions};

pub use shadercross_reflect::{
    BindingConvention, ComputePipelineMetadata, GraphicsShaderMetadata, ReflectError, ShaderStage,
};
