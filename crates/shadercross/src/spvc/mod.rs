//! Driver for SPIRV-Cross: transpilation to MSL/HLSL and SPIR-V reflection.
//!
//! All SPIRV-Cross objects (parsed IR, compilers, options, resource lists,
//! result strings) are owned by one `spvc_context`; [`ContextGuard`] destroys
//! the context on every exit path, so anything that must outlive a call is
//! copied out first. A fresh context is created per operation — the objects
//! are not thread-safe and must never be shared across calls.

pub(crate) mod ffi;

use std::ffi::{c_char, CStr, CString};
use std::ptr;

use libloading::Library;
use shadercross_reflect::{
    classify_compute, classify_graphics, remap_compute, remap_graphics, BindingConvention,
    ComputePipelineMetadata, DecorationKind, GraphicsShaderMetadata, ReflectError,
    ResourceDescriptor, ResourceKind, ShaderResources, ShaderStage,
};

use crate::error::{Result, ShaderCrossError};
use crate::formats::ShaderModel;
use self::ffi::{SpvcApi, SpvcCompiler, SpvcContext, SpvcMslResourceBinding, SpvcParsedIr};

/// The loaded spirv-cross-c-shared library and its resolved entry points.
pub(crate) struct SpvcBackend {
    _library: Library,
    api: SpvcApi,
}

impl SpvcBackend {
    pub(crate) fn new(library: Library, api: SpvcApi) -> Self {
        Self {
            _library: library,
            api,
        }
    }
}

/// What the transpiler should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TranspileTarget {
    Msl,
    Hlsl(ShaderModel),
}

/// The product of a transpilation: the translated source and the cleansed
/// entrypoint downstream compilers must use.
#[derive(Debug, Clone)]
pub(crate) struct TranspiledShader {
    pub source: String,
    pub entrypoint: String,
}

/// Reinterprets a byte buffer as SPIR-V words.
///
/// The copy both enforces the length invariant and sidesteps the alignment
/// hazard of casting an arbitrary `&[u8]` to `*const u32`.
pub(crate) fn spirv_words(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(ShaderCrossError::InvalidSpirv(format!(
            "byte length {} is not a multiple of 4",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

const fn execution_model_for(stage: ShaderStage) -> u32 {
    match stage {
        ShaderStage::Vertex => ffi::SPV_EXECUTION_MODEL_VERTEX,
        ShaderStage::Fragment => ffi::SPV_EXECUTION_MODEL_FRAGMENT,
        ShaderStage::Compute => ffi::SPV_EXECUTION_MODEL_GLCOMPUTE,
    }
}

/// Scoped `spvc_context`; destroyed (together with everything it owns) when
/// the guard drops.
struct ContextGuard<'a> {
    api: &'a SpvcApi,
    context: SpvcContext,
}

impl<'a> ContextGuard<'a> {
    fn create(api: &'a SpvcApi) -> Result<Self> {
        let mut context: SpvcContext = ptr::null_mut();
        let result = unsafe { (api.context_create)(&mut context) };
        if result < 0 || context.is_null() {
            return Err(ShaderCrossError::TranspileFailed(format!(
                "spvc_context_create failed: {result}"
            )));
        }
        Ok(Self { api, context })
    }

    fn last_error(&self) -> String {
        let message = unsafe { (self.api.context_get_last_error_string)(self.context) };
        if message.is_null() {
            "unknown SPIRV-Cross error".to_owned()
        } else {
            unsafe { CStr::from_ptr(message) }
                .to_string_lossy()
                .into_owned()
        }
    }

    fn check(&self, operation: &str, result: i32) -> Result<()> {
        if result < 0 {
            Err(ShaderCrossError::TranspileFailed(format!(
                "{operation} failed: {}",
                self.last_error()
            )))
        } else {
            Ok(())
        }
    }

    fn parse_spirv(&self, words: &[u32]) -> Result<SpvcParsedIr> {
        let mut ir: SpvcParsedIr = ptr::null_mut();
        let result = unsafe {
            (self.api.context_parse_spirv)(self.context, words.as_ptr(), words.len(), &mut ir)
        };
        self.check("spvc_context_parse_spirv", result)?;
        Ok(ir)
    }

    fn create_compiler(&self, backend: u32, ir: SpvcParsedIr) -> Result<SpvcCompiler> {
        let mut compiler: SpvcCompiler = ptr::null_mut();
        let result = unsafe {
            (self.api.context_create_compiler)(
                self.context,
                backend,
                ir,
                ffi::SPVC_CAPTURE_MODE_TAKE_OWNERSHIP,
                &mut compiler,
            )
        };
        self.check("spvc_context_create_compiler", result)?;
        Ok(compiler)
    }

    /// Collects every resource of interest, requiring both decorations on
    /// each (the binding contract demands them).
    fn enumerate_resources(&self, compiler: SpvcCompiler) -> Result<ShaderResources> {
        let mut resources: ffi::SpvcResources = ptr::null_mut();
        let result =
            unsafe { (self.api.compiler_create_shader_resources)(compiler, &mut resources) };
        self.check("spvc_compiler_create_shader_resources", result)?;

        let mut out = ShaderResources::default();
        let lists = [
            (
                ffi::SPVC_RESOURCE_TYPE_SAMPLED_IMAGE,
                ResourceKind::SampledImage,
            ),
            (
                ffi::SPVC_RESOURCE_TYPE_SEPARATE_IMAGE,
                ResourceKind::SampledImage,
            ),
            (
                ffi::SPVC_RESOURCE_TYPE_SEPARATE_SAMPLERS,
                ResourceKind::SeparateSampler,
            ),
            (
                ffi::SPVC_RESOURCE_TYPE_STORAGE_IMAGE,
                ResourceKind::StorageImage,
            ),
            (
                ffi::SPVC_RESOURCE_TYPE_STORAGE_BUFFER,
                ResourceKind::StorageBuffer,
            ),
            (
                ffi::SPVC_RESOURCE_TYPE_UNIFORM_BUFFER,
                ResourceKind::UniformBuffer,
            ),
        ];
        for (resource_type, kind) in lists {
            let mut list: *const ffi::SpvcReflectedResource = ptr::null();
            let mut count: usize = 0;
            let result = unsafe {
                (self.api.resources_get_resource_list_for_type)(
                    resources,
                    resource_type,
                    &mut list,
                    &mut count,
                )
            };
            self.check("spvc_resources_get_resource_list_for_type", result)?;
            if count == 0 {
                continue;
            }

            let reflected = unsafe { std::slice::from_raw_parts(list, count) };
            for resource in reflected {
                let descriptor = self.describe_resource(compiler, resource.id, kind)?;
                let target = match resource_type {
                    ffi::SPVC_RESOURCE_TYPE_SAMPLED_IMAGE => &mut out.sampled_images,
                    ffi::SPVC_RESOURCE_TYPE_SEPARATE_IMAGE => &mut out.separate_images,
                    ffi::SPVC_RESOURCE_TYPE_SEPARATE_SAMPLERS => &mut out.separate_samplers,
                    ffi::SPVC_RESOURCE_TYPE_STORAGE_IMAGE => &mut out.storage_images,
                    ffi::SPVC_RESOURCE_TYPE_STORAGE_BUFFER => &mut out.storage_buffers,
                    _ => &mut out.uniform_buffers,
                };
                target.push(descriptor);
            }
        }
        Ok(out)
    }

    fn describe_resource(
        &self,
        compiler: SpvcCompiler,
        id: u32,
        kind: ResourceKind,
    ) -> Result<ResourceDescriptor> {
        let has_set = unsafe {
            (self.api.compiler_has_decoration)(compiler, id, ffi::SPV_DECORATION_DESCRIPTOR_SET)
        };
        if has_set == 0 {
            return Err(ReflectError::MissingDecoration {
                kind,
                id,
                decoration: DecorationKind::DescriptorSet,
            }
            .into());
        }
        let has_binding =
            unsafe { (self.api.compiler_has_decoration)(compiler, id, ffi::SPV_DECORATION_BINDING) };
        if has_binding == 0 {
            return Err(ReflectError::MissingDecoration {
                kind,
                id,
                decoration: DecorationKind::Binding,
            }
            .into());
        }

        let set = unsafe {
            (self.api.compiler_get_decoration)(compiler, id, ffi::SPV_DECORATION_DESCRIPTOR_SET)
        };
        let binding =
            unsafe { (self.api.compiler_get_decoration)(compiler, id, ffi::SPV_DECORATION_BINDING) };
        Ok(ResourceDescriptor {
            id,
            kind,
            set,
            binding,
        })
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        unsafe { (self.api.context_destroy)(self.context) };
    }
}

/// Transpiles a SPIR-V module to MSL or HLSL text.
///
/// For MSL every resource's (set, binding) is remapped onto Metal's flat
/// index spaces before compilation; for HLSL the shader-model options are
/// installed instead. The returned entrypoint is the backend's cleansed name
/// and must be used by any downstream compile.
pub(crate) fn transpile(
    backend: &SpvcBackend,
    spirv: &[u8],
    entrypoint: &str,
    stage: ShaderStage,
    target: TranspileTarget,
    convention: BindingConvention,
) -> Result<TranspiledShader> {
    let words = spirv_words(spirv)?;
    let api = &backend.api;
    let guard = ContextGuard::create(api)?;
    let ir = guard.parse_spirv(&words)?;

    let spvc_backend = match target {
        TranspileTarget::Msl => ffi::SPVC_BACKEND_MSL,
        TranspileTarget::Hlsl(_) => ffi::SPVC_BACKEND_HLSL,
    };
    let compiler = guard.create_compiler(spvc_backend, ir)?;

    let execution_model = unsafe { (api.compiler_get_execution_model)(compiler) };
    if execution_model != execution_model_for(stage) {
        return Err(ShaderCrossError::TranspileFailed(format!(
            "module execution model {execution_model} does not match requested {} stage",
            stage.name()
        )));
    }

    let mut options: ffi::SpvcCompilerOptions = ptr::null_mut();
    let result = unsafe { (api.compiler_create_compiler_options)(compiler, &mut options) };
    guard.check("spvc_compiler_create_compiler_options", result)?;

    match target {
        TranspileTarget::Hlsl(model) => {
            let hlsl_options = [
                (ffi::SPVC_COMPILER_OPTION_HLSL_SHADER_MODEL, model.hlsl_version()),
                (ffi::SPVC_COMPILER_OPTION_HLSL_NONWRITABLE_UAV_TEXTURE_AS_SRV, 1),
                (
                    ffi::SPVC_COMPILER_OPTION_HLSL_FLATTEN_MATRIX_VERTEX_INPUT_SEMANTICS,
                    1,
                ),
            ];
            for (option, value) in hlsl_options {
                let result = unsafe { (api.compiler_options_set_uint)(options, option, value) };
                guard.check("spvc_compiler_options_set_uint", result)?;
            }
        }
        TranspileTarget::Msl => {
            let resources = guard.enumerate_resources(compiler)?;
            let bindings = match stage {
                ShaderStage::Vertex | ShaderStage::Fragment => {
                    remap_graphics(&resources, convention)?
                }
                ShaderStage::Compute => remap_compute(&resources, convention)?,
            };
            for binding in &bindings {
                let raw = SpvcMslResourceBinding {
                    stage: execution_model,
                    desc_set: binding.set,
                    binding: binding.binding,
                    msl_buffer: binding.msl_buffer,
                    msl_texture: binding.msl_texture,
                    msl_sampler: binding.msl_sampler,
                };
                let result = unsafe { (api.compiler_msl_add_resource_binding)(compiler, &raw) };
                guard.check("spvc_compiler_msl_add_resource_binding", result)?;
            }
        }
    }

    let result = unsafe { (api.compiler_install_compiler_options)(compiler, options) };
    guard.check("spvc_compiler_install_compiler_options", result)?;

    let mut translated: *const c_char = ptr::null();
    let result = unsafe { (api.compiler_compile)(compiler, &mut translated) };
    guard.check("spvc_compiler_compile", result)?;
    if translated.is_null() {
        return Err(ShaderCrossError::TranspileFailed(
            "spvc_compiler_compile produced no source".into(),
        ));
    }
    // The translated source is owned by the context; copy it out before the
    // guard drops.
    let source = unsafe { CStr::from_ptr(translated) }
        .to_string_lossy()
        .into_owned();

    let entrypoint_c = CString::new(entrypoint).map_err(|_| {
        ShaderCrossError::TranspileFailed("entrypoint contains an interior NUL byte".into())
    })?;
    let cleansed = unsafe {
        (api.compiler_get_cleansed_entry_point_name)(
            compiler,
            entrypoint_c.as_ptr(),
            execution_model,
        )
    };
    if cleansed.is_null() {
        return Err(ShaderCrossError::TranspileFailed(format!(
            "no cleansed entry point for \"{entrypoint}\""
        )));
    }
    let entrypoint = unsafe { CStr::from_ptr(cleansed) }
        .to_string_lossy()
        .into_owned();

    Ok(TranspiledShader { source, entrypoint })
}

/// Reflects the resource counts of a vertex or fragment shader.
pub(crate) fn reflect_graphics(
    backend: &SpvcBackend,
    spirv: &[u8],
) -> Result<GraphicsShaderMetadata> {
    let words = spirv_words(spirv)?;
    let guard = ContextGuard::create(&backend.api)?;
    let ir = guard.parse_spirv(&words)?;
    let compiler = guard.create_compiler(ffi::SPVC_BACKEND_NONE, ir)?;
    let resources = guard.enumerate_resources(compiler)?;
    Ok(classify_graphics(&resources))
}

/// Reflects the resource counts and threadgroup size of a compute shader.
pub(crate) fn reflect_compute(
    backend: &SpvcBackend,
    spirv: &[u8],
    convention: BindingConvention,
) -> Result<ComputePipelineMetadata> {
    let words = spirv_words(spirv)?;
    let guard = ContextGuard::create(&backend.api)?;
    let ir = guard.parse_spirv(&words)?;
    let compiler = guard.create_compiler(ffi::SPVC_BACKEND_NONE, ir)?;
    let resources = guard.enumerate_resources(compiler)?;

    let api = &backend.api;
    let mut threadcount = [0u32; 3];
    for (index, count) in threadcount.iter_mut().enumerate() {
        *count = unsafe {
            (api.compiler_get_execution_mode_argument_by_index)(
                compiler,
                ffi::SPV_EXECUTION_MODE_LOCAL_SIZE,
                index as u32,
            )
        };
    }

    Ok(classify_compute(&resources, convention, threadcount)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spirv_words_rejects_unaligned_length() {
        let err = spirv_words(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, ShaderCrossError::InvalidSpirv(_)));
        assert!(err.to_string().contains("not a multiple of 4"));
    }

    #[test]
    fn spirv_words_are_little_endian() {
        let words = spirv_words(&[0x03, 0x02, 0x23, 0x07]).unwrap();
        assert_eq!(words, vec![0x0723_0203]);
    }

    #[test]
    fn empty_module_is_zero_words() {
        assert!(spirv_words(&[]).unwrap().is_empty());
    }
}
