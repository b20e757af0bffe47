//! Raw types, constants and the function-pointer table for the
//! `spirv-cross-c-shared` library.
//!
//! Constant values mirror `spirv_cross_c.h` and `spirv.h`; the handles are
//! opaque pointers owned by the `spvc_context`.

use std::ffi::{c_char, c_void};

use libloading::Library;

/// `spvc_result`: zero on success, negative on failure.
pub(crate) type SpvcResult = i32;
pub(crate) type SpvcContext = *mut c_void;
pub(crate) type SpvcParsedIr = *mut c_void;
pub(crate) type SpvcCompiler = *mut c_void;
pub(crate) type SpvcCompilerOptions = *mut c_void;
pub(crate) type SpvcResources = *mut c_void;
pub(crate) type SpvId = u32;

pub(crate) const SPVC_BACKEND_NONE: u32 = 0;
pub(crate) const SPVC_BACKEND_HLSL: u32 = 2;
pub(crate) const SPVC_BACKEND_MSL: u32 = 3;

pub(crate) const SPVC_CAPTURE_MODE_TAKE_OWNERSHIP: u32 = 1;

pub(crate) const SPVC_RESOURCE_TYPE_UNIFORM_BUFFER: u32 = 1;
pub(crate) const SPVC_RESOURCE_TYPE_STORAGE_BUFFER: u32 = 2;
pub(crate) const SPVC_RESOURCE_TYPE_STORAGE_IMAGE: u32 = 6;
pub(crate) const SPVC_RESOURCE_TYPE_SAMPLED_IMAGE: u32 = 7;
pub(crate) const SPVC_RESOURCE_TYPE_SEPARATE_IMAGE: u32 = 10;
pub(crate) const SPVC_RESOURCE_TYPE_SEPARATE_SAMPLERS: u32 = 11;

const SPVC_COMPILER_OPTION_HLSL_BIT: u32 = 0x0400_0000;
pub(crate) const SPVC_COMPILER_OPTION_HLSL_SHADER_MODEL: u32 = 13 | SPVC_COMPILER_OPTION_HLSL_BIT;
pub(crate) const SPVC_COMPILER_OPTION_HLSL_NONWRITABLE_UAV_TEXTURE_AS_SRV: u32 =
    55 | SPVC_COMPILER_OPTION_HLSL_BIT;
pub(crate) const SPVC_COMPILER_OPTION_HLSL_FLATTEN_MATRIX_VERTEX_INPUT_SEMANTICS: u32 =
    71 | SPVC_COMPILER_OPTION_HLSL_BIT;

pub(crate) const SPV_EXECUTION_MODEL_VERTEX: u32 = 0;
pub(crate) const SPV_EXECUTION_MODEL_FRAGMENT: u32 = 4;
pub(crate) const SPV_EXECUTION_MODEL_GLCOMPUTE: u32 = 5;

pub(crate) const SPV_EXECUTION_MODE_LOCAL_SIZE: u32 = 17;

pub(crate) const SPV_DECORATION_BINDING: u32 = 33;
pub(crate) const SPV_DECORATION_DESCRIPTOR_SET: u32 = 34;

#[repr(C)]
pub(crate) struct SpvcReflectedResource {
    pub id: SpvId,
    pub base_type_id: u32,
    pub type_id: u32,
    pub name: *const c_char,
}

#[repr(C)]
pub(crate) struct SpvcMslResourceBinding {
    pub stage: u32,
    pub desc_set: u32,
    pub binding: u32,
    pub msl_buffer: u32,
    pub msl_texture: u32,
    pub msl_sampler: u32,
}

/// Every `spvc_*` entry point the pipeline calls, resolved at load time.
///
/// The backend refuses to load when any symbol is missing, so the pointers
/// are always valid while the owning [`Library`] is alive.
pub(crate) struct SpvcApi {
    pub context_create: unsafe extern "C" fn(*mut SpvcContext) -> SpvcResult,
    pub context_destroy: unsafe extern "C" fn(SpvcContext),
    pub context_parse_spirv:
        unsafe extern "C" fn(SpvcContext, *const SpvId, usize, *mut SpvcParsedIr) -> SpvcResult,
    pub context_create_compiler: unsafe extern "C" fn(
        SpvcContext,
        u32,
        SpvcParsedIr,
        u32,
        *mut SpvcCompiler,
    ) -> SpvcResult,
    pub context_get_last_error_string: unsafe extern "C" fn(SpvcContext) -> *const c_char,
    pub compiler_create_compiler_options:
        unsafe extern "C" fn(SpvcCompiler, *mut SpvcCompilerOptions) -> SpvcResult,
    pub compiler_options_set_uint:
        unsafe extern "C" fn(SpvcCompilerOptions, u32, u32) -> SpvcResult,
    pub compiler_install_compiler_options:
        unsafe extern "C" fn(SpvcCompiler, SpvcCompilerOptions) -> SpvcResult,
    pub compiler_compile: unsafe extern "C" fn(SpvcCompiler, *mut *const c_char) -> SpvcResult,
    pub compiler_get_execution_model: unsafe extern "C" fn(SpvcCompiler) -> u32,
    pub compiler_get_cleansed_entry_point_name:
        unsafe extern "C" fn(SpvcCompiler, *const c_char, u32) -> *const c_char,
    pub compiler_create_shader_resources:
        unsafe extern "C" fn(SpvcCompiler, *mut SpvcResources) -> SpvcResult,
    pub resources_get_resource_list_for_type: unsafe extern "C" fn(
        SpvcResources,
        u32,
        *mut *const SpvcReflectedResource,
        *mut usize,
    ) -> SpvcResult,
    pub compiler_has_decoration: unsafe extern "C" fn(SpvcCompiler, SpvId, u32) -> u8,
    pub compiler_get_decoration: unsafe extern "C" fn(SpvcCompiler, SpvId, u32) -> u32,
    pub compiler_msl_add_resource_binding:
        unsafe extern "C" fn(SpvcCompiler, *const SpvcMslResourceBinding) -> SpvcResult,
    pub compiler_get_execution_mode_argument_by_index:
        unsafe extern "C" fn(SpvcCompiler, u32, u32) -> u32,
}

impl SpvcApi {
    /// Resolves every entry point from `library`; fails on the first missing
    /// symbol.
    ///
    /// # Safety
    ///
    /// `library` must be a real spirv-cross-c-shared build so the symbol
    /// signatures match these declarations.
    pub(crate) unsafe fn load(library: &Library) -> std::result::Result<Self, libloading::Error> {
        macro_rules! sym {
            ($name:literal) => {
                *library.get($name)?
            };
        }
        Ok(Self {
            context_create: sym!(b"spvc_context_create\0"),
            context_destroy: sym!(b"spvc_context_destroy\0"),
            context_parse_spirv: sym!(b"spvc_context_parse_spirv\0"),
            context_create_compiler: sym!(b"spvc_context_create_compiler\0"),
            context_get_last_error_string: sym!(b"spvc_context_get_last_error_string\0"),
            compiler_create_compiler_options: sym!(b"spvc_compiler_create_compiler_options\0"),
            compiler_options_set_uint: sym!(b"spvc_compiler_options_set_uint\0"),
            compiler_install_compiler_options: sym!(b"spvc_compiler_install_compiler_options\0"),
            compiler_compile: sym!(b"spvc_compiler_compile\0"),
            compiler_get_execution_model: sym!(b"spvc_compiler_get_execution_model\0"),
            compiler_get_cleansed_entry_point_name: sym!(
                b"spvc_compiler_get_cleansed_entry_point_name\0"
            ),
            compiler_create_shader_resources: sym!(b"spvc_compiler_create_shader_resources\0"),
            resources_get_resource_list_for_type: sym!(
                b"spvc_resources_get_resource_list_for_type\0"
            ),
            compiler_has_decoration: sym!(b"spvc_compiler_has_decoration\0"),
            compiler_get_decoration: sym!(b"spvc_compiler_get_decoration\0"),
            compiler_msl_add_resource_binding: sym!(b"spvc_compiler_msl_add_resource_binding\0"),
            compiler_get_execution_mode_argument_by_index: sym!(
                b"spvc_compiler_get_execution_mode_argument_by_index\0"
            ),
        })
    }
}
