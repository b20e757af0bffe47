//! Driver for the DXC HLSL front-end (`IDxcCompiler3`).
//!
//! The library is consumed through hand-written vtables matching the COM ABI.
//! A fresh compiler instance is created per call (the DXC objects are not
//! thread-safe) and every interface pointer is wrapped in a [`ComPtr`] so it
//! is released on all exit paths.

use std::ffi::{c_char, c_void, CString};
use std::path::Path;
use std::ptr;

use libloading::Library;
use shadercross_reflect::ShaderStage;

use crate::com::{ComPtr, Guid, Hresult, IUnknownVtbl};
use crate::error::{Result, ShaderCrossError};

// {73E22D93-E6CE-47F3-B5BF-F0664F39C1B0}
const CLSID_DXC_COMPILER: Guid = Guid {
    data1: 0x73e2_2d93,
    data2: 0xe6ce,
    data3: 0x47f3,
    data4: [0xb5, 0xbf, 0xf0, 0x66, 0x4f, 0x39, 0xc1, 0xb0],
};
// {228B4687-5A6A-4730-900C-9702B2203F54}
const IID_IDXC_COMPILER3: Guid = Guid {
    data1: 0x228b_4687,
    data2: 0x5a6a,
    data3: 0x4730,
    data4: [0x90, 0x0c, 0x97, 0x02, 0xb2, 0x20, 0x3f, 0x54],
};
// {58346CDA-DDE7-4497-9461-6F87AF5E0659}
const IID_IDXC_RESULT: Guid = Guid {
    data1: 0x5834_6cda,
    data2: 0xdde7,
    data3: 0x4497,
    data4: [0x94, 0x61, 0x6f, 0x87, 0xaf, 0x5e, 0x06, 0x59],
};
// {8BA5FB08-5195-40E2-AC58-0D989C3A0102}
const IID_IDXC_BLOB: Guid = Guid {
    data1: 0x8ba5_fb08,
    data2: 0x5195,
    data3: 0x40e2,
    data4: [0xac, 0x58, 0x0d, 0x98, 0x9c, 0x3a, 0x01, 0x02],
};
// {3DA636C9-BA71-4024-A301-30CBF125305B}
const IID_IDXC_BLOB_UTF8: Guid = Guid {
    data1: 0x3da6_36c9,
    data2: 0xba71,
    data3: 0x4024,
    data4: [0xa3, 0x01, 0x30, 0xcb, 0xf1, 0x25, 0x30, 0x5b],
};

const DXC_OUT_OBJECT: u32 = 1;
const DXC_OUT_ERRORS: u32 = 2;

/// `DXC_CP_ACP`: binary/ANSI, or autodetect via BOM.
const DXC_CP_ACP: u32 = 0;

#[repr(C)]
struct DxcBuffer {
    ptr: *const c_void,
    size: usize,
    encoding: u32,
}

#[repr(C)]
struct IDxcBlobVtbl {
    base: IUnknownVtbl,
    get_buffer_pointer: unsafe extern "system" fn(*mut IDxcBlob) -> *mut c_void,
    get_buffer_size: unsafe extern "system" fn(*mut IDxcBlob) -> usize,
}

#[repr(C)]
struct IDxcBlob {
    vtbl: *const IDxcBlobVtbl,
}

#[repr(C)]
struct IDxcBlobUtf8Vtbl {
    base: IUnknownVtbl,
    get_buffer_pointer: unsafe extern "system" fn(*mut IDxcBlobUtf8) -> *mut c_void,
    get_buffer_size: unsafe extern "system" fn(*mut IDxcBlobUtf8) -> usize,
    get_encoding:
        unsafe extern "system" fn(*mut IDxcBlobUtf8, *mut i32, *mut u32) -> Hresult,
    get_string_pointer: unsafe extern "system" fn(*mut IDxcBlobUtf8) -> *const c_char,
    get_string_length: unsafe extern "system" fn(*mut IDxcBlobUtf8) -> usize,
}

#[repr(C)]
struct IDxcBlobUtf8 {
    vtbl: *const IDxcBlobUtf8Vtbl,
}

#[repr(C)]
struct IDxcResultVtbl {
    base: IUnknownVtbl,
    get_status: unsafe extern "system" fn(*mut IDxcResult, *mut Hresult) -> Hresult,
    get_result: unsafe extern "system" fn(*mut IDxcResult, *mut *mut IDxcBlob) -> Hresult,
    get_error_buffer: unsafe extern "system" fn(*mut IDxcResult, *mut *mut c_void) -> Hresult,
    has_output: unsafe extern "system" fn(*mut IDxcResult, u32) -> i32,
    get_output: unsafe extern "system" fn(
        *mut IDxcResult,
        u32,
        *const Guid,
        *mut *mut c_void,
        *mut *mut c_void,
    ) -> Hresult,
    get_num_outputs: unsafe extern "system" fn(*mut IDxcResult) -> u32,
    get_output_by_index: unsafe extern "system" fn(*mut IDxcResult, u32) -> u32,
    primary_output: unsafe extern "system" fn(*mut IDxcResult) -> u32,
}

#[repr(C)]
struct IDxcResult {
    vtbl: *const IDxcResultVtbl,
}

#[repr(C)]
struct IDxcCompiler3Vtbl {
    base: IUnknownVtbl,
    compile: unsafe extern "system" fn(
        *mut IDxcCompiler3,
        *const DxcBuffer,
        *const *const u16,
        u32,
        *mut c_void,
        *const Guid,
        *mut *mut c_void,
    ) -> Hresult,
    disassemble: unsafe extern "system" fn(
        *mut IDxcCompiler3,
        *const DxcBuffer,
        *const Guid,
        *mut *mut c_void,
    ) -> Hresult,
}

#[repr(C)]
struct IDxcCompiler3 {
    vtbl: *const IDxcCompiler3Vtbl,
}

/// `DxcCreateInstance` entry point.
pub(crate) type DxcCreateInstanceFn =
    unsafe extern "system" fn(*const Guid, *const Guid, *mut *mut c_void) -> Hresult;

/// The loaded DXC library and its factory entry point.
pub(crate) struct DxcBackend {
    _library: Library,
    create_instance: DxcCreateInstanceFn,
}

impl DxcBackend {
    pub(crate) fn new(library: Library, create_instance: DxcCreateInstanceFn) -> Self {
        Self {
            _library: library,
            create_instance,
        }
    }
}

/// What DXC should emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DxcOutputKind {
    Dxil,
    Spirv,
}

/// The DXC profile for `stage` (always shader model 6.0).
const fn dxc_profile(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vs_6_0",
        ShaderStage::Fragment => "ps_6_0",
        ShaderStage::Compute => "cs_6_0",
    }
}

/// Builds the textual DXC argument list; encoded to UTF-16 just before the
/// call.
fn build_args(
    entrypoint: &str,
    include_dir: Option<&Path>,
    defines: &[String],
    stage: ShaderStage,
    output: DxcOutputKind,
    debug: bool,
) -> Vec<String> {
    let mut args = vec![
        "-E".to_owned(),
        entrypoint.to_owned(),
        "-T".to_owned(),
        dxc_profile(stage).to_owned(),
    ];
    if let Some(dir) = include_dir {
        args.push("-I".to_owned());
        args.push(dir.display().to_string());
    }
    if output == DxcOutputKind::Spirv {
        args.push("-spirv".to_owned());
    }
    for define in defines {
        args.push(format!("-D{define}"));
    }
    if debug {
        args.push("-Od".to_owned());
    }
    args
}

fn to_wide(arg: &str) -> Vec<u16> {
    arg.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Compiles HLSL source to DXIL or SPIR-V through `IDxcCompiler3::Compile`.
pub(crate) fn compile_hlsl(
    backend: &DxcBackend,
    source: &str,
    entrypoint: &str,
    include_dir: Option<&Path>,
    defines: &[String],
    stage: ShaderStage,
    output: DxcOutputKind,
    debug: bool,
) -> Result<Vec<u8>> {
    let source = CString::new(source).map_err(|_| {
        ShaderCrossError::CompilationFailed("HLSL source contains an interior NUL byte".into())
    })?;

    let args = build_args(entrypoint, include_dir, defines, stage, output, debug);
    let wide_args: Vec<Vec<u16>> = args.iter().map(|arg| to_wide(arg)).collect();
    let arg_pointers: Vec<*const u16> = wide_args.iter().map(|arg| arg.as_ptr()).collect();

    let mut instance_ptr: *mut c_void = ptr::null_mut();
    unsafe {
        (backend.create_instance)(
            &CLSID_DXC_COMPILER,
            &IID_IDXC_COMPILER3,
            &mut instance_ptr,
        );
    }
    let instance = unsafe { ComPtr::<IDxcCompiler3>::from_raw(instance_ptr.cast()) }
        .ok_or(ShaderCrossError::BackendUnavailable { backend: "DXC" })?;

    let buffer = DxcBuffer {
        ptr: source.as_ptr().cast(),
        size: source.as_bytes_with_nul().len(),
        encoding: DXC_CP_ACP,
    };

    let mut result_ptr: *mut c_void = ptr::null_mut();
    let status = unsafe {
        let compiler = instance.as_ptr();
        ((*(*compiler).vtbl).compile)(
            compiler,
            &buffer,
            arg_pointers.as_ptr(),
            arg_pointers.len() as u32,
            ptr::null_mut(),
            &IID_IDXC_RESULT,
            &mut result_ptr,
        )
    };
    if status < 0 {
        return Err(ShaderCrossError::CompilationFailed(format!(
            "IDxcCompiler3::Compile failed: {status:#010X}"
        )));
    }
    let result = unsafe { ComPtr::<IDxcResult>::from_raw(result_ptr.cast()) }.ok_or_else(|| {
        ShaderCrossError::CompilationFailed("HLSL compilation produced no result object".into())
    })?;

    // A non-empty errors blob means failure even when the HRESULT is benign.
    if let Some(errors) = get_output::<IDxcBlobUtf8>(&result, DXC_OUT_ERRORS, &IID_IDXC_BLOB_UTF8)
    {
        let text = unsafe {
            let errors_ptr = errors.as_ptr();
            let len = ((*(*errors_ptr).vtbl).get_string_length)(errors_ptr);
            if len == 0 {
                None
            } else {
                let ptr = ((*(*errors_ptr).vtbl).get_string_pointer)(errors_ptr);
                let bytes = std::slice::from_raw_parts(ptr.cast::<u8>(), len);
                Some(String::from_utf8_lossy(bytes).into_owned())
            }
        };
        if let Some(text) = text {
            tracing::error!("HLSL compilation failed: {text}");
            return Err(ShaderCrossError::CompilationFailed(text));
        }
    }

    let blob = get_output::<IDxcBlob>(&result, DXC_OUT_OBJECT, &IID_IDXC_BLOB).ok_or_else(
        || ShaderCrossError::CompilationFailed("HLSL compilation produced no object blob".into()),
    )?;

    let bytes = unsafe {
        let blob_ptr = blob.as_ptr();
        let size = ((*(*blob_ptr).vtbl).get_buffer_size)(blob_ptr);
        let data = ((*(*blob_ptr).vtbl).get_buffer_pointer)(blob_ptr);
        std::slice::from_raw_parts(data.cast::<u8>(), size).to_vec()
    };
    Ok(bytes)
}

/// Fetches one typed output from an `IDxcResult`, or `None` when absent.
fn get_output<T>(result: &ComPtr<IDxcResult>, kind: u32, iid: &Guid) -> Option<ComPtr<T>> {
    let mut out: *mut c_void = ptr::null_mut();
    unsafe {
        let result_ptr = result.as_ptr();
        let status =
            ((*(*result_ptr).vtbl).get_output)(result_ptr, kind, iid, &mut out, ptr::null_mut());
        if status < 0 {
            return None;
        }
        ComPtr::from_raw(out.cast())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn args_for_plain_vertex_dxil() {
        let args = build_args("main", None, &[], ShaderStage::Vertex, DxcOutputKind::Dxil, false);
        assert_eq!(args, ["-E", "main", "-T", "vs_6_0"]);
    }

    #[test]
    fn args_include_every_option() {
        let args = build_args(
            "entry",
            Some(Path::new("shaders/include")),
            &["FOO=1".to_owned(), "BAR".to_owned()],
            ShaderStage::Compute,
            DxcOutputKind::Spirv,
            true,
        );
        assert_eq!(
            args,
            [
                "-E",
                "entry",
                "-T",
                "cs_6_0",
                "-I",
                "shaders/include",
                "-spirv",
                "-DFOO=1",
                "-DBAR",
                "-Od",
            ]
        );
    }

    #[test]
    fn wide_encoding_is_nul_terminated() {
        assert_eq!(to_wide("-E"), vec![0x2D, 0x45, 0]);
    }
}
