//! Driver for the legacy HLSL compiler (`D3DCompile`, shader model 5.x).
//!
//! On Windows this is `d3dcompiler_47.dll`; elsewhere vkd3d-utils provides the
//! same entry point but with the Microsoft calling convention, so the
//! function and blob types are declared per target ABI.

use std::ffi::{c_char, c_void, CString};
use std::ptr;

use libloading::Library;
use shadercross_reflect::ShaderStage;

use crate::error::{Result, ShaderCrossError};
use crate::formats::ShaderModel;

const D3DCOMPILE_DEBUG: u32 = 1 << 0;
const D3DCOMPILE_SKIP_OPTIMIZATION: u32 = 1 << 2;

// `D3DCompile` and the blobs it returns use __stdcall on Windows; vkd3d-utils
// keeps the Microsoft ABI on other hosts, which Rust spells `extern "win64"`
// on x86_64 (the two ABIs coincide on aarch64).
macro_rules! declare_fxc_abi {
    ($abi:literal) => {
        /// `D3DCompile` entry point.
        pub(crate) type D3DCompileFn = unsafe extern $abi fn(
            *const c_void,  // pSrcData
            usize,          // SrcDataSize
            *const c_char,  // pSourceName
            *const c_void,  // pDefines
            *const c_void,  // pInclude
            *const c_char,  // pEntrypoint
            *const c_char,  // pTarget
            u32,            // Flags1
            u32,            // Flags2
            *mut *mut ID3DBlob,
            *mut *mut ID3DBlob,
        ) -> i32;

        #[repr(C)]
        pub(crate) struct ID3DBlobVtbl {
            query_interface:
                unsafe extern $abi fn(*mut ID3DBlob, *const c_void, *mut *mut c_void) -> i32,
            add_ref: unsafe extern $abi fn(*mut ID3DBlob) -> u32,
            release: unsafe extern $abi fn(*mut ID3DBlob) -> u32,
            get_buffer_pointer: unsafe extern $abi fn(*mut ID3DBlob) -> *mut c_void,
            get_buffer_size: unsafe extern $abi fn(*mut ID3DBlob) -> usize,
        }
    };
}

#[cfg(windows)]
declare_fxc_abi!("system");
#[cfg(all(not(windows), target_arch = "x86_64"))]
declare_fxc_abi!("win64");
#[cfg(all(not(windows), not(target_arch = "x86_64")))]
declare_fxc_abi!("C");

#[repr(C)]
pub(crate) struct ID3DBlob {
    vtbl: *const ID3DBlobVtbl,
}

/// Owned `ID3DBlob`; released on drop.
struct D3dBlob {
    ptr: *mut ID3DBlob,
}

impl D3dBlob {
    unsafe fn from_raw(ptr: *mut ID3DBlob) -> Option<Self> {
        if ptr.is_null() {
            None
        } else {
            Some(Self { ptr })
        }
    }

    fn bytes(&self) -> &[u8] {
        unsafe {
            let size = ((*(*self.ptr).vtbl).get_buffer_size)(self.ptr);
            let data = ((*(*self.ptr).vtbl).get_buffer_pointer)(self.ptr);
            std::slice::from_raw_parts(data.cast::<u8>(), size)
        }
    }

    fn text(&self) -> String {
        let bytes = self.bytes();
        // Error blobs are NUL-terminated C strings.
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }
}

impl Drop for D3dBlob {
    fn drop(&mut self) {
        unsafe {
            ((*(*self.ptr).vtbl).release)(self.ptr);
        }
    }
}

/// The loaded legacy compiler library and its entry point.
pub(crate) struct FxcBackend {
    _library: Library,
    d3d_compile: D3DCompileFn,
}

impl FxcBackend {
    pub(crate) fn new(library: Library, d3d_compile: D3DCompileFn) -> Self {
        Self {
            _library: library,
            d3d_compile,
        }
    }
}

/// Compiles HLSL source to DXBC through `D3DCompile`.
pub(crate) fn compile_hlsl(
    backend: &FxcBackend,
    source: &str,
    entrypoint: &str,
    stage: ShaderStage,
    shader_model: ShaderModel,
    debug: bool,
) -> Result<Vec<u8>> {
    let profile = shader_model.profile(stage);
    let entrypoint = CString::new(entrypoint).map_err(|_| {
        ShaderCrossError::CompilationFailed("entrypoint contains an interior NUL byte".into())
    })?;
    let profile = CString::new(profile).expect("profile strings contain no NUL");
    let flags = if debug {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    };

    let mut code_ptr: *mut ID3DBlob = ptr::null_mut();
    let mut errors_ptr: *mut ID3DBlob = ptr::null_mut();
    let status = unsafe {
        (backend.d3d_compile)(
            source.as_ptr().cast(),
            source.len(),
            ptr::null(),
            ptr::null(),
            ptr::null(),
            entrypoint.as_ptr(),
            profile.as_ptr(),
            flags,
            0,
            &mut code_ptr,
            &mut errors_ptr,
        )
    };
    let code = unsafe { D3dBlob::from_raw(code_ptr) };
    let errors = unsafe { D3dBlob::from_raw(errors_ptr) };

    if status < 0 {
        let message = errors
            .map(|blob| blob.text())
            .unwrap_or_else(|| format!("D3DCompile failed: {status:#010X}"));
        tracing::error!("HLSL compilation failed: {message}");
        return Err(ShaderCrossError::CompilationFailed(message));
    }

    let code = code.ok_or_else(|| {
        ShaderCrossError::CompilationFailed("D3DCompile returned no code blob".into())
    })?;
    Ok(code.bytes().to_vec())
}
