//! Discovery and binding of the native compiler libraries.
//!
//! [`ShaderCross`] is the explicit context object every translation call
//! receives: it is built once (typically by the CLI or the embedding
//! application), holds the loaded libraries and their resolved entry points,
//! and is read-only afterwards, which makes the translation operations safe
//! to call from multiple threads. Construction and drop must not race any
//! other use.

use libloading::Library;
use shadercross_reflect::BindingConvention;

use crate::dxc::{DxcBackend, DxcCreateInstanceFn};
use crate::error::{Result, ShaderCrossError};
use crate::formats::ShaderFormats;
use crate::fxc::{D3DCompileFn, FxcBackend};
use crate::spvc::{ffi::SpvcApi, SpvcBackend};

#[cfg(target_os = "windows")]
const DXCOMPILER_LIBRARY: &str = "dxcompiler.dll";
#[cfg(target_os = "macos")]
const DXCOMPILER_LIBRARY: &str = "libdxcompiler.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const DXCOMPILER_LIBRARY: &str = "libdxcompiler.so";

#[cfg(target_os = "windows")]
const DXIL_LIBRARY: &str = "dxil.dll";
#[cfg(target_os = "macos")]
const DXIL_LIBRARY: &str = "libdxil.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const DXIL_LIBRARY: &str = "libdxil.so";

#[cfg(target_os = "windows")]
const D3DCOMPILER_LIBRARY: &str = "d3dcompiler_47.dll";
#[cfg(target_os = "macos")]
const D3DCOMPILER_LIBRARY: &str = "libvkd3d-utils.1.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const D3DCOMPILER_LIBRARY: &str = "libvkd3d-utils.so.1";

#[cfg(target_os = "windows")]
const SPIRV_CROSS_LIBRARY: &str = "spirv-cross-c-shared.dll";
#[cfg(target_os = "macos")]
const SPIRV_CROSS_LIBRARY: &str = "libspirv-cross-c-shared.0.dylib";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const SPIRV_CROSS_LIBRARY: &str = "libspirv-cross-c-shared.so.0";

/// The loaded backend set and the binding convention translations follow.
pub struct ShaderCross {
    pub(crate) dxc: Option<DxcBackend>,
    pub(crate) fxc: Option<FxcBackend>,
    pub(crate) spvc: Option<SpvcBackend>,
    /// The DXIL signing library was found on the search path. Without it the
    /// DXC output would not validate, so the DXIL capability is withheld even
    /// when the compiler itself loaded.
    pub(crate) dxil_signer_present: bool,
    convention: BindingConvention,
}

impl ShaderCross {
    /// Loads whichever native compiler libraries are present.
    ///
    /// Never fails: a missing library only reduces the reported
    /// capabilities. Must not be called concurrently with other operations
    /// on the same process-wide library search state.
    pub fn init() -> Self {
        Self::init_with_convention(BindingConvention::default())
    }

    /// As [`ShaderCross::init`], with an explicit descriptor-set convention.
    pub fn init_with_convention(convention: BindingConvention) -> Self {
        let dxc = load_dxc();
        let dxil_signer_present = probe_dxil_signer();
        if dxc.is_some() && !dxil_signer_present {
            tracing::warn!(
                "{DXIL_LIBRARY} not found; DXIL output would not validate, disabling it"
            );
        }
        Self {
            dxc,
            fxc: load_fxc(),
            spvc: load_spvc(),
            dxil_signer_present,
            convention,
        }
    }

    /// A context with no backends loaded. Capability queries report the
    /// floor; every operation that needs a backend fails with
    /// [`ShaderCrossError::BackendUnavailable`].
    #[cfg(test)]
    pub(crate) fn unloaded() -> Self {
        Self {
            dxc: None,
            fxc: None,
            spvc: None,
            dxil_signer_present: false,
            convention: BindingConvention::default(),
        }
    }

    /// The descriptor-set convention in effect.
    pub fn convention(&self) -> BindingConvention {
        self.convention
    }

    /// The formats SPIR-V input can be translated to.
    ///
    /// SPIR-V and MSL are always reported; DXIL requires DXC plus the DXIL
    /// signing library, DXBC requires the legacy compiler.
    pub fn spirv_shader_formats(&self) -> ShaderFormats {
        let mut formats = ShaderFormats::SPIRV | ShaderFormats::MSL;
        if self.dxil_available() {
            formats |= ShaderFormats::DXIL;
        }
        if self.fxc.is_some() {
            formats |= ShaderFormats::DXBC;
        }
        formats
    }

    /// The formats HLSL input can be compiled to.
    pub fn hlsl_shader_formats(&self) -> ShaderFormats {
        let mut formats = ShaderFormats::empty();
        if self.dxc.is_some() {
            formats |= ShaderFormats::SPIRV;
        }
        if self.dxil_available() {
            formats |= ShaderFormats::DXIL;
        }
        if self.fxc.is_some() {
            formats |= ShaderFormats::DXBC;
        }
        formats
    }

    pub(crate) fn dxil_available(&self) -> bool {
        self.dxc.is_some() && self.dxil_signer_present
    }

    pub(crate) fn dxc(&self) -> Result<&DxcBackend> {
        self.dxc
            .as_ref()
            .ok_or(ShaderCrossError::BackendUnavailable { backend: "DXC" })
    }

    pub(crate) fn dxc_for_dxil(&self) -> Result<&DxcBackend> {
        if !self.dxil_signer_present {
            return Err(ShaderCrossError::BackendUnavailable { backend: "DXIL" });
        }
        self.dxc()
    }

    pub(crate) fn fxc(&self) -> Result<&FxcBackend> {
        self.fxc
            .as_ref()
            .ok_or(ShaderCrossError::BackendUnavailable { backend: "FXC" })
    }

    pub(crate) fn spvc(&self) -> Result<&SpvcBackend> {
        self.spvc
            .as_ref()
            .ok_or(ShaderCrossError::BackendUnavailable {
                backend: "SPIRV-Cross",
            })
    }
}

fn load_dxc() -> Option<DxcBackend> {
    // SAFETY: loading a shared library runs its initializers; the libraries
    // named here are the well-known compiler distributions.
    let library = match unsafe { Library::new(DXCOMPILER_LIBRARY) } {
        Ok(library) => library,
        Err(error) => {
            tracing::debug!("{DXCOMPILER_LIBRARY} not loaded: {error}");
            return None;
        }
    };
    let create_instance =
        match unsafe { library.get::<DxcCreateInstanceFn>(b"DxcCreateInstance\0") } {
            Ok(symbol) => *symbol,
            Err(error) => {
                tracing::warn!("{DXCOMPILER_LIBRARY} lacks DxcCreateInstance: {error}");
                return None;
            }
        };
    Some(DxcBackend::new(library, create_instance))
}

/// Checks that the DXIL signing library exists on the search path and
/// unloads it immediately; it is only ever loaded by DXC itself.
fn probe_dxil_signer() -> bool {
    match unsafe { Library::new(DXIL_LIBRARY) } {
        Ok(library) => {
            drop(library);
            true
        }
        Err(error) => {
            tracing::debug!("{DXIL_LIBRARY} not loaded: {error}");
            false
        }
    }
}

fn load_fxc() -> Option<FxcBackend> {
    let library = match unsafe { Library::new(D3DCOMPILER_LIBRARY) } {
        Ok(library) => library,
        Err(error) => {
            tracing::debug!("{D3DCOMPILER_LIBRARY} not loaded: {error}");
            return None;
        }
    };
    let d3d_compile = match unsafe { library.get::<D3DCompileFn>(b"D3DCompile\0") } {
        Ok(symbol) => *symbol,
        Err(error) => {
            tracing::warn!("{D3DCOMPILER_LIBRARY} lacks D3DCompile: {error}");
            return None;
        }
    };
    Some(FxcBackend::new(library, d3d_compile))
}

fn load_spvc() -> Option<SpvcBackend> {
    let library = match unsafe { Library::new(SPIRV_CROSS_LIBRARY) } {
        Ok(library) => library,
        Err(error) => {
            tracing::debug!("{SPIRV_CROSS_LIBRARY} not loaded: {error}");
            return None;
        }
    };
    let api = match unsafe { SpvcApi::load(&library) } {
        Ok(api) => api,
        Err(error) => {
            tracing::warn!("{SPIRV_CROSS_LIBRARY} is missing entry points: {error}");
            return None;
        }
    };
    Some(SpvcBackend::new(library, api))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_floor_without_backends() {
        let context = ShaderCross::unloaded();
        assert_eq!(
            context.spirv_shader_formats(),
            ShaderFormats::SPIRV | ShaderFormats::MSL
        );
        assert_eq!(context.hlsl_shader_formats(), ShaderFormats::empty());
    }

    #[test]
    fn dxil_needs_both_compiler_and_signer() {
        let mut context = ShaderCross::unloaded();
        context.dxil_signer_present = true;
        // The signer alone is not enough.
        assert!(!context.spirv_shader_formats().contains(ShaderFormats::DXIL));
        assert!(context.dxc_for_dxil().is_err());
    }

    #[test]
    fn context_is_shareable_across_threads() {
        // Translation and reflection take &self; the loaded state is
        // read-only after construction.
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ShaderCross>();
    }

    #[test]
    fn init_then_drop_releases_everything() {
        // Exercises the load/unload paths regardless of which libraries the
        // host actually has; libloading unloads on drop.
        let context = ShaderCross::init();
        assert!(context
            .spirv_shader_formats()
            .contains(ShaderFormats::SPIRV | ShaderFormats::MSL));
        drop(context);
    }
}
