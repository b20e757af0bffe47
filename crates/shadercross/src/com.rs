//! Minimal COM plumbing for the DXC interface tables.
//!
//! The DXC library is consumed through manually written virtual-method tables
//! matching its binary ABI. Every interface starts with the `IUnknown`
//! triplet, which is all [`ComPtr`] needs to release an object on drop.

use std::ffi::c_void;
use std::ptr::NonNull;

/// Win32 `HRESULT`: negative values signal failure.
pub(crate) type Hresult = i32;

/// A COM interface/class identifier in its canonical struct layout.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub(crate) struct Guid {
    pub data1: u32,
    pub data2: u16,
    pub data3: u16,
    pub data4: [u8; 8],
}

/// The leading three entries of every COM vtable.
#[repr(C)]
pub(crate) struct IUnknownVtbl {
    pub query_interface:
        unsafe extern "system" fn(*mut IUnknown, *const Guid, *mut *mut c_void) -> Hresult,
    pub add_ref: unsafe extern "system" fn(*mut IUnknown) -> u32,
    pub release: unsafe extern "system" fn(*mut IUnknown) -> u32,
}

#[repr(C)]
pub(crate) struct IUnknown {
    pub vtbl: *const IUnknownVtbl,
}

/// Owned reference to a COM object; calls `Release` exactly once on drop.
///
/// `T` must be a `#[repr(C)]` interface struct whose vtable begins with
/// [`IUnknownVtbl`].
pub(crate) struct ComPtr<T> {
    ptr: NonNull<T>,
}

impl<T> ComPtr<T> {
    /// Takes ownership of `ptr` (the caller's reference count transfers to
    /// the returned value). Returns `None` for null.
    pub(crate) unsafe fn from_raw(ptr: *mut T) -> Option<Self> {
        NonNull::new(ptr).map(|ptr| Self { ptr })
    }

    pub(crate) fn as_ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }
}

impl<T> Drop for ComPtr<T> {
    fn drop(&mut self) {
        // Every interface we wrap leads with the IUnknown vtable, so the
        // release slot is at a fixed offset regardless of T.
        unsafe {
            let unknown = self.ptr.as_ptr() as *mut IUnknown;
            ((*(*unknown).vtbl).release)(unknown);
        }
    }
}
