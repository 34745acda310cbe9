// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

//! The host's loading primitive.
//!
//! Library identity and reference counting belong to the host loader. Two
//! owners of the same library each hold their own reference and must each
//! release it; nothing on this side tracks counts.

use std::ffi::{c_void, CStr};
use std::os::raw::c_int;
use std::ptr::NonNull;

use crate::flags::BINDING_MASK;

/// Opaque token for a library mapped by the host loader.
///
/// Only compared, never dereferenced. The null sentinel is `None` wherever
/// a handle may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(NonNull<c_void>);

// dlopen handles are process-global, safe to share across threads.
unsafe impl Send for RawHandle {}
unsafe impl Sync for RawHandle {}

impl RawHandle {
    pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
        NonNull::new(ptr).map(RawHandle)
    }

    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

pub trait HostLoader: Clone {
    /// Map `path` with `mode`, or take another reference if it is already
    /// mapped. `None` when the host returned no handle.
    fn open(&self, path: &CStr, mode: c_int) -> Option<RawHandle>;

    /// Address of the exported entity `name`.
    fn symbol(&self, handle: RawHandle, name: &CStr) -> Option<NonNull<c_void>>;

    /// Address of `name` at a specific symbol version.
    fn versioned_symbol(
        &self,
        _handle: RawHandle,
        _name: &CStr,
        _version: &CStr,
    ) -> Option<NonNull<c_void>> {
        None
    }

    /// Drop one reference. Returns the host's status, `0` on success.
    fn close(&self, handle: RawHandle) -> c_int;

    /// The host's description of the most recent failure, if any.
    fn last_error(&self) -> Option<String>;
}

/// The process's own dynamic loader.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoader;

impl HostLoader for SystemLoader {
    fn open(&self, path: &CStr, mode: c_int) -> Option<RawHandle> {
        // glibc refuses a mode without a binding bit; lazy is its default.
        let mode = if mode & BINDING_MASK == 0 {
            mode | libc::RTLD_LAZY
        } else {
            mode
        };
        RawHandle::from_ptr(unsafe { libc::dlopen(path.as_ptr(), mode) })
    }

    fn symbol(&self, handle: RawHandle, name: &CStr) -> Option<NonNull<c_void>> {
        NonNull::new(unsafe { libc::dlsym(handle.as_ptr(), name.as_ptr()) })
    }

    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    fn versioned_symbol(
        &self,
        handle: RawHandle,
        name: &CStr,
        version: &CStr,
    ) -> Option<NonNull<c_void>> {
        NonNull::new(unsafe { libc::dlvsym(handle.as_ptr(), name.as_ptr(), version.as_ptr()) })
    }

    fn close(&self, handle: RawHandle) -> c_int {
        unsafe { libc::dlclose(handle.as_ptr()) }
    }

    fn last_error(&self) -> Option<String> {
        let msg = unsafe { libc::dlerror() };
        if msg.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(msg) }.to_string_lossy().into_owned())
    }
}
