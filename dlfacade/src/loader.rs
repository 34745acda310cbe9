// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

//! Open, probe, resolve and close on top of a [`HostLoader`].

use std::ffi::{c_void, CString};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

use tracing::{debug, warn};

use crate::flags::{resolve_flags, OpenFlag, NO_LOAD};
use crate::host::{HostLoader, RawHandle, SystemLoader};
use crate::{Error, Result, Status};

/// One reference to a shared library mapped into this process.
///
/// Dropping the library releases the reference; the host unmaps the
/// library once every reference is gone. Opening the same path twice
/// yields two independent references that must each be released.
///
/// A closed library cannot be used again, nor can symbols resolved from it:
///
/// ```compile_fail
/// let library = dlfacade::open("libm.so.6", &[dlfacade::OpenFlag::LazyBinding])?;
/// let cos = library.resolve_symbol("cos")?;
/// library.close();
/// let _ = cos.as_ptr();
/// # Ok::<(), dlfacade::Error>(())
/// ```
pub struct Library<H: HostLoader = SystemLoader> {
    raw: RawHandle,
    path: PathBuf,
    host: H,
}

impl Library {
    pub fn open(path: impl AsRef<Path>, flags: &[OpenFlag]) -> Result<Self> {
        Self::open_with(SystemLoader, path, flags)
    }
}

impl<H: HostLoader> Library<H> {
    /// Open `path` through `host`.
    ///
    /// `path` is either absolute or a bare file name left to the host's
    /// search rules. Flags only take effect when this call maps the library
    /// fresh; an already mapped library keeps its original binding mode.
    pub fn open_with(host: H, path: impl AsRef<Path>, flags: &[OpenFlag]) -> Result<Self> {
        let path = path.as_ref();
        let mode = resolve_flags(flags);
        let open_error = || Error::Open {
            path: path.display().to_string(),
        };

        let Some(c_path) = c_path(path) else {
            debug!(path = %path.display(), "library path contains a NUL byte");
            return Err(open_error());
        };

        match host.open(&c_path, mode) {
            Some(raw) => {
                debug!(path = %path.display(), mode, "opened shared library");
                Ok(Library {
                    raw,
                    path: path.to_path_buf(),
                    host,
                })
            }
            None => {
                debug!(
                    path = %path.display(),
                    mode,
                    host_error = ?host.last_error(),
                    "failed to open shared library"
                );
                Err(open_error())
            }
        }
    }

    /// Look up the exported entity `name`.
    ///
    /// Entities built with hidden visibility are not found.
    pub fn resolve_symbol(&self, name: &str) -> Result<Symbol<'_>> {
        let resolve_error = || Error::SymbolResolution {
            name: name.to_string(),
        };
        let c_name = CString::new(name).map_err(|_| resolve_error())?;

        match self.host.symbol(self.raw, &c_name) {
            Some(addr) => {
                debug!(path = %self.path.display(), symbol = name, "resolved symbol");
                Ok(Symbol::new(addr))
            }
            None => {
                debug!(
                    path = %self.path.display(),
                    symbol = name,
                    host_error = ?self.host.last_error(),
                    "failed to resolve symbol"
                );
                Err(resolve_error())
            }
        }
    }

    /// Look up `name` at symbol version `version` rather than the default.
    pub fn resolve_versioned_symbol(&self, name: &str, version: &str) -> Result<Symbol<'_>> {
        let resolve_error = || Error::VersionedSymbolResolution {
            name: name.to_string(),
            version: version.to_string(),
        };
        let (Ok(c_name), Ok(c_version)) = (CString::new(name), CString::new(version)) else {
            return Err(resolve_error());
        };

        match self.host.versioned_symbol(self.raw, &c_name, &c_version) {
            Some(addr) => {
                debug!(path = %self.path.display(), symbol = name, version, "resolved symbol");
                Ok(Symbol::new(addr))
            }
            None => {
                debug!(
                    path = %self.path.display(),
                    symbol = name,
                    version,
                    host_error = ?self.host.last_error(),
                    "failed to resolve versioned symbol"
                );
                Err(resolve_error())
            }
        }
    }

    pub fn raw_handle(&self) -> RawHandle {
        self.raw
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release this reference.
    pub fn close(self) {
        drop(self);
    }
}

impl<H: HostLoader> Drop for Library<H> {
    fn drop(&mut self) {
        let rc = self.host.close(self.raw);
        if rc != 0 {
            warn!(
                path = %self.path.display(),
                rc,
                host_error = ?self.host.last_error(),
                "closing shared library failed"
            );
        } else {
            debug!(path = %self.path.display(), "closed shared library");
        }
    }
}

impl<H: HostLoader> fmt::Debug for Library<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("path", &self.path)
            .field("raw", &self.raw)
            .finish()
    }
}

/// Address of an exported entity, valid while its library is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol<'lib> {
    addr: NonNull<c_void>,
    _library: PhantomData<&'lib ()>,
}

impl Symbol<'_> {
    fn new(addr: NonNull<c_void>) -> Self {
        Symbol {
            addr,
            _library: PhantomData,
        }
    }

    pub fn as_ptr(&self) -> *mut c_void {
        self.addr.as_ptr()
    }

    /// Reinterpret the address as `T`, typically an `extern "C" fn` pointer.
    ///
    /// # Safety
    ///
    /// `T` must match the exported entity's actual type and calling
    /// convention. Nothing about the signature is known here. The returned
    /// value is not tied to the library's lifetime and must not be used
    /// once the library is closed.
    ///
    /// # Panics
    ///
    /// If `T` is not pointer sized.
    pub unsafe fn cast<T: Copy>(&self) -> T {
        assert_eq!(
            mem::size_of::<T>(),
            mem::size_of::<*mut c_void>(),
            "symbols can only be cast to pointer-sized types"
        );
        unsafe { mem::transmute_copy(&self.addr.as_ptr()) }
    }
}

/// Open `path` with the system loader.
pub fn open(path: impl AsRef<Path>, flags: &[OpenFlag]) -> Result<Library> {
    Library::open(path, flags)
}

/// Whether `path` is already mapped into this process.
///
/// Never maps the library. A reference taken by the lookup is released
/// before returning, so the load state is unchanged.
pub fn is_loaded(path: impl AsRef<Path>, flags: &[OpenFlag]) -> Status {
    is_loaded_with(&SystemLoader, path, flags)
}

pub fn is_loaded_with<H: HostLoader>(
    host: &H,
    path: impl AsRef<Path>,
    flags: &[OpenFlag],
) -> Status {
    let path = path.as_ref();
    let Some(c_path) = c_path(path) else {
        return Status::NotLoaded;
    };

    match host.open(&c_path, resolve_flags(flags) | NO_LOAD) {
        Some(raw) => {
            let rc = host.close(raw);
            if rc != 0 {
                warn!(path = %path.display(), rc, "releasing probe reference failed");
            }
            debug!(path = %path.display(), "library is loaded");
            Status::Loaded
        }
        None => {
            debug!(path = %path.display(), "library is not loaded");
            Status::NotLoaded
        }
    }
}

/// Close the library held in `slot`, leaving the slot empty.
///
/// # Panics
///
/// If `slot` is already empty. Closing twice is a caller bug.
pub fn close<H: HostLoader>(slot: &mut Option<Library<H>>) {
    match slot.take() {
        Some(library) => library.close(),
        None => panic!("close called on an empty library slot"),
    }
}

pub(crate) fn c_path(path: &Path) -> Option<CString> {
    CString::new(path.as_os_str().as_bytes()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::fake::FakeHost;
    use crate::Outcome;

    const LIB: &str = "/opt/demo/libcollaborator.so";
    const EXPORTS: &[&str] = &["first_file_func", "second_file_C_style_func"];

    fn host() -> FakeHost {
        FakeHost::with_library(LIB, EXPORTS)
    }

    #[test]
    fn test_open_missing_library_fails() {
        let host = host();
        let result = Library::open_with(host.clone(), "/opt/demo/libabsent.so", &[]);
        assert!(matches!(result, Err(Error::Open { .. })));
        assert_eq!(result.status(), Status::OpenFail);
        assert_eq!(host.0.borrow().closes, 0);
    }

    #[test]
    fn test_open_takes_and_drop_releases_a_reference() {
        let host = host();
        let library = Library::open_with(host.clone(), LIB, &[OpenFlag::LazyBinding]).unwrap();
        assert_eq!(host.refcount(LIB), 1);
        assert_eq!(host.0.borrow().modes, vec![libc::RTLD_LAZY]);
        assert_eq!(library.path(), Path::new(LIB));

        drop(library);
        assert_eq!(host.refcount(LIB), 0);
    }

    #[test]
    fn test_open_status_is_success() {
        let result = Library::open_with(host(), LIB, &[OpenFlag::LazyBinding]);
        assert_eq!(result.status(), Status::OpenSuccess);
    }

    #[test]
    fn test_nul_in_path_never_reaches_host() {
        let host = host();
        let result = Library::open_with(host.clone(), "lib\0collaborator.so", &[]);
        assert_eq!(result.status(), Status::OpenFail);
        assert!(host.0.borrow().modes.is_empty());
    }

    #[test]
    fn test_second_open_survives_first_close() {
        let host = host();
        let first = Library::open_with(host.clone(), LIB, &[OpenFlag::LazyBinding]).unwrap();
        let second = Library::open_with(host.clone(), LIB, &[OpenFlag::ImmediateBinding]).unwrap();
        assert_eq!(first.raw_handle(), second.raw_handle());
        assert_eq!(host.refcount(LIB), 2);

        first.close();
        assert_eq!(host.refcount(LIB), 1);
        assert_eq!(is_loaded_with(&host, LIB, &[]), Status::Loaded);
        assert!(second.resolve_symbol("first_file_func").is_ok());

        second.close();
        assert_eq!(is_loaded_with(&host, LIB, &[]), Status::NotLoaded);
    }

    #[test]
    fn test_probe_never_maps_and_leaves_count_unchanged() {
        let host = host();
        assert_eq!(
            is_loaded_with(&host, LIB, &[OpenFlag::LazyBinding]),
            Status::NotLoaded
        );
        assert_eq!(host.refcount(LIB), 0);
        assert_eq!(host.0.borrow().modes, vec![libc::RTLD_LAZY | NO_LOAD]);

        let _library = Library::open_with(host.clone(), LIB, &[OpenFlag::LazyBinding]).unwrap();
        let flag_sets: [&[OpenFlag]; 3] = [
            &[],
            &[OpenFlag::LazyBinding],
            &[OpenFlag::ImmediateBinding],
        ];
        for flags in flag_sets {
            assert_eq!(is_loaded_with(&host, LIB, flags), Status::Loaded);
            assert_eq!(host.refcount(LIB), 1);
        }
        assert_eq!(host.0.borrow().closes, 3);
    }

    #[test]
    fn test_probe_with_nul_in_path_never_reaches_host() {
        let host = host();
        let _library = Library::open_with(host.clone(), LIB, &[]).unwrap();
        host.0.borrow_mut().modes.clear();

        let path = format!("{LIB}\0/opt/demo/libother.so");
        assert_eq!(
            is_loaded_with(&host, path, &[OpenFlag::LazyBinding]),
            Status::NotLoaded
        );
        assert!(host.0.borrow().modes.is_empty());
        assert_eq!(host.0.borrow().closes, 0);
    }

    #[test]
    fn test_probe_of_unknown_path() {
        assert_eq!(
            is_loaded_with(&host(), "libnever.so", &[OpenFlag::LazyBinding]),
            Status::NotLoaded
        );
    }

    #[test]
    fn test_resolve_symbol() {
        let library = Library::open_with(host(), LIB, &[OpenFlag::LazyBinding]).unwrap();

        let found = library.resolve_symbol("second_file_C_style_func");
        assert_eq!(found.status(), Status::SymbolResolved);
        assert!(!found.unwrap().as_ptr().is_null());

        let missing = library.resolve_symbol("first_file_hidden_func");
        assert!(matches!(missing, Err(Error::SymbolResolution { .. })));
        assert_eq!(missing.status(), Status::SymbolFail);

        let nul = library.resolve_symbol("first\0file_func");
        assert_eq!(nul.status(), Status::SymbolFail);
    }

    #[test]
    fn test_versioned_lookup_unsupported_by_host() {
        let library = Library::open_with(host(), LIB, &[]).unwrap();
        let result = library.resolve_versioned_symbol("first_file_func", "V1");
        assert!(matches!(
            result,
            Err(Error::VersionedSymbolResolution { .. })
        ));
    }

    #[test]
    fn test_close_empties_slot() {
        let host = host();
        let mut slot = Some(Library::open_with(host.clone(), LIB, &[]).unwrap());
        close(&mut slot);
        assert!(slot.is_none());
        assert_eq!(host.refcount(LIB), 0);
    }

    #[test]
    #[should_panic(expected = "empty library slot")]
    fn test_close_twice_is_rejected() {
        let mut slot = Some(Library::open_with(host(), LIB, &[]).unwrap());
        close(&mut slot);
        close(&mut slot);
    }

    #[test]
    #[should_panic(expected = "pointer-sized")]
    fn test_cast_rejects_wrong_size() {
        let library = Library::open_with(host(), LIB, &[]).unwrap();
        let symbol = library.resolve_symbol("first_file_func").unwrap();
        let _: [usize; 2] = unsafe { symbol.cast() };
    }
}
