// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

//! Binding-mode flags and their host encoding.

use std::os::raw::c_int;

/// Binding modes accepted by [`crate::open`] and [`crate::is_loaded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenFlag {
    /// Resolve external references on first use (`RTLD_LAZY`).
    LazyBinding,
    /// Resolve every external reference while loading (`RTLD_NOW`).
    ImmediateBinding,
}

impl OpenFlag {
    /// The host bit this flag contributes.
    pub const fn native(self) -> c_int {
        match self {
            OpenFlag::LazyBinding => libc::RTLD_LAZY,
            OpenFlag::ImmediateBinding => libc::RTLD_NOW,
        }
    }
}

/// Only return a handle when the library is already mapped.
pub const NO_LOAD: c_int = libc::RTLD_NOLOAD;

/// Bits that select a binding mode.
pub const BINDING_MASK: c_int = libc::RTLD_LAZY | libc::RTLD_NOW;

/// Combine `flags` into the host's bitmask.
///
/// An empty slice yields `0`, which leaves the binding mode to the host.
/// Duplicates and ordering do not change the result.
pub fn resolve_flags(flags: &[OpenFlag]) -> c_int {
    flags.iter().fold(0, |mask, flag| mask | flag.native())
}
