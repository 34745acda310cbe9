// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

//! Paths of the C shared objects compiled by this crate's build script.
//!
//! Each copy of the collaborator is a distinct file, so the host loader
//! keeps a separate reference count for each.

/// C source of the collaborator; not a shared object.
pub const COLLABORATOR_SOURCE: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/collaborator.c");

#[cfg(target_os = "linux")]
pub const SHARED: &str = env!("DLFACADE_FIXTURE_SHARED");
#[cfg(target_os = "linux")]
pub const LIFECYCLE: &str = env!("DLFACADE_FIXTURE_LIFECYCLE");
#[cfg(target_os = "linux")]
pub const REFCOUNT: &str = env!("DLFACADE_FIXTURE_REFCOUNT");
#[cfg(target_os = "linux")]
pub const UNTOUCHED: &str = env!("DLFACADE_FIXTURE_UNTOUCHED");
#[cfg(target_os = "linux")]
pub const SLOT: &str = env!("DLFACADE_FIXTURE_SLOT");
#[cfg(target_os = "linux")]
pub const TABLE: &str = env!("DLFACADE_FIXTURE_TABLE");

/// Exports `lib_file_func_1` at `LIBSHAREDLIB_1.0.0` and, as the default,
/// at `LIBSHAREDLIB_2.0.0`.
#[cfg(target_os = "linux")]
pub const VERSIONED: &str = env!("DLFACADE_FIXTURE_VERSIONED");
