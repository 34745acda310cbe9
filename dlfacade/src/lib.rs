// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

//! A small facade over the host's dynamic loader.
//!
//! Open shared libraries, ask whether one is already mapped, resolve
//! exported symbols and release libraries again, with every outcome reduced
//! to a [`Status`].
//!
//! ```no_run
//! use dlfacade::{OpenFlag, Outcome, Status};
//!
//! let library = dlfacade::open("libcollaborator.so", &[OpenFlag::LazyBinding])?;
//! assert_eq!(dlfacade::is_loaded("libcollaborator.so", &[]), Status::Loaded);
//!
//! let symbol = library.resolve_symbol("first_file_func");
//! assert_eq!(symbol.status(), Status::SymbolResolved);
//! let first_file_func: extern "C" fn(i32) -> i32 = unsafe { symbol?.cast() };
//! println!("{}", first_file_func(5));
//!
//! library.close();
//! # Ok::<(), dlfacade::Error>(())
//! ```

pub mod api;
mod error;
pub mod flags;
pub mod host;
mod loader;

pub use dlfacade_proc_macro::symbol_table;
pub use dlopen2;

pub use error::{Error, Outcome, Status};
pub use flags::{resolve_flags, OpenFlag};
pub use host::{HostLoader, RawHandle, SystemLoader};
pub use loader::{close, is_loaded, is_loaded_with, open, Library, Symbol};

pub type Result<T> = std::result::Result<T, Error>;
