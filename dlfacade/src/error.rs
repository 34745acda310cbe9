// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

use crate::loader::{Library, Symbol};
use crate::HostLoader;

/// Outcome codes of the loader operations.
///
/// Each operation reports from its own pair: open uses `OpenSuccess` and
/// `OpenFail`, the probe uses `Loaded` and `NotLoaded`, symbol resolution
/// uses `SymbolResolved` and `SymbolFail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    OpenSuccess,
    OpenFail,
    Loaded,
    NotLoaded,
    SymbolResolved,
    SymbolFail,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not found, not a shared object, or a dependency failed to load.
    #[error("could not open shared library {path:?}")]
    Open { path: String },

    /// Not exported, or exported with hidden visibility.
    #[error("symbol {name:?} could not be resolved")]
    SymbolResolution { name: String },

    #[error("symbol {name:?} with version {version:?} could not be resolved")]
    VersionedSymbolResolution { name: String, version: String },

    #[error(transparent)]
    Api(#[from] dlopen2::Error),
}

impl Error {
    pub fn status(&self) -> Status {
        match self {
            Error::Open { .. } => Status::OpenFail,
            Error::SymbolResolution { .. } | Error::VersionedSymbolResolution { .. } => {
                Status::SymbolFail
            }
            Error::Api(dlopen2::Error::OpeningLibraryError(_)) => Status::OpenFail,
            Error::Api(_) => Status::SymbolFail,
        }
    }
}

/// Status view of an operation's tagged result.
pub trait Outcome {
    fn status(&self) -> Status;
}

impl<H: HostLoader> Outcome for Result<Library<H>, Error> {
    fn status(&self) -> Status {
        match self {
            Ok(_) => Status::OpenSuccess,
            Err(e) => e.status(),
        }
    }
}

impl Outcome for Result<Symbol<'_>, Error> {
    fn status(&self) -> Status {
        match self {
            Ok(_) => Status::SymbolResolved,
            Err(e) => e.status(),
        }
    }
}
