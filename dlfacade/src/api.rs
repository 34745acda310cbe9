// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

use std::{path::Path, sync::Arc};

use dlopen2::wrapper::{Container, WrapperApi};
use tracing::debug;

use crate::loader::c_path;
use crate::{Error, Result};

pub type ApiHandle<T> = Arc<Container<T>>;

/// Load the library at `path_to_so_file` and bind every entry of the
/// symbol table `T` at once. Any missing entry fails the whole load.
pub fn load_api<T: WrapperApi>(path_to_so_file: impl AsRef<Path>) -> Result<ApiHandle<T>> {
    let path = path_to_so_file.as_ref();
    // The host reads the path only up to the first NUL byte.
    if c_path(path).is_none() {
        debug!(path = %path.display(), "library path contains a NUL byte");
        return Err(Error::Open {
            path: path.display().to_string(),
        });
    }
    let container = unsafe { Container::<T>::load(path.as_os_str()) }?;
    debug!(path = %path.display(), "bound symbol table");
    Ok(Arc::new(container))
}
