// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

//! Compiles the C shared objects the dlfacade integration tests load.
//!
//! Lives in a dev-only crate so that depending on dlfacade never needs a
//! C compiler.
//!
//! Each load-state-sensitive test gets its own copy of the collaborator so
//! that tests running in parallel never share a host reference count.

use std::env;
use std::path::{Path, PathBuf};

/// One copy of `fixtures/collaborator.c` per entry, exported to the crate
/// as `DLFACADE_FIXTURE_<NAME>` and re-exported from `lib.rs`.
const COLLABORATOR_COPIES: &[&str] = &[
    "shared",
    "lifecycle",
    "refcount",
    "untouched",
    "slot",
    "table",
];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=fixtures/collaborator.c");
    println!("cargo:rerun-if-changed=fixtures/versioned.c");
    println!("cargo:rerun-if-changed=fixtures/versioned.map");

    // The fixtures rely on ELF visibility and GNU symbol versioning.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("linux") {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));
    let fixtures = manifest_dir.join("fixtures");

    for name in COLLABORATOR_COPIES {
        let out = out_dir.join(format!("libcollaborator_{name}.so"));
        shared_object(&fixtures.join("collaborator.c"), &out, &[]);
        export_path(name, &out);
    }

    let version_script = format!(
        "-Wl,--version-script={}",
        fixtures.join("versioned.map").display()
    );
    let out = out_dir.join("libversioned.so");
    shared_object(&fixtures.join("versioned.c"), &out, &[&version_script]);
    export_path("versioned", &out);
}

/// Link `src` into a shared object at `out` with the detected C compiler.
fn shared_object(src: &Path, out: &Path, extra: &[&str]) {
    let compiler = cc::Build::new().pic(true).get_compiler();
    let status = compiler
        .to_command()
        .arg("-shared")
        .arg("-o")
        .arg(out)
        .arg(src)
        .args(extra)
        .status()
        .unwrap_or_else(|e| panic!("failed to run the C compiler for {}: {e}", src.display()));

    if !status.success() {
        panic!("building {} failed with {status}", out.display());
    }
}

fn export_path(name: &str, path: &Path) {
    println!(
        "cargo:rustc-env=DLFACADE_FIXTURE_{}={}",
        name.to_uppercase(),
        path.display()
    );
}
