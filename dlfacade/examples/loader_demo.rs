// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

//! Open a collaborator library, probe it, call two of its functions and
//! close it again.
//!
//! ```text
//! cargo run --example loader_demo -- /path/to/libcollaborator.so
//! ```

use std::os::raw::c_int;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use dlfacade::api::load_api;
use dlfacade::{symbol_table, OpenFlag, Outcome, Status};
use dlopen2::wrapper::WrapperApi;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

type LibFunc = unsafe extern "C" fn(c_int) -> c_int;

symbol_table! {
    struct CollaboratorApi;

    unsafe extern "C" {
        pub fn first_file_func(num: c_int) -> c_int;
        pub fn second_file_C_style_func(num: c_int) -> c_int;
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Binding {
    /// Resolve symbols on first use.
    Lazy,
    /// Resolve every symbol while loading.
    Immediate,
}

#[derive(Debug, Parser)]
#[command(version, about = "Exercise the loader facade against a shared library")]
struct Opts {
    /// Absolute path or bare file name of the library to load.
    #[arg(env = "DLFACADE_LIBRARY")]
    library: PathBuf,

    #[arg(long, value_enum, default_value_t = Binding::Lazy)]
    binding: Binding,
}

impl Opts {
    fn flags(&self) -> Vec<OpenFlag> {
        match self.binding {
            Binding::Lazy => vec![OpenFlag::LazyBinding],
            Binding::Immediate => vec![OpenFlag::ImmediateBinding],
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error(transparent)]
    Loader(#[from] dlfacade::Error),

    #[error("{path} opened but the loader does not report it as loaded")]
    NotLoadedAfterOpen { path: String },
}

impl DemoError {
    fn status(&self) -> Status {
        match self {
            DemoError::Loader(e) => e.status(),
            DemoError::NotLoadedAfterOpen { .. } => Status::NotLoaded,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opts = Opts::parse();
    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(status = ?e.status(), "{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(opts: &Opts) -> Result<(), DemoError> {
    let flags = opts.flags();
    info!(library = %opts.library.display(), ?flags, "opening library");

    let opened = dlfacade::open(&opts.library, &flags);
    info!(status = ?opened.status(), "open");
    let library = opened?;

    let probe = dlfacade::is_loaded(&opts.library, &flags);
    info!(status = ?probe, "probe after open");
    if probe != Status::Loaded {
        return Err(DemoError::NotLoadedAfterOpen {
            path: opts.library.display().to_string(),
        });
    }

    let first = library.resolve_symbol("first_file_func");
    info!(status = ?first.status(), "resolve first_file_func");
    let first: LibFunc = unsafe { first?.cast() };

    // second_file_func is name-mangled; only the extern "C" variant has a stable name.
    let second = library.resolve_symbol("second_file_C_style_func");
    info!(status = ?second.status(), "resolve second_file_C_style_func");
    let second: LibFunc = unsafe { second?.cast() };

    println!("first_file_func(5): {}", unsafe { first(5) });
    println!("second_file_C_style_func(6): {}", unsafe { second(6) });

    let api = load_api::<CollaboratorApi>(&opts.library)?;
    println!("table first_file_func(5): {}", unsafe { api.first_file_func(5) });
    println!(
        "table second_file_C_style_func(6): {}",
        unsafe { api.second_file_c_style_func(6) }
    );
    drop(api);

    let mut handle = Some(library);
    dlfacade::close(&mut handle);
    let probe = dlfacade::is_loaded(&opts.library, &flags);
    if probe == Status::Loaded {
        info!("library is still mapped by another owner");
    }
    info!(status = ?probe, "probe after close");

    Ok(())
}
