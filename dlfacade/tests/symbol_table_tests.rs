// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

#![cfg(target_os = "linux")]

use std::os::raw::c_int;

use dlfacade::api::load_api;
use dlfacade::{symbol_table, Status};
use dlfacade_fixtures::TABLE;
use dlopen2::wrapper::WrapperApi;

symbol_table! {
    pub struct CollaboratorApi;

    unsafe extern "C" {
        pub fn first_file_func(num: c_int) -> c_int;
        pub fn second_file_C_style_func(num: c_int) -> c_int;
        fn first_file_hidden_func(num: c_int) -> c_int;
    }
}

symbol_table! {
    struct HiddenApi;

    unsafe extern "C" {
        pub fn first_file_hidden_func(num: c_int) -> c_int;
    }
}

#[test]
fn test_table_binds_exported_functions() {
    let api = load_api::<CollaboratorApi>(TABLE).expect("table should bind");

    assert_eq!(unsafe { api.first_file_func(5) }, 25);
    assert_eq!(unsafe { api.second_file_c_style_func(6) }, 12);
}

#[test]
fn test_table_with_hidden_entry_fails_to_bind() {
    let err = load_api::<HiddenApi>(TABLE).err().expect("hidden symbol must not bind");
    assert_eq!(err.status(), Status::SymbolFail);
}
