// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod table;

/// Declare a typed symbol table for a shared library.
///
/// ```ignore
/// symbol_table! {
///     pub struct DemoApi;
///
///     unsafe extern "C" {
///         pub fn first_file_func(num: c_int) -> c_int;
///     }
/// }
/// ```
///
/// The caller must have `dlopen2::wrapper::WrapperApi` in scope.
#[proc_macro]
pub fn symbol_table(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::File);
    table::generate_table(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
