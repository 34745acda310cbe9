// SPDX-FileCopyrightText: 2025 Contributors to the dlfacade project.
// SPDX-License-Identifier: Apache-2.0

use proc_macro2::{Span, TokenStream};
use syn::{Fields, ForeignItem, ForeignItemFn, Item, ItemStruct, Visibility};

/// Generate a `WrapperApi` struct from a unit struct declaration and the
/// foreign functions declared next to it. The output has the form of
///
/// #[derive(dlopen2::wrapper::WrapperApi)]
/// pub struct DemoApi {
///     #[dlopen2_name = "second_file_C_style_func"]
///     second_file_c_style_func: unsafe extern "C" fn(args) -> return_type,
/// }
pub fn generate_table(file: syn::File) -> syn::Result<TokenStream> {
    let table = table_struct(&file)?;
    let functions = exported_functions(&file);

    if functions.is_empty() {
        return Err(syn::Error::new_spanned(
            &table.ident,
            "symbol table declares no `pub fn` inside an extern block",
        ));
    }

    let mut fields = vec![];

    for func in functions {
        let symbol_name = func.sig.ident.to_string();
        let func_inputs = &func.sig.inputs;
        let func_output = &func.sig.output;

        let field_name = syn::Ident::new(&to_snake_case(&symbol_name), func.sig.ident.span());

        fields.push(quote::quote! {
            #[dlopen2_name = #symbol_name]
            #field_name: unsafe extern "C" fn(#func_inputs) #func_output,
        });
    }

    let attrs = &table.attrs;
    let vis = &table.vis;
    let ident = &table.ident;

    Ok(quote::quote! {
        #(#attrs)*
        #[derive(dlopen2::wrapper::WrapperApi)]
        #vis struct #ident {
            #(#fields)*
        }
    })
}

/// The single unit struct naming the table.
fn table_struct(file: &syn::File) -> syn::Result<&ItemStruct> {
    let mut structs = file.items.iter().filter_map(|item| match item {
        Item::Struct(s) => Some(s),
        _ => None,
    });

    let table = structs.next().ok_or_else(|| {
        syn::Error::new(Span::call_site(), "expected `struct Name;` naming the table")
    })?;

    if let Some(extra) = structs.next() {
        return Err(syn::Error::new_spanned(
            &extra.ident,
            "only one struct may be declared per symbol table",
        ));
    }
    if !matches!(table.fields, Fields::Unit) {
        return Err(syn::Error::new_spanned(
            &table.fields,
            "the table struct must be a unit struct; fields are generated",
        ));
    }

    Ok(table)
}

/// Extract all public foreign functions from the extern blocks.
pub fn exported_functions(file: &syn::File) -> Vec<ForeignItemFn> {
    let mut functions = vec![];

    for item in &file.items {
        if let Item::ForeignMod(extern_block) = item {
            for foreign_item in &extern_block.items {
                if let ForeignItem::Fn(func) = foreign_item
                    && let Visibility::Public(_) = func.vis
                {
                    functions.push(func.clone());
                }
            }
        }
    }
    functions
}

/// Convert an exported name to a snake_case field name, without doubling
/// an underscore that already precedes an uppercase letter.
fn to_snake_case(s: &str) -> String {
    let mut out = String::new();

    for c in s.chars() {
        if c.is_uppercase() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
