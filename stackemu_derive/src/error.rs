//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations.
//! Replacement for the `thiserror` crate.
//!
//! # Usage
//!
//! ```ignore
//! use stackemu_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum VMError {
//!     #[error("incorrect register name \"{token}\"")]
//!     InvalidRegister { token: String },
//!
//!     #[error("line {line}: {source}")]
//!     AssemblyError { line: usize, source: Box<VMError> },
//!
//!     #[error("division by zero")]
//!     DivisionByZero,
//! }
//! ```
//!
//! Tuple fields are referenced as `{0}`, `{1}`; named fields by name. Format
//! specs such as `{opcode:#04x}` are passed through to `write!`. Fields that
//! the message never mentions are ignored.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Data, DeriveInput, Fields, Lit, Meta, parse_macro_input};

/// Derives `Display` and `Error` for an enum or struct.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand_error_derive(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_error_derive(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let display_body = match &input.data {
        Data::Enum(data_enum) => {
            let arms = data_enum
                .variants
                .iter()
                .map(|variant| {
                    let variant_name = &variant.ident;
                    let message = message_from_attrs(
                        &variant.attrs,
                        &variant.ident,
                        &format!("variant `{variant_name}`"),
                    )?;
                    let (pattern, write) = display_fields(&message, &variant.fields);
                    Ok(quote! { Self::#variant_name #pattern => #write, })
                })
                .collect::<syn::Result<Vec<_>>>()?;

            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Struct(data_struct) => {
            let message =
                message_from_attrs(&input.attrs, &input.ident, &format!("type `{name}`"))?;
            let (pattern, write) = display_fields(&message, &data_struct.fields);
            quote! {
                let Self #pattern = self;
                #write
            }
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #display_body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Builds the destructuring pattern and the `write!` call for one set of fields.
///
/// Only fields mentioned in `message` are bound, so `write!` never receives an
/// unused named argument.
fn display_fields(message: &str, fields: &Fields) -> (TokenStream2, TokenStream2) {
    match fields {
        Fields::Unit => (quote! {}, quote! { write!(f, #message) }),
        Fields::Named(named) => {
            let used: Vec<_> = named
                .named
                .iter()
                .filter_map(|field| field.ident.as_ref())
                .filter(|ident| mentions(message, &ident.to_string()))
                .collect();
            (
                quote! { { #(#used,)* .. } },
                quote! { write!(f, #message, #(#used = #used),*) },
            )
        }
        Fields::Unnamed(unnamed) => {
            let mut format_str = message.to_string();
            let mut bindings = Vec::with_capacity(unnamed.unnamed.len());
            let mut used = Vec::new();
            for i in 0..unnamed.unnamed.len() {
                let binding = format_ident!("f{}", i);
                if mentions(message, &i.to_string()) {
                    format_str = format_str
                        .replace(&format!("{{{i}}}"), &format!("{{f{i}}}"))
                        .replace(&format!("{{{i}:"), &format!("{{f{i}:"));
                    bindings.push(binding.to_token_stream());
                    used.push(binding);
                } else {
                    bindings.push(quote! { _ });
                }
            }
            (
                quote! { ( #(#bindings),* ) },
                quote! { write!(f, #format_str, #(#used = #used),*) },
            )
        }
    }
}

/// Returns true if `message` interpolates the argument `name`.
fn mentions(message: &str, name: &str) -> bool {
    message.contains(&format!("{{{name}}}")) || message.contains(&format!("{{{name}:"))
}

/// Extracts the message from an `#[error("...")]` attribute.
fn message_from_attrs<T: ToTokens>(
    attrs: &[syn::Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<String> {
    for attr in attrs {
        if !attr.path().is_ident("error") {
            continue;
        }

        let Meta::List(meta_list) = &attr.meta else {
            return Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute; use #[error(\"message\")] to describe the error",
            ));
        };

        let lit = syn::parse2::<Lit>(meta_list.tokens.clone()).map_err(|_| {
            syn::Error::new_spanned(
                &attr.meta,
                "failed to parse #[error] attribute; expected a string literal like #[error(\"stack is empty\")]",
            )
        })?;

        return match lit {
            Lit::Str(lit_str) => Ok(lit_str.value()),
            _ => Err(syn::Error::new_spanned(
                &attr.meta,
                "invalid #[error] attribute: message must be a string literal",
            )),
        };
    }

    Err(syn::Error::new_spanned(
        target,
        format!(
            "missing #[error(\"...\")] attribute on {target_desc}; every error variant must declare a display message"
        ),
    ))
}
