//! Derive macro for field-wise binary serialization.
//!
//! Generates `Encode` and `Decode` implementations from
//! `crate::types::encoding` for structs. Fields are written and read in
//! declaration order with no framing of their own; every field type decides
//! its own layout (a `NulString` writes its bytes plus a `0x00` terminator,
//! an `Opcode` writes a single byte).
//!
//! Enums and unions are rejected: enum layouts in the program image are
//! hand-written so the opcode byte stays stable.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Index, parse_macro_input};

/// Derives `Encode` and `Decode` for a struct.
///
/// ```ignore
/// use stackemu_derive::BinaryCodec;
///
/// #[derive(BinaryCodec)]
/// pub struct RawInstruction {
///     pub opcode: Opcode,
///     pub operand: NulString,
/// }
/// ```
pub fn derive_binary_codec(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        Data::Enum(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "BinaryCodec derive supports structs only; implement Encode/Decode by hand for enums",
            ));
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "BinaryCodec derive does not support unions",
            ));
        }
    };

    let (encode_body, decode_body) = match fields {
        Fields::Named(named) => {
            let idents: Vec<_> = named.named.iter().map(|f| &f.ident).collect();
            (
                quote! {
                    #( crate::types::encoding::Encode::encode(&self.#idents, out); )*
                },
                quote! {
                    Ok(Self {
                        #( #idents: crate::types::encoding::Decode::decode(input)?, )*
                    })
                },
            )
        }
        Fields::Unnamed(unnamed) => {
            let indices: Vec<_> = (0..unnamed.unnamed.len()).map(Index::from).collect();
            let decoders = indices
                .iter()
                .map(|_| quote! { crate::types::encoding::Decode::decode(input)?, });
            (
                quote! {
                    #( crate::types::encoding::Encode::encode(&self.#indices, out); )*
                },
                quote! {
                    Ok(Self( #(#decoders)* ))
                },
            )
        }
        Fields::Unit => (quote! { let _ = out; }, quote! { let _ = input; Ok(Self) }),
    };

    Ok(quote! {
        impl #impl_generics crate::types::encoding::Encode for #name #ty_generics #where_clause {
            fn encode<S: crate::types::encoding::EncodeSink>(&self, out: &mut S) {
                #encode_body
            }
        }

        impl #impl_generics crate::types::encoding::Decode for #name #ty_generics #where_clause {
            fn decode(input: &mut &[u8]) -> ::std::result::Result<Self, crate::types::encoding::DecodeError> {
                #decode_body
            }
        }
    })
}
