use crate::args::ErrorArgs;
use proc_macro2::TokenStream as TokenStream2;
use quote::{quote, ToTokens};
use syn::{
    parse::{Parse, ParseStream},
    Attribute,
    Fields,
    Ident,
    ItemStruct,
    Result,
};

/// The struct `ErrorKind` is derived for: a unit struct, or one with named fields.
#[derive(Debug)]
pub struct ErrorKindTarget {
    pub name: Ident,
    pub fields: Vec<Ident>,
    pub error_args: ErrorArgs,
}

impl Parse for ErrorKindTarget {
    fn parse(input: ParseStream) -> Result<Self> {
        let attributes = input.call(Attribute::parse_outer)?;
        let item = input.parse::<ItemStruct>()?;

        let fields = match item.fields {
            Fields::Named(named) => named.named.into_iter().filter_map(|field| field.ident).collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(&item.ident, "`ErrorKind` cannot be derived for tuple structs"));
            },
        };
        let attr = attributes.iter()
            .find(|attr| attr.path().is_ident("error"))
            .ok_or_else(|| syn::Error::new_spanned(&item.ident, "missing `#[error(...)]` attribute"))?;

        Ok(ErrorKindTarget {
            name: item.ident,
            fields,
            error_args: attr.parse_args::<ErrorArgs>()?,
        })
    }
}

impl ToTokens for ErrorKindTarget {
    fn to_tokens(&self, tokens: &mut TokenStream2) {
        let fields = &self.fields;
        let message = self.error_args.message.as_ref();
        let labels = self.error_args.labels.as_ref()
            .map(|labels| quote! { #labels })
            .unwrap_or_else(|| quote! { [""] });
        let optional = |tag: Option<&syn::Expr>| match tag {
            Some(e) => quote! { Some((#e).to_string()) },
            None => quote! { None },
        };
        let help = optional(self.error_args.help.as_ref());
        let note = optional(self.error_args.note.as_ref());

        // the fields are in scope for the tag expressions
        tokens.extend(quote! {
            fn build_report<'a>(
                &self,
                src_id: &'a str,
                spans: &[std::ops::Range<usize>],
            ) -> ariadne::Report<'a, (&'a str, std::ops::Range<usize>)> {
                #[allow(unused_variables)]
                let Self { #(#fields,)* .. } = self;
                tokcas_error::report(src_id, spans, #message, #labels, #help, #note)
            }
        });
    }
}
