mod args;
mod error_kind;

use error_kind::ErrorKindTarget;
use proc_macro::TokenStream;
use quote::quote;
use syn::parse_macro_input;

/// Derives the `ErrorKind` trait from `tokcas-error` for the given struct.
///
/// The report is described with the `error` attribute:
/// ```ignore
/// use tokcas_attrs::ErrorKind;
/// use tokcas_error::ErrorKind;
///
/// #[derive(Debug, ErrorKind)]
/// #[error(message = "unbalanced parentheses", labels = ["this parenthesis is never closed"])]
/// pub struct UnclosedParen;
/// ```
///
/// | Tag       | Description                                                                 |
/// | --------- | --------------------------------------------------------------------------- |
/// | `message` | The message displayed at the top of the report.                             |
/// | `labels`  | An array of label texts, one per span of the error, in the same order.      |
/// | `help`    | Optional text telling the user how to fix the problem.                      |
/// | `note`    | Optional text with extra context about the problem.                         |
///
/// Each tag is an arbitrary expression. For structs with named fields, the fields are in scope
/// while the expressions are evaluated. Tuple structs are rejected.
#[proc_macro_derive(ErrorKind, attributes(error))]
pub fn error_kind(item: TokenStream) -> TokenStream {
    let target = parse_macro_input!(item as ErrorKindTarget);
    let name = &target.name;
    quote! {
        impl ErrorKind for #name {
            #target
        }
    }.into()
}
