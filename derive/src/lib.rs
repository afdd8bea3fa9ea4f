//! `#[derive(Node)]` for typed access to parsed nodes.
//!
//! The derive implements `trellis::NodeFields` and `trellis::FromValue` for a
//! struct with named fields. The node name is the struct name unless given
//! with `#[node_name = "..."]`.

use syn::{parse_macro_input, DeriveInput};

mod error;
mod generate;

#[proc_macro_derive(Node, attributes(node_name))]
pub fn derive(input: proc_macro::TokenStream) -> proc_macro::TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);

    let expanded = match generate::generate(&ast) {
        Ok(tokens) => tokens,
        Err(e) => syn::Error::new_spanned(&ast.ident, e).to_compile_error(),
    };

    proc_macro::TokenStream::from(expanded)
}
