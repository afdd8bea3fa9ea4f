use proc_macro2::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, Ident, Lit, Meta};

use crate::error::{DeriveError, Result};

const NODE_NAME_ATTR: &str = "node_name";

pub fn generate(ast: &DeriveInput) -> Result<TokenStream> {
    let node_name = node_name_from_ast(ast)?;
    let fields = named_fields(ast)?;

    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let field_names: Vec<String> = fields.iter().map(field_name).collect();

    Ok(quote! {
        impl #impl_generics ::trellis::NodeFields for #name #ty_generics #where_clause {
            const NAME: &'static str = #node_name;
            const FIELDS: &'static [&'static str] = &[ #( #field_names ),* ];
        }

        impl #impl_generics ::trellis::FromValue for #name #ty_generics #where_clause {
            fn from_value(
                value: &::trellis::Value,
            ) -> ::std::result::Result<Self, ::trellis::ConvertError> {
                let node = ::trellis::convert::expect_node(value, #node_name)?;
                ::std::result::Result::Ok(#name {
                    #(
                        #fields: ::trellis::FromValue::from_value(
                            ::trellis::convert::field(node, #node_name, #field_names)?,
                        )?,
                    )*
                })
            }
        }
    })
}

/// The node name for a derive: the struct name unless overridden with a
/// `node_name` attribute.
fn node_name_from_ast(ast: &DeriveInput) -> Result<String> {
    let names: Vec<&Attribute> = ast
        .attrs
        .iter()
        .filter(|attr| match attr.parse_meta() {
            Ok(Meta::NameValue(val)) => val.path.is_ident(NODE_NAME_ATTR),
            _ => false,
        })
        .collect();

    let attr = match names.len() {
        0 => return Ok(ast.ident.to_string()),
        1 => names[0],
        _ => return Err(DeriveError::MultipleNodeNames),
    };

    match attr.parse_meta() {
        Ok(Meta::NameValue(val)) => match val.lit {
            Lit::Str(s) => Ok(s.value()),
            _ => Err(DeriveError::Other("attribute not a string".to_owned())),
        },
        Ok(_) => Err(DeriveError::Other("attribute not a name value".to_owned())),
        Err(e) => Err(e.into()),
    }
}

fn named_fields(ast: &DeriveInput) -> Result<Vec<Ident>> {
    let data = match &ast.data {
        Data::Struct(data) => data,
        _ => return Err(DeriveError::NotAStruct),
    };
    match &data.fields {
        Fields::Named(fields) => Ok(fields
            .named
            .iter()
            .filter_map(|field| field.ident.clone())
            .collect()),
        Fields::Unit => Ok(Vec::new()),
        Fields::Unnamed(_) => Err(DeriveError::UnnamedFields),
    }
}

fn field_name(ident: &Ident) -> String {
    let name = ident.to_string();
    match name.strip_prefix("r#") {
        Some(raw) => raw.to_owned(),
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_str;

    fn ast(def: &str) -> DeriveInput {
        parse_str(def).unwrap()
    }

    #[test]
    fn node_name_defaults_to_ident() {
        let ast = ast("struct Binary { left: Expr, op: String, right: Expr }");
        assert_eq!(node_name_from_ast(&ast).unwrap(), "Binary");
    }

    #[test]
    fn node_name_attribute() {
        let ast = ast(
            "
            #[node_name = \"pair\"]
            struct Pair { key: String, value: i64 }
        ",
        );
        assert_eq!(node_name_from_ast(&ast).unwrap(), "pair");
    }

    #[test]
    fn multiple_node_names() {
        let ast = ast(
            "
            #[node_name = \"a\"]
            #[node_name = \"b\"]
            struct Dummy { x: i64 }
        ",
        );
        assert_eq!(
            node_name_from_ast(&ast).unwrap_err(),
            DeriveError::MultipleNodeNames
        );
    }

    #[test]
    fn rejected_shapes() {
        let tests = vec![
            ("struct Dummy(i64);", DeriveError::UnnamedFields),
            ("enum Dummy { A }", DeriveError::NotAStruct),
        ];
        for test in tests {
            assert_eq!(generate(&ast(test.0)).unwrap_err(), test.1);
        }
    }

    #[test]
    fn raw_field_names() {
        let ast = ast("struct Keyword { r#type: String }");
        let fields = named_fields(&ast).unwrap();
        assert_eq!(field_name(&fields[0]), "type");
    }

    #[test]
    fn generated_impls() {
        let ast = ast("struct Pair { key: String, value: i64 }");
        let got = generate(&ast).unwrap();
        let expected = quote! {
            impl ::trellis::NodeFields for Pair {
                const NAME: &'static str = "Pair";
                const FIELDS: &'static [&'static str] = &["key", "value"];
            }

            impl ::trellis::FromValue for Pair {
                fn from_value(
                    value: &::trellis::Value,
                ) -> ::std::result::Result<Self, ::trellis::ConvertError> {
                    let node = ::trellis::convert::expect_node(value, "Pair")?;
                    ::std::result::Result::Ok(Pair {
                        key: ::trellis::FromValue::from_value(
                            ::trellis::convert::field(node, "Pair", "key")?,
                        )?,
                        value: ::trellis::FromValue::from_value(
                            ::trellis::convert::field(node, "Pair", "value")?,
                        )?,
                    })
                }
            }
        };
        assert_eq!(got.to_string(), expected.to_string());
    }
}
