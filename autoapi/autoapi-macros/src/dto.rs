use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DataStruct, DeriveInput, Fields};

use crate::kind::classify;
use crate::parse_doc_comments;
use crate::tags::{self, FIELD_KEYS, MARKER_KEYS};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Mode {
    Request,
    Schema,
}

pub(crate) fn expand(input: &DeriveInput, mode: Mode) -> syn::Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "API request and schema types cannot be generic",
        ));
    }
    let fields = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        Data::Struct(DataStruct {
            fields: Fields::Unit,
            ..
        }) if mode == Mode::Request => return expand_unit(input),
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "expected a struct with named fields",
            ))
        }
    };

    let ident = &input.ident;
    let rename_all = tags::serde_rename_all(&input.attrs)?;
    let marker = marker_tokens(input, mode)?;

    let mut metas = Vec::new();
    let mut takes = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let Some(field_ident) = &field.ident else {
            continue;
        };
        let name = field_ident.unraw().to_string();
        let tags = tags::parse(&field.attrs, "param", FIELD_KEYS)?.unwrap_or_default();
        let serde_name = match tags::serde_rename(&field.attrs)? {
            Some(renamed) => Some(renamed),
            None => rename_all.map(|rule| rule.apply(&name)),
        };
        let (kind, optional) = classify(&field.ty);
        let ty = &field.ty;
        let rust_type = quote!(#ty).to_string().replace(' ', "");
        let kind_tokens = kind.to_tokens();
        let serde_tokens = match serde_name {
            Some(n) => quote!(::core::option::Option::Some(#n)),
            None => quote!(::core::option::Option::None),
        };
        let tag_tokens = tag_set(&tags);
        metas.push(quote! {
            ::autoapi::FieldMeta {
                ident: #name,
                rust_type: #rust_type,
                kind: #kind_tokens,
                optional: #optional,
                serde_name: #serde_tokens,
                tags: #tag_tokens,
            }
        });
        takes.push(match (kind.is_file(), optional) {
            (true, true) => quote!(#field_ident: fields.take_file(#index)),
            (true, false) => {
                quote!(#field_ident: fields.take_file(#index).unwrap_or_default())
            }
            (false, _) => quote!(#field_ident: fields.take(#index)?),
        });
    }

    let type_name = ident.unraw().to_string();
    let schema_impl = quote! {
        impl ::autoapi::ApiSchema for #ident {
            fn type_meta() -> &'static ::autoapi::TypeMeta {
                static META: ::autoapi::TypeMeta = ::autoapi::TypeMeta {
                    type_name: #type_name,
                    module_path: ::core::module_path!(),
                    marker: #marker,
                    fields: &[#(#metas),*],
                };
                &META
            }
        }
    };

    if mode == Mode::Schema {
        return Ok(schema_impl);
    }
    Ok(quote! {
        #schema_impl

        impl ::autoapi::ApiRequest for #ident {
            fn from_bound(
                fields: &mut ::autoapi::BoundFields,
            ) -> ::core::result::Result<Self, ::autoapi::BindError> {
                let _ = &fields;
                ::core::result::Result::Ok(Self { #(#takes),* })
            }
        }
    })
}

/// A fieldless request, e.g. `struct Ping;`.
fn expand_unit(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let type_name = ident.unraw().to_string();
    let marker = marker_tokens(input, Mode::Request)?;
    Ok(quote! {
        impl ::autoapi::ApiSchema for #ident {
            fn type_meta() -> &'static ::autoapi::TypeMeta {
                static META: ::autoapi::TypeMeta = ::autoapi::TypeMeta {
                    type_name: #type_name,
                    module_path: ::core::module_path!(),
                    marker: #marker,
                    fields: &[],
                };
                &META
            }
        }

        impl ::autoapi::ApiRequest for #ident {
            fn from_bound(
                _fields: &mut ::autoapi::BoundFields,
            ) -> ::core::result::Result<Self, ::autoapi::BindError> {
                ::core::result::Result::Ok(Self)
            }
        }
    })
}

fn marker_tokens(input: &DeriveInput, mode: Mode) -> syn::Result<TokenStream> {
    if mode == Mode::Schema {
        if let Some(attr) = input.attrs.iter().find(|a| a.path().is_ident("api")) {
            return Err(syn::Error::new_spanned(
                attr,
                "#[api] belongs on #[derive(ApiRequest)] types",
            ));
        }
        return Ok(quote!(::core::option::Option::None));
    }
    let Some(mut marker) = tags::parse(&input.attrs, "api", MARKER_KEYS)? else {
        return Ok(quote!(::core::option::Option::None));
    };
    let (summary, description) = parse_doc_comments(&input.attrs);
    for (key, doc) in [("sm", summary), ("dc", description)] {
        if !doc.is_empty() && !marker.iter().any(|(k, _)| k == key) {
            marker.push((key.to_string(), doc));
        }
    }
    let set = tag_set(&marker);
    Ok(quote!(::core::option::Option::Some(#set)))
}

fn tag_set(tags: &[(String, String)]) -> TokenStream {
    let entries = tags.iter().map(|(k, v)| quote!((#k, #v)));
    quote!(::autoapi::TagSet::new(&[#(#entries),*]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    fn expanded(input: DeriveInput, mode: Mode) -> String {
        expand(&input, mode).unwrap().to_string()
    }

    #[test]
    fn request_emits_marker_and_takes() {
        let out = expanded(
            parse_quote! {
                /// Create a user.
                #[api(method = "post", path = "/user/{id}")]
                pub struct CreateUser {
                    #[param(uri = "id")]
                    pub id: u64,
                    #[param(json = "name", binding = "required")]
                    pub name: String,
                    pub avatar: Option<UploadFile>,
                }
            },
            Mode::Request,
        );
        assert!(out.contains("\"method\" , \"post\""));
        assert!(out.contains("(\"sm\" , \"Create a user.\")"));
        assert!(out.contains("fields . take (0usize) ?"));
        assert!(out.contains("fields . take_file (2usize)"));
        assert!(out.contains("impl :: autoapi :: ApiRequest for CreateUser"));
    }

    #[test]
    fn schema_has_no_marker() {
        let out = expanded(
            parse_quote! {
                #[serde(rename_all = "camelCase")]
                pub struct UserView {
                    pub user_id: u64,
                }
            },
            Mode::Schema,
        );
        assert!(out.contains("marker : :: core :: option :: Option :: None"));
        assert!(out.contains("Some (\"userId\")"));
        assert!(!out.contains("ApiRequest"));
    }

    #[test]
    fn schema_rejects_api_marker() {
        let input: DeriveInput = parse_quote! {
            #[api(method = "get", path = "/x")]
            pub struct View { pub a: u8 }
        };
        assert!(expand(&input, Mode::Schema).is_err());
    }

    #[test]
    fn generics_and_enums_are_rejected() {
        let generic: DeriveInput = parse_quote!(pub struct Page<T> { pub items: Vec<T> });
        assert!(expand(&generic, Mode::Request).is_err());
        let en: DeriveInput = parse_quote!(pub enum E { A });
        assert!(expand(&en, Mode::Request).is_err());
    }
}
