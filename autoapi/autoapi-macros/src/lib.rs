extern crate proc_macro;

mod controller;
mod dto;
mod kind;
mod tags;

use proc_macro::TokenStream;
use syn::{parse_macro_input, Attribute, DeriveInput, ItemImpl};

/// Derives `ApiSchema` and `ApiRequest` for a request type.
///
/// The `#[api(...)]` container attribute is the route marker:
///
/// ```ignore
/// #[derive(ApiRequest, Deserialize)]
/// #[api(method = "post", path = "/user/{id}", sm = "Create user", tags = "user")]
/// pub struct CreateUser {
///     #[param(uri = "id")]
///     pub id: u64,
///     #[param(json = "name", binding = "required,min=2")]
///     pub name: String,
/// }
/// ```
///
/// Without `#[api]` the type still derives, but registration skips it.
/// Doc comments fill `sm` and `dc` when those keys are not given.
#[proc_macro_derive(ApiRequest, attributes(api, param))]
pub fn derive_api_request(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    dto::expand(&input, dto::Mode::Request)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derives `ApiSchema` for response and DTO types.
#[proc_macro_derive(ApiSchema, attributes(param))]
pub fn derive_api_schema(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    dto::expand(&input, dto::Mode::Schema)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Exposes the API-shaped methods of an inherent `impl` block as endpoints.
///
/// A method is an endpoint when it reads
/// `pub async fn name(&self, ctx: RequestContext, req: Req) -> Result<Res, E>`.
/// Every other method is kept as is and ignored.
#[proc_macro_attribute]
pub fn api_controller(args: TokenStream, input: TokenStream) -> TokenStream {
    if !args.is_empty() {
        let args = proc_macro2::TokenStream::from(args);
        return syn::Error::new_spanned(args, "#[api_controller] takes no arguments")
            .into_compile_error()
            .into();
    }
    let item = parse_macro_input!(input as ItemImpl);
    controller::expand(item)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Parses doc comments (`///` and `/** ... */`) into a summary and description.
pub(crate) fn parse_doc_comments(attrs: &[Attribute]) -> (String, String) {
    let doc_comments: Vec<String> = attrs
        .iter()
        .filter_map(|attr| {
            if attr.path().is_ident("doc") {
                if let syn::Meta::NameValue(nv) = &attr.meta {
                    if let syn::Expr::Lit(expr_lit) = &nv.value {
                        if let syn::Lit::Str(lit) = &expr_lit.lit {
                            return Some(lit.value().trim().to_string());
                        }
                    }
                }
            }
            None
        })
        .collect();

    let description = doc_comments.join("\n").trim().to_string();
    let summary = description.lines().next().unwrap_or("").to_string();
    (summary, description)
}

/// Extracts the inner type from a generic type like `Option<T>` -> `T`.
pub(crate) fn get_inner_type<'a>(ty: &'a syn::Type, type_name: &str) -> Option<&'a syn::Type> {
    if let syn::Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == type_name {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    return args.args.iter().find_map(|arg| match arg {
                        syn::GenericArgument::Type(inner) => Some(inner),
                        _ => None,
                    });
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn doc_comments_split_into_summary_and_description() {
        let item: syn::ItemStruct = parse_quote! {
            /// Create a user.
            ///
            /// Fails when the name is taken.
            struct CreateUser;
        };
        let (summary, description) = parse_doc_comments(&item.attrs);
        assert_eq!(summary, "Create a user.");
        assert_eq!(description, "Create a user.\n\nFails when the name is taken.");
    }

    #[test]
    fn inner_type_skips_lifetimes() {
        let ty: syn::Type = parse_quote!(Cow<'static, str>);
        let inner = get_inner_type(&ty, "Cow").unwrap();
        assert_eq!(quote::quote!(#inner).to_string(), "str");
        let ty: syn::Type = parse_quote!(Vec<u8>);
        assert!(get_inner_type(&ty, "Option").is_none());
    }
}
