use proc_macro2::TokenStream;
use quote::quote;
use syn::{FnArg, GenericArgument, ImplItem, ImplItemFn, ItemImpl, PathArguments, ReturnType, Type, Visibility};

/// The pieces of a method that has the endpoint shape.
struct EndpointFn<'a> {
    name: &'a syn::Ident,
    request: &'a Type,
    response: &'a Type,
}

pub(crate) fn expand(item: ItemImpl) -> syn::Result<TokenStream> {
    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[api_controller] goes on an inherent impl block, not a trait impl",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &item.generics,
            "#[api_controller] does not support generic controllers",
        ));
    }

    let self_ty = &item.self_ty;
    let endpoints = item
        .items
        .iter()
        .filter_map(|it| match it {
            ImplItem::Fn(f) => endpoint_fn(f),
            _ => None,
        })
        .map(|ep| {
            let EndpointFn {
                name,
                request,
                response,
            } = ep;
            let operation = name.to_string();
            quote! {
                ::autoapi::Endpoint::<Self>::new::<#request, #response, _, _>(
                    #operation,
                    |this: ::std::sync::Arc<Self>, ctx: ::autoapi::RequestContext, req: #request| async move {
                        Self::#name(&this, ctx, req).await.map_err(::autoapi::ApiError::from)
                    },
                )
            }
        });

    Ok(quote! {
        #item

        impl ::autoapi::Controller for #self_ty {
            fn endpoints() -> ::std::vec::Vec<::autoapi::Endpoint<Self>> {
                ::std::vec![#(#endpoints),*]
            }
        }
    })
}

/// `pub async fn name(&self, ctx: RequestContext, req: Req) -> Result<Res, E>`.
fn endpoint_fn(f: &ImplItemFn) -> Option<EndpointFn<'_>> {
    let sig = &f.sig;
    if !matches!(f.vis, Visibility::Public(_))
        || sig.asyncness.is_none()
        || !sig.generics.params.is_empty()
        || sig.inputs.len() != 3
    {
        return None;
    }
    let mut inputs = sig.inputs.iter();
    match inputs.next()? {
        FnArg::Receiver(r) if r.reference.is_some() && r.mutability.is_none() => {}
        _ => return None,
    }
    let ctx = typed(inputs.next()?)?;
    if last_ident(ctx)? != "RequestContext" {
        return None;
    }
    let request = typed(inputs.next()?)?;
    if !matches!(request, Type::Path(_)) {
        return None;
    }
    let ReturnType::Type(_, ret) = &sig.output else {
        return None;
    };
    let response = result_ok_type(ret)?;
    Some(EndpointFn {
        name: &sig.ident,
        request,
        response,
    })
}

fn typed(arg: &FnArg) -> Option<&Type> {
    match arg {
        FnArg::Typed(pat) => Some(&pat.ty),
        FnArg::Receiver(_) => None,
    }
}

fn last_ident(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(p) => p.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

/// The `T` of `Result<T, E>`; aliases with a single argument do not count.
fn result_ok_type(ty: &Type) -> Option<&Type> {
    let Type::Path(p) = ty else {
        return None;
    };
    let segment = p.path.segments.last()?;
    if segment.ident != "Result" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    let types: Vec<&Type> = args
        .args
        .iter()
        .filter_map(|a| match a {
            GenericArgument::Type(t) => Some(t),
            _ => None,
        })
        .collect();
    match types.as_slice() {
        [ok, _err] => Some(*ok),
        _ => None,
    }
}
