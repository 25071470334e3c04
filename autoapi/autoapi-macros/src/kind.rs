use proc_macro2::TokenStream;
use quote::quote;
use syn::Type;

use crate::get_inner_type;

/// Mirror of `autoapi::FieldKind`, decided from the field's type syntax.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Kind {
    String,
    Int,
    Uint,
    Float,
    Bool,
    File,
    Array(Box<Kind>),
    Object,
}

/// Returns the kind of `ty` and whether it is wrapped in `Option`.
pub(crate) fn classify(ty: &Type) -> (Kind, bool) {
    if let Some(inner) = get_inner_type(ty, "Option") {
        return (kind_of(inner), true);
    }
    (kind_of(ty), false)
}

fn kind_of(ty: &Type) -> Kind {
    match ty {
        Type::Reference(r) => kind_of(&r.elem),
        Type::Paren(p) => kind_of(&p.elem),
        Type::Group(g) => kind_of(&g.elem),
        Type::Slice(s) => Kind::Array(Box::new(kind_of(&s.elem))),
        Type::Array(a) => Kind::Array(Box::new(kind_of(&a.elem))),
        Type::Path(p) => {
            let Some(segment) = p.path.segments.last() else {
                return Kind::Object;
            };
            let name = segment.ident.to_string();
            match name.as_str() {
                "String" | "str" | "char" | "DateTime" | "NaiveDate" | "NaiveDateTime"
                | "NaiveTime" | "Uuid" => Kind::String,
                "i8" | "i16" | "i32" | "i64" | "i128" | "isize" => Kind::Int,
                "u8" | "u16" | "u32" | "u64" | "u128" | "usize" => Kind::Uint,
                "f32" | "f64" => Kind::Float,
                "bool" => Kind::Bool,
                "UploadFile" => Kind::File,
                "Vec" | "VecDeque" | "HashSet" | "BTreeSet" | "LinkedList" => match get_inner_type(ty, &name) {
                    Some(inner) => Kind::Array(Box::new(kind_of(inner))),
                    None => Kind::Object,
                },
                "Box" | "Arc" | "Rc" | "Cow" => match get_inner_type(ty, &name) {
                    Some(inner) => kind_of(inner),
                    None => Kind::Object,
                },
                _ => Kind::Object,
            }
        }
        _ => Kind::Object,
    }
}

impl Kind {
    pub(crate) fn is_file(&self) -> bool {
        matches!(self, Kind::File)
    }

    pub(crate) fn to_tokens(&self) -> TokenStream {
        match self {
            Kind::String => quote!(::autoapi::FieldKind::String),
            Kind::Int => quote!(::autoapi::FieldKind::Int),
            Kind::Uint => quote!(::autoapi::FieldKind::Uint),
            Kind::Float => quote!(::autoapi::FieldKind::Float),
            Kind::Bool => quote!(::autoapi::FieldKind::Bool),
            Kind::File => quote!(::autoapi::FieldKind::File),
            Kind::Object => quote!(::autoapi::FieldKind::Object),
            Kind::Array(inner) => {
                let inner = inner.to_tokens();
                quote!(::autoapi::FieldKind::Array(&#inner))
            }
        }
    }
}
