//! Procedural macros for Khazna.
//!
//! `#[derive(Service)]` implements `Component` for a struct and submits it
//! to the compile-time registration table, so the container finds it when
//! scanning the struct's module path.
//!
//! ```rust,ignore
//! #[derive(Default, Service)]
//! #[service(name = "transferService", transactional, implements(TransferService))]
//! struct TransferServiceImpl {
//!     #[autowired(name = "accountDao")]
//!     account_dao: Autowired<dyn AccountDao>,
//!
//!     #[autowired(required = false)]
//!     audit: Autowired<dyn AuditLog>,
//! }
//! ```

use darling::ast::{Data, NestedMeta};
use darling::util::{Ignored, PathList};
use darling::{FromDeriveInput, FromMeta};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::spanned::Spanned as _;
use syn::{DeriveInput, Error, GenericArgument, Ident, Meta, PathArguments, Type};

const AUTOWIRED_ATTR: &str = "autowired";

/// Struct-level `#[service(...)]` options.
#[derive(FromDeriveInput)]
#[darling(attributes(service), supports(struct_named, struct_unit))]
struct ServiceOpts {
    ident: Ident,
    generics: syn::Generics,
    data: Data<Ignored, syn::Field>,

    /// Explicit registry name.
    #[darling(default)]
    name: Option<String>,

    /// Wrap the bean in a transactional proxy after injection.
    #[darling(default)]
    transactional: bool,

    /// Capability traits, exposed as `dyn Trait` views.
    #[darling(default)]
    implements: PathList,

    /// `fn() -> Result<Self, BoxError>` used instead of `Default`.
    #[darling(default)]
    constructor: Option<syn::Path>,
}

/// Field-level `#[autowired(...)]` options.
#[derive(Default, FromMeta)]
struct AutowiredOpts {
    #[darling(default)]
    required: Option<bool>,

    /// Registry key, instead of the declared type's simple name.
    #[darling(default)]
    name: Option<String>,
}

/// Derive macro registering a struct with the container.
#[proc_macro_derive(Service, attributes(service, autowired))]
pub fn derive_service(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    match expand_service(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.write_errors().into(),
    }
}

fn expand_service(input: &DeriveInput) -> darling::Result<TokenStream2> {
    let opts = ServiceOpts::from_derive_input(input)?;
    let ident = &opts.ident;

    if !opts.generics.params.is_empty() {
        return Err(Error::new(
            opts.generics.span(),
            "#[derive(Service)] does not support generic structs",
        )
        .into());
    }

    let start = match &opts.constructor {
        Some(path) => quote! { with_constructor::<Self>(#path) },
        None => quote! { builder::<Self>() },
    };

    let name_call = opts.name.as_ref().map(|name| quote! { .name(#name) });
    let transactional_call = opts.transactional.then(|| quote! { .transactional() });

    let implements_calls = opts.implements.iter().map(|path| {
        if opts.transactional {
            quote! { .implements_intercepted::<dyn #path>(|this| this) }
        } else {
            quote! { .implements::<dyn #path>(|this| this) }
        }
    });

    let mut errors = darling::Error::accumulator();
    let mut field_calls = Vec::new();
    if let Data::Struct(fields) = &opts.data {
        for field in fields.iter() {
            if let Some(call) = errors.handle(field_call(field)).flatten() {
                field_calls.push(call);
            }
        }
    }
    errors.finish()?;

    Ok(quote! {
        impl ::khazna::descriptor::Component for #ident {
            fn descriptor() -> ::khazna::descriptor::TypeDescriptor {
                ::khazna::descriptor::TypeDescriptor::#start
                    #name_call
                    #transactional_call
                    #(#implements_calls)*
                    #(#field_calls)*
                    .build()
            }
        }

        ::khazna::inventory::submit! {
            ::khazna::ServiceEntry::new(<#ident as ::khazna::descriptor::Component>::descriptor)
        }
    })
}

/// Builds the `.field(...)` call for an `#[autowired]` field, if it has one.
fn field_call(field: &syn::Field) -> darling::Result<Option<TokenStream2>> {
    let Some(attr) = field
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident(AUTOWIRED_ATTR))
    else {
        return Ok(None);
    };

    let opts = match &attr.meta {
        Meta::Path(_) => AutowiredOpts::default(),
        Meta::List(list) => {
            let items = NestedMeta::parse_meta_list(list.tokens.clone())?;
            AutowiredOpts::from_list(&items)?
        }
        Meta::NameValue(nv) => {
            return Err(Error::new(nv.span(), "expected #[autowired] or #[autowired(...)]").into());
        }
    };

    let Some(field_ident) = field.ident.as_ref() else {
        return Err(Error::new(field.span(), "#[autowired] needs a named field").into());
    };

    let Some(dependency) = extract_autowired_type(&field.ty) else {
        return Err(Error::new(
            field.ty.span(),
            format!("#[{AUTOWIRED_ATTR}] fields must be of type Autowired<T>"),
        )
        .into());
    };

    let field_name = field_ident.to_string();
    let named = opts.name.map(|key| quote! { .named(#key) });
    let required = opts.required.map(|required| quote! { .required(#required) });

    Ok(Some(quote! {
        .field(
            ::khazna::descriptor::Field::<Self, #dependency>::new(#field_name, |this, value| {
                this.#field_ident.set(value)
            })
            #named
            #required
        )
    }))
}

fn extract_autowired_type(ty: &Type) -> Option<Type> {
    if let Type::Path(type_path) = ty
        && let Some(segment) = type_path.path.segments.last()
        && segment.ident == "Autowired"
        && let PathArguments::AngleBracketed(args) = &segment.arguments
        && let Some(GenericArgument::Type(inner)) = args.args.first()
    {
        return Some(inner.clone());
    }
    None
}
