//! # Fieldwise Derive
//!
//! Procedural macros for the fieldwise recursive comparison library.
//!
//! ## Macros
//!
//! - `#[derive(Introspect)]` - Exposes the fields of a struct or enum to the
//!   recursive comparison
//!
//! ## Attributes
//!
//! - `#[introspect(crate = "path")]` on the type - Path of the crate exporting
//!   `introspection`, `::fieldwise` by default
//! - `#[introspect(partial_eq)]` on the type - Lets the recursive comparison use
//!   the type's `PartialEq` when configured with `using_partial_eq()`
//! - `#[introspect(skip)]` on a field - The field is never compared
//! - `#[introspect(rename = "name")]` on a field or variant - Name used in field
//!   paths and reports
//!
//! This macro is re-exported by the main `fieldwise` crate, so users typically
//! don't need to import this crate directly.

extern crate proc_macro;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{
    parse_macro_input, parse_quote, Attribute, Data, DeriveInput, Fields, GenericParam, Ident,
    Index, LitStr, Path,
};

/// Options read from `#[introspect(...)]` on a field or a variant.
#[derive(Default)]
struct MemberOptions {
    skip: bool,
    rename: Option<String>,
}

impl MemberOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<MemberOptions> {
        let mut options = MemberOptions::default();
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("introspect")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    options.skip = true;
                    Ok(())
                } else if meta.path.is_ident("rename") {
                    let name: LitStr = meta.value()?.parse()?;
                    options.rename = Some(name.value());
                    Ok(())
                } else {
                    Err(meta.error("expected `skip` or `rename = \"...\"`"))
                }
            })?;
        }
        Ok(options)
    }
}

/// Options read from `#[introspect(...)]` on the type itself.
struct TypeOptions {
    krate: Path,
    partial_eq: bool,
}

impl TypeOptions {
    fn parse(attrs: &[Attribute]) -> syn::Result<TypeOptions> {
        let mut options = TypeOptions {
            krate: parse_quote!(::fieldwise),
            partial_eq: false,
        };
        for attr in attrs.iter().filter(|attr| attr.path().is_ident("introspect")) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("crate") {
                    let path: LitStr = meta.value()?.parse()?;
                    options.krate = path.parse()?;
                    Ok(())
                } else if meta.path.is_ident("partial_eq") {
                    options.partial_eq = true;
                    Ok(())
                } else {
                    Err(meta.error("expected `crate = \"...\"` or `partial_eq`"))
                }
            })?;
        }
        Ok(options)
    }
}

/// One compared member: the name it is reported under and the expression
/// (or binding) giving a reference to it.
struct Member {
    name: String,
    access: TokenStream2,
}

/// Returns the compared members of `fields` and the pattern binding them.
/// `self_access` reads fields through `self` instead of a pattern.
fn members(fields: &Fields, self_access: bool) -> syn::Result<(Vec<Member>, TokenStream2)> {
    let mut members = Vec::new();
    let pattern = match fields {
        Fields::Named(named) => {
            let mut bound = Vec::new();
            for field in &named.named {
                let options = MemberOptions::parse(&field.attrs)?;
                if options.skip {
                    continue;
                }
                let Some(ident) = &field.ident else {
                    continue;
                };
                let name = options.rename.unwrap_or_else(|| unraw(ident));
                let access = if self_access {
                    quote!(&self.#ident)
                } else {
                    quote!(#ident)
                };
                members.push(Member { name, access });
                bound.push(ident.clone());
            }
            quote!({ #(#bound,)* .. })
        }
        Fields::Unnamed(unnamed) => {
            let mut bound = Vec::new();
            for (position, field) in unnamed.unnamed.iter().enumerate() {
                let options = MemberOptions::parse(&field.attrs)?;
                if options.skip {
                    bound.push(quote!(_));
                    continue;
                }
                let binding = Ident::new(&format!("__field{position}"), proc_macro2::Span::call_site());
                let index = Index::from(position);
                let access = if self_access {
                    quote!(&self.#index)
                } else {
                    quote!(#binding)
                };
                members.push(Member {
                    name: options.rename.unwrap_or_else(|| position.to_string()),
                    access,
                });
                bound.push(quote!(#binding));
            }
            quote!((#(#bound),*))
        }
        Fields::Unit => quote!(),
    };
    Ok((members, pattern))
}

fn unraw(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}

fn field_list(krate: &Path, members: &[Member]) -> TokenStream2 {
    let fields = members.iter().map(|Member { name, access }| {
        quote!(#krate::introspection::Field::new(#name, #access))
    });
    quote!(::std::vec![#(#fields),*])
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let TypeOptions { krate, partial_eq } = TypeOptions::parse(&input.attrs)?;

    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Introspect needs 'static types, lifetime parameters are not supported",
        ));
    }

    let body = match &input.data {
        Data::Struct(data) => {
            let (members, _) = members(&data.fields, true)?;
            let fields = field_list(&krate, &members);
            quote!(#krate::introspection::Node::Struct(#fields))
        }
        Data::Enum(data) => {
            let mut arms = Vec::new();
            for variant in &data.variants {
                let options = MemberOptions::parse(&variant.attrs)?;
                let ident = &variant.ident;
                let name = options.rename.unwrap_or_else(|| unraw(ident));
                let (members, pattern) = members(&variant.fields, false)?;
                let fields = field_list(&krate, &members);
                arms.push(quote! {
                    Self::#ident #pattern => #krate::introspection::Node::Variant(
                        #krate::introspection::Variant {
                            name: #name,
                            fields: #fields,
                        }
                    )
                });
            }
            if arms.is_empty() {
                quote!(match *self {})
            } else {
                quote!(match self { #(#arms,)* })
            }
        }
        Data::Union(data) => {
            return Err(syn::Error::new_spanned(
                data.union_token,
                "Introspect cannot be derived for unions",
            ));
        }
    };

    let mut generics = input.generics.clone();
    for param in &mut generics.params {
        if let GenericParam::Type(ty) = param {
            ty.bounds
                .push(parse_quote!(#krate::introspection::Introspect));
            ty.bounds.push(parse_quote!('static));
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let ident = &input.ident;

    let partial_eq = partial_eq.then(|| {
        quote! {
            fn partial_eq(
                &self,
                other: &dyn #krate::introspection::Introspect,
            ) -> ::std::option::Option<bool> {
                #krate::introspection::AsAny::as_any(other)
                    .downcast_ref::<Self>()
                    .map(|other| self == other)
            }
        }
    });

    Ok(quote! {
        #[automatically_derived]
        impl #impl_generics #krate::introspection::Introspect for #ident #ty_generics #where_clause {
            fn node(&self) -> #krate::introspection::Node<'_> {
                #body
            }

            #partial_eq
        }
    })
}

/// Derives `Introspect`, exposing every field to the recursive comparison.
///
/// # Basic Usage
///
/// ```rust,ignore
/// use fieldwise::Introspect;
///
/// #[derive(Debug, Introspect)]
/// struct Person {
///     name: String,
///     #[introspect(rename = "years")]
///     age: u32,
///     #[introspect(skip)]
///     cache: Vec<u8>,
/// }
///
/// #[derive(Debug, Introspect)]
/// enum Shape {
///     Circle { radius: f64 },
///     Square(f64),
/// }
/// ```
///
/// # Requirements
///
/// - The type must implement `Debug`, which is used to render values in reports
/// - Every compared field must implement `Introspect`
/// - Lifetime parameters are not supported
#[proc_macro_derive(Introspect, attributes(introspect))]
pub fn derive_introspect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
