//! Implements the `#[derive(Component)]` macro for [`ecs_core`][ec].
//!
//! [ec]: https://docs.rs/ecs_core

use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{parse_macro_input, DeriveInput, Ident};

/// Custom derive macro for the `Component` trait.
///
/// ```rust,ignore
/// #[derive(Component, Debug)]
/// struct Position(f32, f32, f32);
/// ```
///
/// The macro stores components in a `swap_and_pop` storage by default. To
/// request in-place deletion (slots are tombstoned instead of swapped),
/// annotate the type with `#[component(in_place_delete)]`:
///
/// ```rust,ignore
/// #[derive(Component, Debug)]
/// #[component(in_place_delete)]
/// struct Transform(f32, f32, f32);
/// ```
#[proc_macro_derive(Component, attributes(component))]
pub fn component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    impl_component(&ast).into()
}

fn impl_component(ast: &DeriveInput) -> proc_macro2::TokenStream {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    let policy = storage_policy(ast).unwrap_or_else(|| Ident::new("SwapAndPop", name.span()));

    quote! {
        impl #impl_generics ::ecs_core::Component for #name #ty_generics #where_clause {
            const POLICY: ::ecs_core::DeletionPolicy = ::ecs_core::DeletionPolicy::#policy;
        }
    }
}

/// Looks for `#[component(in_place_delete)]` on the derived item and
/// returns the matching `DeletionPolicy` variant identifier, if any.
fn storage_policy(ast: &DeriveInput) -> Option<Ident> {
    for attr in &ast.attrs {
        if !attr.path().is_ident("component") {
            continue;
        }

        let mut found = None;
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("in_place_delete") {
                found = Some(Ident::new("InPlaceDelete", meta.path.span()));
            } else if meta.path.is_ident("swap_and_pop") {
                found = Some(Ident::new("SwapAndPop", meta.path.span()));
            }
            Ok(())
        });

        if found.is_some() {
            return found;
        }
    }

    None
}
