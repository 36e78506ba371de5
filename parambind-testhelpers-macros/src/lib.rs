#![warn(missing_docs)]
//! Proc macro behind `#[parambind_testhelpers::test]`.

use proc_macro2::{TokenStream, TokenTree};
use unsynn::*;

unsynn! {
    /// `#[...]`
    struct OuterAttr {
        _pound: Pound,
        _content: BracketGroup,
    }

    /// A test function: attributes, a signature, a body.
    struct TestFn {
        attrs: Vec<OuterAttr>,
        signature: Vec<Cons<Except<BraceGroup>, TokenTree>>,
        body: BraceGroup,
    }
}

/// Runs a test inside a `test` span named after the function, after installing
/// the parambind tracing subscriber.
///
/// ```ignore
/// #[parambind_testhelpers::test]
/// fn binds_port() {
///     // binder logs carry `test{name="binds_port"}`
/// }
/// ```
#[proc_macro_attribute]
pub fn test(
    attr: proc_macro::TokenStream,
    item: proc_macro::TokenStream,
) -> proc_macro::TokenStream {
    expand(attr.into(), item.into()).into()
}

fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return quote::quote! {
            ::core::compile_error!("#[parambind_testhelpers::test] takes no arguments");
        };
    }

    let mut tokens = item.to_token_iter();
    let Ok(test_fn) = tokens.parse::<TestFn>() else {
        return quote::quote! {
            ::core::compile_error!("#[parambind_testhelpers::test] expects a function");
        };
    };

    let attrs = test_fn.attrs.to_token_stream();
    let signature = test_fn.signature.to_token_stream();
    let Some(name) = fn_name(signature.clone()) else {
        return quote::quote! {
            ::core::compile_error!("#[parambind_testhelpers::test] expects a function");
        };
    };
    let body = test_fn.body.0.stream();

    quote::quote! {
        #[::core::prelude::rust_2024::test]
        #attrs
        #signature {
            let _test_span = ::parambind_testhelpers::enter(#name);
            #body
        }
    }
}

/// The identifier following `fn` in a signature.
fn fn_name(signature: TokenStream) -> Option<String> {
    let mut tokens = signature.into_iter();
    tokens.find(|t| matches!(t, TokenTree::Ident(ident) if ident == "fn"))?;
    match tokens.next()? {
        TokenTree::Ident(name) => Some(name.to_string()),
        _ => None,
    }
}
