//! Implementation of `#[derive(Bindable)]`.
//!
//! The outer item is parsed with an unsynn grammar. Named fields are split by
//! hand, because a field type may contain top-level commas (`HashMap<K, V>`)
//! that a plain "tokens until comma" rule would cut in half.

use proc_macro2::{Delimiter, Span, TokenStream as TokenStream2, TokenTree as Tt};
use quote::{format_ident, quote, quote_spanned};
use unsynn::*;

keyword! {
    KStruct = "struct";
    KPub = "pub";
}

unsynn! {
    /// Visibility: `pub`, `pub(...)` or nothing
    enum Vis {
        PubIn(Cons<KPub, ParenthesisGroup>),
        Pub(KPub),
    }

    /// An outer attribute: `#[...]`
    struct Attribute {
        _pound: Pound,
        content: BracketGroup,
    }

    /// A struct item; everything after the name is inspected by hand
    struct StructItem {
        _attrs: Vec<Attribute>,
        _vis: Option<Vis>,
        _kw_struct: KStruct,
        name: Ident,
        rest: Vec<TokenTree>,
    }
}

/// An error to be reported through `compile_error!` at a given span.
#[derive(Debug)]
struct DeriveError {
    span: Span,
    message: String,
}

type DeriveResult<T> = core::result::Result<T, DeriveError>;

impl DeriveError {
    fn new(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
        }
    }

    fn to_compile_error(&self) -> TokenStream2 {
        let message = &self.message;
        quote_spanned! { self.span =>
            ::core::compile_error!(#message);
        }
    }
}

/// A named field, split out of the struct body.
struct ParsedField {
    attrs: Vec<proc_macro2::Group>,
    name: proc_macro2::Ident,
    ty: TokenStream2,
}

/// One `key = "value"` pair of a `#[param(...)]` attribute.
#[derive(Debug)]
struct ParamAttr {
    key: String,
    value: proc_macro2::Literal,
}

const KNOWN_PARAM_KEYS: &[&str] = &["key", "default", "required"];

/// Entry point: derive input in, impl (or `compile_error!`) out.
pub(crate) fn derive_bindable(input: TokenStream2) -> TokenStream2 {
    match expand(input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: TokenStream2) -> DeriveResult<TokenStream2> {
    let mut it = input.to_token_iter();
    let item = it.parse::<StructItem>().map_err(|_| {
        DeriveError::new(
            Span::call_site(),
            "#[derive(Bindable)] only supports structs with named fields",
        )
    })?;

    let fields = struct_fields(&item)?;
    let ident = &item.name;

    let field_descs = fields
        .iter()
        .map(|field| field_desc(ident, field))
        .collect::<DeriveResult<Vec<_>>>()?;

    Ok(quote! {
        #[automatically_derived]
        impl ::parambind::Bindable for #ident {
            const SHAPE: &'static ::parambind::Shape = {
                const FIELDS: &[::parambind::Field] = &[#(#field_descs),*];
                const RECORD: ::parambind::Shape = ::parambind::Shape::record::<#ident>(FIELDS);
                &RECORD
            };
        }
    })
}

fn struct_fields(item: &StructItem) -> DeriveResult<Vec<ParsedField>> {
    let name_span = item.name.span();
    match item.rest.as_slice() {
        [Tt::Group(body)] if body.delimiter() == Delimiter::Brace => split_fields(body.stream()),
        [Tt::Punct(semi)] if semi.as_char() == ';' => Ok(Vec::new()),
        [Tt::Punct(lt), ..] if lt.as_char() == '<' => Err(DeriveError::new(
            lt.span(),
            "#[derive(Bindable)] does not support generic structs",
        )),
        [Tt::Group(body), ..] if body.delimiter() == Delimiter::Parenthesis => Err(DeriveError::new(
            body.span(),
            "#[derive(Bindable)] does not support tuple structs",
        )),
        _ => Err(DeriveError::new(
            name_span,
            "#[derive(Bindable)] only supports structs with named fields",
        )),
    }
}

fn split_fields(body: TokenStream2) -> DeriveResult<Vec<ParsedField>> {
    let mut fields = Vec::new();
    let mut tokens = body.into_iter().peekable();

    loop {
        let mut attrs = Vec::new();
        while let Some(Tt::Punct(pound)) = tokens.peek() {
            if pound.as_char() != '#' {
                break;
            }
            let pound_span = pound.span();
            tokens.next();
            match tokens.next() {
                Some(Tt::Group(group)) if group.delimiter() == Delimiter::Bracket => {
                    attrs.push(group)
                }
                _ => return Err(DeriveError::new(pound_span, "expected `[` after `#`")),
            }
        }

        let Some(next) = tokens.next() else {
            if let Some(attr) = attrs.first() {
                return Err(DeriveError::new(attr.span(), "attribute without a field"));
            }
            break;
        };

        let name = match next {
            Tt::Ident(ident) if ident == "pub" => {
                if let Some(Tt::Group(group)) = tokens.peek() {
                    if group.delimiter() == Delimiter::Parenthesis {
                        tokens.next();
                    }
                }
                match tokens.next() {
                    Some(Tt::Ident(name)) => name,
                    other => return Err(unexpected(other, "expected a field name")),
                }
            }
            Tt::Ident(name) => name,
            other => return Err(unexpected(Some(other), "expected a field name")),
        };

        match tokens.next() {
            Some(Tt::Punct(colon)) if colon.as_char() == ':' => {}
            other => return Err(unexpected(other, "expected `:` after the field name")),
        }

        let mut ty = TokenStream2::new();
        let mut depth = 0usize;
        let mut after_dash = false;
        while let Some(token) = tokens.next() {
            if let Tt::Punct(punct) = &token {
                match punct.as_char() {
                    ',' if depth == 0 => break,
                    '<' => depth += 1,
                    '>' if !after_dash => depth = depth.saturating_sub(1),
                    _ => {}
                }
                after_dash = punct.as_char() == '-';
            } else {
                after_dash = false;
            }
            ty.extend(core::iter::once(token));
        }

        if ty.is_empty() {
            return Err(DeriveError::new(name.span(), "expected a field type"));
        }

        fields.push(ParsedField { attrs, name, ty });
    }

    Ok(fields)
}

fn unexpected(token: Option<Tt>, message: &str) -> DeriveError {
    let span = token.map_or_else(Span::call_site, |t| t.span());
    DeriveError::new(span, message)
}

/// Returns the parsed `#[param(...)]` pairs, or `None` if the field has no `#[param]`.
fn param_attrs(field: &ParsedField) -> DeriveResult<Option<Vec<ParamAttr>>> {
    let mut found: Option<Vec<ParamAttr>> = None;

    for attr in &field.attrs {
        let mut inner = attr.stream().into_iter();
        match inner.next() {
            Some(Tt::Ident(ident)) if ident == "param" => {}
            _ => continue,
        }

        if found.is_some() {
            return Err(DeriveError::new(
                attr.span(),
                "only one #[param] attribute is allowed per field",
            ));
        }

        let pairs = match inner.next() {
            None => Vec::new(),
            Some(Tt::Group(args)) if args.delimiter() == Delimiter::Parenthesis => {
                if let Some(extra) = inner.next() {
                    return Err(DeriveError::new(
                        extra.span(),
                        "unexpected tokens after #[param(...)]",
                    ));
                }
                parse_param_args(args.stream())?
            }
            Some(other) => return Err(DeriveError::new(other.span(), "expected #[param(...)]")),
        };
        found = Some(pairs);
    }

    Ok(found)
}

fn parse_param_args(args: TokenStream2) -> DeriveResult<Vec<ParamAttr>> {
    let mut pairs: Vec<ParamAttr> = Vec::new();
    let mut tokens = args.into_iter().peekable();

    while let Some(token) = tokens.next() {
        let key = match token {
            Tt::Ident(key) => key,
            other => return Err(DeriveError::new(other.span(), "expected an attribute name")),
        };
        let key_str = key.to_string();
        if !KNOWN_PARAM_KEYS.contains(&key_str.as_str()) {
            return Err(DeriveError::new(
                key.span(),
                format!(
                    "unknown param attribute `{key_str}`, expected one of: key, default, required"
                ),
            ));
        }
        if pairs.iter().any(|pair| pair.key == key_str) {
            return Err(DeriveError::new(
                key.span(),
                format!("duplicate param attribute `{key_str}`"),
            ));
        }

        let value = match tokens.peek() {
            Some(Tt::Punct(eq)) if eq.as_char() == '=' => {
                tokens.next();
                match tokens.next() {
                    Some(Tt::Literal(lit)) if is_string_literal(&lit) => lit,
                    other => {
                        return Err(unexpected(
                            other,
                            &format!("`{key_str}` expects a string literal"),
                        ));
                    }
                }
            }
            _ if key_str == "required" => {
                let mut lit = proc_macro2::Literal::string("true");
                lit.set_span(key.span());
                lit
            }
            _ => {
                return Err(DeriveError::new(
                    key.span(),
                    format!("`{key_str}` expects a value, e.g. {key_str} = \"...\""),
                ));
            }
        };

        pairs.push(ParamAttr {
            key: key_str,
            value,
        });

        match tokens.next() {
            None => break,
            Some(Tt::Punct(comma)) if comma.as_char() == ',' => {}
            Some(other) => return Err(DeriveError::new(other.span(), "expected `,`")),
        }
    }

    Ok(pairs)
}

fn is_string_literal(lit: &proc_macro2::Literal) -> bool {
    let repr = lit.to_string();
    repr.starts_with('"') || repr.starts_with("r\"") || repr.starts_with("r#")
}

fn field_desc(record: &Ident, field: &ParsedField) -> DeriveResult<TokenStream2> {
    let raw = field.name.to_string();
    let name = raw.strip_prefix("r#").unwrap_or(&raw);

    let Some(pairs) = param_attrs(field)? else {
        return Ok(quote! { ::parambind::Field::unbound(#name) });
    };

    let member = &field.name;
    let ty = &field.ty;
    let attributes = pairs.iter().map(|ParamAttr { key, value }| {
        quote! { ::parambind::FieldAttribute { key: #key, value: #value } }
    });
    let access = format_ident!("record");

    Ok(quote! {
        ::parambind::Field::bound(#name, ::parambind::FieldBinding {
            shape: ::parambind::shape_of::<#ty>,
            attributes: &[#(#attributes),*],
            access: |#access| match #access.downcast_mut::<#record>() {
                ::core::option::Option::Some(#access) => ::core::option::Option::Some(
                    &mut #access.#member as &mut dyn ::core::any::Any,
                ),
                ::core::option::Option::None => ::core::option::Option::None,
            },
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_str(input: TokenStream2) -> String {
        derive_bindable(input).to_string()
    }

    #[test]
    fn bound_and_unbound_fields() {
        let out = expand_str(quote! {
            pub struct Config {
                #[param(key = "port", default = "8080")]
                pub port: u16,
                #[doc = " not bound"]
                cache: HashMap<String, Vec<u8>>,
                #[param(key = "debug", required)]
                debug: bool,
            }
        });

        assert!(out.contains("impl :: parambind :: Bindable for Config"));
        assert!(out.contains(":: parambind :: Field :: unbound (\"cache\")"));
        assert!(out.contains("shape_of :: < u16 >"));
        assert!(out.contains("key : \"default\" , value : \"8080\""));
        assert!(out.contains("key : \"required\" , value : \"true\""));
        assert!(!out.contains("compile_error"));
    }

    #[test]
    fn field_types_keep_their_commas() {
        let fields = split_fields(quote! {
            a: HashMap<String, Vec<u8>>,
            b: fn(u8, u8) -> u8,
            pub(crate) c: Option<Box<dyn Fn(u8) -> u8>>,
        })
        .unwrap();

        let names: Vec<_> = fields.iter().map(|f| f.name.to_string()).collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(
            fields[0].ty.to_string(),
            quote! { HashMap<String, Vec<u8>> }.to_string()
        );
        assert_eq!(
            fields[2].ty.to_string(),
            quote! { Option<Box<dyn Fn(u8) -> u8>> }.to_string()
        );
    }

    #[test]
    fn bare_param_binds_with_empty_key() {
        let fields = split_fields(quote! {
            #[param]
            nested: Inner,
        })
        .unwrap();
        let attrs = param_attrs(&fields[0]).unwrap();
        assert_eq!(attrs.map(|pairs| pairs.len()), Some(0));
    }

    #[test]
    fn raw_identifiers_lose_their_prefix() {
        let out = expand_str(quote! {
            struct Config {
                #[param(key = "type")]
                r#type: String,
            }
        });
        assert!(out.contains("Field :: bound (\"type\""));
        assert!(out.contains("r#type"));
    }

    #[test]
    fn rejects_unknown_attribute() {
        let out = expand_str(quote! {
            struct Config {
                #[param(name = "port")]
                port: u16,
            }
        });
        assert!(out.contains("compile_error"));
        assert!(out.contains("unknown param attribute `name`"));
    }

    #[test]
    fn rejects_duplicate_and_non_string_values() {
        let dup = expand_str(quote! {
            struct Config {
                #[param(key = "a", key = "b")]
                port: u16,
            }
        });
        assert!(dup.contains("duplicate param attribute `key`"));

        let int = expand_str(quote! {
            struct Config {
                #[param(default = 8080)]
                port: u16,
            }
        });
        assert!(int.contains("`default` expects a string literal"));
    }

    #[test]
    fn rejects_generics_tuples_and_enums() {
        let generic = expand_str(quote! { struct Config<T> { #[param] t: T } });
        assert!(generic.contains("does not support generic structs"));

        let tuple = expand_str(quote! { struct Config(u16); });
        assert!(tuple.contains("does not support tuple structs"));

        let enumeration = expand_str(quote! { enum Mode { A, B } });
        assert!(enumeration.contains("only supports structs with named fields"));
    }

    #[test]
    fn unit_structs_have_no_fields() {
        let out = expand_str(quote! { struct Marker; });
        assert!(out.contains("impl :: parambind :: Bindable for Marker"));
        assert!(!out.contains("Field :: bound"));
        assert!(!out.contains("compile_error"));
    }
}
