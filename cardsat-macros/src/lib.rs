//! Procedural macros used internally by cardsat.
use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::{parse_quote, Attribute, Expr, Lit, LitStr, Meta, MetaNameValue};
use synstructure::decl_derive;

/// Extracts the `(Default: <expr>)` annotation from a field's doc comments.
///
/// The last annotation wins when a field documents several.
fn doc_default(attrs: &[Attribute]) -> Result<Option<Expr>, syn::Error> {
    let default_re = regex::Regex::new(r"\(Default: ([^)]*(?:\([^)]*\)[^)]*)*)\)").unwrap();

    let mut found = None;

    for attr in attrs {
        let doc_str = match attr.parse_meta() {
            Ok(Meta::NameValue(MetaNameValue {
                ref ident,
                lit: Lit::Str(ref doc_str),
                ..
            })) if ident == "doc" => doc_str.clone(),
            _ => continue,
        };

        if let Some(captures) = default_re.captures(&doc_str.value()) {
            let expr_str = LitStr::new(captures[1].trim(), doc_str.span());
            found = Some(expr_str.parse::<Expr>().map_err(|err| {
                syn::Error::new(
                    doc_str.span(),
                    format!("cannot parse documented default value: {}", err),
                )
            })?);
        }
    }

    Ok(found)
}

/// Derives `Default` using values documented as `(Default: <expr>)` on each field.
///
/// Fields without such an annotation fall back to `Default::default()`.
fn derive_doc_default(s: synstructure::Structure) -> TokenStream {
    let variant = match s.variants() {
        [variant] if s.ast().generics.params.is_empty() => variant,
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "DocDefault can only be derived for non-generic structs",
            )
            .to_compile_error()
        }
    };

    let mut defaults = vec![];
    for field in variant.ast().fields.iter() {
        match doc_default(&field.attrs) {
            Ok(default) => defaults.push(default),
            Err(err) => return err.to_compile_error(),
        }
    }

    let mut defaults = defaults.into_iter();

    let body = variant.construct(|_, _| {
        defaults
            .next()
            .and_then(|default| default)
            .unwrap_or_else(|| parse_quote!(Default::default()))
    });

    s.gen_impl(quote! {
        gen impl Default for @Self {
            fn default() -> Self {
                #body
            }
        }
    })
}

decl_derive!([DocDefault] => derive_doc_default);
