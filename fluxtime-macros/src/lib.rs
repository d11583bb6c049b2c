//! fluxtime Macros
//!
//! Procedural macros for snippet registration.
//!
//! ## Macros
//!
//! - `#[fluxtime::snippet]` - Register a function as a timeable snippet

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{ItemFn, parse_macro_input};

mod attr {
    use syn::meta::ParseNestedMeta;

    /// Get the attribute name as a string
    pub fn name(meta: &ParseNestedMeta) -> String {
        meta.path
            .get_ident()
            .map(|i| i.to_string())
            .unwrap_or_default()
    }

    /// Parse a string literal attribute: `attr = "value"`
    pub fn string(meta: &ParseNestedMeta) -> syn::Result<String> {
        let value: syn::LitStr = meta.value()?.parse()?;
        Ok(value.value())
    }

    /// Create an unknown attribute error
    pub fn unknown(meta: &ParseNestedMeta, name: &str) -> syn::Error {
        meta.error(format!("unknown attribute: {}", name))
    }
}

#[derive(Default)]
struct SnippetConfig {
    name: Option<String>,
}

/// Register a snippet function
///
/// The function is registered under its own name unless `name = "..."` is
/// given. Snippet names are what the command line statement and `-s` setup
/// lines refer to.
///
/// # Example
///
/// ```ignore
/// #[fluxtime::snippet]
/// fn sort_small() {
///     let mut v = vec![3, 1, 2];
///     v.sort();
///     std::hint::black_box(v);
/// }
///
/// #[fluxtime::snippet(name = "fill-cache")]
/// fn fill_cache() { /* ... */ }
/// ```
#[proc_macro_attribute]
pub fn snippet(args: TokenStream, item: TokenStream) -> TokenStream {
    let args = TokenStream2::from(args);
    let func = parse_macro_input!(item as ItemFn);

    snippet_impl(args, func)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

fn snippet_impl(args: TokenStream2, func: ItemFn) -> Result<TokenStream2, syn::Error> {
    validate_signature(&func)?;
    let config = parse_snippet_config(args)?;

    let fn_name = &func.sig.ident;
    let name = config.name.unwrap_or_else(|| fn_name.to_string());
    validate_name(&name, &func)?;

    Ok(quote! {
        #func

        ::fluxtime::internal::inventory::submit! {
            ::fluxtime::SnippetDef {
                name: #name,
                func: #fn_name,
                file: file!(),
                line: line!(),
                module_path: module_path!(),
            }
        }
    })
}

fn parse_snippet_config(args: TokenStream2) -> Result<SnippetConfig, syn::Error> {
    let mut config = SnippetConfig::default();

    if args.is_empty() {
        return Ok(config);
    }

    let parser = syn::meta::parser(|meta| {
        let name = attr::name(&meta);
        match name.as_str() {
            "name" => config.name = Some(attr::string(&meta)?),
            _ => return Err(attr::unknown(&meta, &name)),
        }
        Ok(())
    });

    syn::parse::Parser::parse2(parser, args)?;
    Ok(config)
}

fn validate_signature(func: &ItemFn) -> syn::Result<()> {
    let sig = &func.sig;
    if !sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.inputs,
            "fluxtime: snippet functions take no arguments",
        ));
    }
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(
            sig.asyncness,
            "fluxtime: snippet functions cannot be async",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "fluxtime: snippet functions cannot be generic",
        ));
    }
    if !matches!(sig.output, syn::ReturnType::Default) {
        return Err(syn::Error::new_spanned(
            &sig.output,
            "fluxtime: snippet functions must return `()`; wrap results in `std::hint::black_box`",
        ));
    }
    Ok(())
}

fn validate_name(name: &str, func: &ItemFn) -> syn::Result<()> {
    if name.trim().is_empty() || name.contains('\n') || name.trim() != name {
        return Err(syn::Error::new_spanned(
            &func.sig.ident,
            "fluxtime: snippet names must be a single non-empty line without surrounding spaces",
        ));
    }
    if name == "pass" {
        return Err(syn::Error::new_spanned(
            &func.sig.ident,
            "fluxtime: `pass` is reserved for the built-in no-op snippet",
        ));
    }
    Ok(())
}
