use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Attribute, FnArg, GenericArgument, Ident, ItemTrait, LitStr, Pat, PathArguments, ReturnType,
    Signature, Token, TraitItem, TraitItemFn, Type, parse_macro_input, punctuated::Punctuated,
    spanned::Spanned,
};

use crate::request_line::{HeaderLine, RequestLine, parse_header_line, parse_request_line};

/// Attributes consumed by `#[rest_api]`
const REQUEST_LINE: &str = "request_line";
const HEADERS: &str = "headers";

/// Inherent methods of `Proxy`, which would shadow trait methods of the same name
const PROXY_METHODS: &[&str] = &[
    "call",
    "command",
    "config",
    "encode_body",
    "execute",
    "fallback",
    "fallback_for",
    "target",
];

/// A request method extracted from the trait
struct RequestMethod {
    sig: Signature,
    name: Ident,
    method_key: String,
    line: RequestLine,
    headers: Vec<HeaderLine>,
    args: Vec<(Ident, Type)>,
    body: Option<Ident>,
    raw_response: bool,
    ok_type: Type,
}

pub fn rest_api_impl(attr: TokenStream, item: TokenStream) -> TokenStream {
    if !attr.is_empty() {
        return syn::Error::new(
            proc_macro2::TokenStream::from(attr).span(),
            "#[rest_api] takes no arguments",
        )
        .to_compile_error()
        .into();
    }

    let mut input = parse_macro_input!(item as ItemTrait);
    match expand(&mut input) {
        Ok(expanded) => expanded.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: &mut ItemTrait) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new(
            input.generics.span(),
            "#[rest_api] traits cannot be generic",
        ));
    }

    let trait_name = input.ident.clone();
    let shared_headers = take_headers(&mut input.attrs)?;

    let mut methods = Vec::new();
    for item in input.items.iter_mut() {
        let TraitItem::Fn(method) = item else {
            continue;
        };

        let name = method.sig.ident.to_string();
        if PROXY_METHODS.contains(&name.as_str()) {
            return Err(syn::Error::new(
                method.sig.ident.span(),
                format!(
                    "method name `{}` is reserved by the generated client\n\
                     hint: rename the method; reserved names are {}",
                    name,
                    PROXY_METHODS.join(", ")
                ),
            ));
        }

        let line = take_request_line(&mut method.attrs)?;
        let own_headers = take_headers(&mut method.attrs)?;

        match line {
            Some(line) => {
                let mut headers = shared_headers.clone();
                headers.extend(own_headers);
                methods.push(analyze_method(&trait_name, method, line, headers)?);
            }
            None => {
                if !own_headers.is_empty() {
                    return Err(syn::Error::new(
                        method.sig.ident.span(),
                        "#[headers] requires #[request_line] on the same method",
                    ));
                }
                if method.default.is_none() {
                    return Err(syn::Error::new(
                        method.sig.ident.span(),
                        format!(
                            "method `{}` needs #[request_line(\"VERB /path\")] or a default body",
                            method.sig.ident
                        ),
                    ));
                }
            }
        }
    }

    let signatures: Vec<_> = methods.iter().map(|m| &m.sig).collect();
    let bodies: Vec<_> = methods.iter().map(generate_body).collect();

    let expanded = quote! {
        #input

        #[::armature_rest_client::__private::async_trait]
        impl #trait_name for ::armature_rest_client::Proxy<dyn #trait_name> {
            #(
                #signatures {
                    #bodies
                }
            )*
        }
    };

    Ok(expanded)
}

/// Remove `#[request_line("...")]` from the attributes and parse it
fn take_request_line(attrs: &mut Vec<Attribute>) -> syn::Result<Option<RequestLine>> {
    let mut found = None;
    let mut error = None;

    attrs.retain(|attr| {
        if !attr.path().is_ident(REQUEST_LINE) {
            return true;
        }
        if found.is_some() {
            error = Some(syn::Error::new(attr.span(), "duplicate #[request_line]"));
            return false;
        }
        match attr
            .parse_args::<LitStr>()
            .and_then(|lit| parse_request_line(&lit.value(), lit.span()))
        {
            Ok(line) => found = Some(line),
            Err(e) => error = Some(e),
        }
        false
    });

    match error {
        Some(e) => Err(e),
        None => Ok(found),
    }
}

/// Remove every `#[headers("Name: value", ...)]` from the attributes and parse them
fn take_headers(attrs: &mut Vec<Attribute>) -> syn::Result<Vec<HeaderLine>> {
    let mut headers = Vec::new();
    let mut error = None;

    attrs.retain(|attr| {
        if !attr.path().is_ident(HEADERS) {
            return true;
        }
        let parsed = attr
            .parse_args_with(Punctuated::<LitStr, Token![,]>::parse_terminated)
            .and_then(|lits| {
                lits.iter()
                    .map(|lit| parse_header_line(&lit.value(), lit.span()))
                    .collect::<syn::Result<Vec<_>>>()
            });
        match parsed {
            Ok(parsed) => headers.extend(parsed),
            Err(e) => error = Some(e),
        }
        false
    });

    match error {
        Some(e) => Err(e),
        None => Ok(headers),
    }
}

fn analyze_method(
    trait_name: &Ident,
    method: &TraitItemFn,
    line: RequestLine,
    headers: Vec<HeaderLine>,
) -> syn::Result<RequestMethod> {
    let sig = &method.sig;

    if sig.asyncness.is_none() {
        return Err(syn::Error::new(
            sig.fn_token.span(),
            "request methods must be `async fn`\n\
             hint: place #[rest_api] above #[async_trait]",
        ));
    }

    match sig.inputs.first() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new(
                sig.ident.span(),
                "request methods must take `&self`",
            ));
        }
    }

    let mut args = Vec::new();
    for input in sig.inputs.iter().skip(1) {
        let FnArg::Typed(pat_type) = input else {
            continue;
        };
        let Pat::Ident(pat_ident) = pat_type.pat.as_ref() else {
            return Err(syn::Error::new(
                pat_type.pat.span(),
                "request method arguments must be plain identifiers",
            ));
        };
        args.push((pat_ident.ident.clone(), (*pat_type.ty).clone()));
    }

    let placeholders: Vec<&String> = line
        .placeholders
        .iter()
        .chain(headers.iter().flat_map(|h| h.placeholders.iter()))
        .collect();

    for placeholder in &placeholders {
        if !args.iter().any(|(ident, _)| ident == placeholder.as_str()) {
            return Err(syn::Error::new(
                sig.ident.span(),
                format!("placeholder `{{{}}}` does not name an argument", placeholder),
            ));
        }
    }

    let mut body_args = args
        .iter()
        .filter(|(ident, _)| !placeholders.iter().any(|p| ident == p.as_str()))
        .map(|(ident, _)| ident.clone());
    let body = body_args.next();
    if let Some(extra) = body_args.next() {
        return Err(syn::Error::new(
            extra.span(),
            format!(
                "`{}` is neither a placeholder nor the body\n\
                 hint: a request method takes at most one body argument",
                extra
            ),
        ));
    }

    let ok_type = ok_type(&sig.output)?;
    let raw_response = is_raw_response(&ok_type);

    let arg_types: Vec<String> = args.iter().map(|(_, ty)| type_name(ty)).collect();
    let method_key = format!("{}#{}({})", trait_name, sig.ident, arg_types.join(","));

    Ok(RequestMethod {
        sig: sig.clone(),
        name: sig.ident.clone(),
        method_key,
        line,
        headers,
        args,
        body,
        raw_response,
        ok_type,
    })
}

/// Extract `X` from a `Result<X, ..>` return type
fn ok_type(output: &ReturnType) -> syn::Result<Type> {
    let error = || {
        syn::Error::new(
            output.span(),
            "request methods must return `Result<T, E>` where `E: From<RestClientError>`",
        )
    };

    let ReturnType::Type(_, ty) = output else {
        return Err(error());
    };
    let Type::Path(type_path) = ty.as_ref() else {
        return Err(error());
    };
    let segment = type_path.path.segments.last().ok_or_else(error)?;
    if segment.ident != "Result" {
        return Err(error());
    }
    let PathArguments::AngleBracketed(generics) = &segment.arguments else {
        return Err(error());
    };
    match generics.args.first() {
        Some(GenericArgument::Type(ty)) => Ok(ty.clone()),
        _ => Err(error()),
    }
}

/// A `Response` success type returns the raw response
fn is_raw_response(ty: &Type) -> bool {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .is_some_and(|segment| segment.ident == "Response" && segment.arguments.is_none()),
        _ => false,
    }
}

/// Short type name used in method keys
fn type_name(ty: &Type) -> String {
    match ty {
        Type::Path(type_path) if type_path.qself.is_none() => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .unwrap_or_default(),
        other => quote!(#other).to_string().replace(' ', ""),
    }
}

fn generate_body(method: &RequestMethod) -> TokenStream2 {
    let name = &method.name;
    let method_key = &method.method_key;
    let verb = format_ident!("{}", method.line.verb);
    let path = &method.line.path;
    let ok_type = &method.ok_type;

    let header_names: Vec<_> = method.headers.iter().map(|h| &h.name).collect();
    let header_values: Vec<_> = method.headers.iter().map(|h| &h.value).collect();

    let mut expanded: Vec<&String> = Vec::new();
    for placeholder in method
        .line
        .placeholders
        .iter()
        .chain(method.headers.iter().flat_map(|h| h.placeholders.iter()))
    {
        if !expanded.contains(&placeholder) {
            expanded.push(placeholder);
        }
    }
    let expand_names: Vec<_> = expanded.iter().map(|p| p.as_str()).collect();
    let expand_idents: Vec<_> = expanded.iter().map(|p| format_ident!("{}", p)).collect();
    let expansion = if expanded.is_empty() {
        quote! {}
    } else {
        quote! {
            __template.expand(&[
                #( (#expand_names, &#expand_idents as &dyn ::core::fmt::Display), )*
            ]);
        }
    };

    let arg_idents: Vec<_> = method.args.iter().map(|(ident, _)| ident).collect();

    let send = if method.raw_response {
        quote! { self.execute(#method_key, __template).await }
    } else {
        quote! { self.call::<#ok_type>(#method_key, __template).await }
    };

    let exchange = match &method.body {
        Some(body) => quote! {
            match self.encode_body(&mut __template, &#body) {
                ::core::result::Result::Ok(()) => #send,
                ::core::result::Result::Err(__error) => ::core::result::Result::Err(__error),
            }
        },
        None => send,
    };

    quote! {
        let __outcome = {
            #[allow(unused_mut)]
            let mut __template = ::armature_rest_client::RequestTemplate::new(
                ::armature_rest_client::Method::#verb,
                #path,
            );
            #( __template.header(#header_names, #header_values); )*
            #expansion
            #exchange
        };

        match __outcome {
            ::core::result::Result::Ok(__value) => ::core::result::Result::Ok(__value),
            ::core::result::Result::Err(__cause) => {
                self.fallback_for(__cause)?.#name(#(#arg_idents),*).await
            }
        }
    }
}
