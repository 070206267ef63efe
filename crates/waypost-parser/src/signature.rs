//! Signature validation for discovered entry points
//!
//! Inspects only the parameter and return types of a parsed declaration;
//! bodies are never looked at. Every type check accepts both qualified
//! (`waypost::Context`) and unqualified (`Context`) spellings.

use std::fmt;
use syn::{FnArg, GenericArgument, PathArguments, ReturnType, Signature, Type};

/// Why a declaration did not match the expected shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureMismatch {
    Async,
    ParamCount { expected: usize, found: usize },
    Receiver,
    ParamType { expected: &'static str },
    MissingReturn,
    ReturnType { expected: &'static str },
}

impl fmt::Display for SignatureMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureMismatch::Async => write!(f, "async entry points are not supported"),
            SignatureMismatch::ParamCount { expected, found } => {
                write!(f, "expected {} parameter(s), found {}", expected, found)
            }
            SignatureMismatch::Receiver => write!(f, "methods taking `self` are not entry points"),
            SignatureMismatch::ParamType { expected } => {
                write!(f, "parameter must be `{}`", expected)
            }
            SignatureMismatch::MissingReturn => write!(f, "missing return type"),
            SignatureMismatch::ReturnType { expected } => {
                write!(f, "return type must be `{}`", expected)
            }
        }
    }
}

const CONTEXT_PARAM: &str = "&mut Context";
const HANDLER_TYPE: &str = "Handler";

/// `fn get(ctx: &mut Context) -> Result<..>`
pub fn check_handler(sig: &Signature) -> Result<(), SignatureMismatch> {
    let param = single_param(sig)?;
    if !is_context_ref(param) {
        return Err(SignatureMismatch::ParamType {
            expected: CONTEXT_PARAM,
        });
    }

    let ret = return_type(sig)?;
    if result_args(ret).is_none() {
        return Err(SignatureMismatch::ReturnType { expected: "Result" });
    }
    Ok(())
}

/// `fn middleware(next: Handler) -> Handler`
pub fn check_middleware(sig: &Signature) -> Result<(), SignatureMismatch> {
    let param = single_param(sig)?;
    if !path_ends_with(param, HANDLER_TYPE) {
        return Err(SignatureMismatch::ParamType {
            expected: HANDLER_TYPE,
        });
    }

    let ret = return_type(sig)?;
    if !path_ends_with(ret, HANDLER_TYPE) {
        return Err(SignatureMismatch::ReturnType {
            expected: HANDLER_TYPE,
        });
    }
    Ok(())
}

/// `fn proxy(ctx: &mut Context) -> Result<ProxyResult, E>`
pub fn check_proxy(sig: &Signature) -> Result<(), SignatureMismatch> {
    let param = single_param(sig)?;
    if !is_context_ref(param) {
        return Err(SignatureMismatch::ParamType {
            expected: CONTEXT_PARAM,
        });
    }

    let ret = return_type(sig)?;
    let ok_type = result_args(ret).and_then(|args| {
        args.into_iter().find_map(|arg| match arg {
            GenericArgument::Type(ty) => Some(ty),
            _ => None,
        })
    });

    match ok_type {
        Some(ty) if path_ends_with(ty, "ProxyResult") => Ok(()),
        _ => Err(SignatureMismatch::ReturnType {
            expected: "Result<ProxyResult>",
        }),
    }
}

pub fn is_handler(sig: &Signature) -> bool {
    check_handler(sig).is_ok()
}

pub fn is_middleware(sig: &Signature) -> bool {
    check_middleware(sig).is_ok()
}

pub fn is_proxy(sig: &Signature) -> bool {
    check_proxy(sig).is_ok()
}

fn single_param(sig: &Signature) -> Result<&Type, SignatureMismatch> {
    if sig.asyncness.is_some() {
        return Err(SignatureMismatch::Async);
    }

    if sig.inputs.len() != 1 {
        return Err(SignatureMismatch::ParamCount {
            expected: 1,
            found: sig.inputs.len(),
        });
    }

    match sig.inputs.first() {
        Some(FnArg::Typed(pat)) => Ok(&pat.ty),
        Some(FnArg::Receiver(_)) => Err(SignatureMismatch::Receiver),
        None => Err(SignatureMismatch::ParamCount {
            expected: 1,
            found: 0,
        }),
    }
}

fn return_type(sig: &Signature) -> Result<&Type, SignatureMismatch> {
    match &sig.output {
        ReturnType::Type(_, ty) => Ok(ty),
        ReturnType::Default => Err(SignatureMismatch::MissingReturn),
    }
}

/// Strips parentheses and invisible groups around a type
fn peel(ty: &Type) -> &Type {
    match ty {
        Type::Paren(inner) => peel(&inner.elem),
        Type::Group(inner) => peel(&inner.elem),
        other => other,
    }
}

fn last_segment(ty: &Type) -> Option<&syn::PathSegment> {
    match peel(ty) {
        Type::Path(path) if path.qself.is_none() => path.path.segments.last(),
        _ => None,
    }
}

/// `Name` or `some::path::Name`
fn path_ends_with(ty: &Type, name: &str) -> bool {
    last_segment(ty).is_some_and(|seg| seg.ident == name)
}

/// `&Context` / `&mut Context`, qualified or not
fn is_context_ref(ty: &Type) -> bool {
    match peel(ty) {
        Type::Reference(reference) => path_ends_with(&reference.elem, "Context"),
        _ => false,
    }
}

/// Generic arguments of a `Result` return type (empty for aliases like `Result`)
fn result_args(ty: &Type) -> Option<Vec<&GenericArgument>> {
    let seg = last_segment(ty).filter(|seg| seg.ident == "Result")?;
    match &seg.arguments {
        PathArguments::AngleBracketed(args) => Some(args.args.iter().collect()),
        PathArguments::None => Some(Vec::new()),
        PathArguments::Parenthesized(_) => None,
    }
}
