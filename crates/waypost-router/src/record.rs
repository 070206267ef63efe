//! Registration records produced by the scanner
//!
//! Records are created once per scan and never mutated afterwards.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::segment::Translation;

/// HTTP verbs a route file may export a handler for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl Method {
    pub const ALL: [Method; 7] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Head,
        Method::Options,
    ];

    /// Resolves the exported function name of a handler (`get`, `post`, ...)
    ///
    /// ```
    /// use waypost_router::Method;
    ///
    /// assert_eq!(Method::from_handler_name("delete"), Some(Method::Delete));
    /// assert_eq!(Method::from_handler_name("GET"), None);
    /// assert_eq!(Method::from_handler_name("helper"), None);
    /// ```
    pub fn from_handler_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.handler_name() == name)
    }

    /// Name of the handler function exporting this verb
    pub fn handler_name(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Post => "post",
            Method::Put => "put",
            Method::Patch => "patch",
            Method::Delete => "delete",
            Method::Head => "head",
            Method::Options => "options",
        }
    }

    /// Wire spelling (`GET`)
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Head => "HEAD",
            Method::Options => "OPTIONS",
        }
    }

    /// Variant name as spelled in generated code (`Get`)
    pub fn variant_name(&self) -> &'static str {
        match self {
            Method::Get => "Get",
            Method::Post => "Post",
            Method::Put => "Put",
            Method::Patch => "Patch",
            Method::Delete => "Delete",
            Method::Head => "Head",
            Method::Options => "Options",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One exported handler of a route file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteRecord {
    pub method: Method,
    /// URL pattern like `/users/{id}`
    pub pattern: String,
    /// Parameter names in pattern order (wildcard names included)
    pub params: Vec<String>,
    pub priority: u32,
    pub source_file: PathBuf,
    /// Name of the exported handler function
    pub handler: String,
    /// Scope used for middleware matching
    pub scope: String,
    /// A trailing `*` from `[[...name]]`, which also matches nothing
    pub optional_wildcard: bool,
}

impl RouteRecord {
    pub fn new(
        method: Method,
        translation: &Translation,
        source_file: impl Into<PathBuf>,
        handler: impl Into<String>,
    ) -> Self {
        Self {
            method,
            pattern: translation.pattern.clone(),
            params: translation.params.clone(),
            priority: translation.priority,
            source_file: source_file.into(),
            handler: handler.into(),
            scope: translation.scope.clone(),
            optional_wildcard: translation.optional_wildcard,
        }
    }
}

/// A discovered `middleware` entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiddlewareRecord {
    /// URL prefix of the directory holding the middleware
    pub prefix: String,
    pub scope: String,
    pub source_file: PathBuf,
    pub identifier: String,
}

impl MiddlewareRecord {
    pub fn new(
        translation: &Translation,
        source_file: impl Into<PathBuf>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            prefix: translation.pattern.clone(),
            scope: translation.scope.clone(),
            source_file: source_file.into(),
            identifier: identifier.into(),
        }
    }

    /// Root middleware applies to every route
    pub fn is_global(&self) -> bool {
        self.scope.is_empty()
    }
}

/// The application's proxy stage, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyDescriptor {
    pub source_file: PathBuf,
    pub has_valid_signature: bool,
    /// Matcher patterns in declaration order; empty means "every path"
    pub matcher_patterns: Vec<String>,
}

/// A parameter declared by a page or layout entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageParam {
    pub name: String,
    /// Type as written in the declaration
    pub ty: String,
    pub from_url: bool,
}

/// Types the runtime can parse straight out of a path segment
const SCALAR_TYPES: &[&str] = &[
    "String", "&str", "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16",
    "u32", "u64", "u128", "usize", "f32", "f64",
];

impl PageParam {
    pub fn new(name: impl Into<String>, ty: impl Into<String>, from_url: bool) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            from_url,
        }
    }

    /// Whether the type is a simple scalar extractable from the URL
    pub fn is_scalar(&self) -> bool {
        let ty = self.ty.replace(' ', "");
        let ty = ty.strip_prefix("std::string::").unwrap_or(&ty);
        let ty = ty.replace("&'static", "&");
        SCALAR_TYPES.contains(&ty.as_str())
    }

    /// Whether the declaration borrows a string (`&str`)
    pub fn is_borrowed_str(&self) -> bool {
        self.ty.replace(' ', "").starts_with('&')
    }
}

/// A discovered `page` entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRecord {
    pub pattern: String,
    pub scope: String,
    pub source_file: PathBuf,
    pub params: Vec<PageParam>,
    /// Parameters the URL pattern provides
    pub url_params: Vec<String>,
    pub title: Option<String>,
    /// The file also exports a `load` data hook
    pub has_loader: bool,
}

/// A discovered `layout` entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutRecord {
    pub prefix: String,
    pub scope: String,
    pub source_file: PathBuf,
    pub params: Vec<PageParam>,
    pub title: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate_path;

    #[test]
    fn test_method_round_trips_handler_names() {
        for method in Method::ALL {
            assert_eq!(Method::from_handler_name(method.handler_name()), Some(method));
        }
    }

    #[test]
    fn test_route_record_copies_translation() {
        let t = translate_path("(shop)/items/[sku]");
        let r = RouteRecord::new(Method::Put, &t, "app/(shop)/items/[sku]/route.rs", "put");
        assert_eq!(r.pattern, "/items/{sku}");
        assert_eq!(r.scope, "(shop)/items/{sku}");
        assert_eq!(r.priority, 50);
        assert_eq!(r.params, vec!["sku"]);
    }

    #[test]
    fn test_scalar_detection() {
        assert!(PageParam::new("id", "i64", true).is_scalar());
        assert!(PageParam::new("slug", "String", true).is_scalar());
        assert!(PageParam::new("slug", "&'static str", true).is_scalar());
        assert!(PageParam::new("name", "& str", true).is_borrowed_str());
        assert!(!PageParam::new("user", "User", false).is_scalar());
        assert!(!PageParam::new("tags", "Vec<String>", false).is_scalar());
    }

    #[test]
    fn test_global_middleware() {
        let m = MiddlewareRecord::new(&translate_path(""), "app/middleware.rs", "middleware");
        assert!(m.is_global());
        assert_eq!(m.prefix, "/");
    }
}
