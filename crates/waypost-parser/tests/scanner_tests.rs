//! Integration tests for the directory scanner
//!
//! Each test lays out a small application under a temporary directory.

use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use waypost_parser::{DiagnosticKind, ScanError, Scanner, STAGING_MANIFEST};
use waypost_router::Method;

const HANDLERS: &str = r#"
use waypost::{Context, Result};

pub fn get(ctx: &mut Context) -> Result<()> { Ok(()) }
pub fn post(ctx: &mut Context) -> Result<()> { Ok(()) }
"#;

const MIDDLEWARE: &str = r#"
use waypost::Handler;

pub fn middleware(next: Handler) -> Handler { next }
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn app() -> TempDir {
    tempfile::tempdir().unwrap()
}

// ============================================================================
// Walk
// ============================================================================

#[test]
fn test_missing_root_is_empty() {
    let dir = app();
    let result = Scanner::new(dir.path().join("nope")).scan().unwrap();
    assert!(result.is_empty());
    assert!(result.diagnostics.is_empty());
}

#[test]
fn test_routes_in_file_name_order() {
    let dir = app();
    write(dir.path(), "users/[id]/route.rs", HANDLERS);
    write(dir.path(), "about/route.rs", "pub fn get(ctx: &Context) -> Result<()> { Ok(()) }");
    write(dir.path(), "route.rs", HANDLERS);

    let result = Scanner::new(dir.path()).scan().unwrap();
    let found: Vec<(Method, &str)> = result
        .routes
        .iter()
        .map(|r| (r.method, r.pattern.as_str()))
        .collect();

    assert_eq!(
        found,
        vec![
            (Method::Get, "/about"),
            (Method::Get, "/"),
            (Method::Post, "/"),
            (Method::Get, "/users/{id}"),
            (Method::Post, "/users/{id}"),
        ]
    );
    assert_eq!(result.routes[3].params, vec!["id"]);
    assert_eq!(result.routes[3].handler, "get");
}

#[test]
fn test_hidden_private_and_staging_dirs_are_pruned() {
    let dir = app();
    write(dir.path(), "_components/route.rs", HANDLERS);
    write(dir.path(), ".cache/route.rs", HANDLERS);
    write(dir.path(), "staged/route.rs", HANDLERS);
    write(dir.path(), &format!("staged/{}", STAGING_MANIFEST), "{}");
    write(dir.path(), "extra/route.rs", HANDLERS);
    write(dir.path(), "visible/route.rs", HANDLERS);

    let result = Scanner::new(dir.path())
        .skip_dir(dir.path().join("extra"))
        .scan()
        .unwrap();

    assert!(result.routes.iter().all(|r| r.pattern == "/visible"));
    assert_eq!(result.routes.len(), 2);
}

#[test]
fn test_route_groups_scope_records() {
    let dir = app();
    write(dir.path(), "(admin)/middleware.rs", MIDDLEWARE);
    write(dir.path(), "(admin)/users/route.rs", HANDLERS);

    let result = Scanner::new(dir.path()).scan().unwrap();
    assert_eq!(result.middleware.len(), 1);
    assert_eq!(result.middleware[0].scope, "(admin)");
    assert_eq!(result.middleware[0].prefix, "/");
    assert_eq!(result.routes[0].pattern, "/users");
    assert_eq!(result.routes[0].scope, "(admin)/users");
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn test_invalid_handlers_are_skipped_not_fatal() {
    let dir = app();
    write(
        dir.path(),
        "items/route.rs",
        r#"
        pub fn get(ctx: &mut Context) -> Result<()> { Ok(()) }
        pub fn put(ctx: &mut Context, extra: u8) -> Result<()> { Ok(()) }
        pub async fn delete(ctx: &mut Context) -> Result<()> { Ok(()) }
        pub fn helper(ctx: &mut Context) -> Result<()> { Ok(()) }
        fn post(ctx: &mut Context) -> Result<()> { Ok(()) }
        "#,
    );

    let result = Scanner::new(dir.path()).scan().unwrap();
    assert_eq!(result.routes.len(), 1);
    assert_eq!(result.routes[0].method, Method::Get);

    let skipped: Vec<&str> = result.skipped().map(|d| d.message.as_str()).collect();
    assert_eq!(skipped.len(), 2);
    assert!(skipped[0].contains("`put`"));
    assert!(skipped[1].contains("async"));
}

#[test]
fn test_unparseable_file_aborts_scan() {
    let dir = app();
    write(dir.path(), "ok/route.rs", HANDLERS);
    write(dir.path(), "broken/route.rs", "pub fn get(ctx: &mut Context -> {");

    let err = Scanner::new(dir.path()).scan().unwrap_err();
    match err {
        ScanError::Parse { path, .. } => assert!(path.ends_with("broken/route.rs")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_first_valid_middleware_wins() {
    let dir = app();
    write(
        dir.path(),
        "middleware.rs",
        r#"
        pub fn middleware(next: Handler, extra: u8) -> Handler { next }
        "#,
    );

    let result = Scanner::new(dir.path()).scan().unwrap();
    assert!(result.middleware.is_empty());
    assert_eq!(result.skipped().count(), 1);

    write(dir.path(), "middleware.rs", MIDDLEWARE);
    let result = Scanner::new(dir.path()).scan().unwrap();
    assert_eq!(result.middleware.len(), 1);
    assert!(result.middleware[0].is_global());
}

#[test]
fn test_proxy_only_at_root() {
    let dir = app();
    let proxy = r#"
        pub const PROXY_CONFIG: ProxyConfig = ProxyConfig { matcher: &["/api/:path*"] };
        pub fn proxy(ctx: &mut Context) -> Result<ProxyResult, Error> { todo!() }
    "#;
    write(dir.path(), "nested/proxy.rs", proxy);

    let result = Scanner::new(dir.path()).scan().unwrap();
    assert!(result.proxy.is_none());
    assert_eq!(result.skipped().count(), 1);

    write(dir.path(), "proxy.rs", proxy);
    let result = Scanner::new(dir.path()).scan().unwrap();
    let descriptor = result.proxy.unwrap();
    assert!(descriptor.has_valid_signature);
    assert_eq!(descriptor.matcher_patterns, vec!["/api/:path*"]);
}

#[test]
fn test_proxy_with_bad_signature_is_recorded_invalid() {
    let dir = app();
    write(
        dir.path(),
        "proxy.rs",
        "pub fn proxy(ctx: &mut Context) -> Result<()> { Ok(()) }",
    );

    let result = Scanner::new(dir.path()).scan().unwrap();
    let descriptor = result.proxy.unwrap();
    assert!(!descriptor.has_valid_signature);
    assert!(descriptor.matcher_patterns.is_empty());
}

#[test]
fn test_page_params_marked_by_origin() {
    let dir = app();
    write(
        dir.path(),
        "blog/[slug]/page.rs",
        r#"
        pub const TITLE: &str = "Post";
        pub fn page(slug, draft: String, author: Author) -> Markup { html! {} }
        "#,
    );

    let result = Scanner::new(dir.path()).scan().unwrap();
    let page = &result.pages[0];
    assert_eq!(page.pattern, "/blog/{slug}");
    assert_eq!(page.url_params, vec!["slug"]);
    assert_eq!(page.title.as_deref(), Some("Post"));

    let params: Vec<(&str, &str, bool)> = page
        .params
        .iter()
        .map(|p| (p.name.as_str(), p.ty.as_str(), p.from_url))
        .collect();
    assert_eq!(
        params,
        vec![
            ("slug", "String", true),
            ("draft", "String", false),
            ("author", "Author", false)
        ]
    );
}

#[test]
fn test_layout_requires_children_marker() {
    let dir = app();
    write(
        dir.path(),
        "dashboard/layout.rs",
        "pub fn layout(children: Markup) -> Markup { html! { div { (children) } } }",
    );
    write(
        dir.path(),
        "settings/layout.rs",
        "pub fn layout(children: Markup) -> Markup { html! { div {} } }",
    );

    let result = Scanner::new(dir.path()).scan().unwrap();
    assert_eq!(result.layouts.len(), 1);
    assert_eq!(result.layouts[0].prefix, "/dashboard");

    let skipped: Vec<_> = result.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].kind, DiagnosticKind::SkippedDeclaration);
    assert!(skipped[0].file.ends_with("settings/layout.rs"));
}
