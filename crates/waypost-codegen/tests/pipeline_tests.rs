//! End-to-end generation tests over temporary application trees

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use waypost_codegen::{check, run, GenerateError, Options, WriteOutcome};
use waypost_parser::{DiagnosticKind, STAGING_MANIFEST};

const HANDLERS: &str = r#"
use waypost::{Context, Result};

pub fn get(ctx: &mut Context) -> Result<()> { Ok(()) }
pub fn post(ctx: &mut Context) -> Result<()> { Ok(()) }
"#;

const POST_ONLY: &str = r#"
pub fn post(ctx: &mut Context) -> Result<()> { Ok(()) }
"#;

const PAGE: &str = r#"
pub fn page() -> Markup { html! { h1 { "Hello" } } }
"#;

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn setup() -> (TempDir, Options) {
    let dir = tempfile::tempdir().unwrap();
    let options = Options::default().rooted(dir.path());
    (dir, options)
}

/// Files under `dir`, relative and sorted
fn tree_listing(dir: &Path) -> Vec<PathBuf> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<PathBuf>) {
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if entry.file_type().unwrap().is_dir() {
                walk(base, &path, out);
            } else {
                out.push(path.strip_prefix(base).unwrap().to_path_buf());
            }
        }
    }
    let mut out = Vec::new();
    walk(dir, dir, &mut out);
    out.sort();
    out
}

fn diagnostics_of(kind: DiagnosticKind, options: &Options) -> usize {
    check(options)
        .unwrap()
        .diagnostics()
        .iter()
        .filter(|d| d.kind == kind)
        .count()
}

// ============================================================================
// Output
// ============================================================================

#[test]
fn test_empty_application_emits_empty_registration() {
    let (dir, options) = setup();

    let generation = run(&options).unwrap();
    assert_eq!(generation.outcome, WriteOutcome::Created);
    assert!(generation
        .source
        .contains("pub fn register(_app: &mut waypost::App) -> waypost::Result<()> {\n    Ok(())\n}"));
    assert!(!generation.source.contains("mod "));
    assert!(!dir.path().join(".waypost").exists());
}

#[test]
fn test_page_wins_get_conflict() {
    let (dir, options) = setup();
    write(dir.path(), "app/users/route.rs", HANDLERS);
    write(dir.path(), "app/users/page.rs", PAGE);

    let generation = run(&options).unwrap();
    let source = &generation.source;
    assert_eq!(source.matches("waypost::Method::Get").count(), 0);
    assert_eq!(source.matches("waypost::Method::Post").count(), 1);
    assert_eq!(source.matches("app.page(\"/users\"").count(), 1);
    assert_eq!(diagnostics_of(DiagnosticKind::Conflict, &options), 1);
}

#[test]
fn test_page_and_non_get_route_coexist() {
    let (dir, options) = setup();
    write(dir.path(), "app/login/route.rs", POST_ONLY);
    write(dir.path(), "app/login/page.rs", PAGE);

    let generation = run(&options).unwrap();
    assert!(generation.source.contains("app.route(waypost::Method::Post, \"/login\""));
    assert!(generation.source.contains("app.page(\"/login\""));
    assert_eq!(diagnostics_of(DiagnosticKind::Conflict, &options), 0);
}

#[test]
fn test_shared_base_alias_gets_suffix() {
    let (dir, options) = setup();
    write(dir.path(), "app/posts/[id]/route.rs", HANDLERS);
    write(dir.path(), "app/users/[id]/route.rs", HANDLERS);

    let source = run(&options).unwrap().source;
    assert_eq!(source.matches("mod id_route;").count(), 1);
    assert_eq!(source.matches("mod id_route2;").count(), 1);
    assert!(source.contains("\"/posts/{id}\", \"posts/{id}\", id_route::get"));
    assert!(source.contains("\"/users/{id}\", \"users/{id}\", id_route2::get"));
}

#[test]
fn test_refuses_to_clobber_hand_written_output() {
    let (dir, options) = setup();
    write(dir.path(), "app/route.rs", HANDLERS);
    write(dir.path(), "app/[id]/route.rs", HANDLERS);
    write(dir.path(), "src/routes_gen.rs", "pub fn mine() {}\n");

    let err = run(&options).unwrap_err();
    assert!(matches!(err, GenerateError::WouldClobber { .. }));
    assert_eq!(
        fs::read_to_string(dir.path().join("src/routes_gen.rs")).unwrap(),
        "pub fn mine() {}\n"
    );
    assert!(!dir.path().join(".waypost").exists());
}

#[test]
fn test_invalid_proxy_pattern_is_fatal() {
    let (dir, options) = setup();
    write(
        dir.path(),
        "app/proxy.rs",
        r#"
        pub const PROXY_CONFIG: ProxyConfig = ProxyConfig { matcher: &["/(en|fr"] };
        pub fn proxy(ctx: &mut Context) -> Result<ProxyResult> { todo!() }
        "#,
    );

    let err = run(&options).unwrap_err();
    assert!(matches!(err, GenerateError::Matcher { .. }));
    assert!(!dir.path().join("src/routes_gen.rs").exists());
}

#[test]
fn test_proxy_registered_first() {
    let (dir, options) = setup();
    write(dir.path(), "app/a/route.rs", HANDLERS);
    write(
        dir.path(),
        "app/proxy.rs",
        r#"
        pub const PROXY_CONFIG: ProxyConfig = ProxyConfig { matcher: &["/api/:path*"] };
        pub fn proxy(ctx: &mut Context) -> Result<ProxyResult> { todo!() }
        "#,
    );

    let source = run(&options).unwrap().source;
    let first_call = source
        .lines()
        .find(|l| l.trim_start().starts_with("app."))
        .unwrap();
    assert_eq!(first_call.trim(), "app.proxy(root_proxy::proxy, &[\"/api/:path*\"])?;");
}

// ============================================================================
// Parameter warnings
// ============================================================================

#[test]
fn test_matching_page_params_produce_no_warnings() {
    let (dir, options) = setup();
    write(
        dir.path(),
        "app/posts/[id]/page.rs",
        "pub fn page(id: i64) -> Markup { html! {} }",
    );
    assert_eq!(diagnostics_of(DiagnosticKind::ParamMismatch, &options), 0);

    let source = run(&options).unwrap().source;
    assert!(source.contains("let id = ctx.param::<i64>(\"id\")?;"));
}

#[test]
fn test_each_mismatched_name_warns_once() {
    let (dir, options) = setup();
    write(
        dir.path(),
        "app/posts/[id]/page.rs",
        "pub fn page(slug: String) -> Markup { html! {} }",
    );

    let analysis = check(&options).unwrap();
    let messages: Vec<&str> = analysis
        .diagnostics()
        .iter()
        .filter(|d| d.kind == DiagnosticKind::ParamMismatch)
        .map(|d| d.message.as_str())
        .collect();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages.iter().filter(|m| m.contains("`id`")).count(), 1);
    assert_eq!(messages.iter().filter(|m| m.contains("`slug`")).count(), 1);
}

// ============================================================================
// Import staging
// ============================================================================

#[test]
fn test_rerun_is_idempotent() {
    let (dir, options) = setup();
    write(dir.path(), "app/middleware.rs", "pub fn middleware(next: Handler) -> Handler { next }");
    write(dir.path(), "app/(shop)/items/[sku]/route.rs", HANDLERS);
    write(dir.path(), "app/(shop)/items/[sku]/page.rs", "pub fn page(sku: String) -> Markup { html! {} }");
    write(dir.path(), "app/docs/[...slug]/route.rs", HANDLERS);

    let first = run(&options).unwrap();
    let staged_first = tree_listing(&options.staging_dir);
    let manifest_first = fs::read_to_string(options.staging_dir.join(STAGING_MANIFEST)).unwrap();

    let second = run(&options).unwrap();
    assert_eq!(second.outcome, WriteOutcome::Unchanged);
    assert_eq!(first.source, second.source);
    assert!(second.staging.is_noop());
    assert_eq!(second.staging.unchanged, 3);
    assert_eq!(tree_listing(&options.staging_dir), staged_first);
    assert_eq!(
        fs::read_to_string(options.staging_dir.join(STAGING_MANIFEST)).unwrap(),
        manifest_first
    );

    assert!(staged_first.contains(&PathBuf::from("group_shop/items/param_sku/route.rs")));
    assert!(staged_first.contains(&PathBuf::from("docs/catchall_slug/route.rs")));
    assert!(first
        .source
        .contains("#[path = \"../.waypost/imports/group_shop/items/param_sku/page.rs\"]"));
    assert!(first.source.contains("#[path = \"../app/middleware.rs\"]"));
}

#[test]
fn test_directories_sanitizing_alike_get_distinct_aliases() {
    let (dir, options) = setup();
    write(dir.path(), "app/a-b/route.rs", HANDLERS);
    write(dir.path(), "app/a.b/route.rs", POST_ONLY);

    let first = run(&options).unwrap();
    assert_eq!(first.staging.created, 2);
    assert!(first.source.contains("#[path = \"../.waypost/imports/a_b/route.rs\"]"));
    assert!(first.source.contains("#[path = \"../.waypost/imports/a_b2/route.rs\"]"));
    assert_eq!(
        fs::read_to_string(options.staging_dir.join("a_b/route.rs")).unwrap(),
        HANDLERS
    );
    assert_eq!(
        fs::read_to_string(options.staging_dir.join("a_b2/route.rs")).unwrap(),
        POST_ONLY
    );

    let second = run(&options).unwrap();
    assert!(second.staging.is_noop());
    assert_eq!(second.outcome, WriteOutcome::Unchanged);
}

#[cfg(unix)]
#[test]
fn test_staged_entries_are_relative_symlinks() {
    let (dir, options) = setup();
    write(dir.path(), "app/[id]/route.rs", HANDLERS);
    run(&options).unwrap();

    let link = options.staging_dir.join("param_id/route.rs");
    let target = fs::read_link(&link).unwrap();
    assert!(target.is_relative());
    assert_eq!(fs::read_to_string(&link).unwrap(), HANDLERS);
}

#[test]
fn test_stale_entries_are_removed() {
    let (dir, options) = setup();
    write(dir.path(), "app/[id]/route.rs", HANDLERS);
    write(dir.path(), "app/plain/route.rs", HANDLERS);
    run(&options).unwrap();
    assert!(options.staging_dir.join("param_id/route.rs").exists());

    fs::remove_dir_all(dir.path().join("app/[id]")).unwrap();
    let generation = run(&options).unwrap();
    assert_eq!(generation.staging.removed, 1);
    assert_eq!(generation.outcome, WriteOutcome::Updated);
    assert!(!options.staging_dir.exists());
}

#[test]
fn test_foreign_staging_files_are_never_replaced() {
    let (dir, options) = setup();
    write(dir.path(), "app/[id]/route.rs", HANDLERS);
    write(dir.path(), ".waypost/imports/param_id/route.rs", "// mine\n");

    let err = run(&options).unwrap_err();
    assert!(matches!(err, GenerateError::StagingConflict { .. }));
    assert_eq!(
        fs::read_to_string(options.staging_dir.join("param_id/route.rs")).unwrap(),
        "// mine\n"
    );
}

#[test]
fn test_without_materializing_imports_point_at_sources() {
    let (dir, mut options) = setup();
    options.materialize = false;
    write(dir.path(), "app/[id]/route.rs", HANDLERS);

    let generation = run(&options).unwrap();
    assert!(generation.source.contains("#[path = \"../app/[id]/route.rs\"]"));
    assert!(!options.staging_dir.exists());
    assert_eq!(generation.plan.mappings().count(), 1);
}
