// File: src/template.rs
// Purpose: Lightweight text scan of page and layout declarations
//
// Page and layout files usually wrap their markup in template macros, so
// they are read as text instead of being parsed structurally. Only the
// entry declaration, the optional `load` hook, the `TITLE` constant and the
// layout children marker are looked at.

use once_cell::sync::Lazy;
use regex::Regex;

static PAGE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bpub(?:\([^)]*\))?\s+fn\s+page\s*(?:<[^>{]*>)?\s*\(").unwrap()
});

static LAYOUT_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bpub(?:\([^)]*\))?\s+fn\s+layout\s*(?:<[^>{]*>)?\s*\(").unwrap()
});

static LOAD_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\bpub(?:\([^)]*\))?\s+fn\s+load\s*(?:<[^>{]*>)?\s*\(").unwrap()
});

static TITLE_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bconst\s+TITLE\s*:\s*&\s*(?:'static\s+)?str\s*=\s*"((?:[^"\\]|\\.)*)""#).unwrap()
});

/// Literal text a layout must contain where child content is inserted
pub const CHILDREN_MARKER: &str = "(children)";

/// Fallback type when no parameter in a list carries one
const DEFAULT_PARAM_TYPE: &str = "String";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclaredParam {
    pub name: String,
    pub ty: String,
}

/// What a page file declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageDecl {
    pub params: Vec<DeclaredParam>,
    pub has_loader: bool,
    pub title: Option<String>,
}

/// What a layout file declares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutDecl {
    pub params: Vec<DeclaredParam>,
    pub title: Option<String>,
}

/// Scans a page file; `None` when no `pub fn page(` declaration exists
pub fn scan_page(source: &str) -> Option<PageDecl> {
    let code = strip_line_comments(source);
    let params = declaration_params(&PAGE_DECL, &code)?;

    Some(PageDecl {
        params,
        has_loader: LOAD_DECL.is_match(&code),
        title: extract_title(source),
    })
}

/// Scans a layout file; `None` unless both `pub fn layout(` and the
/// `(children)` marker are present
pub fn scan_layout(source: &str) -> Option<LayoutDecl> {
    let code = strip_line_comments(source);
    if !code.contains(CHILDREN_MARKER) {
        return None;
    }
    let params = declaration_params(&LAYOUT_DECL, &code)?;

    Some(LayoutDecl {
        params,
        title: extract_title(source),
    })
}

/// Value of `const TITLE: &str = "..."`
pub fn extract_title(source: &str) -> Option<String> {
    TITLE_DECL
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().replace("\\\"", "\""))
}

fn declaration_params(decl: &Regex, code: &str) -> Option<Vec<DeclaredParam>> {
    let found = decl.find(code)?;
    // the match ends right after the opening parenthesis
    let list = balanced_until_close(&code[found.end()..])?;
    Some(parse_param_list(list))
}

/// Text up to the `)` closing an already-opened parenthesis
fn balanced_until_close(rest: &str) -> Option<&str> {
    let mut depth = 1usize;
    for (idx, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses `a, b: String, user: User` into typed parameters
///
/// A name without a type takes the type of the nearest following typed
/// parameter (grouping shorthand), else the nearest preceding one.
///
/// ```
/// use waypost_parser::template::parse_param_list;
///
/// let params = parse_param_list("first, last: String, age: u32");
/// let types: Vec<&str> = params.iter().map(|p| p.ty.as_str()).collect();
/// assert_eq!(types, vec!["String", "String", "u32"]);
/// ```
pub fn parse_param_list(list: &str) -> Vec<DeclaredParam> {
    let raw: Vec<(String, Option<String>)> = split_top_level(list)
        .into_iter()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| match split_name_type(piece) {
            Some((name, ty)) => (clean_name(name), Some(ty.trim().to_string())),
            None => (clean_name(piece), None),
        })
        .collect();

    raw.iter()
        .enumerate()
        .map(|(idx, (name, ty))| {
            let ty = ty
                .clone()
                .or_else(|| raw[idx + 1..].iter().find_map(|(_, t)| t.clone()))
                .or_else(|| raw[..idx].iter().rev().find_map(|(_, t)| t.clone()))
                .unwrap_or_else(|| DEFAULT_PARAM_TYPE.to_string());
            DeclaredParam {
                name: name.clone(),
                ty,
            }
        })
        .collect()
}

fn clean_name(name: &str) -> String {
    name.trim().trim_start_matches("mut ").trim().to_string()
}

/// Splits `name: Type` on the first top-level single colon
fn split_name_type(piece: &str) -> Option<(&str, &str)> {
    let bytes = piece.as_bytes();
    let mut depth = 0i32;
    for (idx, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'<' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'>' if idx > 0 && bytes[idx - 1] != b'-' => depth -= 1,
            b':' if depth == 0 => {
                let double = bytes.get(idx + 1) == Some(&b':')
                    || (idx > 0 && bytes[idx - 1] == b':');
                if !double {
                    return Some((&piece[..idx], &piece[idx + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Splits on commas that are not nested inside brackets or generics
fn split_top_level(list: &str) -> Vec<&str> {
    let bytes = list.as_bytes();
    let mut pieces = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (idx, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'[' | b'<' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            b'>' if idx > 0 && bytes[idx - 1] != b'-' => depth -= 1,
            b',' if depth == 0 => {
                pieces.push(&list[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    pieces.push(&list[start..]);
    pieces
}

/// Removes `//` comments that are not inside string literals
fn strip_line_comments(source: &str) -> String {
    source
        .lines()
        .map(|line| {
            let mut in_string = false;
            let mut escaped = false;
            let mut prev = '\0';
            for (idx, c) in line.char_indices() {
                if in_string {
                    match c {
                        _ if escaped => escaped = false,
                        '\\' => escaped = true,
                        '"' => in_string = false,
                        _ => {}
                    }
                } else if c == '"' {
                    in_string = true;
                } else if c == '/' && prev == '/' {
                    return &line[..idx - 1];
                }
                prev = c;
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}
