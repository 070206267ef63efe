//! Proxy pattern compiler
//!
//! Turns the compact matcher language used in `PROXY_CONFIG` into regular
//! expressions evaluated against request paths.
//!
//! | Pattern        | Meaning                                  |
//! |----------------|------------------------------------------|
//! | `*`, `/*`, empty | every path                             |
//! | `^...`         | raw regular expression                   |
//! | `:name`        | one segment                              |
//! | `:name*`       | zero or more segments                    |
//! | `:name+`       | one or more segments                     |
//! | `:name?`       | optional single segment                  |
//! | `*`            | arbitrary remainder                      |
//! | `(a\|b)`       | inline alternation, copied verbatim      |
//!
//! Compiled patterns match the given prefix and tolerate trailing path
//! content after a segment boundary.

use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

/// A matcher pattern that cannot be compiled
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("pattern `{pattern}`: unbalanced `(` at byte {position}")]
    UnbalancedGroup { pattern: String, position: usize },

    #[error("pattern `{pattern}`: expected a parameter name after `:` at byte {position}")]
    MissingParamName { pattern: String, position: usize },

    #[error("pattern `{pattern}` does not compile: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Predicate over request paths built from a list of patterns
///
/// An empty pattern list matches every path.
///
/// # Examples
///
/// ```
/// use waypost_router::CompiledMatcher;
///
/// let matcher = CompiledMatcher::compile(["/api/:path*"]).unwrap();
/// assert!(matcher.matches("/api/v1/users/123"));
/// assert!(matcher.matches("/api/"));
/// assert!(!matcher.matches("/public/file.js"));
///
/// let all = CompiledMatcher::compile(Vec::<String>::new()).unwrap();
/// assert!(all.matches("/anything"));
/// ```
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    rules: Vec<Regex>,
    match_all: bool,
}

impl CompiledMatcher {
    /// Matcher accepting every path
    pub fn match_all() -> Self {
        Self {
            rules: Vec::new(),
            match_all: true,
        }
    }

    /// Compiles every pattern; the first invalid one aborts compilation
    pub fn compile<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        let mut saw_any = false;
        let mut match_all = false;

        for pattern in patterns {
            saw_any = true;
            match compile_pattern(pattern.as_ref())? {
                Some(rule) => rules.push(rule),
                None => match_all = true,
            }
        }

        Ok(Self {
            rules,
            match_all: match_all || !saw_any,
        })
    }

    pub fn is_match_all(&self) -> bool {
        self.match_all
    }

    pub fn matches(&self, path: &str) -> bool {
        self.match_all || self.rules.iter().any(|rule| rule.is_match(path))
    }

    /// Named captures of the first matching pattern
    ///
    /// ```
    /// use waypost_router::CompiledMatcher;
    ///
    /// let matcher = CompiledMatcher::compile(["/shop/:category/:item?"]).unwrap();
    /// let caps = matcher.captures("/shop/books/dune").unwrap();
    /// assert_eq!(caps.get("category"), Some(&"books".to_string()));
    /// assert_eq!(caps.get("item"), Some(&"dune".to_string()));
    /// ```
    pub fn captures(&self, path: &str) -> Option<HashMap<String, String>> {
        let found = self.rules.iter().find_map(|rule| {
            rule.captures(path).map(|caps| {
                rule.capture_names()
                    .flatten()
                    .filter_map(|name| {
                        caps.name(name)
                            .map(|m| (name.to_string(), m.as_str().to_string()))
                    })
                    .collect::<HashMap<_, _>>()
            })
        });

        match found {
            Some(caps) => Some(caps),
            None if self.match_all => Some(HashMap::new()),
            None => None,
        }
    }
}

/// Whether the pattern means "every path"
fn is_match_all_pattern(pattern: &str) -> bool {
    matches!(pattern.trim(), "" | "*" | "/*")
}

/// Compiles a single pattern; `None` means it matches every path
pub fn compile_pattern(pattern: &str) -> Result<Option<Regex>, PatternError> {
    if is_match_all_pattern(pattern) {
        return Ok(None);
    }

    let source = translate_pattern(pattern)?;
    Regex::new(&source)
        .map(Some)
        .map_err(|source| PatternError::Regex {
            pattern: pattern.to_string(),
            source,
        })
}

/// Translates a pattern into regular expression source
///
/// ```
/// use waypost_router::translate_pattern;
///
/// assert_eq!(
///     translate_pattern("/api/:path*").unwrap(),
///     "^/api(?:/(?P<path>.*))?(?:/.*)?$"
/// );
/// assert_eq!(translate_pattern("^/admin$").unwrap(), "^/admin/?$");
/// ```
pub fn translate_pattern(pattern: &str) -> Result<String, PatternError> {
    let pattern = pattern.trim();

    if pattern.starts_with('^') {
        return Ok(tolerate_trailing_slash(pattern));
    }

    let chars: Vec<(usize, char)> = pattern.char_indices().collect();
    let mut out = String::from("^");
    let mut i = 0;

    while i < chars.len() {
        let (position, c) = chars[i];
        match c {
            ':' => {
                let start = i + 1;
                let end = chars[start..]
                    .iter()
                    .position(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
                    .map_or(chars.len(), |offset| start + offset);

                if end == start {
                    return Err(PatternError::MissingParamName {
                        pattern: pattern.to_string(),
                        position,
                    });
                }

                let name: String = chars[start..end].iter().map(|(_, c)| c).collect();
                i = end;
                match chars.get(end).map(|(_, c)| *c) {
                    Some('*') => {
                        push_optional(&mut out, &name, ".*");
                        i += 1;
                    }
                    Some('?') => {
                        push_optional(&mut out, &name, "[^/]+");
                        i += 1;
                    }
                    Some('+') => {
                        out.push_str(&format!("(?P<{}>.+)", name));
                        i += 1;
                    }
                    _ => out.push_str(&format!("(?P<{}>[^/]+)", name)),
                }
            }
            '*' => {
                out.push_str(".*");
                i += 1;
            }
            '(' => {
                let close = group_end(&chars, i).ok_or_else(|| PatternError::UnbalancedGroup {
                    pattern: pattern.to_string(),
                    position,
                })?;
                out.extend(chars[i..=close].iter().map(|(_, c)| c));
                i = close + 1;
            }
            '/' => {
                out.push('/');
                i += 1;
            }
            other => {
                out.push_str(&regex::escape(other.encode_utf8(&mut [0; 4])));
                i += 1;
            }
        }
    }

    if out.ends_with('/') {
        out.push_str(".*");
    } else {
        out.push_str("(?:/.*)?");
    }
    out.push('$');

    Ok(out)
}

/// Emits an optional capture, absorbing a preceding `/` so that the
/// bare prefix matches too (`/api/:path*` matches `/api`).
fn push_optional(out: &mut String, name: &str, body: &str) {
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
        out.push_str(&format!("(?:/(?P<{}>{}))?", name, body));
    } else {
        out.push_str(&format!("(?P<{}>{})?", name, body));
    }
}

/// Index of the `)` closing the group opened at `open`
fn group_end(chars: &[(usize, char)], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut escaped = false;

    for (idx, (_, c)) in chars.iter().enumerate().skip(open) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Raw regex patterns accept an optional trailing slash before `$`
fn tolerate_trailing_slash(pattern: &str) -> String {
    match pattern.strip_suffix('$') {
        Some(body) if !body.ends_with("/?") => format!("{}/?$", body),
        _ => pattern.to_string(),
    }
}
