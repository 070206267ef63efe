//! Directory-segment translation
//!
//! Pure functional mapping of the on-disk naming convention to URL patterns,
//! middleware scopes, priorities and identifier fragments.
//! All functions are **pure**: same input → same output, no side effects.

/// Priority of a pattern made only of literal segments
pub const PRIORITY_STATIC: u32 = 100;
/// Priority of a pattern with `{name}` segments but no wildcard
pub const PRIORITY_DYNAMIC: u32 = 50;
/// Priority of a pattern containing a `*` wildcard
pub const PRIORITY_WILDCARD: u32 = 5;

/// Represents the role of a single directory segment
///
/// # Examples
///
/// ```
/// use waypost_router::segment::{classify_segment, Segment};
///
/// assert_eq!(classify_segment("about"), Segment::Literal("about".into()));
/// assert_eq!(classify_segment("[id]"), Segment::Param("id".into()));
/// assert_eq!(
///     classify_segment("[...slug]"),
///     Segment::Wildcard { name: "slug".into(), optional: false }
/// );
/// assert_eq!(
///     classify_segment("[[...slug]]"),
///     Segment::Wildcard { name: "slug".into(), optional: true }
/// );
/// assert_eq!(classify_segment("(admin)"), Segment::GroupStripped("admin".into()));
/// assert_eq!(classify_segment("_components"), Segment::Skip);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Static text segment
    Literal(String),
    /// Dynamic segment: [id]
    Param(String),
    /// Catch-all [...slug] (one or more segments) or optional
    /// catch-all [[...slug]] (zero or more)
    Wildcard { name: String, optional: bool },
    /// Route group: (admin). Part of the scope, never of the URL.
    GroupStripped(String),
    /// Private folder: _name. The whole subtree is pruned.
    Skip,
}

/// Classifies a segment (pure function)
///
/// # Parsing Rules (first match wins)
///
/// 1. **Optional catch-all**: `[[...name]]`
/// 2. **Catch-all**: `[...name]`
/// 3. **Route group**: `(name)`
/// 4. **Dynamic**: `[name]`
/// 5. **Private**: `_name`
/// 6. **Literal**: anything else
///
/// Bracket forms with an empty name are treated as literals.
pub fn classify_segment(segment: &str) -> Segment {
    if let Some(name) = segment
        .strip_prefix("[[...")
        .and_then(|s| s.strip_suffix("]]"))
        .filter(|name| !name.is_empty())
    {
        return Segment::Wildcard {
            name: name.to_string(),
            optional: true,
        };
    }

    if let Some(name) = segment
        .strip_prefix("[...")
        .and_then(|s| s.strip_suffix(']'))
        .filter(|name| !name.is_empty() && !name.ends_with(']'))
    {
        return Segment::Wildcard {
            name: name.to_string(),
            optional: false,
        };
    }

    if let Some(name) = segment
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .filter(|name| !name.is_empty())
    {
        return Segment::GroupStripped(name.to_string());
    }

    if let Some(name) = segment
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .filter(|name| !name.is_empty() && !name.contains(['[', ']']))
    {
        return Segment::Param(name.to_string());
    }

    if segment.starts_with('_') {
        return Segment::Skip;
    }

    Segment::Literal(segment.to_string())
}

/// The translated form of a directory path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    /// Slash-rooted URL pattern, e.g. `/users/{id}`
    pub pattern: String,
    /// Middleware scope, e.g. `(admin)/users/{id}` (no leading slash, root is empty)
    pub scope: String,
    /// Parameter names in path order (wildcards included)
    pub params: Vec<String>,
    /// Priority derived from `pattern`
    pub priority: u32,
    /// The `*` also matches zero segments (`[[...name]]`)
    pub optional_wildcard: bool,
    /// Whether a private segment was found (caller must prune)
    pub pruned: bool,
}

/// Internal state accumulator for fold-based translation
#[derive(Default)]
struct TranslateState {
    url: Vec<String>,
    scope: Vec<String>,
    params: Vec<String>,
    optional_wildcard: bool,
    pruned: bool,
}

impl TranslateState {
    fn with_literal(mut self, segment: String) -> Self {
        self.scope.push(segment.clone());
        self.url.push(segment);
        self
    }

    fn with_param(mut self, name: String) -> Self {
        let rendered = format!("{{{}}}", name);
        self.scope.push(rendered.clone());
        self.url.push(rendered);
        self.params.push(name);
        self
    }

    fn with_wildcard(mut self, name: String, optional: bool) -> Self {
        self.scope.push("*".to_string());
        self.url.push("*".to_string());
        self.params.push(name);
        self.optional_wildcard = optional;
        self
    }

    fn with_group(mut self, name: String) -> Self {
        self.scope.push(format!("({})", name));
        self
    }

    fn finalize(self) -> Translation {
        let pattern = format!("/{}", self.url.join("/"));
        Translation {
            priority: priority_for(&pattern),
            pattern,
            scope: self.scope.join("/"),
            params: self.params,
            optional_wildcard: self.optional_wildcard,
            pruned: self.pruned,
        }
    }
}

/// Processes a single segment and updates the state
fn process_segment(state: TranslateState, segment: &str) -> TranslateState {
    if segment.is_empty() || segment == "." || state.pruned {
        return state;
    }

    match classify_segment(segment) {
        Segment::Literal(s) => state.with_literal(s),
        Segment::Param(name) => state.with_param(name),
        Segment::Wildcard { name, optional } => state.with_wildcard(name, optional),
        Segment::GroupStripped(name) => state.with_group(name),
        Segment::Skip => TranslateState {
            pruned: true,
            ..state
        },
    }
}

/// Translates a sequence of directory segments (pure function)
pub fn translate_segments<'a, I>(segments: I) -> Translation
where
    I: IntoIterator<Item = &'a str>,
{
    segments
        .into_iter()
        .fold(TranslateState::default(), process_segment)
        .finalize()
}

/// Translates a `/`-separated directory path relative to the app root
///
/// # Examples
///
/// ```
/// use waypost_router::translate_path;
///
/// let t = translate_path("(admin)/users/[id]");
/// assert_eq!(t.pattern, "/users/{id}");
/// assert_eq!(t.scope, "(admin)/users/{id}");
/// assert_eq!(t.params, vec!["id"]);
/// assert_eq!(t.priority, 50);
///
/// assert_eq!(translate_path("").pattern, "/");
/// ```
pub fn translate_path(path: &str) -> Translation {
    translate_segments(path.split(['/', '\\']))
}

/// Computes the priority of a URL pattern from its shape alone
///
/// `100` for static patterns, `50` when only `{}` segments are present,
/// `5` as soon as a `*` appears.
pub fn priority_for(pattern: &str) -> u32 {
    if pattern.contains('*') {
        PRIORITY_WILDCARD
    } else if pattern.contains('{') {
        PRIORITY_DYNAMIC
    } else {
        PRIORITY_STATIC
    }
}

/// Maps a segment to a fragment usable inside a Rust identifier
///
/// # Examples
///
/// ```
/// use waypost_router::segment_ident;
///
/// assert_eq!(segment_ident("[id]"), "id");
/// assert_eq!(segment_ident("[...slug]"), "slug");
/// assert_eq!(segment_ident("(marketing)"), "marketing");
/// assert_eq!(segment_ident("user-settings"), "user_settings");
/// assert_eq!(segment_ident("2024"), "_2024");
/// ```
pub fn segment_ident(segment: &str) -> String {
    let raw = match classify_segment(segment) {
        Segment::Literal(s) => s,
        Segment::Param(name) | Segment::Wildcard { name, .. } | Segment::GroupStripped(name) => {
            name
        }
        Segment::Skip => segment.trim_start_matches('_').to_string(),
    };

    let mut ident: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if ident.is_empty() {
        ident.push('_');
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}
