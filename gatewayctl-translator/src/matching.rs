/// Escapes regex metacharacters in a literal path segment.
fn escape_literal(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        if matches!(c, '.' | '+' | '*' | '?' | '(' | ')' | '[' | ']' | '^' | '$' | '|' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Rewrites `{param}` placeholders into a non-capturing `[^/]+` group,
/// escaping the surrounding literal text.
fn operation_path_pattern(path: &str) -> String {
    let mut out = String::new();
    let mut chars = path.chars().peekable();
    let mut literal = String::new();

    let flush = |literal: &mut String, out: &mut String| {
        out.push_str(&escape_literal(literal));
        literal.clear();
    };

    while let Some(c) = chars.next() {
        if c == '{' {
            flush(&mut literal, &mut out);
            for next in chars.by_ref() {
                if next == '}' {
                    break;
                }
            }
            out.push_str("[^/]+");
        } else {
            literal.push(c);
        }
    }
    flush(&mut literal, &mut out);
    out
}

/// The full anchored regex an Envoy route should match against, with the
/// operation-path portion (everything after `context`) wrapped in a capture
/// group so a prefix-rewrite substitution can reference it.
pub fn route_match_regex(context: &str, operation_path: &str) -> String {
    format!("^{}({})$", escape_literal(context), operation_path_pattern(operation_path))
}

/// The `regex_rewrite` substitution that prepends `path_prefix` to the
/// forwarded request path after the context has been stripped.
pub fn rewrite_substitution(path_prefix: &str) -> String {
    format!("{path_prefix}\\1")
}
