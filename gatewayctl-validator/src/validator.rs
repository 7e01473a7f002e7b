use crate::envelope::SubmittedDocument;
use gatewayctl_core::{FieldError, HttpMethod};
use regex::Regex;
use std::sync::OnceLock;

const ENVELOPE_VERSION: &str = "api-platform.wso2.com/v1";
const ENVELOPE_KIND: &str = "http/rest";

fn version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^v\d+\.\d+$").unwrap())
}

fn placeholder_name_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap())
}

/// Validate a submitted document against every syntactic and semantic rule
/// that does not require comparing against other catalog records (those
/// cross-record checks are the Store's responsibility). Runs every check
/// in one pass and returns the full set of field errors — never fails fast.
pub fn validate(doc: &SubmittedDocument) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    check_envelope(doc, &mut errors);
    check_name_and_version(doc, &mut errors);
    check_context(doc, &mut errors);
    check_upstreams(doc, &mut errors);
    check_operations(doc, &mut errors);

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_envelope(doc: &SubmittedDocument, errors: &mut Vec<FieldError>) {
    if doc.version != ENVELOPE_VERSION {
        errors.push(FieldError::new(
            "version",
            format!("must be \"{ENVELOPE_VERSION}\", got \"{}\"", doc.version),
        ));
    }
    if doc.kind != ENVELOPE_KIND {
        errors.push(FieldError::new(
            "kind",
            format!("must be \"{ENVELOPE_KIND}\", got \"{}\"", doc.kind),
        ));
    }
}

fn check_name_and_version(doc: &SubmittedDocument, errors: &mut Vec<FieldError>) {
    let name = &doc.data.name;
    if name.is_empty() {
        errors.push(FieldError::new("data.name", "must not be empty"));
    } else if name.chars().count() > 100 {
        errors.push(FieldError::new("data.name", "must be at most 100 characters"));
    }

    if !version_pattern().is_match(&doc.data.version) {
        errors.push(FieldError::new(
            "data.version",
            format!("must match ^v\\d+\\.\\d+$, got \"{}\"", doc.data.version),
        ));
    }
}

fn check_context(doc: &SubmittedDocument, errors: &mut Vec<FieldError>) {
    let context = &doc.data.context;
    let valid = context.len() >= 2
        && context.starts_with('/')
        && !context.ends_with('/')
        && !context.contains(char::is_whitespace);
    if !valid {
        errors.push(FieldError::new(
            "data.context",
            "must match ^/[^\\s]*[^/]$ and be at least \"/x\" (bare \"/\" is disallowed)",
        ));
    }
}

fn check_upstreams(doc: &SubmittedDocument, errors: &mut Vec<FieldError>) {
    if doc.data.upstreams.is_empty() {
        errors.push(FieldError::new("data.upstreams", "must contain at least one upstream"));
        return;
    }
    for (i, upstream) in doc.data.upstreams.iter().enumerate() {
        match url::Url::parse(&upstream.url) {
            Ok(parsed) => {
                let scheme_ok = parsed.scheme() == "http" || parsed.scheme() == "https";
                if !scheme_ok || parsed.host_str().is_none() {
                    errors.push(FieldError::new(
                        format!("data.upstreams[{i}].url"),
                        "must be an absolute http(s) URL with a host",
                    ));
                }
            }
            Err(_) => {
                errors.push(FieldError::new(
                    format!("data.upstreams[{i}].url"),
                    "could not be parsed as a URL",
                ));
            }
        }
    }
}

fn check_operations(doc: &SubmittedDocument, errors: &mut Vec<FieldError>) {
    if doc.data.operations.is_empty() {
        errors.push(FieldError::new("data.operations", "must contain at least one operation"));
        return;
    }
    for (i, op) in doc.data.operations.iter().enumerate() {
        if !matches!(
            op.method,
            HttpMethod::Get
                | HttpMethod::Post
                | HttpMethod::Put
                | HttpMethod::Delete
                | HttpMethod::Patch
                | HttpMethod::Head
                | HttpMethod::Options
        ) {
            errors.push(FieldError::new(format!("data.operations[{i}].method"), "unsupported method"));
        }

        if !op.path.starts_with('/') {
            errors.push(FieldError::new(format!("data.operations[{i}].path"), "must start with /"));
        }

        if let Err(reason) = check_braces_balanced(&op.path) {
            errors.push(FieldError::new(format!("data.operations[{i}].path"), reason));
            continue;
        }

        for placeholder in extract_placeholders(&op.path) {
            if !placeholder_name_pattern().is_match(&placeholder) {
                errors.push(FieldError::new(
                    format!("data.operations[{i}].path"),
                    format!("placeholder \"{{{placeholder}}}\" must match ^[A-Za-z_][A-Za-z0-9_]*$"),
                ));
            }
        }
    }
}

fn check_braces_balanced(path: &str) -> Result<(), &'static str> {
    let mut depth = 0i32;
    for c in path.chars() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth < 0 {
                    return Err("unbalanced braces: unmatched \"}\"");
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err("unbalanced braces: unmatched \"{\"");
    }
    Ok(())
}

fn extract_placeholders(path: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut in_placeholder = false;
    for c in path.chars() {
        match c {
            '{' => {
                in_placeholder = true;
                current.clear();
            }
            '}' => {
                if in_placeholder {
                    names.push(current.clone());
                }
                in_placeholder = false;
            }
            other if in_placeholder => current.push(other),
            _ => {}
        }
    }
    names
}
