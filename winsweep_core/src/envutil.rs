//! Environment variable expansion for cleanup patterns.
//!
//! Whitelist entries and catalog paths are stored with their variable
//! references intact (`%LOCALAPPDATA%\Temp\*`) and expanded only when a
//! path is matched or cleaned, so a file written on one machine works on
//! another. Both the Windows `%VAR%` form and the shell `$VAR`/`${VAR}`
//! forms are accepted and may be mixed in one string.

use std::env;

/// Expands every environment variable reference in `input`.
///
/// Rules:
/// - `%NAME%` and `$NAME`/`${NAME}` are replaced by the variable's value.
/// - An unset variable expands to the empty string, which turns the
///   pattern into one that cannot match an absolute path.
/// - `%%` collapses to a literal `%`.
/// - An unterminated `%NAME` or `${NAME` is left as written.
///
/// Never fails; malformed references pass through unchanged.
pub fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(idx) = rest.find(['%', '$']) {
        out.push_str(&rest[..idx]);
        let tail = &rest[idx..];

        if let Some(after) = tail.strip_prefix('%') {
            if let Some(unescaped) = after.strip_prefix('%') {
                out.push('%');
                rest = unescaped;
            } else if let Some(end) = after.find('%') {
                out.push_str(&lookup(&after[..end]));
                rest = &after[end + 1..];
            } else {
                // No closing percent; keep the tail literal.
                out.push_str(tail);
                rest = "";
            }
            continue;
        }

        // Dollar form. `tail` is known to start with '$' here.
        let after = &tail[1..];
        if let Some(braced) = after.strip_prefix('{') {
            if let Some(end) = braced.find('}') {
                out.push_str(&lookup(&braced[..end]));
                rest = &braced[end + 1..];
            } else {
                out.push_str(tail);
                rest = "";
            }
        } else {
            let name_len = after
                .find(|c: char| !c.is_ascii_alphanumeric() && c != '_')
                .unwrap_or(after.len());
            if name_len == 0 {
                // Bare `$` with no name; keep it.
                out.push('$');
                rest = after;
            } else {
                out.push_str(&lookup(&after[..name_len]));
                rest = &after[name_len..];
            }
        }
    }

    out.push_str(rest);
    out
}

fn lookup(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    env::var(name).unwrap_or_default()
}
