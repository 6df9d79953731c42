//! Completion scripts for a script-evaluating host.
//!
//! A host that can only evaluate script text completes a multiplexed call by
//! running `resolveAsyncPromise('<id>', '<json>')` or
//! `rejectAsyncPromise('<id>', '<json>')` on the caller side. The functions
//! here build those strings with the payload escaped for a single-quoted
//! string literal.

use crate::ids::CallId;

pub const RESOLVE_FUNCTION: &str = "resolveAsyncPromise";
pub const REJECT_FUNCTION: &str = "rejectAsyncPromise";

/// Script completing call `id` with `result_json`.
#[must_use]
pub fn resolve_script(id: &CallId, result_json: &str) -> String {
    script(RESOLVE_FUNCTION, id, result_json)
}

/// Script failing call `id` with `error_json`.
#[must_use]
pub fn reject_script(id: &CallId, error_json: &str) -> String {
    script(REJECT_FUNCTION, id, error_json)
}

fn script(function: &str, id: &CallId, payload: &str) -> String {
    let mut out = String::with_capacity(function.len() + payload.len() + 40);
    out.push_str(function);
    out.push_str("('");
    out.push_str(&id.to_string());
    out.push_str("', '");
    escape_into(&mut out, payload);
    out.push_str("')");
    out
}

/// Escape `raw` for a single-quoted script string literal.
pub fn escape_single_quoted(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    escape_into(&mut out, raw);
    out
}

fn escape_into(out: &mut String, raw: &str) {
    for c in raw.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
}
