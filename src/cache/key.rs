//! Cache Key Module
//!
//! Derives the bucket field name for an operation and its params.
//!
//! Formats are load-bearing: a changed key silently turns every existing
//! entry into a miss, so the quirks below are kept as they are.

use crate::cache::params::{ParamValue, Params, Scalar};

/// Field used when a call carries no params.
pub const DEFAULT_KEY: &str = "default";

/// Prefix of every list encoding.
pub const ARRAY_PREFIX: &str = "array:";

// == Format Key ==
/// Formats the field name for `cache_key` and `params`.
///
/// - no params: `"default"`
/// - list: `"array:"` then `".<item>"` per item; `cache_key` is not part of it
/// - map: `cache_key`, then per name either `".<name>:<value>"` or, when the
///   value renders empty, `".<name>."`
///
/// ```
/// use module_cache::{format_key, Params};
///
/// assert_eq!(format_key("getvalues", &Params::map([("id", 1)])), "getvalues.id:1");
/// ```
pub fn format_key(cache_key: &str, params: &Params) -> String {
    match params {
        Params::None => DEFAULT_KEY.to_string(),
        Params::List(items) => items.iter().fold(ARRAY_PREFIX.to_string(), |mut key, item| {
            key.push('.');
            key.push_str(&item.to_string());
            key
        }),
        Params::Map(map) => map.iter().fold(cache_key.to_string(), |mut key, (name, value)| {
            key.push('.');
            key.push_str(name);
            if value.is_blank() {
                key.push('.');
            } else {
                key.push(':');
                key.push_str(&format_value(value));
            }
            key
        }),
    }
}

// == Format Value ==
/// Formats one named parameter value.
///
/// Lists become `"array:"` followed by `"-<item>"` per item. Scalars are
/// stringified, lose their first run of non-word characters, and are
/// lowercased.
pub fn format_value(value: &ParamValue) -> String {
    match value {
        ParamValue::List(items) => items.iter().fold(ARRAY_PREFIX.to_string(), |mut out, item| {
            out.push('-');
            out.push_str(&item.to_string());
            out
        }),
        ParamValue::Scalar(scalar) => normalize_scalar(scalar),
    }
}

fn normalize_scalar(scalar: &Scalar) -> String {
    strip_first_non_word_run(&scalar.to_string()).to_lowercase()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Removes the first contiguous run of characters outside `[A-Za-z0-9_]`.
fn strip_first_non_word_run(raw: &str) -> String {
    let Some(start) = raw.find(|c: char| !is_word_char(c)) else {
        return raw.to_string();
    };
    let end = raw[start..]
        .find(is_word_char)
        .map_or(raw.len(), |offset| start + offset);

    let mut out = String::with_capacity(raw.len() - (end - start));
    out.push_str(&raw[..start]);
    out.push_str(&raw[end..]);
    out
}
