/*!
 * HTML entity decoding for caption text.
 */

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// @const: Named, decimal and hex character references
static ENTITY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z]{2,8});").unwrap()
});

/// Decode the character references that appear in timed-text tracks.
///
/// Unknown named references are left untouched. Tracks are frequently
/// double-escaped (`&amp;#39;`), so decoding runs until the text stops changing,
/// bounded to a few passes.
pub fn decode_html_entities(text: &str) -> String {
    let mut current = text.to_string();

    for _ in 0..3 {
        if !current.contains('&') {
            break;
        }

        let decoded = ENTITY_REGEX
            .replace_all(&current, |caps: &Captures| {
                let reference = &caps[1];
                resolve_reference(reference).unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned();

        if decoded == current {
            break;
        }
        current = decoded;
    }

    current
}

// @returns: Replacement text for a single reference body (without & and ;)
fn resolve_reference(reference: &str) -> Option<String> {
    if let Some(hex) = reference
        .strip_prefix("#x")
        .or_else(|| reference.strip_prefix("#X"))
    {
        return u32::from_str_radix(hex, 16)
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }

    if let Some(decimal) = reference.strip_prefix('#') {
        return decimal
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from);
    }

    let resolved = match reference {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        "hellip" => "…",
        "mdash" => "—",
        "ndash" => "–",
        "lsquo" => "‘",
        "rsquo" => "’",
        "ldquo" => "“",
        "rdquo" => "”",
        _ => return None,
    };

    Some(resolved.to_string())
}
