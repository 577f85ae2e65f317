//! Language utilities for caption track language tags
//!
//! Caption tracks are labelled with BCP 47 style tags (`en`, `zh-TW`,
//! `pt-BR`), while configuration may use ISO 639-1 or ISO 639-2 codes.
//! These helpers resolve all of them to a language usable in prompts.

use anyhow::{Result, anyhow};
use isolang::Language;

// ISO 639-2/B codes that differ from their 639-2/T form
const BIBLIOGRAPHIC_CODES: &[(&str, &str)] = &[
    ("fre", "fra"),
    ("ger", "deu"),
    ("dut", "nld"),
    ("gre", "ell"),
    ("chi", "zho"),
    ("cze", "ces"),
    ("ice", "isl"),
    ("alb", "sqi"),
    ("arm", "hye"),
    ("baq", "eus"),
    ("bur", "mya"),
    ("per", "fas"),
    ("geo", "kat"),
    ("may", "msa"),
    ("mac", "mkd"),
    ("rum", "ron"),
    ("slo", "slk"),
    ("wel", "cym"),
];

/// Split a tag such as `zh-TW` or `pt_BR` into its language and region parts
pub fn split_language_tag(tag: &str) -> (String, Option<String>) {
    let normalized = tag.trim().replace('_', "-");
    let mut parts = normalized.splitn(2, '-');
    let language = parts.next().unwrap_or_default().to_lowercase();
    let region = parts
        .next()
        .filter(|r| !r.is_empty())
        .map(|r| r.to_uppercase());
    (language, region)
}

/// Resolve the primary subtag of a language tag to an ISO language
pub fn resolve_language(tag: &str) -> Result<Language> {
    let (code, _) = split_language_tag(tag);

    let language = match code.len() {
        2 => Language::from_639_1(&code),
        3 => {
            let part2t = BIBLIOGRAPHIC_CODES
                .iter()
                .find(|(bibliographic, _)| *bibliographic == code)
                .map_or(code.as_str(), |(_, terminologic)| *terminologic);
            Language::from_639_3(part2t)
        }
        _ => None,
    };

    language.ok_or_else(|| anyhow!("Invalid language code: {}", tag))
}

/// Get the English language name for a tag, keeping any region qualifier
pub fn get_language_name(tag: &str) -> Result<String> {
    let language = resolve_language(tag)?;
    let (_, region) = split_language_tag(tag);

    Ok(match region {
        Some(region) => format!("{} ({})", language.to_name(), region),
        None => language.to_name().to_string(),
    })
}

/// Check if two tags name the same language, ignoring regions
pub fn language_codes_match(tag1: &str, tag2: &str) -> bool {
    match (resolve_language(tag1), resolve_language(tag2)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
