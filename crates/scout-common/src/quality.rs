//! Structural (never semantic) quality scoring for contact fields, used by
//! the merger's field-group strategy (spec section 4.6) to break ties
//! between candidate values *before* falling back to the trust cascade.
//!
//! Each `*Quality` struct derives `Ord` with fields declared in the same
//! priority order the spec lists, so `a.cmp(&b)` is exactly the cascade
//! the spec describes: lexicographic comparison over the declared fields.

use regex::Regex;
use std::sync::OnceLock;

fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PhoneQuality {
    pub parseable_international: bool,
    pub has_country_code: bool,
    pub digit_count: usize,
}

/// Score a phone string structurally. "Parseable international" means it
/// starts with `+` and has a plausible E.164 digit count (8-15); "has
/// country code" is a looser check for a leading `+` or `00` prefix.
pub fn phone_quality(raw: &str) -> PhoneQuality {
    let trimmed = raw.trim();
    let digits = digits_only(trimmed);
    let digit_count = digits.len();
    let has_country_code = trimmed.starts_with('+') || trimmed.starts_with("00");
    let parseable_international =
        trimmed.starts_with('+') && (8..=15).contains(&digit_count);

    PhoneQuality {
        parseable_international,
        has_country_code,
        digit_count,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EmailQuality {
    pub rfc_valid: bool,
    pub non_free_domain: bool,
    pub length: usize,
}

const FREE_EMAIL_DOMAINS: &[&str] = &[
    "gmail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "icloud.com",
    "aol.com",
    "protonmail.com",
];

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

pub fn email_quality(raw: &str) -> EmailQuality {
    let trimmed = raw.trim();
    let rfc_valid = email_regex().is_match(trimmed);
    let domain = trimmed.rsplit('@').next().unwrap_or("").to_lowercase();
    let non_free_domain = rfc_valid && !FREE_EMAIL_DOMAINS.contains(&domain.as_str());

    EmailQuality {
        rfc_valid,
        non_free_domain,
        length: trimmed.len(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UrlQuality {
    pub https: bool,
    pub path_depth: usize,
    pub no_tracking_params: bool,
    pub length: usize,
}

const TRACKING_PARAM_PREFIXES: &[&str] = &["utm_", "fbclid", "gclid", "ref", "mc_cid", "mc_eid"];

pub fn url_quality(raw: &str) -> UrlQuality {
    let trimmed = raw.trim();
    let https = trimmed.starts_with("https://");

    let without_scheme = trimmed
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let (path_and_query, _) = without_scheme
        .split_once('/')
        .map(|(_, rest)| (rest, ()))
        .unwrap_or(("", ()));
    let (path, query) = path_and_query.split_once('?').unwrap_or((path_and_query, ""));
    let path_depth = path.split('/').filter(|seg| !seg.is_empty()).count();

    let no_tracking_params = query.is_empty()
        || !query
            .split('&')
            .any(|kv| TRACKING_PARAM_PREFIXES.iter().any(|p| kv.starts_with(p)));

    UrlQuality {
        https,
        path_depth,
        no_tracking_params,
        length: trimmed.len(),
    }
}
