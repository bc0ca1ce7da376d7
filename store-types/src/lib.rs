#![deny(clippy::unwrap_used)]

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};
use unicode_normalization::UnicodeNormalization;

pub mod catalog;
pub mod category;
pub mod price;
pub mod product;
pub mod todo;
pub mod user;

/// Canonical form used for every catalog comparison: canonical decomposition,
/// combining diacritical marks (U+0300..=U+036F) dropped, lowercased.
pub fn fold(s: &str) -> String {
    s.nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>()
        .to_lowercase()
}

/// Characters a URL keeps as they are. `%` is kept too, so URLs that were
/// already encoded pass through unchanged.
const URI: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'#')
    .remove(b'%');

/// Percent-encodes a whole URL, leaving its delimiters intact.
pub fn encode_uri(url: &str) -> String {
    utf8_percent_encode(url, URI).to_string()
}

/// Calendar date of an API timestamp (RFC 3339 or a leading `yyyy-mm-dd`).
pub fn parse_date(raw: &str) -> Option<Date> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .map(|d| d.date())
        .or_else(|_| Date::parse(raw.get(..10).unwrap_or(raw), format_description!("[year]-[month]-[day]")))
        .ok()
}

/// Formats an API timestamp as `dd/mm/yyyy`, leaving unknown formats untouched.
pub fn display_date(raw: &str) -> String {
    match parse_date(raw).and_then(|d| d.format(format_description!("[day]/[month]/[year]")).ok()) {
        Some(d) => d,
        None => raw.to_string(),
    }
}
