use derive_more::Display;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

/// Amount in BRL. The API is loose about its wire type, so decoding accepts
/// JSON numbers as well as strings using either `.` or `,` as the decimal
/// separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(transparent)]
pub struct Price(#[serde(with = "rust_decimal::serde::float")] pub Decimal);

impl Price {
    pub fn brl(&self) -> Brl {
        Brl::from(self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_start_matches("R$").trim().replace(' ', "");
        let s = if s.contains('.') && s.contains(',') {
            s.replace('.', "").replace(',', ".")
        } else {
            s.replace(',', ".")
        };
        Decimal::from_str(&s)
            .or_else(|_| Decimal::from_scientific(&s))
            .map(Price)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPrice {
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let raw = match RawPrice::deserialize(de)? {
            RawPrice::Text(t) => t,
            RawPrice::Number(n) => n.to_string(),
        };
        raw.parse()
            .map_err(|err| serde::de::Error::custom(format!("Invalid price {raw:?}: {err}")))
    }
}

/// Optional price field where `null`, a missing key and `""` all mean "no price".
pub fn deserialize_optional<'de, D: Deserializer<'de>>(de: D) -> Result<Option<Price>, D::Error> {
    let raw = match Option::<RawPrice>::deserialize(de)? {
        None => return Ok(None),
        Some(RawPrice::Text(t)) if t.trim().is_empty() => return Ok(None),
        Some(RawPrice::Text(t)) => t,
        Some(RawPrice::Number(n)) => n.to_string(),
    };
    raw.parse()
        .map(Some)
        .map_err(|err| serde::de::Error::custom(format!("Invalid price {raw:?}: {err}")))
}

/// `R$ 1.234,56`, kept in parts so templates can style the symbol, the
/// integer part and the cents separately.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display("{symbol} {integer},{cents}")]
pub struct Brl {
    pub symbol: &'static str,
    pub integer: String,
    pub cents: String,
}

impl Brl {
    /// Amount without the currency symbol, e.g. `1.234,56`.
    pub fn amount(&self) -> String {
        format!("{},{}", self.integer, self.cents)
    }
}

impl From<Decimal> for Brl {
    fn from(value: Decimal) -> Self {
        let rounded = format!("{:.2}", value.round_dp(2));
        let (sign, digits) = match rounded.strip_prefix('-') {
            Some(d) => ("-", d),
            None => ("", rounded.as_str()),
        };
        let (int_part, cents) = digits.split_once('.').unwrap_or((digits, "00"));
        let chars = int_part.chars().collect::<Vec<_>>();
        let grouped = chars
            .rchunks(3)
            .rev()
            .map(|c| c.iter().collect::<String>())
            .join(".");
        Brl {
            symbol: "R$",
            integer: format!("{sign}{grouped}"),
            cents: cents.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn parses_both_decimal_separators() {
        assert_eq!("12,9".parse::<Price>().ok(), Some(Price(dec!(12.9))));
        assert_eq!("12.90".parse::<Price>().ok(), Some(Price(dec!(12.90))));
        assert_eq!("R$ 1.234,56".parse::<Price>().ok(), Some(Price(dec!(1234.56))));
        assert!("abc".parse::<Price>().is_err());
    }

    #[test]
    fn formats_brl() {
        assert_eq!(Price(dec!(1234.5)).brl().to_string(), "R$ 1.234,50");
        assert_eq!(Price(dec!(45)).brl().to_string(), "R$ 45,00");
        assert_eq!(Price(dec!(1234567.891)).brl().amount(), "1.234.567,89");
        assert_eq!(Price(dec!(0.5)).brl().integer, "0");
    }

    #[test]
    fn decodes_string_and_number() {
        let p: Price = serde_json::from_str("\"59,90\"").expect("string price");
        assert_eq!(p, Price(dec!(59.90)));
        let p: Price = serde_json::from_str("59.9").expect("number price");
        assert_eq!(p, Price(dec!(59.9)));
        assert!(serde_json::from_str::<Price>("\"grátis\"").is_err());
    }

    #[test]
    fn encodes_as_json_number() {
        let json = serde_json::to_string(&Price(dec!(59.9))).expect("serialize");
        assert_eq!(json, "59.9");
    }
}
