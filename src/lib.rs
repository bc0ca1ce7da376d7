#![deny(clippy::unwrap_used)]

use anyhow::Context;
use log_error::LogError;
use serde::de::IntoDeserializer;
use serde::Deserialize;

pub mod access;
pub mod control;
pub mod dashboard;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3333";
pub const DEFAULT_WHATSAPP_NUMBER: &str = "559392385511";

/// Process-wide configuration, read once at startup from the environment
/// (after `.env` has been loaded).
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub bind_addr: String,
    pub port: u16,
    pub whatsapp_number: String,
}

impl Settings {
    pub fn from_env() -> Self {
        Self {
            api_base_url: non_empty_var("API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            bind_addr: non_empty_var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: non_empty_var("PORT")
                .map(|p| p.parse::<u16>().context("PORT must be a port number"))
                .transpose()
                .log_error("Unable to read PORT")
                .flatten()
                .unwrap_or(8080),
            whatsapp_number: non_empty_var("WHATSAPP_NUMBER")
                .map(|n| n.chars().filter(char::is_ascii_digit).collect())
                .unwrap_or_else(|| DEFAULT_WHATSAPP_NUMBER.to_string()),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    envmnt::get_parse::<_, String, _>(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Query and form fields that browsers send as `""` when left blank.
pub fn empty_string_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => T::deserialize(s.into_deserializer()).map(Some),
    }
}

pub fn empty_string_as_none_parse<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: std::str::FromStr,
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    let opt = Option::<String>::deserialize(de)?;
    match opt.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s
            .parse()
            .map_err(|err| serde::de::Error::custom(format!("{err:?}")))
            .map(Some),
    }
}
