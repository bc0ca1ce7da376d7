use serde::Deserialize;
use serde_aux::field_attributes::{deserialize_default_from_null, deserialize_string_from_number};

/// Staff account as listed by `GET /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(deserialize_with = "deserialize_string_from_number")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub username: String,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub email: String,
    #[serde(default, deserialize_with = "deserialize_default_from_null")]
    pub role: String,
    #[serde(default)]
    pub profile_picture: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub bio: Option<String>,
}

impl Profile {
    /// Avatar fallback letter.
    pub fn initial(&self) -> String {
        self.username
            .chars()
            .next()
            .map(|c| c.to_uppercase().to_string())
            .unwrap_or_else(|| "U".to_string())
    }

    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            "Usuário sem nome"
        } else {
            &self.username
        }
    }

    pub fn display_email(&self) -> &str {
        if self.email.is_empty() {
            "Sem email cadastrado"
        } else {
            &self.email
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallbacks_for_missing_fields() {
        let p: Profile = serde_json::from_str(
            r#"{"id": 1, "username": null, "email": "", "role": "admin", "slug": "x"}"#,
        )
        .expect("profile");
        assert_eq!(p.initial(), "U");
        assert_eq!(p.display_name(), "Usuário sem nome");
        assert_eq!(p.display_email(), "Sem email cadastrado");
        assert_eq!(p.profile_picture, None);
    }

    #[test]
    fn initial_is_uppercased() {
        let p: Profile =
            serde_json::from_str(r#"{"id": "9", "username": "ágata"}"#).expect("profile");
        assert_eq!(p.initial(), "Á");
    }
}
