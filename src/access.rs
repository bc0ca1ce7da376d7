use derive_more::Display;
use lazy_regex::regex_is_match;

pub mod controllers;

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const RECOVERY_CODE_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum RecoveryError {
    #[display("Por favor, insira um e-mail válido.")]
    InvalidEmail,
    #[display("O código de confirmação deve ter 6 caracteres.")]
    InvalidCode,
    #[display("A senha deve ter pelo menos 6 caracteres.")]
    ShortPassword,
    #[display("A confirmação da senha deve ter pelo menos 6 caracteres.")]
    ShortConfirmation,
    #[display("❌ Senhas não coincidem.")]
    PasswordMismatch,
}

impl RecoveryError {
    pub fn description(&self) -> Option<&'static str> {
        match self {
            Self::PasswordMismatch => Some("A senha e a confirmação da senha devem ser iguais."),
            _ => None,
        }
    }
}

pub fn validate_email(email: &str) -> Result<&str, RecoveryError> {
    let email = email.trim();
    if regex_is_match!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", email) {
        Ok(email)
    } else {
        Err(RecoveryError::InvalidEmail)
    }
}

pub fn validate_code(code: &str) -> Result<&str, RecoveryError> {
    let code = code.trim();
    if code.chars().count() == RECOVERY_CODE_LENGTH {
        Ok(code)
    } else {
        Err(RecoveryError::InvalidCode)
    }
}

pub fn validate_new_password<'a>(password: &'a str, confirmation: &str) -> Result<&'a str, RecoveryError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(RecoveryError::ShortPassword);
    }
    if confirmation.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(RecoveryError::ShortConfirmation);
    }
    if password != confirmation {
        return Err(RecoveryError::PasswordMismatch);
    }
    Ok(password)
}
