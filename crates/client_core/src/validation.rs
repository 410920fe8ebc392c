use shared::{
    domain::{Channel, ChannelId},
    protocol::Credentials,
};
use thiserror::Error;

pub const NAME_MIN_CHARS: usize = 3;
pub const NAME_MAX_CHARS: usize = 20;
pub const PASSWORD_MIN_CHARS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("field is required")]
    Required,
    #[error("must be between {min} and {max} characters")]
    Length { min: usize, max: usize },
    #[error("a channel with this name already exists")]
    NotUnique,
    #[error("password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
}

impl ValidationError {
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Required => "validation.required",
            Self::Length { .. } => "validation.nameLength",
            Self::NotUnique => "validation.uniqueChannel",
            Self::PasswordTooShort { .. } => "validation.passwordLength",
            Self::PasswordMismatch => "validation.passwordMatch",
        }
    }
}

fn validate_name_length(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::Required);
    }
    let chars = name.chars().count();
    if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&chars) {
        return Err(ValidationError::Length {
            min: NAME_MIN_CHARS,
            max: NAME_MAX_CHARS,
        });
    }
    Ok(())
}

/// Validates a channel name against the current channel list and returns it
/// trimmed. `except` excludes the channel being renamed from the uniqueness
/// check.
pub fn validate_channel_name(
    raw: &str,
    channels: &[Channel],
    except: Option<&ChannelId>,
) -> Result<String, ValidationError> {
    let name = raw.trim();
    validate_name_length(name)?;

    let normalized = name.to_lowercase();
    let taken = channels
        .iter()
        .filter(|channel| Some(&channel.id) != except)
        .any(|channel| channel.name.to_lowercase() == normalized);
    if taken {
        return Err(ValidationError::NotUnique);
    }

    Ok(name.to_string())
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
}

impl SignupForm {
    /// Checks the form and yields the credentials to submit, with the
    /// username trimmed.
    pub fn validate(&self) -> Result<Credentials, ValidationError> {
        let username = self.username.trim();
        validate_name_length(username)?;

        if self.password.is_empty() {
            return Err(ValidationError::Required);
        }
        if self.password.chars().count() < PASSWORD_MIN_CHARS {
            return Err(ValidationError::PasswordTooShort {
                min: PASSWORD_MIN_CHARS,
            });
        }
        if self.confirm_password.is_empty() {
            return Err(ValidationError::Required);
        }
        if self.confirm_password != self.password {
            return Err(ValidationError::PasswordMismatch);
        }

        Ok(Credentials {
            username: username.to_string(),
            password: self.password.clone(),
        })
    }
}

pub fn validate_login(credentials: &Credentials) -> Result<(), ValidationError> {
    if credentials.username.trim().is_empty() || credentials.password.is_empty() {
        return Err(ValidationError::Required);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channels() -> Vec<Channel> {
        vec![
            Channel {
                id: ChannelId::from(1),
                name: "general".into(),
                removable: false,
            },
            Channel {
                id: ChannelId::from(2),
                name: "news".into(),
                removable: true,
            },
        ]
    }

    #[test]
    fn channel_name_is_trimmed() {
        assert_eq!(
            validate_channel_name("  sports ", &channels(), None),
            Ok("sports".to_string())
        );
    }

    #[test]
    fn channel_name_length_is_bounded() {
        assert_eq!(
            validate_channel_name("   ", &channels(), None),
            Err(ValidationError::Required)
        );
        assert!(matches!(
            validate_channel_name("ab", &channels(), None),
            Err(ValidationError::Length { .. })
        ));
        assert!(matches!(
            validate_channel_name(&"x".repeat(21), &channels(), None),
            Err(ValidationError::Length { .. })
        ));
        assert!(validate_channel_name(&"x".repeat(20), &channels(), None).is_ok());
        // Length counts characters, not bytes.
        assert!(validate_channel_name("новости", &channels(), None).is_ok());
    }

    #[test]
    fn channel_name_uniqueness_ignores_case() {
        assert_eq!(
            validate_channel_name("News", &channels(), None),
            Err(ValidationError::NotUnique)
        );
    }

    #[test]
    fn rename_may_keep_own_name() {
        let own = ChannelId::from(2);
        assert_eq!(
            validate_channel_name("NEWS", &channels(), Some(&own)),
            Ok("NEWS".to_string())
        );
        assert_eq!(
            validate_channel_name("general", &channels(), Some(&own)),
            Err(ValidationError::NotUnique)
        );
    }

    #[test]
    fn signup_rules() {
        let mut form = SignupForm {
            username: " alice ".into(),
            password: "secret1".into(),
            confirm_password: "secret1".into(),
        };
        let credentials = form.validate().expect("valid form");
        assert_eq!(credentials.username, "alice");

        form.confirm_password = "secret2".into();
        assert_eq!(form.validate().unwrap_err(), ValidationError::PasswordMismatch);

        form.password = "12345".into();
        form.confirm_password = "12345".into();
        assert_eq!(
            form.validate().unwrap_err(),
            ValidationError::PasswordTooShort { min: 6 }
        );

        form.username = "al".into();
        assert_eq!(form.validate().unwrap_err().message_key(), "validation.nameLength");
    }

    #[test]
    fn login_requires_both_fields() {
        let credentials = Credentials {
            username: "admin".into(),
            password: String::new(),
        };
        assert_eq!(validate_login(&credentials), Err(ValidationError::Required));
    }
}
