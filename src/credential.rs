use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use zeroize::Zeroize;

use crate::error::SettingsError;

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^sk-[A-Za-z0-9]{48}$").expect("static token pattern"))
}

/// Bearer token for the text-generation API.
///
/// Debug output is redacted and the buffer is wiped on drop. Anything read
/// back from storage is accepted as-is; only user input goes through
/// [`Credential::parse`].
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Validates user input: `sk-` followed by exactly 48 ASCII letters or
    /// digits. Surrounding whitespace from a paste is ignored.
    pub fn parse(input: &str) -> Result<Self, SettingsError> {
        let token = input.trim();
        if token_pattern().is_match(token) {
            Ok(Self(token.to_string()))
        } else {
            Err(SettingsError::InvalidToken)
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[cfg(test)]
pub(crate) fn sample_token(fill: char) -> String {
    format!("sk-{}", std::iter::repeat(fill).take(48).collect::<String>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_token() {
        let token = sample_token('a');
        let cred = Credential::parse(&token).unwrap();
        assert_eq!(cred.expose(), token);
    }

    #[test]
    fn trims_pasted_whitespace() {
        let token = sample_token('Z');
        let cred = Credential::parse(&format!("  {token}\n")).unwrap();
        assert_eq!(cred.expose(), token);
    }

    #[test]
    fn rejects_wrong_length_prefix_or_charset() {
        let short = format!("sk-{}", "a".repeat(47));
        let long = format!("sk-{}", "a".repeat(49));
        let prefix = format!("pk-{}", "a".repeat(48));
        let charset = format!("sk-{}_", "a".repeat(47));
        for bad in ["", "sk-", short.as_str(), long.as_str(), prefix.as_str(), charset.as_str()] {
            assert!(matches!(Credential::parse(bad), Err(SettingsError::InvalidToken)), "{bad}");
        }
    }

    #[test]
    fn debug_is_redacted() {
        let cred = Credential::new(sample_token('b'));
        assert_eq!(format!("{cred:?}"), "Credential(<redacted>)");
    }
}
