use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::UnknownProviderError;

/// The closed set of delivery providers Inkwell knows how to talk to.
///
/// Declaration order doubles as the tie-breaker when two providers share a
/// priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProviderKind {
    /// Token-authenticated webmail API (Gmail-compatible `messages.send`).
    Gmail,
    /// SMTP relay.
    Smtp,
    /// API-key HTTP service (SendGrid-compatible v3 mail send).
    SendGrid,
}

impl ProviderKind {
    /// Every provider kind, in declaration order.
    pub const ALL: [Self; 3] = [Self::Gmail, Self::Smtp, Self::SendGrid];

    /// Canonical lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::Smtp => "smtp",
            Self::SendGrid => "sendgrid",
        }
    }

    /// Priority used when no explicit order is configured. Lower is tried
    /// earlier.
    pub fn default_priority(self) -> u32 {
        match self {
            Self::Gmail => 1,
            Self::Smtp => 2,
            Self::SendGrid => 3,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = UnknownProviderError;

    /// Case-insensitive. `qq` is accepted as an alias for the SMTP relay.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gmail" => Ok(Self::Gmail),
            "smtp" | "qq" => Ok(Self::Smtp),
            "sendgrid" => Ok(Self::SendGrid),
            _ => Err(UnknownProviderError(s.to_owned())),
        }
    }
}

impl Serialize for ProviderKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ProviderKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("GMAIL".parse::<ProviderKind>(), Ok(ProviderKind::Gmail));
        assert_eq!(" Smtp ".parse::<ProviderKind>(), Ok(ProviderKind::Smtp));
        assert_eq!("SendGrid".parse::<ProviderKind>(), Ok(ProviderKind::SendGrid));
    }

    #[test]
    fn qq_is_an_smtp_alias() {
        assert_eq!("QQ".parse::<ProviderKind>(), Ok(ProviderKind::Smtp));
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "mailchimp".parse::<ProviderKind>().unwrap_err();
        assert_eq!(err, UnknownProviderError("mailchimp".into()));
    }

    #[test]
    fn default_priorities_are_distinct_and_ordered() {
        let priorities: Vec<u32> = ProviderKind::ALL
            .iter()
            .map(|k| k.default_priority())
            .collect();
        assert_eq!(priorities, vec![1, 2, 3]);
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&ProviderKind::SendGrid).unwrap();
        assert_eq!(json, r#""sendgrid""#);
        let back: ProviderKind = serde_json::from_str(r#""QQ""#).unwrap();
        assert_eq!(back, ProviderKind::Smtp);
        assert!(serde_json::from_str::<ProviderKind>(r#""pigeon""#).is_err());
    }
}
