use core::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A chat on the remote platform, either by numeric id or public username
///
/// Usernames are always held with their leading `@`, which is the form the
/// Bot API expects in `chat_id` fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChatRef {
    Id(i64),
    Username(String),
}

impl ChatRef {
    /// Build a username reference, adding the `@` prefix when missing
    ///
    /// # Errors
    /// If the name is empty or contains characters outside `[A-Za-z0-9_]`
    pub fn username(name: &str) -> Result<Self, ValidationError> {
        let bare = name.strip_prefix('@').unwrap_or(name);

        if bare.is_empty() || !bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ValidationError::InvalidChat(name.to_string()));
        }

        Ok(Self::Username(format!("@{bare}")))
    }

    /// The chat id of a private supergroup or channel, from the numeric part of
    /// a `t.me/c/<internal>/<id>` link
    #[must_use]
    pub fn from_internal_id(internal: u64) -> Option<Self> {
        format!("-100{internal}").parse().ok().map(Self::Id)
    }
}

impl Display for ChatRef {
    fn fmt(&self, fmt: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(fmt, "{id}"),
            Self::Username(name) => fmt.write_str(name),
        }
    }
}

impl FromStr for ChatRef {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        value
            .parse::<i64>()
            .map_or_else(|_| Self::username(value), |id| Ok(Self::Id(id)))
    }
}

impl Serialize for ChatRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Id(id) => serializer.serialize_i64(*id),
            Self::Username(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for ChatRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(i64),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Ok(Self::Id(id)),
            Raw::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}
