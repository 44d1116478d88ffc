//! Submission structs received by the `web` module and their validation.
//! A `DeserSubmission` comes straight from the request body and can contain anything,
//! a `ValidSubmission` has all of its fields checked.

use lazy_regex::regex_is_match;
use serde::{Deserialize, Deserializer, Serialize};

/// Longest email address we accept, in characters.
pub const MAX_EMAIL_LEN: usize = 254;

// ###################################
// ->   STRUCTS
// ###################################
/// Deserializable Submission
/// Missing and `null` fields are defaulted, the email gets validated afterwards.
#[derive(Debug, Default, Deserialize)]
pub struct DeserSubmission {
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, rename = "questions", deserialize_with = "null_as_default")]
    pub answers: Vec<Answer>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A single answered question, kept in the order it was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub key: String,
    pub value: String,
}

/// Validated Submission
/// Serializes into the document that gets stored.
#[derive(Debug, Clone, Serialize)]
pub struct ValidSubmission {
    pub email: ValidEmail,
    #[serde(rename = "questions")]
    pub answers: Vec<Answer>,
}

impl TryFrom<DeserSubmission> for ValidSubmission {
    type Error = DataParsingError;

    fn try_from(deser: DeserSubmission) -> Result<Self, Self::Error> {
        Ok(ValidSubmission {
            email: ValidEmail::parse(deser.email)?,
            answers: deser.answers,
        })
    }
}

/// Validated Email
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidEmail(String);

impl AsRef<str> for ValidEmail {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ValidEmail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ValidEmail {
    pub fn parse<S>(value: S) -> Result<Self, DataParsingError>
    where
        S: AsRef<str>,
    {
        let value = value.as_ref();

        // The pattern only allows ASCII, so counting chars is enough.
        if value.chars().count() > MAX_EMAIL_LEN {
            return Err(DataParsingError::EmailInvalid(value.to_owned()));
        }

        if regex_is_match!(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
            value
        ) {
            Ok(ValidEmail(value.to_owned()))
        } else {
            Err(DataParsingError::EmailInvalid(value.to_owned()))
        }
    }
}

// ###################################
// ->   ERROR
// ###################################
#[derive(Debug, thiserror::Error)]
pub enum DataParsingError {
    #[error("{0} is not a valid email")]
    EmailInvalid(String),
}
