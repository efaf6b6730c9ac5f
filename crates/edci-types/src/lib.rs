//! Validated identity primitives shared by the EDCI crates.
//!
//! Facility identifiers travel through provider feeds, REST paths and CLI arguments, so they are
//! checked once at the boundary and carried as typed values afterwards.

/// Maximum length of a facility identifier.
pub const MAX_FACILITY_ID_LEN: usize = 128;

/// Errors that can occur when creating validated identity types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// The identifier is longer than [`MAX_FACILITY_ID_LEN`]
    #[error("identifier exceeds maximum length of {MAX_FACILITY_ID_LEN} characters")]
    TooLong,
    /// The identifier contains a character outside `[A-Za-z0-9._-]`
    #[error("identifier contains invalid character {0:?} (only alphanumeric, '.', '-', '_' allowed)")]
    InvalidCharacter(char),
}

/// Stable identifier of an emergency-department facility, e.g. `linkou-chang-gung`.
///
/// The identifier is trimmed on construction and restricted to a conservative ASCII slug
/// alphabet so it can be embedded in URL paths without escaping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FacilityId(String);

impl FacilityId {
    /// Creates a new `FacilityId` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input, [`TextError::TooLong`] for identifiers over
    /// [`MAX_FACILITY_ID_LEN`] characters and [`TextError::InvalidCharacter`] for anything
    /// outside `[A-Za-z0-9._-]`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        if trimmed.len() > MAX_FACILITY_ID_LEN {
            return Err(TextError::TooLong);
        }
        if let Some(bad) = trimmed
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_')))
        {
            return Err(TextError::InvalidCharacter(bad));
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Human-readable facility name. Any script is allowed; only blank names are rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacilityName(String);

impl FacilityName {
    /// Creates a new `FacilityName`, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

macro_rules! string_newtype_impls {
    ($ty:ident) => {
        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::str::FromStr for $ty {
            type Err = TextError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $ty::new(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

string_newtype_impls!(FacilityId);
string_newtype_impls!(FacilityName);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facility_id_is_trimmed() {
        let id = FacilityId::new("  linkou-chang-gung ").expect("valid id");
        assert_eq!(id.as_str(), "linkou-chang-gung");
    }

    #[test]
    fn facility_id_rejects_blank() {
        assert_eq!(FacilityId::new("   "), Err(TextError::Empty));
    }

    #[test]
    fn facility_id_rejects_path_characters() {
        assert_eq!(
            FacilityId::new("st-paul/../x"),
            Err(TextError::InvalidCharacter('/'))
        );
        assert_eq!(
            FacilityId::new("min sheng"),
            Err(TextError::InvalidCharacter(' '))
        );
    }

    #[test]
    fn facility_id_rejects_overlong_input() {
        let long = "a".repeat(MAX_FACILITY_ID_LEN + 1);
        assert_eq!(FacilityId::new(long), Err(TextError::TooLong));
        assert!(FacilityId::new("a".repeat(MAX_FACILITY_ID_LEN)).is_ok());
    }

    #[test]
    fn facility_name_accepts_non_latin_script() {
        let name = FacilityName::new("林口長庚醫院").expect("valid name");
        assert_eq!(name.to_string(), "林口長庚醫院");
    }

    #[test]
    fn deserialize_validates_input() {
        let ok: FacilityId = serde_json::from_str("\"e-jen\"").expect("valid id");
        assert_eq!(ok.as_str(), "e-jen");

        let err = serde_json::from_str::<FacilityId>("\"\"").expect_err("blank id");
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = FacilityId::new("tian-cheng").expect("valid id");
        assert_eq!(serde_json::to_string(&id).expect("serialize"), "\"tian-cheng\"");
    }
}
