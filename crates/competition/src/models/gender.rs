use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::CompetitionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Gender {
    F,
    M,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::F => "F",
            Self::M => "M",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = CompetitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "f" | "female" | "women" | "w" => Ok(Self::F),
            "m" | "male" | "men" => Ok(Self::M),
            other => Err(CompetitionError::Validation(format!(
                "Unknown gender '{}'. Must be 'M' or 'F'",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variants() {
        assert_eq!("M".parse::<Gender>().unwrap(), Gender::M);
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::F);
        assert!("X".parse::<Gender>().is_err());
    }

    #[test]
    fn test_deserialize_accepts_long_names() {
        let parsed: Vec<Gender> = serde_json::from_str(r#"["female", "M", "Men", "f"]"#).unwrap();
        assert_eq!(parsed, vec![Gender::F, Gender::M, Gender::M, Gender::F]);
        assert!(serde_json::from_str::<Gender>(r#""X""#).is_err());
        assert_eq!(serde_json::to_string(&Gender::F).unwrap(), r#""F""#);
    }

    #[test]
    fn test_women_sort_first() {
        assert!(Gender::F < Gender::M);
    }
}
