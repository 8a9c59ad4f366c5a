use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// The text transformations exposed to callers.
///
/// Each operation maps to exactly one model identifier and one set of hard
/// limits in the process configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Summarize,
    Translate,
    Classify,
}

impl Operation {
    pub const ALL: [Operation; 3] = [
        Operation::Summarize,
        Operation::Translate,
        Operation::Classify,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Summarize => "summarize",
            Operation::Translate => "translate",
            Operation::Classify => "classify",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "summarize" => Ok(Operation::Summarize),
            "translate" => Ok(Operation::Translate),
            "classify" => Ok(Operation::Classify),
            _ => Err(Error::UnknownOperation(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Summarize".parse::<Operation>().unwrap(), Operation::Summarize);
        assert_eq!(" classify ".parse::<Operation>().unwrap(), Operation::Classify);
    }

    #[test]
    fn test_parse_unknown() {
        let err = "embed".parse::<Operation>().unwrap_err();
        assert_eq!(err, Error::UnknownOperation("embed".to_string()));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Operation::Translate).unwrap();
        assert_eq!(json, "\"translate\"");

        let op: Operation = serde_json::from_str("\"classify\"").unwrap();
        assert_eq!(op, Operation::Classify);
    }
}
