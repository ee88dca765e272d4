//! Opaque document ids.
//!
//! Ids decode leniently: a number becomes its text and any other non-string
//! shape becomes the empty id.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::lenient;

macro_rules! string_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = Value::deserialize(deserializer)?;
                Ok(Self(lenient::as_label(&value).unwrap_or_default()))
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

string_id!(
    /// Strategy document id; also the id of its health snapshot.
    StrategyId
);
string_id!(
    /// Completed wheel cycle id
    CycleId
);
string_id!(
    /// Backtest run id, unique within a strategy
    RunId
);
string_id!(
    /// Batch of backtest runs sharing one parameter sweep
    BatchId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_strings() {
        let id = RunId::new("run-7");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""run-7""#);
        let back: RunId = serde_json::from_str(r#""run-7""#).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_is_raw_id() {
        assert_eq!(StrategyId::from("wheel-spy").to_string(), "wheel-spy");
    }

    #[test]
    fn numeric_ids_read_as_text() {
        let id: CycleId = serde_json::from_str("7").unwrap();
        assert_eq!(id.as_str(), "7");
        let id: RunId = serde_json::from_str(r#"{"nested": true}"#).unwrap();
        assert_eq!(id, RunId::default());
    }
}
