//! Row-shaped domain records
//!
//! Entities here mirror the database tables one to one and carry no behavior
//! beyond field storage and level-code conversion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Severity of an application log event, stored as a smallint code.
///
/// The codes are ordered so that range filters (`level >= Warning`) work
/// directly on the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Verbose,
    Debug,
    Information,
    Warning,
    Error,
    Fatal,
}

impl LogLevel {
    pub fn as_i16(&self) -> i16 {
        match self {
            Self::Verbose => 0,
            Self::Debug => 1,
            Self::Information => 2,
            Self::Warning => 3,
            Self::Error => 4,
            Self::Fatal => 5,
        }
    }

    /// Decode a stored level code. Unknown codes map to `Information`.
    pub fn from_i16(code: i16) -> Self {
        match code {
            0 => Self::Verbose,
            1 => Self::Debug,
            3 => Self::Warning,
            4 => Self::Error,
            5 => Self::Fatal,
            _ => Self::Information,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verbose => "verbose",
            Self::Debug => "debug",
            Self::Information => "information",
            Self::Warning => "warning",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "verbose" | "trace" => Ok(Self::Verbose),
            "debug" => Ok(Self::Debug),
            "information" | "info" => Ok(Self::Information),
            "warning" | "warn" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "fatal" | "critical" => Ok(Self::Fatal),
            _ => Err(format!("Invalid log level: {}", s)),
        }
    }
}

/// One structured application log event, immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApplicationLog {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// Level code, see [`LogLevel`]
    pub level: i16,
    pub message: String,
    pub exception: Option<String>,
    pub application: Option<String>,
    pub http_method: Option<String>,
    pub request_path: Option<String>,
    pub status_code: Option<i32>,
    pub duration_ms: Option<i64>,
    pub correlation_id: Option<String>,
    pub request_id: Option<String>,
}

impl ApplicationLog {
    pub fn level(&self) -> LogLevel {
        LogLevel::from_i16(self.level)
    }
}

/// Input for inserting an application log row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewApplicationLog {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub exception: Option<String>,
    pub application: Option<String>,
    pub http_method: Option<String>,
    pub request_path: Option<String>,
    pub status_code: Option<i32>,
    pub duration_ms: Option<i64>,
    pub correlation_id: Option<String>,
    pub request_id: Option<String>,
}

impl NewApplicationLog {
    /// A bare message-only event at the given level, stamped now.
    pub fn event(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            exception: None,
            application: None,
            http_method: None,
            request_path: None,
            status_code: None,
            duration_ms: None,
            correlation_id: None,
            request_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_codes_round_trip() {
        for level in [
            LogLevel::Verbose,
            LogLevel::Debug,
            LogLevel::Information,
            LogLevel::Warning,
            LogLevel::Error,
            LogLevel::Fatal,
        ] {
            assert_eq!(LogLevel::from_i16(level.as_i16()), level);
        }
    }

    #[test]
    fn test_unknown_code_maps_to_information() {
        assert_eq!(LogLevel::from_i16(42), LogLevel::Information);
        assert_eq!(LogLevel::from_i16(-1), LogLevel::Information);
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Error > LogLevel::Warning);
        assert!(LogLevel::Fatal > LogLevel::Error);
        assert!(LogLevel::Verbose < LogLevel::Debug);
    }

    #[test]
    fn test_level_from_str_aliases() {
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Information));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("critical".parse::<LogLevel>(), Ok(LogLevel::Fatal));
        assert!("nope".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_level_serialization() {
        let json = serde_json::to_string(&LogLevel::Warning).unwrap();
        assert_eq!(json, r#""warning""#);

        let level: LogLevel = serde_json::from_str(r#""fatal""#).unwrap();
        assert_eq!(level, LogLevel::Fatal);
    }
}
