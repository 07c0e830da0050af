//! Read requests and their results.

use super::message::Message;
use crate::error::AtError;
use serde::Serialize;
use std::fmt;

/// How one read ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOutcome {
    Success,
    /// I/O failure, or no data at all within the window.
    CommError,
    TimeoutWaitingTerminator,
    /// A generic terminator arrived instead of the requested keyword.
    KeywordNotMatched,
    BufferOverflow,
}

impl ReadOutcome {
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// Process exit status for command-line use.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::CommError => 1,
            Self::TimeoutWaitingTerminator => 2,
            Self::KeywordNotMatched => 3,
            Self::BufferOverflow => 4,
        }
    }
}

impl fmt::Display for ReadOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::CommError => "communication error",
            Self::TimeoutWaitingTerminator => "timeout waiting for terminator",
            Self::KeywordNotMatched => "keyword not matched",
            Self::BufferOverflow => "buffer overflow",
        };
        f.write_str(s)
    }
}

/// Parameters for one read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest<'a> {
    /// Line prefix that ends the read successfully. An empty keyword is
    /// treated as no keyword.
    pub keyword: Option<&'a str>,
    /// Accumulate the response into a [`Message`].
    pub capture: bool,
}

impl<'a> ReadRequest<'a> {
    /// Read until a generic terminator, capturing the response.
    pub fn new() -> Self {
        Self {
            keyword: None,
            capture: true,
        }
    }

    /// Read until `keyword`, capturing the response.
    pub fn keyword(keyword: &'a str) -> Self {
        Self {
            keyword: Some(keyword).filter(|k| !k.is_empty()),
            capture: true,
        }
    }

    /// Keep nothing; only the outcome is reported.
    pub fn discard(mut self) -> Self {
        self.capture = false;
        self
    }
}

impl Default for ReadRequest<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one read.
///
/// When the request captured, `message` holds everything accumulated on
/// every exit path, including failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadResponse {
    pub outcome: ReadOutcome,
    pub message: Option<Message>,
    /// The keyword the read was waiting for, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
}

impl ReadResponse {
    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    /// Convert into a `Result`, dropping any partial message on failure.
    pub fn into_result(self) -> Result<Message, AtError> {
        match self.outcome {
            ReadOutcome::Success => Ok(self.message.unwrap_or_default()),
            ReadOutcome::CommError => Err(AtError::NoResponse),
            ReadOutcome::TimeoutWaitingTerminator => Err(AtError::Timeout),
            ReadOutcome::KeywordNotMatched => {
                Err(AtError::KeywordNotMatched(self.keyword.unwrap_or_default()))
            }
            ReadOutcome::BufferOverflow => Err(AtError::BufferOverflow {
                limit: super::message::MAX_MESSAGE_LEN,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_exit_codes_are_distinct() {
        let outcomes = [
            ReadOutcome::Success,
            ReadOutcome::CommError,
            ReadOutcome::TimeoutWaitingTerminator,
            ReadOutcome::KeywordNotMatched,
            ReadOutcome::BufferOverflow,
        ];
        let codes: HashSet<u8> = outcomes.iter().map(|o| o.exit_code()).collect();
        assert_eq!(codes.len(), outcomes.len());
        assert_eq!(ReadOutcome::Success.exit_code(), 0);
    }

    #[test]
    fn test_request_builders() {
        let request = ReadRequest::new();
        assert_eq!(request.keyword, None);
        assert!(request.capture);

        let request = ReadRequest::keyword("+CREG:").discard();
        assert_eq!(request.keyword, Some("+CREG:"));
        assert!(!request.capture);

        assert_eq!(ReadRequest::keyword("").keyword, None);
    }

    #[test]
    fn test_into_result() {
        let response = ReadResponse {
            outcome: ReadOutcome::KeywordNotMatched,
            message: None,
            keyword: Some("+CSQ:".into()),
        };
        let err = response.into_result().unwrap_err();
        assert!(matches!(err, AtError::KeywordNotMatched(k) if k == "+CSQ:"));

        let response = ReadResponse {
            outcome: ReadOutcome::Success,
            message: None,
            keyword: None,
        };
        assert!(response.into_result().unwrap().is_empty());
    }

    #[test]
    fn test_response_json() {
        let response = ReadResponse {
            outcome: ReadOutcome::TimeoutWaitingTerminator,
            message: None,
            keyword: None,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["outcome"], "timeout_waiting_terminator");
        assert!(json["message"].is_null());
        assert!(json.get("keyword").is_none());

        let response = ReadResponse {
            keyword: Some("+CREG:".into()),
            ..response
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["keyword"], "+CREG:");
    }
}
