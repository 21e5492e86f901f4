// SPDX-FileCopyrightText: 2026 Accesspark Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire format spoken between the relay-mode facade and the relay.
//!
//! A request is a flat JSON object `{action, token?, ...params}`. The relay
//! answers `200 {status, data}` when it reached the upstream service (whatever
//! the upstream said) and `400`/`500 {error}` when the relay itself failed.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};

/// Every action name the relay recognizes. Matching is case-exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum ActionKind {
    #[strum(serialize = "signUp")]
    SignUp,
    #[strum(serialize = "signIn", serialize = "signInWithPassword")]
    SignIn,
    #[strum(serialize = "signOut")]
    SignOut,
    #[strum(serialize = "getUser")]
    GetUser,
    #[strum(serialize = "select")]
    Select,
    #[strum(serialize = "insert")]
    Insert,
    #[strum(serialize = "update")]
    Update,
    #[strum(serialize = "delete")]
    Delete,
    #[strum(serialize = "storage")]
    Storage,
    #[strum(serialize = "upload")]
    Upload,
}

/// A password on the wire. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Password(pub String);

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[redacted]")
    }
}

/// One structured action and its parameters.
///
/// `query` strings are already encoded (`select=*&status=eq.approved`) and are
/// appended to the upstream path verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum RelayAction {
    #[serde(rename = "signUp")]
    SignUp { email: String, password: Password },
    #[serde(rename = "signIn", alias = "signInWithPassword")]
    SignIn { email: String, password: Password },
    #[serde(rename = "signOut")]
    SignOut,
    #[serde(rename = "getUser")]
    GetUser,
    #[serde(rename = "select")]
    Select {
        table: String,
        #[serde(default)]
        query: String,
    },
    #[serde(rename = "insert")]
    Insert { table: String, data: Value },
    #[serde(rename = "update")]
    Update {
        table: String,
        data: Value,
        #[serde(default)]
        query: String,
    },
    #[serde(rename = "delete")]
    Delete {
        table: String,
        #[serde(default)]
        query: String,
    },
    #[serde(rename = "storage")]
    Storage { bucket: String, path: String },
    #[serde(rename = "upload")]
    Upload {
        bucket: String,
        path: String,
        content_type: String,
        data_base64: String,
    },
}

impl RelayAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::SignUp { .. } => ActionKind::SignUp,
            Self::SignIn { .. } => ActionKind::SignIn,
            Self::SignOut => ActionKind::SignOut,
            Self::GetUser => ActionKind::GetUser,
            Self::Select { .. } => ActionKind::Select,
            Self::Insert { .. } => ActionKind::Insert,
            Self::Update { .. } => ActionKind::Update,
            Self::Delete { .. } => ActionKind::Delete,
            Self::Storage { .. } => ActionKind::Storage,
            Self::Upload { .. } => ActionKind::Upload,
        }
    }
}

/// The body posted to the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayRequest {
    /// Caller's bearer token. The relay falls back to its service key without it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub action: RelayAction,
}

impl RelayRequest {
    pub fn new(action: RelayAction, token: Option<String>) -> Self {
        Self { token, action }
    }
}

/// Successful relay response: the upstream status and decoded body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    pub status: u16,
    #[serde(default)]
    pub data: Value,
}

impl RelayEnvelope {
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}

/// Relay-level failure body for 400 and 500 responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayFailure {
    pub error: String,
}

/// Decodes an upstream body: empty is `null`, JSON is kept, anything else
/// becomes a JSON string of the text.
pub fn decode_body(bytes: &[u8]) -> Value {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Null;
    }
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    #[test]
    fn action_names_are_case_exact() {
        assert_eq!(ActionKind::from_str("select").unwrap(), ActionKind::Select);
        assert_eq!(
            ActionKind::from_str("signInWithPassword").unwrap(),
            ActionKind::SignIn
        );
        assert!(ActionKind::from_str("Select").is_err());
        assert!(ActionKind::from_str("drop").is_err());
        assert_eq!(ActionKind::SignUp.to_string(), "signUp");
    }

    #[test]
    fn request_is_a_flat_object() {
        let request = RelayRequest::new(
            RelayAction::Select {
                table: "parking_spots".into(),
                query: "select=*&status=eq.approved".into(),
            },
            Some("jwt".into()),
        );
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "action": "select",
                "table": "parking_spots",
                "query": "select=*&status=eq.approved",
                "token": "jwt"
            })
        );
    }

    #[test]
    fn sign_in_alias_and_missing_token_parse() {
        let request: RelayRequest = serde_json::from_value(json!({
            "action": "signInWithPassword",
            "email": "a@b.gr",
            "password": "pw"
        }))
        .unwrap();
        assert!(request.token.is_none());
        assert_eq!(request.action.kind(), ActionKind::SignIn);
    }

    #[test]
    fn password_is_never_printed() {
        let action = RelayAction::SignUp {
            email: "a@b.gr".into(),
            password: Password("hunter2".into()),
        };
        assert!(!format!("{action:?}").contains("hunter2"));
    }

    #[test]
    fn body_decoding() {
        assert_eq!(decode_body(b""), Value::Null);
        assert_eq!(decode_body(b"  \n"), Value::Null);
        assert_eq!(decode_body(br#"[{"id":1}]"#), json!([{"id": 1}]));
        assert_eq!(decode_body(b"Bad Gateway"), json!("Bad Gateway"));
    }

    #[test]
    fn envelope_error_threshold() {
        assert!(!RelayEnvelope { status: 204, data: Value::Null }.is_error());
        assert!(RelayEnvelope { status: 400, data: Value::Null }.is_error());
    }
}
