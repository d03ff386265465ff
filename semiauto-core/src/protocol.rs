//! Wire format spoken with the test runner.
//!
//! Two inbound framings exist in the wild. Current runners send single-key
//! objects (`{"prompt": "..."}`); older runners send `{"action": "...", ...}`
//! with snake_case names. Both decode into [`Inbound`]. Replies are single-key
//! objects whose key spelling follows the [`Dialect`] of the runner.

use crate::dialog::DialogKind;
use crate::test_list::{TestDescriptor, TestId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// Single-key objects with camelCase replies.
    Keyed,
    /// `action`-tagged objects with snake_case replies.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub kind: DialogKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestEventKind {
    TestStart,
    Success,
    ExpectedFailure,
    Skip,
    Error,
    Failure,
    ExpectedSuccess,
}

impl TestEventKind {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "testStart" | "test_start" => Some(Self::TestStart),
            "success" => Some(Self::Success),
            "expectedFailure" | "expected_failure" => Some(Self::ExpectedFailure),
            "skip" => Some(Self::Skip),
            "error" => Some(Self::Error),
            "failure" => Some(Self::Failure),
            "expectedSuccess" | "expected_success" | "unexpectedSuccess" => {
                Some(Self::ExpectedSuccess)
            }
            _ => None,
        }
    }
}

/// One lifecycle event for one test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestEvent {
    pub id: TestId,
    pub kind: TestEventKind,
    /// Error string for `error`/`failure`, reason for `skip`, or a status
    /// label for legacy outcomes without a dedicated kind.
    pub detail: Option<String>,
    /// Extra diagnostic output attached to a finished test.
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    TestList(Vec<TestDescriptor>),
    RunStarted(Option<String>),
    RunFinished(Option<String>),
    Prompt(PromptRequest),
    UpdateTest(TestEvent),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Payload is not JSON, or a known command carries the wrong shape.
    Malformed(String),
    /// Command outside the known vocabulary.
    UnknownCommand(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(reason) => write!(f, "Malformed message from server: {reason}"),
            Self::UnknownCommand(command) => {
                write!(f, "Received unknown message from server: {command}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

type ParseResult<T> = Result<T, ProtocolError>;

fn malformed(reason: impl Into<String>) -> ProtocolError {
    ProtocolError::Malformed(reason.into())
}

/// Decode one inbound frame, reporting which framing it used.
pub fn parse_inbound(text: &str) -> ParseResult<(Inbound, Dialect)> {
    let value: Value = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(malformed("expected a JSON object"));
    };

    if let Some(action) = object.get("action") {
        let action = action
            .as_str()
            .ok_or_else(|| malformed("`action` must be a string"))?;
        return parse_legacy(action, &object).map(|msg| (msg, Dialect::Legacy));
    }

    let mut entries = object.into_iter();
    match (entries.next(), entries.next()) {
        (Some((command, payload)), None) => {
            parse_keyed(&command, payload).map(|msg| (msg, Dialect::Keyed))
        }
        (None, _) => Err(malformed("empty message")),
        (Some((first, _)), Some((second, _))) => Err(ProtocolError::UnknownCommand(format!(
            "{{{first}, {second}, ...}}"
        ))),
    }
}

fn parse_keyed(command: &str, payload: Value) -> ParseResult<Inbound> {
    match command {
        "testList" | "suite_start" => parse_manifest(payload).map(Inbound::TestList),
        "testRunStart" => Ok(Inbound::RunStarted(optional_text(&payload))),
        "suite_end" | "testRunStop" => Ok(Inbound::RunFinished(optional_text(&payload))),
        "prompt" => prompt(DialogKind::Prompt, payload),
        "instructPrompt" | "instruct_prompt" => prompt(DialogKind::Instruct, payload),
        "confirmPrompt" | "confirm_prompt" => prompt(DialogKind::Confirm, payload),
        "updateTest" | "test_start" | "test_end" => {
            let payload: TestEventPayload = serde_json::from_value(payload)
                .map_err(|e| malformed(format!("{command}: {e}")))?;
            payload.into_event(command).map(Inbound::UpdateTest)
        }
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

fn parse_legacy(action: &str, object: &Map<String, Value>) -> ParseResult<Inbound> {
    let field = |name: &str| object.get(name).cloned().unwrap_or(Value::Null);
    match action {
        "suite_start" => parse_manifest(field("tests")).map(Inbound::TestList),
        "suite_end" => Ok(Inbound::RunFinished(None)),
        "prompt" => prompt(DialogKind::Prompt, field("message")),
        "instruct_prompt" => prompt(DialogKind::Instruct, field("instruction")),
        "confirm_prompt" => prompt(DialogKind::Confirm, field("question")),
        "test_start" | "test_end" => {
            let payload: TestEventPayload = serde_json::from_value(Value::Object(object.clone()))
                .map_err(|e| malformed(format!("{action}: {e}")))?;
            payload.into_event(action).map(Inbound::UpdateTest)
        }
        other => Err(ProtocolError::UnknownCommand(other.to_string())),
    }
}

fn prompt(kind: DialogKind, payload: Value) -> ParseResult<Inbound> {
    match payload {
        Value::String(message) => Ok(Inbound::Prompt(PromptRequest { kind, message })),
        other => Err(malformed(format!(
            "{} expects a string, got {other}",
            kind.as_str()
        ))),
    }
}

fn optional_text(payload: &Value) -> Option<String> {
    payload.as_str().map(str::to_string)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestEntry {
    Name(String),
    Described { id: Value, description: String },
}

fn parse_manifest(payload: Value) -> ParseResult<Vec<TestDescriptor>> {
    let entries: Vec<ManifestEntry> =
        serde_json::from_value(payload).map_err(|e| malformed(format!("test list: {e}")))?;
    entries
        .into_iter()
        .map(|entry| match entry {
            ManifestEntry::Name(name) => Ok(TestDescriptor {
                id: TestId::from(name.as_str()),
                description: name,
            }),
            ManifestEntry::Described { id, description } => Ok(TestDescriptor {
                id: test_id(&id)?,
                description,
            }),
        })
        .collect()
}

fn test_id(value: &Value) -> ParseResult<TestId> {
    match value {
        Value::String(s) => Ok(TestId::from(s.as_str())),
        Value::Number(n) => Ok(TestId::from(n.to_string())),
        other => Err(malformed(format!("invalid test id {other}"))),
    }
}

/// Union of the keyed `updateTest` payload and the legacy `test_start`/`test_end` body.
#[derive(Deserialize)]
struct TestEventPayload {
    id: Option<Value>,
    test: Option<Value>,
    event: Option<String>,
    status: Option<String>,
    expected: Option<String>,
    error: Option<String>,
    reason: Option<String>,
    message: Option<String>,
}

impl TestEventPayload {
    fn into_event(self, command: &str) -> ParseResult<TestEvent> {
        let id = self
            .id
            .as_ref()
            .or(self.test.as_ref())
            .ok_or_else(|| malformed(format!("{command}: missing test id")))
            .and_then(test_id)?;

        if let Some(event) = self.event.as_deref() {
            let kind = TestEventKind::from_wire(event)
                .ok_or_else(|| ProtocolError::UnknownCommand(format!("{command}: {event}")))?;
            let detail = match kind {
                TestEventKind::Skip => self.reason.or(self.message),
                TestEventKind::Error | TestEventKind::Failure => self.error.or(self.message),
                _ => None,
            };
            return Ok(TestEvent {
                id,
                kind,
                detail,
                message: None,
            });
        }

        if command == "test_start" {
            return Ok(TestEvent {
                id,
                kind: TestEventKind::TestStart,
                detail: None,
                message: None,
            });
        }

        let status = self
            .status
            .ok_or_else(|| malformed(format!("{command}: missing `event` or `status`")))?;
        Ok(legacy_test_end(id, &status, self.expected.as_deref(), self.message))
    }
}

/// Map a structured-log `test_end` to an event.
///
/// `expected` is only present when the outcome differs from the expectation,
/// so a FAIL without it was an expected failure and a PASS expected to FAIL
/// is an unexpected success.
fn legacy_test_end(
    id: TestId,
    status: &str,
    expected: Option<&str>,
    message: Option<String>,
) -> TestEvent {
    let upper = status.to_ascii_uppercase();
    let (kind, detail, message) = match (upper.as_str(), expected) {
        ("FAIL", None) => (TestEventKind::ExpectedFailure, None, None),
        ("PASS", Some("FAIL")) => (TestEventKind::ExpectedSuccess, None, None),
        ("PASS" | "OK", _) => (TestEventKind::Success, None, message),
        ("FAIL", Some(_)) => (TestEventKind::Failure, Some(titleize_status(&upper)), message),
        ("SKIP", _) => (TestEventKind::Skip, Some("Skip".to_string()), message),
        _ => (TestEventKind::Error, Some(titleize_status(&upper)), message),
    };
    TestEvent {
        id,
        kind,
        detail,
        message,
    }
}

fn titleize_status(status: &str) -> String {
    crate::test_list::titleize(&status.to_lowercase().replace('_', " "))
}

/// Replies sent back to the runner when the operator answers a dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Prompt(String),
    PromptCancel,
    InstructPromptOk,
    InstructPromptCancel,
    ConfirmPromptOk,
    ConfirmPromptCancel,
}

impl Outbound {
    pub fn event_name(&self, dialect: Dialect) -> &'static str {
        match (self, dialect) {
            (Self::Prompt(_), _) => "prompt",
            (Self::PromptCancel, Dialect::Keyed) => "promptCancel",
            (Self::PromptCancel, Dialect::Legacy) => "prompt_cancel",
            (Self::InstructPromptOk, Dialect::Keyed) => "instructPromptOk",
            (Self::InstructPromptOk, Dialect::Legacy) => "instruct_prompt_ok",
            (Self::InstructPromptCancel, Dialect::Keyed) => "instructPromptCancel",
            (Self::InstructPromptCancel, Dialect::Legacy) => "instruct_prompt_cancel",
            (Self::ConfirmPromptOk, Dialect::Keyed) => "confirmPromptOk",
            (Self::ConfirmPromptOk, Dialect::Legacy) => "confirm_prompt_ok",
            (Self::ConfirmPromptCancel, Dialect::Keyed) => "confirmPromptCancel",
            (Self::ConfirmPromptCancel, Dialect::Legacy) => "confirm_prompt_cancel",
        }
    }

    pub fn data(&self) -> Option<Value> {
        match self {
            Self::Prompt(text) => Some(Value::String(text.clone())),
            _ => None,
        }
    }
}

/// Serialize `{event: data}`. Event names are not checked against any vocabulary.
pub fn encode_event(event: &str, data: Option<Value>) -> String {
    let mut command = Map::new();
    command.insert(event.to_string(), data.unwrap_or(Value::Null));
    Value::Object(command).to_string()
}
