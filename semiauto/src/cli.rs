use semiauto_core::{
    config::Config,
    event::TransportEvent,
    session::{ConnectionState, KeyInput, Notification, Session},
    test_list::{Outcome, Summary, TestListView, TestRow},
    transport::MemoryTransport,
};
use serde::Serialize;
use std::{fmt::Write, fs};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Clone)]
pub struct CliError {
    message: String,
    code: i32,
}

impl CliError {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 1,
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: 2,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> i32 {
        self.code
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(value: anyhow::Error) -> Self {
        Self::system(value.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ReplayArgs {
    pub file: std::path::PathBuf,
    pub json: bool,
}

/// One line of a replay transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Step<'a> {
    /// Inbound frame from the runner.
    Message(&'a str),
    /// Operator accepts the open dialog, typing `text` first when it has a field.
    Answer(&'a str),
    /// Operator cancels the open dialog.
    Cancel,
}

fn parse_step(line: &str) -> Option<Step<'_>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    if let Some(rest) = line.strip_prefix('>') {
        if rest.trim() == "!" {
            return Some(Step::Cancel);
        }
        return Some(Step::Answer(rest.strip_prefix(' ').unwrap_or(rest)));
    }
    Some(Step::Message(line))
}

#[derive(Serialize)]
struct PromptOutput {
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ReplayOutput<'a> {
    state: ConnectionState,
    notification: Option<&'a Notification>,
    rows: &'a [TestRow],
    summary: Summary,
    replies: &'a [String],
    pending_prompts: Vec<PromptOutput>,
}

/// Feed a transcript through a session with an in-memory transport.
fn replay_transcript(
    transcript: &str,
    config: &Config,
) -> CliResult<Session<MemoryTransport>> {
    let mut session = Session::new(MemoryTransport::default(), config.protocol.dialect);
    session.connect();
    session.handle_event(TransportEvent::Opened);

    for (idx, line) in transcript.lines().enumerate() {
        let Some(step) = parse_step(line) else {
            continue;
        };
        let line_no = idx + 1;
        match step {
            Step::Message(text) => {
                session.handle_event(TransportEvent::Message(text.to_string()));
            }
            Step::Answer(text) => {
                let Some(dialog) = session.dialog() else {
                    return Err(CliError::user(format!(
                        "line {line_no}: no open prompt to answer"
                    )));
                };
                if dialog.input_has_focus() {
                    for c in text.chars() {
                        session.handle_key(KeyInput::Char(c));
                    }
                }
                session.confirm_dialog();
            }
            Step::Cancel => {
                if !session.cancel_dialog() {
                    return Err(CliError::user(format!(
                        "line {line_no}: no open prompt to cancel"
                    )));
                }
            }
        }
    }
    log::info!(
        "replayed transcript: {} rows, {} replies",
        session.tests().len(),
        session.transport().sent.len()
    );
    Ok(session)
}

fn pending_prompts(session: &Session<MemoryTransport>) -> Vec<PromptOutput> {
    let open = session.dialog().map(|d| PromptOutput {
        kind: d.kind().as_str(),
        message: d.message().to_string(),
    });
    open.into_iter()
        .chain(session.queued_prompts().map(|p| PromptOutput {
            kind: p.kind.as_str(),
            message: p.message.clone(),
        }))
        .collect()
}

pub fn cmd_replay(config: &Config, args: &ReplayArgs) -> CliResult<()> {
    let transcript = fs::read_to_string(&args.file).map_err(|e| {
        CliError::user(format!(
            "Could not read transcript {}: {e}",
            args.file.display()
        ))
    })?;
    let session = replay_transcript(&transcript, config)?;
    let tests = session.tests();
    let pending = pending_prompts(&session);

    if args.json {
        print_json(&ReplayOutput {
            state: session.state(),
            notification: session.notification(),
            rows: tests.rows(),
            summary: tests.summary(),
            replies: &session.transport().sent,
            pending_prompts: pending,
        })?;
    } else {
        print!("{}", format_test_table(tests));
        if let Some(notification) = session.notification() {
            println!("\n{}", notification.text);
        }
        if !session.transport().sent.is_empty() {
            println!("\nreplies:");
            for reply in &session.transport().sent {
                println!("  {reply}");
            }
        }
        if !pending.is_empty() {
            print!("\n{}", format_prompt_table(&pending));
        }
    }

    if session.failed() {
        let message = session
            .notification()
            .map_or_else(|| "protocol error".to_string(), |n| n.text.clone());
        return Err(CliError::user(message));
    }
    Ok(())
}

fn result_text(row: &TestRow) -> &str {
    match (&row.result, row.outcome) {
        (Some(result), _) => result,
        (None, Outcome::NotRun) => "-",
        (None, outcome) => outcome.label(),
    }
}

fn format_test_table(tests: &TestListView) -> String {
    let id_header = "id";
    let test_header = "test";
    let result_header = "result";
    let id_width = tests
        .rows()
        .iter()
        .map(|row| row.descriptor.id.as_str().len())
        .max()
        .unwrap_or(0)
        .max(id_header.len());
    let test_width = tests
        .rows()
        .iter()
        .map(|row| row.descriptor.description.len())
        .max()
        .unwrap_or(0)
        .max(test_header.len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{id_header:<id_width$}  {test_header:<test_width$}  {result_header}"
    );
    for row in tests.rows() {
        let _ = writeln!(
            out,
            "{:<id_width$}  {:<test_width$}  {}",
            row.descriptor.id.as_str(),
            row.descriptor.description,
            result_text(row)
        );
        if let Some(message) = &row.message {
            for line in message.lines() {
                let _ = writeln!(out, "{:id_width$}    {line}", "");
            }
        }
    }
    let summary = tests.summary();
    let _ = writeln!(
        out,
        "\n{} passed, {} failed, {} not run",
        summary.passed, summary.failed, summary.not_run
    );
    out
}

fn format_prompt_table(prompts: &[PromptOutput]) -> String {
    let kind_header = "pending";
    let kind_width = prompts
        .iter()
        .map(|p| p.kind.len())
        .max()
        .unwrap_or(0)
        .max(kind_header.len());

    let mut out = String::new();
    let _ = writeln!(out, "{kind_header:<kind_width$}  message");
    for prompt in prompts {
        let message = prompt.message.replace('\n', " ");
        let _ = writeln!(out, "{:<kind_width$}  {message}", prompt.kind);
    }
    out
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!(
        "{}",
        serde_json::to_string(value).map_err(|e| CliError::system(e.to_string()))?
    );
    Ok(())
}

pub fn print_error(error: &CliError, json: bool) {
    if json {
        let payload = serde_json::json!({ "error": error.message() });
        eprintln!("{payload}");
    } else {
        eprintln!("{}", error.message());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use semiauto_core::config;

    fn test_config() -> Config {
        config::load_config_from_str("").unwrap()
    }

    const TRANSCRIPT: &str = r#"
# two tests, one prompt
{"testList":[{"id":0,"description":"Geolocation works"},{"id":1,"description":"Vibration works"}]}
{"testRunStart":null}
{"updateTest":{"id":0,"event":"testStart"}}
{"prompt":"Enter device IMEI"}
> 12345
{"updateTest":{"id":0,"event":"success"}}
{"updateTest":{"id":1,"event":"testStart"}}
{"confirmPrompt":"Did it vibrate?"}
"#;

    #[test]
    fn parse_step_kinds() {
        assert_eq!(parse_step("  "), None);
        assert_eq!(parse_step("# comment"), None);
        assert_eq!(parse_step("> 42"), Some(Step::Answer("42")));
        assert_eq!(parse_step(">"), Some(Step::Answer("")));
        assert_eq!(parse_step(">!"), Some(Step::Cancel));
        assert_eq!(
            parse_step(r#"{"prompt":"x"}"#),
            Some(Step::Message(r#"{"prompt":"x"}"#))
        );
    }

    #[test]
    fn replay_answers_prompts_and_leaves_pending() {
        let session = replay_transcript(TRANSCRIPT, &test_config()).unwrap();
        assert_eq!(session.transport().sent, vec![r#"{"prompt":"12345"}"#]);
        assert_eq!(session.tests().summary().passed, 1);
        assert_eq!(session.tests().summary().running, 1);

        let pending = pending_prompts(&session);
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].message, "Did it vibrate?");
        assert!(!session.failed());
    }

    #[test]
    fn replay_cancel_without_prompt_is_user_error() {
        let error = replay_transcript(">!", &test_config()).err().unwrap();
        assert_eq!(error.code(), 1);
        assert_eq!(error.message(), "line 1: no open prompt to cancel");
    }

    #[test]
    fn replay_answer_without_prompt_is_user_error() {
        let transcript = "{\"testRunStart\":null}\n> hello";
        let error = replay_transcript(transcript, &test_config()).err().unwrap();
        assert_eq!(error.message(), "line 2: no open prompt to answer");
    }

    #[test]
    fn replay_protocol_error_marks_session_failed() {
        let session = replay_transcript(r#"{"reboot":true}"#, &test_config()).unwrap();
        assert!(session.failed());
        assert_eq!(session.state(), ConnectionState::Closed);
    }

    #[test]
    fn format_test_table_snapshot() {
        let session = replay_transcript(TRANSCRIPT, &test_config()).unwrap();
        let rendered = format_test_table(session.tests());
        assert_eq!(
            rendered,
            "id  test               result\n\
             0   Geolocation works  Pass\n\
             1   Vibration works    \n\
             \n\
             1 passed, 0 failed, 0 not run\n"
        );
    }

    #[test]
    fn format_prompt_table_snapshot() {
        let prompts = vec![
            PromptOutput {
                kind: "confirm",
                message: "Did it vibrate?".to_string(),
            },
            PromptOutput {
                kind: "instruct",
                message: "Unplug\nthe charger".to_string(),
            },
        ];
        assert_eq!(
            format_prompt_table(&prompts),
            "pending   message\n\
             confirm   Did it vibrate?\n\
             instruct  Unplug the charger\n"
        );
    }
}
