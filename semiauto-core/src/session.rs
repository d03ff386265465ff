use crate::config::DialectSetting;
use crate::dialog::{Dialog, DialogCommand, TextEdit};
use crate::event::TransportEvent;
use crate::keys::KeyDispatcher;
use crate::protocol::{
    Dialect, Inbound, Outbound, PromptRequest, ProtocolError, encode_event, parse_inbound,
};
use crate::test_list::TestListView;
use crate::transport::Transport;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;

pub const CONNECTING_TEXT: &str = "Connecting…";
pub const RUNNING_TEXT: &str = "Running tests…";
pub const DONE_TEXT: &str = "Done!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub text: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NotificationLevel::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            level: NotificationLevel::Error,
        }
    }
}

/// Operator input routed to the session by the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// An unmodified character key.
    Char(char),
    Edit(TextEdit),
    /// Activate the focused dialog control.
    Activate,
    Cancel,
    FocusNext,
    FocusPrev,
}

/// Client side of one session with the runner.
///
/// Owns the test table, the open dialog and the prompts waiting behind it.
/// Every transport event and key press is applied here, one at a time.
pub struct Session<T: Transport> {
    transport: T,
    state: ConnectionState,
    tests: TestListView,
    dialog: Option<Dialog>,
    queue: VecDeque<PromptRequest>,
    keys: KeyDispatcher<DialogCommand>,
    notification: Option<Notification>,
    dialect_setting: DialectSetting,
    dialect: Option<Dialect>,
    failed: bool,
}

impl<T: Transport> Session<T> {
    pub fn new(transport: T, dialect_setting: DialectSetting) -> Self {
        let dialect = match dialect_setting {
            DialectSetting::Auto => None,
            DialectSetting::Keyed => Some(Dialect::Keyed),
            DialectSetting::Legacy => Some(Dialect::Legacy),
        };
        Self {
            transport,
            state: ConnectionState::Disconnected,
            tests: TestListView::new(),
            dialog: None,
            queue: VecDeque::new(),
            keys: KeyDispatcher::new(),
            notification: None,
            dialect_setting,
            dialect,
            failed: false,
        }
    }

    pub fn connect(&mut self) {
        if self.state != ConnectionState::Disconnected {
            log::debug!("connect ignored in state {}", self.state.as_str());
            return;
        }
        match self.transport.open() {
            Ok(()) => {
                self.state = ConnectionState::Connecting;
                self.notification = Some(Notification::info(CONNECTING_TEXT));
            }
            Err(e) => {
                log::warn!("could not open connection: {e}");
                self.state = ConnectionState::Closed;
                self.notification = Some(Notification::error(e.to_string()));
            }
        }
    }

    pub fn handle_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Opened => self.handle_open(),
            TransportEvent::Message(text) => self.handle_message(&text),
            TransportEvent::Closed { reason } => self.handle_close(reason),
        }
    }

    pub fn handle_open(&mut self) {
        if self.state == ConnectionState::Closed {
            return;
        }
        log::info!("connection open");
        self.state = ConnectionState::Connected;
        if self
            .notification
            .as_ref()
            .is_some_and(|n| n.text == CONNECTING_TEXT)
        {
            self.notification = None;
        }
    }

    /// Tear down any open dialog and waiting prompts without answering them.
    pub fn handle_close(&mut self, reason: Option<String>) {
        if self.state == ConnectionState::Closed {
            return;
        }
        log::info!(
            "connection closed{}",
            reason
                .as_deref()
                .map(|r| format!(": {r}"))
                .unwrap_or_default()
        );
        self.state = ConnectionState::Closed;
        self.discard_dialogs();
        if let Some(reason) = reason {
            self.notification = Some(Notification::error(reason));
        }
    }

    pub fn handle_message(&mut self, text: &str) {
        if self.state == ConnectionState::Closed {
            log::debug!("recv after close ignored: {text}");
            return;
        }
        log::debug!("recv {text}");
        match parse_inbound(text) {
            Ok((inbound, framing)) => {
                if self.dialect.is_none() {
                    log::info!("runner speaks {framing:?} framing");
                    self.dialect = Some(framing);
                }
                self.dispatch(inbound);
            }
            Err(e) => self.fail(&e),
        }
    }

    fn dispatch(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::TestList(tests) => {
                log::info!("received {} tests", tests.len());
                self.tests.reset_table(tests);
            }
            Inbound::RunStarted(text) => {
                self.notification = Some(Notification::info(
                    text.unwrap_or_else(|| RUNNING_TEXT.to_string()),
                ));
            }
            Inbound::RunFinished(text) => {
                self.notification = Some(Notification::info(
                    text.unwrap_or_else(|| DONE_TEXT.to_string()),
                ));
            }
            Inbound::Prompt(request) => {
                if self.dialog.is_some() {
                    log::debug!("queueing {} prompt behind open dialog", request.kind.as_str());
                    self.queue.push_back(request);
                } else {
                    self.open_dialog(request);
                }
            }
            Inbound::UpdateTest(event) => {
                if let Err(e) = self.tests.update_test(&event) {
                    log::warn!("{e}");
                    self.notification = Some(Notification::error(format!("Internal error: {e}")));
                }
            }
        }
    }

    fn fail(&mut self, error: &ProtocolError) {
        log::warn!("{error}");
        self.failed = true;
        self.transport.close();
        self.state = ConnectionState::Closed;
        self.discard_dialogs();
        self.notification = Some(Notification::error(error.to_string()));
    }

    fn open_dialog(&mut self, request: PromptRequest) {
        let mut dialog = Dialog::new(request.message, request.kind);
        dialog.show(&mut self.keys);
        self.dialog = Some(dialog);
    }

    fn discard_dialogs(&mut self) {
        if let Some(mut dialog) = self.dialog.take() {
            dialog.close(&mut self.keys);
        }
        if !self.queue.is_empty() {
            log::debug!("dropping {} unanswered prompts", self.queue.len());
            self.queue.clear();
        }
    }

    /// Route one key press. Returns whether the session consumed it.
    pub fn handle_key(&mut self, input: KeyInput) -> bool {
        let Some(dialog) = self.dialog.as_mut() else {
            return false;
        };
        match input {
            KeyInput::Char(c) if dialog.input_has_focus() => {
                dialog.edit(TextEdit::Insert(c));
                true
            }
            KeyInput::Char(c) => self.press_key(c),
            KeyInput::Edit(edit) => {
                if !dialog.input_has_focus() {
                    return false;
                }
                dialog.edit(edit);
                true
            }
            KeyInput::Activate => {
                let command = dialog.activate();
                self.answer(command);
                true
            }
            KeyInput::Cancel => {
                self.answer(DialogCommand::Cancel);
                true
            }
            KeyInput::FocusNext => {
                dialog.focus_next();
                true
            }
            KeyInput::FocusPrev => {
                dialog.focus_prev();
                true
            }
        }
    }

    /// Look `key` up in the dialog key bindings and apply the bound decision.
    pub fn press_key(&mut self, key: char) -> bool {
        let mut command = None;
        let found = self.keys.dispatch(key, |bound| command = Some(*bound));
        if let Some(command) = command {
            self.answer(command);
        }
        found
    }

    pub fn confirm_dialog(&mut self) -> bool {
        self.answer(DialogCommand::Ok)
    }

    pub fn cancel_dialog(&mut self) -> bool {
        self.answer(DialogCommand::Cancel)
    }

    /// Reply for the open dialog, close it and show the next queued prompt.
    fn answer(&mut self, command: DialogCommand) -> bool {
        let Some(mut dialog) = self.dialog.take() else {
            return false;
        };
        let reply = dialog.response(command);
        dialog.close(&mut self.keys);
        self.respond(&reply);
        if let Some(next) = self.queue.pop_front() {
            self.open_dialog(next);
        }
        true
    }

    pub fn respond(&mut self, reply: &Outbound) {
        let name = reply.event_name(self.dialect());
        self.emit(name, reply.data());
    }

    /// Send `{event: data}` to the runner. Inert once the session is closed.
    pub fn emit(&mut self, event: &str, data: Option<Value>) {
        let payload = encode_event(event, data);
        if self.state == ConnectionState::Closed {
            log::info!("not sending {payload}: connection closed");
            return;
        }
        log::debug!("send {payload}");
        if let Err(e) = self.transport.send(payload) {
            log::warn!("send failed: {e}");
            self.notification = Some(Notification::error(format!("Could not send reply: {e}")));
        }
    }

    /// Release the transport. Used when the operator quits.
    pub fn shutdown(&mut self) {
        if self.state != ConnectionState::Closed {
            self.transport.close();
            self.state = ConnectionState::Closed;
        }
        self.discard_dialogs();
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn tests(&self) -> &TestListView {
        &self.tests
    }

    pub fn dialog(&self) -> Option<&Dialog> {
        self.dialog.as_ref()
    }

    pub fn queued_prompts(&self) -> impl Iterator<Item = &PromptRequest> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn notification(&self) -> Option<&Notification> {
        self.notification.as_ref()
    }

    pub fn key_bindings(&self) -> &KeyDispatcher<DialogCommand> {
        &self.keys
    }

    /// Reply spelling in effect. Until the runner has spoken, auto mode uses
    /// the keyed vocabulary.
    pub fn dialect(&self) -> Dialect {
        self.dialect.unwrap_or(Dialect::Keyed)
    }

    pub fn dialect_setting(&self) -> DialectSetting {
        self.dialect_setting
    }

    /// Whether the session ended on a protocol violation.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
