use crate::{
    components::{self, test_table::TableView},
    keymap::{self, Input},
    theme::Theme,
};
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Layout},
};
use semiauto_core::{
    config::{KeysConfig, keys::Command},
    event::TransportEvent,
    session::{ConnectionState, KeyInput, Session},
    transport::Transport,
};
use std::{sync::mpsc, time::Duration};

const POLL_INTERVAL: Duration = Duration::from_millis(80);

/// Whether the loop keeps going after an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything the view needs besides the session itself.
pub struct Ui<'a> {
    pub endpoint: &'a str,
    pub theme: &'a Theme,
    pub keys: &'a KeysConfig,
}

/// Connect the session and run until the operator quits. Transport events
/// arrive on `events` from the socket thread.
pub fn run<T: Transport>(
    terminal: &mut DefaultTerminal,
    session: &mut Session<T>,
    events: &mpsc::Receiver<TransportEvent>,
    ui: &Ui<'_>,
) -> anyhow::Result<()> {
    let mut view = TableView::new();
    session.connect();

    loop {
        terminal.draw(|f| draw(f, session, &mut view, ui))?;

        // Check transport channel (non-blocking)
        if let Ok(transport_event) = events.try_recv() {
            session.handle_event(transport_event);
            view.sync(session.tests());
            continue;
        }

        if event::poll(POLL_INTERVAL)?
            && let Event::Key(key) = event::read()?
        {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if process_key(&key, session, &mut view, ui.keys) == Flow::Quit {
                break;
            }
        }
    }

    log::info!("operator quit");
    session.shutdown();
    Ok(())
}

pub fn process_key<T: Transport>(
    key: &crossterm::event::KeyEvent,
    session: &mut Session<T>,
    view: &mut TableView,
    keys: &KeysConfig,
) -> Flow {
    let context = keymap::key_context(session);
    let Some(input) = keymap::resolve_input(key, context, keys) else {
        return Flow::Continue;
    };
    let len = session.tests().len();

    match input {
        Input::Char(c) => {
            session.handle_key(KeyInput::Char(c));
        }
        Input::Command(Command::Quit) => return Flow::Quit,
        Input::Command(Command::QuitIfClosed) => {
            if session.state() == ConnectionState::Closed {
                return Flow::Quit;
            }
        }
        Input::Command(Command::MoveUp) => view.move_by(-1, len),
        Input::Command(Command::MoveDown) => view.move_by(1, len),
        Input::Command(Command::PageUp) => view.move_page(-1, len),
        Input::Command(Command::PageDown) => view.move_page(1, len),
        Input::Command(Command::MoveTop) => view.move_to_top(len),
        Input::Command(Command::MoveBottom) => view.move_to_bottom(len),
        Input::Command(command) => {
            if let Some(input) = keymap::dialog_input(&command) {
                session.handle_key(input);
            }
        }
    }
    Flow::Continue
}

pub fn draw<T: Transport>(f: &mut Frame, session: &Session<T>, view: &mut TableView, ui: &Ui<'_>) {
    let notification = session.notification();
    let chunks = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(u16::from(notification.is_some())),
    ])
    .split(f.area());

    let tests = session.tests();
    components::header::draw(
        f,
        chunks[0],
        ui.endpoint,
        session.state(),
        &tests.summary(),
        ui.theme,
    );
    components::test_table::draw(f, chunks[1], tests, view, ui.theme);
    if let Some(notification) = notification {
        components::notification::draw(f, chunks[2], notification, ui.theme);
    }

    if let Some(dialog) = session.dialog() {
        components::prompt::draw(f, f.area(), dialog, ui.keys, ui.theme);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::buffer_text;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::{Terminal, backend::TestBackend};
    use semiauto_core::config::{DialectSetting, ThemeConfig};
    use semiauto_core::transport::MemoryTransport;

    fn session() -> Session<MemoryTransport> {
        let mut session = Session::new(MemoryTransport::default(), DialectSetting::Auto);
        session.connect();
        session.handle_event(TransportEvent::Opened);
        session
    }

    fn recv(session: &mut Session<MemoryTransport>, text: &str) {
        session.handle_event(TransportEvent::Message(text.to_string()));
    }

    fn press(
        session: &mut Session<MemoryTransport>,
        view: &mut TableView,
        code: KeyCode,
        modifiers: KeyModifiers,
    ) -> Flow {
        process_key(
            &KeyEvent::new(code, modifiers),
            session,
            view,
            &KeysConfig::default(),
        )
    }

    fn render(session: &Session<MemoryTransport>, view: &mut TableView) -> String {
        let theme = Theme::from_config(&ThemeConfig::default());
        let keys = KeysConfig::default();
        let ui = Ui {
            endpoint: "ws://127.0.0.1:6666/tests",
            theme: &theme,
            keys: &keys,
        };
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).unwrap();
        terminal.draw(|f| draw(f, session, view, &ui)).unwrap();
        buffer_text(terminal.backend().buffer())
    }

    #[test]
    fn test_typed_answer_reaches_runner() {
        let mut session = session();
        let mut view = TableView::new();
        recv(&mut session, r#"{"prompt":"Enter device IMEI"}"#);

        for c in "12345".chars() {
            press(&mut session, &mut view, KeyCode::Char(c), KeyModifiers::NONE);
        }
        press(&mut session, &mut view, KeyCode::Backspace, KeyModifiers::NONE);
        press(&mut session, &mut view, KeyCode::Char('5'), KeyModifiers::NONE);
        press(&mut session, &mut view, KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(session.transport().sent, vec![r#"{"prompt":"12345"}"#]);
        assert!(session.dialog().is_none());
    }

    #[test]
    fn test_y_and_n_answer_confirm() {
        let mut session = session();
        let mut view = TableView::new();
        recv(&mut session, r#"{"confirmPrompt":"Did it ring?"}"#);
        press(&mut session, &mut view, KeyCode::Char('y'), KeyModifiers::NONE);
        recv(&mut session, r#"{"confirmPrompt":"Again?"}"#);
        press(&mut session, &mut view, KeyCode::Char('n'), KeyModifiers::NONE);
        assert_eq!(
            session.transport().sent,
            vec![r#"{"confirmPromptOk":null}"#, r#"{"confirmPromptCancel":null}"#]
        );
    }

    #[test]
    fn test_esc_cancels_instruction() {
        let mut session = session();
        let mut view = TableView::new();
        recv(&mut session, r#"{"instructPrompt":"Shake the phone"}"#);
        press(&mut session, &mut view, KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(
            session.transport().sent,
            vec![r#"{"instructPromptCancel":null}"#]
        );
    }

    #[test]
    fn test_tab_then_enter_activates_cancel() {
        let mut session = session();
        let mut view = TableView::new();
        recv(&mut session, r#"{"confirmPrompt":"Did it ring?"}"#);
        press(&mut session, &mut view, KeyCode::Tab, KeyModifiers::NONE);
        press(&mut session, &mut view, KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(
            session.transport().sent,
            vec![r#"{"confirmPromptCancel":null}"#]
        );
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut session = session();
        let mut view = TableView::new();
        recv(&mut session, r#"{"prompt":"IMEI?"}"#);
        assert_eq!(
            press(
                &mut session,
                &mut view,
                KeyCode::Char('c'),
                KeyModifiers::CONTROL
            ),
            Flow::Quit
        );
        assert!(session.transport().sent.is_empty());
    }

    #[test]
    fn test_q_quits_only_after_close() {
        let mut session = session();
        let mut view = TableView::new();
        assert_eq!(
            press(&mut session, &mut view, KeyCode::Char('q'), KeyModifiers::NONE),
            Flow::Continue
        );
        session.handle_event(TransportEvent::Closed { reason: None });
        assert_eq!(
            press(&mut session, &mut view, KeyCode::Char('q'), KeyModifiers::NONE),
            Flow::Quit
        );
    }

    #[test]
    fn test_arrows_scroll_table_without_dialog() {
        let mut session = session();
        let mut view = TableView::new();
        recv(
            &mut session,
            r#"{"testList":[{"id":0,"description":"a"},{"id":1,"description":"b"},{"id":2,"description":"c"}]}"#,
        );
        press(&mut session, &mut view, KeyCode::Down, KeyModifiers::NONE);
        press(&mut session, &mut view, KeyCode::Down, KeyModifiers::NONE);
        assert_eq!(view.selected, Some(2));
        press(&mut session, &mut view, KeyCode::Home, KeyModifiers::NONE);
        assert_eq!(view.selected, Some(0));
        press(&mut session, &mut view, KeyCode::End, KeyModifiers::NONE);
        assert_eq!(view.selected, Some(2));
    }

    #[test]
    fn test_screen_shows_table_notification_and_dialog() {
        let mut session = session();
        let mut view = TableView::new();
        recv(
            &mut session,
            r#"{"testList":[{"id":0,"description":"Geolocation works"}]}"#,
        );
        recv(&mut session, r#"{"testRunStart":null}"#);
        recv(&mut session, r#"{"updateTest":{"id":0,"event":"testStart"}}"#);
        recv(&mut session, r#"{"confirmPrompt":"Is the location right?"}"#);
        view.sync(session.tests());

        let output = render(&session, &mut view);
        assert!(output.contains("semiauto"));
        assert!(output.contains("ws://127.0.0.1:6666/tests"));
        assert!(output.contains("[connected]"));
        assert!(output.contains("Geolocation works"));
        assert!(output.contains("Running tests"));
        assert!(output.contains("Is the location right?"));
        assert!(output.contains("[ Yes ]"));
    }

    #[test]
    fn test_screen_after_protocol_error() {
        let mut session = session();
        let mut view = TableView::new();
        recv(&mut session, r#"{"launchMissiles":true}"#);
        let output = render(&session, &mut view);
        assert!(output.contains("[closed]"));
        assert!(output.contains("Received unknown message from server: launchMissiles"));
    }
}
