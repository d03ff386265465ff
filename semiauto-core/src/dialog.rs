use crate::keys::KeyDispatcher;
use crate::protocol::Outbound;
use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

pub const OK_KEY: char = 'y';
pub const CANCEL_KEY: char = 'n';

const DEFAULT_OK_LABEL: &str = "OK";
const DEFAULT_CANCEL_LABEL: &str = "Cancel";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogKind {
    /// Question with a free-text answer.
    Prompt,
    /// Instruction the operator carries out, then reports success or failure.
    Instruct,
    /// Yes/no question about something the test cannot observe.
    Confirm,
}

impl DialogKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Prompt => "prompt",
            Self::Instruct => "instruct",
            Self::Confirm => "confirm",
        }
    }

    pub fn has_input(self) -> bool {
        self == Self::Prompt
    }
}

/// Operator decision on an open dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogCommand {
    Ok,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogFocus {
    Input,
    Ok,
    Cancel,
}

/// Single-line text field with a grapheme-aligned byte cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextField {
    text: String,
    cursor: usize,
}

impl TextField {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    fn boundaries(&self) -> Vec<usize> {
        let mut boundaries: Vec<usize> =
            self.text.grapheme_indices(true).map(|(i, _)| i).collect();
        boundaries.push(self.text.len());
        boundaries
    }

    fn boundary_index(boundaries: &[usize], cursor: usize) -> usize {
        match boundaries.binary_search(&cursor) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        }
    }

    pub fn insert(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn delete_backward_char(&mut self) {
        let boundaries = self.boundaries();
        let idx = Self::boundary_index(&boundaries, self.cursor);
        if idx == 0 {
            return;
        }
        let start = boundaries[idx - 1];
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    /// Delete back to the start of the previous word, skipping trailing whitespace first.
    pub fn delete_backward_word(&mut self) {
        let before = &self.text[..self.cursor];
        let trimmed = before.trim_end();
        let start = trimmed
            .grapheme_indices(true)
            .rev()
            .find(|(_, g)| g.chars().all(char::is_whitespace))
            .map_or(0, |(i, g)| i + g.len());
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
    }

    pub fn move_left(&mut self) {
        let boundaries = self.boundaries();
        let idx = Self::boundary_index(&boundaries, self.cursor);
        self.cursor = boundaries[idx.saturating_sub(1)];
    }

    pub fn move_right(&mut self) {
        let boundaries = self.boundaries();
        let idx = Self::boundary_index(&boundaries, self.cursor);
        self.cursor = boundaries[(idx + 1).min(boundaries.len() - 1)];
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }
}

/// Text editing operations on the prompt field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEdit {
    Insert(char),
    DeleteBackwardChar,
    DeleteBackwardWord,
    CursorLeft,
    CursorRight,
    CursorStart,
    CursorEnd,
}

/// Modal overlay asking the operator something. One instance per prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    message: String,
    kind: DialogKind,
    visible: bool,
    input: TextField,
    focus: DialogFocus,
    ok_label: &'static str,
    cancel_label: &'static str,
}

impl Dialog {
    pub fn new(message: impl Into<String>, kind: DialogKind) -> Self {
        let (ok_label, cancel_label) = match kind {
            DialogKind::Confirm => ("Yes", "No"),
            DialogKind::Prompt | DialogKind::Instruct => (DEFAULT_OK_LABEL, DEFAULT_CANCEL_LABEL),
        };
        Self {
            message: message.into(),
            kind,
            visible: false,
            input: TextField::default(),
            focus: DialogFocus::Ok,
            ok_label,
            cancel_label,
        }
    }

    /// Make the overlay visible, focus its primary control, and bind y/n.
    pub fn show(&mut self, keys: &mut KeyDispatcher<DialogCommand>) {
        self.visible = true;
        self.focus = if self.kind.has_input() {
            DialogFocus::Input
        } else {
            DialogFocus::Ok
        };
        if !keys.bind(OK_KEY, DialogCommand::Ok) {
            log::debug!("'{OK_KEY}' already bound while showing dialog");
        }
        if !keys.bind(CANCEL_KEY, DialogCommand::Cancel) {
            log::debug!("'{CANCEL_KEY}' already bound while showing dialog");
        }
    }

    /// Unbind y/n, hide, and reset transient state. Safe to call repeatedly.
    pub fn close(&mut self, keys: &mut KeyDispatcher<DialogCommand>) {
        keys.unbind(OK_KEY);
        keys.unbind(CANCEL_KEY);
        self.visible = false;
        self.input.clear();
        self.focus = DialogFocus::Ok;
        self.ok_label = DEFAULT_OK_LABEL;
        self.cancel_label = DEFAULT_CANCEL_LABEL;
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Text entered in the response field.
    pub fn value(&self) -> &str {
        self.input.text()
    }

    pub fn input(&self) -> &TextField {
        &self.input
    }

    pub fn focus(&self) -> DialogFocus {
        self.focus
    }

    pub fn input_has_focus(&self) -> bool {
        self.visible && self.focus == DialogFocus::Input
    }

    pub fn ok_label(&self) -> &'static str {
        self.ok_label
    }

    pub fn cancel_label(&self) -> &'static str {
        self.cancel_label
    }

    fn focus_order(&self) -> &'static [DialogFocus] {
        if self.kind.has_input() {
            &[DialogFocus::Input, DialogFocus::Ok, DialogFocus::Cancel]
        } else {
            &[DialogFocus::Ok, DialogFocus::Cancel]
        }
    }

    pub fn focus_next(&mut self) {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(idx + 1) % order.len()];
    }

    pub fn focus_prev(&mut self) {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(idx + order.len() - 1) % order.len()];
    }

    /// Decision taken when the focused control is activated. Enter in the
    /// text field submits the answer.
    pub fn activate(&self) -> DialogCommand {
        match self.focus {
            DialogFocus::Input | DialogFocus::Ok => DialogCommand::Ok,
            DialogFocus::Cancel => DialogCommand::Cancel,
        }
    }

    pub fn edit(&mut self, edit: TextEdit) {
        if !self.kind.has_input() {
            return;
        }
        match edit {
            TextEdit::Insert(c) => self.input.insert(c),
            TextEdit::DeleteBackwardChar => self.input.delete_backward_char(),
            TextEdit::DeleteBackwardWord => self.input.delete_backward_word(),
            TextEdit::CursorLeft => self.input.move_left(),
            TextEdit::CursorRight => self.input.move_right(),
            TextEdit::CursorStart => self.input.move_start(),
            TextEdit::CursorEnd => self.input.move_end(),
        }
    }

    /// Reply for the runner given the operator's decision.
    pub fn response(&self, command: DialogCommand) -> Outbound {
        match (self.kind, command) {
            (DialogKind::Prompt, DialogCommand::Ok) => Outbound::Prompt(self.value().to_string()),
            (DialogKind::Prompt, DialogCommand::Cancel) => Outbound::PromptCancel,
            (DialogKind::Instruct, DialogCommand::Ok) => Outbound::InstructPromptOk,
            (DialogKind::Instruct, DialogCommand::Cancel) => Outbound::InstructPromptCancel,
            (DialogKind::Confirm, DialogCommand::Ok) => Outbound::ConfirmPromptOk,
            (DialogKind::Confirm, DialogCommand::Cancel) => Outbound::ConfirmPromptCancel,
        }
    }
}
