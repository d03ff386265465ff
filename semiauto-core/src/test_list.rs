use crate::protocol::{TestEvent, TestEventKind};
use serde::Serialize;
use std::{collections::HashMap, fmt};

/// Opaque test identifier chosen by the runner. Numeric ids are kept in their
/// decimal text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TestId(String);

impl TestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestDescriptor {
    pub id: TestId,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    NotRun,
    Running,
    Pass,
    Fail,
    ExpectedFailure,
    UnexpectedSuccess,
    Skipped,
    Error,
}

/// Coarse grouping used for row styling. Expected failures and skips count as
/// passes; errors and unexpected successes count as failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    Pending,
    Running,
    Pass,
    Fail,
}

impl Outcome {
    pub fn verdict(self) -> Verdict {
        match self {
            Self::NotRun => Verdict::Pending,
            Self::Running => Verdict::Running,
            Self::Pass | Self::ExpectedFailure | Self::Skipped => Verdict::Pass,
            Self::Fail | Self::UnexpectedSuccess | Self::Error => Verdict::Fail,
        }
    }

    /// Outcomes that share a verdict but are drawn differently from a plain pass/fail.
    pub fn is_distinct(self) -> bool {
        matches!(
            self,
            Self::ExpectedFailure | Self::UnexpectedSuccess | Self::Skipped
        )
    }

    /// Human-readable outcome, used where a row has no result text of its own.
    pub fn label(self) -> &'static str {
        match self {
            Self::NotRun | Self::Running => "",
            Self::Pass => "Pass",
            Self::Fail => "Fail",
            Self::ExpectedFailure => "Expected failure",
            Self::UnexpectedSuccess => "Unexpected success",
            Self::Skipped => "Skip",
            Self::Error => "Error",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotRun => "not_run",
            Self::Running => "running",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::ExpectedFailure => "expected_failure",
            Self::UnexpectedSuccess => "unexpected_success",
            Self::Skipped => "skipped",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestRow {
    #[serde(flatten)]
    pub descriptor: TestDescriptor,
    pub outcome: Outcome,
    /// Text of the result cell.
    pub result: Option<String>,
    /// Diagnostic output shown beneath the description.
    pub message: Option<String>,
}

impl TestRow {
    fn new(descriptor: TestDescriptor) -> Self {
        Self {
            descriptor,
            outcome: Outcome::NotRun,
            result: None,
            message: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestListError {
    UnknownTest(TestId),
}

impl fmt::Display for TestListError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownTest(id) => write!(f, "Could not find test: {id}"),
        }
    }
}

impl std::error::Error for TestListError {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub not_run: usize,
    pub running: usize,
    pub passed: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Default)]
pub struct TestListView {
    rows: Vec<TestRow>,
    index: HashMap<TestId, usize>,
    focused: Option<usize>,
}

impl TestListView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild the table from a manifest: one `NotRun` row per descriptor, in order.
    /// Ids are trusted to be unique; on a duplicate the first row wins.
    pub fn reset_table(&mut self, tests: Vec<TestDescriptor>) {
        self.rows = tests.into_iter().map(TestRow::new).collect();
        self.index.clear();
        for (idx, row) in self.rows.iter().enumerate() {
            self.index.entry(row.descriptor.id.clone()).or_insert(idx);
        }
        self.focused = None;
    }

    /// Apply a lifecycle event to its row.
    pub fn update_test(&mut self, event: &TestEvent) -> Result<&TestRow, TestListError> {
        let idx = *self
            .index
            .get(&event.id)
            .ok_or_else(|| TestListError::UnknownTest(event.id.clone()))?;
        let row = &mut self.rows[idx];

        let (outcome, result) = match event.kind {
            TestEventKind::TestStart => (Outcome::Running, None),
            TestEventKind::Success => (Outcome::Pass, Some("Pass".to_string())),
            TestEventKind::ExpectedFailure => {
                (Outcome::ExpectedFailure, Some("Expected failure".to_string()))
            }
            TestEventKind::Skip => (Outcome::Skipped, event.detail.clone()),
            TestEventKind::Error => (Outcome::Error, event.detail.clone()),
            TestEventKind::Failure => (Outcome::Fail, event.detail.clone()),
            TestEventKind::ExpectedSuccess => (
                Outcome::UnexpectedSuccess,
                Some("Unexpected success".to_string()),
            ),
        };

        row.outcome = outcome;
        row.result = result;
        row.message.clone_from(&event.message);
        if event.kind == TestEventKind::TestStart {
            self.focused = Some(idx);
        }

        Ok(&self.rows[idx])
    }

    pub fn rows(&self) -> &[TestRow] {
        &self.rows
    }

    pub fn row(&self, id: &TestId) -> Option<&TestRow> {
        self.index.get(id).map(|&idx| &self.rows[idx])
    }

    /// Index of the most recently started test.
    pub fn focused(&self) -> Option<usize> {
        self.focused
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            total: self.rows.len(),
            ..Summary::default()
        };
        for row in &self.rows {
            match row.outcome.verdict() {
                Verdict::Pending => summary.not_run += 1,
                Verdict::Running => summary.running += 1,
                Verdict::Pass => summary.passed += 1,
                Verdict::Fail => summary.failed += 1,
            }
        }
        summary
    }
}

/// Capitalize the first letter of every whitespace-separated word.
pub fn titleize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if at_word_start && !c.is_whitespace() {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c.is_whitespace();
    }
    out
}
