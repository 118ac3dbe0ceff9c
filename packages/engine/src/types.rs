//! Core types for the GapCheck engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Question interaction types supported by the engine.
///
/// The set is closed: every question group carries exactly one of these,
/// and individual questions inherit the group's type unless overridden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MatchingHeadings,
    MatchingParagraphs,
    MultipleChoice,
    TrueFalseNotGiven,
    SentenceCompletion,
    SummaryCompletion,
    NoteCompletion,
    TableCompletion,
    DiagramCompletion,
    FlowchartCompletion,
    MatchingFeatures,
    MatchingSentenceEndings,
    ListSelection,
    TitleChoice,
    WritingTask,
}

impl QuestionType {
    /// Check whether this group type derives its question set entirely
    /// from gap tags in its body.
    ///
    /// For these types the reconciler creates a question for every tag
    /// and removes questions whose tag vanished; authors never add or
    /// delete individual questions by hand.
    pub fn is_auto_growing(&self) -> bool {
        matches!(
            self,
            QuestionType::TableCompletion
                | QuestionType::NoteCompletion
                | QuestionType::SummaryCompletion
                | QuestionType::DiagramCompletion
                | QuestionType::FlowchartCompletion
        )
    }

    /// The single gap-tag dialect used by this group type.
    ///
    /// One dialect per type: note completion uses `[[nN]]` exclusively,
    /// flowcharts use `[fN]`, heading matching uses `[HN]` or the
    /// `data-heading-gap` attribute, everything else the bare `[[N]]`.
    pub fn gap_dialect(&self) -> TagDialect {
        match self {
            QuestionType::NoteCompletion => TagDialect::Note,
            QuestionType::FlowchartCompletion => TagDialect::Flowchart,
            QuestionType::MatchingHeadings => TagDialect::Heading,
            _ => TagDialect::Standard,
        }
    }

    /// Label style for this type's option list.
    pub fn option_label_style(&self) -> OptionLabelStyle {
        match self {
            QuestionType::MatchingHeadings | QuestionType::TitleChoice => OptionLabelStyle::Roman,
            _ => OptionLabelStyle::Letters,
        }
    }

    /// Check whether answers of this type are graded at all.
    ///
    /// Writing tasks are scored by a human marker, not the evaluator.
    pub fn is_gradable(&self) -> bool {
        !matches!(self, QuestionType::WritingTask)
    }
}

/// Style for positionally derived option labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionLabelStyle {
    /// `A`, `B`, `C`, ...
    Letters,
    /// `i`, `ii`, `iii`, ...
    Roman,
}

/// Gap tag dialects recognized by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TagDialect {
    /// `[[N]]`
    Standard,
    /// `[[nN]]`
    Note,
    /// `[HN]` or `data-heading-gap="N"`
    Heading,
    /// `[fN]`
    Flowchart,
}

impl TagDialect {
    /// Number prefix used inside the bracket form (empty for standard).
    pub fn prefix(&self) -> &'static str {
        match self {
            TagDialect::Standard => "",
            TagDialect::Note => "n",
            TagDialect::Heading => "H",
            TagDialect::Flowchart => "f",
        }
    }

    /// Render the canonical bracket form of a tag in this dialect.
    pub fn render(&self, number: u32) -> String {
        match self {
            TagDialect::Standard => format!("[[{number}]]"),
            TagDialect::Note => format!("[[n{number}]]"),
            TagDialect::Heading => format!("[H{number}]"),
            TagDialect::Flowchart => format!("[f{number}]"),
        }
    }
}

/// Opaque reference to a question record.
///
/// Questions exist in two identity states: persisted records carry the
/// durable identifier assigned by the data store, while questions
/// synthesized by the reconciler carry a deterministic pending identifier
/// until the caller persists them. Resolving the two states through one
/// type avoids string-prefix checks at every call site.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionRef {
    /// Durable identifier from the data store
    Persisted(String),
    /// Temporary identifier for a not-yet-saved record
    Pending(String),
}

impl QuestionRef {
    /// Deterministic pending reference for a gap-derived question.
    ///
    /// Derived from the owning scope and tag so that re-running the
    /// reconciler on an unchanged snapshot produces identical output.
    pub fn pending_gap(group_id: &str, dialect: TagDialect, number: u32) -> Self {
        QuestionRef::Pending(format!("{group_id}:{}{number}", dialect.prefix()))
    }

    /// The persisted identifier, if this reference is durable.
    pub fn persisted_id(&self) -> Option<&str> {
        match self {
            QuestionRef::Persisted(id) => Some(id),
            QuestionRef::Pending(_) => None,
        }
    }

    /// Check whether this reference is still pending persistence.
    pub fn is_pending(&self) -> bool {
        matches!(self, QuestionRef::Pending(_))
    }
}

impl fmt::Display for QuestionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionRef::Persisted(id) => write!(f, "{id}"),
            QuestionRef::Pending(tmp) => write!(f, "pending:{tmp}"),
        }
    }
}

/// Tri-state grading outcome for one submitted answer.
///
/// A blank submission is `Unanswered`, never `Incorrect`, so reports can
/// distinguish "got it wrong" from "left it empty".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
    Unanswered,
}

impl AnswerOutcome {
    /// Check whether this outcome counts toward the score.
    pub fn is_correct(&self) -> bool {
        matches!(self, AnswerOutcome::Correct)
    }
}
