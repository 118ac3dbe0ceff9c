//! Exam snapshot data model
//!
//! The authored test is represented as an immutable snapshot: an ordered
//! list of parts, each carrying question groups, plus the flat question
//! collection derived from them. The persistence layer owns storage and
//! transport; this module only defines the shapes and a guarded JSON
//! loader.
//!
//! # Security Considerations
//!
//! - **Size limits**: snapshots above [`config::MAX_SNAPSHOT_SIZE`] are
//!   rejected before parsing.
//! - **Part limits**: more than [`config::MAX_PARTS`] parts is rejected
//!   after parsing.
//!
//! See [`crate::config`] for the limits.

use crate::config;
use crate::error::{EngineError, Result};
use crate::labels;
use crate::types::{OptionLabelStyle, QuestionRef, QuestionType};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One logical section of a test: a reading passage, a listening part,
/// or a writing task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    /// Durable part identifier
    pub id: String,
    /// Ordering index within the test (ascending)
    #[serde(default)]
    pub order: u32,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Rich-text body; may embed heading gap tags
    #[serde(default)]
    pub body: String,
    /// Question groups attached to this part
    #[serde(default)]
    pub groups: Vec<QuestionGroup>,
}

/// A named cluster of questions sharing an instruction and type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionGroup {
    /// Durable group identifier
    pub id: String,
    /// Interaction type for every question in the group
    pub kind: QuestionType,
    /// Instruction line shown above the group
    #[serde(default)]
    pub instruction: String,
    /// Answer-bank entries; labels are derived positionally, never stored
    #[serde(default)]
    pub options: Vec<String>,
    /// Free-text body (summary/note/sentence bodies); may embed gap tags
    #[serde(default)]
    pub group_text: String,
    /// Table body for table completion
    #[serde(default)]
    pub table: Option<TableBlock>,
    /// Flowchart body for flowchart completion
    #[serde(default)]
    pub flowchart: Option<Flowchart>,
    /// Hosted image reference for diagram/writing groups (opaque here)
    #[serde(default)]
    pub image_url: Option<String>,
}

impl QuestionGroup {
    /// Positional label for the option at `index` (0-based).
    ///
    /// Heading and title banks use Roman numerals, everything else
    /// letters. The option list ordering is the permanent source of
    /// truth; labels are recomputed from position on every call.
    pub fn option_label(&self, index: usize) -> String {
        match self.kind.option_label_style() {
            OptionLabelStyle::Letters => labels::letter_label(index),
            OptionLabelStyle::Roman => labels::roman_label(index),
        }
    }

    /// All text fragments of this group that can carry gap tags, in
    /// document order: the free-text body, then table cells row by row,
    /// then flowchart steps and branches.
    pub fn gap_texts(&self) -> Vec<&str> {
        let mut texts = Vec::new();
        if !self.group_text.is_empty() {
            texts.push(self.group_text.as_str());
        }
        if let Some(table) = &self.table {
            for row in &table.rows {
                for cell in row {
                    texts.push(cell.as_str());
                }
            }
        }
        if let Some(flowchart) = &self.flowchart {
            for step in &flowchart.steps {
                match step {
                    FlowStep::Text(text) => texts.push(text.as_str()),
                    FlowStep::Split { branches } => {
                        for branch in branches {
                            texts.push(branch.text.as_str());
                        }
                    }
                }
            }
        }
        texts
    }
}

/// Headers-by-rows table of cell strings for table completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableBlock {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<String>>,
}

/// Ordered flowchart for flowchart completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flowchart {
    #[serde(default)]
    pub steps: Vec<FlowStep>,
}

/// One flowchart step: a single text node, or a parallel split of
/// named branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowStep {
    Text(String),
    Split { branches: Vec<FlowBranch> },
}

/// A named branch within a flowchart split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowBranch {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub text: String,
}

/// One answerable unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Persisted or pending reference
    pub id: QuestionRef,
    /// Owning part
    pub part_id: String,
    /// Owning group, if any (ungrouped heading questions have none)
    #[serde(default)]
    pub group_id: Option<String>,
    /// Interaction type; `None` means "inherit from the owning group"
    #[serde(default)]
    pub kind: Option<QuestionType>,
    /// Raw prompt text; gap-derived prompts embed exactly their tag
    #[serde(default)]
    pub prompt: String,
    /// Accepted answers as one string with `/`-delimited alternatives
    #[serde(default)]
    pub answer: String,
    /// Per-question option list for choice-style types
    #[serde(default)]
    pub options: Vec<String>,
    /// Intra-part ordering hint (tag number for gap-derived questions)
    #[serde(default)]
    pub sequence: u32,
    /// Heading-matching only: the gap number in the part body
    #[serde(default)]
    pub heading_gap: Option<u32>,
}

impl Question {
    /// Check whether this question grades with heading-matching rules.
    pub fn is_heading(&self) -> bool {
        matches!(self.kind, Some(QuestionType::MatchingHeadings))
    }
}

/// Full authored state: parts plus the derived question collection.
///
/// Snapshots are owned by the caller and passed by reference into the
/// pure engine functions; the engine never mutates one in place.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExamSnapshot {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

impl ExamSnapshot {
    /// Parse a snapshot from a JSON string, enforcing size limits.
    pub fn from_json_str(json: &str) -> Result<Self> {
        if json.len() > config::MAX_SNAPSHOT_SIZE {
            return Err(EngineError::SnapshotTooLarge {
                size: json.len(),
                max: config::MAX_SNAPSHOT_SIZE,
            });
        }
        let snapshot: ExamSnapshot = serde_json::from_str(json)?;
        if snapshot.parts.len() > config::MAX_PARTS {
            return Err(EngineError::TooManyParts {
                count: snapshot.parts.len(),
                max: config::MAX_PARTS,
            });
        }
        Ok(snapshot)
    }

    /// Load a snapshot from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Find a part by identifier.
    pub fn find_part(&self, part_id: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.id == part_id)
    }

    /// Find a group by identifier, together with its owning part.
    pub fn find_group(&self, group_id: &str) -> Option<(&Part, &QuestionGroup)> {
        self.parts.iter().find_map(|part| {
            part.groups
                .iter()
                .find(|g| g.id == group_id)
                .map(|g| (part, g))
        })
    }

    /// Find a question by reference.
    pub fn find_question(&self, question: &QuestionRef) -> Option<&Question> {
        self.questions.iter().find(|q| &q.id == question)
    }

    /// Effective type of a question: its own, or the owning group's.
    pub fn effective_kind(&self, question: &Question) -> Option<QuestionType> {
        question.kind.or_else(|| {
            question
                .group_id
                .as_deref()
                .and_then(|gid| self.find_group(gid))
                .map(|(_, g)| g.kind)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_snapshot_json() -> &'static str {
        r#"{
            "parts": [
                {
                    "id": "p1",
                    "order": 0,
                    "title": "Reading Passage 1",
                    "body": "<p data-heading-gap=\"1\"></p>",
                    "groups": [
                        {
                            "id": "g1",
                            "kind": "note_completion",
                            "instruction": "Complete the notes.",
                            "group_text": "Water boils at [[n1]] degrees."
                        }
                    ]
                }
            ],
            "questions": [
                {
                    "id": { "persisted": "q1" },
                    "part_id": "p1",
                    "group_id": "g1",
                    "prompt": "[[n1]]",
                    "answer": "100",
                    "sequence": 1
                }
            ]
        }"#
    }

    #[test]
    fn test_snapshot_from_json() {
        let snapshot = ExamSnapshot::from_json_str(make_snapshot_json()).unwrap();
        assert_eq!(snapshot.parts.len(), 1);
        assert_eq!(snapshot.questions.len(), 1);

        let (part, group) = snapshot.find_group("g1").unwrap();
        assert_eq!(part.id, "p1");
        assert_eq!(group.kind, QuestionType::NoteCompletion);
    }

    #[test]
    fn test_snapshot_size_limit() {
        let huge = " ".repeat(config::MAX_SNAPSHOT_SIZE + 1);
        let result = ExamSnapshot::from_json_str(&huge);
        assert!(matches!(result, Err(EngineError::SnapshotTooLarge { .. })));
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let snapshot = ExamSnapshot::from_json_str(r#"{"parts": [{"id": "p1"}]}"#).unwrap();
        let part = snapshot.find_part("p1").unwrap();
        assert_eq!(part.body, "");
        assert!(part.groups.is_empty());
        assert!(snapshot.questions.is_empty());
    }

    #[test]
    fn test_effective_kind_inherits_from_group() {
        let snapshot = ExamSnapshot::from_json_str(make_snapshot_json()).unwrap();
        let question = snapshot.questions.first().unwrap();
        assert_eq!(question.kind, None);
        assert_eq!(
            snapshot.effective_kind(question),
            Some(QuestionType::NoteCompletion)
        );
    }

    #[test]
    fn test_gap_texts_covers_table_and_flowchart() {
        let group = QuestionGroup {
            id: "g1".to_string(),
            kind: QuestionType::TableCompletion,
            instruction: String::new(),
            options: Vec::new(),
            group_text: "intro [[1]]".to_string(),
            table: Some(TableBlock {
                headers: vec!["Year".to_string()],
                rows: vec![vec!["[[2]]".to_string(), "1990".to_string()]],
            }),
            flowchart: Some(Flowchart {
                steps: vec![
                    FlowStep::Text("start [[3]]".to_string()),
                    FlowStep::Split {
                        branches: vec![FlowBranch {
                            label: "left".to_string(),
                            text: "[[4]]".to_string(),
                        }],
                    },
                ],
            }),
            image_url: None,
        };

        let texts = group.gap_texts();
        assert_eq!(
            texts,
            vec!["intro [[1]]", "[[2]]", "1990", "start [[3]]", "[[4]]"]
        );
    }

    #[test]
    fn test_option_labels_follow_group_kind() {
        let mut group = QuestionGroup {
            id: "g1".to_string(),
            kind: QuestionType::MatchingHeadings,
            instruction: String::new(),
            options: vec!["Heading A".to_string(), "Heading B".to_string()],
            group_text: String::new(),
            table: None,
            flowchart: None,
            image_url: None,
        };
        assert_eq!(group.option_label(0), "i");
        assert_eq!(group.option_label(1), "ii");

        group.kind = QuestionType::MultipleChoice;
        assert_eq!(group.option_label(0), "A");
        assert_eq!(group.option_label(2), "C");
    }
}
