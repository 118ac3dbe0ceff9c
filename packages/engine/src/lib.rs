//! GapCheck Engine
//!
//! A Rust implementation of the GapCheck exam engine: the tag-driven
//! question synchronization and answer-evaluation core of an online exam
//! authoring/delivery platform. This library provides functionality for:
//! - Extracting inline gap tags from authored rich text (four dialects)
//! - Keeping the structured question collection consistent with the tags
//!   currently present in content (reconciliation)
//! - Assigning stable 1-based display numbers across parts
//! - Grading submitted answers, including alternatives and Roman-numeral
//!   equivalence for heading matching
//!
//! Page routing, persistence, file hosting, authentication and rendering
//! are external collaborators; the engine is pure over snapshots the
//! caller owns.
//!
//! # Example
//!
//! ```ignore
//! use gapcheck_engine::{reconcile, display_numbers, ExamSnapshot};
//!
//! let snapshot = ExamSnapshot::from_json_file("./test.json")?;
//! let outcome = reconcile(&snapshot);
//! let numbering = display_numbers(&snapshot.parts, &outcome.questions, 0);
//! for id in &outcome.removed_persisted {
//!     println!("delete downstream: {id}");
//! }
//! ```

pub mod allocator;
pub mod config;
pub mod debounce;
pub mod error;
pub mod evaluate;
pub mod labels;
pub mod lexer;
pub mod model;
pub mod numbering;
pub mod reconcile;
pub mod service;
pub mod types;

// Re-export commonly used items
pub use allocator::{group_scope_numbers, next_tag_number, part_heading_numbers};
pub use debounce::ReconcileScheduler;
pub use error::{EngineError, Result};
pub use evaluate::{evaluate, score, split_gaps, ScoreSummary};
pub use lexer::{extract_tags, heading_inline_answers, tag_numbers, DialectFilter, Tag};
pub use model::{
    ExamSnapshot, FlowBranch, FlowStep, Flowchart, Part, Question, QuestionGroup, TableBlock,
};
pub use numbering::{display_numbers, Numbering};
pub use reconcile::{reconcile, ReconcileOutcome};
pub use service::ExamService;
pub use types::{AnswerOutcome, OptionLabelStyle, QuestionRef, QuestionType, TagDialect};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "0.1.0");
    }

    #[test]
    fn test_reexports() {
        // Verify re-exports work
        let _outcome = AnswerOutcome::Correct;
        let _dialect = TagDialect::Standard;
        let _err = EngineError::PartNotFound("p1".to_string());
    }
}
