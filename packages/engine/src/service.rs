//! Service layer for exam authoring and delivery
//!
//! [`ExamService`] owns the latest snapshot and the debounce scheduler,
//! and is the single logical writer of the cooperative model: every
//! content edit goes through [`ExamService::apply_edit`], and the
//! reconciler always runs against the snapshot as it is at fire time,
//! never a captured copy.
//!
//! # Example
//!
//! ```ignore
//! use gapcheck_engine::{ExamService, ExamSnapshot};
//! use std::time::Instant;
//!
//! let mut service = ExamService::new(ExamSnapshot::from_json_str(json)?);
//! service.apply_edit(Instant::now(), |snapshot| {
//!     snapshot.parts[0].groups[0].group_text.push_str(" [[n3]]");
//! });
//! // later, on the UI tick:
//! if let Some(outcome) = service.poll(Instant::now()) {
//!     persistence.delete_questions(&outcome.removed_persisted);
//! }
//! ```

use crate::allocator;
use crate::config;
use crate::debounce::ReconcileScheduler;
use crate::error::{EngineError, Result};
use crate::evaluate::{self, ScoreSummary};
use crate::model::{ExamSnapshot, Question, QuestionGroup};
use crate::numbering::{self, Numbering};
use crate::reconcile::{reconcile, ReconcileOutcome};
use crate::types::{AnswerOutcome, QuestionRef};
use std::collections::{BTreeSet, HashMap};
use std::time::{Duration, Instant};
use tracing::info;

/// Owns the authored snapshot and orchestrates reconciliation.
#[derive(Debug, Clone)]
pub struct ExamService {
    snapshot: ExamSnapshot,
    scheduler: ReconcileScheduler,
}

impl ExamService {
    /// Service over a snapshot with the default debounce delay.
    pub fn new(snapshot: ExamSnapshot) -> Self {
        Self {
            snapshot,
            scheduler: ReconcileScheduler::default(),
        }
    }

    /// Service with an explicit debounce delay.
    pub fn with_debounce(snapshot: ExamSnapshot, delay: Duration) -> Self {
        Self {
            snapshot,
            scheduler: ReconcileScheduler::new(delay),
        }
    }

    /// The latest snapshot.
    pub fn snapshot(&self) -> &ExamSnapshot {
        &self.snapshot
    }

    // -------------------------------------------------------------------------
    // Authoring surface
    // -------------------------------------------------------------------------

    /// Apply a content edit and reset the debounce window.
    pub fn apply_edit<F>(&mut self, now: Instant, edit: F)
    where
        F: FnOnce(&mut ExamSnapshot),
    {
        edit(&mut self.snapshot);
        self.scheduler.note_edit(now);
    }

    /// Fire the debounce window if it has elapsed.
    ///
    /// Reconciles against the snapshot as it is *now* (not as it was when
    /// the edit was made), applies the result, and hands back the outcome
    /// so the caller can schedule downstream deletions.
    pub fn poll(&mut self, now: Instant) -> Option<ReconcileOutcome> {
        if !self.scheduler.fire_due(now) {
            return None;
        }
        Some(self.run_reconcile())
    }

    /// Run a reconcile pass immediately, cancelling any pending window.
    pub fn reconcile_now(&mut self) -> ReconcileOutcome {
        self.scheduler.cancel();
        self.run_reconcile()
    }

    fn run_reconcile(&mut self) -> ReconcileOutcome {
        let outcome = reconcile(&self.snapshot);
        if outcome.changed {
            info!(
                questions = outcome.questions.len(),
                removed = outcome.removed_persisted.len(),
                "Applying reconcile outcome"
            );
            self.snapshot.questions = outcome.questions.clone();
        }
        outcome
    }

    /// Attach a new group to a part.
    pub fn add_group(&mut self, now: Instant, part_id: &str, group: QuestionGroup) -> Result<()> {
        let part = self
            .snapshot
            .parts
            .iter_mut()
            .find(|p| p.id == part_id)
            .ok_or_else(|| EngineError::PartNotFound(part_id.to_string()))?;
        part.groups.push(group);
        self.scheduler.note_edit(now);
        Ok(())
    }

    /// Add an explicitly authored question.
    ///
    /// The owning part (and group, when set) must exist; auto-growing
    /// groups get their questions from reconciliation instead.
    pub fn add_question(&mut self, now: Instant, question: Question) -> Result<()> {
        if self.snapshot.find_part(&question.part_id).is_none() {
            return Err(EngineError::PartNotFound(question.part_id.clone()));
        }
        if let Some(group_id) = question.group_id.as_deref() {
            if self.snapshot.find_group(group_id).is_none() {
                return Err(EngineError::GroupNotFound(group_id.to_string()));
            }
        }
        self.snapshot.questions.push(question);
        self.scheduler.note_edit(now);
        Ok(())
    }

    /// Remove a question explicitly.
    ///
    /// Returns the persisted identifier, if any, so the caller can delete
    /// the stored record.
    pub fn remove_question(&mut self, question: &QuestionRef) -> Result<Option<String>> {
        let position = self
            .snapshot
            .questions
            .iter()
            .position(|q| &q.id == question)
            .ok_or_else(|| EngineError::QuestionNotFound(question.to_string()))?;
        let removed = self.snapshot.questions.remove(position);
        Ok(removed.id.persisted_id().map(str::to_string))
    }

    /// Remove a part; its groups and questions cascade.
    ///
    /// Returns the persisted identifiers of every question pruned by the
    /// cascade.
    pub fn remove_part(&mut self, part_id: &str) -> Result<Vec<String>> {
        let position = self
            .snapshot
            .parts
            .iter()
            .position(|p| p.id == part_id)
            .ok_or_else(|| EngineError::PartNotFound(part_id.to_string()))?;
        self.snapshot.parts.remove(position);
        Ok(self.reconcile_now().removed_persisted)
    }

    /// Next free gap tag number in a group's scope.
    ///
    /// Considers both the tags present in content and the tags embedded
    /// in the group's existing question prompts, so a freshly allocated
    /// number can be inserted into either side first.
    pub fn allocate_tag(&self, group_id: &str) -> Result<u32> {
        let (_, group) = self
            .snapshot
            .find_group(group_id)
            .ok_or_else(|| EngineError::GroupNotFound(group_id.to_string()))?;
        let dialect = group.kind.gap_dialect();
        let mut used = allocator::group_scope_numbers(group);
        for question in &self.snapshot.questions {
            if question.group_id.as_deref() == Some(group_id) {
                used.extend(crate::lexer::tag_numbers(&question.prompt, dialect));
            }
        }
        self.checked_allocation(group_id, &used)
    }

    /// Next free heading gap number in a part's scope.
    pub fn allocate_heading_tag(&self, part_id: &str) -> Result<u32> {
        let part = self
            .snapshot
            .find_part(part_id)
            .ok_or_else(|| EngineError::PartNotFound(part_id.to_string()))?;
        let mut used = allocator::part_heading_numbers(part);
        for question in &self.snapshot.questions {
            if question.part_id == part_id {
                if let Some(gap) = question.heading_gap {
                    used.insert(gap);
                }
            }
        }
        self.checked_allocation(part_id, &used)
    }

    fn checked_allocation(&self, scope: &str, used: &BTreeSet<u32>) -> Result<u32> {
        let next = allocator::next_tag_number(used);
        if next > config::MAX_TAG_NUMBER {
            return Err(EngineError::TagLimitExceeded {
                scope: scope.to_string(),
                next,
            });
        }
        Ok(next)
    }

    // -------------------------------------------------------------------------
    // Delivery surface
    // -------------------------------------------------------------------------

    /// Display numbers for the current snapshot.
    pub fn display_numbers(&self, offset: u32) -> Numbering {
        numbering::display_numbers(&self.snapshot.parts, &self.snapshot.questions, offset)
    }

    /// Grade one submitted value.
    pub fn evaluate(&self, question: &QuestionRef, submitted: &str) -> Result<AnswerOutcome> {
        let question = self
            .snapshot
            .find_question(question)
            .ok_or_else(|| EngineError::QuestionNotFound(question.to_string()))?;
        Ok(evaluate::evaluate(question, submitted))
    }

    /// Score a full response map against the current questions.
    ///
    /// Kind inheritance is resolved through the owning group first, so a
    /// writing task is skipped even when its question record never had
    /// its kind backfilled by a reconcile pass.
    pub fn score(&self, responses: &HashMap<QuestionRef, String>) -> ScoreSummary {
        let gradable = self.snapshot.questions.iter().filter(|q| {
            self.snapshot
                .effective_kind(q)
                .map_or(true, |k| k.is_gradable())
        });
        evaluate::score(gradable, responses)
    }
}
