//! Configuration constants for the GapCheck engine
//!
//! Centralized values used throughout the engine for:
//! - Input size limits (malicious or runaway snapshots)
//! - Tag numbering bounds
//! - Answer-string separators
//! - Scheduling defaults
//!
//! # Customization
//!
//! Currently these are compile-time constants. Future versions may
//! support runtime configuration via a configuration file.

/// Maximum snapshot document size in bytes (4 MB).
///
/// A full test (four reading passages, forty questions, rich-text bodies)
/// is typically well under 1 MB; the limit exists to reject corrupted or
/// hostile payloads before JSON parsing.
pub const MAX_SNAPSHOT_SIZE: usize = 4_000_000;

/// Maximum number of parts in one snapshot.
///
/// IELTS-style tests have 3-4 parts; multi-section mock exams stay under
/// a dozen. 100 is far beyond any legitimate authoring session.
pub const MAX_PARTS: usize = 100;

/// Maximum tag number accepted by the lexer.
///
/// Gap numbers are dense small integers (the allocator always fills the
/// lowest free slot), so anything above this is a typo or an attempt to
/// blow up derived collections. Larger numbers are skipped as if the tag
/// were malformed.
pub const MAX_TAG_NUMBER: u32 = 500;

/// Separator between accepted answer alternatives in a question's key.
///
/// Example: `"cat/feline"` accepts either word.
pub const ALTERNATIVE_SEPARATOR: char = '/';

/// Separator between per-gap values in a multi-gap submission.
///
/// A prompt with three gaps submits one string with the three values
/// joined by this character; each gap is graded independently.
pub const GAP_SEPARATOR: char = '|';

/// Default debounce delay in milliseconds for the reconcile scheduler.
///
/// Long enough that an author typing `[[12]]` does not see a question
/// created for `[[1]]` mid-keystroke, short enough to feel immediate.
pub const DEFAULT_DEBOUNCE_MS: u64 = 600;
