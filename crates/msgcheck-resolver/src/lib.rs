//! msgcheck-resolver
//!
//! Pre-flight check resolution for outgoing messages: classifies failed
//! checks, runs the fee editor state machine when the fee cap is the
//! problem, and asks the operator whether to send.

pub mod derive;
pub mod editor;
pub mod field;
pub mod resolver;

pub use derive::{
    classify_fee_cap_failure, decode_base_fee, extract_base_fee, is_interactively_solvable,
    FeeCapDiagnosis, HintError,
};
pub use editor::{
    EditorEvent, EditorKey, EditorOutcome, EditorState, FeeClass, FeeEditor, FeeView,
    ScriptedAdjuster,
};
pub use field::DecimalField;
pub use resolver::{
    parse_answer, write_failures, FeeAdjuster, Resolver, ResolverConfig, ValidationService,
};
