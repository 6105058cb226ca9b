//! Check resolution protocol.
//!
//! One attempt, in order:
//!   1. Run the checks for the candidate message; the node's answer names
//!      its id (see [`candidate_id`])
//!   2. All passed → done, nothing printed
//!   3. Print every failure
//!   4. Non-interactive → `CheckFailed`
//!   5. Fixable fee-cap failure → offer the fee editor, apply, re-check
//!   6. Ask whether to send (default no)

use std::io::{self, BufRead, Write};

use msgcheck_core::{
    all_ok, candidate_id, BoxError, CheckBatch, ContentId, MessagePrototype, ResolveError,
    TokenAmount,
};
use tracing::{debug, info};

use crate::derive::{classify_fee_cap_failure, FeeCapDiagnosis};
use crate::editor::EditorOutcome;

// ── Collaborators ────────────────────────────────────────────────────────────

/// Runs pre-flight checks for a message. Must be safe to call again after
/// the message was edited.
pub trait ValidationService {
    fn run_checks(&mut self, proto: &MessagePrototype) -> Result<Vec<CheckBatch>, BoxError>;
}

impl<T: ValidationService + ?Sized> ValidationService for &mut T {
    fn run_checks(&mut self, proto: &MessagePrototype) -> Result<Vec<CheckBatch>, BoxError> {
        (**self).run_checks(proto)
    }
}

/// Runs one fee editing session for `proto` and reports how it ended.
pub trait FeeAdjuster {
    fn adjust(&mut self, proto: &MessagePrototype, base_fee: &TokenAmount) -> io::Result<EditorOutcome>;
}

impl<T: FeeAdjuster + ?Sized> FeeAdjuster for &mut T {
    fn adjust(&mut self, proto: &MessagePrototype, base_fee: &TokenAmount) -> io::Result<EditorOutcome> {
        (**self).adjust(proto, base_fee)
    }
}

// ── Config ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Whether an operator is present to answer prompts.
    pub interactive: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { interactive: true }
    }
}

// ── Output helpers ───────────────────────────────────────────────────────────

/// Print one line per failed outcome. Outcomes about `subject` are labelled
/// `current`, others by their id.
pub fn write_failures<W: Write>(
    out: &mut W,
    batches: &[CheckBatch],
    subject: Option<&ContentId>,
) -> io::Result<()> {
    for outcome in batches.iter().flat_map(|b| b.failures()) {
        if Some(&outcome.subject) == subject {
            writeln!(out, "current message failed a check: {}", outcome.message)?;
        } else {
            writeln!(out, "{} message failed a check: {}", outcome.subject, outcome.message)?;
        }
    }
    Ok(())
}

/// Interpret a prompt answer: first word, case-insensitive; empty means
/// `default`, a leading `y` means yes, anything else no.
pub fn parse_answer(line: &str, default: bool) -> bool {
    match line.split_whitespace().next() {
        None => default,
        Some(word) => word.to_lowercase().starts_with('y'),
    }
}

// ── Resolver ─────────────────────────────────────────────────────────────────

pub struct Resolver<V, A, R, W> {
    service: V,
    adjuster: A,
    input: R,
    output: W,
    config: ResolverConfig,
}

impl<V, A, R, W> Resolver<V, A, R, W>
where
    V: ValidationService,
    A: FeeAdjuster,
    R: BufRead,
    W: Write,
{
    pub fn new(service: V, adjuster: A, input: R, output: W, config: ResolverConfig) -> Self {
        Self {
            service,
            adjuster,
            input,
            output,
            config,
        }
    }

    /// Run the protocol for `proto`. On `Ok` the message (fee cap possibly
    /// rewritten) is ready to submit; on error it must not be sent.
    pub fn resolve(&mut self, proto: &mut MessagePrototype) -> Result<(), ResolveError> {
        let checks = self.run_checks(proto)?;
        let subject = candidate_id(&checks);
        if all_ok(&checks) {
            debug!(cid = ?subject, "all checks passed");
            return Ok(());
        }

        writeln!(self.output, "Following checks have failed:")?;
        write_failures(&mut self.output, &checks, subject)?;
        if !self.config.interactive {
            return Err(ResolveError::CheckFailed);
        }

        let diagnosis = match subject {
            Some(id) => classify_fee_cap_failure(&checks, id),
            None => FeeCapDiagnosis::default(),
        };
        if diagnosis.fee_cap_problem {
            writeln!(self.output, "Fee of the message can be adjusted")?;
            if self.ask("Do you wish to do that? [Yes/no]: ", true)? {
                self.adjust_fee(proto, &diagnosis.base_fee)?;
            }
        }

        if !self.ask("Do you wish to send this message? [yes/No]: ", false)? {
            return Err(ResolveError::AbortedByUser);
        }
        Ok(())
    }

    fn adjust_fee(&mut self, proto: &mut MessagePrototype, base_fee: &TokenAmount) -> Result<(), ResolveError> {
        let outcome = self
            .adjuster
            .adjust(proto, base_fee)
            .map_err(ResolveError::EditorSession)?;
        if !outcome.committed {
            return Err(ResolveError::AbortedByUser);
        }
        outcome.apply(proto);
        info!(
            fee_cap = %proto.gas_fee_cap.atto(),
            max_fee = %outcome.max_fee,
            "applied adjusted fee cap"
        );

        let checks = self.run_checks(proto)?;
        writeln!(self.output, "Following checks still failed:")?;
        write_failures(&mut self.output, &checks, candidate_id(&checks))?;
        Ok(())
    }

    fn run_checks(&mut self, proto: &MessagePrototype) -> Result<Vec<CheckBatch>, ResolveError> {
        let checks = self
            .service
            .run_checks(proto)
            .map_err(ResolveError::ValidationUnavailable)?;
        info!(
            cid = ?candidate_id(&checks),
            fee_cap = %proto.gas_fee_cap.atto(),
            batches = checks.len(),
            "ran message checks"
        );
        Ok(checks)
    }

    /// Ask a yes/no question. End of input takes the default.
    fn ask(&mut self, question: &str, default: bool) -> io::Result<bool> {
        write!(self.output, "{question}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(default);
        }
        Ok(parse_answer(&line, default))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answers() {
        assert!(parse_answer("", true));
        assert!(!parse_answer("\n", false));
        assert!(parse_answer("  Yes please\n", false));
        assert!(parse_answer("y", false));
        assert!(!parse_answer("no", true));
        assert!(!parse_answer("sure", true));
    }

    #[test]
    fn failure_lines_label_the_subject() {
        use msgcheck_core::{CheckCode, CheckOutcome};
        let me = ContentId::new("bafy-me");
        let dep = ContentId::new("bafy-dep");
        let batches = vec![
            CheckBatch::new(vec![
                CheckOutcome::passed(me.clone(), CheckCode::MessageSize),
                CheckOutcome::failed(me.clone(), CheckCode::MessageBaseFee, "fee cap too low"),
            ]),
            CheckBatch::new(vec![CheckOutcome::failed(dep, CheckCode::MessageNonce, "nonce gap")]),
        ];
        let mut out = Vec::new();
        write_failures(&mut out, &batches, Some(&me)).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "current message failed a check: fee cap too low\n\
             bafy-dep message failed a check: nonce gap\n"
        );

        let mut out = Vec::new();
        write_failures(&mut out, &batches, None).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("bafy-me message failed"));
    }
}
