use std::collections::HashMap;

use msgcheck_core::{CheckBatch, CheckCode, ContentId, TokenAmount, BASE_FEE_HINT_KEY};
use thiserror::Error;
use tracing::{debug, warn};

/// Why a `baseFee` hint could not be used.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HintError {
    #[error("no baseFee hint")]
    Missing,

    #[error("baseFee hint is not a string")]
    NotAString,

    #[error("baseFee hint is not a decimal amount: {0:?}")]
    Unparsable(String),
}

/// Decode the `baseFee` hint (decimal attoFIL string).
pub fn decode_base_fee(hints: &HashMap<String, serde_json::Value>) -> Result<TokenAmount, HintError> {
    let value = hints.get(BASE_FEE_HINT_KEY).ok_or(HintError::Missing)?;
    let text = value.as_str().ok_or(HintError::NotAString)?;
    TokenAmount::from_atto_str(text).map_err(|_| HintError::Unparsable(text.to_string()))
}

/// Best-effort base fee: any decode failure yields zero.
pub fn extract_base_fee(hints: &HashMap<String, serde_json::Value>) -> TokenAmount {
    match decode_base_fee(hints) {
        Ok(fee) => fee,
        Err(HintError::Missing) => TokenAmount::zero(),
        Err(err) => {
            warn!(%err, "ignoring base fee hint");
            TokenAmount::zero()
        }
    }
}

/// Check codes the fee editor can fix.
pub fn is_interactively_solvable(code: CheckCode) -> bool {
    matches!(
        code,
        CheckCode::MessageBaseFee
            | CheckCode::MessageBaseFeeLowerBound
            | CheckCode::MessageBaseFeeUpperBound
    )
}

/// Result of scanning a validation run for a fixable fee-cap failure.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeCapDiagnosis {
    pub fee_cap_problem: bool,
    pub base_fee: TokenAmount,
}

/// Scan every failed outcome about `subject` for a solvable fee-cap code.
///
/// The base fee comes from the first qualifying outcome whose hint yields a
/// non-zero value; a zero capture is not sticky.
pub fn classify_fee_cap_failure(batches: &[CheckBatch], subject: &ContentId) -> FeeCapDiagnosis {
    let mut diagnosis = FeeCapDiagnosis::default();
    for outcome in batches.iter().flat_map(|b| b.failures()) {
        if outcome.subject != *subject || !is_interactively_solvable(outcome.code) {
            continue;
        }
        diagnosis.fee_cap_problem = true;
        if diagnosis.base_fee.is_zero() {
            diagnosis.base_fee = extract_base_fee(&outcome.hints);
        }
    }
    debug!(
        fee_cap_problem = diagnosis.fee_cap_problem,
        base_fee = %diagnosis.base_fee.atto(),
        "classified check failures"
    );
    diagnosis
}

#[cfg(test)]
mod tests {
    use super::*;
    use msgcheck_core::CheckOutcome;
    use serde_json::json;

    fn hints(value: serde_json::Value) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert(BASE_FEE_HINT_KEY.to_string(), value);
        map
    }

    #[test]
    fn decode_distinguishes_failures() {
        assert_eq!(decode_base_fee(&HashMap::new()), Err(HintError::Missing));
        assert_eq!(decode_base_fee(&hints(json!(100))), Err(HintError::NotAString));
        assert_eq!(
            decode_base_fee(&hints(json!("1e3"))),
            Err(HintError::Unparsable("1e3".into()))
        );
        assert_eq!(decode_base_fee(&hints(json!("100"))), Ok(TokenAmount::from(100)));
    }

    #[test]
    fn extract_falls_back_to_zero() {
        assert!(extract_base_fee(&HashMap::new()).is_zero());
        assert!(extract_base_fee(&hints(json!(true))).is_zero());
        assert!(extract_base_fee(&hints(json!("12.5"))).is_zero());
        assert!(extract_base_fee(&hints(json!(""))).is_zero());
        assert_eq!(extract_base_fee(&hints(json!("250"))), TokenAmount::from(250));
    }

    #[test]
    fn solvable_codes() {
        assert!(is_interactively_solvable(CheckCode::MessageBaseFee));
        assert!(is_interactively_solvable(CheckCode::MessageBaseFeeLowerBound));
        assert!(is_interactively_solvable(CheckCode::MessageBaseFeeUpperBound));
        assert!(!is_interactively_solvable(CheckCode::MessageMinBaseFee));
        assert!(!is_interactively_solvable(CheckCode::MessageBalance));
        assert!(!is_interactively_solvable(CheckCode::Unknown(6000)));
    }

    fn fee_failure(subject: ContentId, base_fee: &str) -> CheckOutcome {
        CheckOutcome::failed(subject, CheckCode::MessageBaseFee, "fee cap too low")
            .with_hint(BASE_FEE_HINT_KEY, json!(base_fee))
    }

    #[test]
    fn first_non_zero_hint_wins() {
        let me = ContentId::new("bafy-me");
        let batches = vec![
            CheckBatch::new(vec![fee_failure(me.clone(), "0"), fee_failure(me.clone(), "100")]),
            CheckBatch::new(vec![fee_failure(me.clone(), "200")]),
        ];
        let d = classify_fee_cap_failure(&batches, &me);
        assert!(d.fee_cap_problem);
        assert_eq!(d.base_fee, TokenAmount::from(100));
    }

    #[test]
    fn missing_hint_does_not_block_later_capture() {
        let me = ContentId::new("bafy-me");
        let batches = vec![CheckBatch::new(vec![
            CheckOutcome::failed(me.clone(), CheckCode::MessageBaseFeeUpperBound, "upper"),
            fee_failure(me.clone(), "300"),
        ])];
        assert_eq!(
            classify_fee_cap_failure(&batches, &me).base_fee,
            TokenAmount::from(300)
        );
    }

    #[test]
    fn dependency_and_passing_outcomes_are_ignored() {
        let me = ContentId::new("bafy-me");
        let dep = ContentId::new("bafy-dep");
        let mut passed = fee_failure(me.clone(), "500");
        passed.ok = true;
        let batches = vec![CheckBatch::new(vec![
            fee_failure(dep, "100"),
            passed,
            CheckOutcome::failed(me.clone(), CheckCode::MessageNonce, "nonce"),
        ])];
        let d = classify_fee_cap_failure(&batches, &me);
        assert!(!d.fee_cap_problem);
        assert!(d.base_fee.is_zero());
    }
}
