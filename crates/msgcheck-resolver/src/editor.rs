//! Fee editor state machine.
//!
//! The editor owns the in-progress maximum-fee text and recomputes every
//! derived value from it on each frame. It knows nothing about terminals:
//! a front end feeds it [`EditorEvent`]s and draws the [`FeeView`] it
//! returns.

use std::io;

use msgcheck_core::{
    AmountError, FeeUnit, MessagePrototype, TokenAmount, FEE_BUMP_DEN, FEE_BUMP_NUM,
    SAFE_FEE_MULTIPLIER,
};
use num_bigint::BigInt;
use num_traits::ToPrimitive;
use tracing::debug;

use crate::field::DecimalField;
use crate::resolver::FeeAdjuster;

// ── Events and states ────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorKey {
    Char(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    /// Confirm the current value.
    Enter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorEvent {
    Key(EditorKey),
    /// Idle redraw with no input.
    Tick,
    /// The host is tearing the session down (interrupt, terminal loss).
    Teardown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorState {
    Editing,
    Committed,
    Aborted,
}

impl EditorState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, EditorState::Editing)
    }
}

// ── View ─────────────────────────────────────────────────────────────────────

/// How the entered maximum fee compares to what the network needs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeeClass {
    /// Price text does not parse.
    Invalid,
    /// At or above the safe fee.
    Safe,
    /// At or above the required fee but below the safe fee.
    /// `over_hundredths` is `floor(max * 100 / required)`.
    Low { over_hundredths: BigInt },
    /// Below the required fee.
    TooLow,
}

impl FeeClass {
    pub fn label(&self) -> &'static str {
        match self {
            FeeClass::Invalid => "invalid price",
            FeeClass::Safe => "SAFE",
            FeeClass::Low { .. } => "low",
            FeeClass::TooLow => "too low",
        }
    }

    /// `"1.3x over the minimum"` for [`FeeClass::Low`].
    pub fn over_text(&self) -> Option<String> {
        match self {
            FeeClass::Low { over_hundredths } => {
                let over = over_hundredths.to_f64().unwrap_or(f64::INFINITY) / 100.0;
                Some(format!("{over:.1}x over the minimum"))
            }
            _ => None,
        }
    }
}

/// Everything a front end draws for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeeView {
    pub unit: FeeUnit,
    pub price_text: String,
    pub cursor: usize,
    /// Parsed price, zero when the text does not parse.
    pub max_fee: TokenAmount,
    pub class: FeeClass,
    /// `floor(max_fee / gas_limit)`; not applied until commit.
    pub fee_cap_preview: TokenAmount,
    pub base_fee: TokenAmount,
    pub required_fee: TokenAmount,
    pub safe_fee: TokenAmount,
    pub original_max_fee: TokenAmount,
}

// ── Outcome ──────────────────────────────────────────────────────────────────

/// Result of one editing session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorOutcome {
    pub committed: bool,
    /// Final maximum fee; zero if the text did not parse at commit.
    pub max_fee: TokenAmount,
}

impl EditorOutcome {
    pub fn aborted() -> Self {
        Self {
            committed: false,
            max_fee: TokenAmount::zero(),
        }
    }

    /// Fee cap implied by the final maximum fee.
    pub fn fee_cap(&self, gas_limit: i64) -> TokenAmount {
        self.max_fee.checked_div_int(gas_limit).unwrap_or_default()
    }

    /// Write the new fee cap into `proto` if the session was committed.
    /// Returns whether the message changed.
    pub fn apply(&self, proto: &mut MessagePrototype) -> bool {
        if !self.committed {
            return false;
        }
        proto.gas_fee_cap = self.fee_cap(proto.gas_limit);
        true
    }
}

// ── Editor ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct FeeEditor {
    unit: FeeUnit,
    gas_limit: i64,
    base_fee: TokenAmount,
    required_fee: TokenAmount,
    safe_fee: TokenAmount,
    original_max_fee: TokenAmount,
    price: DecimalField,
    state: EditorState,
}

impl FeeEditor {
    /// Start a session for `proto`. The price text starts at the message's
    /// configured maximum fee.
    pub fn new(proto: &MessagePrototype, base_fee: TokenAmount, unit: FeeUnit) -> Self {
        let required_fee = &base_fee * proto.gas_limit;
        let safe_fee = &required_fee * SAFE_FEE_MULTIPLIER;
        let original_max_fee = proto.max_fee();
        let price = DecimalField::new(original_max_fee.to_unitless(unit));
        Self {
            unit,
            gas_limit: proto.gas_limit,
            base_fee,
            required_fee,
            safe_fee,
            original_max_fee,
            price,
            state: EditorState::Editing,
        }
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    pub fn price_text(&self) -> &str {
        self.price.text()
    }

    pub fn required_fee(&self) -> &TokenAmount {
        &self.required_fee
    }

    pub fn safe_fee(&self) -> &TokenAmount {
        &self.safe_fee
    }

    fn parse_price(&self) -> Result<TokenAmount, AmountError> {
        TokenAmount::parse_decimal(self.price.text(), self.unit)
    }

    fn scale_price(&mut self, num: i64, den: i64) {
        if let Ok(price) = self.parse_price() {
            let scaled = (price * num) / den;
            self.price.set_text(scaled.to_unitless(self.unit));
        }
    }

    /// Apply one event. Events after a terminal state are ignored.
    pub fn handle(&mut self, event: EditorEvent) -> EditorState {
        if self.state.is_terminal() {
            return self.state;
        }
        match event {
            EditorEvent::Tick => {}
            EditorEvent::Teardown => {
                debug!("fee editor torn down");
                self.state = EditorState::Aborted;
            }
            EditorEvent::Key(EditorKey::Enter) => {
                debug!(price = %self.price.text(), "fee editor committed");
                self.state = EditorState::Committed;
            }
            EditorEvent::Key(EditorKey::Char('s' | 'S')) => {
                let safe = self.safe_fee.to_unitless(self.unit);
                self.price.set_text(safe);
            }
            EditorEvent::Key(EditorKey::Char('+')) => self.scale_price(FEE_BUMP_NUM, FEE_BUMP_DEN),
            EditorEvent::Key(EditorKey::Char('-')) => self.scale_price(FEE_BUMP_DEN, FEE_BUMP_NUM),
            EditorEvent::Key(EditorKey::Char(c)) => {
                self.price.insert(c);
            }
            EditorEvent::Key(EditorKey::Backspace) => self.price.backspace(),
            EditorEvent::Key(EditorKey::Delete) => self.price.delete(),
            EditorEvent::Key(EditorKey::Left) => self.price.move_left(),
            EditorEvent::Key(EditorKey::Right) => self.price.move_right(),
            EditorEvent::Key(EditorKey::Home) => self.price.move_home(),
            EditorEvent::Key(EditorKey::End) => self.price.move_end(),
        }
        self.state
    }

    /// Classify a maximum fee against the required and safe fees.
    pub fn classify(&self, max_fee: &TokenAmount) -> FeeClass {
        if *max_fee >= self.safe_fee {
            FeeClass::Safe
        } else if *max_fee >= self.required_fee {
            match (max_fee * 100).checked_ratio(&self.required_fee) {
                Some(over_hundredths) => FeeClass::Low { over_hundredths },
                // Unreachable with a zero required fee: every non-negative
                // amount is already at or above the (zero) safe fee.
                None => FeeClass::Safe,
            }
        } else {
            FeeClass::TooLow
        }
    }

    /// Derive this frame's view from the current text.
    pub fn view(&self) -> FeeView {
        let (max_fee, class) = match self.parse_price() {
            Ok(fee) => {
                let class = self.classify(&fee);
                (fee, class)
            }
            Err(_) => (TokenAmount::zero(), FeeClass::Invalid),
        };
        let fee_cap_preview = max_fee.checked_div_int(self.gas_limit).unwrap_or_default();
        FeeView {
            unit: self.unit,
            price_text: self.price.text().to_string(),
            cursor: self.price.cursor(),
            max_fee,
            class,
            fee_cap_preview,
            base_fee: self.base_fee.clone(),
            required_fee: self.required_fee.clone(),
            safe_fee: self.safe_fee.clone(),
            original_max_fee: self.original_max_fee.clone(),
        }
    }

    /// Session result as of now. A commit with unparsable text yields a
    /// zero maximum fee.
    pub fn outcome(&self) -> EditorOutcome {
        EditorOutcome {
            committed: self.state == EditorState::Committed,
            max_fee: self.parse_price().unwrap_or_default(),
        }
    }

    /// Feed `events` until the session ends. Running out of events while
    /// still editing counts as a teardown.
    pub fn drive(mut self, events: impl IntoIterator<Item = EditorEvent>) -> EditorOutcome {
        for event in events {
            if self.handle(event).is_terminal() {
                break;
            }
        }
        if !self.state.is_terminal() {
            self.handle(EditorEvent::Teardown);
        }
        self.outcome()
    }
}

// ── Scripted adjuster ────────────────────────────────────────────────────────

/// Headless [`FeeAdjuster`] that replays a fixed list of events through a
/// real [`FeeEditor`].
#[derive(Clone, Debug, Default)]
pub struct ScriptedAdjuster {
    pub unit: FeeUnit,
    pub events: Vec<EditorEvent>,
}

impl ScriptedAdjuster {
    pub fn new(unit: FeeUnit, events: Vec<EditorEvent>) -> Self {
        Self { unit, events }
    }

    /// Script that types `text` after clearing the field, then presses
    /// Enter.
    pub fn typing(unit: FeeUnit, text: &str) -> Self {
        let mut events = vec![EditorEvent::Key(EditorKey::End)];
        events.extend(std::iter::repeat(EditorEvent::Key(EditorKey::Backspace)).take(64));
        events.extend(text.chars().map(|c| EditorEvent::Key(EditorKey::Char(c))));
        events.push(EditorEvent::Key(EditorKey::Enter));
        Self { unit, events }
    }
}

impl FeeAdjuster for ScriptedAdjuster {
    fn adjust(&mut self, proto: &MessagePrototype, base_fee: &TokenAmount) -> io::Result<EditorOutcome> {
        let editor = FeeEditor::new(proto, base_fee.clone(), self.unit);
        Ok(editor.drive(self.events.iter().copied()))
    }
}
