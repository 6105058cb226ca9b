/// ─── msgcheck constants ─────────────────────────────────────────────────────
///
/// Base unit:    attoFIL  (1 FIL = 10^18 attoFIL)
/// Ticker:       FIL

// ── Denomination ─────────────────────────────────────────────────────────────

/// Number of fractional digits in a whole-FIL amount.
pub const FIL_DECIMALS: u32 = 18;

/// Ticker appended to amounts rendered for humans.
pub const FIL_TICKER: &str = "FIL";

/// Longest amount text accepted by the decimal parser (sign, digits, point
/// and unit suffix included).
pub const MAX_AMOUNT_TEXT_LEN: usize = 50;

// ── Fee editor ───────────────────────────────────────────────────────────────

/// Safe fee = required fee × this multiplier.
pub const SAFE_FEE_MULTIPLIER: i64 = 10;

/// `+` scales the price by NUM/DEN, `-` by DEN/NUM. Integer arithmetic,
/// truncating after the multiply.
pub const FEE_BUMP_NUM: i64 = 11;
pub const FEE_BUMP_DEN: i64 = 10;

// ── Validation hints ─────────────────────────────────────────────────────────

/// Hint key carrying the base fee (decimal attoFIL string).
pub const BASE_FEE_HINT_KEY: &str = "baseFee";
