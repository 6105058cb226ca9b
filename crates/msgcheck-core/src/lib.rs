pub mod amount;
pub mod check;
pub mod constants;
pub mod error;
pub mod message;
pub mod types;

pub use amount::{AmountError, FeeUnit, TokenAmount};
pub use check::{all_ok, candidate_id, CheckBatch, CheckCode, CheckOutcome};
pub use constants::*;
pub use error::{BoxError, ResolveError};
pub use message::MessagePrototype;
pub use types::ContentId;
