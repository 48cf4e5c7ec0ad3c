/// Fixed-point constants, checked mul-div and split arithmetic.
pub mod fixed_point;
/// Converting redemption quotes into USD.
pub mod valuation;

pub use valuation::RedemptionQuote;
