//! Installment quoting for retail EMI purchases.
//!
//! The engine is a pure amortization calculator: it never touches storage and
//! never rounds the live estimate. Rounding to whole BDT happens only in
//! [`engine::quoted_monthly_emi`], the figure stored on an application record
//! at submission time. Range checks (amount bounds, allowed tenures) live in
//! [`terms::LoanPolicy`] and run at the caller boundary, per the portal's
//! validation contract.

pub mod engine;
pub mod terms;

pub use engine::{compute_emi, quoted_monthly_emi, EmiError, EmiQuote};
pub use terms::{LoanPolicy, TermsError, ALLOWED_TENURES};
