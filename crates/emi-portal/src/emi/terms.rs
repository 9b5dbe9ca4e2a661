use serde::{Deserialize, Serialize};

/// Tenures offered by the portal, in months.
pub const ALLOWED_TENURES: [u32; 7] = [3, 6, 9, 12, 18, 24, 36];

const DEFAULT_MIN_AMOUNT: f64 = 5_000.0;
const DEFAULT_MAX_AMOUNT: f64 = 500_000.0;

/// Boundary validation for loan parameters.
///
/// The engine itself accepts any finite inputs; this policy is the caller-side
/// range check run before an application is accepted or a quote issued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanPolicy {
    /// Minimum purchase amount, BDT.
    pub min_amount: f64,
    /// Maximum purchase amount, BDT.
    pub max_amount: f64,
    /// Annual interest rate applied to stored quotes, percent.
    pub annual_rate_percent: f64,
}

impl Default for LoanPolicy {
    fn default() -> Self {
        Self {
            min_amount: DEFAULT_MIN_AMOUNT,
            max_amount: DEFAULT_MAX_AMOUNT,
            annual_rate_percent: 0.0,
        }
    }
}

impl LoanPolicy {
    pub fn check(&self, amount: f64, tenure_months: u32) -> Result<(), TermsError> {
        if !amount.is_finite() || amount < self.min_amount || amount > self.max_amount {
            return Err(TermsError::AmountOutOfRange {
                min: self.min_amount,
                max: self.max_amount,
                actual: amount,
            });
        }
        if !ALLOWED_TENURES.contains(&tenure_months) {
            return Err(TermsError::UnsupportedTenure(tenure_months));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum TermsError {
    #[error("amount {actual} is outside the allowed range {min}..={max} BDT")]
    AmountOutOfRange { min: f64, max: f64, actual: f64 },
    #[error("tenure of {0} months is not offered")]
    UnsupportedTenure(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_accepts_in_range_terms() {
        let policy = LoanPolicy::default();
        for tenure in ALLOWED_TENURES {
            assert_eq!(policy.check(50_000.0, tenure), Ok(()));
        }
    }

    #[test]
    fn rejects_out_of_range_amounts() {
        let policy = LoanPolicy::default();
        assert!(matches!(
            policy.check(4_999.99, 12),
            Err(TermsError::AmountOutOfRange { .. })
        ));
        assert!(matches!(
            policy.check(500_000.01, 12),
            Err(TermsError::AmountOutOfRange { .. })
        ));
        assert!(matches!(
            policy.check(f64::NAN, 12),
            Err(TermsError::AmountOutOfRange { .. })
        ));
    }

    #[test]
    fn rejects_tenures_outside_the_offered_set() {
        let policy = LoanPolicy::default();
        assert_eq!(
            policy.check(50_000.0, 7),
            Err(TermsError::UnsupportedTenure(7))
        );
        assert_eq!(
            policy.check(50_000.0, 0),
            Err(TermsError::UnsupportedTenure(0))
        );
    }
}
