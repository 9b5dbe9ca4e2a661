use serde::Serialize;

/// Parameter errors raised before any arithmetic runs.
///
/// The engine refuses to produce NaN or infinity: a zero tenure would divide
/// by zero and a negative principal has no amortization meaning, so both are
/// rejected up front instead of propagating non-finite values to callers.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EmiError {
    #[error("principal must be a finite, non-negative amount")]
    InvalidPrincipal,
    #[error("tenure must be at least one month")]
    InvalidTenure,
    #[error("annual interest rate must be a finite, non-negative percentage")]
    InvalidRate,
    #[error("loan parameters produce a quote outside the representable range")]
    UnrepresentableQuote,
}

/// Derived quote for a single parameter set. Transient: recomputed on every
/// input change, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmiQuote {
    /// Unrounded monthly installment, for live calculator display.
    pub monthly_payment: f64,
    pub total_payment: f64,
    pub total_interest: f64,
    /// Share of the total repaid that is principal, rounded to whole percent.
    pub principal_share_percent: u8,
    pub interest_share_percent: u8,
}

/// Compute the amortized monthly installment and derived totals.
///
/// A zero rate is a valid, explicitly special-cased input: the installment is
/// a straight division of the principal over the tenure. Otherwise the
/// standard amortization formula applies with the monthly rate
/// `annual_rate_percent / 100 / 12`.
pub fn compute_emi(
    principal: f64,
    tenure_months: u32,
    annual_rate_percent: f64,
) -> Result<EmiQuote, EmiError> {
    if !principal.is_finite() || principal < 0.0 {
        return Err(EmiError::InvalidPrincipal);
    }
    if tenure_months == 0 {
        return Err(EmiError::InvalidTenure);
    }
    if !annual_rate_percent.is_finite() || annual_rate_percent < 0.0 {
        return Err(EmiError::InvalidRate);
    }

    let months = f64::from(tenure_months);
    let (monthly_payment, total_payment, total_interest) = if annual_rate_percent == 0.0 {
        (principal / months, principal, 0.0)
    } else {
        let monthly_rate = annual_rate_percent / 100.0 / 12.0;
        let growth = (1.0 + monthly_rate).powf(months);
        let monthly = principal * monthly_rate * growth / (growth - 1.0);
        let total = monthly * months;
        (monthly, total, total - principal)
    };

    // Extreme tenures overflow the growth term to infinity and the division
    // then produces NaN; refuse the quote instead of returning it.
    if !monthly_payment.is_finite() || !total_payment.is_finite() {
        return Err(EmiError::UnrepresentableQuote);
    }

    Ok(EmiQuote {
        monthly_payment,
        total_payment,
        total_interest,
        principal_share_percent: share_percent(principal, total_payment),
        interest_share_percent: share_percent(total_interest, total_payment),
    })
}

/// The whole-BDT installment stored on an application record at submission.
///
/// Kept separate from [`compute_emi`] so the live estimate stays unrounded
/// while every persisted quote is a round currency figure.
pub fn quoted_monthly_emi(
    principal: f64,
    tenure_months: u32,
    annual_rate_percent: f64,
) -> Result<u64, EmiError> {
    let quote = compute_emi(principal, tenure_months, annual_rate_percent)?;
    Ok(quote.monthly_payment.round() as u64)
}

fn share_percent(part: f64, total: f64) -> u8 {
    if total > 0.0 {
        (part / total * 100.0).round() as u8
    } else {
        0
    }
}
