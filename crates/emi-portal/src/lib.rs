//! Core library for the retail EMI credit portal.
//!
//! The portal tracks equated-monthly-installment credit applications submitted
//! by retail stores. This crate owns the domain logic: the amortization engine
//! that quotes installments, the application lifecycle (status transitions and
//! field edits, each paired with an audit record), and the system-wide
//! activity log. Storage is abstracted behind repository traits so the HTTP
//! service and tests can supply their own backends.

pub mod config;
pub mod emi;
pub mod error;
pub mod portal;
pub mod telemetry;
