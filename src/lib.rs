//! Fiscal operation lines for Brazilian accounting: CFOP selection and tax rule
//! resolution.

pub mod fiscal;
