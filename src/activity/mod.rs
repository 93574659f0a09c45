//! Structured activity log: one JSONL line per backend request, plus the
//! aggregation behind `ragboard activity`.

pub mod logger;
pub mod reporter;
