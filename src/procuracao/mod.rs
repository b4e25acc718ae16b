//! Public document endpoints: form-driven generation and verification lookup.

pub mod handlers;
pub mod models;
