//! Token-protected admin endpoints over the document registry.

pub mod handlers;
