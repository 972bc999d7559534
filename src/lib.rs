//! i18n-coverage
//!
//! Translation coverage validation for JavaScript/TypeScript projects: finds
//! every translation key used in source code, checks it against per-locale
//! JSON documents, flags placeholder values, and optionally drafts missing
//! entries into a machine-owned overlay file.

pub mod classifier;
pub mod config;
pub mod engine;
pub mod issue;
pub mod locale;
pub mod remediator;
pub mod report;
pub mod scanner;
pub mod types;
pub mod validator;

pub use engine::{
    Engine,
    EngineError,
    RunOutcome,
};
