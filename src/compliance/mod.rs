//! Compliance evaluation and filtering.
//!
//! The single mandatory gate every surface routes through before a response
//! leaves the engine. No content identifier is returned to a caller without
//! passing here for that caller's context.

pub mod filter;

pub use filter::{
    BlackoutWindow, ComplianceFilter, ComplianceRuleProvider, ComplianceRules, ComplianceVerdict,
    StaticRuleProvider, ViewerContext,
};
