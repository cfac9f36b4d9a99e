//! Core domain types and logic.

pub mod value;
pub mod table;
pub mod column;
pub mod expr;
pub mod expr_parser;
pub mod expr_eval;
pub mod rule_set;
pub mod legend;
pub mod classifier;
pub mod selector;
pub mod observation;
pub mod pipeline;
pub mod config_validation;
pub mod error;
