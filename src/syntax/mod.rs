//! Syntax module for the Sable language: the token source, the parse
//! engine, and the normalization passes it invokes as productions reduce.

pub mod attrs;
pub mod parser;
pub mod strings;
pub mod token;

pub use parser::parse;
