//! Shared vocabulary for every stage of the Melt compiler.
//!
//! Spans and line lookup, the token set produced by `melt-lexer`, and the
//! lexer's error type live here so the parser, type checker and CLI agree
//! on positions and token kinds without depending on each other.

pub mod error;
pub mod span;
pub mod token;
