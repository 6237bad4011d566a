//! PGN codec: tokenising, parsing into a [`crate::tree::Game`], and writing back.

pub mod commands;
pub mod lexer;
mod parser;
mod writer;

pub use parser::{parse, parse_all, split_games};
pub use writer::write;
