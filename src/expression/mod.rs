//! Text front end: lexer, operator table, parser and formatter.

pub mod ast;
pub mod error;
pub mod format;
pub mod lexer;
pub mod operator;
pub mod parser;
