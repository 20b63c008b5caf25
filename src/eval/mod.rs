pub mod builtins;
pub mod bytecode;
pub mod error;
pub mod evaluator;
pub mod interpret;
pub mod noise;

pub use error::EvalError;
