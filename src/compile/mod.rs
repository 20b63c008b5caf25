pub mod fold;
pub mod named;
pub mod program;
pub mod stack_depth;
pub mod translate;
