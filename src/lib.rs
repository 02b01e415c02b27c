pub mod config;
pub mod package;
pub mod pipeline;
pub mod publish;
pub mod rewrite;
pub mod runtime;
