//! Fact engine: evaluates `FactOperations` against pluggable collectors
//! and reduces the results to a numeric metric value.

mod code_host;
mod component;
mod engine;
pub mod eval;
pub mod json;
mod json_api;
pub mod placeholder;

pub use code_host::CodeHostCollector;
pub use component::ComponentCollector;
pub use engine::FactEngine;
pub use json_api::JsonApiCollector;
