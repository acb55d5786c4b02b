pub mod evaluator;
pub mod resolve;

pub use evaluator::{CompiledPolicy, Outcome};
pub use resolve::{ResolvedAction, resolve, resolve_cmd};
