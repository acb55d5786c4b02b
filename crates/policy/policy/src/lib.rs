//! Storage policy conditions and their compilation to backend filters.
//!
//! Configurations declare [`FileClass`]es and [`Policy`]s in a
//! [`Namespace`] using the condition algebra ([`Field`] constants,
//! comparison operators and logical combinators). A [`Compiler`] turns those
//! conditions into backend predicates and owned filter handles, and a
//! [`CompiledPolicy`] decides, entry by entry, which action applies.
//!
//! ```
//! use shelve_policy::{ActionSpec, Compiler, Policy, Rule};
//! use shelve_policy::ir::condition::{NAME, SIZE};
//!
//! let policy = Policy::new("cleanup", NAME.eq("*.tmp"), ActionSpec::common("delete"))
//!     .with_rule(Rule::new("keep-big", SIZE.gt("1GB")).with_action(ActionSpec::common("log")));
//! let compiled = Compiler::new().compile_policy(&policy).unwrap();
//! assert_eq!(compiled.rules().count(), 1);
//! ```

pub mod compiler;
pub mod config;
pub mod engine;
pub mod error;
pub mod ir;
pub mod namespace;

pub use compiler::Compiler;
pub use config::ConfigFrontend;
pub use engine::{CompiledPolicy, Outcome, ResolvedAction};
pub use error::{ConfigError, PolicyError};
pub use ir::action::ActionSpec;
pub use ir::condition::{CompareOp, Comparison, Condition, Field};
pub use ir::fileclass::FileClass;
pub use ir::policy::{Parameters, Policy, Rule};
pub use ir::trigger::Trigger;
pub use namespace::Namespace;
