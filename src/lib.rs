//! # Memo Transform Ground Truth
//!
//! ## Rewrite Invariants
//!
//! 1. **Hidden Parameters**: every transformed memo function or lambda gains exactly
//!    two leading parameters, `(__memo_context, __memo_id)`, and nothing else.
//!
//! 2. **Threaded Calls**: every call that resolves to a memo target gains exactly two
//!    leading arguments: the context identifier, then `__memo_id + <literal>`.
//!
//! 3. **Static Identity**: the literal is a pure function of the enclosing
//!    declaration's qualified name and the call site's ordinal inside it. No
//!    counters survive between declarations or files.
//!
//! 4. **Fast Path First**: a memo body opens its cache scope, registers its
//!    parameters, and checks `unchanged` before any original statement runs.
//!
//! 5. **Guard Order**: reified `if`/`switch` chains keep every guard and every
//!    statement in its original evaluation order.
//!
//! 6. **Reject, Don't Guess**: a conditional arm whose jumps, `var` declarations or
//!    suspension points could behave differently inside a closure fails the file
//!    (or, under the lenient policy, is left as written).
//!
//! 7. **All Or Nothing**: a file with any diagnostic produces no code.
//!
//! ## Resolution Priority
//!
//! Calls are resolved in this exact order:
//!    1. Lexical bindings (parameters, locals, loop and catch bindings)
//!    2. Memo declarations of the file (functions, memo variables, and through `this`
//!       the methods and properties of the enclosing class and the classes it extends)
//!    3. Builder primitives (callee + arity table)
//!    4. External memo functions named in the options
//!    5. Anything else → left untouched

#[cfg(feature = "napi")]
use napi_derive::napi;

mod annotations;
mod builder_lambda;
mod cache_scope;
mod callgraph;
mod codegen;
mod control_flow;
mod factory;
mod identity;
mod options;
mod reify;
mod scope;
mod threader;
mod transform;
mod validate;

#[cfg(test)]
mod annotations_tests;
#[cfg(test)]
mod callgraph_tests;
#[cfg(test)]
mod control_flow_tests;
#[cfg(test)]
mod identity_tests;
#[cfg(test)]
mod options_tests;
#[cfg(test)]
mod reify_tests;

// Internal Rust-to-Rust API (for bundler plugins)
pub use identity::{IdentitySynthesizer, ScopeOffset};
pub use options::{
    BuilderPrimitive, ClosurePosition, EarlyExitPolicy, PrimitiveKind, RuntimeNames,
    TransformOptions,
};
pub use transform::{
    transform_memo, transform_memo_batch, transform_memo_json, SourceFile, TransformResult,
    TransformStats,
};
pub use validate::*;

#[cfg(feature = "napi")]
pub use transform::{transform_memo_batch_native, transform_memo_native};

#[cfg(feature = "napi")]
#[napi]
pub fn compile_bridge() -> String {
    "Memo Native Bridge Connected".to_string()
}
