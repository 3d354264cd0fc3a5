//! Transform configuration.
//!
//! Every field has a default so an empty JSON object (`{}`) is a valid
//! configuration. The builder-primitive table is data, not code: new framework
//! primitives are added here without touching the transform.

use crate::validate::{TransformError, TransformOutcome};
use serde::{Deserialize, Serialize};

/// Narrowest and widest supported offset widths. The upper bound keeps every
/// emitted literal an exact JavaScript integer.
pub const MIN_HASH_WIDTH: u32 = 8;
pub const MAX_HASH_WIDTH: u32 = 53;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformOptions {
    /// Path used in qualified names and diagnostics. Should be project-relative
    /// so identities do not depend on the checkout location.
    pub file_path: String,
    pub hash_width: u32,
    pub early_exit_policy: EarlyExitPolicy,
    pub runtime: RuntimeNames,
    pub runtime_module: String,
    pub builder_module: String,
    pub emit_imports: bool,
    pub primitives: Vec<BuilderPrimitive>,
    /// Memo functions declared in other files, by callee name.
    pub external_memo_functions: Vec<String>,
}

impl Default for TransformOptions {
    fn default() -> Self {
        TransformOptions {
            file_path: "input.ts".to_string(),
            hash_width: 32,
            early_exit_policy: EarlyExitPolicy::Reject,
            runtime: RuntimeNames::default(),
            runtime_module: "arkui.stateManagement.runtime".to_string(),
            builder_module: "arkui.component.builder".to_string(),
            emit_imports: true,
            primitives: default_primitives(),
            external_memo_functions: Vec::new(),
        }
    }
}

impl TransformOptions {
    pub fn from_json(json: &str) -> TransformOutcome<Self> {
        let options: TransformOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_file_path(mut self, file_path: &str) -> Self {
        self.file_path = file_path.to_string();
        self
    }

    pub fn validate(&self) -> TransformOutcome<()> {
        if !(MIN_HASH_WIDTH..=MAX_HASH_WIDTH).contains(&self.hash_width) {
            return Err(TransformError::HashWidth(self.hash_width));
        }
        Ok(())
    }

    /// Looks up a primitive by rendered callee and call arity.
    pub fn find_primitive(&self, callee: &str, arity: usize) -> Option<&BuilderPrimitive> {
        self.primitives
            .iter()
            .find(|p| p.name == callee && p.arity.map_or(true, |a| a == arity))
    }

    pub fn is_external_memo(&self, callee: &str) -> bool {
        self.external_memo_functions.iter().any(|f| f == callee)
    }
}

/// What to do with an `if`/`switch` whose arms contain a jump that cannot be
/// proven to stay inside the arm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EarlyExitPolicy {
    /// Fail the file with a diagnostic.
    #[default]
    Reject,
    /// Keep the statement un-reified and continue.
    LeaveUntouched,
}

/// Names of everything the generated code refers to in the runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeNames {
    pub context: String,
    pub id: String,
    pub scope: String,
    pub parameter_prefix: String,
    pub context_type: String,
    pub id_type: String,
    pub scope_method: String,
    pub param_method: String,
    pub unchanged: String,
    pub cached: String,
    pub recache: String,
    pub value: String,
    pub condition_scope: String,
    pub condition_branch: String,
}

impl Default for RuntimeNames {
    fn default() -> Self {
        RuntimeNames {
            context: "__memo_context".to_string(),
            id: "__memo_id".to_string(),
            scope: "__memo_scope".to_string(),
            parameter_prefix: "__memo_parameter_".to_string(),
            context_type: "__memo_context_type".to_string(),
            id_type: "__memo_id_type".to_string(),
            scope_method: "scope".to_string(),
            param_method: "param".to_string(),
            unchanged: "unchanged".to_string(),
            cached: "cached".to_string(),
            recache: "recache".to_string(),
            value: "value".to_string(),
            condition_scope: "ConditionScope".to_string(),
            condition_branch: "ConditionBranch".to_string(),
        }
    }
}

impl RuntimeNames {
    pub fn parameter(&self, name: &str) -> String {
        format!("{}{}", self.parameter_prefix, name)
    }

    /// True for identifiers the transform itself introduces.
    pub fn is_synthetic(&self, name: &str) -> bool {
        name == self.context
            || name == self.id
            || name == self.scope
            || name.starts_with(&self.parameter_prefix)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BUILDER PRIMITIVES
// ═══════════════════════════════════════════════════════════════════════════════

/// Role of a primitive in the transform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PrimitiveKind {
    #[default]
    Builder,
    /// Wraps a reified `if`/`switch`; its closure is never reified again.
    ConditionScope,
    ConditionBranch,
}

/// Argument position holding a closure that becomes a nested memo scope.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ClosurePosition {
    Leading,
    Trailing,
    Index(usize),
}

impl ClosurePosition {
    pub fn resolve(&self, arity: usize) -> Option<usize> {
        match *self {
            ClosurePosition::Leading if arity > 0 => Some(0),
            ClosurePosition::Trailing if arity > 0 => Some(arity - 1),
            ClosurePosition::Index(i) if i < arity => Some(i),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BuilderPrimitive {
    /// Callee as written, e.g. `Column` or `Text.create`.
    pub name: String,
    /// Exact argument count, or any when absent.
    #[serde(default)]
    pub arity: Option<usize>,
    #[serde(default)]
    pub kind: PrimitiveKind,
    #[serde(default)]
    pub closures: Vec<ClosurePosition>,
}

impl BuilderPrimitive {
    pub fn new(name: &str, closures: &[ClosurePosition]) -> Self {
        BuilderPrimitive {
            name: name.to_string(),
            arity: None,
            kind: PrimitiveKind::Builder,
            closures: closures.to_vec(),
        }
    }

    /// Distinct argument indices that hold nested scopes for a call of `arity`.
    pub fn closure_indices(&self, arity: usize) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .closures
            .iter()
            .filter_map(|p| p.resolve(arity))
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

const CONTAINERS: &[&str] = &[
    "Column", "Row", "Stack", "Flex", "List", "ListItem", "Grid", "GridItem", "Scroll",
    "Button", "Tabs", "TabContent", "Navigation", "RelativeContainer",
];

const LEAVES: &[&str] = &["Text", "Image", "Blank", "Divider", "TextInput", "Toggle"];

const ITERATORS: &[&str] = &["ForEach", "LazyForEach", "Repeat"];

pub fn default_primitives() -> Vec<BuilderPrimitive> {
    let mut table = vec![
        BuilderPrimitive {
            name: RuntimeNames::default().condition_scope,
            arity: Some(1),
            kind: PrimitiveKind::ConditionScope,
            closures: vec![ClosurePosition::Index(0)],
        },
        BuilderPrimitive {
            name: RuntimeNames::default().condition_branch,
            arity: Some(1),
            kind: PrimitiveKind::ConditionBranch,
            closures: vec![ClosurePosition::Index(0)],
        },
    ];
    for name in CONTAINERS.iter().chain(LEAVES) {
        table.push(BuilderPrimitive::new(
            name,
            &[ClosurePosition::Leading, ClosurePosition::Trailing],
        ));
    }
    for name in ITERATORS {
        table.push(BuilderPrimitive::new(name, &[ClosurePosition::Index(1)]));
    }
    table
}
