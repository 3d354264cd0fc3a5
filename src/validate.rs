#[cfg(feature = "napi")]
use napi_derive::napi;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════════
// INVARIANT CODES
// ═══════════════════════════════════════════════════════════════════════════════

pub const INV_PARSE: &str = "MEMO-ERR-PARSE";
pub const INV_EARLY_EXIT: &str = "MEMO-ERR-EARLY-EXIT";
pub const INV_BRANCH_VAR: &str = "MEMO-ERR-BRANCH-VAR";
pub const INV_BRANCH_SUSPEND: &str = "MEMO-ERR-BRANCH-SUSPEND";
pub const INV_ARITY: &str = "MEMO-ERR-ARITY";
pub const INV_PARAM_PATTERN: &str = "MEMO-ERR-PARAM-PATTERN";
pub const INV_UNSUPPORTED: &str = "MEMO-ERR-UNSUPPORTED";
pub const INV_ENTRY: &str = "MEMO-ERR-ENTRY";
pub const INV_OPTIONS: &str = "MEMO-ERR-OPTIONS";
pub const INV_INTERNAL: &str = "MEMO-ERR-INTERNAL";

// ═══════════════════════════════════════════════════════════════════════════════
// GUARANTEES
// ═══════════════════════════════════════════════════════════════════════════════

fn get_guarantee(code: &str) -> &'static str {
    match code {
        INV_PARSE => "Only syntactically valid sources reach the memo transform.",
        INV_EARLY_EXIT => {
            "A reified branch never changes where return, break or continue transfer control."
        }
        INV_BRANCH_VAR => "Variables declared in a branch keep their original visibility.",
        INV_BRANCH_SUSPEND => {
            "Branch closures are synchronous; suspension points stay in their function."
        }
        INV_ARITY => {
            "Every memo function carries exactly two hidden parameters ahead of its declared ones."
        }
        INV_PARAM_PATTERN => "Every change-detected parameter is addressable by name.",
        INV_UNSUPPORTED => "Only plain synchronous functions, methods and lambdas are memoized.",
        INV_ENTRY => "Memo entry points receive their context and identity explicitly.",
        INV_OPTIONS => "The transform runs with a validated configuration.",
        INV_INTERNAL => "Generated runtime glue is well-formed.",
        _ => "Unknown invariant.",
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SOURCE LOCATION
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// 1-based line and column of a byte offset into `source`.
    pub fn from_offset(source: &str, offset: u32) -> Self {
        let offset = (offset as usize).min(source.len());
        let before = source.get(..offset).unwrap_or(source);
        let line = before.matches('\n').count() as u32 + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() as u32 + 1;
        SourceLocation { line, column }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPILER ERROR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq)]
#[cfg_attr(feature = "napi", napi(object))]
#[serde(rename_all = "camelCase")]
#[error("[{code}] {message} ({file}:{line}:{column})")]
pub struct CompilerError {
    pub code: String,
    pub error_type: String,
    pub message: String,
    pub guarantee: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
    pub context: Option<String>,
    pub hints: Vec<String>,
}

impl CompilerError {
    pub fn new(code: &str, message: &str, file: &str, line: u32, column: u32) -> Self {
        Self::with_details(code, message, file, line, column, None, vec![])
    }

    pub fn with_details(
        code: &str,
        message: &str,
        file: &str,
        line: u32,
        column: u32,
        context: Option<String>,
        hints: Vec<String>,
    ) -> Self {
        CompilerError {
            code: code.to_string(),
            error_type: "MEMO_TRANSFORM_VIOLATION".to_string(),
            message: message.to_string(),
            guarantee: get_guarantee(code).to_string(),
            file: file.to_string(),
            line,
            column,
            context,
            hints,
        }
    }

    pub fn at(code: &str, message: &str, file: &str, location: SourceLocation) -> Self {
        Self::new(code, message, file, location.line, location.column)
    }

    pub fn with_hint(mut self, hint: &str) -> Self {
        self.hints.push(hint.to_string());
        self
    }

    pub fn with_context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string());
        self
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CRATE ERRORS
// ═══════════════════════════════════════════════════════════════════════════════

/// Failures that abort a whole file before any diagnostic position is known.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("invalid transform options: {0}")]
    Options(#[from] serde_json::Error),

    #[error("hash width {0} is outside the supported range 8..=53")]
    HashWidth(u32),

    #[error("failed to build generated code `{snippet}`: {reason}")]
    Snippet { snippet: String, reason: String },

    #[error("failed to serialize transform result: {0}")]
    Serialize(String),
}

impl TransformError {
    pub fn into_compiler_error(self, file: &str) -> CompilerError {
        let code = match &self {
            TransformError::Options(_) | TransformError::HashWidth(_) => INV_OPTIONS,
            TransformError::Snippet { .. } | TransformError::Serialize(_) => INV_INTERNAL,
        };
        CompilerError::new(code, &self.to_string(), file, 0, 0)
    }
}

pub type TransformOutcome<T> = Result<T, TransformError>;
