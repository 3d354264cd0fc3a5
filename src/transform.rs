//! Pipeline driver.
//!
//! parse → annotation index → call graph → threading walk (with reification
//! and cache-scope wrapping inside) → runtime imports → print.
//!
//! A file either transforms completely or produces no code: any diagnostic
//! discards the output.

use crate::annotations::AnnotationIndex;
use crate::callgraph::CallGraph;
use crate::codegen::{insert_runtime_imports, print};
use crate::factory::MemoFactory;
use crate::identity::IdentitySynthesizer;
use crate::options::TransformOptions;
use crate::threader::MemoTransformer;
use crate::validate::{CompilerError, SourceLocation, TransformError, INV_PARSE};
#[cfg(feature = "napi")]
use napi_derive::napi;
use oxc_allocator::Allocator;
use oxc_ast_visit::VisitMut;
use oxc_parser::Parser;
use oxc_span::SourceType;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

// ═══════════════════════════════════════════════════════════════════════════════
// OUTPUT TYPES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TransformStats {
    pub transformed_functions: usize,
    pub transformed_lambdas: usize,
    pub threaded_call_sites: usize,
    pub reified_chains: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResult {
    /// Emitted code; `None` whenever `errors` is non-empty.
    pub code: Option<String>,
    pub errors: Vec<CompilerError>,
    pub stats: TransformStats,
}

impl TransformResult {
    fn failed(errors: Vec<CompilerError>, stats: TransformStats) -> Self {
        TransformResult {
            code: None,
            errors,
            stats,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    pub path: String,
    pub source: String,
}

fn source_type_for(path: &str) -> SourceType {
    SourceType::default()
        .with_typescript(true)
        .with_module(true)
        .with_jsx(path.ends_with(".tsx"))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLE FILE
// ═══════════════════════════════════════════════════════════════════════════════

/// Applies the memo transform to one file.
pub fn transform_memo(source: &str, options: &TransformOptions) -> TransformResult {
    let file = options.file_path.as_str();
    if let Err(e) = options.validate() {
        return TransformResult::failed(
            vec![e.into_compiler_error(file)],
            TransformStats::default(),
        );
    }

    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, source_type_for(file)).parse();
    if !ret.errors.is_empty() {
        let errors = ret
            .errors
            .iter()
            .map(|e| {
                let offset = e
                    .labels
                    .as_ref()
                    .and_then(|labels| labels.first())
                    .map(|label| label.offset() as u32)
                    .unwrap_or(0);
                let location = SourceLocation::from_offset(source, offset);
                CompilerError::at(INV_PARSE, &e.to_string(), file, location)
            })
            .collect();
        return TransformResult::failed(errors, TransformStats::default());
    }
    let mut program = ret.program;

    let annotations = AnnotationIndex::from_comments(source, &program.comments);
    let ids = IdentitySynthesizer::new(options.hash_width);
    let graph = CallGraph::build(&program, file, &annotations, &ids);
    debug!(
        file,
        declarations = graph.len(),
        markers = annotations.len(),
        "collected memo declarations"
    );
    let reachable = graph.reachable_from_roots();
    for node in graph.nodes() {
        trace!(
            declaration = %node.qualified_name,
            slots = node.parameters.slot_count(),
            "memo declaration"
        );
        if !reachable.contains(&node.qualified_name) {
            debug!(
                declaration = %node.qualified_name,
                "memo declaration not reachable from an entry"
            );
        }
        if graph.is_recursive(&node.qualified_name) {
            debug!(declaration = %node.qualified_name, "recursive memo declaration");
        }
    }

    let mut transformer = MemoTransformer::new(&allocator, options, source, &annotations, &graph);
    transformer.visit_program(&mut program);
    let (errors, stats, touched) = transformer.finish();
    if !errors.is_empty() {
        warn!(file, errors = errors.len(), "memo transform failed");
        return TransformResult::failed(errors, stats);
    }
    if !touched {
        return TransformResult {
            code: Some(source.to_string()),
            errors: Vec::new(),
            stats,
        };
    }

    if options.emit_imports {
        let factory = MemoFactory::new(&allocator, &options.runtime);
        let uses_conditions = stats.reified_chains > 0;
        if let Err(e) = insert_runtime_imports(&mut program, &factory, options, uses_conditions) {
            return TransformResult::failed(vec![e.into_compiler_error(file)], stats);
        }
    }
    debug!(
        file,
        functions = stats.transformed_functions,
        lambdas = stats.transformed_lambdas,
        call_sites = stats.threaded_call_sites,
        "memo transform complete"
    );
    TransformResult {
        code: Some(print(&mut program)),
        errors: Vec::new(),
        stats,
    }
}

/// Transforms independent files in parallel; results are in input order.
pub fn transform_memo_batch(
    files: &[SourceFile],
    options: &TransformOptions,
) -> Vec<TransformResult> {
    files
        .par_iter()
        .map(|f| transform_memo(&f.source, &options.clone().with_file_path(&f.path)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// NAPI
// ═══════════════════════════════════════════════════════════════════════════════

fn to_json<T: Serialize>(value: &T) -> Result<String, TransformError> {
    serde_json::to_string(value).map_err(|e| TransformError::Serialize(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn transform_memo_native(source: String, options_json: String) -> napi::Result<String> {
    transform_memo_json(&source, &options_json).map_err(|e| napi::Error::from_reason(e.to_string()))
}

#[cfg(feature = "napi")]
#[napi]
pub fn transform_memo_batch_native(
    files_json: String,
    options_json: String,
) -> napi::Result<String> {
    let files: Vec<SourceFile> = serde_json::from_str(&files_json)
        .map_err(|e| napi::Error::from_reason(format!("Files parse error: {}", e)))?;
    let options = TransformOptions::from_json(&options_json)
        .map_err(|e| napi::Error::from_reason(e.to_string()))?;
    to_json(&transform_memo_batch(&files, &options))
        .map_err(|e| napi::Error::from_reason(e.to_string()))
}

/// JSON entry point shared by the Node binding and Rust callers that hold
/// options as JSON.
pub fn transform_memo_json(source: &str, options_json: &str) -> Result<String, TransformError> {
    let options = TransformOptions::from_json(options_json)?;
    to_json(&transform_memo(source, &options))
}
