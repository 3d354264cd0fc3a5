//! Context/identity threading.
//!
//! One mutable walk over the file does everything that depends on lexical
//! position: it gives memo functions and lambdas their two hidden parameters,
//! prepends `(__memo_context, __memo_id + N)` to every call that resolves to a
//! memo target, rewrites parameter references to `.value` reads and finally
//! wraps each memo body in its cache scope. Bodies are reified before they are
//! walked, so the condition primitives the reifier introduces are threaded like
//! any other builder call.

use crate::annotations::{decorator_marker, decorator_markers, AnnotationIndex, MemoMarkers};
use crate::cache_scope::{wrap_body, ScopePlan};
use crate::callgraph::{CallGraph, MemoMode, ParameterTable};
use crate::control_flow::returns_value;
use crate::factory::{MemoFactory, ReturnKind};
use crate::identity::{
    declaration_name, CallSiteTracker, IdentitySynthesizer, ScopeOffset,
};
use crate::options::TransformOptions;
use crate::reify::Reifier;
use crate::scope::{
    hoisted_bindings, pattern_names, simple_pattern_name, Binding, LexicalScopes,
};
use crate::transform::TransformStats;
use crate::validate::{
    CompilerError, SourceLocation, TransformError, TransformOutcome, INV_ARITY, INV_ENTRY,
    INV_PARAM_PATTERN, INV_UNSUPPORTED,
};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::walk_mut::{
    walk_arrow_function_expression, walk_assignment_target_property, walk_block_statement,
    walk_call_expression, walk_catch_clause, walk_class, walk_expression, walk_for_in_statement,
    walk_for_of_statement, walk_for_statement, walk_formal_parameter, walk_function,
    walk_method_definition, walk_object_property, walk_property_definition,
    walk_simple_assignment_target, walk_switch_statement, walk_variable_declaration,
};
use oxc_ast_visit::VisitMut;
use oxc_span::{GetSpan, Span};
use oxc_syntax::scope::ScopeFlags;
use std::collections::HashSet;
use tracing::{debug, trace};

// ═══════════════════════════════════════════════════════════════════════════════
// FRAMES
// ═══════════════════════════════════════════════════════════════════════════════

pub(crate) enum Frame {
    /// A named scope. `threading` is false for plain declarations, which only
    /// name the free-standing memo lambdas they contain.
    Scope {
        tracker: CallSiteTracker,
        threading: bool,
    },
    /// A non-memo closure inside a memo scope: calls inside run outside the
    /// composition and are not threaded.
    Boundary,
}

/// Everything needed to rewrite one memo function or lambda.
#[derive(Debug, Clone)]
pub struct MemoSignature {
    pub qualified_name: String,
    pub mode: MemoMode,
    pub parameters: ParameterTable,
    pub offset: ScopeOffset,
    pub reify: bool,
    pub lambda: bool,
}

/// Mutable view over the two function node kinds.
pub(crate) enum FunctionParts<'r, 'a> {
    Function(&'r mut Function<'a>),
    Arrow(&'r mut ArrowFunctionExpression<'a>),
}

impl<'r, 'a> FunctionParts<'r, 'a> {
    fn span(&self) -> Span {
        match self {
            FunctionParts::Function(f) => f.span,
            FunctionParts::Arrow(a) => a.span,
        }
    }

    fn is_async(&self) -> bool {
        match self {
            FunctionParts::Function(f) => f.r#async,
            FunctionParts::Arrow(a) => a.r#async,
        }
    }

    fn is_generator(&self) -> bool {
        match self {
            FunctionParts::Function(f) => f.generator,
            FunctionParts::Arrow(_) => false,
        }
    }

    fn params(&mut self) -> &mut FormalParameters<'a> {
        match self {
            FunctionParts::Function(f) => &mut f.params,
            FunctionParts::Arrow(a) => &mut a.params,
        }
    }

    fn body(&mut self) -> Option<&mut FunctionBody<'a>> {
        match self {
            FunctionParts::Function(f) => f.body.as_deref_mut(),
            FunctionParts::Arrow(a) => Some(&mut *a.body),
        }
    }

    fn return_annotation<'s>(&self, source: &'s str) -> Option<&'s str> {
        let annotation = match self {
            FunctionParts::Function(f) => f.return_type.as_ref(),
            FunctionParts::Arrow(a) => a.return_type.as_ref(),
        }?;
        let span = annotation.type_annotation.span();
        source.get(span.start as usize..span.end as usize)
    }
}

/// Markers under which callers thread context and identity through a
/// declaration. Entry declarations are called with explicit arguments.
fn threads_callers(markers: MemoMarkers) -> bool {
    markers.is_memo_like() && !markers.entry
}

/// The function type inside an annotation, looking through parentheses and
/// unions such as `(() => void) | undefined`.
fn function_type_mut<'r, 'a>(ty: &'r mut TSType<'a>) -> Option<&'r mut TSFunctionType<'a>> {
    match ty {
        TSType::TSFunctionType(function_type) => Some(&mut **function_type),
        TSType::TSParenthesizedType(paren) => function_type_mut(&mut paren.type_annotation),
        TSType::TSUnionType(union) => union.types.iter_mut().find_map(function_type_mut),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TRANSFORMER
// ═══════════════════════════════════════════════════════════════════════════════

pub struct MemoTransformer<'t, 'a, 'o> {
    pub(crate) factory: MemoFactory<'a, 'o>,
    pub(crate) options: &'o TransformOptions,
    pub(crate) source: &'t str,
    pub(crate) annotations: &'t AnnotationIndex,
    pub(crate) graph: &'t CallGraph,
    pub(crate) ids: IdentitySynthesizer,
    pub(crate) scopes: LexicalScopes,
    pub(crate) frames: Vec<Frame>,
    pub(crate) classes: Vec<String>,
    /// Closures marked memo through their declaration rather than directly.
    pending_memo: HashSet<(u32, u32)>,
    pub errors: Vec<CompilerError>,
    pub stats: TransformStats,
    pub touched: bool,
    failure: Option<TransformError>,
}

impl<'t, 'a, 'o> MemoTransformer<'t, 'a, 'o> {
    pub fn new(
        allocator: &'a Allocator,
        options: &'o TransformOptions,
        source: &'t str,
        annotations: &'t AnnotationIndex,
        graph: &'t CallGraph,
    ) -> Self {
        let module = declaration_name(&options.file_path, None, "<module>");
        Self {
            factory: MemoFactory::new(allocator, &options.runtime),
            options,
            source,
            annotations,
            graph,
            ids: IdentitySynthesizer::new(options.hash_width),
            scopes: LexicalScopes::new(),
            frames: vec![Frame::Scope {
                tracker: CallSiteTracker::new(module),
                threading: false,
            }],
            classes: Vec::new(),
            pending_memo: HashSet::new(),
            errors: Vec::new(),
            stats: TransformStats::default(),
            touched: false,
            failure: None,
        }
    }

    /// Diagnostics of the walk, with any internal failure appended last.
    pub fn finish(self) -> (Vec<CompilerError>, TransformStats, bool) {
        let mut errors = self.errors;
        if let Some(failure) = self.failure {
            errors.push(failure.into_compiler_error(&self.options.file_path));
        }
        (errors, self.stats, self.touched)
    }

    pub(crate) fn record<T>(&mut self, result: TransformOutcome<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.failure.get_or_insert(e);
                None
            }
        }
    }

    pub(crate) fn location(&self, offset: u32) -> SourceLocation {
        SourceLocation::from_offset(self.source, offset)
    }

    fn error(&mut self, code: &str, message: &str, offset: u32) -> &mut CompilerError {
        let location = self.location(offset);
        self.errors.push(CompilerError::at(
            code,
            message,
            &self.options.file_path,
            location,
        ));
        let last = self.errors.len() - 1;
        &mut self.errors[last]
    }

    pub(crate) fn threading(&self) -> bool {
        matches!(
            self.frames.last(),
            Some(Frame::Scope {
                threading: true,
                ..
            })
        )
    }

    /// Tracker of the innermost threading scope.
    pub(crate) fn current_tracker(&mut self) -> Option<&mut CallSiteTracker> {
        match self.frames.last_mut() {
            Some(Frame::Scope {
                tracker,
                threading: true,
            }) => Some(tracker),
            _ => None,
        }
    }

    /// Tracker of the innermost named scope, threading or not.
    fn naming_tracker(&mut self) -> Option<&mut CallSiteTracker> {
        self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Scope { tracker, .. } => Some(tracker),
            Frame::Boundary => None,
        })
    }

    fn parent_name(&self) -> String {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| match frame {
                Frame::Scope { tracker, .. } => Some(tracker.qualified_name().to_string()),
                Frame::Boundary => None,
            })
            .unwrap_or_else(|| self.options.file_path.clone())
    }

    fn with_frame<F: FnOnce(&mut Self)>(&mut self, frame: Frame, f: F) {
        self.frames.push(frame);
        f(self);
        self.frames.pop();
    }

    pub(crate) fn lambda_signature(
        &self,
        qualified_name: String,
        params: &FormalParameters,
        function_start: Option<u32>,
        reify: bool,
    ) -> MemoSignature {
        MemoSignature {
            offset: self.ids.own_scope(&qualified_name),
            parameters: ParameterTable::from_formal(params, self.annotations, function_start),
            qualified_name,
            mode: MemoMode::Memo,
            reify,
            lambda: true,
        }
    }

    /// Signature of a function node that is memo by declaration or by marker.
    fn signature_for(
        &mut self,
        span: Span,
        params: &FormalParameters,
        arrow: bool,
    ) -> Option<MemoSignature> {
        if let Some(node) = self.graph.node_at(span) {
            return Some(MemoSignature {
                qualified_name: node.qualified_name.clone(),
                mode: node.mode,
                parameters: node.parameters.clone(),
                offset: node.own_offset,
                reify: true,
                lambda: false,
            });
        }
        let markers = self.annotations.at(span.start);
        let pending = self.pending_memo.remove(&(span.start, span.end));
        let marked = MemoMode::from_markers(markers);
        let mode = marked.or(if pending { Some(MemoMode::Memo) } else { None })?;
        let qualified_name = self.naming_tracker()?.next_free_lambda();
        let function_start = if arrow { Some(span.start) } else { None };
        let mut signature = self.lambda_signature(qualified_name, params, function_start, true);
        signature.mode = mode;
        Some(signature)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // MEMO FUNCTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Rewrites one memo function or lambda: checks, reification, threading of
    /// its body, cache-scope wrapping and finally the hidden parameters.
    pub(crate) fn transform_memo_function(
        &mut self,
        mut parts: FunctionParts<'_, 'a>,
        signature: MemoSignature,
    ) {
        let start = parts.span().start;
        let name = signature.qualified_name.clone();
        let kind = self.graph.node(&name).map(|n| n.kind);
        debug!(declaration = %name, mode = ?signature.mode, ?kind, "transforming memo function");
        self.touched = true;

        if parts.is_async() || parts.is_generator() {
            let kind = if parts.is_async() { "async" } else { "generator" };
            self.error(
                INV_UNSUPPORTED,
                &format!("memo function `{}` cannot be {}", name, kind),
                start,
            )
            .hints
            .push("Memo bodies run synchronously inside the composition.".to_string());
            return;
        }
        if !self.check_signature(&mut parts, &signature, start) {
            return;
        }

        for param in parts.params().items.iter_mut() {
            param.decorators.retain(|d| decorator_marker(d).is_none());
        }
        for index in signature.parameters.memo_indices() {
            if let Some(param) = parts.params().items.get_mut(index) {
                self.thread_function_type(param.type_annotation.as_deref_mut());
            }
        }

        let wrapped = signature.mode == MemoMode::Memo;
        let annotation = parts.return_annotation(self.source).map(str::to_string);
        if wrapped {
            if let FunctionParts::Arrow(arrow) = &mut parts {
                if arrow.expression {
                    let converted = self.concise_to_block(arrow);
                    if self.record(converted).is_none() {
                        return;
                    }
                }
            }
        }

        let Some(body) = parts.body() else {
            return;
        };
        let returns = returns_value(&body.statements);
        let return_kind = ReturnKind::from_annotation(annotation.as_deref(), returns);

        if wrapped && signature.reify {
            let mut reifier = Reifier::new(
                &self.factory,
                self.options.early_exit_policy,
                self.source,
                &self.options.file_path,
            );
            let result = reifier.reify_statements(&mut body.statements);
            let (errors, reified) = (reifier.errors, reifier.reified);
            self.errors.extend(errors);
            self.stats.reified_chains += reified;
            if self.record(result).is_none() {
                return;
            }
        }

        self.scopes.push_function();
        for binding in &signature.parameters.bindings {
            if let Some(param) = &binding.name {
                self.scopes.bind(
                    param,
                    Binding::Parameter {
                        memo_typed: binding.memo_typed,
                        rewrite: wrapped && binding.slot.is_some(),
                    },
                );
            }
        }
        let params = parts.params();
        let patterns = params
            .items
            .iter()
            .map(|p| &p.pattern)
            .chain(params.rest.iter().map(|r| &r.rest.argument));
        for pattern in patterns {
            if simple_pattern_name(pattern).is_none() {
                self.scopes.bind_pattern(pattern, Binding::Local);
            }
        }

        let Some(body) = parts.body() else {
            self.scopes.pop();
            return;
        };
        for (local, binding) in hoisted_bindings(&body.statements, self.annotations) {
            self.scopes.bind(&local, binding);
        }
        let frame = Frame::Scope {
            tracker: CallSiteTracker::new(name.clone()),
            threading: true,
        };
        self.frames.push(frame);
        for stmt in body.statements.iter_mut() {
            self.visit_statement(stmt);
        }
        if let Some(Frame::Scope { tracker, .. }) = self.frames.pop() {
            trace!(declaration = %name, call_sites = tracker.call_sites(), "threaded memo body");
        }
        self.scopes.pop();

        if wrapped {
            let plan = ScopePlan {
                offset: signature.offset,
                return_kind,
                registered: signature.parameters.registered(),
            };
            let result = wrap_body(&self.factory, body, &plan);
            if self.record(result).is_none() {
                return;
            }
        }

        if signature.mode != MemoMode::Entry {
            let hidden = self.factory.hidden_parameters();
            let Some(hidden) = self.record(hidden) else {
                return;
            };
            let items = &mut parts.params().items;
            for (i, param) in hidden.into_iter().enumerate() {
                items.insert(i, param);
            }
        }

        if signature.lambda {
            self.stats.transformed_lambdas += 1;
        } else {
            self.stats.transformed_functions += 1;
        }
    }

    /// Mode-specific signature checks. Reports and returns false on failure.
    fn check_signature(
        &mut self,
        parts: &mut FunctionParts<'_, 'a>,
        signature: &MemoSignature,
        start: u32,
    ) -> bool {
        let options = self.options;
        let names = &options.runtime;
        let params = parts.params();
        let leading: Vec<Option<String>> = params
            .items
            .iter()
            .take(2)
            .map(|p| simple_pattern_name(&p.pattern))
            .collect();
        let declared = params.items.len() + usize::from(params.rest.is_some());
        let explicit = leading.len() == 2
            && leading[0].as_deref() == Some(names.context.as_str())
            && leading[1].as_deref() == Some(names.id.as_str());
        let name = signature.qualified_name.clone();

        if declared != signature.parameters.declared_len() {
            let recorded = signature.parameters.declared_len();
            self.error(
                INV_ARITY,
                &format!(
                    "`{}` declares {} parameters but its binding table records {}",
                    name, declared, recorded
                ),
                start,
            );
            return false;
        }
        match signature.mode {
            MemoMode::Entry if !explicit => {
                self.error(
                    INV_ENTRY,
                    &format!(
                        "memo entry `{}` must declare `{}` and `{}` as its first parameters",
                        name, names.context, names.id
                    ),
                    start,
                );
                return false;
            }
            MemoMode::Entry => return true,
            _ if leading
                .first()
                .and_then(|n| n.as_deref())
                .is_some_and(|n| names.is_synthetic(n)) =>
            {
                self.error(
                    INV_ARITY,
                    &format!("`{}` already carries hidden memo parameters", name),
                    start,
                )
                .hints
                .push("Mark hand-threaded functions with @memo_entry instead.".to_string());
                return false;
            }
            _ => {}
        }
        if signature.mode == MemoMode::Memo {
            let unaddressable: Vec<u32> = signature
                .parameters
                .bindings
                .iter()
                .filter(|b| b.is_unaddressable())
                .map(|b| b.start)
                .collect();
            for offset in &unaddressable {
                self.error(
                    INV_PARAM_PATTERN,
                    &format!(
                        "parameter of memo function `{}` cannot be registered for change detection",
                        name
                    ),
                    *offset,
                )
                .hints
                .push("Bind the parameter to a name, or mark it @memo_skip.".to_string());
            }
            return unaddressable.is_empty();
        }
        true
    }

    /// Prepends the hidden parameters to a memo-typed function type, so threaded
    /// calls through it and closures passed to it agree with the annotation.
    fn thread_function_type(&mut self, annotation: Option<&mut TSTypeAnnotation<'a>>) {
        let Some(function_type) =
            annotation.and_then(|a| function_type_mut(&mut a.type_annotation))
        else {
            return;
        };
        let context = self.options.runtime.context.as_str();
        let threaded = function_type
            .params
            .items
            .first()
            .and_then(|p| simple_pattern_name(&p.pattern))
            .is_some_and(|first| first == context);
        if threaded {
            return;
        }
        let hidden = self.factory.hidden_parameters();
        let Some(hidden) = self.record(hidden) else {
            return;
        };
        for (i, param) in hidden.into_iter().enumerate() {
            function_type.params.items.insert(i, param);
        }
        self.touched = true;
    }

    fn concise_to_block(&self, arrow: &mut ArrowFunctionExpression<'a>) -> TransformOutcome<()> {
        let value = match arrow.body.statements.first_mut() {
            Some(Statement::ExpressionStatement(stmt)) => {
                std::mem::replace(&mut stmt.expression, self.factory.hole_expression())
            }
            _ => return Ok(()),
        };
        let ret = self.factory.return_of(value)?;
        arrow.body.statements.clear();
        arrow.body.statements.push(ret);
        arrow.expression = false;
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // PLAIN FUNCTIONS
    // ═══════════════════════════════════════════════════════════════════════════

    fn bind_plain_parameters(&mut self, params: &FormalParameters<'a>) {
        for param in &params.items {
            self.scopes.bind_pattern(&param.pattern, Binding::Local);
        }
        if let Some(rest) = &params.rest {
            self.scopes.bind_pattern(&rest.rest.argument, Binding::Local);
        }
    }

    fn bind_hoisted(&mut self, statements: &[Statement<'a>]) {
        for (local, binding) in hoisted_bindings(statements, self.annotations) {
            self.scopes.bind(&local, binding);
        }
    }

    fn current_class(&self) -> Option<&str> {
        self.classes.last().map(String::as_str)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VISITOR
// ═══════════════════════════════════════════════════════════════════════════════

impl<'t, 'a, 'o> VisitMut<'a> for MemoTransformer<'t, 'a, 'o> {
    fn visit_block_statement(&mut self, block: &mut BlockStatement<'a>) {
        self.scopes.push_block();
        self.bind_hoisted(&block.body);
        walk_block_statement(self, block);
        self.scopes.pop();
    }

    fn visit_variable_declaration(&mut self, decl: &mut VariableDeclaration<'a>) {
        let markers = self.annotations.at(decl.span.start);
        if threads_callers(markers) {
            for declarator in decl.declarations.iter_mut() {
                self.thread_function_type(declarator.type_annotation.as_deref_mut());
            }
        }
        if markers.is_memo_like() {
            for declarator in &decl.declarations {
                match &declarator.init {
                    Some(Expression::ArrowFunctionExpression(arrow)) => {
                        self.pending_memo.insert((arrow.span.start, arrow.span.end));
                    }
                    Some(Expression::FunctionExpression(func)) => {
                        self.pending_memo.insert((func.span.start, func.span.end));
                    }
                    _ => {}
                }
            }
        }
        if decl.kind == VariableDeclarationKind::Var {
            for declarator in &decl.declarations {
                for local in pattern_names(&declarator.id) {
                    self.scopes.bind_var(&local);
                }
            }
        }
        walk_variable_declaration(self, decl);
    }

    fn visit_function(&mut self, func: &mut Function<'a>, flags: ScopeFlags) {
        if let Some(signature) = self.signature_for(func.span, &func.params, false) {
            self.transform_memo_function(FunctionParts::Function(func), signature);
            return;
        }
        let frame = match (&func.id, self.scopes.depth()) {
            (Some(id), 0) => Frame::Scope {
                tracker: CallSiteTracker::new(declaration_name(
                    &self.options.file_path,
                    None,
                    id.name.as_str(),
                )),
                threading: false,
            },
            (Some(id), _) => Frame::Scope {
                tracker: CallSiteTracker::new(format!("{}/{}", self.parent_name(), id.name)),
                threading: false,
            },
            (None, _) => Frame::Boundary,
        };
        self.with_frame(frame, |this| {
            this.scopes.push_function();
            this.bind_plain_parameters(&func.params);
            if let Some(body) = &func.body {
                this.bind_hoisted(&body.statements);
            }
            walk_function(this, func, flags);
            this.scopes.pop();
        });
    }

    fn visit_arrow_function_expression(&mut self, arrow: &mut ArrowFunctionExpression<'a>) {
        if let Some(signature) = self.signature_for(arrow.span, &arrow.params, true) {
            self.transform_memo_function(FunctionParts::Arrow(arrow), signature);
            return;
        }
        self.with_frame(Frame::Boundary, |this| {
            this.scopes.push_function();
            this.bind_plain_parameters(&arrow.params);
            this.bind_hoisted(&arrow.body.statements);
            walk_arrow_function_expression(this, arrow);
            this.scopes.pop();
        });
    }

    fn visit_class(&mut self, class: &mut Class<'a>) {
        let name = class
            .id
            .as_ref()
            .map(|id| id.name.to_string())
            .unwrap_or_else(|| "default".to_string());
        self.classes.push(name);
        walk_class(self, class);
        self.classes.pop();
    }

    fn visit_method_definition(&mut self, method: &mut MethodDefinition<'a>) {
        let mut markers = self.annotations.at(method.span.start);
        markers.merge(decorator_markers(&method.decorators));
        let before = method.decorators.len();
        method.decorators.retain(|d| decorator_marker(d).is_none());
        if method.decorators.len() != before {
            self.touched = true;
        }
        let owner = self.current_class().unwrap_or("default").to_string();
        let name = method
            .key
            .static_name()
            .map(|n| n.to_string())
            .unwrap_or_else(|| "<computed>".to_string());
        let qualified_name = declaration_name(&self.options.file_path, Some(&owner), &name);

        if markers.is_memo_like() {
            if method.kind != MethodDefinitionKind::Method {
                let kind = match method.kind {
                    MethodDefinitionKind::Constructor => "constructor",
                    MethodDefinitionKind::Get => "getter",
                    _ => "setter",
                };
                self.error(
                    INV_UNSUPPORTED,
                    &format!("`{}` is a {} and cannot be memo", qualified_name, kind),
                    method.span.start,
                );
                return;
            }
            if self.graph.node_at(method.value.span).is_none() {
                self.pending_memo
                    .insert((method.value.span.start, method.value.span.end));
            }
            walk_method_definition(self, method);
            return;
        }
        let frame = Frame::Scope {
            tracker: CallSiteTracker::new(qualified_name),
            threading: false,
        };
        self.with_frame(frame, |this| walk_method_definition(this, method));
    }

    fn visit_property_definition(&mut self, prop: &mut PropertyDefinition<'a>) {
        let mut markers = self.annotations.at(prop.span.start);
        markers.merge(decorator_markers(&prop.decorators));
        if threads_callers(markers) {
            self.thread_function_type(prop.type_annotation.as_deref_mut());
        }
        let before = prop.decorators.len();
        prop.decorators.retain(|d| decorator_marker(d).is_none());
        if prop.decorators.len() != before {
            self.touched = true;
        }
        walk_property_definition(self, prop);
    }

    fn visit_formal_parameter(&mut self, param: &mut FormalParameter<'a>) {
        let before = param.decorators.len();
        param.decorators.retain(|d| decorator_marker(d).is_none());
        if param.decorators.len() != before {
            self.touched = true;
        }
        walk_formal_parameter(self, param);
    }

    fn visit_catch_clause(&mut self, clause: &mut CatchClause<'a>) {
        self.scopes.push_block();
        if let Some(param) = &clause.param {
            self.scopes.bind_pattern(&param.pattern, Binding::Local);
        }
        walk_catch_clause(self, clause);
        self.scopes.pop();
    }

    fn visit_for_statement(&mut self, stmt: &mut ForStatement<'a>) {
        self.scopes.push_block();
        if let Some(ForStatementInit::VariableDeclaration(decl)) = &stmt.init {
            self.scopes.bind_declaration(decl);
        }
        walk_for_statement(self, stmt);
        self.scopes.pop();
    }

    fn visit_for_in_statement(&mut self, stmt: &mut ForInStatement<'a>) {
        self.scopes.push_block();
        if let ForStatementLeft::VariableDeclaration(decl) = &stmt.left {
            self.scopes.bind_declaration(decl);
        }
        walk_for_in_statement(self, stmt);
        self.scopes.pop();
    }

    fn visit_for_of_statement(&mut self, stmt: &mut ForOfStatement<'a>) {
        self.scopes.push_block();
        if let ForStatementLeft::VariableDeclaration(decl) = &stmt.left {
            self.scopes.bind_declaration(decl);
        }
        walk_for_of_statement(self, stmt);
        self.scopes.pop();
    }

    fn visit_switch_statement(&mut self, stmt: &mut SwitchStatement<'a>) {
        self.scopes.push_block();
        for case in &stmt.cases {
            self.bind_hoisted(&case.consequent);
        }
        walk_switch_statement(self, stmt);
        self.scopes.pop();
    }

    fn visit_expression(&mut self, expr: &mut Expression<'a>) {
        if let Expression::Identifier(id) = expr {
            if self.scopes.is_rewritten_parameter(id.name.as_str()) {
                let member = self.factory.parameter_value(id.name.as_str());
                *expr = Expression::from(member);
                self.touched = true;
            }
            return;
        }
        walk_expression(self, expr);
    }

    fn visit_simple_assignment_target(&mut self, target: &mut SimpleAssignmentTarget<'a>) {
        if let SimpleAssignmentTarget::AssignmentTargetIdentifier(id) = target {
            if self.scopes.is_rewritten_parameter(id.name.as_str()) {
                let member = self.factory.parameter_value(id.name.as_str());
                *target = SimpleAssignmentTarget::from(member);
                self.touched = true;
            }
            return;
        }
        walk_simple_assignment_target(self, target);
    }

    /// `({ x } = o)` writes the parameter itself; it becomes
    /// `({ x: __memo_parameter_x.value } = o)`.
    fn visit_assignment_target_property(&mut self, prop: &mut AssignmentTargetProperty<'a>) {
        if let AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(shorthand) = prop {
            let name = shorthand.binding.name;
            if self.scopes.is_rewritten_parameter(name.as_str()) {
                let span = shorthand.span;
                let mut init = shorthand.init.take();
                if let Some(init) = init.as_mut() {
                    self.visit_expression(init);
                }
                *prop = self
                    .factory
                    .parameter_target_property(span, name.as_str(), init);
                self.touched = true;
                return;
            }
        }
        walk_assignment_target_property(self, prop);
    }

    fn visit_object_property(&mut self, prop: &mut ObjectProperty<'a>) {
        if prop.shorthand {
            if let Expression::Identifier(id) = &prop.value {
                if self.scopes.is_rewritten_parameter(id.name.as_str()) {
                    prop.shorthand = false;
                }
            }
        }
        walk_object_property(self, prop);
    }

    fn visit_call_expression(&mut self, call: &mut CallExpression<'a>) {
        match self.resolve_call(call) {
            Some(plan) if self.threading() => self.thread_call(call, plan),
            Some(plan) => {
                trace!(callee = %plan.label, "memo call outside a memo scope left untouched");
                walk_call_expression(self, call);
            }
            None => walk_call_expression(self, call),
        }
    }
}
