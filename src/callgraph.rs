//! Memo declarations of one file and the calls between them.
//!
//! Nodes are created once per declaration, before any rewriting happens, so
//! the ParameterBinding table and own-scope offset of a declaration are fixed
//! no matter how many times (or how recursively) it is called.

use crate::annotations::{decorator_markers, AnnotationIndex, MemoMarkers};
use crate::identity::{declaration_name, IdentitySynthesizer, ScopeOffset};
use crate::scope::{render_callee, simple_pattern_name};
use oxc_ast::ast::*;
use oxc_ast_visit::walk::walk_call_expression;
use oxc_ast_visit::Visit;
use oxc_span::Span;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

// ═══════════════════════════════════════════════════════════════════════════════
// PARAMETER BINDINGS
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterBinding {
    /// Position in the declared signature, hidden parameters excluded.
    pub index: usize,
    pub name: Option<String>,
    /// Cache slot, `None` for skipped parameters.
    pub slot: Option<usize>,
    pub memo_typed: bool,
    pub skip: bool,
    pub rest: bool,
    pub start: u32,
}

impl ParameterBinding {
    /// A parameter that must be registered but cannot be referenced by name.
    pub fn is_unaddressable(&self) -> bool {
        !self.skip && (self.name.is_none() || self.rest)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterTable {
    pub bindings: Vec<ParameterBinding>,
}

impl ParameterTable {
    /// Builds the table for a declared parameter list. `ignore_offset` is the
    /// start of the owning function: a marker there belongs to the function,
    /// not to a first parameter that happens to start at the same byte.
    pub fn from_formal(
        params: &FormalParameters,
        annotations: &AnnotationIndex,
        ignore_offset: Option<u32>,
    ) -> Self {
        let mut bindings = Vec::new();
        let mut next_slot = 0;
        let marker_at = |start: u32| {
            if Some(start) == ignore_offset {
                MemoMarkers::default()
            } else {
                annotations.at(start)
            }
        };
        for (index, param) in params.items.iter().enumerate() {
            let mut markers = marker_at(param.span.start);
            markers.merge(decorator_markers(&param.decorators));
            let name = simple_pattern_name(&param.pattern);
            let slot = if markers.skip || name.is_none() {
                None
            } else {
                next_slot += 1;
                Some(next_slot - 1)
            };
            bindings.push(ParameterBinding {
                index,
                name,
                slot,
                memo_typed: markers.memo,
                skip: markers.skip,
                rest: false,
                start: param.span.start,
            });
        }
        if let Some(rest) = &params.rest {
            let markers = marker_at(rest.span.start);
            bindings.push(ParameterBinding {
                index: params.items.len(),
                name: simple_pattern_name(&rest.rest.argument),
                slot: None,
                memo_typed: false,
                skip: markers.skip,
                rest: true,
                start: rest.span.start,
            });
        }
        ParameterTable { bindings }
    }

    /// Number of registered (change-detected) parameters.
    pub fn slot_count(&self) -> usize {
        self.bindings.iter().filter(|b| b.slot.is_some()).count()
    }

    /// Parameters in slot order, as `(slot, name)`.
    pub fn registered(&self) -> Vec<(usize, &str)> {
        self.bindings
            .iter()
            .filter_map(|b| Some((b.slot?, b.name.as_deref()?)))
            .collect()
    }

    /// Signature positions of memo-typed parameters.
    pub fn memo_indices(&self) -> Vec<usize> {
        self.bindings
            .iter()
            .filter(|b| b.memo_typed)
            .map(|b| b.index)
            .collect()
    }

    pub fn declared_len(&self) -> usize {
        self.bindings.len()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODES
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Function,
    Variable,
    Method,
    /// Memo-typed class property; calls through it are threaded.
    Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoMode {
    /// Threaded and wrapped in a cache scope.
    Memo,
    /// Threaded, never wrapped.
    Intrinsic,
    /// Receives context and identity explicitly; callers are not threaded.
    Entry,
}

impl MemoMode {
    pub fn from_markers(markers: MemoMarkers) -> Option<MemoMode> {
        if markers.entry {
            Some(MemoMode::Entry)
        } else if markers.intrinsic {
            Some(MemoMode::Intrinsic)
        } else if markers.memo {
            Some(MemoMode::Memo)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct MemoNode {
    pub qualified_name: String,
    pub name: String,
    pub owner: Option<String>,
    pub kind: NodeKind,
    pub mode: MemoMode,
    pub parameters: ParameterTable,
    /// Span of the function node, or of the property when it has no initializer.
    pub span: Span,
    pub own_offset: ScopeOffset,
    raw_calls: Vec<String>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// CALL GRAPH
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct CallGraph {
    nodes: Vec<MemoNode>,
    by_name: HashMap<String, usize>,
    by_span: HashMap<(u32, u32), usize>,
    edges: BTreeMap<String, BTreeSet<String>>,
    /// Class name to the name in its `extends` clause, for classes of this file.
    supers: HashMap<String, String>,
}

impl CallGraph {
    pub fn build(
        program: &Program,
        file: &str,
        annotations: &AnnotationIndex,
        ids: &IdentitySynthesizer,
    ) -> Self {
        let mut collector = DeclarationCollector {
            file,
            annotations,
            ids,
            nodes: Vec::new(),
            supers: HashMap::new(),
        };
        for stmt in &program.body {
            collector.collect_statement(stmt);
        }

        let mut graph = CallGraph {
            supers: collector.supers,
            ..CallGraph::default()
        };
        for node in collector.nodes {
            let index = graph.nodes.len();
            graph.by_span.insert((node.span.start, node.span.end), index);
            graph.by_name.insert(node.qualified_name.clone(), index);
            graph.nodes.push(node);
        }
        graph.link();
        graph
    }

    fn link(&mut self) {
        let mut edges = BTreeMap::new();
        for node in &self.nodes {
            let mut targets = BTreeSet::new();
            for callee in &node.raw_calls {
                if let Some(target) = self.resolve_by_name(callee, node.owner.as_deref()) {
                    targets.insert(target.qualified_name.clone());
                }
            }
            edges.insert(node.qualified_name.clone(), targets);
        }
        self.edges = edges;
    }

    /// Name-only resolution used for graph edges; no lexical information.
    /// Only `this` receivers are resolved against class members.
    fn resolve_by_name(&self, callee: &str, owner: Option<&str>) -> Option<&MemoNode> {
        match callee.rsplit_once('.') {
            None => self.function(callee),
            Some(("this", method)) => owner.and_then(|o| self.inherited_member(o, method)),
            Some(_) => None,
        }
    }

    pub fn nodes(&self) -> &[MemoNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn node(&self, qualified_name: &str) -> Option<&MemoNode> {
        self.by_name.get(qualified_name).map(|&i| &self.nodes[i])
    }

    /// Declaration whose function node occupies exactly `span`.
    pub fn node_at(&self, span: Span) -> Option<&MemoNode> {
        self.by_span
            .get(&(span.start, span.end))
            .map(|&i| &self.nodes[i])
    }

    /// Top-level memo function or memo variable called `name`.
    pub fn function(&self, name: &str) -> Option<&MemoNode> {
        self.nodes
            .iter()
            .find(|n| n.owner.is_none() && n.name == name)
    }

    /// Memo method or memo-typed property `name` of class `owner`.
    pub fn member(&self, owner: &str, name: &str) -> Option<&MemoNode> {
        self.nodes
            .iter()
            .find(|n| n.owner.as_deref() == Some(owner) && n.name == name)
    }

    /// Memo member `name` of `owner` or of the nearest class it extends. Only
    /// classes declared in this file are followed.
    pub fn inherited_member(&self, owner: &str, name: &str) -> Option<&MemoNode> {
        let mut seen = BTreeSet::new();
        let mut class = Some(owner);
        while let Some(current) = class {
            if !seen.insert(current) {
                return None;
            }
            if let Some(node) = self.member(current, name) {
                return Some(node);
            }
            class = self.supers.get(current).map(String::as_str);
        }
        None
    }

    pub fn callees(&self, qualified_name: &str) -> impl Iterator<Item = &String> {
        self.edges.get(qualified_name).into_iter().flatten()
    }

    /// Declarations reachable from the entry points. Without entry points every
    /// memo declaration is its own root.
    pub fn reachable_from_roots(&self) -> BTreeSet<String> {
        let mut roots: Vec<&str> = self
            .nodes
            .iter()
            .filter(|n| n.mode == MemoMode::Entry)
            .map(|n| n.qualified_name.as_str())
            .collect();
        if roots.is_empty() {
            roots = self.nodes.iter().map(|n| n.qualified_name.as_str()).collect();
        }
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<String> = roots.into_iter().map(str::to_string).collect();
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            for next in self.callees(&current) {
                if !seen.contains(next) {
                    queue.push_back(next.clone());
                }
            }
        }
        seen
    }

    /// True when `qualified_name` can reach itself through one or more calls.
    pub fn is_recursive(&self, qualified_name: &str) -> bool {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<&String> = self.callees(qualified_name).collect();
        while let Some(current) = stack.pop() {
            if current == qualified_name {
                return true;
            }
            if seen.insert(current.clone()) {
                stack.extend(self.callees(current));
            }
        }
        false
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECLARATION COLLECTOR
// ═══════════════════════════════════════════════════════════════════════════════

struct DeclarationCollector<'c> {
    file: &'c str,
    annotations: &'c AnnotationIndex,
    ids: &'c IdentitySynthesizer,
    nodes: Vec<MemoNode>,
    supers: HashMap<String, String>,
}

impl<'c> DeclarationCollector<'c> {
    fn collect_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::FunctionDeclaration(func) => self.collect_function(func, "default"),
            Statement::VariableDeclaration(decl) => self.collect_variables(decl),
            Statement::ClassDeclaration(class) => self.collect_class(class),
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::FunctionDeclaration(func)) => {
                    self.collect_function(func, "default")
                }
                Some(Declaration::VariableDeclaration(decl)) => self.collect_variables(decl),
                Some(Declaration::ClassDeclaration(class)) => self.collect_class(class),
                _ => {}
            },
            Statement::ExportDefaultDeclaration(export) => match &export.declaration {
                ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                    self.collect_function(func, "default")
                }
                ExportDefaultDeclarationKind::ClassDeclaration(class) => self.collect_class(class),
                _ => {}
            },
            _ => {}
        }
    }

    fn collect_function(&mut self, func: &Function, fallback_name: &str) {
        let Some(mode) = MemoMode::from_markers(self.annotations.at(func.span.start)) else {
            return;
        };
        let Some(body) = &func.body else {
            return;
        };
        let name = func
            .id
            .as_ref()
            .map(|id| id.name.to_string())
            .unwrap_or_else(|| fallback_name.to_string());
        let parameters = ParameterTable::from_formal(&func.params, self.annotations, None);
        let raw_calls = collect_calls(|c| c.visit_function_body(body));
        self.push(name, None, NodeKind::Function, mode, parameters, func.span, raw_calls);
    }

    fn collect_variables(&mut self, decl: &VariableDeclaration) {
        let outer = self.annotations.at(decl.span.start);
        for declarator in &decl.declarations {
            let Some(name) = simple_pattern_name(&declarator.id) else {
                continue;
            };
            match &declarator.init {
                Some(Expression::ArrowFunctionExpression(arrow)) => {
                    let mut markers = outer;
                    markers.merge(self.annotations.at(arrow.span.start));
                    let Some(mode) = MemoMode::from_markers(markers) else {
                        continue;
                    };
                    let parameters = ParameterTable::from_formal(
                        &arrow.params,
                        self.annotations,
                        Some(arrow.span.start),
                    );
                    let raw_calls = collect_calls(|c| c.visit_function_body(&arrow.body));
                    let span = arrow.span;
                    self.push(name, None, NodeKind::Variable, mode, parameters, span, raw_calls);
                }
                Some(Expression::FunctionExpression(func)) => {
                    let mut markers = outer;
                    markers.merge(self.annotations.at(func.span.start));
                    let Some(mode) = MemoMode::from_markers(markers) else {
                        continue;
                    };
                    let Some(body) = &func.body else {
                        continue;
                    };
                    let parameters =
                        ParameterTable::from_formal(&func.params, self.annotations, None);
                    let raw_calls = collect_calls(|c| c.visit_function_body(body));
                    let span = func.span;
                    self.push(name, None, NodeKind::Variable, mode, parameters, span, raw_calls);
                }
                _ => {}
            }
        }
    }

    fn collect_class(&mut self, class: &Class) {
        let owner = class
            .id
            .as_ref()
            .map(|id| id.name.to_string())
            .unwrap_or_else(|| "default".to_string());
        if let Some(Expression::Identifier(parent)) = &class.super_class {
            self.supers.insert(owner.clone(), parent.name.to_string());
        }
        for element in &class.body.body {
            match element {
                ClassElement::MethodDefinition(method) => {
                    let mut markers = self.annotations.at(method.span.start);
                    markers.merge(decorator_markers(&method.decorators));
                    let Some(mode) = MemoMode::from_markers(markers) else {
                        continue;
                    };
                    if method.kind != MethodDefinitionKind::Method {
                        continue;
                    }
                    let (Some(name), Some(body)) = (method.key.static_name(), &method.value.body)
                    else {
                        continue;
                    };
                    let parameters =
                        ParameterTable::from_formal(&method.value.params, self.annotations, None);
                    let raw_calls = collect_calls(|c| c.visit_function_body(body));
                    self.push(
                        name.to_string(),
                        Some(owner.clone()),
                        NodeKind::Method,
                        mode,
                        parameters,
                        method.value.span,
                        raw_calls,
                    );
                }
                ClassElement::PropertyDefinition(prop) => {
                    let mut markers = self.annotations.at(prop.span.start);
                    markers.merge(decorator_markers(&prop.decorators));
                    let Some(mode) = MemoMode::from_markers(markers) else {
                        continue;
                    };
                    let Some(name) = prop.key.static_name() else {
                        continue;
                    };
                    let (parameters, span, raw_calls) = match &prop.value {
                        Some(Expression::ArrowFunctionExpression(arrow)) => (
                            ParameterTable::from_formal(
                                &arrow.params,
                                self.annotations,
                                Some(arrow.span.start),
                            ),
                            arrow.span,
                            collect_calls(|c| c.visit_function_body(&arrow.body)),
                        ),
                        _ => (ParameterTable::default(), prop.span, Vec::new()),
                    };
                    self.push(
                        name.to_string(),
                        Some(owner.clone()),
                        NodeKind::Property,
                        mode,
                        parameters,
                        span,
                        raw_calls,
                    );
                }
                _ => {}
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn push(
        &mut self,
        name: String,
        owner: Option<String>,
        kind: NodeKind,
        mode: MemoMode,
        parameters: ParameterTable,
        span: Span,
        raw_calls: Vec<String>,
    ) {
        let qualified_name = declaration_name(self.file, owner.as_deref(), &name);
        let own_offset = self.ids.own_scope(&qualified_name);
        self.nodes.push(MemoNode {
            qualified_name,
            name,
            owner,
            kind,
            mode,
            parameters,
            span,
            own_offset,
            raw_calls,
        });
    }
}

#[derive(Default)]
struct CallCollector {
    callees: Vec<String>,
}

impl<'a> Visit<'a> for CallCollector {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Some(callee) = render_callee(&call.callee) {
            self.callees.push(callee);
        }
        walk_call_expression(self, call);
    }
}

fn collect_calls(run: impl FnOnce(&mut CallCollector)) -> Vec<String> {
    let mut collector = CallCollector::default();
    run(&mut collector);
    collector.callees
}
