//! Lexical bindings seen while rewriting a memo body.
//!
//! Call resolution and parameter rewriting both go through this table first: a
//! locally bound name always wins over declarations of the same name, so
//! shadowing never turns a plain call into a threaded one.

use crate::annotations::AnnotationIndex;
use oxc_ast::ast::{
    BindingPattern, Expression, Statement, VariableDeclaration,
    VariableDeclarationKind,
};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// Any ordinary local: `let`, `const`, `var`, function, class, catch or loop binding.
    Local,
    /// A parameter of the nearest enclosing memo function or lambda.
    Parameter { memo_typed: bool, rewrite: bool },
    /// A local function or closure carrying a memo marker.
    MemoLocal,
}

impl Binding {
    /// Calls through this binding are threaded.
    pub fn is_memo_callable(&self) -> bool {
        matches!(
            self,
            Binding::Parameter {
                memo_typed: true,
                ..
            } | Binding::MemoLocal
        )
    }
}

#[derive(Debug, Default)]
struct ScopeFrame {
    bindings: HashMap<String, Binding>,
    function: bool,
}

#[derive(Debug, Default)]
pub struct LexicalScopes {
    frames: Vec<ScopeFrame>,
}

impl LexicalScopes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_function(&mut self) {
        self.frames.push(ScopeFrame {
            bindings: HashMap::new(),
            function: true,
        });
    }

    pub fn push_block(&mut self) {
        self.frames.push(ScopeFrame::default());
    }

    pub fn pop(&mut self) {
        self.frames.pop();
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn bind(&mut self, name: &str, binding: Binding) {
        if let Some(frame) = self.frames.last_mut() {
            frame.bindings.insert(name.to_string(), binding);
        }
    }

    /// `var` bindings live in the nearest function frame.
    pub fn bind_var(&mut self, name: &str) {
        if let Some(frame) = self.frames.iter_mut().rev().find(|f| f.function) {
            frame.bindings.insert(name.to_string(), Binding::Local);
        } else {
            self.bind(name, Binding::Local);
        }
    }

    pub fn bind_pattern(&mut self, pattern: &BindingPattern, binding: Binding) {
        for name in pattern_names(pattern) {
            self.bind(&name, binding);
        }
    }

    pub fn bind_declaration(&mut self, decl: &VariableDeclaration) {
        for declarator in &decl.declarations {
            for name in pattern_names(&declarator.id) {
                if decl.kind == VariableDeclarationKind::Var {
                    self.bind_var(&name);
                } else {
                    self.bind(&name, Binding::Local);
                }
            }
        }
    }

    /// Innermost binding of `name`, if any frame declares it.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.bindings.get(name).copied())
    }

    /// True when `name` is a parameter whose references become `.value` reads.
    pub fn is_rewritten_parameter(&self, name: &str) -> bool {
        matches!(
            self.lookup(name),
            Some(Binding::Parameter { rewrite: true, .. })
        )
    }
}

pub fn pattern_names(pattern: &BindingPattern) -> Vec<String> {
    let mut names = Vec::new();
    collect_pattern_names(pattern, &mut names);
    names
}

fn collect_pattern_names(pattern: &BindingPattern, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => names.push(id.name.to_string()),
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                collect_pattern_names(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                collect_pattern_names(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for elem in arr.elements.iter().flatten() {
                collect_pattern_names(elem, names);
            }
            if let Some(rest) = &arr.rest {
                collect_pattern_names(&rest.argument, names);
            }
        }
        BindingPattern::AssignmentPattern(assign) => collect_pattern_names(&assign.left, names),
    }
}

/// Name of a plain identifier pattern, looking through a default value.
pub fn simple_pattern_name(pattern: &BindingPattern) -> Option<String> {
    match pattern {
        BindingPattern::BindingIdentifier(id) => Some(id.name.to_string()),
        BindingPattern::AssignmentPattern(assign) => simple_pattern_name(&assign.left),
        _ => None,
    }
}

/// Bindings a statement list introduces before any of its statements run.
///
/// Function declarations and lexical declarations are visible to closures
/// anywhere in the block, so they are bound on entry rather than on sight.
pub fn hoisted_bindings(
    statements: &[Statement],
    annotations: &AnnotationIndex,
) -> Vec<(String, Binding)> {
    let mut out = Vec::new();
    for stmt in statements {
        match stmt {
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    let binding = if annotations.at(func.span.start).is_memo_like() {
                        Binding::MemoLocal
                    } else {
                        Binding::Local
                    };
                    out.push((id.name.to_string(), binding));
                }
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    out.push((id.name.to_string(), Binding::Local));
                }
            }
            Statement::VariableDeclaration(decl) if decl.kind != VariableDeclarationKind::Var => {
                let marked = annotations.at(decl.span.start).is_memo_like();
                for declarator in &decl.declarations {
                    let memo_init = declarator.init.as_ref().is_some_and(|init| {
                        is_closure(init)
                            && (marked || annotations.at(closure_start(init)).is_memo_like())
                    });
                    for name in pattern_names(&declarator.id) {
                        let binding = if memo_init {
                            Binding::MemoLocal
                        } else {
                            Binding::Local
                        };
                        out.push((name, binding));
                    }
                }
            }
            _ => {}
        }
    }
    out
}

pub fn is_closure(expr: &Expression) -> bool {
    matches!(
        expr,
        Expression::ArrowFunctionExpression(_) | Expression::FunctionExpression(_)
    )
}

fn closure_start(expr: &Expression) -> u32 {
    match expr {
        Expression::ArrowFunctionExpression(arrow) => arrow.span.start,
        Expression::FunctionExpression(func) => func.span.start,
        _ => u32::MAX,
    }
}

/// Dotted rendering of a callee made of identifiers and static member accesses,
/// e.g. `Column`, `Text.create`, `this.content`.
pub fn render_callee(expr: &Expression) -> Option<String> {
    match expr {
        Expression::Identifier(id) => Some(id.name.to_string()),
        Expression::ThisExpression(_) => Some("this".to_string()),
        Expression::StaticMemberExpression(member) => {
            let object = render_callee(&member.object)?;
            Some(format!("{}.{}", object, member.property.name))
        }
        Expression::ParenthesizedExpression(paren) => render_callee(&paren.expression),
        _ => None,
    }
}
