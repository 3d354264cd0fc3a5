//! Control-flow facts about statement lists.
//!
//! An arm of a reified chain runs inside a synchronous closure. Anything that
//! would behave differently there is reported as a hazard: jumps whose target
//! lies outside the arm, `var` declarations (they would hoist into the closure
//! instead of the function), and suspension points. Nested functions and
//! classes are opaque; their jumps and declarations belong to them.
//!
//! Case bodies of a `switch` share one scope, so a lexical declaration in one
//! case that another case refers to is a hazard as well.

use crate::scope::pattern_names;
use oxc_ast::ast::*;
use oxc_ast_visit::walk;
use oxc_ast_visit::Visit;
use oxc_span::Span;
use oxc_syntax::scope::ScopeFlags;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HazardKind {
    Return,
    Break,
    Continue,
    Var,
    Await,
    Yield,
    /// Lexical declaration of a case body that another case refers to.
    CaseBinding,
}

impl HazardKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            HazardKind::Return => "return",
            HazardKind::Break => "break",
            HazardKind::Continue => "continue",
            HazardKind::Var => "var",
            HazardKind::Await => "await",
            HazardKind::Yield => "yield",
            HazardKind::CaseBinding => "declaration",
        }
    }

    pub fn is_jump(&self) -> bool {
        matches!(self, HazardKind::Return | HazardKind::Break | HazardKind::Continue)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hazard {
    pub kind: HazardKind,
    pub span: Span,
}

/// Hazards of running `statements` inside a closure, in document order.
pub fn arm_hazards(statements: &[Statement]) -> Vec<Hazard> {
    let mut finder = HazardFinder::default();
    for stmt in statements {
        finder.visit_statement(stmt);
    }
    finder.hazards
}

/// Case-body declarations that other parts of the `switch` refer to. Each
/// entry of `cases` is one case split into the part that becomes a branch and
/// the part that stays in the case.
pub fn shared_case_bindings(cases: &[(&[Statement], &[Statement])]) -> Vec<Hazard> {
    let referenced: Vec<(HashSet<String>, HashSet<String>)> = cases
        .iter()
        .map(|(arm, rest)| (referenced_names(arm), referenced_names(rest)))
        .collect();
    let mut hazards = Vec::new();
    for (i, (arm, _)) in cases.iter().enumerate() {
        for (name, span) in lexical_declarations(arm) {
            let shared = referenced.iter().enumerate().any(|(j, (in_arm, in_rest))| {
                (j != i && in_arm.contains(&name)) || in_rest.contains(&name)
            });
            if shared {
                hazards.push(Hazard {
                    kind: HazardKind::CaseBinding,
                    span,
                });
            }
        }
    }
    hazards
}

fn lexical_declarations(statements: &[Statement]) -> Vec<(String, Span)> {
    let mut out = Vec::new();
    for stmt in statements {
        match stmt {
            Statement::VariableDeclaration(decl) if decl.kind != VariableDeclarationKind::Var => {
                for declarator in &decl.declarations {
                    for name in pattern_names(&declarator.id) {
                        out.push((name, decl.span));
                    }
                }
            }
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    out.push((id.name.to_string(), func.span));
                }
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    out.push((id.name.to_string(), class.span));
                }
            }
            _ => {}
        }
    }
    out
}

/// Every identifier referenced in `statements`, nested functions included.
fn referenced_names(statements: &[Statement]) -> HashSet<String> {
    let mut collector = ReferenceCollector::default();
    for stmt in statements {
        collector.visit_statement(stmt);
    }
    collector.names
}

#[derive(Default)]
struct ReferenceCollector {
    names: HashSet<String>,
}

impl<'a> Visit<'a> for ReferenceCollector {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        self.names.insert(it.name.to_string());
    }
}

#[derive(Default)]
struct HazardFinder {
    hazards: Vec<Hazard>,
    labels: Vec<(String, bool)>,
    loop_depth: usize,
    switch_depth: usize,
}

impl HazardFinder {
    fn push(&mut self, kind: HazardKind, span: Span) {
        self.hazards.push(Hazard { kind, span });
    }

    fn in_loop<F: FnOnce(&mut Self)>(&mut self, f: F) {
        self.loop_depth += 1;
        f(self);
        self.loop_depth -= 1;
    }
}

fn is_loop(stmt: &Statement) -> bool {
    matches!(
        stmt,
        Statement::ForStatement(_)
            | Statement::ForInStatement(_)
            | Statement::ForOfStatement(_)
            | Statement::WhileStatement(_)
            | Statement::DoWhileStatement(_)
    )
}

impl<'a> Visit<'a> for HazardFinder {
    fn visit_return_statement(&mut self, it: &ReturnStatement<'a>) {
        self.push(HazardKind::Return, it.span);
        walk::walk_return_statement(self, it);
    }

    fn visit_break_statement(&mut self, it: &BreakStatement<'a>) {
        let inside = match &it.label {
            Some(label) => self.labels.iter().any(|(name, _)| name == label.name.as_str()),
            None => self.loop_depth > 0 || self.switch_depth > 0,
        };
        if !inside {
            self.push(HazardKind::Break, it.span);
        }
    }

    fn visit_continue_statement(&mut self, it: &ContinueStatement<'a>) {
        let inside = match &it.label {
            Some(label) => self
                .labels
                .iter()
                .any(|(name, on_loop)| *on_loop && name == label.name.as_str()),
            None => self.loop_depth > 0,
        };
        if !inside {
            self.push(HazardKind::Continue, it.span);
        }
    }

    fn visit_labeled_statement(&mut self, it: &LabeledStatement<'a>) {
        self.labels
            .push((it.label.name.to_string(), is_loop(&it.body)));
        walk::walk_labeled_statement(self, it);
        self.labels.pop();
    }

    fn visit_for_statement(&mut self, it: &ForStatement<'a>) {
        self.in_loop(|s| walk::walk_for_statement(s, it));
    }

    fn visit_for_in_statement(&mut self, it: &ForInStatement<'a>) {
        self.in_loop(|s| walk::walk_for_in_statement(s, it));
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        if it.r#await {
            self.push(HazardKind::Await, it.span);
        }
        self.in_loop(|s| walk::walk_for_of_statement(s, it));
    }

    fn visit_while_statement(&mut self, it: &WhileStatement<'a>) {
        self.in_loop(|s| walk::walk_while_statement(s, it));
    }

    fn visit_do_while_statement(&mut self, it: &DoWhileStatement<'a>) {
        self.in_loop(|s| walk::walk_do_while_statement(s, it));
    }

    fn visit_switch_statement(&mut self, it: &SwitchStatement<'a>) {
        self.switch_depth += 1;
        walk::walk_switch_statement(self, it);
        self.switch_depth -= 1;
    }

    fn visit_variable_declaration(&mut self, it: &VariableDeclaration<'a>) {
        if it.kind == VariableDeclarationKind::Var {
            self.push(HazardKind::Var, it.span);
        }
        walk::walk_variable_declaration(self, it);
    }

    fn visit_await_expression(&mut self, it: &AwaitExpression<'a>) {
        self.push(HazardKind::Await, it.span);
        walk::walk_await_expression(self, it);
    }

    fn visit_yield_expression(&mut self, it: &YieldExpression<'a>) {
        self.push(HazardKind::Yield, it.span);
        walk::walk_yield_expression(self, it);
    }

    fn visit_function(&mut self, _it: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &ArrowFunctionExpression<'a>) {}

    fn visit_class(&mut self, _it: &Class<'a>) {}
}

// ═══════════════════════════════════════════════════════════════════════════════
// COMPLETION
// ═══════════════════════════════════════════════════════════════════════════════

/// False only when the list certainly ends in `return` or `throw` on every path.
pub fn can_complete_normally(statements: &[Statement]) -> bool {
    match statements.last() {
        None => true,
        Some(last) => statement_completes(last),
    }
}

fn statement_completes(stmt: &Statement) -> bool {
    match stmt {
        Statement::ReturnStatement(_) | Statement::ThrowStatement(_) => false,
        Statement::BlockStatement(block) => can_complete_normally(&block.body),
        Statement::IfStatement(if_stmt) => match &if_stmt.alternate {
            Some(alternate) => {
                statement_completes(&if_stmt.consequent) || statement_completes(alternate)
            }
            None => true,
        },
        Statement::TryStatement(try_stmt) => {
            let finalizer_exits = try_stmt
                .finalizer
                .as_ref()
                .is_some_and(|f| !can_complete_normally(&f.body));
            if finalizer_exits {
                return false;
            }
            can_complete_normally(&try_stmt.block.body)
                || try_stmt
                    .handler
                    .as_ref()
                    .is_some_and(|h| can_complete_normally(&h.body.body))
        }
        // Cases fall through into the last one, so only it decides, unless a
        // `break` leaves the switch early.
        Statement::SwitchStatement(switch) => {
            let has_default = switch.cases.iter().any(|c| c.test.is_none());
            let last_exits = switch
                .cases
                .last()
                .is_some_and(|c| !can_complete_normally(&c.consequent));
            !(has_default && last_exits)
                || switch.cases.iter().any(|c| breaks_out(&c.consequent))
        }
        Statement::WhileStatement(while_stmt) => {
            !is_true(&while_stmt.test) || breaks_out(std::slice::from_ref(&while_stmt.body))
        }
        Statement::ForStatement(for_stmt) => {
            for_stmt.test.as_ref().is_some_and(|t| !is_true(t))
                || breaks_out(std::slice::from_ref(&for_stmt.body))
        }
        _ => true,
    }
}

fn is_true(expr: &Expression) -> bool {
    matches!(expr, Expression::BooleanLiteral(b) if b.value)
}

/// True when a `break` in `statements` targets something outside them.
fn breaks_out(statements: &[Statement]) -> bool {
    arm_hazards(statements)
        .iter()
        .any(|h| h.kind == HazardKind::Break)
}

/// True when some `return` of this function (not of a nested one) carries a value.
pub fn returns_value(statements: &[Statement]) -> bool {
    let mut finder = ValueReturnFinder::default();
    for stmt in statements {
        finder.visit_statement(stmt);
    }
    finder.found
}

#[derive(Default)]
struct ValueReturnFinder {
    found: bool,
}

impl<'a> Visit<'a> for ValueReturnFinder {
    fn visit_return_statement(&mut self, it: &ReturnStatement<'a>) {
        if it.argument.is_some() {
            self.found = true;
        }
    }

    fn visit_function(&mut self, _it: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &ArrowFunctionExpression<'a>) {}

    fn visit_class(&mut self, _it: &Class<'a>) {}
}
