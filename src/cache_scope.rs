//! Cache-scope wrapping of a memo body.
//!
//! ```text
//! const __memo_scope = __memo_context.scope<T>(__memo_id + OFF, K);
//! const __memo_parameter_p = __memo_scope.param(0, p);
//! if (__memo_scope.unchanged) return __memo_scope.cached;
//! ...original statements, every return committing through recache...
//! ```

use crate::control_flow::can_complete_normally;
use crate::factory::{MemoFactory, ReturnKind};
use crate::identity::ScopeOffset;
use crate::validate::{TransformError, TransformOutcome};
use oxc_ast::ast::*;
use oxc_ast_visit::walk_mut::walk_statement;
use oxc_ast_visit::VisitMut;
use oxc_syntax::scope::ScopeFlags;

pub struct ScopePlan<'p> {
    pub offset: ScopeOffset,
    pub return_kind: ReturnKind,
    /// `(slot, name)` of every registered parameter, in slot order.
    pub registered: Vec<(usize, &'p str)>,
}

/// Wraps `body` in place. Nested functions must already be rewritten; their
/// returns are left alone.
pub fn wrap_body<'a>(
    factory: &MemoFactory<'a, '_>,
    body: &mut FunctionBody<'a>,
    plan: &ScopePlan,
) -> TransformOutcome<()> {
    let mut rewriter = ReturnRewriter {
        factory,
        error: None,
    };
    for stmt in body.statements.iter_mut() {
        rewriter.visit_statement(stmt);
    }
    if let Some(error) = rewriter.error {
        return Err(error);
    }

    let falls_through = can_complete_normally(&body.statements);
    let original = std::mem::replace(&mut body.statements, factory.ast.vec());
    let mut statements = factory.scope_preamble(plan.offset, &plan.return_kind, &plan.registered)?;
    for stmt in original {
        statements.push(stmt);
    }
    if falls_through {
        statements.push(factory.void_commit()?);
    }
    body.statements = statements;
    Ok(())
}

/// Rewrites the returns that belong to the function being wrapped.
struct ReturnRewriter<'f, 'a, 'o> {
    factory: &'f MemoFactory<'a, 'o>,
    error: Option<TransformError>,
}

impl<'f, 'a, 'o> ReturnRewriter<'f, 'a, 'o> {
    fn commit(&self, stmt: &mut Statement<'a>) -> TransformOutcome<()> {
        let Statement::ReturnStatement(ret) = stmt else {
            return Ok(());
        };
        *stmt = match ret.argument.take() {
            Some(value) => self.factory.value_commit(value)?,
            None => self.factory.void_commit()?,
        };
        Ok(())
    }
}

impl<'f, 'a, 'o> VisitMut<'a> for ReturnRewriter<'f, 'a, 'o> {
    fn visit_statement(&mut self, stmt: &mut Statement<'a>) {
        if matches!(stmt, Statement::ReturnStatement(_)) {
            if let Err(e) = self.commit(stmt) {
                self.error.get_or_insert(e);
            }
            return;
        }
        walk_statement(self, stmt);
    }

    fn visit_function(&mut self, _it: &mut Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &mut ArrowFunctionExpression<'a>) {}

    fn visit_class(&mut self, _it: &mut Class<'a>) {}
}
