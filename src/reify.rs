//! Control-flow reification.
//!
//! An `if`/`else if`/`else` chain at a structural position of a memo body
//! becomes
//!
//! ```text
//! ConditionScope(() => {
//!     if (a) { ConditionBranch(() => { ...arm 1... }); }
//!     else { ConditionBranch(() => { ...arm 2... }); }
//! });
//! ```
//!
//! Guards stay where they were, so they are evaluated in the same order as
//! before. A `switch` is handled the same way with one branch per non-empty
//! case. The closures produced here carry no context or identity yet; they are
//! plain calls to the condition primitives and get threaded like any other
//! builder call.

use crate::control_flow::{arm_hazards, shared_case_bindings, Hazard, HazardKind};
use crate::factory::MemoFactory;
use crate::options::EarlyExitPolicy;
use crate::validate::{
    CompilerError, SourceLocation, TransformOutcome, INV_BRANCH_SUSPEND, INV_BRANCH_VAR,
    INV_EARLY_EXIT,
};
use oxc_allocator::Vec as oxc_vec;
use oxc_ast::ast::*;
use tracing::{debug, warn};

pub struct Reifier<'r, 'a, 'o> {
    factory: &'r MemoFactory<'a, 'o>,
    policy: EarlyExitPolicy,
    source: &'r str,
    file: &'r str,
    pub errors: Vec<CompilerError>,
    pub reified: usize,
}

impl<'r, 'a, 'o> Reifier<'r, 'a, 'o> {
    pub fn new(
        factory: &'r MemoFactory<'a, 'o>,
        policy: EarlyExitPolicy,
        source: &'r str,
        file: &'r str,
    ) -> Self {
        Self {
            factory,
            policy,
            source,
            file,
            errors: Vec::new(),
            reified: 0,
        }
    }

    /// Reifies every chain in `statements` and in nested plain blocks.
    pub fn reify_statements(
        &mut self,
        statements: &mut oxc_vec<'a, Statement<'a>>,
    ) -> TransformOutcome<()> {
        for stmt in statements.iter_mut() {
            self.reify_statement(stmt)?;
        }
        Ok(())
    }

    fn reify_statement(&mut self, stmt: &mut Statement<'a>) -> TransformOutcome<()> {
        match stmt {
            Statement::BlockStatement(block) => self.reify_statements(&mut block.body),
            Statement::IfStatement(if_stmt) => {
                let mut hazards = Vec::new();
                collect_chain_hazards(if_stmt, &mut hazards);
                if self.accept(&hazards, "if") {
                    let owned = std::mem::replace(stmt, self.factory.hole());
                    *stmt = self.reify_if(owned)?;
                }
                Ok(())
            }
            Statement::SwitchStatement(switch) => {
                let cases: Vec<_> = switch
                    .cases
                    .iter()
                    .map(|case| split_case(&case.consequent))
                    .collect();
                let mut hazards = Vec::new();
                for (arm, _) in &cases {
                    hazards.extend(arm_hazards(arm));
                }
                hazards.extend(shared_case_bindings(&cases));
                hazards.sort_by_key(|h| h.span.start);
                if self.accept(&hazards, "switch") {
                    let owned = std::mem::replace(stmt, self.factory.hole());
                    *stmt = self.reify_switch(owned)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Decides whether a chain with `hazards` may be reified, reporting per policy.
    /// Under the lenient policy only jumps are tolerated, so a non-jump hazard
    /// is reported even when a jump comes first.
    fn accept(&mut self, hazards: &[Hazard], construct: &str) -> bool {
        let reported = match self.policy {
            EarlyExitPolicy::Reject => hazards.first(),
            EarlyExitPolicy::LeaveUntouched => hazards
                .iter()
                .find(|h| !h.kind.is_jump())
                .or(hazards.first()),
        };
        let Some(first) = reported else {
            return true;
        };
        let location = SourceLocation::from_offset(self.source, first.span.start);
        if !first.kind.is_jump() || self.policy == EarlyExitPolicy::Reject {
            self.errors.push(self.hazard_error(first, construct, location));
            return false;
        }
        warn!(
            file = self.file,
            line = location.line,
            "`{}` escapes a conditional arm; `{}` left un-reified",
            first.kind.keyword(),
            construct
        );
        false
    }

    fn hazard_error(
        &self,
        hazard: &Hazard,
        construct: &str,
        location: SourceLocation,
    ) -> CompilerError {
        let keyword = hazard.kind.keyword();
        match hazard.kind {
            HazardKind::Var => CompilerError::at(
                INV_BRANCH_VAR,
                &format!("`var` declaration inside a conditional arm of `{}`", construct),
                self.file,
                location,
            )
            .with_hint("Use `let` or `const`; the arm body runs inside a closure."),
            HazardKind::CaseBinding => CompilerError::at(
                INV_BRANCH_VAR,
                &format!(
                    "declaration in one case of `{}` is referenced outside that case",
                    construct
                ),
                self.file,
                location,
            )
            .with_hint(
                "Declare the binding before the `switch`; each case body runs inside a closure.",
            ),
            HazardKind::Await | HazardKind::Yield => CompilerError::at(
                INV_BRANCH_SUSPEND,
                &format!("`{}` inside a conditional arm of `{}`", keyword, construct),
                self.file,
                location,
            )
            .with_hint("Move the suspension point before the conditional."),
            _ => CompilerError::at(
                INV_EARLY_EXIT,
                &format!(
                    "`{}` leaves a conditional arm of `{}`; \
                     its target cannot be proven to lie inside the arm",
                    keyword, construct
                ),
                self.file,
                location,
            )
            .with_hint(
                "Restructure the branch so control reaches its end, \
                 or set earlyExitPolicy to \"leave-untouched\".",
            ),
        }
    }

    fn reify_if(&mut self, stmt: Statement<'a>) -> TransformOutcome<Statement<'a>> {
        let mut stmt = stmt;
        if let Statement::IfStatement(if_stmt) = &mut stmt {
            self.branch_arms(if_stmt)?;
        }
        self.reified += 1;
        debug!(file = self.file, "reified if/else chain");
        let mut body = self.factory.ast.vec();
        body.push(stmt);
        let callee = self.factory.names().condition_scope.clone();
        self.factory.closure_call_statement(&callee, body)
    }

    fn branch_arms(&mut self, if_stmt: &mut IfStatement<'a>) -> TransformOutcome<()> {
        self.branch_slot(&mut if_stmt.consequent)?;
        match &mut if_stmt.alternate {
            Some(Statement::IfStatement(else_if)) => self.branch_arms(else_if),
            Some(alternate) => self.branch_slot(alternate),
            None => Ok(()),
        }
    }

    /// Replaces an arm with `{ ConditionBranch(() => { ...arm... }); }`.
    fn branch_slot(&mut self, slot: &mut Statement<'a>) -> TransformOutcome<()> {
        let arm = std::mem::replace(slot, self.factory.hole());
        let statements = match arm {
            Statement::BlockStatement(mut block) => {
                std::mem::replace(&mut block.body, self.factory.ast.vec())
            }
            other => {
                let mut single = self.factory.ast.vec();
                single.push(other);
                single
            }
        };
        let callee = self.factory.names().condition_branch.clone();
        let branch = self.factory.closure_call_statement(&callee, statements)?;
        let mut wrapped = self.factory.ast.vec();
        wrapped.push(branch);
        *slot = self.factory.block(wrapped)?;
        Ok(())
    }

    fn reify_switch(&mut self, stmt: Statement<'a>) -> TransformOutcome<Statement<'a>> {
        let mut stmt = stmt;
        if let Statement::SwitchStatement(switch) = &mut stmt {
            let callee = self.factory.names().condition_branch.clone();
            for case in switch.cases.iter_mut() {
                let arm_len = split_case(&case.consequent).0.len();
                if arm_len == 0 {
                    continue;
                }
                let old = std::mem::replace(&mut case.consequent, self.factory.ast.vec());
                let mut arm = self.factory.ast.vec();
                let mut rest = self.factory.ast.vec();
                for (i, s) in old.into_iter().enumerate() {
                    if i < arm_len {
                        arm.push(s);
                    } else {
                        rest.push(s);
                    }
                }
                case.consequent.push(self.factory.closure_call_statement(&callee, arm)?);
                for s in rest {
                    case.consequent.push(s);
                }
            }
        }
        self.reified += 1;
        debug!(file = self.file, "reified switch");
        let mut body = self.factory.ast.vec();
        body.push(stmt);
        let callee = self.factory.names().condition_scope.clone();
        self.factory.closure_call_statement(&callee, body)
    }
}

/// Hazards of every arm of an `if` chain.
fn collect_chain_hazards(if_stmt: &IfStatement, out: &mut Vec<Hazard>) {
    out.extend(arm_hazards(std::slice::from_ref(&if_stmt.consequent)));
    match &if_stmt.alternate {
        Some(Statement::IfStatement(else_if)) => collect_chain_hazards(else_if, out),
        Some(other) => out.extend(arm_hazards(std::slice::from_ref(other))),
        None => {}
    }
}

/// Splits a case body at its first top-level unlabelled `break`. The branch
/// takes the statements before it; the `break` and anything after stay in the
/// case, where they still target the `switch`.
fn split_case<'s, 'a>(
    consequent: &'s [Statement<'a>],
) -> (&'s [Statement<'a>], &'s [Statement<'a>]) {
    let at = consequent
        .iter()
        .position(|s| matches!(s, Statement::BreakStatement(b) if b.label.is_none()))
        .unwrap_or(consequent.len());
    consequent.split_at(at)
}
