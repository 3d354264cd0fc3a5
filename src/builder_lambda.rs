//! Call resolution and builder-lambda nesting.
//!
//! A call is threaded when its callee resolves to a memo target. The same
//! resolution decides which arguments are builder lambdas: closures that become
//! nested memo scopes one level below the call's own scope. Each nested lambda
//! is named after the call site that receives it, so its identity is as stable
//! as the call site's.

use crate::callgraph::{MemoMode, MemoNode};
use crate::identity::nested_lambda_name;
use crate::options::PrimitiveKind;
use crate::scope::{render_callee, Binding};
use crate::threader::{FunctionParts, MemoTransformer};
use oxc_ast::ast::*;
use oxc_ast_visit::VisitMut;
use tracing::trace;

/// How to rewrite one resolved call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPlan {
    /// Rendered callee, for logging.
    pub label: String,
    /// Argument indices (before threading) that hold builder lambdas.
    pub closures: Vec<usize>,
    /// False under a condition scope, whose closure already holds the reified chain.
    pub reify_closures: bool,
}

impl CallPlan {
    fn new(label: String, closures: Vec<usize>) -> Self {
        CallPlan {
            label,
            closures,
            reify_closures: true,
        }
    }

    fn for_node(label: String, node: &MemoNode) -> Option<Self> {
        if node.mode == MemoMode::Entry {
            trace!(callee = %label, "call to memo entry receives explicit context");
            return None;
        }
        Some(CallPlan::new(label, node.parameters.memo_indices()))
    }
}

/// Start of `argument` when it is a closure literal.
fn closure_start(argument: &Argument) -> Option<u32> {
    match argument {
        Argument::ArrowFunctionExpression(arrow) => Some(arrow.span.start),
        Argument::FunctionExpression(func) => Some(func.span.start),
        _ => None,
    }
}

impl<'t, 'a, 'o> MemoTransformer<'t, 'a, 'o> {
    /// Resolves the target of `call`, honouring lexical shadowing first.
    pub(crate) fn resolve_call(&self, call: &CallExpression<'a>) -> Option<CallPlan> {
        let arity = call.arguments.len();
        match &call.callee {
            Expression::Identifier(id) => {
                let name = id.name.as_str();
                match self.scopes.lookup(name) {
                    Some(binding) if binding.is_memo_callable() => {
                        return Some(CallPlan::new(name.to_string(), Vec::new()));
                    }
                    Some(_) => return None,
                    None => {}
                }
                if let Some(node) = self.graph.function(name) {
                    return CallPlan::for_node(name.to_string(), node);
                }
            }
            // Only `this` resolves to class members. Other receivers are reached
            // through the primitive table or the external list.
            Expression::StaticMemberExpression(member)
                if matches!(member.object, Expression::ThisExpression(_)) =>
            {
                let method = member.property.name.as_str();
                let node = self
                    .classes
                    .last()
                    .and_then(|owner| self.graph.inherited_member(owner, method));
                if let Some(node) = node {
                    let label = render_callee(&call.callee).unwrap_or_else(|| method.to_string());
                    return CallPlan::for_node(label, node);
                }
            }
            _ => {}
        }

        let rendered = render_callee(&call.callee)?;
        let names = &self.options.runtime;
        if let Some(primitive) = self.options.find_primitive(&rendered, arity) {
            let mut plan = CallPlan::new(rendered, primitive.closure_indices(arity));
            plan.reify_closures = primitive.kind != PrimitiveKind::ConditionScope;
            return Some(plan);
        }
        if self.options.is_external_memo(&rendered) {
            return Some(CallPlan::new(rendered, Vec::new()));
        }
        if rendered == names.condition_scope || rendered == names.condition_branch {
            let reify = rendered == names.condition_branch;
            let mut plan = CallPlan::new(rendered, vec![0]);
            plan.reify_closures = reify;
            return Some(plan);
        }
        None
    }

    /// Threads `call` under the current scope: assigns its ordinal, rewrites
    /// callee and arguments, nests builder lambdas and prepends context and
    /// identity.
    pub(crate) fn thread_call(&mut self, call: &mut CallExpression<'a>, plan: CallPlan) {
        let Some(tracker) = self.current_tracker() else {
            return;
        };
        let ordinal = tracker.next_call_site();
        let parent = tracker.qualified_name().to_string();
        let offset = self.ids.call_site(&parent, ordinal);
        trace!(callee = %plan.label, ordinal, offset = offset.0, "threading call site");

        self.visit_expression(&mut call.callee);
        for (index, argument) in call.arguments.iter_mut().enumerate() {
            let marked = closure_start(argument)
                .is_some_and(|start| self.annotations.at(start).is_memo_like());
            if plan.closures.contains(&index) || marked {
                let name = nested_lambda_name(&parent, ordinal, index);
                self.transform_builder_lambda(argument, name, plan.reify_closures);
            } else {
                self.visit_argument(argument);
            }
        }

        let context = self.factory.context_argument();
        let identity = self.factory.identity_argument(offset);
        let Some(identity) = self.record(identity) else {
            return;
        };
        call.arguments.insert(0, context);
        call.arguments.insert(1, identity);
        self.stats.threaded_call_sites += 1;
        self.touched = true;
    }

    /// Turns a closure argument into a nested memo scope. Anything else at a
    /// declared closure position is visited as a plain argument.
    fn transform_builder_lambda(&mut self, argument: &mut Argument<'a>, name: String, reify: bool) {
        match argument {
            Argument::ArrowFunctionExpression(arrow) => {
                let start = Some(arrow.span.start);
                let signature = self.lambda_signature(name, &arrow.params, start, reify);
                self.transform_memo_function(FunctionParts::Arrow(arrow), signature);
            }
            Argument::FunctionExpression(func) => {
                let signature = self.lambda_signature(name, &func.params, None, reify);
                self.transform_memo_function(FunctionParts::Function(func), signature);
            }
            _ => self.visit_argument(argument),
        }
    }
}
