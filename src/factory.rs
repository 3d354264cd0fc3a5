//! Construction of generated code.
//!
//! Runtime glue is written as source text and parsed into the file's arena,
//! then user nodes are spliced into the parsed shapes. Generated nodes keep
//! the snippet's spans, which are meaningless for the file; the emitter drops
//! comments so no attachment is attempted against them.

use crate::identity::ScopeOffset;
use crate::options::RuntimeNames;
use crate::validate::{TransformError, TransformOutcome};
use oxc_allocator::{Allocator, Box as oxc_box, Vec as oxc_vec};
use oxc_ast::ast::*;
use oxc_ast::AstBuilder;
use oxc_parser::Parser;
use oxc_span::{SourceType, Span, SPAN};

/// Return shape of a cache scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnKind {
    /// No value is cached; emitted as `scope<undefined>`.
    Void,
    /// Declared return type, emitted as the type argument.
    Typed(String),
    /// Value-returning body without an annotation; no type argument.
    Inferred,
}

impl ReturnKind {
    pub fn from_annotation(text: Option<&str>, returns_value: bool) -> Self {
        match text.map(str::trim) {
            Some("void") | Some("undefined") => ReturnKind::Void,
            Some(t) if !t.is_empty() => ReturnKind::Typed(t.to_string()),
            _ if returns_value => ReturnKind::Inferred,
            _ => ReturnKind::Void,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ReturnKind::Void)
    }

    fn type_arguments(&self) -> String {
        match self {
            ReturnKind::Void => "<undefined>".to_string(),
            ReturnKind::Typed(t) => format!("<{}>", t),
            ReturnKind::Inferred => String::new(),
        }
    }
}

pub struct MemoFactory<'a, 'o> {
    pub ast: AstBuilder<'a>,
    pub allocator: &'a Allocator,
    names: &'o RuntimeNames,
}

impl<'a, 'o> MemoFactory<'a, 'o> {
    pub fn new(allocator: &'a Allocator, names: &'o RuntimeNames) -> Self {
        Self {
            ast: AstBuilder::new(allocator),
            allocator,
            names,
        }
    }

    pub fn names(&self) -> &RuntimeNames {
        self.names
    }

    fn source_type() -> SourceType {
        SourceType::default()
            .with_typescript(true)
            .with_module(true)
    }

    fn snippet_error(text: &str, reason: String) -> TransformError {
        TransformError::Snippet {
            snippet: text.to_string(),
            reason,
        }
    }

    /// Parses `text` as the body of a throwaway function and returns its statements.
    pub fn statements(&self, text: &str) -> TransformOutcome<oxc_vec<'a, Statement<'a>>> {
        let mut function = self.function_snippet("", text)?;
        match function.body.as_mut() {
            Some(body) => Ok(std::mem::replace(&mut body.statements, self.ast.vec())),
            None => Err(Self::snippet_error(text, "missing function body".to_string())),
        }
    }

    pub fn statement(&self, text: &str) -> TransformOutcome<Statement<'a>> {
        let mut statements = self.statements(text)?;
        match statements.pop() {
            Some(stmt) if statements.is_empty() => Ok(stmt),
            _ => Err(Self::snippet_error(text, "expected a single statement".to_string())),
        }
    }

    /// Parses `text` as module-level items (imports, declarations).
    pub fn module_items(&self, text: &str) -> TransformOutcome<oxc_vec<'a, Statement<'a>>> {
        let source = self.allocator.alloc_str(text);
        let ret = Parser::new(self.allocator, source, Self::source_type()).parse();
        if !ret.errors.is_empty() {
            return Err(Self::snippet_error(text, format!("{:?}", ret.errors)));
        }
        Ok(ret.program.body)
    }

    pub fn expression(&self, text: &str) -> TransformOutcome<Expression<'a>> {
        let source = self.allocator.alloc_str(text);
        Parser::new(self.allocator, source, Self::source_type())
            .parse_expression()
            .map_err(|errors| Self::snippet_error(text, format!("{:?}", errors)))
    }

    fn function_snippet(
        &self,
        params: &str,
        body: &str,
    ) -> TransformOutcome<oxc_box<'a, Function<'a>>> {
        let text = format!("function __memo_snippet({}) {{\n{}\n}}", params, body);
        let source = self.allocator.alloc_str(&text);
        let ret = Parser::new(self.allocator, source, Self::source_type()).parse();
        if !ret.errors.is_empty() {
            return Err(Self::snippet_error(&text, format!("{:?}", ret.errors)));
        }
        for stmt in ret.program.body {
            if let Statement::FunctionDeclaration(func) = stmt {
                return Ok(func);
            }
        }
        Err(Self::snippet_error(&text, "no function in snippet".to_string()))
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // THREADING
    // ═══════════════════════════════════════════════════════════════════════════

    /// `(__memo_context: __memo_context_type, __memo_id: __memo_id_type)`
    pub fn hidden_parameters(&self) -> TransformOutcome<oxc_vec<'a, FormalParameter<'a>>> {
        let n = self.names;
        let params = format!(
            "{}: {}, {}: {}",
            n.context, n.context_type, n.id, n.id_type
        );
        let mut function = self.function_snippet(&params, "")?;
        Ok(std::mem::replace(&mut function.params.items, self.ast.vec()))
    }

    pub fn context_argument(&self) -> Argument<'a> {
        let name = self.allocator.alloc_str(&self.names.context);
        Argument::from(self.ast.expression_identifier(SPAN, name))
    }

    /// `__memo_id + <offset>`
    pub fn identity_argument(&self, offset: ScopeOffset) -> TransformOutcome<Argument<'a>> {
        let text = format!("{} + {}", self.names.id, offset.literal());
        Ok(Argument::from(self.expression(&text)?))
    }

    /// `__memo_parameter_<name>.value`
    pub fn parameter_value(&self, name: &str) -> MemberExpression<'a> {
        let object = self.allocator.alloc_str(&self.names.parameter(name));
        let value = self.allocator.alloc_str(&self.names.value);
        self.ast.member_expression_static(
            SPAN,
            self.ast.expression_identifier(SPAN, object),
            self.ast.identifier_name(SPAN, value),
            false,
        )
    }

    /// `x: __memo_parameter_x.value`, or `x: __memo_parameter_x.value = init`,
    /// in place of the shorthand `x` of a destructuring assignment.
    pub fn parameter_target_property(
        &self,
        span: Span,
        name: &str,
        init: Option<Expression<'a>>,
    ) -> AssignmentTargetProperty<'a> {
        let target = AssignmentTarget::from(SimpleAssignmentTarget::from(
            self.parameter_value(name),
        ));
        let binding = match init {
            Some(init) => self
                .ast
                .assignment_target_maybe_default_assignment_target_with_default(SPAN, target, init),
            None => AssignmentTargetMaybeDefault::from(target),
        };
        let key = self
            .ast
            .property_key_static_identifier(SPAN, self.allocator.alloc_str(name));
        AssignmentTargetProperty::AssignmentTargetPropertyProperty(
            self.ast
                .alloc_assignment_target_property_property(span, key, binding, false),
        )
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE SCOPE
    // ═══════════════════════════════════════════════════════════════════════════

    /// Scope declaration, parameter registrations and the fast path, in that order.
    pub fn scope_preamble(
        &self,
        offset: ScopeOffset,
        return_kind: &ReturnKind,
        registered: &[(usize, &str)],
    ) -> TransformOutcome<oxc_vec<'a, Statement<'a>>> {
        let n = self.names;
        let mut text = format!(
            "const {scope} = {ctx}.{method}{targs}({id} + {off}, {count});\n",
            scope = n.scope,
            ctx = n.context,
            method = n.scope_method,
            targs = return_kind.type_arguments(),
            id = n.id,
            off = offset.literal(),
            count = registered.len(),
        );
        if !registered.is_empty() {
            let declarators: Vec<String> = registered
                .iter()
                .map(|(slot, name)| {
                    format!(
                        "{} = {}.{}({}, {})",
                        n.parameter(name),
                        n.scope,
                        n.param_method,
                        slot,
                        name
                    )
                })
                .collect();
            text.push_str(&format!("const {};\n", declarators.join(", ")));
        }
        if return_kind.is_void() {
            text.push_str(&format!(
                "if ({s}.{u}) {{\n{s}.{c};\nreturn;\n}}\n",
                s = n.scope,
                u = n.unchanged,
                c = n.cached
            ));
        } else {
            text.push_str(&format!(
                "if ({s}.{u}) {{\nreturn {s}.{c};\n}}\n",
                s = n.scope,
                u = n.unchanged,
                c = n.cached
            ));
        }
        self.statements(&text)
    }

    /// `{ __memo_scope.recache(); return; }`
    pub fn void_commit(&self) -> TransformOutcome<Statement<'a>> {
        let text = format!("{{\n{}.{}();\nreturn;\n}}", self.names.scope, self.names.recache);
        self.statement(&text)
    }

    /// `return __memo_scope.recache(<value>);`
    pub fn value_commit(&self, value: Expression<'a>) -> TransformOutcome<Statement<'a>> {
        let text = format!("return {}.{}();", self.names.scope, self.names.recache);
        let mut stmt = self.statement(&text)?;
        if let Statement::ReturnStatement(ret) = &mut stmt {
            if let Some(Expression::CallExpression(call)) = &mut ret.argument {
                call.arguments.push(Argument::from(value));
                return Ok(stmt);
            }
        }
        Err(Self::snippet_error(&text, "unexpected commit shape".to_string()))
    }

    /// `return <value>;`, used to give concise arrows a block body.
    pub fn return_of(&self, value: Expression<'a>) -> TransformOutcome<Statement<'a>> {
        let mut stmt = self.statement("return undefined;")?;
        if let Statement::ReturnStatement(ret) = &mut stmt {
            ret.argument = Some(value);
        }
        Ok(stmt)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONDITION PRIMITIVES
    // ═══════════════════════════════════════════════════════════════════════════

    /// `<callee>(() => { <body> });` with a closure that carries no source span.
    pub fn closure_call_statement(
        &self,
        callee: &str,
        body: oxc_vec<'a, Statement<'a>>,
    ) -> TransformOutcome<Statement<'a>> {
        let text = format!("{}(() => {{}});", callee);
        let mut stmt = self.statement(&text)?;
        if let Statement::ExpressionStatement(expr_stmt) = &mut stmt {
            if let Expression::CallExpression(call) = &mut expr_stmt.expression {
                if let Some(Argument::ArrowFunctionExpression(arrow)) = call.arguments.first_mut() {
                    arrow.span = SPAN;
                    arrow.body.statements = body;
                    return Ok(stmt);
                }
            }
        }
        Err(Self::snippet_error(&text, "unexpected closure call shape".to_string()))
    }

    /// `{ <statements> }`
    pub fn block(&self, statements: oxc_vec<'a, Statement<'a>>) -> TransformOutcome<Statement<'a>> {
        let mut stmt = self.statement("{}")?;
        if let Statement::BlockStatement(block) = &mut stmt {
            block.body = statements;
        }
        Ok(stmt)
    }

    /// Placeholder left in a slot whose node has been moved elsewhere.
    pub fn hole(&self) -> Statement<'a> {
        self.ast
            .statement_expression(SPAN, self.ast.expression_identifier(SPAN, "undefined"))
    }

    pub fn hole_expression(&self) -> Expression<'a> {
        self.ast.expression_identifier(SPAN, "undefined")
    }
}
