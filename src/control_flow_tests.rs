#[cfg(test)]
mod tests {
    use crate::control_flow::{
        arm_hazards, can_complete_normally, returns_value, shared_case_bindings, HazardKind,
    };
    use oxc_allocator::Allocator;
    use oxc_ast::ast::{Program, Statement};
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn parse<'a>(allocator: &'a Allocator, source: &'a str) -> Program<'a> {
        let ret = Parser::new(allocator, source, SourceType::ts()).parse();
        assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
        ret.program
    }

    /// Body of the first function declaration in `program`.
    fn body<'p, 'a>(program: &'p Program<'a>) -> &'p [Statement<'a>] {
        for stmt in &program.body {
            if let Statement::FunctionDeclaration(func) = stmt {
                if let Some(body) = &func.body {
                    return &body.statements;
                }
            }
        }
        panic!("no function body");
    }

    /// Hazards of the consequent of the first `if` in the first function.
    fn if_arm_hazards(source: &str) -> Vec<HazardKind> {
        let allocator = Allocator::default();
        let program = parse(&allocator, source);
        let stmts = body(&program);
        let Some(Statement::IfStatement(if_stmt)) =
            stmts.iter().find(|s| matches!(s, Statement::IfStatement(_)))
        else {
            panic!("no if statement");
        };
        arm_hazards(std::slice::from_ref(&if_stmt.consequent))
            .into_iter()
            .map(|h| h.kind)
            .collect()
    }

    #[test]
    fn test_plain_arm_has_no_hazards() {
        assert!(if_arm_hazards("function f(c) { if (c) { a(); const x = 1; b(x); } }").is_empty());
    }

    #[test]
    fn test_return_escapes() {
        assert_eq!(
            if_arm_hazards("function f(c) { if (c) { return 1; } }"),
            vec![HazardKind::Return]
        );
    }

    #[test]
    fn test_loop_local_jumps_are_safe() {
        let source = "function f(c, xs) { if (c) { for (const x of xs) { if (x) break; continue; } while (c) { break; } } }";
        assert!(if_arm_hazards(source).is_empty());
    }

    #[test]
    fn test_break_out_of_enclosing_loop_escapes() {
        let source = "function f(c, xs) { for (const x of xs) { if (c) { break; } } }";
        let allocator = Allocator::default();
        let program = parse(&allocator, source);
        let Statement::ForOfStatement(for_of) = &body(&program)[0] else {
            panic!("expected for-of");
        };
        let Statement::BlockStatement(block) = &for_of.body else {
            panic!("expected block");
        };
        let Statement::IfStatement(if_stmt) = &block.body[0] else {
            panic!("expected if");
        };
        let hazards = arm_hazards(std::slice::from_ref(&if_stmt.consequent));
        assert_eq!(hazards.len(), 1);
        assert_eq!(hazards[0].kind, HazardKind::Break);
    }

    #[test]
    fn test_labels() {
        // label declared inside the arm: safe
        let inner = "function f(c, xs) { if (c) { outer: for (const x of xs) { for (;;) { continue outer; } } } }";
        assert!(if_arm_hazards(inner).is_empty());

        // labelled block: `break` is fine, `continue` cannot target it
        let block = "function f(c) { if (c) { done: { break done; } } }";
        assert!(if_arm_hazards(block).is_empty());
    }

    #[test]
    fn test_nested_functions_are_opaque() {
        let source = "function f(c) { if (c) { run(() => { return 1; }); function g() { var y = 2; return y; } } }";
        assert!(if_arm_hazards(source).is_empty());
    }

    #[test]
    fn test_var_and_suspension() {
        assert_eq!(
            if_arm_hazards("function f(c) { if (c) { var y = 1; } }"),
            vec![HazardKind::Var]
        );
        let allocator = Allocator::default();
        let source = "async function f(c) { if (c) { await load(); } }";
        let program = parse(&allocator, source);
        let Statement::IfStatement(if_stmt) = &body(&program)[0] else {
            panic!("expected if");
        };
        let kinds: Vec<HazardKind> = arm_hazards(std::slice::from_ref(&if_stmt.consequent))
            .into_iter()
            .map(|h| h.kind)
            .collect();
        assert_eq!(kinds, vec![HazardKind::Await]);
        assert!(HazardKind::Return.is_jump());
        assert!(!HazardKind::Await.is_jump());
        assert_eq!(HazardKind::Yield.keyword(), "yield");
    }

    #[test]
    fn test_completion() {
        let cases = [
            ("function f() {}", true),
            ("function f() { a(); }", true),
            ("function f() { return 1; }", false),
            ("function f() { throw new Error(); }", false),
            ("function f(c) { if (c) { return 1; } }", true),
            ("function f(c) { if (c) { return 1; } else { return 2; } }", false),
            ("function f(c) { if (c) { return 1; } else { a(); } }", true),
            ("function f() { { return 1; } }", false),
            ("function f() { try { return 1; } finally { a(); } }", false),
            ("function f() { try { a(); } catch (e) { return 1; } }", true),
            ("function f() { try { return 1; } catch (e) { return 2; } }", false),
            ("function f() { try { a(); } finally { return 1; } }", false),
            ("function f(k) { switch (k) { case 1: return 1; default: return 2; } }", false),
            ("function f(k) { switch (k) { case 1: break; default: return 2; } }", true),
            ("function f(k) { switch (k) { case 1: return 1; } }", true),
            ("function f() { while (true) { a(); } }", false),
            ("function f(c) { while (true) { if (c) break; } }", true),
            ("function f(c) { while (true) { for (;;) { break; } } }", false),
            ("function f() { for (;;) { a(); } }", false),
            ("function f(c) { while (c) { a(); } }", true),
        ];
        for (source, expected) in cases {
            let allocator = Allocator::default();
            let program = parse(&allocator, source);
            assert_eq!(can_complete_normally(body(&program)), expected, "{}", source);
        }
    }

    #[test]
    fn test_returns_value_ignores_nested_functions() {
        let cases = [
            ("function f() { return; }", false),
            ("function f(c) { if (c) { return 1; } }", true),
            ("function f() { run(() => 1); const g = function () { return 2; }; }", false),
        ];
        for (source, expected) in cases {
            let allocator = Allocator::default();
            let program = parse(&allocator, source);
            assert_eq!(returns_value(body(&program)), expected, "{}", source);
        }
    }

    #[test]
    fn test_shared_case_bindings() {
        let source = "function f(k) { switch (k) { \
            case 1: let y = 1; const z = 2; use(z); \
            case 2: use(y); break; \
            case 3: class C {} \
            default: new C(); } }";
        let allocator = Allocator::default();
        let program = parse(&allocator, source);
        let Statement::SwitchStatement(switch) = &body(&program)[0] else {
            panic!("expected switch");
        };
        let cases: Vec<(&[Statement], &[Statement])> = switch
            .cases
            .iter()
            .map(|case| (&case.consequent[..], &[][..]))
            .collect();
        let hazards = shared_case_bindings(&cases);
        assert_eq!(hazards.len(), 2);
        assert!(hazards.iter().all(|h| h.kind == HazardKind::CaseBinding));
        assert!(!HazardKind::CaseBinding.is_jump());

        // declarations only the declaring case uses are not hazards
        let local = "function f(k) { switch (k) { case 1: const z = 2; use(z); break; default: b(); } }";
        let program = parse(&allocator, local);
        let Statement::SwitchStatement(switch) = &body(&program)[0] else {
            panic!("expected switch");
        };
        let cases: Vec<(&[Statement], &[Statement])> = switch
            .cases
            .iter()
            .map(|case| (&case.consequent[..], &[][..]))
            .collect();
        assert!(shared_case_bindings(&cases).is_empty());
    }
}
