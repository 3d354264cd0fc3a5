//! Reification of `if` chains and `switch` statements, checked on printed output.

#[cfg(test)]
mod tests {
    use crate::codegen::print;
    use crate::factory::MemoFactory;
    use crate::options::{EarlyExitPolicy, RuntimeNames};
    use crate::reify::Reifier;
    use crate::validate::{INV_BRANCH_VAR, INV_EARLY_EXIT};
    use oxc_allocator::Allocator;
    use oxc_ast::ast::Statement;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    struct Reified {
        code: String,
        errors: Vec<String>,
        chains: usize,
    }

    fn squash(code: &str) -> String {
        code.chars().filter(|c| !c.is_whitespace()).collect()
    }

    /// Reifies the body of the first function in `source` and prints the file.
    fn reify(source: &str, policy: EarlyExitPolicy) -> Reified {
        let allocator = Allocator::default();
        let names = RuntimeNames::default();
        let factory = MemoFactory::new(&allocator, &names);
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
        let mut program = ret.program;

        let mut reifier = Reifier::new(&factory, policy, source, "t.ts");
        let Statement::FunctionDeclaration(func) = &mut program.body[0] else {
            panic!("expected a function");
        };
        let body = func.body.as_mut().unwrap();
        reifier.reify_statements(&mut body.statements).unwrap();
        let errors = reifier.errors.iter().map(|e| e.code.clone()).collect();
        let chains = reifier.reified;
        Reified {
            code: squash(&print(&mut program)),
            errors,
            chains,
        }
    }

    #[test]
    fn test_if_else_becomes_condition_scope() {
        let out = reify(
            "function f(cond) { if (cond) { a(); } else { b(); } }",
            EarlyExitPolicy::Reject,
        );
        assert!(out.errors.is_empty());
        assert_eq!(out.chains, 1);
        assert!(out.code.contains(
            "ConditionScope(()=>{if(cond){ConditionBranch(()=>{a();});}else{ConditionBranch(()=>{b();});}});"
        ));
    }

    #[test]
    fn test_guards_are_evaluated_once_and_in_order() {
        let out = reify(
            "function f(x) { before(); if (first(x)) { a(); } else if (second(x)) { b(); } else { c(); } after(); }",
            EarlyExitPolicy::Reject,
        );
        let code = &out.code;
        assert_eq!(code.matches("first(x)").count(), 1);
        assert_eq!(code.matches("second(x)").count(), 1);
        let order = ["before()", "first(x)", "a()", "second(x)", "b()", "c()", "after()"];
        let positions: Vec<usize> = order.iter().map(|s| code.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{}", code);
        assert_eq!(code.matches("ConditionBranch(").count(), 3);
        assert_eq!(code.matches("ConditionScope(").count(), 1);
    }

    #[test]
    fn test_single_statement_arm_and_missing_else() {
        let out = reify("function f(c) { if (c) a(); }", EarlyExitPolicy::Reject);
        assert!(out
            .code
            .contains("ConditionScope(()=>{if(c){ConditionBranch(()=>{a();});}});"));
    }

    #[test]
    fn test_nested_blocks_are_searched() {
        let out = reify(
            "function f(c, d) { { if (c) { a(); } } for (const x of xs) { if (d) { b(); } } }",
            EarlyExitPolicy::Reject,
        );
        // only plain blocks are structural positions; the loop body is left alone
        assert_eq!(out.chains, 1);
        assert!(out.code.contains("if(d){b();}"));
    }

    #[test]
    fn test_switch_arms_split_at_break() {
        let out = reify(
            "function f(k) { switch (k) { case 1: a(); break; case 2: case 3: b(); c(); break; default: d(); } }",
            EarlyExitPolicy::Reject,
        );
        assert!(out.errors.is_empty());
        assert_eq!(out.chains, 1);
        assert!(out.code.contains("case1:ConditionBranch(()=>{a();});break;"), "{}", out.code);
        assert!(out.code.contains("case2:case3:ConditionBranch(()=>{b();c();});break;"));
        assert!(out.code.contains("default:ConditionBranch(()=>{d();});"));
        assert!(out.code.starts_with("functionf(k){ConditionScope(()=>{switch(k){"));
    }

    #[test]
    fn test_early_exit_is_rejected() {
        let out = reify(
            "function f(c) { if (c) { return 1; } return 2; }",
            EarlyExitPolicy::Reject,
        );
        assert_eq!(out.errors, vec![INV_EARLY_EXIT.to_string()]);
        assert_eq!(out.chains, 0);
        assert!(!out.code.contains("ConditionScope"));
    }

    #[test]
    fn test_early_exit_left_untouched() {
        let out = reify(
            "function f(c) { if (c) { return 1; } if (c) { a(); } }",
            EarlyExitPolicy::LeaveUntouched,
        );
        assert!(out.errors.is_empty());
        // the escaping chain stays as written, the next one is still reified
        assert_eq!(out.chains, 1);
        assert!(out.code.contains("functionf(c){if(c){return1;}ConditionScope("));
        assert!(out.code.contains("ConditionBranch(()=>{a();})"));
    }

    #[test]
    fn test_var_is_rejected_under_either_policy() {
        for policy in [EarlyExitPolicy::Reject, EarlyExitPolicy::LeaveUntouched] {
            let out = reify("function f(c) { if (c) { var y = 1; } }", policy);
            assert_eq!(out.errors, vec![INV_BRANCH_VAR.to_string()]);
        }
    }

    #[test]
    fn test_break_inside_switch_arm_loop_is_safe() {
        let out = reify(
            "function f(k, xs) { switch (k) { case 1: for (const x of xs) { break; } break; } }",
            EarlyExitPolicy::Reject,
        );
        assert!(out.errors.is_empty());
        assert!(out
            .code
            .contains("case1:ConditionBranch(()=>{for(constxofxs){break;}});break;"));
    }
}
