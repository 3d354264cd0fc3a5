#[cfg(test)]
mod tests {
    use crate::annotations::{decorator_marker, decorator_markers, AnnotationIndex, MemoMarkers};
    use oxc_allocator::Allocator;
    use oxc_ast::ast::{ClassElement, Statement};
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn index_for(source: &str) -> AnnotationIndex {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
        AnnotationIndex::from_comments(source, &ret.program.comments)
    }

    #[test]
    fn test_marker_parsing() {
        assert!(MemoMarkers::parse("/** @memo */").memo);
        assert!(MemoMarkers::parse("/* @Memo */").memo);

        let skip = MemoMarkers::parse("/* @memo_skip */");
        assert!(skip.skip);
        assert!(!skip.memo);
        assert!(!skip.is_memo_like());

        let both = MemoMarkers::parse("/** @memo_intrinsic\n * @memo_entry */");
        assert!(both.intrinsic && both.entry);
        assert!(both.is_memo_like());

        assert!(MemoMarkers::parse("/* @memoize */").is_empty());
        assert!(MemoMarkers::parse("// just a comment").is_empty());
    }

    #[test]
    fn test_index_keys_following_node() {
        let source = "/** @memo */\nfunction foo() {}\nfunction bar() {}\n";
        let index = index_for(source);
        let foo = source.find("function foo").unwrap() as u32;
        let bar = source.find("function bar").unwrap() as u32;
        assert!(index.at(foo).memo);
        assert!(index.at(bar).is_empty());
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_index_looks_through_export() {
        let source = "/** @memo */\nexport default function foo() {}\n";
        let index = index_for(source);
        let export = source.find("export").unwrap() as u32;
        let function = source.find("function").unwrap() as u32;
        assert!(index.at(export).memo);
        assert!(index.at(function).memo);
    }

    #[test]
    fn test_parameter_comment_markers() {
        let source = "function f(/* @memo_skip */ a: number, /** @memo */ b: () => void) {}";
        let index = index_for(source);
        let a = source.find("a: number").unwrap() as u32;
        let b = source.find("b: ()").unwrap() as u32;
        assert!(index.at(a).skip);
        assert!(index.at(b).memo);
    }

    #[test]
    fn test_unrelated_comments_are_not_indexed() {
        let index = index_for("// setup\nconst a = 1; /* trailing */\n");
        assert_eq!(index.len(), 0);
    }

    #[test]
    fn test_decorator_markers() {
        let source = "class A {\n  @memo() build() {}\n  @memo_intrinsic @Other run() {}\n  @Other x = 1;\n}";
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
        let Statement::ClassDeclaration(class) = &ret.program.body[0] else {
            panic!("expected a class");
        };

        let ClassElement::MethodDefinition(build) = &class.body.body[0] else {
            panic!("expected a method");
        };
        assert!(decorator_marker(&build.decorators[0]).unwrap().memo);

        let ClassElement::MethodDefinition(run) = &class.body.body[1] else {
            panic!("expected a method");
        };
        let merged = decorator_markers(&run.decorators);
        assert!(merged.intrinsic);
        assert!(!merged.memo);
        assert!(decorator_marker(&run.decorators[1]).is_none());

        let ClassElement::PropertyDefinition(x) = &class.body.body[2] else {
            panic!("expected a property");
        };
        assert!(decorator_markers(&x.decorators).is_empty());
    }
}
