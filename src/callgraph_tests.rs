#[cfg(test)]
mod tests {
    use crate::annotations::AnnotationIndex;
    use crate::callgraph::{CallGraph, MemoMode, NodeKind};
    use crate::identity::IdentitySynthesizer;
    use oxc_allocator::Allocator;
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    fn graph_for(source: &str) -> CallGraph {
        let allocator = Allocator::default();
        let ret = Parser::new(&allocator, source, SourceType::ts()).parse();
        assert!(ret.errors.is_empty(), "parse errors: {:?}", ret.errors);
        let annotations = AnnotationIndex::from_comments(source, &ret.program.comments);
        CallGraph::build(&ret.program, "app.ts", &annotations, &IdentitySynthesizer::new(32))
    }

    const PAGE: &str = r#"
/** @memo */
function header(title: string, /* @memo_skip */ onTap: () => void): void {
    Text(title);
}

/** @memo */
export function page(/** @memo */ content: () => void): void {
    header("Home", () => {});
    content();
}

/** @memo_entry */
function main(__memo_context: __memo_context_type, __memo_id: __memo_id_type) {
    page(() => {});
}

/** @memo */
const row = (label: string) => {
    Text(label);
};

function helper() {}

class Screen {
    @memo
    build(): void {
        this.body();
    }

    @memo
    body(): void {}

    @memo
    slot?: () => void;

    render() {}
}
"#;

    #[test]
    fn test_nodes_and_kinds() {
        let graph = graph_for(PAGE);
        let names: Vec<&str> = graph.nodes().iter().map(|n| n.qualified_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "app.ts::header",
                "app.ts::page",
                "app.ts::main",
                "app.ts::row",
                "app.ts::Screen.build",
                "app.ts::Screen.body",
                "app.ts::Screen.slot",
            ]
        );
        assert_eq!(graph.node("app.ts::row").unwrap().kind, NodeKind::Variable);
        assert_eq!(graph.node("app.ts::Screen.build").unwrap().kind, NodeKind::Method);
        assert_eq!(graph.node("app.ts::Screen.slot").unwrap().kind, NodeKind::Property);
        assert_eq!(graph.node("app.ts::main").unwrap().mode, MemoMode::Entry);
        assert!(graph.function("helper").is_none());
        assert!(graph.function("page").is_some());
        assert!(graph.member("Screen", "body").is_some());
        assert!(graph.inherited_member("Screen", "slot").is_some());
    }

    #[test]
    fn test_parameter_tables() {
        let graph = graph_for(PAGE);

        let header = &graph.node("app.ts::header").unwrap().parameters;
        assert_eq!(header.declared_len(), 2);
        assert_eq!(header.slot_count(), 1);
        assert_eq!(header.registered(), vec![(0, "title")]);
        assert!(header.bindings[1].skip);
        assert!(header.memo_indices().is_empty());

        let page = &graph.node("app.ts::page").unwrap().parameters;
        assert_eq!(page.memo_indices(), vec![0]);
        assert_eq!(page.registered(), vec![(0, "content")]);
    }

    #[test]
    fn test_own_offsets_are_fixed_per_declaration() {
        let first = graph_for(PAGE);
        let second = graph_for(PAGE);
        let ids = IdentitySynthesizer::new(32);
        for (a, b) in first.nodes().iter().zip(second.nodes()) {
            assert_eq!(a.own_offset, b.own_offset);
            assert_eq!(a.own_offset, ids.own_scope(&a.qualified_name));
        }
    }

    #[test]
    fn test_edges_and_reachability() {
        let graph = graph_for(PAGE);
        let page_callees: Vec<&String> = graph.callees("app.ts::page").collect();
        assert_eq!(page_callees, vec!["app.ts::header"]);
        let build_callees: Vec<&String> = graph.callees("app.ts::Screen.build").collect();
        assert_eq!(build_callees, vec!["app.ts::Screen.body"]);

        let reachable = graph.reachable_from_roots();
        assert!(reachable.contains("app.ts::main"));
        assert!(reachable.contains("app.ts::page"));
        assert!(reachable.contains("app.ts::header"));
        assert!(!reachable.contains("app.ts::row"));
        assert!(!reachable.contains("app.ts::Screen.build"));
    }

    #[test]
    fn test_without_entries_every_node_is_a_root() {
        let graph = graph_for("/** @memo */ function a() {}\n/** @memo */ function b() { a(); }\n");
        let reachable = graph.reachable_from_roots();
        assert_eq!(reachable.len(), 2);
    }

    #[test]
    fn test_recursion_terminates() {
        let source = r#"
/** @memo */
function even(n: number): void { if (n > 0) odd(n - 1); }
/** @memo */
function odd(n: number): void { if (n > 0) even(n - 1); }
/** @memo */
function tree(n: number): void { tree(n - 1); }
/** @memo */
function leaf(): void {}
"#;
        let graph = graph_for(source);
        assert!(graph.is_recursive("app.ts::even"));
        assert!(graph.is_recursive("app.ts::odd"));
        assert!(graph.is_recursive("app.ts::tree"));
        assert!(!graph.is_recursive("app.ts::leaf"));
        assert_eq!(graph.reachable_from_roots().len(), 4);
    }

    #[test]
    fn test_node_lookup_by_span() {
        let graph = graph_for(PAGE);
        let page = graph.node("app.ts::page").unwrap();
        assert_eq!(graph.node_at(page.span).unwrap().qualified_name, "app.ts::page");
        assert_eq!(graph.len(), 7);
    }

    #[test]
    fn test_member_calls_follow_this_and_extends_only() {
        let source = r#"
class Base {
    @memo
    update(): void {}
}

class Derived extends Base {
    @memo
    build(): void {
        this.update();
    }
}

class Panel {
    @memo
    render(controller: Controller): void {
        controller.update();
    }
}
"#;
        let graph = graph_for(source);
        let build: Vec<&String> = graph.callees("app.ts::Derived.build").collect();
        assert_eq!(build, vec!["app.ts::Base.update"]);
        assert_eq!(graph.callees("app.ts::Panel.render").count(), 0);
        assert!(graph.inherited_member("Derived", "update").is_some());
        assert!(graph.inherited_member("Panel", "update").is_none());
    }

    #[test]
    fn test_rest_parameter_is_recorded_without_slot() {
        let graph = graph_for("/** @memo */\nfunction sum(base: number, ...rest: number[]): void {}\n");
        let table = &graph.node("app.ts::sum").unwrap().parameters;
        assert_eq!(table.declared_len(), 2);
        assert_eq!(table.slot_count(), 1);
        let rest = &table.bindings[1];
        assert!(rest.rest);
        assert_eq!(rest.name.as_deref(), Some("rest"));
        assert_eq!(rest.slot, None);
    }
}
