#[cfg(test)]
mod tests {
    use crate::options::{
        default_primitives, ClosurePosition, EarlyExitPolicy, PrimitiveKind, TransformOptions,
    };
    use crate::validate::{TransformError, INV_OPTIONS};

    #[test]
    fn test_empty_json_uses_defaults() {
        let options = TransformOptions::from_json("{}").unwrap();
        assert_eq!(options.hash_width, 32);
        assert_eq!(options.early_exit_policy, EarlyExitPolicy::Reject);
        assert_eq!(options.runtime.context, "__memo_context");
        assert_eq!(options.runtime.id, "__memo_id");
        assert!(options.emit_imports);
        assert_eq!(options.primitives, default_primitives());
    }

    #[test]
    fn test_camel_case_fields() {
        let options = TransformOptions::from_json(
            r#"{
                "filePath": "src/app.ts",
                "hashWidth": 20,
                "earlyExitPolicy": "leave-untouched",
                "emitImports": false,
                "externalMemoFunctions": ["Card"],
                "runtime": { "context": "ctx" }
            }"#,
        )
        .unwrap();
        assert_eq!(options.file_path, "src/app.ts");
        assert_eq!(options.hash_width, 20);
        assert_eq!(options.early_exit_policy, EarlyExitPolicy::LeaveUntouched);
        assert!(!options.emit_imports);
        assert!(options.is_external_memo("Card"));
        assert!(!options.is_external_memo("Column"));
        assert_eq!(options.runtime.context, "ctx");
        // unspecified runtime names keep their defaults
        assert_eq!(options.runtime.id, "__memo_id");
    }

    #[test]
    fn test_hash_width_bounds() {
        for width in [0, 7, 54, 64] {
            let json = format!(r#"{{ "hashWidth": {} }}"#, width);
            match TransformOptions::from_json(&json) {
                Err(TransformError::HashWidth(w)) => assert_eq!(w, width),
                other => panic!("expected hash width error, got {:?}", other.map(|o| o.hash_width)),
            }
        }
        for width in [8, 32, 53] {
            let json = format!(r#"{{ "hashWidth": {} }}"#, width);
            assert!(TransformOptions::from_json(&json).is_ok());
        }
    }

    #[test]
    fn test_bad_json_maps_to_options_code() {
        let err = TransformOptions::from_json("{ not json").unwrap_err();
        let diagnostic = err.into_compiler_error("a.ts");
        assert_eq!(diagnostic.code, INV_OPTIONS);
        assert_eq!(diagnostic.file, "a.ts");
    }

    #[test]
    fn test_closure_positions() {
        assert_eq!(ClosurePosition::Leading.resolve(3), Some(0));
        assert_eq!(ClosurePosition::Trailing.resolve(3), Some(2));
        assert_eq!(ClosurePosition::Index(1).resolve(3), Some(1));
        assert_eq!(ClosurePosition::Index(3).resolve(3), None);
        assert_eq!(ClosurePosition::Leading.resolve(0), None);
        assert_eq!(ClosurePosition::Trailing.resolve(0), None);
    }

    #[test]
    fn test_default_table_lookup() {
        let options = TransformOptions::default();

        let column = options.find_primitive("Column", 1).unwrap();
        assert_eq!(column.kind, PrimitiveKind::Builder);
        assert_eq!(column.closure_indices(1), vec![0]);
        assert_eq!(column.closure_indices(2), vec![0, 1]);

        let for_each = options.find_primitive("ForEach", 3).unwrap();
        assert_eq!(for_each.closure_indices(3), vec![1]);

        let scope = options.find_primitive("ConditionScope", 1).unwrap();
        assert_eq!(scope.kind, PrimitiveKind::ConditionScope);
        // condition primitives are keyed by arity too
        assert!(options.find_primitive("ConditionScope", 2).is_none());

        assert!(options.find_primitive("console.log", 1).is_none());
    }

    #[test]
    fn test_custom_primitive_table() {
        let options = TransformOptions::from_json(
            r#"{ "primitives": [
                { "name": "Card.create", "arity": 2, "closures": ["trailing", { "index": 0 }] }
            ] }"#,
        )
        .unwrap();
        let card = options.find_primitive("Card.create", 2).unwrap();
        assert_eq!(card.closure_indices(2), vec![0, 1]);
        assert!(options.find_primitive("Card.create", 1).is_none());
        assert!(options.find_primitive("Column", 1).is_none());
    }

    #[test]
    fn test_synthetic_names() {
        let names = TransformOptions::default().runtime;
        assert_eq!(names.parameter("x"), "__memo_parameter_x");
        assert!(names.is_synthetic("__memo_context"));
        assert!(names.is_synthetic("__memo_parameter_x"));
        assert!(!names.is_synthetic("context"));
    }
}
