//! Emission of a transformed program.
//!
//! Runtime imports are added once per file, after the file's own imports, and
//! only for names the file does not already import.

use crate::factory::MemoFactory;
use crate::options::TransformOptions;
use crate::validate::TransformOutcome;
use oxc_ast::ast::*;
use oxc_codegen::Codegen;
use std::collections::HashSet;

/// Local names bound by the file's import declarations.
pub fn imported_names(program: &Program) -> HashSet<String> {
    let mut names = HashSet::new();
    for stmt in &program.body {
        let Statement::ImportDeclaration(import) = stmt else {
            continue;
        };
        let Some(specifiers) = &import.specifiers else {
            continue;
        };
        for specifier in specifiers {
            let local = match specifier {
                ImportDeclarationSpecifier::ImportSpecifier(s) => &s.local.name,
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => &s.local.name,
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => &s.local.name,
            };
            names.insert(local.to_string());
        }
    }
    names
}

/// Runtime import declarations a transformed file needs, as source text.
pub fn runtime_imports(
    options: &TransformOptions,
    existing: &HashSet<String>,
    uses_conditions: bool,
) -> Vec<String> {
    let names = &options.runtime;
    let mut imports = Vec::new();

    let types: Vec<&str> = [names.context_type.as_str(), names.id_type.as_str()]
        .into_iter()
        .filter(|n| !existing.contains(*n))
        .collect();
    if !types.is_empty() {
        imports.push(format!(
            "import type {{ {} }} from \"{}\";",
            types.join(", "),
            options.runtime_module
        ));
    }

    if uses_conditions {
        let primitives: Vec<&str> = [
            names.condition_scope.as_str(),
            names.condition_branch.as_str(),
        ]
        .into_iter()
        .filter(|n| !existing.contains(*n))
        .collect();
        if !primitives.is_empty() {
            imports.push(format!(
                "import {{ {} }} from \"{}\";",
                primitives.join(", "),
                options.builder_module
            ));
        }
    }
    imports
}

/// Inserts the runtime imports after the leading import block.
pub fn insert_runtime_imports<'a>(
    program: &mut Program<'a>,
    factory: &MemoFactory<'a, '_>,
    options: &TransformOptions,
    uses_conditions: bool,
) -> TransformOutcome<()> {
    let existing = imported_names(program);
    let imports = runtime_imports(options, &existing, uses_conditions);
    if imports.is_empty() {
        return Ok(());
    }
    let items = factory.module_items(&imports.join("\n"))?;
    let mut at = program
        .body
        .iter()
        .take_while(|s| matches!(s, Statement::ImportDeclaration(_)))
        .count();
    for item in items {
        program.body.insert(at, item);
        at += 1;
    }
    Ok(())
}

/// Prints `program`. Comments are dropped: generated nodes carry spans that do
/// not belong to the file, and consumed memo markers must not survive.
pub fn print(program: &mut Program) -> String {
    program.comments.clear();
    Codegen::new().build(program).code
}
