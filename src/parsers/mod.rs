//! Tree-sitter grammars and per-function cyclomatic complexity
//!
//! Complexity of a function is `1 + decisions`, where decisions are counted
//! over the function's entire subtree. Nested functions therefore also count
//! toward every enclosing function.

use crate::error::{AnalysisError, AnalysisResult};
use std::path::Path;
use tree_sitter::{Language, Node, Parser};

/// Languages with a complexity grammar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
    Rust,
    Java,
}

impl Grammar {
    pub fn for_extension(ext: &str) -> Option<Self> {
        match ext {
            "py" | "pyi" => Some(Grammar::Python),
            "js" | "jsx" | "mjs" | "cjs" => Some(Grammar::JavaScript),
            "ts" => Some(Grammar::TypeScript),
            "tsx" => Some(Grammar::Tsx),
            "go" => Some(Grammar::Go),
            "rs" => Some(Grammar::Rust),
            "java" => Some(Grammar::Java),
            _ => None,
        }
    }

    pub fn language(&self) -> Language {
        match self {
            Grammar::Python => tree_sitter_python::LANGUAGE.into(),
            Grammar::JavaScript => tree_sitter_javascript::LANGUAGE.into(),
            Grammar::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Grammar::Tsx => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Grammar::Go => tree_sitter_go::LANGUAGE.into(),
            Grammar::Rust => tree_sitter_rust::LANGUAGE.into(),
            Grammar::Java => tree_sitter_java::LANGUAGE.into(),
        }
    }

    fn is_function(&self, kind: &str) -> bool {
        match self {
            Grammar::Python => kind == "function_definition",
            Grammar::JavaScript | Grammar::TypeScript | Grammar::Tsx => matches!(
                kind,
                "function_declaration"
                    | "generator_function_declaration"
                    | "function_expression"
                    | "function"
                    | "arrow_function"
                    | "method_definition"
            ),
            Grammar::Go => matches!(
                kind,
                "function_declaration" | "method_declaration" | "func_literal"
            ),
            Grammar::Rust => kind == "function_item",
            Grammar::Java => matches!(kind, "method_declaration" | "constructor_declaration"),
        }
    }

    /// Decisions introduced by this node alone (not its children)
    fn decisions(&self, node: &Node) -> u32 {
        let kind = node.kind();
        let decision = match self {
            Grammar::Python => matches!(
                kind,
                "if_statement"
                    | "elif_clause"
                    | "for_statement"
                    | "while_statement"
                    | "except_clause"
                    | "with_statement"
                    | "boolean_operator"
                    | "conditional_expression"
                    | "assert_statement"
                    | "case_clause"
            ),
            Grammar::JavaScript | Grammar::TypeScript | Grammar::Tsx => matches!(
                kind,
                "if_statement"
                    | "for_statement"
                    | "for_in_statement"
                    | "while_statement"
                    | "do_statement"
                    | "catch_clause"
                    | "ternary_expression"
                    | "switch_case"
            ),
            Grammar::Go => matches!(
                kind,
                "if_statement"
                    | "for_statement"
                    | "expression_case"
                    | "type_case"
                    | "communication_case"
            ),
            Grammar::Rust => matches!(
                kind,
                "if_expression"
                    | "while_expression"
                    | "for_expression"
                    | "loop_expression"
                    | "match_arm"
            ),
            Grammar::Java => matches!(
                kind,
                "if_statement"
                    | "while_statement"
                    | "for_statement"
                    | "enhanced_for_statement"
                    | "do_statement"
                    | "catch_clause"
                    | "try_with_resources_statement"
                    | "ternary_expression"
                    | "switch_block_statement_group"
                    | "switch_rule"
                    | "assert_statement"
            ),
        };

        if decision {
            return 1;
        }

        // `a && b || c` is a binary_expression per operator outside Python
        if kind == "binary_expression" && *self != Grammar::Python {
            return node
                .children(&mut node.walk())
                .filter(|c| c.kind() == "&&" || c.kind() == "||")
                .count() as u32;
        }
        0
    }
}

/// Cyclomatic complexity of one function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionComplexity {
    pub name: String,
    pub line: usize,
    pub complexity: u32,
}

/// Every function in `source`, in pre-order (outer functions first).
///
/// Sources that fail to parse cleanly are rejected rather than analyzed
/// from a partial tree.
pub fn function_complexities(
    source: &str,
    grammar: Grammar,
    path: &Path,
) -> AnalysisResult<Vec<FunctionComplexity>> {
    let mut parser = Parser::new();
    parser
        .set_language(&grammar.language())
        .map_err(|e| AnalysisError::parse(path, e.to_string()))?;

    let tree = parser
        .parse(source, None)
        .ok_or_else(|| AnalysisError::parse(path, "parser returned no tree"))?;
    let root = tree.root_node();
    if root.has_error() {
        return Err(AnalysisError::parse(path, "syntax errors in source"));
    }

    let mut functions = Vec::new();
    collect_functions(&root, grammar, source.as_bytes(), &mut functions);
    Ok(functions)
}

fn collect_functions(
    node: &Node,
    grammar: Grammar,
    source: &[u8],
    out: &mut Vec<FunctionComplexity>,
) {
    if grammar.is_function(node.kind()) {
        out.push(FunctionComplexity {
            name: function_name(node, source),
            line: node.start_position().row + 1,
            complexity: calculate_complexity(node, grammar),
        });
    }
    for child in node.children(&mut node.walk()) {
        collect_functions(&child, grammar, source, out);
    }
}

fn calculate_complexity(node: &Node, grammar: Grammar) -> u32 {
    let mut complexity = 1;

    fn count_branches(node: &Node, grammar: Grammar, complexity: &mut u32) {
        *complexity += grammar.decisions(node);
        for child in node.children(&mut node.walk()) {
            count_branches(&child, grammar, complexity);
        }
    }

    for child in node.children(&mut node.walk()) {
        count_branches(&child, grammar, &mut complexity);
    }
    complexity
}

fn node_text<'a>(node: &Node, source: &'a [u8]) -> Option<&'a str> {
    node.utf8_text(source).ok()
}

/// Declared name, or the binding an anonymous function is assigned to
fn function_name(node: &Node, source: &[u8]) -> String {
    if let Some(name) = node
        .child_by_field_name("name")
        .and_then(|n| node_text(&n, source))
    {
        return name.to_string();
    }

    let binding = node.parent().and_then(|parent| match parent.kind() {
        "variable_declarator" => parent.child_by_field_name("name"),
        "pair" => parent.child_by_field_name("key"),
        "assignment_expression" => parent.child_by_field_name("left"),
        "public_field_definition" | "field_definition" => parent
            .child_by_field_name("name")
            .or_else(|| parent.child_by_field_name("property")),
        _ => None,
    });

    binding
        .and_then(|n| node_text(&n, source))
        .map(str::to_string)
        .unwrap_or_else(|| "<anonymous>".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(source: &str, grammar: Grammar) -> Vec<(String, u32)> {
        function_complexities(source, grammar, Path::new("test"))
            .unwrap()
            .into_iter()
            .map(|f| (f.name, f.complexity))
            .collect()
    }

    #[test]
    fn test_grammar_for_extension() {
        assert_eq!(Grammar::for_extension("py"), Some(Grammar::Python));
        assert_eq!(Grammar::for_extension("tsx"), Some(Grammar::Tsx));
        assert_eq!(Grammar::for_extension("php"), None);
        assert_eq!(Grammar::for_extension("rb"), None);
    }

    #[test]
    fn test_python_straight_line_function() {
        let source = "def hello(name):\n    return 'Hello ' + name\n";
        assert_eq!(analyze(source, Grammar::Python), vec![("hello".to_string(), 1)]);
    }

    #[test]
    fn test_python_decisions() {
        let source = r#"
def handle(items, strict):
    for item in items:
        if item and strict:
            raise ValueError(item)
        elif item:
            continue
    try:
        with open("x") as f:
            pass
    except OSError:
        pass
    assert items
    return 1 if strict else 0
"#;
        // for, if, and, elif, with, except, assert, conditional
        assert_eq!(analyze(source, Grammar::Python), vec![("handle".to_string(), 9)]);
    }

    #[test]
    fn test_nested_functions_are_double_counted() {
        let source = r#"
def outer(x):
    def inner(y):
        if y:
            return 1
        return 0
    if x:
        return inner(x)
    return 0
"#;
        assert_eq!(
            analyze(source, Grammar::Python),
            vec![("outer".to_string(), 3), ("inner".to_string(), 2)]
        );
    }

    #[test]
    fn test_javascript_boolean_operators_and_arrows() {
        let source = r#"
function check(a, b, c) {
    if (a && b || c) {
        return 1;
    }
    return a ? 2 : 3;
}
const handler = (x) => {
    for (const y of x) {}
};
"#;
        assert_eq!(
            analyze(source, Grammar::JavaScript),
            vec![("check".to_string(), 5), ("handler".to_string(), 2)]
        );
    }

    #[test]
    fn test_go_function() {
        let source = r#"
package main

func classify(n int) string {
    if n < 0 || n > 100 {
        return "out"
    }
    for i := 0; i < n; i++ {
    }
    return "in"
}
"#;
        assert_eq!(analyze(source, Grammar::Go), vec![("classify".to_string(), 4)]);
    }

    #[test]
    fn test_rust_function() {
        let source = r#"
fn pick(v: Option<u32>) -> u32 {
    match v {
        Some(n) if n > 1 => n,
        Some(_) => 1,
        None => 0,
    }
}
"#;
        assert_eq!(analyze(source, Grammar::Rust), vec![("pick".to_string(), 4)]);
    }

    #[test]
    fn test_java_method() {
        let source = r#"
class A {
    int run(int x) {
        while (x > 0) {
            x--;
        }
        try {
            return x;
        } catch (Exception e) {
            return -1;
        }
    }
}
"#;
        assert_eq!(analyze(source, Grammar::Java), vec![("run".to_string(), 3)]);
    }

    #[test]
    fn test_syntax_errors_are_rejected() {
        let result = function_complexities("def broken(:\n", Grammar::Python, Path::new("bad.py"));
        assert!(matches!(result, Err(AnalysisError::Parse { .. })));
    }
}
