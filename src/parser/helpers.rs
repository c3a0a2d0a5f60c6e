//! Common helper functions for walking tree-sitter Java syntax trees

use tree_sitter::Node;

/// Get the text content of a node
pub fn get_text<'a>(node: &Node<'a>, source: &'a str) -> Option<&'a str> {
    node.utf8_text(source.as_bytes()).ok()
}

/// Get text from a named field in a node
pub fn get_field_text<'a>(node: &Node<'a>, field: &str, source: &'a str) -> Option<String> {
    node.child_by_field_name(field)
        .and_then(|n| get_text(&n, source))
        .map(|s| s.to_string())
}

/// Find a child node by kind
pub fn find_child_by_kind<'a>(node: &Node<'a>, kind: &str) -> Option<Node<'a>> {
    node.children(&mut node.walk()).find(|c| c.kind() == kind)
}

/// 1-based line of a node's `name` field, falling back to the node itself.
pub fn line_of(node: &Node) -> u32 {
    let anchor = node.child_by_field_name("name").unwrap_or(*node);
    anchor.start_position().row as u32 + 1
}

/// First `ERROR` or `MISSING` node in depth-first order.
pub fn first_error<'a>(node: &Node<'a>) -> Option<Node<'a>> {
    if node.is_error() || node.is_missing() {
        return Some(*node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = first_error(&child) {
            return Some(found);
        }
    }
    None
}

/// Last segment of a dotted name (`org.springframework.stereotype.Service` → `Service`).
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name).trim()
}

/// Simple name of a declared Java type, without generic arguments,
/// array brackets or package qualifier.
///
/// `java.util.List<AccountService>` → `List`, `AccountRepository[]` → `AccountRepository`.
pub fn simple_type_name(raw: &str) -> String {
    let base = raw.split('<').next().unwrap_or(raw);
    let base = base.trim().trim_end_matches("[]").trim_end_matches("...");
    simple_name(base).to_string()
}

/// Strip the surrounding quotes of a Java string literal.
pub fn unquote(literal: &str) -> String {
    literal.trim().trim_matches('"').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_type_name_strips_generics_and_packages() {
        assert_eq!(simple_type_name("AccountService"), "AccountService");
        assert_eq!(simple_type_name("com.bank.service.AccountService"), "AccountService");
        assert_eq!(simple_type_name("List<AccountService>"), "List");
        assert_eq!(simple_type_name("AccountRepository[]"), "AccountRepository");
        assert_eq!(simple_type_name("Map<String, List<Foo>>"), "Map");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"/accounts\""), "/accounts");
        assert_eq!(unquote("  \"\" "), "");
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(simple_name("RequestMethod.GET"), "GET");
        assert_eq!(simple_name("GetMapping"), "GetMapping");
    }
}
