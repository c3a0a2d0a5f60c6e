//! Java language extractor
//!
//! Walks a tree-sitter Java syntax tree and records, per compilation unit:
//! - the package declaration
//! - classes, interfaces, enums and records (nested types included)
//! - type, method and field annotations with their argument values
//! - methods (name and declaring line)
//! - fields (one entry per declarator) with their declared type

use super::helpers::*;
use super::{Annotation, DeclaredField, DeclaredMethod, DeclaredType, SourceUnit, TypeKind};
use tree_sitter::Node;

/// Extract Java code structure into `unit`
pub fn extract(root: &Node, source: &str, unit: &mut SourceUnit) {
    let mut cursor = root.walk();

    for child in root.children(&mut cursor) {
        match child.kind() {
            "package_declaration" => {
                unit.package = extract_package(&child, source);
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration" => {
                extract_type(&child, source, &mut unit.types);
            }
            _ => {}
        }
    }
}

fn extract_package(node: &Node, source: &str) -> Option<String> {
    node.children(&mut node.walk())
        .find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"))
        .and_then(|c| get_text(&c, source))
        .map(|s| s.to_string())
}

fn type_kind(node: &Node) -> Option<TypeKind> {
    match node.kind() {
        "class_declaration" => Some(TypeKind::Class),
        "interface_declaration" => Some(TypeKind::Interface),
        "enum_declaration" => Some(TypeKind::Enum),
        "record_declaration" => Some(TypeKind::Record),
        _ => None,
    }
}

/// Push the type declared by `node` followed by any types nested inside it.
fn extract_type(node: &Node, source: &str, types: &mut Vec<DeclaredType>) {
    let (Some(name), Some(kind)) = (get_field_text(node, "name", source), type_kind(node)) else {
        return;
    };

    let mut declared = DeclaredType {
        name,
        kind,
        line: line_of(node),
        annotations: extract_annotations(node, source),
        methods: Vec::new(),
        fields: Vec::new(),
    };

    let mut nested = Vec::new();
    if let Some(body) = node.child_by_field_name("body") {
        extract_body(&body, source, &mut declared, &mut nested);
    }

    types.push(declared);
    types.extend(nested);
}

fn extract_body(
    body: &Node,
    source: &str,
    declared: &mut DeclaredType,
    nested: &mut Vec<DeclaredType>,
) {
    for child in body.children(&mut body.walk()) {
        match child.kind() {
            "method_declaration" => {
                if let Some(method) = extract_method(&child, source) {
                    declared.methods.push(method);
                }
            }
            "field_declaration" | "constant_declaration" => {
                declared.fields.extend(extract_fields(&child, source));
            }
            "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration" => {
                extract_type(&child, source, nested);
            }
            // Enum members live one level deeper
            "enum_body_declarations" => {
                extract_body(&child, source, declared, nested);
            }
            _ => {}
        }
    }
}

fn extract_method(node: &Node, source: &str) -> Option<DeclaredMethod> {
    let name = get_field_text(node, "name", source)?;

    Some(DeclaredMethod {
        name,
        line: line_of(node),
        annotations: extract_annotations(node, source),
    })
}

fn extract_fields(node: &Node, source: &str) -> Vec<DeclaredField> {
    let Some(raw_type) = get_field_text(node, "type", source) else {
        return Vec::new();
    };
    let type_name = simple_type_name(&raw_type);
    let annotations = extract_annotations(node, source);

    let mut cursor = node.walk();
    node.children_by_field_name("declarator", &mut cursor)
        .filter_map(|declarator| {
            let name = get_field_text(&declarator, "name", source)?;
            Some(DeclaredField {
                name,
                type_name: type_name.clone(),
                raw_type: raw_type.clone(),
                line: line_of(&declarator),
                annotations: annotations.clone(),
            })
        })
        .collect()
}

// ============================================================================
// Annotations
// ============================================================================

fn extract_annotations(node: &Node, source: &str) -> Vec<Annotation> {
    let Some(modifiers) = find_child_by_kind(node, "modifiers") else {
        return Vec::new();
    };

    let mut cursor = modifiers.walk();
    modifiers
        .children(&mut cursor)
        .filter_map(|child| match child.kind() {
            "marker_annotation" => annotation_name(&child, source).map(Annotation::marker),
            "annotation" => extract_annotation(&child, source),
            _ => None,
        })
        .collect()
}

fn annotation_name(node: &Node, source: &str) -> Option<String> {
    get_field_text(node, "name", source).map(|n| simple_name(&n).to_string())
}

fn extract_annotation(node: &Node, source: &str) -> Option<Annotation> {
    let mut annotation = Annotation::marker(annotation_name(node, source)?);

    let Some(args) = node.child_by_field_name("arguments") else {
        return Some(annotation);
    };

    let mut cursor = args.walk();
    for arg in args.named_children(&mut cursor) {
        match arg.kind() {
            "element_value_pair" => {
                let key = get_field_text(&arg, "key", source);
                let value = arg.child_by_field_name("value");
                if let (Some(key), Some(value)) = (key, value) {
                    annotation
                        .arguments
                        .entry(key)
                        .or_default()
                        .extend(element_values(&value, source));
                }
            }
            "line_comment" | "block_comment" => {}
            // Bare argument: `@GetMapping("/x")`
            _ => {
                annotation
                    .arguments
                    .entry(Annotation::DEFAULT_ELEMENT.to_string())
                    .or_default()
                    .extend(element_values(&arg, source));
            }
        }
    }

    Some(annotation)
}

/// Flatten an annotation element value into strings.
///
/// String literals are unquoted, arrays are expanded, string concatenations
/// are joined, anything else (`RequestMethod.GET`, constants) is kept as text.
fn element_values(node: &Node, source: &str) -> Vec<String> {
    match node.kind() {
        "element_value_array_initializer" => {
            let mut cursor = node.walk();
            node.named_children(&mut cursor)
                .flat_map(|child| element_values(&child, source))
                .collect()
        }
        "string_literal" => get_text(node, source)
            .map(|t| vec![unquote(t)])
            .unwrap_or_default(),
        "binary_expression" => {
            let mut joined = String::new();
            collect_string_parts(node, source, &mut joined);
            vec![joined]
        }
        "line_comment" | "block_comment" => Vec::new(),
        _ => get_text(node, source)
            .map(|t| vec![t.trim().to_string()])
            .unwrap_or_default(),
    }
}

fn collect_string_parts(node: &Node, source: &str, out: &mut String) {
    if node.kind() == "string_literal" {
        if let Some(text) = get_text(node, source) {
            out.push_str(&unquote(text));
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        collect_string_parts(&child, source, out);
    }
}
