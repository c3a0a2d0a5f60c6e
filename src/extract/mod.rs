//! Entity extraction
//!
//! Turns one parsed [`SourceUnit`] into graph entities: classified type
//! declarations, the endpoints their controller methods expose, and the
//! field-typed dependencies between classes.

pub mod classify;
pub mod mapping;

pub use classify::{classify, is_dependency_field, RoleRule, ROLE_RULES};
pub use mapping::{compose_path, normalize_path};

use crate::graph::models::{
    Endpoint, FieldDeclaration, Role, ServiceCallEdge, TypeDeclaration,
};
use crate::parser::{DeclaredType, SourceUnit};
use serde::{Deserialize, Serialize};

/// Everything one compilation unit contributes to the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedUnit {
    /// Repository key of the declaring file
    pub file: String,
    pub package: Option<String>,
    /// Content hash of the source, when extracted from disk
    pub hash: Option<String>,
    pub types: Vec<TypeDeclaration>,
    pub endpoints: Vec<Endpoint>,
    pub edges: Vec<ServiceCallEdge>,
}

impl ExtractedUnit {
    /// An empty contribution for `file`
    pub fn empty(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }
}

/// Extract types, endpoints and dependency edges from a parsed unit.
pub fn extract_unit(unit: &SourceUnit) -> ExtractedUnit {
    let mut extracted = ExtractedUnit {
        file: unit.file.clone(),
        package: unit.package.clone(),
        hash: Some(unit.hash.clone()),
        ..Default::default()
    };

    for declared in &unit.types {
        let annotation_names: Vec<&str> =
            declared.annotations.iter().map(|a| a.name.as_str()).collect();
        let role = classify(annotation_names.as_slice(), &declared.name);

        if role == Role::Controller {
            extracted
                .endpoints
                .extend(extract_endpoints(declared, &unit.file));
        }
        extracted.edges.extend(extract_edges(declared));
        extracted
            .types
            .push(type_declaration(declared, role, unit));
    }

    tracing::debug!(
        "Extracted {}: {} types, {} endpoints, {} edges",
        unit.file,
        extracted.types.len(),
        extracted.endpoints.len(),
        extracted.edges.len()
    );
    extracted
}

fn type_declaration(declared: &DeclaredType, role: Role, unit: &SourceUnit) -> TypeDeclaration {
    TypeDeclaration {
        name: declared.name.clone(),
        package: unit.package.clone(),
        role,
        methods: declared.methods.iter().map(|m| m.name.clone()).collect(),
        fields: declared
            .fields
            .iter()
            .map(|f| FieldDeclaration {
                name: f.name.clone(),
                type_name: f.type_name.clone(),
            })
            .collect(),
        annotations: declared.annotations.iter().map(|a| a.name.clone()).collect(),
        file: unit.file.clone(),
    }
}

/// One endpoint per (verb, base path, method path) of every mapped method.
fn extract_endpoints(declared: &DeclaredType, file: &str) -> Vec<Endpoint> {
    let bases = mapping::base_paths(&declared.annotations);
    let mut endpoints = Vec::new();

    for method in &declared.methods {
        for annotation in &method.annotations {
            let Some(found) = mapping::method_mapping(annotation) else {
                continue;
            };
            for http_method in &found.methods {
                for base in &bases {
                    for path in &found.paths {
                        endpoints.push(Endpoint {
                            http_method: *http_method,
                            path: compose_path(base, path),
                            declared_path: normalize_path(path),
                            handler: method.name.clone(),
                            class_name: declared.name.clone(),
                            line: method.line,
                            file: file.to_string(),
                        });
                    }
                }
            }
        }
    }

    endpoints
}

fn extract_edges(declared: &DeclaredType) -> Vec<ServiceCallEdge> {
    declared
        .fields
        .iter()
        .filter(|f| is_dependency_field(&f.type_name, &f.annotations))
        .map(|f| ServiceCallEdge {
            source: declared.name.clone(),
            target: f.type_name.clone(),
            field: f.name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::models::HttpMethod;
    use crate::parser::{JavaParser, UnitOutcome};
    use std::path::Path;

    fn extract(content: &str) -> ExtractedUnit {
        let mut parser = JavaParser::new().unwrap();
        match parser.parse_source(Path::new("X.java"), "X.java", content) {
            UnitOutcome::Parsed(unit) => extract_unit(&unit),
            other => panic!("expected a parsed unit, got {:?}", other),
        }
    }

    const ACCOUNT_CONTROLLER: &str = r#"
package com.bank.controller;

@RestController
@RequestMapping("/api/v1")
public class AccountRestController {

    @Autowired
    private AccountService accountService;

    @PostMapping(value = "/accounts")
    public ResponseEntity<Account> checkAccountBalance(@RequestBody AccountInput input) {
        return null;
    }
}
"#;

    #[test]
    fn test_controller_endpoint_and_edge() {
        let unit = extract(ACCOUNT_CONTROLLER);

        assert_eq!(unit.types.len(), 1);
        assert_eq!(unit.types[0].role, Role::Controller);
        assert_eq!(unit.package.as_deref(), Some("com.bank.controller"));

        assert_eq!(unit.endpoints.len(), 1);
        let endpoint = &unit.endpoints[0];
        assert_eq!(endpoint.http_method, HttpMethod::Post);
        assert_eq!(endpoint.path, "/api/v1/accounts");
        assert_eq!(endpoint.declared_path, "/accounts");
        assert_eq!(endpoint.handler, "checkAccountBalance");
        assert_eq!(endpoint.class_name, "AccountRestController");

        assert_eq!(
            unit.edges,
            [ServiceCallEdge {
                source: "AccountRestController".to_string(),
                target: "AccountService".to_string(),
                field: "accountService".to_string(),
            }]
        );
    }

    #[test]
    fn test_class_and_method_paths_compose() {
        let unit = extract(
            r#"
@RestController
@RequestMapping("/accounts")
class AccountController {
    @GetMapping("/{id}/balance")
    public String balance() { return ""; }
}
"#,
        );
        assert_eq!(unit.endpoints[0].path, "/accounts/{id}/balance");
    }

    #[test]
    fn test_array_paths_and_unspecified_verb() {
        let unit = extract(
            r#"
@Controller
class PageController {
    @RequestMapping({"/home", "/index"})
    public String home() { return ""; }
}
"#,
        );
        let paths: Vec<_> = unit.endpoints.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, ["/home", "/index"]);
        assert!(unit
            .endpoints
            .iter()
            .all(|e| e.http_method == HttpMethod::Unspecified));
    }

    #[test]
    fn test_non_controller_has_no_endpoints() {
        let unit = extract(
            r#"
@Service
public class TransactionService {
    private TransactionRepository transactionRepository;
    private AccountRepository accountRepository;
    private int retries;

    @GetMapping("/not-an-endpoint")
    public void run() {}
}
"#,
        );
        assert_eq!(unit.types[0].role, Role::Service);
        assert!(unit.endpoints.is_empty());
        let targets: Vec<_> = unit.edges.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, ["TransactionRepository", "AccountRepository"]);
    }

    #[test]
    fn test_unclassified_type_still_declared() {
        let unit = extract("public class Account { private String id; }");
        assert_eq!(unit.types[0].role, Role::Unclassified);
        assert_eq!(unit.types[0].fields[0].type_name, "String");
        assert!(unit.edges.is_empty());
    }
}
