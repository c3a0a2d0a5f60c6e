//! Parser and extraction tests
//!
//! These tests don't require a checked-out codebase.
//! Run with: cargo test --test parser_tests

use bdd_context::extract::extract_unit;
use bdd_context::graph::{HttpMethod, Role};
use bdd_context::parser::{JavaParser, TypeKind, UnitOutcome};
use std::path::Path;

const ACCOUNT_CONTROLLER: &str = r#"package com.bank.api;

import org.springframework.beans.factory.annotation.Autowired;
import org.springframework.web.bind.annotation.*;

@RestController
@RequestMapping("/api/v1")
public class AccountRestController {

    @Autowired
    private AccountService accountService;

    @PostMapping(value = "/accounts")
    public ResponseEntity<Account> checkAccountBalance(@RequestBody AccountInput input) {
        return ResponseEntity.ok(accountService.getAccount(input.getSortCode(), input.getAccountNumber()));
    }

    @RequestMapping(path = "/accounts/{id}", method = {RequestMethod.GET, RequestMethod.DELETE})
    public Account byId(@PathVariable String id) {
        return null;
    }
}
"#;

fn parse(code: &str) -> UnitOutcome {
    let mut parser = JavaParser::new().unwrap();
    parser.parse_source(Path::new("src/Test.java"), "src/Test.java", code)
}

fn parsed(code: &str) -> bdd_context::parser::SourceUnit {
    match parse(code) {
        UnitOutcome::Parsed(unit) => unit,
        other => panic!("Should parse Java code: {:?}", other),
    }
}

#[test]
fn test_parser_creation() {
    let parser = JavaParser::new();
    assert!(parser.is_ok(), "Parser should initialize");
}

#[test]
fn test_parse_controller() {
    let unit = parsed(ACCOUNT_CONTROLLER);

    assert_eq!(unit.package.as_deref(), Some("com.bank.api"));
    assert_eq!(unit.types.len(), 1);

    let class = &unit.types[0];
    assert_eq!(class.name, "AccountRestController");
    assert_eq!(class.kind, TypeKind::Class);
    assert!(class.has_annotation("RestController"));
    assert!(class.has_annotation("RequestMapping"));

    assert_eq!(class.fields.len(), 1);
    assert_eq!(class.fields[0].name, "accountService");
    assert_eq!(class.fields[0].type_name, "AccountService");
    assert_eq!(class.fields[0].annotations[0].name, "Autowired");

    let names: Vec<_> = class.methods.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["checkAccountBalance", "byId"]);
    assert_eq!(class.methods[0].line, 14);
}

#[test]
fn test_extract_controller_endpoints() {
    let unit = extract_unit(&parsed(ACCOUNT_CONTROLLER));

    assert_eq!(unit.types[0].role, Role::Controller);

    let mut endpoints: Vec<_> = unit
        .endpoints
        .iter()
        .map(|e| (e.http_method, e.path.as_str(), e.handler.as_str()))
        .collect();
    endpoints.sort();
    assert_eq!(
        endpoints,
        [
            (HttpMethod::Get, "/api/v1/accounts/{id}", "byId"),
            (HttpMethod::Post, "/api/v1/accounts", "checkAccountBalance"),
            (HttpMethod::Delete, "/api/v1/accounts/{id}", "byId"),
        ]
    );

    assert_eq!(unit.edges.len(), 1);
    assert_eq!(unit.edges[0].source, "AccountRestController");
    assert_eq!(unit.edges[0].target, "AccountService");
    assert_eq!(unit.edges[0].field, "accountService");
}

#[test]
fn test_extract_service_dependencies() {
    let code = r#"
package com.bank.service;

@Service
public class TransactionService {
    private final TransactionRepository transactionRepository;
    private final AccountService accountService;
    private final java.time.Clock clock;

    public TransactionService(TransactionRepository transactionRepository,
                              AccountService accountService, java.time.Clock clock) {
        this.transactionRepository = transactionRepository;
        this.accountService = accountService;
        this.clock = clock;
    }
}
"#;
    let unit = extract_unit(&parsed(code));

    assert_eq!(unit.types[0].role, Role::Service);
    assert!(unit.endpoints.is_empty(), "Services expose no endpoints");

    let targets: Vec<_> = unit.edges.iter().map(|e| e.target.as_str()).collect();
    assert!(targets.contains(&"TransactionRepository"));
    assert!(targets.contains(&"AccountService"));
    assert!(!targets.contains(&"Clock"));
}

#[test]
fn test_classification_by_suffix() {
    let code = r#"
public interface AccountRepository extends JpaRepository<Account, Long> {
    Account findBySortCodeAndAccountNumber(String sortCode, String accountNumber);
}
"#;
    let unit = parsed(code);
    assert_eq!(unit.package, None);
    assert_eq!(unit.types[0].kind, TypeKind::Interface);

    let extracted = extract_unit(&unit);
    assert_eq!(extracted.types[0].role, Role::Repository);
}

#[test]
fn test_nested_and_enum_types() {
    let code = r#"
public class Outer {
    public enum Status {
        OK, FAILED;
        private String label;
        public String label() { return label; }
    }
    public record Amount(long cents) {}
}
"#;
    let unit = parsed(code);
    let names: Vec<_> = unit.types.iter().map(|t| (t.name.as_str(), t.kind)).collect();
    assert_eq!(
        names,
        [
            ("Outer", TypeKind::Class),
            ("Status", TypeKind::Enum),
            ("Amount", TypeKind::Record),
        ]
    );
    assert_eq!(unit.types[1].methods[0].name, "label");
    assert_eq!(unit.types[1].fields[0].name, "label");
}

#[test]
fn test_unparsable_source_fails() {
    let outcome = parse("public class Broken { void f( { }");
    match outcome {
        UnitOutcome::Failed { file, reason } => {
            assert_eq!(file, "src/Test.java");
            assert!(!reason.is_empty());
        }
        other => panic!("Expected a failed outcome, got {:?}", other),
    }
}

#[test]
fn test_content_hash_is_stable() {
    let a = parsed(ACCOUNT_CONTROLLER);
    let b = parsed(ACCOUNT_CONTROLLER);
    assert_eq!(a.hash, b.hash);
    assert_eq!(a.hash.len(), 64);

    let c = parsed(&ACCOUNT_CONTROLLER.replace("byId", "findById"));
    assert_ne!(a.hash, c.hash);
}

#[test]
fn test_unreadable_path_is_skipped() {
    let mut parser = JavaParser::new().unwrap();
    let outcome = parser.parse_path(Path::new("/does/not/exist/A.java"), "A.java");
    assert!(matches!(outcome, UnitOutcome::Skipped { .. }));
    assert!(outcome.diagnostic().is_some());
}
