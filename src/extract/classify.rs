//! Role classification and dependency-field heuristics.
//!
//! Both are plain data tables so they can be inspected and tested directly.
//! Annotation evidence is checked for every rule before any naming rule.

use crate::graph::models::Role;
use crate::parser::Annotation;

/// How one role is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleRule {
    pub role: Role,
    /// Class-level annotation names that assign the role
    pub annotations: &'static [&'static str],
    /// Simple-name suffixes that assign the role
    pub suffixes: &'static [&'static str],
}

pub const ROLE_RULES: &[RoleRule] = &[
    RoleRule {
        role: Role::Controller,
        annotations: &["RestController", "Controller"],
        suffixes: &["Controller"],
    },
    RoleRule {
        role: Role::Service,
        annotations: &["Service"],
        suffixes: &["Service", "ServiceImpl"],
    },
    RoleRule {
        role: Role::Repository,
        annotations: &["Repository"],
        suffixes: &["Repository", "Repo", "Dao"],
    },
];

/// Field type names containing one of these are dependencies
pub const DEPENDENCY_TYPE_MARKERS: &[&str] = &["Service", "Repository"];

/// Field type names ending with one of these are dependencies
pub const DEPENDENCY_TYPE_SUFFIXES: &[&str] = &["Dao", "Repo"];

/// Fields carrying one of these annotations are dependencies whatever their type
pub const INJECTION_ANNOTATIONS: &[&str] = &["Autowired", "Inject", "Resource"];

/// Classify a type from its class-level annotation names and simple name.
pub fn classify<S: AsRef<str>>(annotations: &[S], name: &str) -> Role {
    let annotated = ROLE_RULES.iter().find(|rule| {
        annotations
            .iter()
            .any(|a| rule.annotations.contains(&a.as_ref()))
    });
    if let Some(rule) = annotated {
        return rule.role;
    }

    ROLE_RULES
        .iter()
        .find(|rule| rule.suffixes.iter().any(|suffix| name.ends_with(suffix)))
        .map(|rule| rule.role)
        .unwrap_or(Role::Unclassified)
}

/// Whether a field of simple type `type_name` is a service/repository reference.
pub fn is_dependency_field(type_name: &str, annotations: &[Annotation]) -> bool {
    if type_name.is_empty() {
        return false;
    }
    DEPENDENCY_TYPE_MARKERS.iter().any(|m| type_name.contains(m))
        || DEPENDENCY_TYPE_SUFFIXES.iter().any(|s| type_name.ends_with(s))
        || annotations
            .iter()
            .any(|a| INJECTION_ANNOTATIONS.contains(&a.name.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: &[&str] = &[];

    #[test]
    fn test_classify_by_annotation() {
        assert_eq!(classify(&["RestController"], "Accounts"), Role::Controller);
        assert_eq!(classify(&["Controller"], "Pages"), Role::Controller);
        assert_eq!(classify(&["Service"], "Transfers"), Role::Service);
        assert_eq!(classify(&["Repository"], "Store"), Role::Repository);
    }

    #[test]
    fn test_classify_by_suffix() {
        assert_eq!(classify(NONE, "AccountRestController"), Role::Controller);
        assert_eq!(classify(NONE, "AccountService"), Role::Service);
        assert_eq!(classify(NONE, "AccountServiceImpl"), Role::Service);
        assert_eq!(classify(NONE, "AccountRepository"), Role::Repository);
        assert_eq!(classify(NONE, "AccountDao"), Role::Repository);
        assert_eq!(classify(NONE, "AccountRepo"), Role::Repository);
        assert_eq!(classify(NONE, "Account"), Role::Unclassified);
    }

    #[test]
    fn test_annotation_beats_suffix() {
        assert_eq!(classify(&["Service"], "LegacyController"), Role::Service);
        assert_eq!(classify(&["Entity"], "AccountService"), Role::Service);
    }

    #[test]
    fn test_dependency_fields() {
        assert!(is_dependency_field("AccountService", &[]));
        assert!(is_dependency_field("TransactionRepository", &[]));
        assert!(is_dependency_field("ServiceLocator", &[]));
        assert!(is_dependency_field("UserDao", &[]));
        assert!(is_dependency_field("AuditRepo", &[]));
        assert!(!is_dependency_field("String", &[]));
        assert!(!is_dependency_field("BigDecimal", &[]));
        assert!(is_dependency_field(
            "ObjectMapper",
            &[Annotation::marker("Autowired")]
        ));
        assert!(!is_dependency_field("", &[Annotation::marker("Autowired")]));
    }
}
