//! Context graph data models.
//!
//! ## Entity types (extraction → graph)
//! - [`Role`]: closed classification of a declared type
//! - [`TypeDeclaration`]: one class/interface with its role, methods and fields
//! - [`HttpMethod`] / [`Endpoint`] / [`EndpointKey`]: HTTP-reachable controller methods
//! - [`ServiceCallEdge`]: field-typed "owns a reference to" dependency
//!
//! ## Graph storage
//! - [`ClassNode`] / [`DependencyEdge`]: petgraph node and edge weights

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ============================================================================
// Roles
// ============================================================================

/// Role of a declared type, inferred from annotations and naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Controller,
    Service,
    Repository,
    Unclassified,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Controller => write!(f, "controller"),
            Self::Service => write!(f, "service"),
            Self::Repository => write!(f, "repository"),
            Self::Unclassified => write!(f, "unclassified"),
        }
    }
}

// ============================================================================
// HTTP methods
// ============================================================================

/// HTTP verb of an endpoint.
///
/// `Unspecified` comes from a generic mapping annotation with no explicit
/// verb and is serialized as `ANY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    #[serde(rename = "ANY")]
    Unspecified,
}

impl HttpMethod {
    /// Every concrete verb, in declaration order
    pub const CONCRETE: [HttpMethod; 5] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Delete,
        Self::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Unspecified => "ANY",
        }
    }

    /// Parse a verb name, case-insensitively. `ANY` maps to `Unspecified`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "ANY" => Some(Self::Unspecified),
            _ => None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Declarations
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    /// Simple declared type name
    pub type_name: String,
}

/// One class/interface as the graph sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDeclaration {
    /// Simple name, also the graph key
    pub name: String,
    pub package: Option<String>,
    pub role: Role,
    /// Method names in declaration order
    pub methods: Vec<String>,
    pub fields: Vec<FieldDeclaration>,
    /// Class-level annotation names
    pub annotations: Vec<String>,
    /// Repository key of the declaring file
    pub file: String,
}

impl TypeDeclaration {
    /// Package-qualified name, or the simple name in the default package
    pub fn qualified_name(&self) -> String {
        match &self.package {
            Some(package) => format!("{}.{}", package, self.name),
            None => self.name.clone(),
        }
    }
}

// ============================================================================
// Endpoints
// ============================================================================

/// Unique endpoint identity: normalized full path plus verb.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EndpointKey {
    pub path: String,
    pub method: HttpMethod,
}

impl fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub http_method: HttpMethod,
    /// Full normalized path template (`/api/v1/transactions/{transactionId}/status`)
    pub path: String,
    /// Method-level path as declared, normalized (`/{transactionId}/status`)
    pub declared_path: String,
    /// Handler method name
    pub handler: String,
    /// Owning class (simple name)
    pub class_name: String,
    pub line: u32,
    pub file: String,
}

impl Endpoint {
    pub fn key(&self) -> EndpointKey {
        EndpointKey {
            path: self.path.clone(),
            method: self.http_method,
        }
    }

    /// Context map group: the full path without its leading separator
    pub fn group_key(&self) -> String {
        group_key_for(&self.path)
    }
}

/// Group key for a normalized full path; the root path keeps its `/`.
pub fn group_key_for(path: &str) -> String {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        trimmed.to_string()
    }
}

// ============================================================================
// Dependencies
// ============================================================================

/// `source` holds a field named `field` whose type is `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceCallEdge {
    pub source: String,
    pub target: String,
    pub field: String,
}

/// Graph node weight: a class name, declared or opaque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassNode {
    pub name: String,
}

/// Graph edge weight for a [`ServiceCallEdge`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub field: String,
    /// Files declaring the source class with this field; the edge lives
    /// while at least one remains
    pub files: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_method_serializes_any_for_unspecified() {
        assert_eq!(serde_json::to_string(&HttpMethod::Post).unwrap(), "\"POST\"");
        assert_eq!(
            serde_json::to_string(&HttpMethod::Unspecified).unwrap(),
            "\"ANY\""
        );
        let parsed: HttpMethod = serde_json::from_str("\"ANY\"").unwrap();
        assert_eq!(parsed, HttpMethod::Unspecified);
    }

    #[test]
    fn test_http_method_from_name() {
        assert_eq!(HttpMethod::from_name("get"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::from_name(" PATCH "), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::from_name("any"), Some(HttpMethod::Unspecified));
        assert_eq!(HttpMethod::from_name("TRACE"), None);
    }

    #[test]
    fn test_endpoint_key_and_group() {
        let endpoint = Endpoint {
            http_method: HttpMethod::Get,
            path: "/api/v1/transactions/{transactionId}/status".to_string(),
            declared_path: "/{transactionId}/status".to_string(),
            handler: "getTransactionStatus".to_string(),
            class_name: "TransactionRestController".to_string(),
            line: 42,
            file: "TransactionRestController.java".to_string(),
        };
        assert_eq!(
            endpoint.key().to_string(),
            "GET /api/v1/transactions/{transactionId}/status"
        );
        assert_eq!(endpoint.group_key(), "api/v1/transactions/{transactionId}/status");
        assert_eq!(group_key_for("/"), "/");
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Repository).unwrap(), "\"repository\"");
        assert_eq!(Role::Unclassified.to_string(), "unclassified");
    }

    #[test]
    fn test_qualified_name() {
        let mut ty = TypeDeclaration {
            name: "AccountService".to_string(),
            package: Some("com.bank.service".to_string()),
            role: Role::Service,
            methods: vec![],
            fields: vec![],
            annotations: vec![],
            file: "AccountService.java".to_string(),
        };
        assert_eq!(ty.qualified_name(), "com.bank.service.AccountService");
        ty.package = None;
        assert_eq!(ty.qualified_name(), "AccountService");
    }
}
