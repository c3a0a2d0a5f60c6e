//! Request-mapping annotations and path composition

use crate::graph::models::HttpMethod;
use crate::parser::helpers::simple_name;
use crate::parser::Annotation;

/// Generic mapping annotation; also the only one allowed at class level
pub const REQUEST_MAPPING: &str = "RequestMapping";

/// Mapping annotation name → fixed verb. `None` means the verb comes from
/// the annotation's `method` element, or is unspecified.
pub const MAPPING_ANNOTATIONS: &[(&str, Option<HttpMethod>)] = &[
    ("GetMapping", Some(HttpMethod::Get)),
    ("PostMapping", Some(HttpMethod::Post)),
    ("PutMapping", Some(HttpMethod::Put)),
    ("DeleteMapping", Some(HttpMethod::Delete)),
    ("PatchMapping", Some(HttpMethod::Patch)),
    (REQUEST_MAPPING, None),
];

/// Elements that carry paths, in lookup order
const PATH_ELEMENTS: &[&str] = &[Annotation::DEFAULT_ELEMENT, "path"];

/// Verbs and declared paths of one method-level mapping annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    pub methods: Vec<HttpMethod>,
    /// Raw declared paths; at least one, possibly empty
    pub paths: Vec<String>,
}

/// Read a mapping annotation, or `None` if `annotation` is not one.
pub fn method_mapping(annotation: &Annotation) -> Option<Mapping> {
    let (_, fixed) = MAPPING_ANNOTATIONS
        .iter()
        .find(|(name, _)| *name == annotation.name)?;

    let methods = match fixed {
        Some(method) => vec![*method],
        None => {
            let mut methods: Vec<HttpMethod> = annotation
                .values("method")
                .iter()
                .filter_map(|v| HttpMethod::from_name(simple_name(v)))
                .filter(|m| !m.is_unspecified())
                .collect();
            methods.sort();
            methods.dedup();
            if methods.is_empty() {
                methods.push(HttpMethod::Unspecified);
            }
            methods
        }
    };

    Some(Mapping {
        methods,
        paths: declared_paths(annotation),
    })
}

/// Class-level base paths from `RequestMapping`; a single empty base if none.
pub fn base_paths(annotations: &[Annotation]) -> Vec<String> {
    annotations
        .iter()
        .find(|a| a.name == REQUEST_MAPPING)
        .map(declared_paths)
        .unwrap_or_else(|| vec![String::new()])
}

fn declared_paths(annotation: &Annotation) -> Vec<String> {
    let paths: Vec<String> = PATH_ELEMENTS
        .iter()
        .flat_map(|element| annotation.values(element).iter().cloned())
        .collect();
    if paths.is_empty() {
        vec![String::new()]
    } else {
        paths
    }
}

/// Normalize a path template: single separators, leading `/`, no trailing
/// `/` except for the root. `{var}` tokens are kept as written.
pub fn normalize_path(path: &str) -> String {
    let segments: Vec<&str> = path
        .trim()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();
    format!("/{}", segments.join("/"))
}

/// Join a class-level base path with a method-level path.
pub fn compose_path(base: &str, path: &str) -> String {
    normalize_path(&format!("{}/{}", base, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(name: &str, args: &[(&str, &[&str])]) -> Annotation {
        let mut a = Annotation::marker(name);
        for (key, values) in args {
            a.arguments.insert(
                key.to_string(),
                values.iter().map(|v| v.to_string()).collect(),
            );
        }
        a
    }

    #[test]
    fn test_compose_path() {
        assert_eq!(compose_path("/accounts", "/{id}/balance"), "/accounts/{id}/balance");
        assert_eq!(compose_path("/api/v1/", "/accounts"), "/api/v1/accounts");
        assert_eq!(compose_path("", "accounts"), "/accounts");
        assert_eq!(compose_path("/api//v1", ""), "/api/v1");
        assert_eq!(compose_path("", ""), "/");
    }

    #[test]
    fn test_normalize_path_is_idempotent() {
        for raw in ["//a//b/", "/", "", "x/{y}/z"] {
            let once = normalize_path(raw);
            assert_eq!(normalize_path(&once), once);
        }
    }

    #[test]
    fn test_fixed_verb_mappings() {
        let m = method_mapping(&annotation("PostMapping", &[("value", &["/accounts"])])).unwrap();
        assert_eq!(m.methods, [HttpMethod::Post]);
        assert_eq!(m.paths, ["/accounts"]);

        let m = method_mapping(&Annotation::marker("DeleteMapping")).unwrap();
        assert_eq!(m.methods, [HttpMethod::Delete]);
        assert_eq!(m.paths, [""]);
    }

    #[test]
    fn test_request_mapping_verbs() {
        let m = method_mapping(&annotation(
            "RequestMapping",
            &[("path", &["/x"]), ("method", &["RequestMethod.PUT", "RequestMethod.GET"])],
        ))
        .unwrap();
        assert_eq!(m.methods, [HttpMethod::Get, HttpMethod::Put]);
        assert_eq!(m.paths, ["/x"]);

        let m = method_mapping(&annotation("RequestMapping", &[("value", &["/y"])])).unwrap();
        assert_eq!(m.methods, [HttpMethod::Unspecified]);
    }

    #[test]
    fn test_non_mapping_annotation() {
        assert!(method_mapping(&Annotation::marker("Transactional")).is_none());
    }

    #[test]
    fn test_base_paths() {
        assert_eq!(base_paths(&[]), [""]);
        assert_eq!(
            base_paths(&[annotation("RequestMapping", &[("value", &["/a", "/b"])])]),
            ["/a", "/b"]
        );
    }
}
