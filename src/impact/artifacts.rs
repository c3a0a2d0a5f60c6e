//! Artifact selection.
//!
//! Maps endpoints to the feature-file keys of the generation pipeline:
//! `{VERB}_{normalized-path}`, e.g. `POST /api/v1/accounts` → `POST_accounts`.

use super::propagate::ImpactResult;
use crate::graph::{ContextMapDiff, HttpMethod};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Default group prefixes stripped from artifact keys
pub const DEFAULT_STRIP_PREFIXES: &[&str] = &["api/v1"];

/// Feature-file key of one regenerable artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `POST_accounts.feature`
    pub fn feature_file_name(&self) -> String {
        format!("{}.feature", self.0)
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Artifacts to regenerate and artifacts whose endpoint disappeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPlan {
    pub regenerate: BTreeSet<ArtifactKey>,
    pub retire: BTreeSet<ArtifactKey>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSelector {
    verbs: Vec<HttpMethod>,
    /// Normalized prefixes, e.g. `api_v1_`
    strip_prefixes: Vec<String>,
}

impl Default for ArtifactSelector {
    fn default() -> Self {
        Self::new(HttpMethod::CONCRETE.to_vec(), DEFAULT_STRIP_PREFIXES)
    }
}

impl ArtifactSelector {
    /// `verbs` are what unspecified endpoints expand to; an empty list
    /// means every concrete verb.
    pub fn new<S: AsRef<str>>(verbs: Vec<HttpMethod>, strip_prefixes: &[S]) -> Self {
        let mut verbs: Vec<HttpMethod> = verbs.into_iter().filter(|v| !v.is_unspecified()).collect();
        verbs.sort();
        verbs.dedup();
        if verbs.is_empty() {
            verbs = HttpMethod::CONCRETE.to_vec();
        }

        let strip_prefixes = strip_prefixes
            .iter()
            .map(|p| flatten(p.as_ref()))
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}_", p))
            .collect();

        Self {
            verbs,
            strip_prefixes,
        }
    }

    pub fn verbs(&self) -> &[HttpMethod] {
        &self.verbs
    }

    /// `/api/v1/transactions/{id}/status` → `transactions_{id}_status`
    pub fn normalize_path(&self, path: &str) -> String {
        let flat = flatten(path);
        for prefix in &self.strip_prefixes {
            if let Some(rest) = flat.strip_prefix(prefix.as_str()) {
                return rest.to_string();
            }
        }
        flat
    }

    /// Keys for one endpoint; an unspecified verb yields one key per configured verb.
    pub fn keys_for(&self, method: HttpMethod, path: &str) -> Vec<ArtifactKey> {
        let normalized = self.normalize_path(path);
        let verbs = if method.is_unspecified() {
            self.verbs.clone()
        } else {
            vec![method]
        };
        verbs
            .into_iter()
            .map(|verb| ArtifactKey(format!("{}_{}", verb.as_str(), normalized)))
            .collect()
    }

    /// Minimal set of keys covering every affected endpoint
    pub fn select(&self, impact: &ImpactResult) -> BTreeSet<ArtifactKey> {
        let keys: BTreeSet<ArtifactKey> = impact
            .affected_endpoints
            .iter()
            .flat_map(|key| self.keys_for(key.method, &key.path))
            .collect();
        tracing::debug!("Selected {} artifact keys", keys.len());
        keys
    }

    /// Keys for a context-map diff: changed endpoints are regenerated,
    /// deleted ones retired unless something else still regenerates the key.
    pub fn plan_for_diff(&self, diff: &ContextMapDiff) -> ArtifactPlan {
        let regenerate: BTreeSet<ArtifactKey> = diff
            .changed
            .iter()
            .flat_map(|e| self.keys_for(e.http_method, &e.group))
            .collect();
        let retire = diff
            .deleted
            .iter()
            .flat_map(|e| self.keys_for(e.http_method, &e.group))
            .filter(|key| !regenerate.contains(key))
            .collect();
        ArtifactPlan { regenerate, retire }
    }
}

/// Trim separators and join segments with `_`
fn flatten(path: &str) -> String {
    path.trim().trim_matches('/').replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EndpointKey, GroupEndpoint};

    fn keys(keys: impl IntoIterator<Item = ArtifactKey>) -> Vec<String> {
        keys.into_iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_normalize_path() {
        let selector = ArtifactSelector::default();
        assert_eq!(selector.normalize_path("/api/v1/accounts"), "accounts");
        assert_eq!(selector.normalize_path("api/v1/accounts/"), "accounts");
        assert_eq!(
            selector.normalize_path("/api/v1/transactions/{transactionId}/status"),
            "transactions_{transactionId}_status"
        );
        assert_eq!(selector.normalize_path("/health"), "health");
        assert_eq!(selector.normalize_path("/api/v1"), "api_v1");
    }

    #[test]
    fn test_keys_for_concrete_and_unspecified() {
        let selector = ArtifactSelector::default();
        assert_eq!(
            keys(selector.keys_for(HttpMethod::Post, "/api/v1/accounts")),
            ["POST_accounts"]
        );
        assert_eq!(
            keys(selector.keys_for(HttpMethod::Unspecified, "/api/v1/home")),
            ["GET_home", "POST_home", "PUT_home", "DELETE_home", "PATCH_home"]
        );
    }

    #[test]
    fn test_configured_verbs_and_prefixes() {
        let selector = ArtifactSelector::new(
            vec![HttpMethod::Post, HttpMethod::Get, HttpMethod::Unspecified],
            &["/internal/"],
        );
        assert_eq!(selector.verbs(), [HttpMethod::Get, HttpMethod::Post]);
        assert_eq!(
            keys(selector.keys_for(HttpMethod::Unspecified, "/internal/jobs")),
            ["GET_jobs", "POST_jobs"]
        );
        assert_eq!(
            keys(selector.keys_for(HttpMethod::Get, "/api/v1/jobs")),
            ["GET_api_v1_jobs"]
        );
    }

    #[test]
    fn test_select_dedups() {
        let selector = ArtifactSelector::default();
        let impact = ImpactResult {
            affected_endpoints: BTreeSet::from([
                EndpointKey {
                    path: "/api/v1/accounts".to_string(),
                    method: HttpMethod::Post,
                },
                EndpointKey {
                    path: "/accounts".to_string(),
                    method: HttpMethod::Post,
                },
            ]),
            ..Default::default()
        };
        assert_eq!(keys(selector.select(&impact)), ["POST_accounts"]);
    }

    #[test]
    fn test_plan_for_diff() {
        let selector = ArtifactSelector::default();
        let diff = ContextMapDiff {
            changed: BTreeSet::from([GroupEndpoint {
                http_method: HttpMethod::Post,
                group: "api/v1/withdraw".to_string(),
            }]),
            deleted: BTreeSet::from([
                GroupEndpoint {
                    http_method: HttpMethod::Get,
                    group: "api/v1/legacy".to_string(),
                },
                GroupEndpoint {
                    http_method: HttpMethod::Post,
                    group: "withdraw".to_string(),
                },
            ]),
        };
        let plan = selector.plan_for_diff(&diff);
        assert_eq!(keys(plan.regenerate), ["POST_withdraw"]);
        assert_eq!(keys(plan.retire), ["GET_legacy"]);
    }

    #[test]
    fn test_feature_file_name() {
        let key = ArtifactSelector::default()
            .keys_for(HttpMethod::Delete, "/api/v1/accounts/{id}")
            .remove(0);
        assert_eq!(key.feature_file_name(), "DELETE_accounts_{id}.feature");
    }
}
