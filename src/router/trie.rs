//! Path trie for route matching.
//!
//! Paths are split on `/` and empty segments are discarded, so `/users/`,
//! `users` and `//users` all address the same node.
//!
//! Each node holds:
//! - literal children keyed by segment text
//! - at most one variable child (segments starting with `:`)
//! - the routes that terminate at this node, keyed by method
//!
//! Variable segments collapse into the single variable child of their parent.
//! When two routes declare different variable names at the same position the
//! name registered first is kept and later names are ignored; both routes then
//! bind the first name.
//!
//! Lookup prefers a literal child at every level and only falls back to the
//! variable child when no literal child exists for the segment. Once a branch
//! is chosen there is no backtracking: `/users/all` registered for GET only
//! makes `POST /users/all` a miss even when `POST /users/:id` exists.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::core::{ParamVec, Route};
use crate::envelope::Method;

/// Prefix marking a variable segment in a path template.
pub const VARIABLE_MARKER: char = ':';

/// Split a path into its non-empty segments.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

#[derive(Default)]
struct TrieNode {
    children: HashMap<Box<str>, TrieNode>,
    variable: Option<(Arc<str>, Box<TrieNode>)>,
    routes: HashMap<Method, Arc<Route>>,
}

impl TrieNode {
    fn child_for_insert(&mut self, segment: &str) -> &mut TrieNode {
        if let Some(name) = segment.strip_prefix(VARIABLE_MARKER) {
            let (existing, node) = self
                .variable
                .get_or_insert_with(|| (Arc::from(name), Box::default()));
            if existing.as_ref() != name {
                debug!(
                    kept = %existing,
                    ignored = %name,
                    "Variable name conflict at trie node - first registered name kept"
                );
            }
            node
        } else {
            self.children.entry(Box::from(segment)).or_default()
        }
    }
}

/// Route trie; see the module docs for matching rules.
#[derive(Default)]
pub struct RouteTrie {
    root: TrieNode,
}

impl RouteTrie {
    /// Insert `route` under `path`. Returns the route it replaced, if any.
    pub fn insert(&mut self, path: &str, method: Method, route: Arc<Route>) -> Option<Arc<Route>> {
        let mut node = &mut self.root;
        for segment in segments(path) {
            node = node.child_for_insert(segment);
        }
        node.routes.insert(method, route)
    }

    /// Find the route for `method` at `path`, collecting variable bindings.
    ///
    /// Returns `None` on any miss; `params` may then hold partial bindings.
    pub fn find(&self, path: &str, method: Method, params: &mut ParamVec) -> Option<Arc<Route>> {
        let mut node = &self.root;
        for segment in segments(path) {
            node = match node.children.get(segment) {
                Some(literal) => literal,
                None => {
                    let (name, child) = node.variable.as_ref()?;
                    params.push((Arc::clone(name), segment.to_string()));
                    child
                }
            };
        }
        node.routes.get(&method).map(Arc::clone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouteSpec;

    fn route(method: Method, path: &str, name: &str) -> Arc<Route> {
        let spec = RouteSpec::new(method, path)
            .name(name)
            .handle(|_| Ok(serde_json::Value::Null));
        Arc::new(Route::from_spec(path.to_string(), spec))
    }

    fn trie(routes: &[(Method, &str, &str)]) -> RouteTrie {
        let mut trie = RouteTrie::default();
        for (method, path, name) in routes {
            trie.insert(path, *method, route(*method, path, name));
        }
        trie
    }

    fn find(trie: &RouteTrie, method: Method, path: &str) -> Option<(String, Vec<(String, String)>)> {
        let mut params = ParamVec::new();
        trie.find(path, method, &mut params).map(|r| {
            (
                r.name().to_string(),
                params
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v))
                    .collect(),
            )
        })
    }

    #[test]
    fn test_literal_route() {
        let t = trie(&[(Method::Get, "/health", "health")]);
        assert_eq!(find(&t, Method::Get, "/health"), Some(("health".into(), vec![])));
        assert_eq!(find(&t, Method::Get, "health/"), Some(("health".into(), vec![])));
        assert!(find(&t, Method::Post, "/health").is_none());
    }

    #[test]
    fn test_variable_binding_and_length() {
        let t = trie(&[(Method::Get, "/users/:id", "get_user")]);
        assert_eq!(
            find(&t, Method::Get, "/users/42"),
            Some(("get_user".into(), vec![("id".into(), "42".into())]))
        );
        assert!(find(&t, Method::Get, "/users").is_none());
        assert!(find(&t, Method::Get, "/users/42/extra").is_none());
    }

    #[test]
    fn test_literal_preferred_over_variable() {
        let t = trie(&[
            (Method::Get, "/users/:id", "get_user"),
            (Method::Get, "/users/all", "list_users"),
        ]);
        assert_eq!(find(&t, Method::Get, "/users/all").unwrap().0, "list_users");
        assert_eq!(find(&t, Method::Get, "/users/7").unwrap().0, "get_user");
    }

    #[test]
    fn test_no_backtracking_after_literal() {
        let t = trie(&[
            (Method::Get, "/users/all", "list_users"),
            (Method::Post, "/users/:id", "update_user"),
        ]);
        assert!(find(&t, Method::Post, "/users/all").is_none());
        assert_eq!(find(&t, Method::Post, "/users/9").unwrap().0, "update_user");
    }

    #[test]
    fn test_first_variable_name_wins() {
        let t = trie(&[
            (Method::Get, "/users/:id/posts", "posts"),
            (Method::Get, "/users/:userId/comments", "comments"),
        ]);
        let (name, params) = find(&t, Method::Get, "/users/5/comments").unwrap();
        assert_eq!(name, "comments");
        assert_eq!(params, vec![("id".to_string(), "5".to_string())]);
    }

    #[test]
    fn test_insert_replaces_same_method_and_path() {
        let mut t = trie(&[(Method::Get, "/a", "first")]);
        let replaced = t.insert("/a", Method::Get, route(Method::Get, "/a", "second"));
        assert_eq!(replaced.map(|r| r.name().to_string()), Some("first".to_string()));
        assert_eq!(find(&t, Method::Get, "/a").unwrap().0, "second");
    }

    #[test]
    fn test_root_path() {
        let t = trie(&[(Method::Get, "/", "root")]);
        assert_eq!(find(&t, Method::Get, "/").unwrap().0, "root");
        assert_eq!(find(&t, Method::Get, "").unwrap().0, "root");
    }
}
