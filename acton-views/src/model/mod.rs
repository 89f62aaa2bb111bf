//! Template variable models
//!
//! Three sources feed every render:
//!
//! - [`GlobalModel`]: application-wide variables, configured at startup and
//!   shared read-only afterwards
//! - [`RequestAttributes`]: variables attached to one in-flight request
//! - the view's local [`Model`]
//!
//! [`Model::compose`] merges them with the most local source winning.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::btree_map::{self, BTreeMap};

/// Mapping from variable name to value, handed to the template engine
///
/// # Examples
///
/// ```rust
/// use acton_views::Model;
///
/// let model = Model::new()
///     .with("message", "Hello")
///     .with("count", 3);
///
/// assert_eq!(model.get("message"), Some(&"Hello".into()));
/// assert_eq!(model.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(BTreeMap<String, Value>);

impl Model {
    /// Create an empty model
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Add a variable, consuming and returning the model
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert a variable, returning the previous value if any
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    /// Insert any serializable value, such as a struct or a list of structs
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn insert_serialized<T: Serialize + ?Sized>(
        &mut self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        self.0.insert(name.into(), serde_json::to_value(value)?);
        Ok(())
    }

    /// Look up a variable
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Whether a variable is present
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Variable names in sorted order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterate over all variables
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    /// Number of variables
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the model has no variables
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy every entry of `other` into this model, overwriting same-named entries
    pub fn overlay(&mut self, other: &Self) {
        self.0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    }

    /// Merge global, request and local variables into a fresh model
    ///
    /// Entries are applied in that order, so a request attribute hides a
    /// global variable of the same name and a local variable hides both.
    /// The inputs are left untouched and the result shares nothing with them.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use acton_views::Model;
    ///
    /// let global = Model::new().with("global", "global").with("local", "global");
    /// let request = Model::new().with("request", "request").with("local", "request");
    /// let local = Model::new().with("local", "local");
    ///
    /// let model = Model::compose(&global, &request, &local);
    /// assert_eq!(model.get("global"), Some(&"global".into()));
    /// assert_eq!(model.get("request"), Some(&"request".into()));
    /// assert_eq!(model.get("local"), Some(&"local".into()));
    /// ```
    #[must_use]
    pub fn compose(global: &Self, request: &Self, local: &Self) -> Self {
        let mut composed = Self::new();
        composed.overlay(global);
        composed.overlay(request);
        composed.overlay(local);
        composed
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Model {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, Value>> for Model {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl<'a> IntoIterator for &'a Model {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Application-wide template variables
///
/// Populate it while configuring the application, then share it as an
/// `Arc<GlobalModel>` with the resolver. Renders only ever read it.
///
/// # Examples
///
/// ```rust
/// use acton_views::GlobalModel;
/// use std::sync::Arc;
///
/// let mut global = GlobalModel::new();
/// global.insert("site_name", "Acton");
/// let shared: Arc<GlobalModel> = Arc::new(global);
/// assert_eq!(shared.get("site_name"), Some(&"Acton".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalModel(Model);

impl GlobalModel {
    /// Create an empty global model
    #[must_use]
    pub const fn new() -> Self {
        Self(Model::new())
    }

    /// Set a global variable
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name, value)
    }

    /// Look up a global variable
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// The variables as a plain model
    #[must_use]
    pub const fn as_model(&self) -> &Model {
        &self.0
    }
}

impl From<Model> for GlobalModel {
    fn from(model: Model) -> Self {
        Self(model)
    }
}

/// Variables scoped to one in-flight request
///
/// Middleware or extractors store these in the request extensions; the view
/// middleware snapshots them before the handler runs.
///
/// ```rust
/// use acton_views::{Model, RequestAttributes};
///
/// let mut request = http::Request::new(());
/// request
///     .extensions_mut()
///     .insert(RequestAttributes::from(Model::new().with("user", "ada")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestAttributes(Model);

impl RequestAttributes {
    /// Create an empty attribute set
    #[must_use]
    pub const fn new() -> Self {
        Self(Model::new())
    }

    /// Set a request attribute
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name, value)
    }

    /// The attributes as a plain model
    #[must_use]
    pub const fn as_model(&self) -> &Model {
        &self.0
    }
}

impl From<Model> for RequestAttributes {
    fn from(model: Model) -> Self {
        Self(model)
    }
}

/// Anything that can supply request-scoped template variables
///
/// Implemented for plain models, for [`RequestAttributes`] and for HTTP
/// requests carrying [`RequestAttributes`] in their extensions, so the
/// resolver works the same whichever shape the host hands it.
#[cfg_attr(test, mockall::automock)]
pub trait RequestAttributesSource {
    /// Snapshot the request-scoped variables
    fn request_attributes(&self) -> Model;
}

impl RequestAttributesSource for Model {
    fn request_attributes(&self) -> Model {
        self.clone()
    }
}

impl RequestAttributesSource for RequestAttributes {
    fn request_attributes(&self) -> Model {
        self.0.clone()
    }
}

impl<B> RequestAttributesSource for http::Request<B> {
    fn request_attributes(&self) -> Model {
        self.extensions()
            .get::<RequestAttributes>()
            .map(RequestAttributesSource::request_attributes)
            .unwrap_or_default()
    }
}

impl RequestAttributesSource for http::request::Parts {
    fn request_attributes(&self) -> Model {
        self.extensions
            .get::<RequestAttributes>()
            .map(RequestAttributesSource::request_attributes)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_local_overrides_request_overrides_global() {
        let global = Model::new().with("global", "global");
        let request = Model::new()
            .with("request", "still-global")
            .with("local", "still-global");
        let local = Model::new().with("local", "local");

        let composed = Model::compose(&global, &request, &local);

        let expected = Model::new()
            .with("global", "global")
            .with("request", "still-global")
            .with("local", "local");
        assert_eq!(composed, expected);
    }

    #[test]
    fn test_compose_of_empty_sources_is_empty() {
        let empty = Model::new();
        assert!(Model::compose(&empty, &empty, &empty).is_empty());
    }

    #[test]
    fn test_insert_serialized_struct() {
        #[derive(Serialize)]
        struct Animal {
            name: &'static str,
            price: Option<u64>,
        }

        let mut model = Model::new();
        model
            .insert_serialized("animal", &Animal { name: "Cat", price: None })
            .unwrap();
        assert_eq!(
            model.get("animal"),
            Some(&serde_json::json!({"name": "Cat", "price": null}))
        );
    }

    #[test]
    fn test_request_reads_attributes_from_extensions() {
        let mut request = http::Request::new(());
        assert!(request.request_attributes().is_empty());

        let mut attributes = RequestAttributes::new();
        attributes.insert("request", "request");
        request.extensions_mut().insert(attributes);

        assert_eq!(
            request.request_attributes(),
            Model::new().with("request", "request")
        );

        let (parts, ()) = request.into_parts();
        assert_eq!(parts.request_attributes().get("request"), Some(&"request".into()));
    }

    #[test]
    fn test_global_model_is_read_through_model_view() {
        let mut global = GlobalModel::new();
        global.insert("a", 1);
        assert_eq!(global.as_model().len(), 1);
        assert_eq!(global.get("a"), Some(&1.into()));
    }

    fn arb_model() -> impl Strategy<Value = Model> {
        prop::collection::btree_map("[a-e]{1,2}", any::<i64>(), 0..8).prop_map(|map| {
            map.into_iter().collect::<Model>()
        })
    }

    proptest! {
        #[test]
        fn compose_keys_are_union_of_sources(g in arb_model(), r in arb_model(), l in arb_model()) {
            let composed = Model::compose(&g, &r, &l);
            let expected: BTreeSet<&str> = g.keys().chain(r.keys()).chain(l.keys()).collect();
            let actual: BTreeSet<&str> = composed.keys().collect();
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn compose_prefers_most_local_source(g in arb_model(), r in arb_model(), l in arb_model()) {
            let composed = Model::compose(&g, &r, &l);
            for (key, value) in &composed {
                let expected = l.get(key).or_else(|| r.get(key)).or_else(|| g.get(key));
                prop_assert_eq!(Some(value), expected);
            }
        }

        #[test]
        fn compose_leaves_inputs_untouched(g in arb_model(), r in arb_model(), l in arb_model()) {
            let (g0, r0, l0) = (g.clone(), r.clone(), l.clone());
            let _ = Model::compose(&g, &r, &l);
            prop_assert_eq!(g, g0);
            prop_assert_eq!(r, r0);
            prop_assert_eq!(l, l0);
        }
    }
}
