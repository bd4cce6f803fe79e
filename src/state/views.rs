use std::collections::HashMap;
use std::sync::Arc;
use crate::parser::{SelectQuery, VariableDecl};
use crate::provider::ProviderFactory;

/// How a view produces its provider when referenced.
#[derive(Debug, Clone)]
pub enum ViewSource {
    /// Re-planned from the stored query on every reference
    Query(SelectQuery),
    /// Supplied by the embedding host
    Native(Arc<dyn ProviderFactory>),
}

#[derive(Debug, Clone)]
pub struct ViewDefinition {
    pub name: String,
    pub parameters: Vec<VariableDecl>,
    pub source: ViewSource,
}

/// Named views, keyed case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct Views {
    map: HashMap<String, ViewDefinition>,
}

impl Views {
    /// Adds or silently replaces a view.
    pub fn insert(&mut self, view: ViewDefinition) {
        self.map.insert(view.name.to_lowercase(), view);
    }

    /// Replaces an existing view. Returns false if the name is unknown.
    pub fn replace(&mut self, view: ViewDefinition) -> bool {
        match self.map.get_mut(&view.name.to_lowercase()) {
            Some(slot) => {
                *slot = view;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<ViewDefinition> {
        self.map.remove(&name.to_lowercase())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ViewDefinition> {
        self.map.get(&name.to_lowercase())
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(&name.to_lowercase())
    }

    /// Definitions sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<&ViewDefinition> {
        let mut views: Vec<&ViewDefinition> = self.map.values().collect();
        views.sort_by_key(|v| v.name.to_lowercase());
        views
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }
}
