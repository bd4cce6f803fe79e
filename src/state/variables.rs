use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use crate::core::{Culture, DataType, QueryError, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub data_type: DataType,
    /// None until the first SET
    pub value: Option<Value>,
}

/// A variable scope. Keys compare case-insensitively regardless of culture.
///
/// Cloning via [`Variables::share`] aliases the same scope; [`Variables::fork`]
/// copies it so declarations made in the copy never leak back.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    inner: Arc<RwLock<HashMap<String, Variable>>>,
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

impl Variables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn share(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }

    #[must_use]
    pub fn fork(&self) -> Self {
        Self {
            inner: Arc::new(RwLock::new(self.read().clone())),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Variable>> {
        self.inner.read().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Variable>> {
        self.inner.write().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    pub fn declare(&self, name: &str, data_type: DataType) -> Result<(), QueryError> {
        let mut vars = self.write();
        let k = key(name);
        if vars.contains_key(&k) {
            return Err(QueryError::VariableAlreadyDeclared(name.to_string()));
        }
        vars.insert(
            k,
            Variable {
                name: name.to_string(),
                data_type,
                value: None,
            },
        );
        Ok(())
    }

    /// Declares `name` in this scope, shadowing any existing variable of the
    /// same name. Used for view parameters inside a forked scope.
    pub fn redeclare(&self, name: &str, data_type: DataType) {
        self.write().insert(
            key(name),
            Variable {
                name: name.to_string(),
                data_type,
                value: None,
            },
        );
    }

    /// Assigns a value, casting it to the declared type.
    pub fn set(&self, name: &str, value: &Value, culture: &Culture) -> Result<(), QueryError> {
        let mut vars = self.write();
        let var = vars
            .get_mut(&key(name))
            .ok_or_else(|| QueryError::VariableNotDeclared(name.to_string()))?;
        var.value = Some(value.cast(var.data_type, culture)?);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Variable> {
        self.read().get(&key(name)).cloned()
    }

    #[must_use]
    pub fn data_type(&self, name: &str) -> Option<DataType> {
        self.read().get(&key(name)).map(|v| v.data_type)
    }

    /// Current value of a declared and assigned variable.
    pub fn value(&self, name: &str) -> Result<Value, QueryError> {
        let vars = self.read();
        let var = vars
            .get(&key(name))
            .ok_or_else(|| QueryError::VariableNotDeclared(name.to_string()))?;
        var.value
            .clone()
            .ok_or_else(|| QueryError::VariableNotAssigned(var.name.clone()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.read().contains_key(&key(name))
    }

    /// Snapshot sorted by name.
    #[must_use]
    pub fn list(&self) -> Vec<Variable> {
        let mut vars: Vec<Variable> = self.read().values().cloned().collect();
        vars.sort_by(|a, b| key(&a.name).cmp(&key(&b.name)));
        vars
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declare_is_case_insensitive() {
        let vars = Variables::new();
        vars.declare("@Count", DataType::Integer).unwrap();
        assert!(matches!(
            vars.declare("@count", DataType::String),
            Err(QueryError::VariableAlreadyDeclared(_))
        ));
        assert!(vars.contains("@COUNT"));
    }

    #[test]
    fn test_set_casts_to_declared_type() {
        let vars = Variables::new();
        let culture = Culture::invariant();
        vars.declare("@x", DataType::Integer).unwrap();
        assert!(matches!(vars.value("@x"), Err(QueryError::VariableNotAssigned(_))));

        vars.set("@x", &Value::String("17".into()), &culture).unwrap();
        assert_eq!(vars.value("@X").unwrap(), Value::Integer(17));

        assert!(matches!(
            vars.set("@y", &Value::Integer(1), &culture),
            Err(QueryError::VariableNotDeclared(_))
        ));
    }

    #[test]
    fn test_share_and_fork() {
        let root = Variables::new();
        root.declare("@a", DataType::Integer).unwrap();

        let shared = root.share();
        shared.declare("@b", DataType::Integer).unwrap();
        assert!(root.contains("@b"));

        let forked = root.fork();
        forked.declare("@c", DataType::Integer).unwrap();
        assert!(forked.contains("@a"));
        assert!(!root.contains("@c"));
    }
}
