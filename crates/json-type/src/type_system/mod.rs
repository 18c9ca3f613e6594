//! The type system: a registry of named type aliases and custom validators.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::error::SchemaError;
use crate::type_def::{TypeBuilder, TypeNode};

/// A named predicate run after structural validation.
///
/// Returns `None` when the value is acceptable, or `Some(message)` when it
/// is not; the message is surfaced through the `VALIDATION` error.
pub type CustomValidatorFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// A named, registered type.
#[derive(Debug, Clone)]
pub struct TypeAlias {
    pub id: String,
    pub ty: TypeNode,
}

#[derive(Default)]
struct TypeSystemInner {
    aliases: HashMap<String, TypeAlias>,
    validators: HashMap<String, CustomValidatorFn>,
}

/// Shared-handle registry of aliases and custom validators.
///
/// Clones are cheap and refer to the same registry. Aliases store the
/// canonical [`TypeNode`] instance, so compiled functions reached through a
/// `ref` are the target's own cached ones.
#[derive(Clone, Default)]
pub struct TypeSystem {
    inner: Arc<RwLock<TypeSystemInner>>,
}

impl TypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A [`TypeBuilder`] bound to this system; nodes it constructs can
    /// resolve `ref`s against the registry.
    pub fn builder(&self) -> TypeBuilder {
        TypeBuilder::with_system(self.clone())
    }

    /// Registers a named alias. Registration is idempotent by id: an
    /// existing alias wins and is returned unchanged.
    pub fn alias(&self, id: impl Into<String>, ty: TypeNode) -> TypeAlias {
        let id = id.into();
        {
            let inner = self.inner.read().unwrap();
            if let Some(existing) = inner.aliases.get(&id) {
                return existing.clone();
            }
        }
        let mut ty = ty;
        ty.base_mut().system.get_or_insert_with(|| self.clone());
        let entry = TypeAlias { id: id.clone(), ty };
        let mut inner = self.inner.write().unwrap();
        inner.aliases.entry(id).or_insert(entry).clone()
    }

    /// Looks up an alias by id without following `ref` chains.
    pub fn unalias(&self, id: &str) -> Result<TypeAlias, SchemaError> {
        let inner = self.inner.read().unwrap();
        inner
            .aliases
            .get(id)
            .cloned()
            .ok_or_else(|| SchemaError::UnknownAlias(id.to_string()))
    }

    pub fn has_alias(&self, id: &str) -> bool {
        self.inner.read().unwrap().aliases.contains_key(id)
    }

    /// Resolves an alias, following `ref` chains until a concrete type is
    /// found. A chain that revisits an id is reported as a circular
    /// reference instead of looping.
    pub fn resolve(&self, id: &str) -> Result<TypeAlias, SchemaError> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = id.to_string();
        loop {
            if !visited.insert(current.clone()) {
                return Err(SchemaError::CircularRef(current));
            }
            let entry = self.unalias(&current)?;
            match &entry.ty {
                TypeNode::Ref(next) => current = next.ref_.clone(),
                _ => return Ok(entry),
            }
        }
    }

    /// Registers a named custom validator. Duplicate names are an error.
    pub fn add_custom_validator(
        &self,
        name: impl Into<String>,
        fun: CustomValidatorFn,
    ) -> Result<(), SchemaError> {
        let name = name.into();
        let mut inner = self.inner.write().unwrap();
        if inner.validators.contains_key(&name) {
            return Err(SchemaError::DuplicateValidator(name));
        }
        inner.validators.insert(name, fun);
        Ok(())
    }

    pub fn get_custom_validator(&self, name: &str) -> Option<CustomValidatorFn> {
        self.inner.read().unwrap().validators.get(name).cloned()
    }

    /// Exports every alias as a plain schema map.
    pub fn export_types(&self) -> HashMap<String, crate::schema::Schema> {
        let inner = self.inner.read().unwrap();
        inner
            .aliases
            .iter()
            .map(|(id, alias)| (id.clone(), alias.ty.get_schema()))
            .collect()
    }

    /// Imports a map of named schemas, registering each as an alias.
    pub fn import_types(
        &self,
        types: impl IntoIterator<Item = (String, crate::schema::Schema)>,
    ) {
        let builder = self.builder();
        for (id, schema) in types {
            let ty = builder.import(&schema);
            self.alias(id, ty);
        }
    }
}

impl std::fmt::Debug for TypeSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read().unwrap();
        f.debug_struct("TypeSystem")
            .field("aliases", &inner.aliases.keys().collect::<Vec<_>>())
            .field("validators", &inner.validators.keys().collect::<Vec<_>>())
            .finish()
    }
}
