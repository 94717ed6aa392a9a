use super::*;
use crate::CoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::warn;

/// Owns the type mappings of one backend. Cloning is cheap.
pub struct MappingRegistry<X> {
    inner: Arc<RegistryInner<X>>,
}

struct RegistryInner<X> {
    schema: SchemaRef,
    type_mappings: Vec<TypeMapping<X>>,
    elaborators: HashMap<(String, String), SelectElaborator>,
}

impl<X> Clone for MappingRegistry<X> {
    fn clone(&self) -> Self {
        MappingRegistry {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<X: BackendField> MappingRegistry<X> {
    pub fn builder(schema: SchemaRef) -> MappingBuilder<X> {
        MappingBuilder {
            schema,
            type_mappings: Vec::new(),
            elaborators: HashMap::new(),
        }
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.inner.schema
    }

    pub fn type_mappings(&self) -> &[TypeMapping<X>] {
        &self.inner.type_mappings
    }

    /// The first type mapping declared for the type.
    pub fn type_mapping(&self, tpe: &str) -> Option<&TypeMapping<X>> {
        self.inner.type_mappings.iter().find(|tm| tm.tpe() == tpe)
    }

    /// Resolves the object mapping of a type at a path. Prefixed mappings pick
    /// the longest prefix which is a suffix of the path; on equal lengths the
    /// first declared wins.
    pub fn object_mapping(&self, path: &[String], tpe: &str) -> Option<&ObjectMapping<X>> {
        match self.type_mapping(tpe)? {
            TypeMapping::Object(om) => Some(om),
            TypeMapping::Prefixed(pm) => {
                let mut best: Option<(usize, &ObjectMapping<X>)> = None;

                for (prefix, om) in &pm.mappings {
                    let longer = best.is_none_or(|(len, _)| prefix.len() > len);

                    if path.ends_with(prefix) && longer {
                        best = Some((prefix.len(), om));
                    }
                }

                best.map(|(_, om)| om)
            }
            TypeMapping::Leaf(_) => None,
        }
    }

    /// Finds the mapping of a field, falling back to the interfaces of the
    /// type depth first.
    pub fn field_mapping(&self, path: &[String], tpe: &str, field_name: &str) -> Option<&FieldMapping<X>> {
        let direct = self
            .object_mapping(path, tpe)
            .and_then(|om| om.field_mapping(field_name));

        if direct.is_some() {
            return direct;
        }

        let interfaces = self.schema().find_type(tpe).map(|t| t.interfaces()).unwrap_or_default();

        interfaces
            .iter()
            .find_map(|interface| self.field_mapping(path, interface, field_name))
    }

    pub fn root_mapping(&self, path: &[String], tpe: &str, field_name: &str) -> Option<&RootMapping<X>> {
        match self.field_mapping(path, tpe, field_name)? {
            FieldMapping::Root(root) => Some(root),
            _ => None,
        }
    }

    pub fn leaf_mapping(&self, tpe: &str) -> Option<&LeafMapping> {
        self.inner.type_mappings.iter().find_map(|tm| match tm {
            TypeMapping::Leaf(leaf) if leaf.tpe == tpe => Some(leaf),
            _ => None,
        })
    }

    /// The backend field of a type, if the field is mapped by the backend.
    pub fn backend_field(&self, path: &[String], tpe: &str, field_name: &str) -> Option<&X> {
        self.field_mapping(path, tpe, field_name).and_then(FieldMapping::as_backend)
    }

    /// Evaluates a hidden attribute: a `CursorAttribute`, or a hidden backend
    /// field read through `read_backend`.
    pub fn attribute(
        &self,
        cursor: &dyn Cursor,
        tpe: &str,
        attribute: &str,
        read_backend: impl FnOnce(&X) -> CoreResult<Value>,
    ) -> CoreResult<Value> {
        let missing = || CoreError::MissingAttribute {
            attribute: attribute.to_owned(),
            tpe: tpe.to_owned(),
        };

        match self.field_mapping(cursor.path(), tpe, attribute) {
            Some(FieldMapping::CursorAttribute(attr)) => (attr.f)(cursor),
            Some(FieldMapping::Backend(x)) if x.hidden() => read_backend(x),
            _ => Err(missing()),
        }
    }
}

#[async_trait]
impl<X: BackendField> Mapping for MappingRegistry<X> {
    fn schema(&self) -> &SchemaRef {
        &self.inner.schema
    }

    fn resolve_field(&self, path: &[String], type_name: &str, field_name: &str) -> FieldResolution {
        match self.field_mapping(path, type_name, field_name) {
            Some(FieldMapping::Delegate(delegate)) => FieldResolution::Delegated(delegate.clone()),
            Some(FieldMapping::CursorField(field)) => FieldResolution::Computed(field.f.clone()),
            Some(FieldMapping::CursorAttribute(attr)) => FieldResolution::Computed(attr.f.clone()),
            _ => FieldResolution::Cursor,
        }
    }

    fn select_elaborator(&self, type_name: &str, field_name: &str) -> Option<SelectElaborator> {
        self.inner
            .elaborators
            .get(&(type_name.to_owned(), field_name.to_owned()))
            .cloned()
    }

    fn encode_leaf(&self, type_name: &str, value: &Value) -> CoreResult<serde_json::Value> {
        if value.is_empty() {
            return Ok(serde_json::Value::Null);
        }

        match self.leaf_mapping(type_name) {
            Some(leaf) => (leaf.encoder)(value),
            None => value
                .to_json()
                .map_err(|err| CoreError::interpreter(format!("Failed to encode {type_name}: {err}"))),
        }
    }

    async fn run_root(&self, type_name: &str, select: &Select) -> CoreResult<(Query, CursorRef)> {
        let query_type = self.schema().query_type().to_owned();

        let root = self
            .root_mapping(&[], type_name, &select.name)
            .or_else(|| self.root_mapping(&[], &query_type, &select.name))
            .map(|root| Arc::clone(&root.root))
            .ok_or_else(|| CoreError::MissingRootMapping(select.name.clone()))?;

        let tpe = self
            .root_field_type(type_name, &select.name)
            .ok_or_else(|| CoreError::UnknownField {
                field: select.name.clone(),
                tpe: type_name.to_owned(),
            })?;

        let query = RootQuery {
            field_name: &select.name,
            alias: select.alias.as_deref(),
            bindings: &select.bindings,
            tpe: &tpe,
            child: &select.child,
        };

        root.run(self, query).await
    }

    fn validate(&self) -> Vec<ValidationFinding> {
        validate_registry(self)
    }
}

pub struct MappingBuilder<X> {
    schema: SchemaRef,
    type_mappings: Vec<TypeMapping<X>>,
    elaborators: HashMap<(String, String), SelectElaborator>,
}

impl<X: BackendField> MappingBuilder<X> {
    pub fn type_mapping(mut self, mapping: TypeMapping<X>) -> Self {
        self.type_mappings.push(mapping);
        self
    }

    pub fn object(self, tpe: impl Into<String>, field_mappings: Vec<FieldMapping<X>>) -> Self {
        self.type_mapping(TypeMapping::Object(ObjectMapping::new(tpe, field_mappings)))
    }

    pub fn prefixed(self, tpe: impl Into<String>, mappings: Vec<(Vec<String>, Vec<FieldMapping<X>>)>) -> Self {
        let tpe = tpe.into();

        let mappings = mappings
            .into_iter()
            .map(|(prefix, fields)| (prefix, ObjectMapping::new(tpe.clone(), fields)))
            .collect();

        self.type_mapping(TypeMapping::Prefixed(PrefixedMapping { tpe, mappings }))
    }

    pub fn leaf<F>(self, tpe: impl Into<String>, encoder: F) -> Self
    where
        F: Fn(&Value) -> CoreResult<serde_json::Value> + Send + Sync + 'static,
    {
        self.type_mapping(TypeMapping::Leaf(LeafMapping::new(tpe, encoder)))
    }

    pub fn select_elaborator<F>(mut self, tpe: impl Into<String>, field_name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Select) -> CoreResult<Query> + Send + Sync + 'static,
    {
        self.elaborators.insert((tpe.into(), field_name.into()), Arc::new(f));
        self
    }

    /// Builds the registry. Validation findings are logged, not enforced.
    pub fn build(self) -> MappingRegistry<X> {
        let registry = MappingRegistry {
            inner: Arc::new(RegistryInner {
                schema: self.schema,
                type_mappings: self.type_mappings,
                elaborators: self.elaborators,
            }),
        };

        for finding in validate_registry(&registry) {
            if finding.severity == Severity::Error {
                warn!(finding = %finding.message, "mapping does not match the schema");
            }
        }

        registry
    }
}
