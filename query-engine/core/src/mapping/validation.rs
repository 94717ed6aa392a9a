use super::*;
use schema::{NamedType, BUILTIN_SCALARS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A structural mismatch between a mapping and its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFinding {
    pub severity: Severity,
    pub message: String,
}

impl ValidationFinding {
    fn error(message: String) -> Self {
        ValidationFinding {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        ValidationFinding {
            severity: Severity::Warning,
            message,
        }
    }

    fn info(message: String) -> Self {
        ValidationFinding {
            severity: Severity::Info,
            message,
        }
    }
}

pub(crate) fn validate_registry<X: BackendField>(registry: &MappingRegistry<X>) -> Vec<ValidationFinding> {
    let schema = registry.schema();
    let mut findings = Vec::new();

    for tm in registry.type_mappings() {
        let Some(tpe) = schema.find_type(tm.tpe()) else {
            findings.push(ValidationFinding::error(format!(
                "Referenced type '{}' does not exist",
                tm.tpe()
            )));
            continue;
        };

        match tm {
            TypeMapping::Object(om) => validate_object(registry, &[], om, &mut findings),
            TypeMapping::Prefixed(pm) => {
                for (prefix, om) in &pm.mappings {
                    validate_object(registry, prefix, om, &mut findings);
                }
            }
            TypeMapping::Leaf(leaf) if !tpe.is_leaf() => findings.push(ValidationFinding::error(format!(
                "Leaf mapping for type '{}' which is not a scalar or enum",
                leaf.tpe
            ))),
            TypeMapping::Leaf(_) => (),
        }
    }

    for tpe in schema.types() {
        match tpe {
            NamedType::Scalar(name) if !BUILTIN_SCALARS.contains(&name.as_str()) => {
                if registry.leaf_mapping(name).is_none() {
                    findings.push(ValidationFinding::warning(format!(
                        "Custom scalar '{name}' has no leaf mapping"
                    )));
                }
            }
            NamedType::Object(o) if registry.type_mapping(&o.name).is_none() => {
                findings.push(ValidationFinding::info(format!("Object type '{}' has no mapping", o.name)));
            }
            _ => (),
        }
    }

    findings
}

fn validate_object<X: BackendField>(
    registry: &MappingRegistry<X>,
    prefix: &[String],
    om: &ObjectMapping<X>,
    findings: &mut Vec<ValidationFinding>,
) {
    let schema = registry.schema();

    for fm in &om.field_mappings {
        let name = fm.field_name();

        if !fm.hidden() && schema.field(&om.tpe, name).is_none() {
            findings.push(ValidationFinding::error(format!(
                "Referenced field '{name}' does not exist in type '{}'",
                om.tpe
            )));
        }

        for required in fm.required() {
            if registry.field_mapping(prefix, &om.tpe, required).is_none() {
                findings.push(ValidationFinding::error(format!(
                    "Field '{name}' of type '{}' requires '{required}' which is not mapped",
                    om.tpe
                )));
            }
        }
    }
}
