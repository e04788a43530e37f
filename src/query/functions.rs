//! Wrappers for Cypher built-in functions used in projections and predicates.
use crate::types::{BuilderError, Result};

/// `elementId(tag)`; only bare node or relationship tags are accepted.
pub fn element_id(tag: &str) -> Result<String> {
    if tag.contains('.') {
        return Err(BuilderError::ElementIdOnProperty {
            value: tag.to_owned(),
        });
    }
    Ok(format!("elementId({tag})"))
}

/// `keys(expr)`
pub fn keys(expr: &str) -> String {
    format!("keys({expr})")
}

/// `type(expr)`
pub fn type_of(expr: &str) -> String {
    format!("type({expr})")
}
