//! Cascade traversal for lifecycle operations.
//!
//! A persist, merge or remove pass creates one [`OperationCascader`] and
//! walks the object graph through it. Relation properties hand every
//! referenced entity back to the [`CascadeOperation`]; the cascader's
//! visited set keeps cyclic graphs from recursing forever.

mod cascade_type;
mod cascader;

use crate::entity::EntityHandle;
use crate::error::PersistenceError;

pub use cascade_type::{CascadeType, CascadeTypes};
pub use cascader::OperationCascader;

/// The operation a cascade pass applies to every reached entity.
pub trait CascadeOperation {
    fn cascade(&mut self, entity: EntityHandle) -> Result<(), CascadeError>;
}

impl<F> CascadeOperation for F
where
    F: FnMut(EntityHandle) -> Result<(), CascadeError>,
{
    fn cascade(&mut self, entity: EntityHandle) -> Result<(), CascadeError> {
        self(entity)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error("failed to cascade {cascade_type} to property {property}")]
    Property {
        cascade_type: CascadeType,
        property: String,
        #[source]
        source: Box<CascadeError>,
    },
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error("{0}")]
    Operation(String),
}

impl CascadeError {
    pub fn operation(message: impl Into<String>) -> Self {
        CascadeError::Operation(message.into())
    }

    /// Qualified names of the relations the failure travelled through, outermost first.
    pub fn property_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let CascadeError::Property {
            property, source, ..
        } = current
        {
            path.push(property.as_str());
            current = source;
        }
        path
    }

    /// The failure that started the chain.
    pub fn root_cause(&self) -> &CascadeError {
        let mut current = self;
        while let CascadeError::Property { source, .. } = current {
            current = source;
        }
        current
    }
}
