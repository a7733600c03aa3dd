//! Entity models - static mapping metadata consumed by the persistence context.
//!
//! Models describe a class's identifier, its ordered properties and its place
//! in a single-inheritance chain. They are declared as [`ModelDef`]s and
//! resolved together, so every model knows its ancestors and whether it is
//! itself specialized.
//!
//! ## Example
//!
//! ```ignore
//! use persistence_context::{IdDef, ModelDef, ModelRegistry, PropertyKind};
//!
//! let models = ModelRegistry::builder()
//!     .model(
//!         ModelDef::new("Animal")
//!             .id(IdDef::generated("id"))
//!             .property("id", PropertyKind::int()),
//!     )
//!     .model(ModelDef::new("Dog").extends("Animal"))
//!     .build()?;
//!
//! let dog = models.get("Dog").unwrap();
//! assert_eq!(dog.lineage(), ["Dog", "Animal"]);
//! ```

mod id;
mod model;
mod property;
mod registry;

pub use id::{IdCodecError, IdRep};
pub use model::{EntityModel, IdDef, ObjectCreationError};
pub use property::{Capabilities, EntityProperty, PropertyKind, RelationDef, ScalarType};
pub use registry::{ModelDef, ModelRegistry, ModelRegistryBuilder};

/// Error raised while resolving model declarations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("model {0} declared twice")]
    DuplicateModel(String),
    #[error("model {class} extends unknown model {super_class}")]
    UnknownSuperModel { class: String, super_class: String },
    #[error("inheritance cycle through model {0}")]
    InheritanceCycle(String),
    #[error("model {0} declares no identifier")]
    MissingId(String),
    #[error("model {0} redefines the identifier of its super model")]
    IdRedefined(String),
    #[error("identifier of model {class} names unknown property {property}")]
    UnknownIdProperty { class: String, property: String },
    #[error("property {class}::{property} cannot serve as identifier")]
    IdPropertyNotIdentifiable { class: String, property: String },
    #[error("property {class}::{property} is declared more than once")]
    DuplicateProperty { class: String, property: String },
}
