//! Shared model fixtures for the persistence context tests.
//!
//! - `Article` has a generated int id, cascades persist/remove to its author
//!   and everything to its comments.
//! - `Animal` is specialized by `Dog` and `Cat`, sharing one id space.
//! - `Vehicle` is abstract, `Car` is its only concrete model.
//! - `Tag` uses an assigned text key.

#![allow(dead_code)]

use std::sync::Arc;

use persistence_context::{
    CascadeType, CascadeTypes, EntityModel, IdDef, InMemoryProxyManager, ModelDef, ModelRegistry,
    PersistenceContext, PropertyKind, RelationDef,
};

/// Session token carried by lazy-load bindings in tests.
pub type Session = &'static str;

pub type TestContext = PersistenceContext<InMemoryProxyManager<Session>>;

pub fn models() -> ModelRegistry {
    ModelRegistry::builder()
        .model(
            ModelDef::new("Article")
                .id(IdDef::generated("id"))
                .property("id", PropertyKind::int())
                .property("title", PropertyKind::text())
                .property("attachment", PropertyKind::Lob)
                .property(
                    "author",
                    PropertyKind::to_one(
                        RelationDef::new("User").cascade(CascadeType::Persist | CascadeType::Remove),
                    ),
                )
                .property(
                    "comments",
                    PropertyKind::to_many(RelationDef::new("Comment").cascade(CascadeTypes::ALL)),
                ),
        )
        .model(
            ModelDef::new("User")
                .id(IdDef::generated("id"))
                .property("id", PropertyKind::int())
                .property("name", PropertyKind::text()),
        )
        .model(
            ModelDef::new("Comment")
                .id(IdDef::generated("id"))
                .property("id", PropertyKind::int())
                .property("body", PropertyKind::text())
                .property("article", PropertyKind::to_one(RelationDef::new("Article"))),
        )
        .model(
            ModelDef::new("Animal")
                .id(IdDef::generated("id"))
                .property("id", PropertyKind::int())
                .property("name", PropertyKind::text()),
        )
        .model(
            ModelDef::new("Dog")
                .extends("Animal")
                .property("breed", PropertyKind::text()),
        )
        .model(ModelDef::new("Cat").extends("Animal"))
        .model(
            ModelDef::new("Vehicle")
                .abstract_class()
                .id(IdDef::generated("id"))
                .property("id", PropertyKind::int()),
        )
        .model(ModelDef::new("Car").extends("Vehicle"))
        .model(
            ModelDef::new("Tag")
                .id(IdDef::assigned("slug"))
                .property("slug", PropertyKind::text())
                .property("language", PropertyKind::Locale),
        )
        .build()
        .expect("fixture models are valid")
}

pub fn model(models: &ModelRegistry, class: &str) -> Arc<EntityModel> {
    models
        .get(class)
        .unwrap_or_else(|| panic!("fixture model {class} is registered"))
}

pub fn context() -> TestContext {
    init_tracing();
    PersistenceContext::new(InMemoryProxyManager::new())
}

/// Route `tracing` output to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
