mod arena;
mod entity;
mod value;

pub use arena::EntityArena;
pub use entity::{Entity, EntityHandle};
pub use value::{Lob, Value, Values};
