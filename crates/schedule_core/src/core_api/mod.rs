mod engine;
mod error;
mod types;
pub mod product_catalog;
pub mod rank_catalog;

pub use engine::{Engine, Session};
pub use error::{CoreError, CoreErrorCode};
pub use types::{
    CreationDate, ItemTarget, ItemUpdate, ProductGeneration, QuestCompletion, SaveInfo, SaveSlot,
};
