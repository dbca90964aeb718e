pub mod model;
pub mod reconcile;

pub use model::{CatalogEntry, EntryKey};
pub use reconcile::reconcile;
