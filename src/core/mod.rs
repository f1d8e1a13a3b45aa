pub mod derive;
pub mod field;
pub mod loader;
pub mod schema;
pub mod table;

pub use schema::{Delimiter, SchemaDescriptor};
pub use table::{SeriesTable, TableSet};
