pub mod accuracy;
pub mod consistency;
pub mod derive;
pub mod semantic;
pub mod speed;
pub mod stability;

pub use derive::{derive_item, DerivedItem, MappingGrade};
