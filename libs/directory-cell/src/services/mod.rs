pub mod registry;

pub use registry::FamilyDirectory;
