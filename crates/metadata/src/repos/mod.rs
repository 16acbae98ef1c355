//! Repository traits for metadata operations.

pub mod directories;
pub mod files;
pub mod tags;

pub use directories::DirectoryRepo;
pub use files::FileRepo;
pub use tags::TagRepo;
