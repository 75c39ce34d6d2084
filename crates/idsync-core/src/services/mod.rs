//! Services shared by idsync binaries.

mod directory;

pub use directory::DirectoryService;
