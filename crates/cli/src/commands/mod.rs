pub mod make_migration;
pub mod migrate;
pub mod status;
pub mod version;
