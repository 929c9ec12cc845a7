//! CLI commands implementation

pub mod db;
pub mod expand;
pub mod index;
pub mod init;
pub mod profile;
pub mod recommend;
pub mod search;
pub mod status;

pub use db::*;
pub use expand::*;
pub use index::*;
pub use init::*;
pub use profile::*;
pub use recommend::*;
pub use search::*;
pub use status::*;
