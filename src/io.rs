//! 入出力の薄いラッパー。パイプライン本体は [`crate::domain`] の型だけを扱う。

pub mod reader;
pub mod writer;

pub use reader::{LoadedRecords, load_records, read_records};
pub use writer::{write_memberships, write_memberships_to, write_report};
