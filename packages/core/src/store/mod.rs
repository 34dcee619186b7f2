//! On-Disk Document Store
//!
//! The only module that performs serialization and filesystem access.
//! Documents are YAML or JSON, interchangeable by extension; backups are
//! byte-for-byte `<path>.backup` copies taken before the first mutating
//! write of an operation.

pub mod document;
pub mod error;

pub use document::{
    is_index_filename, load, parse_document, read_text, save, to_text, write_backup,
    DocumentFormat, BACKUP_SUFFIX, INDEX_FILENAMES,
};
pub use error::StoreError;
