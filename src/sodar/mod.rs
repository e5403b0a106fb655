/*!
 * SODAR metadata access
 *
 * Investigation lookup (which assay, which remote collection) and sample
 * sheet export (which library lives in which folder).
 */

pub mod client;
pub mod isa;
pub mod models;

pub use client::{MetadataSource, SodarClient};
pub use isa::{IsaTable, LibraryInfo, RemoteFolderMapping};
pub use models::{Assay, Investigation, IsaFile, SampleSheet, Study};
