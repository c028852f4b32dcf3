/// Open Packaging Conventions (OPC) support.
///
/// A .docx file is a ZIP archive of parts tied together by relationship parts.
/// This module covers the pieces the editor needs:
///
/// - ZIP-based physical packaging that keeps member order (`phys_pkg`)
/// - Relationship parsing and part name resolution (`rel`)
/// - Content type, namespace and relationship type URIs (`constants`)
pub mod constants;
pub mod phys_pkg;
pub mod rel;

// Re-export commonly used types
pub use phys_pkg::{PackageMember, PhysPkgReader, PhysPkgWriter};
pub use rel::{Relationship, parse_rels_xml};
