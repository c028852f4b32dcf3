//! Office Open XML (OOXML) support for Word documents.
//!
//! The module is organized into two layers:
//!
//! 1. **OPC Layer** (`opc`): Low-level package handling (ZIP, relationships)
//! 2. **WordprocessingML** (`docx`): The main document as an editable tree
//!
//! # Example: Working with Word Documents
//!
//! ```rust,no_run
//! use runspan::ooxml::docx::Package;
//!
//! // Open and read a document
//! let pkg = Package::open("document.docx")?;
//! let doc = pkg.document();
//!
//! // Extract text content
//! println!("Document contains {} paragraphs", doc.paragraphs().count());
//! println!("{}", doc.text());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
pub mod docx;
pub mod error;
pub mod opc;

// Re-export error types
pub use error::{OoxmlError, Result};
