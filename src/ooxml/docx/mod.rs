/// Word (.docx) document support.
///
/// This module provides reading and in-place editing of Microsoft Word
/// documents in the Office Open XML (OOXML) format (.docx files).
///
/// # Architecture
///
/// The module is organized around these key types:
/// - `Package`: The overall .docx file package
/// - `Document`: The main document part, held as an arena XML tree
/// - `Paragraph`: A paragraph with runs
/// - `Run`: A text run with formatting
/// - `Table`: A table with rows and cells
///
/// Views borrow the document; edits take `&mut Document` plus a typed handle
/// (`ParagraphId`, `RunId`, `TableId`, `RowId`, `CellId`).
///
/// # Example
///
/// ```rust,no_run
/// use runspan::ooxml::docx::Package;
///
/// // Open a document
/// let package = Package::open("document.docx")?;
/// let doc = package.document();
///
/// // Access paragraphs and runs
/// for id in doc.paragraphs() {
///     let para = doc.paragraph(id);
///     println!("Paragraph: {}", para.text());
///     for run in para.runs() {
///         println!("  Run: {} (bold: {})", run.text(), run.is_bold());
///     }
/// }
///
/// // Access tables
/// for table in doc.tables() {
///     for row in doc.table(table).rows() {
///         for cell in row.cells() {
///             println!("Cell: {}", cell.text());
///         }
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub mod bookmark;
pub mod document;
pub mod enums;
pub mod package;
pub mod paragraph;
pub mod styles;
pub mod table;
pub mod tree;

pub use bookmark::Bookmark;
pub use document::{Document, NodeHandle};
pub use enums::WdColorIndex;
pub use package::Package;
pub use paragraph::{Paragraph, ParagraphId, ParagraphRemoval, Run, RunId};
pub use styles::{Style, Styles};
pub use table::{Cell, CellId, Row, RowId, Table, TableId, TableRemoval};
pub use tree::{NodeId, XmlTree};
