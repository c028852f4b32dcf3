//! Runspan - run-aware editing of Word (.docx) documents
//!
//! Word stores a paragraph as a sequence of runs, and a run boundary can fall
//! anywhere, even in the middle of a word. This library edits documents at
//! that level: it finds text across run boundaries and changes only the runs
//! it has to, so the formatting of everything else survives.
//!
//! # Features
//!
//! - **Find & replace**: regex replacement that works across run boundaries
//! - **Highlight removal**: delete content tagged with a highlight colour,
//!   cleaning up the paragraphs, table rows and tables it leaves empty
//! - **Split by highlighting**: one document per highlight colour in use
//! - **Profiles**: YAML-configured template variants of a master document
//! - **Setting extraction**: relay settings from styled calculation documents,
//!   exported flat or merged into an Aspen database sheet
//!
//! # Example - Find & replace
//!
//! ```no_run
//! use runspan::edit::{EditContext, FindReplace, ParagraphRange};
//! use runspan::ooxml::docx::Package;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = Package::open("calcs.docx")?;
//! let mut ctx = EditContext::new("calcs.docx");
//!
//! FindReplace::new(r"OUT(\d)01", "OUT${1}02")?.apply(pkg.document_mut(), ParagraphRange::all(), &mut ctx)?;
//!
//! pkg.save("calcs (modified).docx")?;
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Removing highlighted content
//!
//! ```no_run
//! use runspan::edit::{EditContext, ParagraphRange, RemovalOptions, remove_highlighted};
//! use runspan::ooxml::docx::{Package, WdColorIndex};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut pkg = Package::open("master.docx")?;
//! let mut ctx = EditContext::new("master.docx");
//!
//! remove_highlighted(
//!     pkg.document_mut(),
//!     WdColorIndex::Red,
//!     &RemovalOptions::with_logic_placeholders(),
//!     ParagraphRange::all(),
//!     &mut ctx,
//! );
//! println!("{}", ctx.stats());
//! pkg.save("master (modified).docx")?;
//! # Ok(())
//! # }
//! ```

/// Error types and XML helpers shared across the crate
pub mod common;

/// Editing operations: find & replace, highlight removal, splitting
pub mod edit;

/// OOXML package access and the WordprocessingML document model
pub mod ooxml;

/// YAML-configured template profiles
pub mod profile;

/// Relay setting extraction, flat export and Aspen merge
pub mod settings;

pub use common::{Error, Result};
