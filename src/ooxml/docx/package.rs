/// Package implementation for Word documents.
use crate::ooxml::docx::document::Document;
use crate::ooxml::docx::styles::Styles;
use crate::ooxml::error::{OoxmlError, Result};
use crate::ooxml::opc::constants::{content_type as ct, default_part, relationship_type as rt};
use crate::ooxml::opc::rel::{member_dir, parse_rels_xml, rels_membername};
use crate::ooxml::opc::{PackageMember, PhysPkgReader, PhysPkgWriter};
use std::io::Read;
use std::path::Path;

/// A Word (.docx) package.
///
/// This is the main entry point for working with Word documents. The whole
/// archive is held in memory; only the main document part is parsed and
/// re-serialized, every other part is written back byte for byte.
///
/// # Examples
///
/// ```rust,no_run
/// use runspan::ooxml::docx::Package;
///
/// let mut pkg = Package::open("document.docx")?;
/// println!("{}", pkg.document().text());
/// pkg.save("document (modified).docx")?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone)]
pub struct Package {
    /// Every archive member in original order
    members: Vec<PackageMember>,
    /// Member name of the main document part
    main_part: String,
    /// Parsed main document
    document: Document,
}

impl Package {
    /// Open a .docx package from a file path.
    ///
    /// The file is read completely and closed before this returns.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_phys(PhysPkgReader::open(path)?)
    }

    /// Create a .docx package from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_phys(PhysPkgReader::from_reader(reader)?)
    }

    /// Create a .docx package from archive bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_phys(PhysPkgReader::from_bytes(data)?)
    }

    /// Build a minimal package around a main document part.
    pub fn from_document_xml(document_xml: &[u8]) -> Result<Self> {
        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="{}"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/{}" ContentType="{}"/></Types>"#,
            ct::OPC_RELATIONSHIPS,
            default_part::MAIN_DOCUMENT,
            ct::WML_DOCUMENT_MAIN
        );
        let rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="{}" Target="{}"/></Relationships>"#,
            rt::OFFICE_DOCUMENT,
            default_part::MAIN_DOCUMENT
        );

        Self::from_phys(PhysPkgReader::from_members(vec![
            PackageMember {
                name: default_part::CONTENT_TYPES.to_string(),
                data: content_types.into_bytes(),
            },
            PackageMember {
                name: default_part::PACKAGE_RELS.to_string(),
                data: rels.into_bytes(),
            },
            PackageMember {
                name: default_part::MAIN_DOCUMENT.to_string(),
                data: document_xml.to_vec(),
            },
        ]))
    }

    fn from_phys(phys: PhysPkgReader) -> Result<Self> {
        let main_part = find_related(&phys, "", rt::OFFICE_DOCUMENT)?
            .unwrap_or_else(|| default_part::MAIN_DOCUMENT.to_string());

        let xml = phys
            .blob_for(&main_part)
            .ok_or_else(|| OoxmlError::PartNotFound(format!("main document part {}", main_part)))?;
        let mut document = Document::from_xml(xml)?;

        let styles_part = find_related(&phys, &main_part, rt::STYLES)?
            .unwrap_or_else(|| default_part::STYLES.to_string());
        if let Some(styles_xml) = phys.blob_for(&styles_part) {
            document.set_styles(Styles::parse(styles_xml)?);
        }

        Ok(Self {
            members: phys.into_members(),
            main_part,
            document,
        })
    }

    /// Get the main document.
    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Get the main document for editing.
    #[inline]
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Member name of the main document part (e.g. `word/document.xml`).
    #[inline]
    pub fn main_part_name(&self) -> &str {
        &self.main_part
    }

    /// Member names in archive order.
    pub fn member_names(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|m| m.name.as_str())
    }

    /// Serialize the package, writing members in their original order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = PhysPkgWriter::new();
        let document_xml = self.document.to_xml();
        for member in &self.members {
            if member.name == self.main_part {
                writer.write(&member.name, &document_xml)?;
            } else {
                writer.write(&member.name, &member.data)?;
            }
        }
        writer.finish()
    }

    /// Save the package to `path`.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_bytes()?)?;
        Ok(())
    }
}

/// Find the target of the first internal relationship of type `reltype`
/// originating at `source` (`""` for the package).
fn find_related(phys: &PhysPkgReader, source: &str, reltype: &str) -> Result<Option<String>> {
    let Some(rels_xml) = phys.blob_for(&rels_membername(source)) else {
        return Ok(None);
    };
    let rels = parse_rels_xml(rels_xml)?;
    Ok(rels
        .iter()
        .find(|r| r.reltype == reltype && !r.is_external())
        .map(|r| r.target_membername(member_dir(source))))
}
