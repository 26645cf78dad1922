//! Project reading and aggregation.
//!
//! [`ProjectReader`] ties the pieces together: it resolves the project
//! directory, pulls the display name and tool version out of the XML
//! descriptor, scans the binary container, fans the segment list out to
//! every extractor, and merges the results into one [`ProjectInfo`].
//!
//! Only directory resolution can fail. Everything below it degrades: a
//! missing container or companion database simply leaves its sections of
//! the model empty.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::extract;
use crate::model::{ProgramBlock, ProjectInfo};
use crate::plf::Header;
use crate::scanner::Scanner;
use crate::xref;

/// Descriptor files are named `<project>.ap<version>`, e.g. `.ap17`
static DESCRIPTOR_EXT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ap\d+$").expect("descriptor extension pattern"));

/// Container location inside a project directory
const CONTAINER_RELATIVE: &[&str] = &["System", "PEData.plf"];

/// Companion database location inside a project directory
const XREF_RELATIVE: &[&str] = &["XRef", "XRef.db"];

/// Reads a project directory and extracts all available information
#[derive(Debug, Clone)]
pub struct ProjectReader {
    project_dir: PathBuf,
}

impl ProjectReader {
    /// Create a reader for a project directory.
    ///
    /// Accepts either the directory itself or the path of the project
    /// descriptor file inside it (which resolves to its parent). The only
    /// fatal condition in the whole crate lives here: the resolved
    /// directory must exist.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let project_dir = if has_descriptor_extension(path) {
            path.parent().unwrap_or_else(|| Path::new(".")).to_path_buf()
        } else {
            path.to_path_buf()
        };

        if !project_dir.is_dir() {
            return Err(Error::project_not_found(project_dir));
        }
        Ok(Self { project_dir })
    }

    /// The resolved project directory
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Read the full project.
    ///
    /// Infallible by design: extraction is a pure function of whatever
    /// files are present, and absent files leave their sections empty.
    pub fn read(&self) -> ProjectInfo {
        let mut info = ProjectInfo::default();

        self.read_descriptor(&mut info);
        self.read_container(&mut info);
        info.xref_tables = xref::table_row_counts(&join_all(&self.project_dir, XREF_RELATIVE));

        info
    }

    /// Resolve project name and tool version from the XML descriptor
    fn read_descriptor(&self, info: &mut ProjectInfo) {
        let Some(descriptor) = self.find_descriptor() else {
            info.name = file_name_string(&self.project_dir);
            return;
        };

        match parse_descriptor(&descriptor) {
            Ok((name, version)) => {
                info.name = name;
                info.tool_version = version;
            }
            Err(e) => {
                debug!("descriptor fallback: {e}");
                info.name = descriptor
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
            }
        }
    }

    /// First descriptor file in the project directory, by file name
    fn find_descriptor(&self) -> Option<PathBuf> {
        let mut candidates: Vec<PathBuf> = WalkDir::new(&self.project_dir)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| has_descriptor_extension(p))
            .collect();
        candidates.sort();
        candidates.into_iter().next()
    }

    /// Scan the binary container and run every extractor over it
    fn read_container(&self, info: &mut ProjectInfo) {
        let container = join_all(&self.project_dir, CONTAINER_RELATIVE);
        let data = match fs::read(&container) {
            Ok(data) => data,
            Err(e) => {
                debug!("container unavailable at {}: {e}", container.display());
                return;
            }
        };

        let header = Header::parse(&data);
        trace!(
            "container header: version {}, {} entries, {} blocks declared",
            header.version,
            header.entry_count,
            header.block_count
        );

        let segments = Scanner::new().scan(&data);
        debug!("{} segments recovered from container", segments.len());

        info.packages = extract::packages(&segments);

        let device_scan = extract::devices(&segments);
        info.station_name = device_scan.station_name.unwrap_or_default();
        info.devices = device_scan.devices;

        info.cpu = extract::cpu(&segments, &info.devices);
        info.libraries = extract::libraries(&segments);
        info.blocks = dedup_blocks(extract::blocks(&segments));
        info.timestamps = extract::timestamps(&segments);
    }
}

/// Merge repeated interface observations: the same logical block often
/// appears in more than one page. First occurrence wins.
///
/// The signature is the block name plus its first five member names; two
/// genuinely distinct blocks sharing both would collide, which is an
/// accepted limitation of the heuristic.
fn dedup_blocks(blocks: Vec<ProgramBlock>) -> Vec<ProgramBlock> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for block in blocks {
        let hash = signature_hash(&block);
        if seen.insert(hash) {
            kept.push(block);
        } else {
            debug!("duplicate interface page for '{}' dropped", block.name);
        }
    }
    kept
}

/// Short content hash of a block's dedup signature
fn signature_hash(block: &ProgramBlock) -> String {
    let names: Vec<&str> = block
        .members
        .iter()
        .take(5)
        .map(|m| m.name.as_str())
        .collect();
    let signature = format!("{}:{}", block.name, names.join(","));
    blake3::hash(signature.as_bytes()).to_hex()[..8].to_string()
}

/// Pull `Name` and `ProjectCompatibilityVersion` off the root element
fn parse_descriptor(path: &Path) -> Result<(String, String)> {
    let xml = fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
    let mut reader = Reader::from_str(&xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) | Ok(Event::Empty(element)) => {
                let mut name = String::new();
                let mut version = String::new();
                for attribute in element.attributes().flatten() {
                    let value = attribute
                        .unescape_value()
                        .map(|v| v.into_owned())
                        .unwrap_or_default();
                    match attribute.key.as_ref() {
                        b"Name" => name = value,
                        b"ProjectCompatibilityVersion" => version = value,
                        _ => {}
                    }
                }
                return Ok((name, version));
            }
            Ok(Event::Eof) => {
                return Err(Error::descriptor_parse(path, "no root element"));
            }
            Err(e) => {
                return Err(Error::descriptor_parse(path, e.to_string()));
            }
            _ => {}
        }
    }
}

fn has_descriptor_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| DESCRIPTOR_EXT_RE.is_match(e))
        .unwrap_or(false)
}

fn file_name_string(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn join_all(base: &Path, parts: &[&str]) -> PathBuf {
    let mut path = base.to_path_buf();
    for part in parts {
        path.push(part);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Section;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::TempDir;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn page_4096(content: &[u8]) -> Vec<u8> {
        let mut page = content.to_vec();
        page.resize(4096, b' ');
        page
    }

    /// Write a container: all-zero header followed by compressed pages
    fn write_container(dir: &Path, pages: &[Vec<u8>]) {
        let system = dir.join("System");
        fs::create_dir_all(&system).unwrap();
        let mut data = vec![0u8; 64];
        for page in pages {
            data.extend(deflate(page));
            data.extend_from_slice(&[0x11, 0x22, 0x33]); // inter-page noise
        }
        fs::write(system.join("PEData.plf"), data).unwrap();
    }

    fn write_descriptor(dir: &Path, file_name: &str, content: &str) {
        fs::write(dir.join(file_name), content).unwrap();
    }

    #[test]
    fn test_descriptor_attributes() {
        let dir = TempDir::new().unwrap();
        write_descriptor(
            dir.path(),
            "Plant.ap17",
            r#"<?xml version="1.0"?><Document Name="Plant" ProjectCompatibilityVersion="V17" />"#,
        );

        let info = ProjectReader::new(dir.path()).unwrap().read();
        assert_eq!(info.name, "Plant");
        assert_eq!(info.tool_version, "V17");
    }

    #[test]
    fn test_malformed_descriptor_falls_back_to_stem() {
        let dir = TempDir::new().unwrap();
        write_descriptor(dir.path(), "Plant.ap17", "<not </ well-formed");

        let info = ProjectReader::new(dir.path()).unwrap().read();
        assert_eq!(info.name, "Plant");
        assert_eq!(info.tool_version, "");
    }

    #[test]
    fn test_no_descriptor_uses_directory_name() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("Warehouse");
        fs::create_dir_all(&project).unwrap();

        let info = ProjectReader::new(&project).unwrap().read();
        assert_eq!(info.name, "Warehouse");
        assert!(info.devices.is_empty());
        assert!(info.blocks.is_empty());
        assert!(info.xref_tables.is_empty());
    }

    #[test]
    fn test_descriptor_path_resolves_to_parent() {
        let dir = TempDir::new().unwrap();
        write_descriptor(dir.path(), "Plant.ap14", r#"<Document Name="Plant" />"#);

        let reader = ProjectReader::new(dir.path().join("Plant.ap14")).unwrap();
        assert_eq!(reader.project_dir(), dir.path());
    }

    #[test]
    fn test_missing_directory_is_fatal() {
        let err = ProjectReader::new("/definitely/not/here").unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound { .. }));
    }

    #[test]
    fn test_firmware_version_end_to_end() {
        let dir = TempDir::new().unwrap();
        write_container(
            dir.path(),
            &[page_4096(
                br#"<Attribute Name="FwVersion" Type="String" Value="V2.1" />"#,
            )],
        );

        let info = ProjectReader::new(dir.path()).unwrap().read();
        let cpu = info.cpu.expect("cpu recovered");
        assert_eq!(cpu.firmware_version, "V2.1");
    }

    #[test]
    fn test_block_member_end_to_end() {
        let dir = TempDir::new().unwrap();
        write_container(
            dir.path(),
            &[page_4096(
                br#"<Root RIdSlots="4"><Member ID="1" Name="Enable" RID="0x02000001" LID="5" /></Root>"#,
            )],
        );

        let info = ProjectReader::new(dir.path()).unwrap().read();
        assert_eq!(info.blocks.len(), 1);
        let member = &info.blocks[0].members[0];
        assert_eq!(member.name, "Enable");
        assert_eq!(member.data_type, "Bool");
        assert_eq!(member.lid, 5);
        assert_eq!(member.section, Section::Static);
    }

    #[test]
    fn test_duplicate_interface_pages_merged() {
        let page = page_4096(
            br#"<Root RIdSlots="4"><Member ID="1" Name="Enable" RID="0x02000001" LID="5" /></Root>"#,
        );
        let dir = TempDir::new().unwrap();
        write_container(dir.path(), &[page.clone(), page]);

        let info = ProjectReader::new(dir.path()).unwrap().read();
        assert_eq!(info.blocks.len(), 1);
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_descriptor(
            dir.path(),
            "Plant.ap17",
            r#"<Document Name="Plant" ProjectCompatibilityVersion="V17" />"#,
        );
        write_container(
            dir.path(),
            &[
                page_4096(br#"<Attribute Name="FwVersion" Type="String" Value="V2.1" />"#),
                page_4096(b"edited 2/19/2026 11:20:55 AM by operator"),
            ],
        );

        let reader = ProjectReader::new(dir.path()).unwrap();
        let first = reader.read();
        let second = reader.read();
        assert_eq!(first, second);
        assert_eq!(first.timestamps, vec!["2/19/2026 11:20:55 AM"]);
    }

    #[test]
    fn test_distinct_blocks_both_kept() {
        let first = page_4096(
            br#"<Root RIdSlots="4"><Member ID="1" Name="Enable" RID="0x02000001" LID="5" /></Root>"#,
        );
        let second = page_4096(concat!(
            r#"<Root RIdSlots="4">IdentXmlPart"#,
            r#"<Member ID="1" Name="Enable" RID="0x02000001" LID="5" /></Root>"#,
        ).as_bytes());
        let dir = TempDir::new().unwrap();
        write_container(dir.path(), &[first, second]);

        let info = ProjectReader::new(dir.path()).unwrap().read();
        // Same members but different inferred identity: both survive dedup
        assert_eq!(info.blocks.len(), 2);
        assert_eq!(info.blocks[1].name, "Main (OB1)");
    }
}
