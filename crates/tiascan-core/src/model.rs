//! Project model types.
//!
//! Everything a full extraction run recovers ends up in a [`ProjectInfo`].
//! Records are plain data: they are assembled once by the project reader
//! and never mutated afterwards. [`ProjectInfo::summary`] renders the
//! deterministic multi-section report consumed by the CLI.

use std::fmt::Write as FmtWrite;

/// A hardware component discovered in a device configuration page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Catalog name, e.g. `CPU 1515F-2 PN`; filled by the catalog
    /// cross-link pass, may stay empty
    pub name: String,
    /// Device role, e.g. `CentralDevice`
    pub role: String,
    /// Template identifier the device was instantiated from
    pub template: String,
    /// Internal object identifier
    pub object_id: String,
    /// Vendor order number, e.g. `6ES7 515-2FM01-0AB0`
    pub order_number: String,
    /// Manufacturer name when the catalog entry names one
    pub manufacturer: String,
    /// Free-text description
    pub description: String,
}

/// CPU configuration recovered from attribute pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuInfo {
    /// CPU model name
    pub name: String,
    /// Vendor order number
    pub order_number: String,
    /// Firmware version string, e.g. `V2.1`
    pub firmware_version: String,
    /// CPU subtype identifier
    pub subtype: String,
    /// Free-text description, truncated to 200 characters
    pub description: String,
    /// Maximum number of program blocks the CPU supports
    pub max_blocks: u32,
    /// Decoded programming language list, e.g. `LAD, FBD, SCL`
    pub supported_languages: String,
}

/// A library version reference
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryRef {
    /// Library GUID
    pub guid: String,
    /// Human-readable version
    pub display_version: String,
    /// Whether minor-version switching is enabled
    pub switch_minor: bool,
}

/// Interface section a block member belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Section {
    /// Input parameter
    Input,
    /// Output parameter
    Output,
    /// In/out parameter
    InOut,
    /// Static variable
    #[default]
    Static,
    /// Temporary variable
    Temp,
    /// Constant
    Constant,
}

impl Section {
    /// All sections, in the order they appear in interface pages
    pub const ALL: [Section; 6] = [
        Section::Input,
        Section::Output,
        Section::InOut,
        Section::Static,
        Section::Temp,
        Section::Constant,
    ];

    /// The section name as it appears in the container
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Input => "Input",
            Section::Output => "Output",
            Section::InOut => "InOut",
            Section::Static => "Static",
            Section::Temp => "Temp",
            Section::Constant => "Constant",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member of a program-block interface
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMember {
    /// Member identifier within the interface table
    pub member_id: u32,
    /// Member name
    pub name: String,
    /// Raw type identifier as found in the page, lowercase hex
    pub rid: String,
    /// Resolved IEC data-type name, or the raw RID when unknown
    pub data_type: String,
    /// Secondary internal identifier
    pub lid: u32,
    /// Byte offset within the block, -1 when absent
    pub offset: i32,
    /// Interface section the member was found in
    pub section: Section,
}

/// A program block and its interface members
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramBlock {
    /// Inferred block name; a generic placeholder when no marker matched
    pub name: String,
    /// Inferred block type (OB, FB, DB)
    pub block_type: String,
    /// Interface members in discovery order
    pub members: Vec<BlockMember>,
}

/// Aggregate root: everything recovered from one project
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectInfo {
    /// Project display name
    pub name: String,
    /// Tool-compatibility version from the descriptor
    pub tool_version: String,
    /// Station name from the device configuration
    pub station_name: String,
    /// CPU configuration; at most one per project, first match wins
    pub cpu: Option<CpuInfo>,
    /// Hardware components
    pub devices: Vec<DeviceInfo>,
    /// Library version references
    pub libraries: Vec<LibraryRef>,
    /// Schema package names
    pub packages: Vec<String>,
    /// Program blocks with interfaces
    pub blocks: Vec<ProgramBlock>,
    /// Distinct timestamps in discovery order
    pub timestamps: Vec<String>,
    /// Relational table name and row count, in enumeration order
    pub xref_tables: Vec<(String, i64)>,
}

impl ProjectInfo {
    /// Render the multi-section textual summary.
    ///
    /// Section order is fixed: banner, station, CPU, devices, libraries,
    /// packages, blocks, timestamps, relational tables. A section whose
    /// collection is empty is omitted entirely, so the output degrades
    /// gracefully when parts of the container were unreadable.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let rule = "=".repeat(60);

        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out, "  TIA Project: {}", self.name);
        let _ = writeln!(out, "  TIA Portal Version: {}", self.tool_version);
        let _ = writeln!(out, "{rule}");
        let _ = writeln!(out);

        if !self.station_name.is_empty() {
            let _ = writeln!(out, "  Station: {}", self.station_name);
        }
        if let Some(cpu) = &self.cpu {
            let _ = writeln!(out, "  CPU: {}", cpu.name);
            let _ = writeln!(out, "    Order Number: {}", cpu.order_number);
            let _ = writeln!(out, "    Firmware: {}", cpu.firmware_version);
            let _ = writeln!(out, "    Subtype: {}", cpu.subtype);
            let _ = writeln!(out, "    Max Blocks: {}", cpu.max_blocks);
            let _ = writeln!(out, "    Languages: {}", cpu.supported_languages);
        }
        if !self.devices.is_empty() {
            let _ = writeln!(out, "\n  Hardware Components ({}):", self.devices.len());
            for device in &self.devices {
                let extra = if device.order_number.is_empty() {
                    String::new()
                } else {
                    format!(" [{}]", device.order_number)
                };
                let _ = writeln!(out, "    - {} (Role: {}){}", device.name, device.role, extra);
            }
        }
        if !self.libraries.is_empty() {
            let _ = writeln!(out, "\n  Libraries ({}):", self.libraries.len());
            for library in &self.libraries {
                let _ = writeln!(out, "    - {}  {}", library.guid, library.display_version);
            }
        }
        if !self.packages.is_empty() {
            let _ = writeln!(out, "\n  MetaInfo Packages ({}):", self.packages.len());
            for package in &self.packages {
                let _ = writeln!(out, "    - {package}");
            }
        }
        if !self.blocks.is_empty() {
            let _ = writeln!(out, "\n  Program Blocks ({}):", self.blocks.len());
            for block in &self.blocks {
                let _ = writeln!(
                    out,
                    "    - {} ({}, {} members)",
                    block.name,
                    block.block_type,
                    block.members.len()
                );
            }
        }
        if !self.timestamps.is_empty() {
            let _ = writeln!(
                out,
                "\n  Timestamps: {} ... {}",
                self.timestamps[0],
                self.timestamps[self.timestamps.len() - 1]
            );
        }
        if !self.xref_tables.is_empty() {
            let _ = writeln!(out, "\n  XRef Database:");
            for (table, count) in &self.xref_tables {
                let _ = writeln!(out, "    - {table}: {count} rows");
            }
        }

        out
    }
}
