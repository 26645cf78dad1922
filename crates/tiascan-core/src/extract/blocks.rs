//! Program-block interface extraction.
//!
//! Interface pages carry `<Member …>` records under a `<Root RIdSlots`
//! element. Three separate heuristics cooperate here:
//!
//! - member records are matched with a tolerant attribute grammar,
//! - the owning block's identity is inferred from an ordered marker-rule
//!   table (the pages never name their block directly),
//! - the interface section of each member is resolved from named section
//!   boundaries in the decoded text.
//!
//! The marker table is calibrated against observed project files and is
//! expected to grow as new tool versions surface new field names.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{BlockMember, ProgramBlock, Section};
use crate::scanner::Segment;

use super::{contains_bytes, PAGE_SIZE};

/// Marker identifying an interface-table page
const ROOT_MARKER: &[u8] = b"<Root RIdSlots";

/// Block name used when no identity rule matches
const PLACEHOLDER_NAME: &str = "Unknown";

/// One block-identity inference rule: if any marker is present in the raw
/// page, the block gets this name and type. Rules are evaluated in order;
/// the first match wins.
struct BlockRule {
    markers: &'static [&'static [u8]],
    name: &'static str,
    block_type: &'static str,
}

const BLOCK_RULES: [BlockRule; 4] = [
    BlockRule {
        markers: &[b"F_PROG_DAT", b"F_RTG_DAT"],
        name: "SafeSys (F-System DB)",
        block_type: "DB",
    },
    BlockRule {
        markers: &[b"ChannelInfo"],
        name: "DiagnosticAlarm (OB82)",
        block_type: "OB",
    },
    BlockRule {
        markers: &[b"_dnVKE_", b"_lnCACHE"],
        name: "F_CTRL (Safety FB)",
        block_type: "FB",
    },
    BlockRule {
        markers: &[b"IdentXmlPart"],
        name: "Main (OB1)",
        block_type: "OB",
    },
];

/// RID (internal 32-bit type identifier) to IEC data-type name.
/// Keys are lowercase hex as the identifiers appear in the container.
const RID_TYPES: [(&str, &str); 41] = [
    ("0x02000001", "Bool"),
    ("0x02000002", "Byte"),
    ("0x02000003", "Char"),
    ("0x02000004", "Int"),
    ("0x02000005", "Word"),
    ("0x02000006", "DWord"),
    ("0x02000007", "DInt"),
    ("0x02000008", "Real"),
    ("0x02000009", "Date"),
    ("0x0200000a", "Time_Of_Day"),
    ("0x0200000b", "Time"),
    ("0x0200000c", "S5Time"),
    ("0x02000010", "Date_And_Time"),
    ("0x02000014", "String"),
    ("0x02000019", "Pointer"),
    ("0x0200001a", "Any"),
    ("0x02000030", "LReal"),
    ("0x02000031", "ULInt"),
    ("0x02000032", "LInt"),
    ("0x02000033", "LWord"),
    ("0x02000034", "USInt"),
    ("0x02000035", "UInt"),
    ("0x02000036", "UDInt"),
    ("0x02000037", "SInt"),
    ("0x02000038", "WChar"),
    ("0x02000039", "WString"),
    ("0x0200003a", "LTime"),
    ("0x02000040", "LDT"),
    ("0x02000041", "DTL"),
    ("0x02000043", "DTL"),
    ("0x02000090", "HW_IO"),
    ("0x02000091", "HW_DEVICE"),
    ("0x02000092", "HW_DPMASTER"),
    ("0x02000093", "HW_DPSLAVE"),
    ("0x02000094", "HW_IOSYSTEM"),
    ("0x02000095", "HW_SUBMODULE"),
    ("0x02000096", "Conn_Any"),
    ("0x020000a0", "DB_ANY"),
    ("0x020000a1", "DB_WWW"),
    ("0x020000a2", "DB_DYN"),
    ("0x02080022", "F_SYSINFO"),
];

static MEMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"<Member ID="(\d+)" Name="([^"]+)" RID="([^"]+)"(?:\s+StdO="(\d+)")?(?:\s+[^/]*)?\s*LID="(\d+)""#,
    )
    .expect("member pattern")
});

static SECTION_BOUNDARY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"Name="(Input|Output|InOut|Static|Temp|Constant)"[^>]*>"#)
        .expect("section boundary pattern")
});

/// Resolve a raw RID to its IEC data-type name.
///
/// Total over all inputs: a RID absent from the table resolves to its own
/// lowercase-hex string unchanged, so unknown tool versions lose nothing.
pub fn resolve_rid(rid: &str) -> String {
    let lower = rid.to_ascii_lowercase();
    RID_TYPES
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or(lower)
}

/// Extract program blocks with their interface members.
///
/// One [`ProgramBlock`] per qualifying page; deduplication across pages is
/// the aggregator's job, since it needs the first-seen ordering of the
/// whole run.
pub fn blocks(segments: &[Segment]) -> Vec<ProgramBlock> {
    let mut found = Vec::new();

    for segment in segments {
        if segment.len() != PAGE_SIZE || !contains_bytes(&segment.payload, ROOT_MARKER) {
            continue;
        }

        let text = String::from_utf8_lossy(&segment.payload);
        let members = extract_members(&text);
        if members.is_empty() {
            continue;
        }

        let (name, block_type) = identify_block(&segment.payload);
        found.push(ProgramBlock {
            name: name.to_string(),
            block_type: block_type.to_string(),
            members,
        });
    }

    found
}

/// Apply [`BLOCK_RULES`] in priority order against the raw page bytes
fn identify_block(data: &[u8]) -> (&'static str, &'static str) {
    for rule in &BLOCK_RULES {
        if rule.markers.iter().any(|m| contains_bytes(data, m)) {
            return (rule.name, rule.block_type);
        }
    }
    (PLACEHOLDER_NAME, "OB")
}

/// Section boundary located in the decoded text
struct SectionBoundary {
    section: Section,
    marker_start: usize,
    content_start: usize,
}

/// Extract members with section assignment.
///
/// Members between a section boundary and the nearest following boundary
/// of another section belong to that section. Pages without any boundary
/// markers are parsed flat, every member Static.
fn extract_members(text: &str) -> Vec<BlockMember> {
    let boundaries = section_boundaries(text);
    if boundaries.is_empty() {
        return flat_members(text);
    }

    let mut members = Vec::new();
    for boundary in &boundaries {
        let end = boundaries
            .iter()
            .filter(|other| other.section != boundary.section)
            .map(|other| other.marker_start)
            .filter(|&start| start > boundary.content_start)
            .min()
            .unwrap_or(text.len());

        for capture in MEMBER_RE.captures_iter(&text[boundary.content_start..end]) {
            members.push(member_from_capture(&capture, boundary.section));
        }
    }

    if members.is_empty() {
        // Boundary markers that fence no members at all; parse flat
        return flat_members(text);
    }
    members
}

/// First occurrence of each named section marker, in text order
fn section_boundaries(text: &str) -> Vec<SectionBoundary> {
    let mut boundaries: Vec<SectionBoundary> = Vec::new();
    for capture in SECTION_BOUNDARY_RE.captures_iter(text) {
        let whole = capture.get(0).expect("match");
        let section = match &capture[1] {
            "Input" => Section::Input,
            "Output" => Section::Output,
            "InOut" => Section::InOut,
            "Static" => Section::Static,
            "Temp" => Section::Temp,
            _ => Section::Constant,
        };
        if boundaries.iter().any(|b| b.section == section) {
            continue;
        }
        boundaries.push(SectionBoundary {
            section,
            marker_start: whole.start(),
            content_start: whole.end(),
        });
    }
    boundaries
}

/// Flat fallback: every member Static, section-header names skipped
fn flat_members(text: &str) -> Vec<BlockMember> {
    MEMBER_RE
        .captures_iter(text)
        .filter(|capture| {
            let name = &capture[2];
            !Section::ALL.iter().any(|s| s.as_str() == name) && name != "Return"
        })
        .map(|capture| member_from_capture(&capture, Section::Static))
        .collect()
}

fn member_from_capture(capture: &regex::Captures<'_>, section: Section) -> BlockMember {
    let rid = capture[3].to_ascii_lowercase();
    BlockMember {
        member_id: capture[1].parse().unwrap_or(0),
        name: capture[2].to_string(),
        data_type: resolve_rid(&rid),
        rid,
        lid: capture[5].parse().unwrap_or(0),
        offset: capture
            .get(4)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(-1),
        section,
    }
}
