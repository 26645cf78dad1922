//! CPU attribute extraction.
//!
//! CPU configuration lives in attribute pages of the form
//! `<Attribute Name="FwVersion" Type="String" Value="V2.1" />`. The model
//! name and order number are not in those pages; they are resolved by a
//! second pass over the catalog pages, falling back to an already known
//! device. A project has at most one CPU in this model, so the first
//! qualifying page wins and extraction stops.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::model::{CpuInfo, DeviceInfo};
use crate::scanner::Segment;

use super::{contains_bytes, PAGE_SIZE};

/// Numeric programming-language codes as stored in the container
const LANGUAGE_CODES: [(&str, &str); 6] = [
    ("1", "LAD"),
    ("2", "FBD"),
    ("3", "STL"),
    ("4", "SCL"),
    ("5", "CFC"),
    ("6", "GRAPH"),
];

static CPU_NAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^CPU \d{4}").expect("cpu pattern"));
static CPU_ORDER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^6ES7 \d{3}").expect("cpu order pattern"));

/// Extract the CPU configuration, if any attribute page describes one.
///
/// `devices` provides the fallback for name resolution: a device whose
/// catalog name mentions `CPU` donates its name and order number when the
/// catalog pages yield nothing.
pub fn cpu(segments: &[Segment], devices: &[DeviceInfo]) -> Option<CpuInfo> {
    for segment in segments {
        if segment.len() != PAGE_SIZE {
            continue;
        }
        let data = &segment.payload;
        if !contains_bytes(data, br#"Attribute Name="FwVersion""#)
            && !contains_bytes(data, br#"Name="Subtype""#)
        {
            continue;
        }

        let text = String::from_utf8_lossy(data);
        let firmware = attribute_value(&text, "FwVersion");
        let subtype = attribute_value(&text, "Subtype");
        if firmware.is_empty() && subtype.is_empty() {
            continue;
        }

        let description = attribute_value(&text, "Description");
        let max_blocks = attribute_value(&text, "IecplMaxNumberOfBlocks");
        let languages = attribute_value(&text, "IecplSupportedLanguages");

        let (name, order_number) = resolve_identity(segments, devices);
        debug!("CPU attributes found: {name} fw={firmware}");

        return Some(CpuInfo {
            name,
            order_number,
            firmware_version: firmware,
            subtype,
            description: description.chars().take(200).collect(),
            max_blocks: max_blocks.parse().unwrap_or(0),
            supported_languages: decode_languages(&languages),
        });
    }

    None
}

/// Extract the `Value` of an exactly named attribute:
/// `<Attribute Name="K" Type="T" Value="V" />`
fn attribute_value(text: &str, name: &str) -> String {
    // Attribute keys are fixed identifiers, safe to splice into a pattern
    let pattern = format!(r#"<Attribute Name="{name}" Type="[^"]*" Value="([^"]*)""#);
    Regex::new(&pattern)
        .ok()
        .and_then(|re| re.captures(text).map(|c| c[1].to_string()))
        .unwrap_or_default()
}

/// Resolve the CPU model name and order number from catalog pages,
/// falling back to the device list.
fn resolve_identity(segments: &[Segment], devices: &[DeviceInfo]) -> (String, String) {
    let mut name = String::new();
    let mut order = String::new();

    for segment in segments {
        if segment.len() != PAGE_SIZE {
            continue;
        }
        let data = &segment.payload;
        if !contains_bytes(data, b"Siemens") || !contains_bytes(data, b"6ES7") {
            continue;
        }
        for token in super::length_prefixed_strings(data) {
            if name.is_empty() && CPU_NAME_RE.is_match(&token) {
                name = token.clone();
            }
            if order.is_empty() && CPU_ORDER_RE.is_match(&token) {
                order = token;
            }
        }
        if !name.is_empty() && !order.is_empty() {
            break;
        }
    }

    if name.is_empty() {
        for device in devices {
            if !device.order_number.is_empty() && device.name.contains("CPU") {
                name = device.name.clone();
                order = device.order_number.clone();
                break;
            }
        }
    }

    if name.is_empty() {
        name = "Unknown CPU".to_string();
    }
    (name, order)
}

/// Decode a semicolon-separated language code list to readable names.
/// Codes outside the table render as `?<code>`, so nothing is lost.
fn decode_languages(codes: &str) -> String {
    if codes.is_empty() {
        return String::new();
    }
    codes
        .split(';')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(|code| {
            LANGUAGE_CODES
                .iter()
                .find(|(k, _)| *k == code)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| format!("?{code}"))
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn attribute_page(body: &str) -> Segment {
        let mut payload = body.as_bytes().to_vec();
        payload.resize(PAGE_SIZE, b' ');
        Segment {
            offset: 0,
            compressed_len: 0,
            payload,
        }
    }

    fn prefixed(s: &str) -> Vec<u8> {
        let mut out = vec![s.len() as u8];
        out.extend_from_slice(s.as_bytes());
        out
    }

    fn catalog_page(tokens: &[&str]) -> Segment {
        let mut payload = b"Siemens 6ES7 ".to_vec();
        for token in tokens {
            payload.extend(prefixed(token));
            payload.push(0);
        }
        payload.resize(PAGE_SIZE, 0);
        Segment {
            offset: 0,
            compressed_len: 0,
            payload,
        }
    }

    #[test]
    fn test_firmware_and_subtype() {
        let page = attribute_page(concat!(
            r#"<Attribute Name="FwVersion" Type="String" Value="V2.1" />"#,
            r#"<Attribute Name="Subtype" Type="String" Value="F" />"#,
            r#"<Attribute Name="IecplMaxNumberOfBlocks" Type="Int32" Value="6000" />"#,
            r#"<Attribute Name="IecplSupportedLanguages" Type="String" Value="1;2;4" />"#,
        ));

        let info = cpu(&[page], &[]).unwrap();
        assert_eq!(info.firmware_version, "V2.1");
        assert_eq!(info.subtype, "F");
        assert_eq!(info.max_blocks, 6000);
        assert_eq!(info.supported_languages, "LAD, FBD, SCL");
        assert_eq!(info.name, "Unknown CPU");
    }

    #[test]
    fn test_name_resolved_from_catalog_page() {
        let attrs = attribute_page(r#"<Attribute Name="FwVersion" Type="String" Value="V2.1" />"#);
        let catalog = catalog_page(&["CPU 1515F-2 PN", "6ES7 515-2FM01-0AB0"]);

        let info = cpu(&[attrs, catalog], &[]).unwrap();
        assert_eq!(info.name, "CPU 1515F-2 PN");
        assert_eq!(info.order_number, "6ES7 515-2FM01-0AB0");
    }

    #[test]
    fn test_name_falls_back_to_device_list() {
        let attrs = attribute_page(r#"<Attribute Name="FwVersion" Type="String" Value="V3.0" />"#);
        let devices = vec![DeviceInfo {
            name: "CPU 1516-3 PN/DP".into(),
            order_number: "6ES7 516-3AN02-0AB0".into(),
            ..Default::default()
        }];

        let info = cpu(&[attrs], &devices).unwrap();
        assert_eq!(info.name, "CPU 1516-3 PN/DP");
        assert_eq!(info.order_number, "6ES7 516-3AN02-0AB0");
    }

    #[test]
    fn test_unknown_language_codes_render_visibly() {
        assert_eq!(decode_languages("1;9;6"), "LAD, ?9, GRAPH");
        assert_eq!(decode_languages(""), "");
        assert_eq!(decode_languages("4; ;2"), "SCL, FBD");
    }

    #[test]
    fn test_first_cpu_page_wins() {
        let first = attribute_page(r#"<Attribute Name="FwVersion" Type="String" Value="V2.1" />"#);
        let second = attribute_page(r#"<Attribute Name="FwVersion" Type="String" Value="V9.9" />"#);

        let info = cpu(&[first, second], &[]).unwrap();
        assert_eq!(info.firmware_version, "V2.1");
    }

    #[test]
    fn test_no_attribute_page_no_cpu() {
        let page = attribute_page("<Unrelated />");
        assert!(cpu(&[page], &[]).is_none());
    }
}
