//! Device and station extraction from hardware configuration pages.
//!
//! Device pages carry no schema either: entries show up as repeating
//! token windows (`Role`, value, `Template`, value, `ObjectId`, value)
//! inside the recovered string stream, while catalog data (component name
//! and order number) sits elsewhere in the page as raw length-prefixed
//! pairs behind a vendor marker. The two passes are cross-linked
//! first-match-in-order.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::DeviceInfo;
use crate::scanner::Segment;

use super::strings::length_prefixed_strings;
use super::{contains_bytes, PAGE_SIZE};

/// Marker identifying a station configuration page
const STATION_MARKER: &[u8] = b"S7PCentralStation";

/// Vendor marker preceding catalog name/order-number pairs
const VENDOR_MARKER: &[u8] = b"Siemens";

/// How many tokens past a `Role` marker the window may extend
const ROLE_WINDOW: usize = 6;

/// Vendor order numbers start with `6ES` and a digit
static ORDER_NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^6ES\d").expect("order pattern"));

/// Result of scanning the segment list for hardware configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceScan {
    /// Station name, when a station token was present
    pub station_name: Option<String>,
    /// Devices in discovery order; names may be backfilled from catalog
    /// entries in the same page
    pub devices: Vec<DeviceInfo>,
}

/// Extract hardware devices and the station name from configuration pages.
pub fn devices(segments: &[Segment]) -> DeviceScan {
    let mut scan = DeviceScan::default();

    for segment in segments {
        if segment.len() != PAGE_SIZE || !contains_bytes(&segment.payload, STATION_MARKER) {
            continue;
        }

        let tokens = length_prefixed_strings(&segment.payload);
        if tokens.is_empty() {
            continue;
        }

        if let Some(station) = tokens.iter().find(|t| t.contains("Station") && t.contains('/')) {
            scan.station_name = Some(station.clone());
        }

        collect_role_windows(&tokens, &mut scan.devices);
        backfill_from_catalog(&segment.payload, &mut scan.devices);
    }

    scan
}

/// Walk the token stream for `Role, <role>, Template, <template>,
/// ObjectId, <id>` windows. Template and ObjectId may arrive with a gap,
/// so the window looks ahead up to [`ROLE_WINDOW`] tokens.
fn collect_role_windows(tokens: &[String], devices: &mut Vec<DeviceInfo>) {
    let mut i = 0;
    while i + 1 < tokens.len() {
        if tokens[i] != "Role" || i + 5 >= tokens.len() {
            i += 1;
            continue;
        }

        let role = tokens[i + 1].clone();
        let mut template = String::new();
        let mut object_id = String::new();
        for j in i + 2..(i + 2 + ROLE_WINDOW).min(tokens.len()) {
            if tokens[j] == "Template" && j + 1 < tokens.len() {
                template = tokens[j + 1].clone();
            }
            if tokens[j] == "ObjectId" && j + 1 < tokens.len() {
                object_id = tokens[j + 1].clone();
            }
        }

        if !role.is_empty() && !template.is_empty() {
            devices.push(DeviceInfo {
                role,
                template,
                object_id,
                ..Default::default()
            });
        }
        i += ROLE_WINDOW;
    }
}

/// Scan the raw page for vendor catalog entries: the marker followed by a
/// length-prefixed component name and a length-prefixed order number. Each
/// entry names the first device still missing one, in order.
fn backfill_from_catalog(data: &[u8], devices: &mut [DeviceInfo]) {
    let mut i = 0;
    while i + 10 < data.len() {
        if !data[i..].starts_with(VENDOR_MARKER) {
            i += 1;
            continue;
        }

        let name_at = i + VENDOR_MARKER.len();
        if let Some((name, order)) = read_catalog_pair(data, name_at) {
            if ORDER_NUMBER_RE.is_match(&order) {
                if let Some(device) = devices
                    .iter_mut()
                    .find(|d| d.order_number.is_empty() && d.name.is_empty())
                {
                    device.name = name;
                    device.order_number = order;
                    device.manufacturer = "Siemens".to_string();
                }
            }
        }
        i += 1;
    }
}

/// Read two adjacent length-prefixed strings at `at`: component name
/// (3..=99 bytes) then order number (6..=49 bytes).
fn read_catalog_pair(data: &[u8], at: usize) -> Option<(String, String)> {
    let name_len = *data.get(at)? as usize;
    if !(3..=99).contains(&name_len) || at + 1 + name_len > data.len() {
        return None;
    }
    let name = String::from_utf8_lossy(&data[at + 1..at + 1 + name_len]).into_owned();

    let order_at = at + 1 + name_len;
    let order_len = *data.get(order_at)? as usize;
    if !(6..=49).contains(&order_len) || order_at + 1 + order_len > data.len() {
        return None;
    }
    let order = String::from_utf8_lossy(&data[order_at + 1..order_at + 1 + order_len]).into_owned();

    Some((name, order))
}
