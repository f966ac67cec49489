pub mod canonical;
pub mod checksum;
pub mod completions;
pub mod encode;
pub mod inspect;
pub mod man_pages;
pub mod normal_form;
pub mod verify;

use cid_schema::{parse_manifest_file, parse_manifest_slice, Image};
use std::io::Read;
use std::path::Path;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_FAILURE: u8 = 1;
pub const EXIT_MANIFEST_ERROR: u8 = 2;
pub const EXIT_CHECKSUM_MISMATCH: u8 = 3;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("JSON serialization failed: {e}"))
}

/// Load a manifest from a file, or from stdin when the path is `-`.
pub fn load_image(source: &Path) -> Result<Image, String> {
    let image = if source.as_os_str() == "-" {
        let mut data = Vec::new();
        std::io::stdin()
            .read_to_end(&mut data)
            .map_err(|e| format!("failed to read manifest file: {e}"))?;
        parse_manifest_slice(&data)
    } else {
        parse_manifest_file(source)
    };
    let image = image.map_err(|e| e.to_string())?;
    tracing::debug!("loaded manifest {} from {}", image.normal_form(), source.display());
    Ok(image)
}

pub fn colorize_verdict(ok: bool) -> String {
    use console::Style;
    if ok {
        Style::new().green().apply_to("OK").to_string()
    } else {
        Style::new().red().bold().apply_to("MISMATCH").to_string()
    }
}
