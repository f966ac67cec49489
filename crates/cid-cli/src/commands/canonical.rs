use super::{json_pretty, load_image, EXIT_SUCCESS};
use cid_schema::Canonical;
use std::path::Path;

/// Print the value sequence that the manifest checksum is computed over.
pub fn run(manifest: &Path, json: bool) -> Result<u8, String> {
    let image = load_image(manifest)?;
    let values = image.canonical_values();
    if json {
        println!("{}", json_pretty(&values)?);
    } else {
        for value in &values {
            // Quoted so empty values stay visible.
            let quoted = serde_json::to_string(value)
                .map_err(|e| format!("JSON serialization failed: {e}"))?;
            println!("{quoted}");
        }
    }
    Ok(EXIT_SUCCESS)
}
