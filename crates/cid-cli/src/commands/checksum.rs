use super::{json_pretty, load_image, EXIT_SUCCESS};
use cid_schema::ChecksumVariant;
use std::path::Path;

pub fn run(manifest: &Path, variant: ChecksumVariant, json: bool) -> Result<u8, String> {
    let image = load_image(manifest)?;
    let checksum = variant.compute(&image);
    if json {
        let payload = serde_json::json!({
            "variant": variant,
            "checksum": checksum,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{checksum}");
    }
    Ok(EXIT_SUCCESS)
}
