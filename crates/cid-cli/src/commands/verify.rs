use super::{colorize_verdict, json_pretty, load_image, EXIT_CHECKSUM_MISMATCH, EXIT_SUCCESS};
use cid_schema::{verify_checksum, ChecksumVariant, ManifestError};
use std::path::Path;

pub fn run(
    manifest: &Path,
    expected: &str,
    variant: ChecksumVariant,
    json: bool,
) -> Result<u8, String> {
    let image = load_image(manifest)?;

    let (ok, computed) = match verify_checksum(&image, expected, variant) {
        Ok(computed) => (true, computed.into_inner()),
        Err(ManifestError::ChecksumMismatch { computed, .. }) => (false, computed),
        Err(e) => return Err(e.to_string()),
    };

    if json {
        let payload = serde_json::json!({
            "variant": variant,
            "expected": expected.trim(),
            "computed": computed,
            "ok": ok,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{} {variant} checksum: {}",
            image.normal_form(),
            colorize_verdict(ok)
        );
        if !ok {
            println!("  expected: {}", expected.trim());
            println!("  computed: {computed}");
        }
    }

    if ok {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_CHECKSUM_MISMATCH)
    }
}
