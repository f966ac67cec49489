use super::{load_image, EXIT_SUCCESS};
use std::path::Path;

/// Re-encode a manifest so its raw extended metadata matches the decoded map.
pub fn run(manifest: &Path, output: Option<&Path>) -> Result<u8, String> {
    let mut image = load_image(manifest)?;
    let data = image.encode_manifest().map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            std::fs::write(path, &data)
                .map_err(|e| format!("failed to write {}: {e}", path.display()))?;
            tracing::info!("wrote {} ({} bytes)", path.display(), data.len());
        }
        None => println!("{}", String::from_utf8_lossy(&data)),
    }
    Ok(EXIT_SUCCESS)
}
