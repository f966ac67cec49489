use super::{json_pretty, load_image, EXIT_SUCCESS};
use std::path::Path;

pub fn run(manifest: &Path, json: bool) -> Result<u8, String> {
    let image = load_image(manifest)?;
    let identity = image.identity();
    if json {
        println!("{}", json_pretty(&identity)?);
    } else {
        println!("normal_form:        {}", identity.normal_form);
        println!("short_id:           {}", identity.short_id);
        println!("manifest_checksum:  {}", identity.manifest_checksum);
        println!("extended_checksum:  {}", identity.extended_checksum);
        println!("created:            {}", image.date_created.to_rfc3339());
        println!("size:               {}", image.size);
        println!("layers:             {}", image.fs_layers.checksums.len());
        println!(
            "base:               {}",
            image.fs_layers.base.as_ref().map_or_else(
                || "(none)".to_owned(),
                |b| format!("{}/{}@{}", b.domain, b.path, b.version)
            )
        );
        println!("metadata_keys:      {}", image.extended_metadata.len());
    }
    Ok(EXIT_SUCCESS)
}
