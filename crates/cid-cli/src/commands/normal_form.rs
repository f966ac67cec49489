use super::{json_pretty, load_image, EXIT_SUCCESS};
use std::path::Path;

pub fn run(manifest: &Path, json: bool) -> Result<u8, String> {
    let image = load_image(manifest)?;
    let name = image.normal_form();
    if json {
        let payload = serde_json::json!({ "normal_form": name });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{name}");
    }
    Ok(EXIT_SUCCESS)
}
