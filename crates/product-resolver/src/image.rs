//! Product images stored beside the company database.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};

pub const IMAGES_FOLDER: &str = "Imagenes";

/// Extensions tried in order
const IMAGE_EXTENSIONS: [&str; 2] = ["png", "jpg"];

/// A stored key names a file inside the images folder and nothing else.
fn is_plain_file_stem(image_key: &str) -> bool {
    !image_key.is_empty()
        && image_key != "."
        && image_key != ".."
        && !image_key.contains(&['/', '\\', ':'][..])
        && !image_key.contains("..")
}

/// Image file for `image_key` under the company's images folder, if any.
/// Keys that could point outside that folder find nothing.
pub fn find_product_image(company_path: &Path, image_key: &str) -> Option<PathBuf> {
    if !is_plain_file_stem(image_key) {
        tracing::warn!("Ignoring product image key {:?}", image_key);
        return None;
    }

    let folder = company_path.join(IMAGES_FOLDER);
    IMAGE_EXTENSIONS
        .iter()
        .map(|extension| folder.join(format!("{}.{}", image_key, extension)))
        .find(|candidate| candidate.is_file())
}

/// Data URI for the product image. Absence and read failures both give `None`.
pub fn load_product_image(company_path: &Path, image_key: Option<&str>) -> Option<String> {
    let image_key = image_key?.trim();
    if image_key.is_empty() {
        return None;
    }

    let path = find_product_image(company_path, image_key)?;
    match std::fs::read(&path) {
        Ok(bytes) => Some(data_uri(&path, &bytes)),
        Err(e) => {
            tracing::warn!("Failed to read product image {}: {}", path.display(), e);
            None
        }
    }
}

pub fn data_uri(path: &Path, bytes: &[u8]) -> String {
    format!("data:image/{};base64,{}", mime_subtype(path), STANDARD.encode(bytes))
}

/// Subtype from the file extension, `png` when there is none.
pub fn mime_subtype(path: &Path) -> String {
    path.extension()
        .and_then(|extension| extension.to_str())
        .filter(|extension| !extension.is_empty())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "png".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_png_preferred_over_jpg() {
        let tmp = TempDir::new().unwrap();
        let images = tmp.path().join(IMAGES_FOLDER);
        fs::create_dir(&images).unwrap();
        fs::write(images.join("A1.png"), b"png").unwrap();
        fs::write(images.join("A1.jpg"), b"jpg").unwrap();

        let found = find_product_image(tmp.path(), "A1").unwrap();
        assert_eq!(found.extension().unwrap(), "png");
    }

    #[test]
    fn test_jpg_data_uri() {
        let tmp = TempDir::new().unwrap();
        let images = tmp.path().join(IMAGES_FOLDER);
        fs::create_dir(&images).unwrap();
        fs::write(images.join("B2.jpg"), b"hi").unwrap();

        assert_eq!(
            load_product_image(tmp.path(), Some("B2")).as_deref(),
            Some("data:image/jpg;base64,aGk=")
        );
    }

    #[test]
    fn test_missing_image_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(load_product_image(tmp.path(), Some("nope")).is_none());
        assert!(load_product_image(tmp.path(), Some("  ")).is_none());
        assert!(load_product_image(tmp.path(), None).is_none());
    }

    #[test]
    fn test_keys_cannot_leave_images_folder() {
        let tmp = TempDir::new().unwrap();
        let company = tmp.path().join("Empresa01");
        fs::create_dir_all(company.join(IMAGES_FOLDER)).unwrap();
        fs::write(tmp.path().join("secret.png"), b"x").unwrap();
        fs::write(company.join("secret.png"), b"x").unwrap();

        for key in ["../secret", "../../secret", "..\\secret", "/etc/secret", "C:secret", ".."] {
            assert!(load_product_image(&company, Some(key)).is_none(), "followed {:?}", key);
        }
    }

    #[test]
    fn test_mime_subtype_defaults_to_png() {
        assert_eq!(mime_subtype(Path::new("Imagenes/A1")), "png");
        assert_eq!(mime_subtype(Path::new("Imagenes/A1.JPG")), "jpg");
    }
}
