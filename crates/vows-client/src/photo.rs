use std::io::Read;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

use vows_types::validate::MAX_PHOTO_BYTES;

use crate::error::ClientError;

fn image_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => return None,
    };
    Some(mime)
}

/// Reads an image file into a `data:` URI for the guestbook form.
/// Never reads more than one byte past the 2 MB cap.
pub fn inline_photo(path: impl AsRef<Path>) -> Result<String, ClientError> {
    let path = path.as_ref();
    let mime = image_type(path).ok_or(ClientError::Photo("Photo must be an image."))?;

    let file = std::fs::File::open(path)?;
    let mut bytes = Vec::new();
    file.take(MAX_PHOTO_BYTES as u64 + 1).read_to_end(&mut bytes)?;
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(ClientError::Photo("Please upload an image smaller than 2MB."));
    }

    Ok(format!("data:{};base64,{}", mime, B64.encode(bytes)))
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;
    use vows_types::validate::check_photo;

    use super::*;

    fn scratch(name: &str, len: usize) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("vows-photo-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, vec![0x89u8; len]).unwrap();
        path
    }

    #[test]
    fn small_image_becomes_an_accepted_data_uri() {
        let path = scratch("cake.PNG", 1024);
        let uri = inline_photo(&path).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));
        assert_eq!(check_photo(&uri), Ok(1024));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn photo_at_the_cap_is_accepted() {
        let path = scratch("exact.jpeg", MAX_PHOTO_BYTES);
        let uri = inline_photo(&path).unwrap();
        assert_eq!(check_photo(&uri), Ok(MAX_PHOTO_BYTES));
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn oversized_or_non_image_files_are_refused() {
        let big = scratch("big.jpg", MAX_PHOTO_BYTES + 1);
        assert!(matches!(inline_photo(&big), Err(ClientError::Photo(_))));
        std::fs::remove_dir_all(big.parent().unwrap()).ok();

        let text = scratch("notes.txt", 10);
        assert!(matches!(inline_photo(&text), Err(ClientError::Photo(_))));
        std::fs::remove_dir_all(text.parent().unwrap()).ok();
    }
}
