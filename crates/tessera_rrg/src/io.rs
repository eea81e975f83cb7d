//! On-disk caching of built device models.
//!
//! Building a large routing-resource graph is expensive; callers may save
//! the finished [`DeviceModel`] and reload it on later runs instead of
//! rebuilding. The format is a small validated header (magic bytes and a
//! format version) followed by a bincode payload.

use crate::device::DeviceModel;
use crate::error::RrgError;
use std::path::Path;

/// Magic bytes identifying a Tessera device-model file.
const MODEL_MAGIC: [u8; 4] = *b"TSRA";

/// Current model file format version. Increment on breaking changes to
/// the payload layout.
const MODEL_FORMAT_VERSION: u32 = 1;

/// Serializes a device model to the given path.
pub fn save_model(model: &DeviceModel, path: &Path) -> Result<(), RrgError> {
    let payload = bincode::serde::encode_to_vec(model, bincode::config::standard())
        .map_err(|e| RrgError::Encode(e.to_string()))?;
    let mut data = Vec::with_capacity(8 + payload.len());
    data.extend_from_slice(&MODEL_MAGIC);
    data.extend_from_slice(&MODEL_FORMAT_VERSION.to_le_bytes());
    data.extend_from_slice(&payload);
    std::fs::write(path, data)?;
    Ok(())
}

/// Loads a device model previously written by [`save_model`].
pub fn load_model(path: &Path) -> Result<DeviceModel, RrgError> {
    let raw = std::fs::read(path)?;
    if raw.len() < 8 || raw[0..4] != MODEL_MAGIC {
        return Err(RrgError::Decode(format!(
            "{} is not a tessera device-model file",
            path.display()
        )));
    }
    let version = u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]);
    if version != MODEL_FORMAT_VERSION {
        return Err(RrgError::Decode(format!(
            "unsupported model format version {version} (expected {MODEL_FORMAT_VERSION})"
        )));
    }
    let (model, _len) = bincode::serde::decode_from_slice(&raw[8..], bincode::config::standard())
        .map_err(|e| RrgError::Decode(e.to_string()))?;
    Ok(model)
}
