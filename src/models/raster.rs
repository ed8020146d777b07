//! Map tiles attached to an experience.

use base64::Engine;

use crate::models::Region;

/// A base64-encoded image covering a region.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub region: Region,
    pub base64: String,
}

impl Raster {
    /// Decoded image bytes.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        base64::engine::general_purpose::STANDARD.decode(&self.base64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GeoPoint;

    #[test]
    fn test_decode() {
        let r = Raster {
            region: Region::new(GeoPoint::new(1.0, 0.0), GeoPoint::new(0.0, 1.0)),
            base64: "iVBORw==".to_string(),
        };
        assert_eq!(r.decode().unwrap(), vec![0x89, b'P', b'N', b'G']);
    }
}
