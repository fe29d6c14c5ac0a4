/// A finalized recording, ready to be attached to an upload.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBlob {
    bytes: Vec<u8>,
    media_type: &'static str,
    file_name: &'static str,
}

impl AudioBlob {
    pub fn new(bytes: Vec<u8>, media_type: &'static str, file_name: &'static str) -> Self {
        Self {
            bytes,
            media_type,
            file_name,
        }
    }

    pub fn media_type(&self) -> &'static str {
        self.media_type
    }

    pub fn file_name(&self) -> &'static str {
        self.file_name
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}
