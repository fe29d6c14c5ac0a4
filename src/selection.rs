use std::path::PathBuf;
#[cfg(test)]
use std::path::Path;

/// Holds the most recently chosen image.
///
/// A new pick replaces the previous one; the selection is handed out at most
/// once per submission.
#[derive(Debug, Default)]
pub struct SelectionStore {
    image: Option<PathBuf>,
}

impl SelectionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, image: PathBuf) {
        if let Some(previous) = self.image.replace(image) {
            tracing::debug!("Replacing selected image {:?}", previous);
        }
    }

    pub fn take_and_clear(&mut self) -> Option<PathBuf> {
        self.image.take()
    }

    #[cfg(test)]
    pub fn current(&self) -> Option<&Path> {
        self.image.as_deref()
    }
}
