//! Memory-mapped replay files

use std::borrow::Cow;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use memmap2::Mmap;
use tracing::debug;

use crate::decoder::ReplayDecoder;
use crate::format::GZIP_MAGIC;
use crate::model::ReplayModel;
use crate::Result;

/// A replay file mapped into memory
///
/// Gzip-wrapped replays are inflated on demand. Decoding copies everything
/// it keeps, so the model outlives the source.
pub struct ReplaySource {
    path: PathBuf,
    _file: File,
    mmap: Mmap,
}

impl ReplaySource {
    /// Map a replay file read-only
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or mapped
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        debug!("Mapped {} ({} bytes)", path.display(), mmap.len());

        Ok(Self {
            path: path.to_path_buf(),
            _file: file,
            mmap,
        })
    }

    /// Path the source was opened from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw file contents, compressed or not
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.mmap
    }

    /// True if the file starts with the gzip magic
    #[must_use]
    pub fn is_gzip(&self) -> bool {
        self.mmap.starts_with(&GZIP_MAGIC)
    }

    /// Replay bytes ready for decoding
    ///
    /// Borrows the mapping for plain files and inflates gzip-wrapped ones.
    ///
    /// # Errors
    ///
    /// Returns error if the gzip stream is corrupt
    pub fn contents(&self) -> Result<Cow<'_, [u8]>> {
        if !self.is_gzip() {
            return Ok(Cow::Borrowed(self.as_bytes()));
        }

        let mut inflated = Vec::new();
        GzDecoder::new(self.as_bytes()).read_to_end(&mut inflated)?;
        debug!(
            "Inflated {} from {} to {} bytes",
            self.path.display(),
            self.mmap.len(),
            inflated.len()
        );
        Ok(Cow::Owned(inflated))
    }

    /// Decode the file, inflating it first if needed
    ///
    /// # Errors
    ///
    /// `Io` for a corrupt gzip stream, otherwise whatever the decoder
    /// returns
    pub fn decode(&self, decoder: &ReplayDecoder) -> Result<ReplayModel> {
        let bytes = self.contents()?;
        Ok(decoder.decode(&bytes)?)
    }
}

impl std::fmt::Debug for ReplaySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySource")
            .field("path", &self.path)
            .field("len", &self.mmap.len())
            .finish_non_exhaustive()
    }
}
