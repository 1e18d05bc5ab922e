use anyhow::{ensure, Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Read-only access to one length per dataset example.
///
/// Lengths must stay fixed for the lifetime of any sampler built from them.
/// Implementations must be `Send + Sync` so the same index can be shared
/// across threads.
pub trait SequenceLengths: Send + Sync {
    fn lengths(&self) -> &[usize];

    fn num_examples(&self) -> usize {
        self.lengths().len()
    }
}

impl SequenceLengths for [usize] {
    fn lengths(&self) -> &[usize] {
        self
    }
}

impl SequenceLengths for Vec<usize> {
    fn lengths(&self) -> &[usize] {
        self
    }
}

/// Per-example lengths stored as `Arc<[usize]>`.
///
/// Cloning only bumps the `Arc` counter, so each replica or loader thread can
/// hold its own handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthIndex {
    lengths: Arc<[usize]>,
}

impl LengthIndex {
    pub fn new(lengths: Vec<usize>) -> Self {
        Self {
            lengths: lengths.into(),
        }
    }

    /// Estimates spectrogram frame counts from 16-bit mono PCM audio files.
    ///
    /// Each file holds roughly `size / 2` samples, and one frame covers
    /// `hop_length` samples, so its length is `size / (2 * hop_length)`. Only
    /// file metadata is read.
    ///
    /// # Example
    /// ```ignore
    /// let index = LengthIndex::from_audio_files(&paths, 256)?;
    /// let sampler = BucketSampler::local(&index, 32, vec![32, 300, 500, 1000])?;
    /// ```
    pub fn from_audio_files<I, P>(paths: I, hop_length: usize) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        ensure!(
            hop_length > 0,
            "hop_length must be > 0, but got hop_length={}",
            hop_length
        );
        let bytes_per_frame = 2 * hop_length as u64;

        let lengths = paths
            .into_iter()
            .map(|path| -> Result<usize> {
                let path = path.as_ref();
                let size = std::fs::metadata(path)
                    .with_context(|| format!("Failed to read audio file metadata: {}", path.display()))?
                    .len();
                Ok((size / bytes_per_frame) as usize)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(lengths))
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<usize> {
        self.lengths.get(index).copied()
    }
}

impl From<Vec<usize>> for LengthIndex {
    fn from(lengths: Vec<usize>) -> Self {
        Self::new(lengths)
    }
}

impl SequenceLengths for LengthIndex {
    fn lengths(&self) -> &[usize] {
        &self.lengths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn audio_file(num_bytes: usize) -> Result<NamedTempFile> {
        let mut file = NamedTempFile::new()?;
        file.write_all(&vec![0u8; num_bytes])?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn stores_lengths() {
        let index = LengthIndex::from(vec![3, 1, 4]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.lengths(), &[3, 1, 4]);
        assert_eq!(index.get(2), Some(4));
        assert_eq!(index.get(3), None);
        assert_eq!(index.num_examples(), 3);
    }

    #[test]
    fn clones_share_storage() {
        let index = LengthIndex::new(vec![1, 2, 3]);
        let clone = index.clone();
        assert!(Arc::ptr_eq(&index.lengths, &clone.lengths));
    }

    #[test]
    fn estimates_frames_from_file_size() -> Result<()> {
        // 16-bit samples, hop of 4 samples -> 8 bytes per frame.
        let files = [audio_file(80)?, audio_file(87)?, audio_file(3)?];
        let index = LengthIndex::from_audio_files(files.iter().map(|f| f.path()), 4)?;
        assert_eq!(index.lengths(), &[10, 10, 0]);
        Ok(())
    }

    #[test]
    fn reports_missing_files() -> Result<()> {
        let file = audio_file(16)?;
        let missing = file.path().with_extension("missing.wav");
        let err = LengthIndex::from_audio_files([file.path(), missing.as_path()], 4).unwrap_err();
        assert!(err.to_string().contains("missing.wav"));
        Ok(())
    }

    #[test]
    fn rejects_zero_hop_length() -> Result<()> {
        let file = audio_file(16)?;
        assert!(LengthIndex::from_audio_files([file.path()], 0).is_err());
        Ok(())
    }

    #[test]
    fn slices_and_vectors_are_length_sources() {
        let lengths: Vec<usize> = vec![7, 8];
        assert_eq!(lengths.num_examples(), 2);
        assert_eq!(lengths[..].lengths(), &[7, 8]);
    }
}
