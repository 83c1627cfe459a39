//! G-buffer dataset loading
//!
//! A dataset is a keyed store of flat `f32` arrays. The viewer needs four of
//! them per frame (`position`, `normal`, `mask`, `depth`) and two per shadow
//! casting light (`mask`, `depth`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::DatasetError;

/// Extension of raw buffer files inside a [`RawDirStore`]
pub const RAW_EXTENSION: &str = "f32";

/// Named buffers of a G-buffer dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKey {
    Position,
    Normal,
    Mask,
    Depth,
}

impl BufferKey {
    pub fn key(self) -> &'static str {
        match self {
            BufferKey::Position => "position",
            BufferKey::Normal => "normal",
            BufferKey::Mask => "mask",
            BufferKey::Depth => "depth",
        }
    }

    pub fn channels(self) -> usize {
        match self {
            BufferKey::Position | BufferKey::Normal => 3,
            BufferKey::Mask | BufferKey::Depth => 1,
        }
    }
}

/// Keyed source of float arrays
pub trait DatasetStore {
    /// Human readable identifier used in diagnostics
    fn id(&self) -> &str;

    fn read(&self, key: &str) -> Result<Vec<f32>, DatasetError>;
}

/// Directory of `<key>.f32` files holding little-endian floats
#[derive(Debug, Clone)]
pub struct RawDirStore {
    root: PathBuf,
    id: String,
}

impl RawDirStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(DatasetError::MissingDataset(root));
        }
        let id = root.display().to_string();
        Ok(Self { root, id })
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.{RAW_EXTENSION}"))
    }

    /// Write a buffer in the format [`RawDirStore::read`] expects
    pub fn write(&self, key: &str, data: &[f32]) -> Result<(), DatasetError> {
        let bytes: Vec<u8> = data.iter().flat_map(|v| v.to_le_bytes()).collect();
        fs::write(self.path_for(key), bytes)?;
        Ok(())
    }
}

impl DatasetStore for RawDirStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self, key: &str) -> Result<Vec<f32>, DatasetError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(DatasetError::MissingKey {
                dataset: self.id.clone(),
                key: key.to_string(),
            });
        }

        let bytes = fs::read(&path)?;
        if bytes.len() % 4 != 0 {
            return Err(DatasetError::Malformed {
                key: key.to_string(),
                reason: format!("{} bytes is not a multiple of 4", bytes.len()),
            });
        }

        Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect())
    }
}

/// In-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    id: String,
    buffers: HashMap<String, Vec<f32>>,
}

impl MemoryStore {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            buffers: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, data: Vec<f32>) {
        self.buffers.insert(key.into(), data);
    }

    pub fn with(mut self, key: impl Into<String>, data: Vec<f32>) -> Self {
        self.insert(key, data);
        self
    }
}

impl DatasetStore for MemoryStore {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self, key: &str) -> Result<Vec<f32>, DatasetError> {
        self.buffers
            .get(key)
            .cloned()
            .ok_or_else(|| DatasetError::MissingKey {
                dataset: self.id.clone(),
                key: key.to_string(),
            })
    }
}

/// HDF5 file with one float dataset per key
#[cfg(feature = "hdf5")]
pub struct Hdf5Store {
    file: hdf5::File,
    id: String,
}

#[cfg(feature = "hdf5")]
impl Hdf5Store {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DatasetError::MissingDataset(path.to_path_buf()));
        }
        let file = hdf5::File::open(path)?;
        Ok(Self {
            file,
            id: path.display().to_string(),
        })
    }
}

#[cfg(feature = "hdf5")]
impl DatasetStore for Hdf5Store {
    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self, key: &str) -> Result<Vec<f32>, DatasetError> {
        if !self.file.link_exists(key) {
            return Err(DatasetError::MissingKey {
                dataset: self.id.clone(),
                key: key.to_string(),
            });
        }
        let dataset = self.file.dataset(key)?;
        Ok(dataset.read_raw::<f32>()?)
    }
}

fn is_hdf5_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("h5") || e.eq_ignore_ascii_case("hdf5"))
}

/// Open a dataset, picking the backend from the path
///
/// `.h5` / `.hdf5` files need the `hdf5` feature; anything else is treated
/// as a raw buffer directory.
pub fn open_dataset(path: &Path) -> Result<Box<dyn DatasetStore>, DatasetError> {
    if is_hdf5_path(path) {
        #[cfg(feature = "hdf5")]
        {
            return Ok(Box::new(Hdf5Store::open(path)?));
        }
        #[cfg(not(feature = "hdf5"))]
        {
            if !path.exists() {
                return Err(DatasetError::MissingDataset(path.to_path_buf()));
            }
            return Err(DatasetError::Unsupported(format!(
                "{} is an HDF5 file but HDF5 support is not enabled",
                path.display()
            )));
        }
    }
    Ok(Box::new(RawDirStore::open(path)?))
}

/// A flat float image
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: Vec<f32>,
}

impl Buffer {
    /// Wrap `data`, checking it holds exactly `width * height * channels` floats
    pub fn new(
        key: &str,
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<f32>,
    ) -> Result<Self, DatasetError> {
        let expected = width * height * channels;
        if data.len() != expected {
            return Err(DatasetError::SizeMismatch {
                key: key.to_string(),
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn load(
        store: &dyn DatasetStore,
        key: BufferKey,
        width: usize,
        height: usize,
    ) -> Result<Self, DatasetError> {
        let data = store.read(key.key())?;
        let buffer = Self::new(key.key(), width, height, key.channels(), data)?;
        debug!(
            "Loaded '{}' from {} ({}x{}x{})",
            key.key(),
            store.id(),
            width,
            height,
            buffer.channels
        );
        Ok(buffer)
    }
}

/// Every per-pixel input of one composited frame
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    pub width: usize,
    pub height: usize,
    pub position: Buffer,
    pub normal: Buffer,
    pub mask: Buffer,
    pub depth: Buffer,
    /// RGBA derived from `mask`
    pub diffuse: Buffer,
}

impl FrameBuffers {
    pub fn load(
        store: &dyn DatasetStore,
        width: usize,
        height: usize,
    ) -> Result<Self, DatasetError> {
        let position = Buffer::load(store, BufferKey::Position, width, height)?;
        let normal = Buffer::load(store, BufferKey::Normal, width, height)?;
        let mask = Buffer::load(store, BufferKey::Mask, width, height)?;
        let depth = Buffer::load(store, BufferKey::Depth, width, height)?;
        let diffuse = derive_diffuse(&mask);

        info!("Loaded G-buffer {}x{} from {}", width, height, store.id());
        Ok(Self {
            width,
            height,
            position,
            normal,
            mask,
            depth,
            diffuse,
        })
    }
}

/// White where the mask is exactly 1, opaque black elsewhere
pub fn derive_diffuse(mask: &Buffer) -> Buffer {
    let mut non_binary = 0usize;
    let mut data = Vec::with_capacity(mask.data.len() * 4);
    for &m in &mask.data {
        if m != 0.0 && m != 1.0 {
            non_binary += 1;
        }
        if m == 1.0 {
            data.extend_from_slice(&[1.0, 1.0, 1.0, 1.0]);
        } else {
            data.extend_from_slice(&[0.0, 0.0, 0.0, 1.0]);
        }
    }
    if non_binary > 0 {
        warn!(
            "Mask has {} non-binary texels, treating them as background",
            non_binary
        );
    }
    Buffer {
        width: mask.width,
        height: mask.height,
        channels: 4,
        data,
    }
}

/// Occlusion inputs of one light, in that light's image space
#[derive(Debug, Clone)]
pub struct ShadowBuffers {
    pub mask: Buffer,
    pub depth: Buffer,
}

impl ShadowBuffers {
    pub fn load(
        store: &dyn DatasetStore,
        width: usize,
        height: usize,
    ) -> Result<Self, DatasetError> {
        Ok(Self {
            mask: Buffer::load(store, BufferKey::Mask, width, height)?,
            depth: Buffer::load(store, BufferKey::Depth, width, height)?,
        })
    }
}
