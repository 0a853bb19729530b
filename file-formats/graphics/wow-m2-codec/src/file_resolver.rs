//! Side files referenced by a model
//!
//! From Wrath on, per-sequence animation timelines may live in `.anim` files
//! and views live in `.skin` files. This module provides the collaborator
//! trait the codec uses to reach them, plus a filesystem and an in-memory
//! implementation.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{Cursor, ErrorKind, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{M2Error, Result};
use crate::io_ext::{ReadSeek, WriteSeek};

/// Identifies the `.anim` file holding one sequence's timelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimFileKey {
    pub sequence_index: usize,
    pub animation_id: u16,
    pub sub_animation_id: u16,
}

impl AnimFileKey {
    /// File name suffix, e.g. `0004-00.anim`
    pub fn file_suffix(&self) -> String {
        format!("{:04}-{:02}.anim", self.animation_id, self.sub_animation_id)
    }
}

/// Provider of `.anim` and `.skin` side files.
///
/// Returned handles are dropped by the codec as soon as the timeline or view
/// they were opened for has been transferred.
pub trait ExternalFiles {
    /// Open a sequence's `.anim` file for reading; `None` when it does not exist
    fn open_anim(&mut self, key: &AnimFileKey) -> Result<Option<Box<dyn ReadSeek + '_>>>;

    /// Create or truncate a sequence's `.anim` file
    fn create_anim(&mut self, key: &AnimFileKey) -> Result<Box<dyn WriteSeek + '_>>;

    /// Open a sequence's `.anim` file for appending, creating it if needed
    fn append_anim(&mut self, key: &AnimFileKey) -> Result<Box<dyn WriteSeek + '_>>;

    /// Open the view stored at `index`; `None` when it does not exist
    fn open_skin(&mut self, index: usize) -> Result<Option<Box<dyn ReadSeek + '_>>>;

    /// Create or truncate the view stored at `index`
    fn create_skin(&mut self, index: usize) -> Result<Box<dyn WriteSeek + '_>>;

    /// Open a file by its file data id, as listed in the chunks of a chunked model
    fn open_file_data_id(&mut self, _id: u32) -> Result<Option<Box<dyn ReadSeek + '_>>> {
        Ok(None)
    }
}

/// Lend an optional collaborator to a shorter scope
pub(crate) fn reborrow<'s>(
    files: &'s mut Option<&mut dyn ExternalFiles>,
) -> Option<&'s mut dyn ExternalFiles> {
    match files {
        Some(files) => Some(&mut **files),
        None => None,
    }
}

/// Resolves side files next to a model on disk.
///
/// For `Creature/Wolf/Wolf.m2` the view at index 1 is `Wolf01.skin` and the
/// timelines of animation 4, variation 0 are in `Wolf0004-00.anim`.
#[derive(Debug)]
pub struct PathResolver {
    directory: PathBuf,
    stem: String,
    file_data_ids: HashMap<u32, PathBuf>,
}

impl PathResolver {
    /// Create a resolver for the side files of the model at `model_path`
    pub fn new<P: AsRef<Path>>(model_path: P) -> Self {
        let model_path = model_path.as_ref();
        let directory = model_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let stem = model_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            directory,
            stem,
            file_data_ids: HashMap::new(),
        }
    }

    /// Load file data id mappings from a listfile (`FileDataID;filepath` per line).
    /// Paths are resolved against the model's directory.
    pub fn load_listfile<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let contents = fs::read_to_string(path)
            .map_err(|e| M2Error::ExternalFile(format!("Failed to read listfile: {e}")))?;

        for line in contents.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some((id, path)) = line.split_once(';')
                && let Ok(id) = id.parse::<u32>()
            {
                self.file_data_ids.insert(id, PathBuf::from(path));
            }
        }

        Ok(())
    }

    /// Add a manual mapping from file data id to file path
    pub fn add_mapping<P: Into<PathBuf>>(&mut self, id: u32, path: P) {
        self.file_data_ids.insert(id, path.into());
    }

    pub fn anim_path(&self, key: &AnimFileKey) -> PathBuf {
        self.directory
            .join(format!("{}{}", self.stem, key.file_suffix()))
    }

    pub fn skin_path(&self, index: usize) -> PathBuf {
        self.directory.join(format!("{}{index:02}.skin", self.stem))
    }

    fn open_existing(path: &Path) -> Result<Option<Box<dyn ReadSeek>>> {
        match File::open(path) {
            Ok(file) => Ok(Some(Box::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(M2Error::ExternalFile(format!(
                "Failed to open {}: {e}",
                path.display()
            ))),
        }
    }

    fn create(path: &Path) -> Result<Box<dyn WriteSeek>> {
        File::create(path).map(|f| Box::new(f) as Box<dyn WriteSeek>).map_err(|e| {
            M2Error::ExternalFile(format!("Failed to create {}: {e}", path.display()))
        })
    }
}

impl ExternalFiles for PathResolver {
    fn open_anim(&mut self, key: &AnimFileKey) -> Result<Option<Box<dyn ReadSeek + '_>>> {
        Ok(Self::open_existing(&self.anim_path(key))?.map(|f| f as Box<dyn ReadSeek + '_>))
    }

    fn create_anim(&mut self, key: &AnimFileKey) -> Result<Box<dyn WriteSeek + '_>> {
        Ok(Self::create(&self.anim_path(key))?)
    }

    fn append_anim(&mut self, key: &AnimFileKey) -> Result<Box<dyn WriteSeek + '_>> {
        let path = self.anim_path(key);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| {
                M2Error::ExternalFile(format!("Failed to open {}: {e}", path.display()))
            })?;
        file.seek(SeekFrom::End(0))?;
        Ok(Box::new(file))
    }

    fn open_skin(&mut self, index: usize) -> Result<Option<Box<dyn ReadSeek + '_>>> {
        Ok(Self::open_existing(&self.skin_path(index))?.map(|f| f as Box<dyn ReadSeek + '_>))
    }

    fn create_skin(&mut self, index: usize) -> Result<Box<dyn WriteSeek + '_>> {
        Ok(Self::create(&self.skin_path(index))?)
    }

    fn open_file_data_id(&mut self, id: u32) -> Result<Option<Box<dyn ReadSeek + '_>>> {
        let Some(path) = self.file_data_ids.get(&id) else {
            return Ok(None);
        };
        let path = self.directory.join(path);
        Ok(Self::open_existing(&path)?.map(|f| f as Box<dyn ReadSeek + '_>))
    }
}

/// Side files kept in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryFiles {
    anims: HashMap<AnimFileKey, Cursor<Vec<u8>>>,
    skins: HashMap<usize, Cursor<Vec<u8>>>,
    file_data_ids: HashMap<u32, Vec<u8>>,
}

impl MemoryFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_anim(&mut self, key: AnimFileKey, data: Vec<u8>) {
        self.anims.insert(key, Cursor::new(data));
    }

    pub fn insert_skin(&mut self, index: usize, data: Vec<u8>) {
        self.skins.insert(index, Cursor::new(data));
    }

    pub fn insert_file_data_id(&mut self, id: u32, data: Vec<u8>) {
        self.file_data_ids.insert(id, data);
    }

    pub fn anim(&self, key: &AnimFileKey) -> Option<&[u8]> {
        self.anims.get(key).map(|c| c.get_ref().as_slice())
    }

    pub fn skin(&self, index: usize) -> Option<&[u8]> {
        self.skins.get(&index).map(|c| c.get_ref().as_slice())
    }

    pub fn anim_count(&self) -> usize {
        self.anims.len()
    }

    pub fn skin_count(&self) -> usize {
        self.skins.len()
    }
}

impl ExternalFiles for MemoryFiles {
    fn open_anim(&mut self, key: &AnimFileKey) -> Result<Option<Box<dyn ReadSeek + '_>>> {
        Ok(self
            .anims
            .get(key)
            .map(|c| Box::new(Cursor::new(c.get_ref().as_slice())) as Box<dyn ReadSeek + '_>))
    }

    fn create_anim(&mut self, key: &AnimFileKey) -> Result<Box<dyn WriteSeek + '_>> {
        let cursor = self.anims.entry(*key).or_default();
        *cursor = Cursor::new(Vec::new());
        Ok(Box::new(cursor))
    }

    fn append_anim(&mut self, key: &AnimFileKey) -> Result<Box<dyn WriteSeek + '_>> {
        let cursor = self.anims.entry(*key).or_default();
        cursor.seek(SeekFrom::End(0))?;
        Ok(Box::new(cursor))
    }

    fn open_skin(&mut self, index: usize) -> Result<Option<Box<dyn ReadSeek + '_>>> {
        Ok(self
            .skins
            .get(&index)
            .map(|c| Box::new(Cursor::new(c.get_ref().as_slice())) as Box<dyn ReadSeek + '_>))
    }

    fn create_skin(&mut self, index: usize) -> Result<Box<dyn WriteSeek + '_>> {
        let cursor = self.skins.entry(index).or_default();
        *cursor = Cursor::new(Vec::new());
        Ok(Box::new(cursor))
    }

    fn open_file_data_id(&mut self, id: u32) -> Result<Option<Box<dyn ReadSeek + '_>>> {
        Ok(self
            .file_data_ids
            .get(&id)
            .map(|d| Box::new(Cursor::new(d.as_slice())) as Box<dyn ReadSeek + '_>))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use tempfile::NamedTempFile;

    fn key() -> AnimFileKey {
        AnimFileKey {
            sequence_index: 3,
            animation_id: 4,
            sub_animation_id: 0,
        }
    }

    #[test]
    fn test_path_naming() {
        let resolver = PathResolver::new("Creature/Wolf/Wolf.m2");
        assert_eq!(
            resolver.anim_path(&key()),
            Path::new("Creature/Wolf/Wolf0004-00.anim")
        );
        assert_eq!(
            resolver.skin_path(1),
            Path::new("Creature/Wolf/Wolf01.skin")
        );
    }

    #[test]
    fn test_path_resolver_missing_and_append() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut resolver = PathResolver::new(temp_dir.path().join("Wolf.m2"));

        assert!(resolver.open_anim(&key()).unwrap().is_none());
        assert!(resolver.open_skin(0).unwrap().is_none());

        resolver.create_anim(&key()).unwrap().write_all(&[1, 2]).unwrap();
        resolver.append_anim(&key()).unwrap().write_all(&[3]).unwrap();

        let mut data = Vec::new();
        resolver
            .open_anim(&key())
            .unwrap()
            .unwrap()
            .read_to_end(&mut data)
            .unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn test_listfile_mappings() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("wolf00.skin"), b"SKIN").unwrap();

        let mut listfile = NamedTempFile::new().unwrap();
        writeln!(listfile, "# Comment line").unwrap();
        writeln!(listfile, "123456;wolf00.skin").unwrap();
        writeln!(listfile).unwrap();
        listfile.flush().unwrap();

        let mut resolver = PathResolver::new(temp_dir.path().join("wolf.m2"));
        resolver.load_listfile(listfile.path()).unwrap();

        assert!(resolver.open_file_data_id(123456).unwrap().is_some());
        assert!(resolver.open_file_data_id(999999).unwrap().is_none());
    }

    #[test]
    fn test_memory_files() {
        let mut files = MemoryFiles::new();
        files.create_anim(&key()).unwrap().write_all(&[9, 9]).unwrap();
        files.append_anim(&key()).unwrap().write_all(&[7]).unwrap();
        assert_eq!(files.anim(&key()), Some(&[9u8, 9, 7][..]));

        files.create_anim(&key()).unwrap();
        assert_eq!(files.anim(&key()), Some(&[][..]));

        files.insert_skin(0, vec![1]);
        assert!(files.open_skin(0).unwrap().is_some());
        assert!(files.open_skin(1).unwrap().is_none());
    }
}
