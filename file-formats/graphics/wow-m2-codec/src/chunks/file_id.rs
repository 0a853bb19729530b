//! File data id chunks of the chunked container

use std::io::{Read, Write};

use super::infrastructure::ChunkHeader;
use crate::error::{M2Error, Result};
use crate::io_ext::{ReadExt, WriteExt};

pub type MagicStr = [u8; 4];

pub const MD21: MagicStr = *b"MD21";
pub const MD20: MagicStr = *b"MD20";

pub const SFID: MagicStr = *b"SFID";
pub const AFID: MagicStr = *b"AFID";
pub const BFID: MagicStr = *b"BFID";
pub const TXID: MagicStr = *b"TXID";
pub const SKID: MagicStr = *b"SKID";
pub const PFID: MagicStr = *b"PFID";

pub type FileId = u32;

/// Entry of the animation file id chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AnimationFileId {
    pub animation_id: u16,
    pub sub_animation_id: u16,
    pub file_id: FileId,
}

/// File data ids recorded from the chunks following the model image
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileIdChunks {
    pub skin_file_ids: Vec<FileId>,
    pub lod_skin_file_ids: Vec<FileId>,
    pub animation_file_ids: Vec<AnimationFileId>,
    pub bone_file_ids: Vec<FileId>,
    pub texture_file_ids: Vec<FileId>,
    pub skeleton_file_id: Option<FileId>,
    pub physics_file_id: Option<FileId>,
}

fn read_ids<R: Read>(reader: &mut R, header: &ChunkHeader) -> Result<Vec<FileId>> {
    let count = header.size as usize / 4;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(reader.read_u32_le()?);
    }
    Ok(ids)
}

/// Payload size of a chunk holding `count` entries of `entry_size` bytes
fn chunk_size(magic: MagicStr, count: usize, entry_size: usize) -> Result<u32> {
    count
        .checked_mul(entry_size)
        .and_then(|size| u32::try_from(size).ok())
        .ok_or_else(|| {
            M2Error::Schema(format!(
                "{} chunk of {count} entries does not fit a 32-bit size",
                String::from_utf8_lossy(&magic)
            ))
        })
}

fn write_ids<W: Write>(writer: &mut W, magic: MagicStr, ids: &[FileId]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }
    ChunkHeader::new(magic, chunk_size(magic, ids.len(), 4)?).write(writer)?;
    for &id in ids {
        writer.write_u32_le(id)?;
    }
    Ok(())
}

impl FileIdChunks {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Record the payload of a known chunk. Returns `false` for ids this
    /// codec does not interpret, which the caller skips.
    ///
    /// `view_count` splits the skin ids into views and LOD views.
    pub fn read_chunk<R: Read>(
        &mut self,
        header: &ChunkHeader,
        reader: &mut R,
        view_count: usize,
    ) -> Result<bool> {
        if header.size % 4 != 0 {
            log::debug!(
                "chunk {} size {} is not a multiple of 4, ignoring the tail",
                header.magic_str(),
                header.size
            );
        }

        match header.magic {
            SFID => {
                let mut ids = read_ids(reader, header)?;
                let views = view_count.min(ids.len());
                self.lod_skin_file_ids = ids.split_off(views);
                self.skin_file_ids = ids;
            }
            AFID => {
                let count = header.size as usize / 8;
                self.animation_file_ids = Vec::with_capacity(count);
                for _ in 0..count {
                    let animation_id = reader.read_u16_le()?;
                    let sub_animation_id = reader.read_u16_le()?;
                    let file_id = reader.read_u32_le()?;
                    self.animation_file_ids.push(AnimationFileId {
                        animation_id,
                        sub_animation_id,
                        file_id,
                    });
                }
            }
            BFID => self.bone_file_ids = read_ids(reader, header)?,
            TXID => self.texture_file_ids = read_ids(reader, header)?,
            SKID => self.skeleton_file_id = read_ids(reader, header)?.first().copied(),
            PFID => self.physics_file_id = read_ids(reader, header)?.first().copied(),
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Write every non-empty chunk
    pub fn write_chunks<W: Write>(&self, writer: &mut W) -> Result<()> {
        let skins: Vec<FileId> = self
            .skin_file_ids
            .iter()
            .chain(&self.lod_skin_file_ids)
            .copied()
            .collect();
        write_ids(writer, SFID, &skins)?;

        if !self.animation_file_ids.is_empty() {
            let size = chunk_size(AFID, self.animation_file_ids.len(), 8)?;
            ChunkHeader::new(AFID, size).write(writer)?;
            for entry in &self.animation_file_ids {
                writer.write_u16_le(entry.animation_id)?;
                writer.write_u16_le(entry.sub_animation_id)?;
                writer.write_u32_le(entry.file_id)?;
            }
        }

        write_ids(writer, BFID, &self.bone_file_ids)?;
        write_ids(writer, TXID, &self.texture_file_ids)?;
        if let Some(id) = self.skeleton_file_id {
            write_ids(writer, SKID, &[id])?;
        }
        if let Some(id) = self.physics_file_id {
            write_ids(writer, PFID, &[id])?;
        }
        Ok(())
    }

    /// File data id of the `.anim` file for an animation, if listed
    pub fn animation_file_id(&self, animation_id: u16, sub_animation_id: u16) -> Option<FileId> {
        self.animation_file_ids
            .iter()
            .find(|e| e.animation_id == animation_id && e.sub_animation_id == sub_animation_id)
            .map(|e| e.file_id)
            .filter(|&id| id != 0)
    }
}
