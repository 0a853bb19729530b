use std::borrow::Cow;
use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use bitflags::bitflags;

use crate::array_ref::ArrayRef;
use crate::chunks::file_id::{FileIdChunks, MD20, MD21};
use crate::chunks::infrastructure::{ChunkStream, scan_chunks};
use crate::chunks::{
    M2Attachment, M2Bone, M2Camera, M2Color, M2Event, M2Light, M2Material, M2Particle, M2Ribbon,
    M2Texture, M2TextureTransform, M2TextureWeight, M2Vertex,
};
use crate::codec::{M2Codec, M2Context, M2Value, PatchToken};
use crate::common::{C3Vector, M2Bounds};
use crate::debug;
use crate::error::{M2Error, Result};
use crate::file_resolver::{ExternalFiles, PathResolver, reborrow};
use crate::io_ext::{ReadExt, WriteExt, stream_len};
use crate::options::{LoadOptions, SaveOptions};
use crate::sequence::{M2PlayableRecord, M2Sequence, SequenceRegistry};
use crate::skin::M2SkinProfile;
use crate::track::SequenceAware;
use crate::version::M2Version;

bitflags! {
    /// Model flags as defined in the M2 format
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "serde-support", derive(serde::Serialize, serde::Deserialize))]
    pub struct M2ModelFlags: u32 {
        /// Tilt on X axis
        const TILT_X = 0x0001;
        /// Tilt on Y axis
        const TILT_Y = 0x0002;
        /// Add a back-reference to the model
        const ADD_BACK_REFERENCE = 0x0004;
        /// Use texture combiners; from Wrath on the header carries blending maps
        const USE_TEXTURE_COMBINERS = 0x0008;
        /// Is it a camera?
        const IS_CAMERA = 0x0010;
        /// Unused flag
        const UNUSED = 0x0020;
        /// No particle trails
        const NO_PARTICLE_TRAILS = 0x0040;
        /// Load phys data
        const LOAD_PHYS_DATA = 0x0100;
        /// Has bones
        const HAS_BONES = 0x0400;
        /// Use texture IDs
        const USE_TEXTURE_IDS = 0x2000;
        /// Camera can be modified
        const CAMERA_MODIFIABLE = 0x4000;
        /// New particle system
        const NEW_PARTICLE_SYSTEM = 0x8000;
    }
}

/// Lookups derived from entity keys on every save
struct GeneratedLookups {
    sequence: ArrayRef<i16>,
    playable: ArrayRef<M2PlayableRecord>,
    key_bone: ArrayRef<i16>,
    texture_replace: ArrayRef<i16>,
    attachment: ArrayRef<i16>,
    camera: ArrayRef<i16>,
}

/// Patch handles produced by the header pass of a model image
struct ImagePatch {
    name: PatchToken,
    global_loops: PatchToken,
    sequences: PatchToken,
    sequence_lookup: PatchToken,
    playable_lookup: Option<PatchToken>,
    bones: PatchToken,
    key_bone_lookup: PatchToken,
    vertices: PatchToken,
    views: Option<PatchToken>,
    colors: PatchToken,
    textures: PatchToken,
    texture_weights: PatchToken,
    texture_transforms: PatchToken,
    texture_replace_lookup: PatchToken,
    materials: PatchToken,
    bone_lookup: PatchToken,
    texture_lookup: PatchToken,
    texture_unit_lookup: PatchToken,
    transparency_lookup: PatchToken,
    texture_transform_lookup: PatchToken,
    collision_triangles: PatchToken,
    collision_vertices: PatchToken,
    collision_normals: PatchToken,
    attachments: PatchToken,
    attachment_lookup: PatchToken,
    events: PatchToken,
    lights: PatchToken,
    cameras: PatchToken,
    camera_lookup: PatchToken,
    ribbons: PatchToken,
    particles: PatchToken,
    blending_maps: Option<PatchToken>,
}

/// An M2 model: the entity graph behind one `MD20` image.
///
/// Lookups that can be derived from entity keys (sequence, playable, key
/// bone, texture replacement, attachment and camera) are not stored; they
/// are regenerated on every save. View-related lookups are kept verbatim.
#[derive(custom_debug::Debug, Clone, Default, PartialEq)]
pub struct M2Model {
    pub version: M2Version,
    pub name: ArrayRef<u8>,
    pub flags: M2ModelFlags,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub global_loops: ArrayRef<u32>,
    pub sequences: SequenceRegistry,
    pub bones: ArrayRef<M2Bone>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub vertices: ArrayRef<M2Vertex>,
    /// Embedded before Wrath, `.skin` side files from Wrath on
    pub views: ArrayRef<M2SkinProfile>,
    pub colors: ArrayRef<M2Color>,
    pub textures: ArrayRef<M2Texture>,
    pub texture_weights: ArrayRef<M2TextureWeight>,
    pub texture_transforms: ArrayRef<M2TextureTransform>,
    pub materials: ArrayRef<M2Material>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub bone_lookup: ArrayRef<i16>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub texture_lookup: ArrayRef<i16>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub texture_unit_lookup: ArrayRef<i16>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub transparency_lookup: ArrayRef<i16>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub texture_transform_lookup: ArrayRef<i16>,
    pub bounds: M2Bounds,
    pub collision_bounds: M2Bounds,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub collision_triangles: ArrayRef<u16>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub collision_vertices: ArrayRef<C3Vector>,
    #[debug(with = debug::trimmed_collection_fmt)]
    pub collision_normals: ArrayRef<C3Vector>,
    pub attachments: ArrayRef<M2Attachment>,
    pub events: ArrayRef<M2Event>,
    pub lights: ArrayRef<M2Light>,
    pub cameras: ArrayRef<M2Camera>,
    pub ribbons: ArrayRef<M2Ribbon>,
    pub particles: ArrayRef<M2Particle>,
    /// From Wrath on, when [`M2ModelFlags::USE_TEXTURE_COMBINERS`] is set
    #[debug(with = debug::trimmed_collection_fmt)]
    pub blending_maps: ArrayRef<u16>,
    /// File data ids of a chunked file
    pub file_ids: FileIdChunks,
    /// View count stored in the header, kept when the views themselves
    /// could not be read
    view_count: u32,
}

impl M2Model {
    /// Create an empty model of the given revision
    pub fn new(version: M2Version) -> Self {
        Self {
            version,
            ..Default::default()
        }
    }

    pub fn name(&self) -> Cow<'_, str> {
        self.name.to_name_string()
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = ArrayRef::from_name(name);
    }

    /// Number of views declared by the header
    pub fn view_count(&self) -> usize {
        if self.views.is_empty() {
            self.view_count as usize
        } else {
            self.views.len()
        }
    }

    /// Load a model from a path, reading `.anim` and `.skin` side files
    /// from the same directory
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_from_path_with(path, &LoadOptions::default())
    }

    pub fn load_from_path_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let mut resolver = PathResolver::new(path);
        Self::load_with(&mut Cursor::new(data), Some(&mut resolver), options)
    }

    /// Save a model to a path, writing side files next to it
    pub fn save_to_path<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.save_to_path_with(path, &SaveOptions::default())
    }

    pub fn save_to_path_with<P: AsRef<Path>>(&mut self, path: P, options: &SaveOptions) -> Result<()> {
        let path = path.as_ref();
        let mut output = Cursor::new(Vec::new());
        let mut resolver = PathResolver::new(path);
        self.save_with(&mut output, Some(&mut resolver), options)?;
        fs::write(path, output.into_inner())?;
        Ok(())
    }

    /// Load a model without side files
    pub fn load<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Self::load_with(reader, None, &LoadOptions::default())
    }

    /// Load a plain (`MD20`) or chunked (`MD21`) model.
    ///
    /// Offsets are relative to the start of the `MD20` image. Without a
    /// collaborator, timelines kept in `.anim` files stay empty and views
    /// kept in `.skin` files are not loaded.
    pub fn load_with<R: Read + Seek>(
        reader: &mut R,
        mut files: Option<&mut dyn ExternalFiles>,
        options: &LoadOptions,
    ) -> Result<Self> {
        let start = reader.stream_position()?;
        let magic = reader.read_magic()?;

        let mut model = match magic {
            MD21 => {
                let size = reader.read_u32_le()?;
                let image_start = start + 8;
                let end = image_start + u64::from(size);
                let len = stream_len(reader)?;
                if end > len {
                    return Err(M2Error::Truncated(format!(
                        "MD21 chunk declares {size} bytes but only {} remain",
                        len - image_start
                    )));
                }

                let mut image = ChunkStream::new(&mut *reader)?.with_limit(u64::from(size));
                let mut model = Self::read_image(&mut image, reborrow(&mut files), options)?;

                reader.seek(SeekFrom::Start(end))?;
                let view_count = model.view_count as usize;
                let mut file_ids = FileIdChunks::default();
                scan_chunks(reader, |header, reader| {
                    if !file_ids.read_chunk(header, reader, view_count)? {
                        log::debug!("skipping chunk {} ({} bytes)", header.magic_str(), header.size);
                    }
                    Ok(())
                })?;
                model.file_ids = file_ids;
                model
            }
            MD20 => {
                reader.seek(SeekFrom::Start(start))?;
                let mut image = ChunkStream::new(&mut *reader)?;
                Self::read_image(&mut image, reborrow(&mut files), options)?
            }
            other => {
                return Err(M2Error::InvalidMagic {
                    expected: "MD20 or MD21".to_string(),
                    actual: String::from_utf8_lossy(&other).to_string(),
                });
            }
        };

        model.load_external_views(reborrow(&mut files))?;
        Ok(model)
    }

    /// Header and content pass over an `MD20` image
    fn read_image<S: Read + Seek>(
        stream: &mut S,
        files: Option<&mut dyn ExternalFiles>,
        options: &LoadOptions,
    ) -> Result<Self> {
        let magic = stream.read_magic()?;
        if magic != MD20 {
            return Err(M2Error::InvalidMagic {
                expected: String::from_utf8_lossy(&MD20).to_string(),
                actual: String::from_utf8_lossy(&magic).to_string(),
            });
        }
        let version = options.resolve_version(stream.read_u32_le()?)?;
        log::debug!("loading model version {version}");

        let unbound = SequenceRegistry::new();
        let mut ctx = M2Context::new(version, &unbound);
        let mut model = Self::new(version);

        model.name = ArrayRef::load_header(stream)?;
        model.flags = M2ModelFlags::from_bits_retain(stream.read_u32_le()?);
        model.global_loops = ArrayRef::load_header(stream)?;
        let mut sequences: ArrayRef<M2Sequence> = ArrayRef::load_header(stream)?;
        skip_generated(stream)?;
        if !version.has_sequence_timelines() {
            skip_generated(stream)?;
        }
        model.bones = ArrayRef::load_header(stream)?;
        skip_generated(stream)?;
        model.vertices = ArrayRef::load_header(stream)?;
        if version.has_external_files() {
            model.view_count = stream.read_u32_le()?;
        } else {
            model.views = ArrayRef::load_header(stream)?;
        }
        model.colors = ArrayRef::load_header(stream)?;
        model.textures = ArrayRef::load_header(stream)?;
        model.texture_weights = ArrayRef::load_header(stream)?;
        if !version.has_external_files() {
            skip_generated(stream)?;
        }
        model.texture_transforms = ArrayRef::load_header(stream)?;
        skip_generated(stream)?;
        model.materials = ArrayRef::load_header(stream)?;
        model.bone_lookup = ArrayRef::load_header(stream)?;
        model.texture_lookup = ArrayRef::load_header(stream)?;
        model.texture_unit_lookup = ArrayRef::load_header(stream)?;
        model.transparency_lookup = ArrayRef::load_header(stream)?;
        model.texture_transform_lookup = ArrayRef::load_header(stream)?;
        model.bounds = M2Bounds::read_value(stream)?;
        model.collision_bounds = M2Bounds::read_value(stream)?;
        model.collision_triangles = ArrayRef::load_header(stream)?;
        model.collision_vertices = ArrayRef::load_header(stream)?;
        model.collision_normals = ArrayRef::load_header(stream)?;
        model.attachments = ArrayRef::load_header(stream)?;
        skip_generated(stream)?;
        model.events = ArrayRef::load_header(stream)?;
        model.lights = ArrayRef::load_header(stream)?;
        model.cameras = ArrayRef::load_header(stream)?;
        skip_generated(stream)?;
        model.ribbons = ArrayRef::load_header(stream)?;
        model.particles = ArrayRef::load_header(stream)?;
        if model.has_blending_maps(version) {
            model.blending_maps = ArrayRef::load_header(stream)?;
        }

        model.name.load_content(stream, &mut ctx)?;
        model.global_loops.load_content(stream, &mut ctx)?;
        sequences.load_content(stream, &mut ctx)?;
        let registry = SequenceRegistry::from(sequences.into_vec());

        let mut files = files;
        let mut ctx = M2Context::new(version, &registry).with_files(reborrow(&mut files));
        model.bones.load_content(stream, &mut ctx)?;
        model.vertices.load_content(stream, &mut ctx)?;
        model.views.load_content(stream, &mut ctx)?;
        model.colors.load_content(stream, &mut ctx)?;
        model.textures.load_content(stream, &mut ctx)?;
        model.texture_weights.load_content(stream, &mut ctx)?;
        model.texture_transforms.load_content(stream, &mut ctx)?;
        model.materials.load_content(stream, &mut ctx)?;
        model.bone_lookup.load_content(stream, &mut ctx)?;
        model.texture_lookup.load_content(stream, &mut ctx)?;
        model.texture_unit_lookup.load_content(stream, &mut ctx)?;
        model.transparency_lookup.load_content(stream, &mut ctx)?;
        model.texture_transform_lookup.load_content(stream, &mut ctx)?;
        model.collision_triangles.load_content(stream, &mut ctx)?;
        model.collision_vertices.load_content(stream, &mut ctx)?;
        model.collision_normals.load_content(stream, &mut ctx)?;
        model.attachments.load_content(stream, &mut ctx)?;
        model.events.load_content(stream, &mut ctx)?;
        model.lights.load_content(stream, &mut ctx)?;
        model.cameras.load_content(stream, &mut ctx)?;
        model.ribbons.load_content(stream, &mut ctx)?;
        model.particles.load_content(stream, &mut ctx)?;
        model.blending_maps.load_content(stream, &mut ctx)?;
        model.sequences = registry;

        if options.normalize_legacy_materials && version < M2Version::CATACLYSM {
            for material in model.materials.iter_mut() {
                material.normalize_legacy();
            }
        }

        log::debug!(
            "loaded '{}': {} sequences, {} bones, {} vertices",
            model.name(),
            model.sequences.len(),
            model.bones.len(),
            model.vertices.len()
        );
        Ok(model)
    }

    fn load_external_views(&mut self, files: Option<&mut dyn ExternalFiles>) -> Result<()> {
        if !self.version.has_external_files() || self.view_count == 0 {
            return Ok(());
        }
        let Some(files) = files else {
            log::debug!("{} views are kept in .skin files, which are not available", self.view_count);
            return Ok(());
        };

        let unbound = SequenceRegistry::new();
        let mut views = Vec::with_capacity(self.view_count as usize);
        for index in 0..self.view_count as usize {
            let mut view = None;
            if let Some(&id) = self.file_ids.skin_file_ids.get(index) {
                if let Some(mut stream) = files.open_file_data_id(id)? {
                    view = Some(read_view(&mut stream, self.version, &unbound)?);
                }
            }
            if view.is_none() {
                if let Some(mut stream) = files.open_skin(index)? {
                    view = Some(read_view(&mut stream, self.version, &unbound)?);
                }
            }

            match view {
                Some(view) => views.push(view),
                None => {
                    log::warn!(
                        "view {index} of {} is missing, the remaining views are not loaded",
                        self.view_count
                    );
                    break;
                }
            }
        }
        self.views = views.into();
        Ok(())
    }

    /// Save without side files
    pub fn save<W: Write + Seek>(&mut self, writer: &mut W) -> Result<()> {
        self.save_with(writer, None, &SaveOptions::default())
    }

    /// Save the model, converting it to the target revision first.
    ///
    /// Saving updates the model in place: tracks are padded to one slot per
    /// sequence, legacy time starts are reassigned, bone rotations are
    /// re-encoded and an empty texture unit lookup gains a single `0` at
    /// Wrath and below. The saved model therefore equals its reload.
    pub fn save_with<W: Write + Seek>(
        &mut self,
        writer: &mut W,
        mut files: Option<&mut dyn ExternalFiles>,
        options: &SaveOptions,
    ) -> Result<()> {
        let version = options.resolve_version(self.version)?;
        let chunked = options.resolve_chunked(version);
        log::debug!("saving model version {version}{}", if chunked { " (chunked)" } else { "" });

        self.prepare_save(version);
        let lookups = self.generated_lookups()?;
        self.create_anim_files(reborrow(&mut files))?;

        if chunked {
            let start = writer.stream_position()?;
            writer.write_all(&MD21)?;
            writer.write_u32_le(0)?;

            let mut image = ChunkStream::new(&mut *writer)?;
            self.write_image(&mut image, &lookups, reborrow(&mut files))?;
            let size = image.seek(SeekFrom::End(0))?;
            let size = u32::try_from(size).map_err(|_| {
                M2Error::Schema(format!("MD20 image of {size} bytes does not fit a chunk"))
            })?;

            writer.seek(SeekFrom::Start(start + 4))?;
            writer.write_u32_le(size)?;
            writer.seek(SeekFrom::Start(start + 8 + u64::from(size)))?;
            self.file_ids.write_chunks(writer)?;
        } else {
            if !self.file_ids.is_empty() {
                log::debug!("file id chunks are only written to chunked files");
            }
            let mut image = ChunkStream::new(&mut *writer)?;
            self.write_image(&mut image, &lookups, reborrow(&mut files))?;
        }

        self.save_external_views(reborrow(&mut files))
    }

    fn prepare_save(&mut self, version: M2Version) {
        self.version = version;
        if !version.has_sequence_timelines() {
            self.sequences.assign_time_starts();
        }

        let sequences = &self.sequences;
        self.bones.set_sequences(sequences);
        self.colors.set_sequences(sequences);
        self.texture_weights.set_sequences(sequences);
        self.texture_transforms.set_sequences(sequences);
        self.attachments.set_sequences(sequences);
        self.events.set_sequences(sequences);
        self.lights.set_sequences(sequences);
        self.cameras.set_sequences(sequences);
        self.ribbons.set_sequences(sequences);
        self.particles.set_sequences(sequences);

        for bone in self.bones.iter_mut() {
            bone.rotation = bone.rotation.converted_for(version);
        }

        if version <= M2Version::LICH_KING && self.texture_unit_lookup.is_empty() {
            self.texture_unit_lookup.push(0);
        }
        if version.has_external_files() && !self.views.is_empty() {
            self.view_count = self.views.len() as u32;
        }
    }

    fn generated_lookups(&self) -> Result<GeneratedLookups> {
        let sequence = self.sequences.sequence_lookup()?;
        let playable = if self.version.has_sequence_timelines() {
            ArrayRef::new()
        } else {
            SequenceRegistry::playable_lookup(&sequence)
        };

        Ok(GeneratedLookups {
            sequence,
            playable,
            key_bone: M2Bone::key_bone_lookup(&self.bones)?,
            texture_replace: M2Texture::replace_lookup(&self.textures)?,
            attachment: M2Attachment::lookup(&self.attachments)?,
            camera: M2Camera::lookup(&self.cameras)?,
        })
    }

    fn has_blending_maps(&self, version: M2Version) -> bool {
        version.has_external_files() && self.flags.contains(M2ModelFlags::USE_TEXTURE_COMBINERS)
    }

    /// Truncate the `.anim` file of every sequence stored externally, so the
    /// content pass can append timelines to them
    fn create_anim_files(&self, files: Option<&mut dyn ExternalFiles>) -> Result<()> {
        let keys: Vec<_> = self
            .sequences
            .iter()
            .enumerate()
            .filter(|(_, sequence)| sequence.is_external(self.version))
            .map(|(index, sequence)| sequence.anim_file_key(index))
            .collect();
        if keys.is_empty() {
            return Ok(());
        }
        let Some(files) = files else {
            log::warn!(
                "{} sequences keep their timelines in .anim files and no side files are available",
                keys.len()
            );
            return Ok(());
        };
        for key in &keys {
            files.create_anim(key)?;
        }
        Ok(())
    }

    fn save_external_views(&self, files: Option<&mut dyn ExternalFiles>) -> Result<()> {
        if !self.version.has_external_files() || self.views.is_empty() {
            return Ok(());
        }
        let Some(files) = files else {
            log::warn!("{} views not written: no side files are available", self.views.len());
            return Ok(());
        };

        let unbound = SequenceRegistry::new();
        for (index, view) in self.views.iter().enumerate() {
            let mut output = files.create_skin(index)?;
            let mut ctx = M2Context::new(self.version, &unbound);
            let patch = view.write_header(&mut output, &mut ctx)?;
            view.save_content(&mut output, patch, &mut ctx)?;
        }
        Ok(())
    }

    fn write_image<W: Write + Seek>(
        &self,
        writer: &mut W,
        lookups: &GeneratedLookups,
        files: Option<&mut dyn ExternalFiles>,
    ) -> Result<()> {
        let version = self.version;
        let mut files = files;
        let mut ctx = M2Context::new(version, &self.sequences).with_files(reborrow(&mut files));
        let ctx = &mut ctx;

        writer.write_all(&MD20)?;
        writer.write_u32_le(version.to_header_version())?;
        let name = self.name.write_header(writer, ctx)?;
        writer.write_u32_le(self.flags.bits())?;
        let global_loops = self.global_loops.write_header(writer, ctx)?;
        let sequences = self.sequences.array().write_header(writer, ctx)?;
        let sequence_lookup = lookups.sequence.write_header(writer, ctx)?;
        let playable_lookup = if version.has_sequence_timelines() {
            None
        } else {
            Some(lookups.playable.write_header(writer, ctx)?)
        };
        let bones = self.bones.write_header(writer, ctx)?;
        let key_bone_lookup = lookups.key_bone.write_header(writer, ctx)?;
        let vertices = self.vertices.write_header(writer, ctx)?;
        let views = if version.has_external_files() {
            writer.write_u32_le(self.view_count)?;
            None
        } else {
            Some(self.views.write_header(writer, ctx)?)
        };
        let colors = self.colors.write_header(writer, ctx)?;
        let textures = self.textures.write_header(writer, ctx)?;
        let texture_weights = self.texture_weights.write_header(writer, ctx)?;
        if !version.has_external_files() {
            writer.write_u32_le(0)?;
            writer.write_u32_le(0)?;
        }
        let texture_transforms = self.texture_transforms.write_header(writer, ctx)?;
        let texture_replace_lookup = lookups.texture_replace.write_header(writer, ctx)?;
        let materials = self.materials.write_header(writer, ctx)?;
        let bone_lookup = self.bone_lookup.write_header(writer, ctx)?;
        let texture_lookup = self.texture_lookup.write_header(writer, ctx)?;
        let texture_unit_lookup = self.texture_unit_lookup.write_header(writer, ctx)?;
        let transparency_lookup = self.transparency_lookup.write_header(writer, ctx)?;
        let texture_transform_lookup = self.texture_transform_lookup.write_header(writer, ctx)?;
        self.bounds.write_value(writer)?;
        self.collision_bounds.write_value(writer)?;
        let collision_triangles = self.collision_triangles.write_header(writer, ctx)?;
        let collision_vertices = self.collision_vertices.write_header(writer, ctx)?;
        let collision_normals = self.collision_normals.write_header(writer, ctx)?;
        let attachments = self.attachments.write_header(writer, ctx)?;
        let attachment_lookup = lookups.attachment.write_header(writer, ctx)?;
        let events = self.events.write_header(writer, ctx)?;
        let lights = self.lights.write_header(writer, ctx)?;
        let cameras = self.cameras.write_header(writer, ctx)?;
        let camera_lookup = lookups.camera.write_header(writer, ctx)?;
        let ribbons = self.ribbons.write_header(writer, ctx)?;
        let particles = self.particles.write_header(writer, ctx)?;
        let blending_maps = if self.has_blending_maps(version) {
            Some(self.blending_maps.write_header(writer, ctx)?)
        } else {
            if !self.blending_maps.is_empty() {
                log::warn!("dropping blending maps not supported by version {version}");
            }
            None
        };

        self.write_content(
            writer,
            lookups,
            ImagePatch {
                name,
                global_loops,
                sequences,
                sequence_lookup,
                playable_lookup,
                bones,
                key_bone_lookup,
                vertices,
                views,
                colors,
                textures,
                texture_weights,
                texture_transforms,
                texture_replace_lookup,
                materials,
                bone_lookup,
                texture_lookup,
                texture_unit_lookup,
                transparency_lookup,
                texture_transform_lookup,
                collision_triangles,
                collision_vertices,
                collision_normals,
                attachments,
                attachment_lookup,
                events,
                lights,
                cameras,
                camera_lookup,
                ribbons,
                particles,
                blending_maps,
            },
            ctx,
        )
    }

    fn write_content<W: Write + Seek>(
        &self,
        writer: &mut W,
        lookups: &GeneratedLookups,
        patch: ImagePatch,
        ctx: &mut M2Context<'_>,
    ) -> Result<()> {
        self.name.save_content(writer, patch.name, ctx)?;
        self.global_loops.save_content(writer, patch.global_loops, ctx)?;
        self.sequences
            .array()
            .save_content(writer, patch.sequences, ctx)?;
        lookups
            .sequence
            .save_content(writer, patch.sequence_lookup, ctx)?;
        if let Some(token) = patch.playable_lookup {
            lookups.playable.save_content(writer, token, ctx)?;
        }
        self.bones.save_content(writer, patch.bones, ctx)?;
        lookups
            .key_bone
            .save_content(writer, patch.key_bone_lookup, ctx)?;
        self.vertices.save_content(writer, patch.vertices, ctx)?;
        if let Some(token) = patch.views {
            self.views.save_content(writer, token, ctx)?;
        }
        self.colors.save_content(writer, patch.colors, ctx)?;
        self.textures.save_content(writer, patch.textures, ctx)?;
        self.texture_weights
            .save_content(writer, patch.texture_weights, ctx)?;
        self.texture_transforms
            .save_content(writer, patch.texture_transforms, ctx)?;
        lookups
            .texture_replace
            .save_content(writer, patch.texture_replace_lookup, ctx)?;
        self.materials.save_content(writer, patch.materials, ctx)?;
        self.bone_lookup.save_content(writer, patch.bone_lookup, ctx)?;
        self.texture_lookup
            .save_content(writer, patch.texture_lookup, ctx)?;
        self.texture_unit_lookup
            .save_content(writer, patch.texture_unit_lookup, ctx)?;
        self.transparency_lookup
            .save_content(writer, patch.transparency_lookup, ctx)?;
        self.texture_transform_lookup
            .save_content(writer, patch.texture_transform_lookup, ctx)?;
        self.collision_triangles
            .save_content(writer, patch.collision_triangles, ctx)?;
        self.collision_vertices
            .save_content(writer, patch.collision_vertices, ctx)?;
        self.collision_normals
            .save_content(writer, patch.collision_normals, ctx)?;
        self.attachments.save_content(writer, patch.attachments, ctx)?;
        lookups
            .attachment
            .save_content(writer, patch.attachment_lookup, ctx)?;
        self.events.save_content(writer, patch.events, ctx)?;
        self.lights.save_content(writer, patch.lights, ctx)?;
        self.cameras.save_content(writer, patch.cameras, ctx)?;
        lookups
            .camera
            .save_content(writer, patch.camera_lookup, ctx)?;
        self.ribbons.save_content(writer, patch.ribbons, ctx)?;
        self.particles.save_content(writer, patch.particles, ctx)?;
        if let Some(token) = patch.blending_maps {
            self.blending_maps.save_content(writer, token, ctx)?;
        }
        Ok(())
    }

    /// Validate cross references between entities
    pub fn validate(&self) -> Result<()> {
        for (i, bone) in self.bones.iter().enumerate() {
            if bone.parent_bone >= 0 && bone.parent_bone as usize >= self.bones.len() {
                return Err(M2Error::ValidationError(format!(
                    "Bone {} has invalid parent bone {}",
                    i, bone.parent_bone
                )));
            }
        }

        for index in 0..self.sequences.len() {
            self.sequences.resolve_alias(index)?;
        }

        for (view_index, view) in self.views.iter().enumerate() {
            for batch in view.batches.iter() {
                if usize::from(batch.material_index) >= self.materials.len() {
                    return Err(M2Error::ValidationError(format!(
                        "View {view_index} references material {} of {}",
                        batch.material_index,
                        self.materials.len()
                    )));
                }
            }
        }

        Ok(())
    }
}

/// Read the descriptor of a lookup that is regenerated on save
fn skip_generated<R: Read>(reader: &mut R) -> Result<()> {
    let lookup: ArrayRef<i16> = ArrayRef::load_header(reader)?;
    log::trace!("ignoring stored lookup of {} entries", lookup.declared_count());
    Ok(())
}

fn read_view<S: Read + Seek>(
    stream: &mut S,
    version: M2Version,
    sequences: &SequenceRegistry,
) -> Result<M2SkinProfile> {
    let mut ctx = M2Context::new(version, sequences);
    let mut view = M2SkinProfile::read_header(stream, &mut ctx)?;
    view.load_content(stream, &mut ctx)?;
    Ok(view)
}
