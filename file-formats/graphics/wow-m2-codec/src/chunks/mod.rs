pub mod attachment;
pub mod bone;
pub mod camera;
pub mod color;
pub mod event;
pub mod file_id;
pub mod infrastructure;
pub mod light;
pub mod material;
pub mod particle;
pub mod ribbon;
pub mod texture;
pub mod texture_transform;
pub mod texture_weight;
pub mod vertex;

// Re-export common types
pub use attachment::{M2Attachment, M2AttachmentType};
pub use bone::{BoneRotation, M2Bone, M2BoneFlags};
pub use camera::{M2Camera, M2CameraType};
pub use color::M2Color;
pub use event::M2Event;
pub use file_id::{AnimationFileId, FileIdChunks};
pub use infrastructure::{ChunkHeader, ChunkStream};
pub use light::{M2Light, M2LightType};
pub use material::{M2BlendMode, M2Material, M2RenderFlags};
pub use particle::{
    M2Particle, M2ParticleEmitterType, M2ParticleFlags, M2ParticleLife, M2ParticleLifeTracks,
    M2ParticleStages, PartTrack,
};
pub use ribbon::M2Ribbon;
pub use texture::{M2Texture, M2TextureFlags, M2TextureType};
pub use texture_transform::M2TextureTransform;
pub use texture_weight::M2TextureWeight;
pub use vertex::M2Vertex;
