//! Shared model fixtures

use std::io::Cursor;

use wow_m2_codec::chunks::{
    BoneRotation, M2Attachment, M2Bone, M2Camera, M2CameraType, M2Color, M2Event, M2Light,
    M2Material, M2Particle, M2ParticleLife, M2ParticleLifeTracks, M2ParticleStages, M2Ribbon,
    M2Texture, M2TextureType, M2TextureWeight, M2Vertex, PartTrack,
};
use wow_m2_codec::common::{
    C2Vector, C3Vector, CAaBox, FixedPoint016, M2Bounds, M2CompQuat, M2SplineKey, VertexProperty,
};
use wow_m2_codec::{
    EventTrack, ExternalFiles, InterpolationType, LoadOptions, M2Batch, M2Model, M2Sequence,
    M2SequenceFlags, M2SkinProfile, M2SkinSection, M2Version, SaveOptions, SequenceRegistry,
    Track,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Stand and walk, plus a variation of stand aliasing the first sequence
pub fn sequences() -> SequenceRegistry {
    let alias = M2Sequence {
        flags: M2SequenceFlags::IS_ALIAS | M2SequenceFlags::PRIMARY_BONE_SEQUENCE,
        alias_next: 0,
        ..M2Sequence::new(0, 1, 1000)
    };
    vec![
        M2Sequence::new(0, 0, 1000),
        M2Sequence::new(4, 0, 800),
        alias,
    ]
    .into()
}

fn root_bone(sequences: &SequenceRegistry) -> M2Bone {
    let mut translation = Track::new(InterpolationType::Linear);
    translation
        .set_timeline(
            0,
            vec![0, 500, 1000],
            vec![C3Vector::ZERO, C3Vector::new(0.0, 0.0, 0.25), C3Vector::ZERO],
        )
        .unwrap();
    translation
        .set_timeline(1, vec![0, 800], vec![C3Vector::ZERO, C3Vector::new(1.0, 0.0, 0.0)])
        .unwrap();

    M2Bone {
        key_bone_id: 0,
        translation,
        rotation: BoneRotation::Compressed(Track::with_default(M2CompQuat::IDENTITY, sequences)),
        scale: Track::with_default(C3Vector::ONE, sequences),
        ..Default::default()
    }
}

fn vertex(x: f32, y: f32) -> M2Vertex {
    M2Vertex {
        position: C3Vector::new(x, y, 0.0),
        bone_weights: [255, 0, 0, 0],
        bone_indices: [0, 0, 0, 0],
        normal: C3Vector::new(0.0, 0.0, 1.0),
        tex_coords: [C2Vector { x, y }, C2Vector { x: 0.0, y: 0.0 }],
    }
}

pub fn view() -> M2SkinProfile {
    M2SkinProfile {
        vertices: vec![0, 1, 2].into(),
        indices: vec![0, 1, 2].into(),
        bones: vec![VertexProperty([0, 0, 0, 0]); 3].into(),
        submeshes: vec![M2SkinSection {
            vertex_count: 3,
            index_count: 3,
            bone_count: 1,
            bone_influences: 1,
            ..Default::default()
        }]
        .into(),
        batches: vec![M2Batch::default()].into(),
        bone_count_max: 21,
        ..Default::default()
    }
}

fn camera(sequences: &SequenceRegistry) -> M2Camera {
    let mut camera = M2Camera::new(M2CameraType::Portrait);
    camera.far_clip = 27.7;
    camera.near_clip = 0.22;
    camera.position_base = C3Vector::new(1.5, 0.0, 1.7);
    camera.target_position_base = C3Vector::new(0.0, 0.0, 1.6);
    camera.field_of_view = Track::with_default(M2SplineKey::flat(0.7), sequences);
    camera
}

fn particle(version: M2Version, sequences: &SequenceRegistry) -> M2Particle {
    let life = if version < M2Version::LICH_KING {
        M2ParticleLife::Stages(M2ParticleStages {
            mid_point: 0.5,
            scales: [1.0, 2.0, 0.5],
            ..Default::default()
        })
    } else {
        M2ParticleLife::Tracks(Box::new(M2ParticleLifeTracks {
            alpha: PartTrack::constant(FixedPoint016(32767)),
            scale: PartTrack::constant(C2Vector { x: 1.0, y: 1.0 }),
            ..Default::default()
        }))
    };

    M2Particle {
        texture_rows: 1,
        texture_cols: 1,
        emission_speed: Track::with_default(2.0, sequences),
        lifespan: Track::with_default(1.5, sequences),
        emission_rate: Track::with_default(10.0, sequences),
        enabled_in: Track::with_default(1, sequences),
        life,
        ..Default::default()
    }
}

/// A small wolf-like model exercising every entity, laid out for `version`
pub fn sample_model(version: M2Version) -> M2Model {
    let sequences = sequences();

    let mut model = M2Model::new(version);
    model.set_name("Wolf");
    model.global_loops = vec![2000].into();

    model.bones = vec![
        root_bone(&sequences),
        M2Bone {
            parent_bone: 0,
            pivot: C3Vector::new(0.0, 0.0, 0.5),
            ..Default::default()
        },
    ]
    .into();
    model.vertices = vec![vertex(0.0, 0.0), vertex(1.0, 0.0), vertex(0.0, 1.0)].into();
    model.views = vec![view()].into();

    model.colors = vec![M2Color {
        color: Track::with_default(C3Vector::ONE, &sequences),
        alpha: Track::with_default(FixedPoint016(32767), &sequences),
    }]
    .into();
    model.textures = vec![
        M2Texture::new(M2TextureType::Hardcoded, "Creature\\Wolf\\Wolf.blp"),
        M2Texture::new(M2TextureType::Body, ""),
    ]
    .into();

    let mut weight = Track::global(InterpolationType::Linear, 0);
    weight
        .set_timeline(0, vec![0, 1000], vec![FixedPoint016(0), FixedPoint016(32767)])
        .unwrap();
    model.texture_weights = vec![M2TextureWeight { weight }].into();
    model.materials = vec![M2Material::default()].into();

    model.bone_lookup = vec![0, 1].into();
    model.texture_lookup = vec![0, 1].into();
    model.texture_unit_lookup = vec![0].into();
    model.transparency_lookup = vec![0].into();
    model.texture_transform_lookup = vec![-1].into();

    model.bounds = M2Bounds {
        extent: CAaBox {
            min: C3Vector::new(-1.0, -1.0, 0.0),
            max: C3Vector::new(1.0, 1.0, 2.0),
        },
        radius: 2.0,
    };
    model.collision_bounds = model.bounds;
    model.collision_triangles = vec![0, 1, 2].into();
    model.collision_vertices = vec![C3Vector::ZERO, C3Vector::new(1.0, 0.0, 0.0), C3Vector::new(0.0, 1.0, 0.0)].into();
    model.collision_normals = vec![C3Vector::new(0.0, 0.0, 1.0)].into();

    model.attachments = vec![M2Attachment {
        id: 1,
        position: C3Vector::new(0.2, 0.0, 1.0),
        animate_attached: Track::with_default(1, &sequences),
        ..Default::default()
    }]
    .into();

    let mut enabled = EventTrack::default();
    enabled.set_timestamps(0, vec![250]);
    let mut footstep = M2Event::new(*b"$FSD", 0);
    footstep.enabled = enabled;
    model.events = vec![footstep].into();

    model.lights = vec![M2Light {
        bone: 0,
        ambient_intensity: Track::with_default(1.0, &sequences),
        attenuation_end: Track::with_default(4.0, &sequences),
        ..Default::default()
    }]
    .into();
    model.cameras = vec![camera(&sequences)].into();
    model.ribbons = vec![M2Ribbon {
        texture_indices: vec![0].into(),
        material_indices: vec![0].into(),
        edges_per_second: 30.0,
        edge_lifetime: 1.0,
        visibility: Track::with_default(1, &sequences),
        ..Default::default()
    }]
    .into();
    model.particles = vec![particle(version, &sequences)].into();

    model.sequences = sequences;
    model
}

pub fn save(
    model: &mut M2Model,
    files: Option<&mut dyn ExternalFiles>,
    options: &SaveOptions,
) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    model.save_with(&mut cursor, files, options).unwrap();
    cursor.into_inner()
}

pub fn load(bytes: &[u8], files: Option<&mut dyn ExternalFiles>) -> M2Model {
    M2Model::load_with(&mut Cursor::new(bytes), files, &LoadOptions::default()).unwrap()
}
