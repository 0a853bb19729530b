//! Saving a model at a different revision than it was loaded from

use std::io::Cursor;

use pretty_assertions::assert_eq;
use test_case::test_case;
use wow_m2_codec::chunks::{BoneRotation, M2BlendMode, M2Material, M2ParticleLife, M2RenderFlags};
use wow_m2_codec::common::{M2CompQuat, M2SplineKey, Quaternion};
use wow_m2_codec::{LoadOptions, M2Error, M2Model, M2ModelFlags, M2Version, MemoryFiles, SaveOptions, Track};

use crate::common::{init_logging, load, sample_model, save};

#[test]
fn test_classic_rotations_become_compressed() {
    init_logging();
    let mut model = sample_model(M2Version::CLASSIC);
    let classic = save(&mut model, None, &SaveOptions::new());
    let mut model = load(&classic, None);
    assert!(matches!(model.bones[0].rotation, BoneRotation::Float(_)));

    let bytes = save(&mut model, None, &SaveOptions::new().version(260));
    let reloaded = load(&bytes, None);
    assert_eq!(reloaded.version, M2Version::BURNING_CRUSADE);

    let BoneRotation::Compressed(track) = &reloaded.bones[0].rotation else {
        panic!("expected compressed rotations");
    };
    let stand = track.timeline(0, &reloaded.sequences).unwrap();
    assert_eq!(stand.values, &[M2CompQuat::IDENTITY]);
}

#[test]
fn test_compressed_rotations_expand_for_classic() {
    init_logging();
    let mut model = sample_model(M2Version::BURNING_CRUSADE);
    let bytes = save(&mut model, None, &SaveOptions::new().version(256));
    let reloaded = load(&bytes, None);

    let BoneRotation::Float(track) = &reloaded.bones[0].rotation else {
        panic!("expected float rotations");
    };
    let walk = track.timeline(1, &reloaded.sequences).unwrap();
    assert_eq!(walk.values, &[Quaternion::IDENTITY]);
}

#[test]
fn test_legacy_timeline_moves_to_per_sequence_layout() {
    init_logging();
    let mut model = sample_model(M2Version::BURNING_CRUSADE);
    let legacy = save(&mut model, None, &SaveOptions::new());
    let mut model = load(&legacy, None);
    // staged particles have no Wrath layout
    model.particles.clear();

    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new().version(264));
    let reloaded = load(&bytes, Some(&mut files));

    assert_eq!(reloaded.version, M2Version::LICH_KING);
    assert_eq!(reloaded.bones, model.bones);
    assert_eq!(reloaded.views, model.views);
    assert_eq!(reloaded.cameras, model.cameras);

    // per-sequence timelines carry no shared time starts
    assert!(reloaded.sequences.iter().all(|s| s.time_start == 0));
    let durations: Vec<u32> = reloaded.sequences.iter().map(|s| s.duration).collect();
    assert_eq!(durations, vec![1000, 800, 1000]);
}

#[test]
fn test_particle_layout_mismatch() {
    init_logging();
    let mut model = sample_model(M2Version::LICH_KING);
    assert!(matches!(model.particles[0].life, M2ParticleLife::Tracks(_)));

    let result = model.save_with(
        &mut Cursor::new(Vec::new()),
        None,
        &SaveOptions::new().version(260),
    );
    assert!(matches!(result, Err(M2Error::Schema(_))));
}

#[test_case(M2Version::LICH_KING ; "static field of view")]
#[test_case(M2Version::CATACLYSM ; "animated field of view")]
fn test_camera_field_of_view(target: M2Version) {
    init_logging();
    let mut model = sample_model(M2Version::CATACLYSM);
    let sequences = model.sequences.clone();
    model.cameras[0].field_of_view = Track::with_default(M2SplineKey::flat(0.9), &sequences);

    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new().version(target.to_header_version()));
    let reloaded = load(&bytes, Some(&mut files));

    let camera = &reloaded.cameras[0];
    assert_eq!(camera.static_fov(), 0.9);
    let walk = camera.field_of_view.timeline(1, &reloaded.sequences).unwrap();
    assert_eq!(walk.timestamps, &[0]);
    assert_eq!(camera, &model.cameras[0]);
}

#[test]
fn test_texture_unit_lookup_default() {
    init_logging();
    let mut model = M2Model::new(M2Version::LICH_KING);
    let bytes = save(&mut model, None, &SaveOptions::new());
    assert_eq!(load(&bytes, None).texture_unit_lookup.as_slice(), &[0]);

    let mut model = M2Model::new(M2Version::CATACLYSM);
    let bytes = save(&mut model, None, &SaveOptions::new());
    assert!(load(&bytes, None).texture_unit_lookup.is_empty());
}

#[test]
fn test_blending_maps_follow_flag_and_version() {
    init_logging();
    let mut model = M2Model::new(M2Version::CATACLYSM);
    model.flags = M2ModelFlags::USE_TEXTURE_COMBINERS;
    model.blending_maps = vec![0, 1, 2].into();

    let bytes = save(&mut model, None, &SaveOptions::new());
    assert_eq!(load(&bytes, None).blending_maps.as_slice(), &[0, 1, 2]);

    let bytes = save(&mut model, None, &SaveOptions::new().version(260));
    assert!(load(&bytes, None).blending_maps.is_empty());
}

#[test]
fn test_legacy_materials_normalized_on_request() {
    init_logging();
    let mut model = M2Model::new(M2Version::LICH_KING);
    model.materials = vec![M2Material {
        flags: M2RenderFlags::UNLIT | M2RenderFlags::NO_ALPHA,
        blend_mode: M2BlendMode::Other(7),
    }]
    .into();
    let bytes = save(&mut model, None, &SaveOptions::new());

    assert_eq!(load(&bytes, None).materials, model.materials);

    let options = LoadOptions::new().normalize_legacy_materials(true);
    let normalized = M2Model::load_with(&mut Cursor::new(&bytes), None, &options).unwrap();
    assert_eq!(
        normalized.materials[0],
        M2Material {
            flags: M2RenderFlags::UNLIT,
            blend_mode: M2BlendMode::Mod2X,
        }
    );
}

#[test]
fn test_unsupported_target_version() {
    let mut model = M2Model::new(M2Version::CLASSIC);
    let result = model.save_with(
        &mut Cursor::new(Vec::new()),
        None,
        &SaveOptions::new().version(300),
    );
    assert!(matches!(result, Err(M2Error::UnsupportedVersion(300))));
}
