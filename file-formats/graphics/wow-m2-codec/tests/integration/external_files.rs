//! `.anim` and `.skin` side files

use pretty_assertions::assert_eq;
use wow_m2_codec::common::C3Vector;
use wow_m2_codec::{AnimFileKey, M2Model, M2SequenceFlags, M2Version, MemoryFiles, SaveOptions};

use crate::common::{init_logging, load, sample_model, save};

/// Sample model whose walk sequence keeps its timelines in an `.anim` file
fn model_with_external_walk(version: M2Version) -> M2Model {
    let mut model = sample_model(version);
    model.sequences.iter_mut().nth(1).unwrap().flags = M2SequenceFlags::empty();
    model
}

fn walk_key() -> AnimFileKey {
    AnimFileKey {
        sequence_index: 1,
        animation_id: 4,
        sub_animation_id: 0,
    }
}

#[test]
fn test_external_timelines_roundtrip() {
    init_logging();
    let mut model = model_with_external_walk(M2Version::LICH_KING);
    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new());

    assert_eq!(files.anim_count(), 1);
    assert!(!files.anim(&walk_key()).unwrap().is_empty());

    let reloaded = load(&bytes, Some(&mut files));
    assert_eq!(reloaded, model);
}

#[test]
fn test_external_timelines_without_side_files() {
    init_logging();
    let mut model = model_with_external_walk(M2Version::LICH_KING);
    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new());

    let reloaded = load(&bytes, None);
    let translation = &reloaded.bones[0].translation;
    assert!(translation.timeline(1, &reloaded.sequences).unwrap().is_empty());
    assert_eq!(
        translation.timeline(0, &reloaded.sequences).unwrap().values,
        &[C3Vector::ZERO, C3Vector::new(0.0, 0.0, 0.25), C3Vector::ZERO]
    );
    assert!(reloaded.views.is_empty());
    assert_eq!(reloaded.view_count(), 1);
}

#[test]
fn test_legacy_revisions_ignore_side_files() {
    init_logging();
    let mut model = model_with_external_walk(M2Version::BURNING_CRUSADE);
    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new());

    assert_eq!(files.anim_count(), 0);
    assert_eq!(files.skin_count(), 0);
    assert_eq!(load(&bytes, None), model);
}

#[test]
fn test_missing_view_keeps_declared_count() {
    init_logging();
    let mut model = sample_model(M2Version::CATACLYSM);
    model.views.push(crate::common::view());
    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new());
    assert_eq!(files.skin_count(), 2);

    let mut partial = MemoryFiles::new();
    partial.insert_skin(0, files.skin(0).unwrap().to_vec());
    let reloaded = load(&bytes, Some(&mut partial));
    assert_eq!(reloaded.views.len(), 1);
    assert_eq!(reloaded.views[0], model.views[0]);
}

#[test]
fn test_chunked_views_by_file_data_id() {
    init_logging();
    let mut model = sample_model(M2Version::LEGION);
    model.file_ids.skin_file_ids = vec![5000];
    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new());

    let mut by_id = MemoryFiles::new();
    by_id.insert_file_data_id(5000, files.skin(0).unwrap().to_vec());
    let reloaded = load(&bytes, Some(&mut by_id));

    assert_eq!(reloaded.file_ids.skin_file_ids, vec![5000]);
    assert_eq!(reloaded, model);
}

#[test]
fn test_path_resolver_roundtrip() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Wolf.m2");

    let mut model = model_with_external_walk(M2Version::LICH_KING);
    model.save_to_path(&path).unwrap();

    assert!(dir.path().join("Wolf00.skin").exists());
    assert!(dir.path().join("Wolf0004-00.anim").exists());
    assert!(!dir.path().join("Wolf0000-00.anim").exists());

    let reloaded = M2Model::load_from_path(&path).unwrap();
    assert_eq!(reloaded, model);
}

#[test]
fn test_path_resolver_listfile() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Wolf.m2");

    let mut model = sample_model(M2Version::LEGION);
    model.file_ids.skin_file_ids = vec![4242];
    model.save_to_path(&path).unwrap();

    std::fs::rename(dir.path().join("Wolf00.skin"), dir.path().join("wolf_lod0.skin")).unwrap();
    let listfile = dir.path().join("listfile.csv");
    std::fs::write(&listfile, "# file data ids\n4242;wolf_lod0.skin\n").unwrap();

    let mut resolver = wow_m2_codec::PathResolver::new(&path);
    resolver.load_listfile(&listfile).unwrap();
    let data = std::fs::read(&path).unwrap();
    let reloaded = M2Model::load_with(
        &mut std::io::Cursor::new(data),
        Some(&mut resolver),
        &wow_m2_codec::LoadOptions::new(),
    )
    .unwrap();
    assert_eq!(reloaded, model);
}
