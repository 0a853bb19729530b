//! Save and reload models of every supported layout

use pretty_assertions::assert_eq;
use test_case::test_case;
use wow_m2_codec::{M2Model, M2Version, MemoryFiles, SaveOptions};

use crate::common::{init_logging, load, sample_model, save};

#[test_case(M2Version::CLASSIC ; "classic")]
#[test_case(M2Version::BURNING_CRUSADE ; "burning crusade")]
#[test_case(M2Version::LATE_BURNING_CRUSADE ; "late burning crusade")]
fn test_legacy_roundtrip(version: M2Version) {
    init_logging();
    let mut model = sample_model(version);
    let bytes = save(&mut model, None, &SaveOptions::new());

    assert_eq!(&bytes[..4], b"MD20");
    let reloaded = load(&bytes, None);
    assert_eq!(reloaded, model);
    assert_eq!(reloaded.name(), "Wolf");
    assert_eq!(reloaded.views.len(), 1);
}

#[test_case(M2Version::LICH_KING ; "lich king")]
#[test_case(M2Version::CATACLYSM ; "cataclysm")]
#[test_case(M2Version::LEGION ; "legion")]
fn test_modern_roundtrip(version: M2Version) {
    init_logging();
    let mut model = sample_model(version);
    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new());

    let magic: &[u8] = if version >= M2Version::LEGION { b"MD21" } else { b"MD20" };
    assert_eq!(&bytes[..4], magic);
    assert_eq!(files.skin_count(), 1);
    assert_eq!(files.anim_count(), 0);

    let reloaded = load(&bytes, Some(&mut files));
    assert_eq!(reloaded, model);
}

#[test_case(M2Version::CLASSIC ; "classic")]
#[test_case(M2Version::LICH_KING ; "lich king")]
#[test_case(M2Version::LEGION ; "legion")]
fn test_resave_is_byte_identical(version: M2Version) {
    init_logging();
    let mut model = sample_model(version);
    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new());

    let mut reloaded = load(&bytes, Some(&mut files));
    let mut again_files = MemoryFiles::new();
    let again = save(&mut reloaded, Some(&mut again_files), &SaveOptions::new());

    assert_eq!(again, bytes);
    assert_eq!(again_files.skin(0), files.skin(0));
}

#[test]
fn test_plain_legion_file() {
    init_logging();
    let mut model = sample_model(M2Version::LEGION);
    let mut files = MemoryFiles::new();
    let bytes = save(&mut model, Some(&mut files), &SaveOptions::new().chunked(false));

    assert_eq!(&bytes[..4], b"MD20");
    let reloaded = load(&bytes, Some(&mut files));
    assert_eq!(reloaded, model);
}

#[test]
fn test_sequences_and_timelines_survive() {
    init_logging();
    let mut model = sample_model(M2Version::CLASSIC);
    let bytes = save(&mut model, None, &SaveOptions::new());
    let reloaded = load(&bytes, None);

    let starts: Vec<u32> = reloaded.sequences.iter().map(|s| s.time_start).collect();
    // the alias shares the window of the sequence it plays
    assert_eq!(starts, vec![3333, 3333 + 1000 + 3333, 3333]);

    let translation = &reloaded.bones[0].translation;
    let walk = translation.timeline(1, &reloaded.sequences).unwrap();
    assert_eq!(walk.timestamps, &[0, 800]);

    let stand = translation.timeline(0, &reloaded.sequences).unwrap();
    let variation = translation.timeline(2, &reloaded.sequences).unwrap();
    assert_eq!(variation, stand);
    assert!(translation.slot(2).unwrap().is_empty());
}

#[test]
fn test_empty_model_roundtrip() {
    init_logging();
    for version in [M2Version::CLASSIC, M2Version::LICH_KING, M2Version::LEGION] {
        let mut model = M2Model::new(version);
        let bytes = save(&mut model, None, &SaveOptions::new());
        assert_eq!(load(&bytes, None), model);
    }
}
