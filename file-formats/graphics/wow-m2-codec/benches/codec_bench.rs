use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::io::Cursor;
use wow_m2_codec::chunks::{M2Bone, M2Vertex};
use wow_m2_codec::common::C3Vector;
use wow_m2_codec::{InterpolationType, M2Model, M2Sequence, M2Version, SaveOptions, Track};

fn create_test_model(version: M2Version) -> M2Model {
    let mut model = M2Model::new(version);
    model.set_name("BenchModel");
    model.global_loops = vec![0, 100, 200].into();
    model.sequences = (0..16u16).map(|id| M2Sequence::new(id, 0, 1000)).collect();
    let sequence_count = model.sequences.len();

    model.bones = (0..64)
        .map(|i| {
            let mut translation = Track::new(InterpolationType::Linear);
            for slot in 0..sequence_count {
                translation
                    .set_timeline(
                        slot,
                        vec![0, 250, 500, 1000],
                        vec![C3Vector::new(i as f32, 0.0, 0.0); 4],
                    )
                    .unwrap();
            }
            M2Bone {
                parent_bone: i - 1,
                translation,
                ..Default::default()
            }
        })
        .collect();
    model.vertices = (0..4096)
        .map(|i| M2Vertex {
            position: C3Vector::new(i as f32, 0.0, 0.0),
            bone_weights: [255, 0, 0, 0],
            ..Default::default()
        })
        .collect();
    model
}

fn save(model: &mut M2Model) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    model.save_with(&mut cursor, None, &SaveOptions::new()).unwrap();
    cursor.into_inner()
}

fn bench_model_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_model");
    for version in [M2Version::CLASSIC, M2Version::LICH_KING, M2Version::LEGION] {
        let data = save(&mut create_test_model(version));
        group.bench_with_input(BenchmarkId::from_parameter(version), &data, |b, data| {
            b.iter(|| M2Model::load(&mut Cursor::new(data)).unwrap())
        });
    }
    group.finish();
}

fn bench_model_save(c: &mut Criterion) {
    let mut group = c.benchmark_group("save_model");
    for version in [M2Version::CLASSIC, M2Version::LICH_KING, M2Version::LEGION] {
        let mut model = create_test_model(version);
        group.bench_function(BenchmarkId::from_parameter(version), |b| b.iter(|| save(&mut model)));
    }
    group.finish();
}

fn bench_model_convert(c: &mut Criterion) {
    let data = save(&mut create_test_model(M2Version::CLASSIC));
    c.bench_function("convert_classic_to_wrath", |b| {
        b.iter(|| {
            let mut model = M2Model::load(&mut Cursor::new(&data)).unwrap();
            let mut cursor = Cursor::new(Vec::new());
            model
                .save_with(&mut cursor, None, &SaveOptions::new().version(264))
                .unwrap();
            cursor.into_inner()
        })
    });
}

criterion_group!(benches, bench_model_load, bench_model_save, bench_model_convert);
criterion_main!(benches);
