use criterion::{criterion_group, criterion_main, Criterion, black_box};

use glam::Vec3;

use isoforge::mesh::MarchingCubes;
use isoforge::terrain::{GenerationMode, Resolution, Terrain, TerrainConfig};
use isoforge::voxel::{ChunkCoord, ChunkGrid};

fn config(mode: GenerationMode, resolution: Resolution) -> TerrainConfig {
    TerrainConfig {
        chunk_counts: [4, 4, 4],
        resolution,
        mode,
        ..Default::default()
    }
}

fn bench_initialize_heightmap(c: &mut Criterion) {
    let config = config(GenerationMode::default(), Resolution::Low);

    c.bench_function("initialize_heightmap_4x4x4", |b| {
        b.iter(|| Terrain::initialize(black_box(config.clone())))
    });
}

fn bench_initialize_volumetric(c: &mut Criterion) {
    let config = config(GenerationMode::Volumetric, Resolution::Med);

    c.bench_function("initialize_volumetric_4x4x4_med", |b| {
        b.iter(|| Terrain::initialize(black_box(config.clone())))
    });
}

fn bench_polygonize_chunk(c: &mut Criterion) {
    let config = config(GenerationMode::Volumetric, Resolution::Low);
    let terrain = match Terrain::initialize(config.clone()) {
        Ok(t) => t,
        Err(e) => panic!("terrain init failed: {}", e),
    };
    let mut grid = match ChunkGrid::build(terrain.field(), *terrain.layout()) {
        Ok(g) => g,
        Err(e) => panic!("grid build failed: {}", e),
    };
    let mesher = MarchingCubes::from_config(&config);
    let coord = ChunkCoord::new(1, 1, 1);

    c.bench_function("polygonize_chunk_8", |b| {
        b.iter(|| grid.get_mut(coord).map(|chunk| mesher.polygonize_chunk(black_box(chunk))))
    });
}

fn bench_edit_round_trip(c: &mut Criterion) {
    let mut terrain = match Terrain::initialize(config(GenerationMode::default(), Resolution::Low)) {
        Ok(t) => t,
        Err(e) => panic!("terrain init failed: {}", e),
    };
    let hit = Vec3::new(12.5, 10.5, 12.5);

    c.bench_function("edit_dig_then_fill", |b| {
        b.iter(|| {
            let dug = terrain.edit(black_box(hit), false, 2);
            let filled = terrain.edit(black_box(hit), true, 2);
            (dug.map(|s| s.len()), filled.map(|s| s.len()))
        });
    });
}

criterion_group!(
    benches,
    bench_initialize_heightmap,
    bench_initialize_volumetric,
    bench_polygonize_chunk,
    bench_edit_round_trip,
);
criterion_main!(benches);
