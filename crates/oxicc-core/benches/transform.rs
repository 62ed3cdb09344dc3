//! Codec, CLUT and CMM benchmarks

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use oxicc_core::color::Xyz;
use oxicc_core::icc::tags::{CurveData, XyzTagData};
use oxicc_core::math::matrix::SRGB_TO_XYZ_D50;
use oxicc_core::pipeline::{self, Cmm, CmmConfig};
use oxicc_core::{
    Clut, ClutInputProfileBuilder, ClutPrecision, ColorSpace, IccProfile, Interpolation,
    ProfileClass, RenderingIntent, TagData, TagSignature, WriteOptions,
};

fn srgb_profile() -> IccProfile {
    let mut p = IccProfile::new(ProfileClass::Display, ColorSpace::Rgb, ColorSpace::Xyz);
    let columns = [
        TagSignature::RED_COLORANT,
        TagSignature::GREEN_COLORANT,
        TagSignature::BLUE_COLORANT,
    ];
    for (i, sig) in columns.into_iter().enumerate() {
        let m = SRGB_TO_XYZ_D50.to_row_major();
        let xyz = Xyz::new(m[i], m[3 + i], m[6 + i]);
        p.attach_tag(sig, TagData::Xyz(XyzTagData::new(xyz)));
    }
    let trc = p.attach_tag(
        TagSignature::RED_TRC,
        TagData::Curve(CurveData::gamma(2.2)),
    );
    p.attach_shared(TagSignature::GREEN_TRC, trc.clone());
    p.attach_shared(TagSignature::BLUE_TRC, trc);
    p
}

fn lut_profile(grid: usize) -> IccProfile {
    let step = |i: usize| i as f64 / (grid - 1) as f64;
    let mut measurements = Vec::with_capacity(grid * grid * grid);
    for r in 0..grid {
        for g in 0..grid {
            for b in 0..grid {
                let rgb = [step(r), step(g), step(b)].map(|v| v.powf(2.2));
                measurements.push(Xyz::from_array(SRGB_TO_XYZ_D50.multiply_vec(rgb)));
            }
        }
    }
    // ClutInputProfileBuilder only fails on malformed input
    ClutInputProfileBuilder::new(grid, measurements)
        .with_description("bench")
        .build()
        .unwrap()
}

fn generate_rgb8_data(count: usize) -> Vec<u8> {
    (0..count * 3).map(|i| ((i * 37) % 256) as u8).collect()
}

// ============================================================================
// Codec
// ============================================================================

fn bench_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec");
    let mut profile = lut_profile(17);
    let bytes = profile.to_bytes(&WriteOptions::default()).unwrap();
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("read", |b| {
        b.iter(|| IccProfile::from_bytes(black_box(&bytes)).unwrap())
    });
    group.bench_function("write", |b| {
        b.iter(|| profile.to_bytes(black_box(&WriteOptions::default())).unwrap())
    });
    group.bench_function("fingerprint", |b| {
        b.iter(|| black_box(&profile).compute_fingerprint().unwrap())
    });
    group.bench_function("validate", |b| b.iter(|| black_box(&profile).validate()));

    group.finish();
}

// ============================================================================
// CLUT interpolation
// ============================================================================

fn bench_clut(c: &mut Criterion) {
    let mut group = c.benchmark_group("clut");

    for grid in [9usize, 17, 33] {
        let mut clut = Clut::new(&[grid, grid, grid], 3, ClutPrecision::U16).unwrap();
        clut.iterate(|coord, values| {
            for (v, &c) in values.iter_mut().zip(coord) {
                *v = c as f64 / (grid - 1) as f64;
            }
        });
        let input = [0.31, 0.62, 0.93];
        let mut out = [0.0; 3];

        for interp in [Interpolation::Trilinear, Interpolation::Tetrahedral] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", interp), grid),
                &grid,
                |b, _| b.iter(|| clut.interpolate(&mut out, black_box(&input), interp)),
            );
        }
    }

    let clut4 = Clut::new(&[9, 9, 9, 9], 3, ClutPrecision::U16).unwrap();
    let mut out = [0.0; 3];
    group.bench_function("4d_multilinear", |b| {
        b.iter(|| {
            clut4.interpolate(
                &mut out,
                black_box(&[0.1, 0.4, 0.7, 0.2]),
                Interpolation::Tetrahedral,
            )
        })
    });

    group.finish();
}

// ============================================================================
// CMM
// ============================================================================

fn bench_cmm_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("cmm_batch");
    let srgb = srgb_profile();
    let lut = lut_profile(17);

    let matrix = Cmm::from_profiles(&[&srgb, &srgb], &[], &CmmConfig::default()).unwrap();
    let mixed = Cmm::from_profiles(
        &[&lut, &srgb],
        &[RenderingIntent::RelativeColorimetric],
        &CmmConfig::default(),
    )
    .unwrap();

    for size in [1000usize, 10000, 100000] {
        let src = generate_rgb8_data(size);
        let mut dst = vec![0u8; src.len()];
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("matrix_u8", size), &size, |b, _| {
            b.iter(|| pipeline::transform_u8(&matrix, black_box(&src), &mut dst).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("lut_to_matrix_u8", size), &size, |b, _| {
            b.iter(|| pipeline::transform_u8(&mixed, black_box(&src), &mut dst).unwrap())
        });
    }

    group.finish();
}

fn bench_cmm_single(c: &mut Criterion) {
    let srgb = srgb_profile();
    let cmm = Cmm::from_profiles(&[&srgb, &srgb], &[], &CmmConfig::default()).unwrap();
    let mut out = [0.0; 3];
    c.bench_function("cmm_apply_single", |b| {
        b.iter(|| cmm.apply(&mut out, black_box(&[0.5, 0.3, 0.7])))
    });
}

criterion_group!(benches, bench_codec, bench_clut, bench_cmm_batch, bench_cmm_single);
criterion_main!(benches);
