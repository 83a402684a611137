use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lst_calc::processing::composite::{composite, Composite};
use lst_calc::processing::indices::{Emissivity, LandSurfaceTemperature, NdviRange, VegetationProportion, NDI};
use lst_calc::processing::parallel::IndexCalculator;
use lst_calc::raster::{Band, GeoInfo, Image};

const SIZE: (usize, usize) = (1024, 1024);

fn synthetic_band(name: &str, base: f32, spread: usize) -> Band {
    let data = (0..SIZE.0 * SIZE.1).map(|i| base + (i % spread) as f32 * 0.001).collect();
    Band::new(name, SIZE, data)
}

/// NDVI kernel in isolation
fn benchmark_ndvi_calculation(c: &mut Criterion) {
    let nir = synthetic_band("SR_B5", 0.35, 100);
    let red = synthetic_band("SR_B4", 0.07, 50);
    let ndvi = NDI::ndvi();

    c.bench_function("ndvi_core_calculation", |b| {
        b.iter(|| ndvi.calculate(black_box(&[&nir, &red])))
    });
}

/// PV, emissivity and LST chained over one band
fn benchmark_lst_chain(c: &mut Criterion) {
    let ndvi = synthetic_band("NDVI", 0.1, 400);
    let thermal = synthetic_band("thermal", 300.0, 1000);
    let pv_calc = VegetationProportion::new(NdviRange { min: 0.1, max: 0.5 });
    let lst_calc = LandSurfaceTemperature::new(0, 1, None);

    c.bench_function("lst_chain", |b| {
        b.iter(|| {
            let pv = pv_calc.calculate(black_box(&[&ndvi]));
            let em = Emissivity.calculate(&[&pv]);
            lst_calc.calculate(&[&thermal, &em])
        })
    });
}

/// Median of a summer's worth of partially masked scenes
fn benchmark_median_composite(c: &mut Criterion) {
    let geo = GeoInfo::new("", [0.0, 30.0, 0.0, 0.0, 0.0, -30.0], SIZE.0, SIZE.1);
    let scenes: Vec<Image> = (0..8)
        .map(|s| {
            let data = (0..SIZE.0 * SIZE.1)
                .map(|i| if (i + s) % 7 == 0 { f32::NAN } else { (i % 97 + s) as f32 })
                .collect();
            Image::new(format!("scene_{}", s), None, geo.clone())
                .with_band(Band::new("SR_B5", SIZE, data))
                .unwrap()
        })
        .collect();

    c.bench_function("median_composite_8_scenes", |b| {
        b.iter(|| composite(black_box(&scenes), Composite::Median, "median"))
    });
}

criterion_group!(benches, benchmark_ndvi_calculation, benchmark_lst_chain, benchmark_median_composite);
criterion_main!(benches);
