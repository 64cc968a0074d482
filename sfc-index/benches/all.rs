use bencher::{benchmark_group, benchmark_main, Bencher};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sfc_index::{Point2, PointData};

benchmark_main!(benches);
benchmark_group!(benches, build, ksearch);

const SEED: u64 = 123456789;

fn build(bench: &mut Bencher) {
    let mut rng = StdRng::seed_from_u64(SEED);
    let points: Vec<(i64, i64)> = (0..20_000)
        .map(|_| (rng.gen_range(-1_000_000..1_000_000), rng.gen_range(-1_000_000..1_000_000)))
        .collect();
    bench.iter(|| {
        let mut pd: PointData<2> = PointData::new();
        for (x, y) in &points {
            pd.add(Point2::new([*x, *y]), vec![]).unwrap();
        }
        pd.lock().unwrap();
    })
}

fn ksearch(bench: &mut Bencher) {
    let mut rng = StdRng::seed_from_u64(SEED);
    let mut pd: PointData<2> = PointData::new();
    for _ in 0..20_000 {
        let x = rng.gen_range(-1_000_000..1_000_000);
        let y = rng.gen_range(-1_000_000..1_000_000);
        pd.add(Point2::new([x, y]), vec![]).unwrap();
    }
    pd.lock().unwrap();

    bench.iter(|| {
        let x = rng.gen_range(-1_000_000..1_000_000);
        let y = rng.gen_range(-1_000_000..1_000_000);
        pd.get_nn(&Point2::new([x, y]), 10, 0.0).unwrap()
    })
}
