use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kryda::config::KspOptions;
use kryda::context::KspContext;
use kryda::core::MatVec;
use kryda::da::{Da, DaLaplacian};
use kryda::parallel::SerialComm;
use kryda::solver::MethodKind;

fn bench_laplacian_solves(c: &mut Criterion) {
    let da = Da::new(SerialComm::new(), 64, 64, 1, 1, 1, 1).unwrap();
    let op = DaLaplacian::new(&da).unwrap();
    let ones = vec![1.0; da.local_size()];
    let mut b = vec![0.0; da.local_size()];
    op.matvec(&ones, &mut b);
    let opts = KspOptions { rtol: 1e-8, ..Default::default() };

    c.bench_function("cg 64x64 laplacian", |ben| {
        let da = Da::new(SerialComm::new(), 64, 64, 1, 1, 1, 1).unwrap();
        let op = DaLaplacian::new(&da).unwrap();
        let mut ksp = KspContext::new(MethodKind::Cg, op, &opts);
        let mut x = vec![0.0; b.len()];
        ben.iter(|| {
            x.iter_mut().for_each(|v| *v = 0.0);
            let _reason = ksp.solve(black_box(&b), black_box(&mut x)).unwrap();
        })
    });

    c.bench_function("bicgstab 64x64 laplacian", |ben| {
        let da = Da::new(SerialComm::new(), 64, 64, 1, 1, 1, 1).unwrap();
        let op = DaLaplacian::new(&da).unwrap();
        let mut ksp = KspContext::new(MethodKind::Bicgstab, op, &opts);
        let mut x = vec![0.0; b.len()];
        ben.iter(|| {
            x.iter_mut().for_each(|v| *v = 0.0);
            let _reason = ksp.solve(black_box(&b), black_box(&mut x)).unwrap();
        })
    });
}

fn bench_ghost_exchange(c: &mut Criterion) {
    use kryda::da::InsertMode;
    let da = Da::new(SerialComm::new(), 256, 256, 1, 2, 1, 1).unwrap();
    let g: Vec<f64> = (0..da.local_size()).map(|k| k as f64).collect();
    let mut l = da.create_local_vector();
    c.bench_function("ghost exchange 256x256", |ben| {
        ben.iter(|| {
            da.global_to_local(InsertMode::Insert, black_box(&g), black_box(&mut l))
                .unwrap();
        })
    });
}

criterion_group!(benches, bench_laplacian_solves, bench_ghost_exchange);
criterion_main!(benches);
