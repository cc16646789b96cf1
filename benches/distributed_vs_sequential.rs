use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use faer::Mat;
use scatmv::context::distributed_matvec;
use scatmv::matrix::{FillPattern, Problem};
use scatmv::parallel::{Comm, RowAssignment, ThreadUniverse};
use scatmv::utils::sequential_matvec;

fn bench_distributed_vs_sequential(c: &mut Criterion) {
    let n = 1024;
    let problem = Problem::generate(n, FillPattern::default()).unwrap();

    c.bench_function("sequential matvec", |ben| {
        ben.iter(|| sequential_matvec(black_box(&problem)).unwrap())
    });

    let a = problem.matrix().to_faer();
    let x = Mat::from_fn(n, 1, |i, _| problem.vector()[i]);
    c.bench_function("faer matvec", |ben| ben.iter(|| black_box(&a) * black_box(&x)));

    let mut group = c.benchmark_group("distributed matvec");
    for p in [1, 2, 4, 8] {
        let assignment = RowAssignment::plan(n, p).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(p), &p, |ben, &p| {
            ben.iter(|| {
                ThreadUniverse::launch(p, |comm| {
                    let local = comm.is_coordinator().then_some(&problem);
                    distributed_matvec(comm, local, &assignment, n)
                })
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_distributed_vs_sequential);
criterion_main!(benches);
