use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::StdRng;

use catbreed_mlp::{Dataset, Mlp, MlpConfig};

fn survey_like() -> Dataset {
    let mut rng = StdRng::seed_from_u64(0);
    Dataset::gaussian_blobs(13, 200, 24, 3.0, 1.0, &mut rng).unwrap()
}

fn config(epochs: usize) -> MlpConfig {
    MlpConfig {
        hidden_size: 100,
        learning_rate: 1e-3,
        epochs,
        ..MlpConfig::default()
    }
}

fn mlp_forward_bench(c: &mut Criterion) {
    let data = survey_like();
    let mlp = Mlp::new_with_seed(&data, &config(1), 0).unwrap();
    let batch = data.features().slice_rows(0, 64);

    c.bench_function("mlp_forward_64x24_100_13", |b| {
        b.iter(|| black_box(mlp.forward(black_box(&batch))))
    });
}

fn mlp_backward_bench(c: &mut Criterion) {
    let data = survey_like();
    let mut mlp = Mlp::new_with_seed(&data, &config(1), 0).unwrap();
    let (batch, labels) = data.batch(0, 64);

    c.bench_function("mlp_forward_backward_64x24_100_13", |b| {
        b.iter(|| {
            let pass = mlp.forward(black_box(&batch));
            mlp.backward(&batch, labels, pass);
        })
    });
}

fn mlp_epoch_bench(c: &mut Criterion) {
    let data = survey_like();
    let base = Mlp::new_with_seed(&data, &config(1), 0).unwrap();

    c.bench_function("mlp_train_one_epoch_2600_rows", |b| {
        b.iter_batched(
            || base.clone(),
            |mut mlp| black_box(mlp.train(64).unwrap()),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    mlp_forward_bench,
    mlp_backward_bench,
    mlp_epoch_bench
);
criterion_main!(benches);
