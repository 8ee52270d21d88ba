use rand::SeedableRng;
use rand::rngs::StdRng;

use catbreed_mlp::{Checkpoint, Dataset, Error, Mlp, MlpConfig};

fn data() -> Dataset {
    let mut rng = StdRng::seed_from_u64(21);
    Dataset::gaussian_blobs(3, 40, 4, 4.0, 0.4, &mut rng).unwrap()
}

fn config(hidden_size: usize) -> MlpConfig {
    MlpConfig {
        hidden_size,
        learning_rate: 0.05,
        epochs: 15,
        ..MlpConfig::default()
    }
}

#[test]
fn save_then_load_restores_parameters_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");

    let mut trained = Mlp::new_with_seed(&data(), &config(8), 1).unwrap();
    trained.train(16).unwrap();
    trained.save(&path).unwrap();

    let mut loaded = Mlp::new_with_seed(&data(), &config(8), 2).unwrap();
    assert_ne!(loaded.params(), trained.params());
    loaded.load(&path).unwrap();

    assert_eq!(loaded.params().weights_hidden, trained.params().weights_hidden);
    assert_eq!(loaded.params().bias_hidden, trained.params().bias_hidden);
    assert_eq!(loaded.params().weights_output, trained.params().weights_output);
    assert_eq!(loaded.params().bias_output, trained.params().bias_output);
    assert_eq!(loaded.best_accuracy(), trained.best_accuracy());
}

#[test]
fn checkpoint_path_receives_the_best_parameters() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("best.json");
    let cfg = MlpConfig {
        checkpoint_path: Some(path.clone()),
        ..config(8)
    };

    let mut mlp = Mlp::new_with_seed(&data(), &cfg, 3).unwrap();
    mlp.train(16).unwrap();
    assert!(path.exists());

    let mut reloaded = Mlp::new_with_seed(&data(), &config(8), 4).unwrap();
    reloaded.load(&path).unwrap();
    assert_eq!(reloaded.params(), mlp.best_params());
    assert_eq!(reloaded.best_accuracy(), mlp.best_accuracy());
}

#[test]
fn missing_file_is_model_load_and_training_can_proceed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.json");

    let mut mlp = Mlp::new_with_seed(&data(), &config(8), 5).unwrap();
    let before = mlp.params().clone();
    match mlp.load(&path) {
        Err(Error::ModelLoad(_)) => {
            assert_eq!(mlp.params(), &before);
            let report = mlp.train(16).unwrap();
            assert_eq!(report.epochs.len(), mlp.loss_history().len());
        }
        other => panic!("expected ModelLoad, got {other:?}"),
    }
}

#[test]
fn shape_incompatible_checkpoint_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wide.json");

    Mlp::new_with_seed(&data(), &config(16), 6)
        .unwrap()
        .save(&path)
        .unwrap();

    let mut narrow = Mlp::new_with_seed(&data(), &config(8), 6).unwrap();
    let err = narrow.load(&path).unwrap_err();
    assert!(matches!(err, Error::ModelLoad(_)));
    assert_eq!(narrow.hidden_size(), 8);
}

#[test]
fn corrupt_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("corrupt.json");
    std::fs::write(&path, "{\"format_version\": 1, \"input_size\": ").unwrap();

    let mut mlp = Mlp::new_with_seed(&data(), &config(8), 7).unwrap();
    assert!(matches!(mlp.load(&path), Err(Error::ModelLoad(_))));
}

#[test]
fn accuracy_outside_unit_interval_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("inflated.json");

    Mlp::new_with_seed(&data(), &config(8), 8)
        .unwrap()
        .save(&path)
        .unwrap();
    let mut ckpt = Checkpoint::read(&path).unwrap();
    ckpt.best_accuracy = 7.5;
    ckpt.write(&path).unwrap();

    let mut mlp = Mlp::new_with_seed(&data(), &config(8), 9).unwrap();
    let before = mlp.params().clone();
    let best_before = mlp.best_accuracy();
    assert!(matches!(mlp.load(&path), Err(Error::ModelLoad(_))));
    assert_eq!(mlp.params(), &before);
    assert_eq!(mlp.best_accuracy(), best_before);

    let report = mlp.train(16).unwrap();
    assert!(report.epochs.iter().any(|e| e.improved));
}
