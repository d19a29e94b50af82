use std::collections::HashMap;

use indicatif::ProgressBar;

use medley::data::{RatingMatrix, RatingScale};
use medley::eval;
use medley::factor::{FactorConfig, FactorModel};
use medley::hyperparameter::hyperparamgrid::HyperParamGrid;
use medley::io;

const QTY_RANDOM_COMBINATIONS: usize = 60;
const VALIDATION_FRACTION: f64 = 0.2;
const SPLIT_SEED: u64 = 17;

fn main() -> anyhow::Result<()> {
    let ratings_path = std::env::args()
        .nth(1)
        .expect("Ratings data file not specified!");
    println!("ratings_data_file:{}", ratings_path);

    let ratings = io::read_ratings(&ratings_path)?;
    let (train, validation) = eval::split(&ratings, VALIDATION_FRACTION, SPLIT_SEED)?;
    let matrix = RatingMatrix::from_ratings(&train)?;

    let mut param_grid = HashMap::new();
    param_grid.insert("factor_count".to_string(), vec![8.0, 16.0, 32.0, 64.0]);
    param_grid.insert("learning_rate".to_string(), vec![0.002, 0.005, 0.01]);
    param_grid.insert("regularization".to_string(), vec![0.01, 0.02, 0.05, 0.1]);
    param_grid.insert("epochs".to_string(), vec![10.0, 20.0, 40.0]);
    let hyper_parametergrid = HyperParamGrid { param_grid };

    let chosen_hyperparameters =
        hyper_parametergrid.get_n_random_combinations(QTY_RANDOM_COMBINATIONS);

    let mut best_score = f64::MAX;
    let mut best_params = HashMap::new();
    // Progress bar - random search
    let progress = ProgressBar::new(chosen_hyperparameters.len() as u64);
    for hyperparams in chosen_hyperparameters {
        progress.inc(1);
        let factor_config = FactorConfig {
            factor_count: hyperparams["factor_count"] as usize,
            learning_rate: hyperparams["learning_rate"],
            regularization: hyperparams["regularization"],
            epochs: hyperparams["epochs"] as usize,
            random_seed: 42,
            scale: RatingScale::default(),
        };

        let model = FactorModel::fit(factor_config, &matrix)?;
        let predictions = eval::predict_all(&model, &validation)?;
        let score = eval::rmse(&predictions, &validation)?;
        if score < best_score {
            best_score = score;
            best_params = hyperparams;
        }
    }
    progress.finish();

    println!("best validation rmse: {:.4}", best_score);
    println!("best hyperparameters: {:?}", best_params);
    Ok(())
}
