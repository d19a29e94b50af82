use medley::config::AppConfig;
use medley::data::{Catalog, Rating, RatingMatrix};
use medley::eval;
use medley::eval::{Prediction, RatingPredictor};
use medley::factor::FactorModel;
use medley::io;
use medley::knn::{NeighborhoodModel, NeighborhoodVariant};
use medley::stopwatch::Stopwatch;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(config_path);

    let items = io::read_catalog(&config.data.items_path)?;
    let ratings = io::read_ratings(&config.data.ratings_path)?;

    let catalog = Catalog::new(items)?;
    let (train, test) = eval::split(&ratings, config.eval.test_fraction, config.eval.split_seed)?;
    let matrix = RatingMatrix::from_ratings(&train)?;

    // Neighborhood prediction needs both ids inside the training universe.
    let (kept, skipped): (Vec<Rating>, Vec<Rating>) = test
        .into_iter()
        .partition(|rating| matrix.knows_user(rating.user_id) && catalog.contains(rating.item_id));
    println!("train ratings:{}", train.len());
    println!(
        "test ratings:{} ({} skipped, unseen in training)",
        kept.len(),
        skipped.len()
    );

    let user_knn = NeighborhoodModel::fit(config.neighborhood_config(), &catalog, &matrix)?;
    let mut item_config = config.neighborhood_config();
    item_config.variant = NeighborhoodVariant::ItemBased;
    let item_knn = NeighborhoodModel::fit(item_config, &catalog, &matrix)?;

    let factor_config = config.factor_config();
    let epochs = factor_config.epochs;
    let mut factor_model = FactorModel::new(factor_config, &matrix)?;
    for epoch in 0..epochs {
        let train_rmse = factor_model.train_epoch(&matrix);
        println!("epoch {:>3}  train rmse {:.4}", epoch + 1, train_rmse);
    }

    println!("===============================================================");
    println!("===               START EVALUATING TEST SET                ====");
    println!("===============================================================");
    let models: Vec<&dyn RatingPredictor> = vec![&user_knn, &item_knn, &factor_model];
    for model in models {
        let mut stopwatch = Stopwatch::new();
        let mut predictions = Vec::with_capacity(kept.len());
        for rating in &kept {
            stopwatch.start();
            let estimated_rating = model.predict(rating.user_id, rating.item_id)?;
            stopwatch.stop();
            predictions.push(Prediction {
                user_id: rating.user_id,
                item_id: rating.item_id,
                estimated_rating,
            });
        }
        println!("{}", model.get_name());
        println!("  rmse: {:.4}", eval::rmse(&predictions, &kept)?);
        println!("  mae:  {:.4}", eval::mae(&predictions, &kept)?);
        println!("  prediction latency");
        println!("  p50 (microseconds): {}", stopwatch.percentile_in_micros(0.5));
        println!("  p90 (microseconds): {}", stopwatch.percentile_in_micros(0.9));
        println!("  p99 (microseconds): {}", stopwatch.percentile_in_micros(0.99));
    }
    Ok(())
}
