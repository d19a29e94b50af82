use anyhow::Context;
use indicatif::ProgressBar;

use medley::config::AppConfig;
use medley::content::{SimilarityIndex, TextVectorizer};
use medley::data::{Catalog, ItemId, RatingMatrix, UserId};
use medley::factor::FactorModel;
use medley::hybrid::HybridRanker;
use medley::io;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).unwrap_or_default();
    let config = AppConfig::new(config_path);

    let user_id: UserId = std::env::args()
        .nth(2)
        .context("User id not specified!")?
        .parse()?;
    let seed_item_id: ItemId = std::env::args()
        .nth(3)
        .context("Seed item id not specified!")?
        .parse()?;

    let items = io::read_catalog(&config.data.items_path)?;
    let ratings = io::read_ratings(&config.data.ratings_path)?;
    println!("catalog items:{}", items.len());
    println!("ratings:{}", ratings.len());

    let catalog = Catalog::new(items)?;
    let matrix = RatingMatrix::from_ratings(&ratings)?;

    let vectorizer = if config.model.use_stop_words {
        TextVectorizer::new()
    } else {
        TextVectorizer::without_stop_words()
    };
    let index = SimilarityIndex::build(&catalog, &vectorizer)?;

    let factor_config = config.factor_config();
    let epochs = factor_config.epochs;
    let mut model = FactorModel::new(factor_config, &matrix)?;
    // Progress bar - training epochs
    let progress = ProgressBar::new(epochs as u64);
    for _ in 0..epochs {
        model.train_epoch(&matrix);
        progress.inc(1);
    }
    progress.finish();

    let ranker = HybridRanker::new(&index, &model, &matrix, &catalog);
    let recommendations =
        ranker.recommend(user_id, seed_item_id, config.reco.num_items_to_recommend)?;

    println!(
        "recommendations for user {} seeded by item {}:",
        user_id, seed_item_id
    );
    for recommendation in recommendations {
        println!(
            "{:>12}  {:<40}  {:.3}",
            recommendation.item_id, recommendation.title, recommendation.score
        );
    }
    Ok(())
}
