use hashbrown::HashMap;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg64;

use crate::data::{ItemId, Rating, UserId};
use crate::error::{RecError, Result};

/// Common surface for models that estimate a rating for a (user, item) pair.
pub trait RatingPredictor {
    fn predict(&self, user_id: UserId, item_id: ItemId) -> Result<f64>;
    fn get_name(&self) -> String;
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Prediction {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub estimated_rating: f64,
}

/// Partitions ratings into disjoint (train, test) sets by a seeded uniform
/// shuffle without replacement. Both sides stay non-empty.
pub fn split(
    ratings: &[Rating],
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<Rating>, Vec<Rating>)> {
    if ratings.is_empty() {
        return Err(RecError::EmptyInput("rating set"));
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(RecError::InvalidConfiguration(format!(
            "test_fraction must be within (0, 1), got {}",
            test_fraction
        )));
    }
    let mut shuffled: Vec<Rating> = ratings.to_vec();
    shuffled.shuffle(&mut Pcg64::seed_from_u64(seed));
    let qty_test = ((ratings.len() as f64 * test_fraction).round() as usize)
        .max(1)
        .min(ratings.len() - 1);
    let test = shuffled[..qty_test].to_vec();
    let train = shuffled[qty_test..].to_vec();
    Ok((train, test))
}

pub fn rmse(predictions: &[Prediction], ground_truth: &[Rating]) -> Result<f64> {
    Ok(mean_error(predictions, ground_truth, |error| error * error)?.sqrt())
}

pub fn mae(predictions: &[Prediction], ground_truth: &[Rating]) -> Result<f64> {
    mean_error(predictions, ground_truth, f64::abs)
}

fn mean_error(
    predictions: &[Prediction],
    ground_truth: &[Rating],
    penalty: fn(f64) -> f64,
) -> Result<f64> {
    if predictions.is_empty() {
        return Err(RecError::EmptyInput("predictions"));
    }
    let truth: HashMap<(UserId, ItemId), f64> = ground_truth
        .iter()
        .map(|rating| ((rating.user_id, rating.item_id), rating.value))
        .collect();
    let mut penalty_sum = 0.0;
    for prediction in predictions {
        let actual = truth
            .get(&(prediction.user_id, prediction.item_id))
            .ok_or(RecError::MismatchedSets {
                user_id: prediction.user_id,
                item_id: prediction.item_id,
            })?;
        penalty_sum += penalty(prediction.estimated_rating - actual);
    }
    Ok(penalty_sum / predictions.len() as f64)
}

/// One prediction per ground-truth pair, for feeding `rmse`/`mae`.
pub fn predict_all(
    model: &dyn RatingPredictor,
    ratings: &[Rating],
) -> Result<Vec<Prediction>> {
    ratings
        .iter()
        .map(|rating| {
            let estimated_rating = model.predict(rating.user_id, rating.item_id)?;
            Ok(Prediction {
                user_id: rating.user_id,
                item_id: rating.item_id,
                estimated_rating,
            })
        })
        .collect()
}
