use hashbrown::HashMap;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::data::{ItemId, RatingMatrix, RatingScale, UserId};
use crate::error::{RecError, Result};
use crate::eval::RatingPredictor;

const DEFAULT_FACTOR_COUNT: usize = 20;
const DEFAULT_LEARNING_RATE: f64 = 0.005;
const DEFAULT_REGULARIZATION: f64 = 0.02;
const DEFAULT_EPOCHS: usize = 20;
const DEFAULT_RANDOM_SEED: u64 = 42;
const INIT_SPREAD: f64 = 0.1;

#[derive(Clone, Debug)]
pub struct FactorConfig {
    pub factor_count: usize,
    pub learning_rate: f64,
    pub regularization: f64,
    pub epochs: usize,
    pub random_seed: u64,
    pub scale: RatingScale,
}

impl Default for FactorConfig {
    fn default() -> Self {
        FactorConfig {
            factor_count: DEFAULT_FACTOR_COUNT,
            learning_rate: DEFAULT_LEARNING_RATE,
            regularization: DEFAULT_REGULARIZATION,
            epochs: DEFAULT_EPOCHS,
            random_seed: DEFAULT_RANDOM_SEED,
            scale: RatingScale::default(),
        }
    }
}

impl FactorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.factor_count == 0 {
            return Err(RecError::InvalidConfiguration(
                "factor_count must be positive".to_string(),
            ));
        }
        if self.epochs == 0 {
            return Err(RecError::InvalidConfiguration(
                "epochs must be positive".to_string(),
            ));
        }
        if self.learning_rate <= 0.0 {
            return Err(RecError::InvalidConfiguration(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.regularization < 0.0 {
            return Err(RecError::InvalidConfiguration(format!(
                "regularization must not be negative, got {}",
                self.regularization
            )));
        }
        Ok(())
    }
}

/// Biased matrix factorization trained by SGD:
/// `r̂(u,i) = μ + b_u + b_i + dot(P[u], Q[i])`, clamped to the rating scale.
/// Training is deterministic for a fixed seed: parameter initialization and
/// the per-epoch iteration order both come from one seeded `Pcg64`.
pub struct FactorModel {
    config: FactorConfig,
    global_mean: f64,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<ItemId, usize>,
    user_bias: Vec<f64>,
    item_bias: Vec<f64>,
    user_factors: Vec<Vec<f64>>,
    item_factors: Vec<Vec<f64>>,
    epoch_rng: Pcg64,
}

impl FactorModel {
    /// Initializes an untrained model over the training universe. Factors are
    /// drawn from the seeded RNG in ascending user/item id order, biases
    /// start at zero.
    pub fn new(config: FactorConfig, matrix: &RatingMatrix) -> Result<FactorModel> {
        config.validate()?;
        if matrix.is_empty() {
            return Err(RecError::EmptyInput("rating set"));
        }
        let mut rng = Pcg64::seed_from_u64(config.random_seed);
        let user_ids = matrix.user_ids();
        let item_ids = matrix.item_ids();
        let user_factors = (0..user_ids.len())
            .map(|_| random_factors(&mut rng, config.factor_count))
            .collect();
        let item_factors = (0..item_ids.len())
            .map(|_| random_factors(&mut rng, config.factor_count))
            .collect();
        Ok(FactorModel {
            global_mean: matrix.global_mean(),
            user_bias: vec![0.0; user_ids.len()],
            item_bias: vec![0.0; item_ids.len()],
            user_index: user_ids
                .iter()
                .enumerate()
                .map(|(pos, id)| (*id, pos))
                .collect(),
            item_index: item_ids
                .iter()
                .enumerate()
                .map(|(pos, id)| (*id, pos))
                .collect(),
            user_factors,
            item_factors,
            epoch_rng: rng,
            config,
        })
    }

    pub fn fit(config: FactorConfig, matrix: &RatingMatrix) -> Result<FactorModel> {
        let mut model = FactorModel::new(config, matrix)?;
        for _ in 0..model.config.epochs {
            model.train_epoch(matrix);
        }
        Ok(model)
    }

    /// One SGD pass over all training ratings in a freshly shuffled order.
    /// Returns the train RMSE of this pass. Epoch boundaries are safe
    /// interruption points: the model is usable after any number of passes.
    pub fn train_epoch(&mut self, matrix: &RatingMatrix) -> f64 {
        let ratings = matrix.ratings();
        let mut order: Vec<usize> = (0..ratings.len()).collect();
        order.shuffle(&mut self.epoch_rng);

        let learning_rate = self.config.learning_rate;
        let regularization = self.config.regularization;
        let mut squared_error_sum = 0.0;
        for pos in order {
            let rating = ratings[pos];
            let u = self.user_index[&rating.user_id];
            let i = self.item_index[&rating.item_id];
            // the gradient uses the unclamped estimate
            let error = rating.value - self.raw_predict(u, i);
            squared_error_sum += error * error;

            let user_bias = self.user_bias[u];
            self.user_bias[u] += learning_rate * (error - regularization * user_bias);
            let item_bias = self.item_bias[i];
            self.item_bias[i] += learning_rate * (error - regularization * item_bias);
            for f in 0..self.config.factor_count {
                let p = self.user_factors[u][f];
                let q = self.item_factors[i][f];
                self.user_factors[u][f] += learning_rate * (error * q - regularization * p);
                self.item_factors[i][f] += learning_rate * (error * p - regularization * q);
            }
        }
        (squared_error_sum / ratings.len() as f64).sqrt()
    }

    /// Estimated rating, clamped to the configured scale. Total over all ids:
    /// unknown users or items fall back to the global mean plus whichever
    /// bias is known.
    pub fn predict(&self, user_id: UserId, item_id: ItemId) -> f64 {
        let estimate = match (
            self.user_index.get(&user_id),
            self.item_index.get(&item_id),
        ) {
            (Some(&u), Some(&i)) => self.raw_predict(u, i),
            (Some(&u), None) => self.global_mean + self.user_bias[u],
            (None, Some(&i)) => self.global_mean + self.item_bias[i],
            (None, None) => self.global_mean,
        };
        self.config.scale.clamp(estimate)
    }

    fn raw_predict(&self, u: usize, i: usize) -> f64 {
        let dot: f64 = self.user_factors[u]
            .iter()
            .zip(self.item_factors[i].iter())
            .map(|(p, q)| p * q)
            .sum();
        self.global_mean + self.user_bias[u] + self.item_bias[i] + dot
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn config(&self) -> &FactorConfig {
        &self.config
    }
}

impl RatingPredictor for FactorModel {
    fn predict(&self, user_id: UserId, item_id: ItemId) -> Result<f64> {
        Ok(FactorModel::predict(self, user_id, item_id))
    }

    fn get_name(&self) -> String {
        format!("mf(k={})", self.config.factor_count)
    }
}

fn random_factors(rng: &mut Pcg64, factor_count: usize) -> Vec<f64> {
    (0..factor_count)
        .map(|_| (rng.gen::<f64>() - 0.5) * INIT_SPREAD)
        .collect()
}
