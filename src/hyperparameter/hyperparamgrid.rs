use std::collections::HashMap;

use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Named hyperparameter choices for random search. Values are kept as `f64`
/// and cast by the caller where a parameter is integral.
pub struct HyperParamGrid {
    pub param_grid: HashMap<String, Vec<f64>>,
}

impl HyperParamGrid {
    /// Returns `n` unique random combinations out of all hyperparameter
    /// combinations, or all of them when fewer exist.
    pub fn get_n_random_combinations(&self, n: usize) -> Vec<HashMap<String, f64>> {
        let mut all_combinations = self.get_all_combinations();
        all_combinations.shuffle(&mut thread_rng());
        all_combinations.into_iter().take(n).collect()
    }

    /// Cartesian product over all parameter choice lists.
    pub fn get_all_combinations(&self) -> Vec<HashMap<String, f64>> {
        let (names, choices): (Vec<&String>, Vec<&Vec<f64>>) = self.param_grid.iter().unzip();
        choices
            .iter()
            .map(|values| values.iter().copied())
            .multi_cartesian_product()
            .map(|combination| {
                names
                    .iter()
                    .map(|name| (*name).clone())
                    .zip(combination)
                    .collect()
            })
            .collect()
    }
}
