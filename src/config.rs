use std::ffi::OsStr;
use std::fs::File;

use justconfig::item::ValueExtractor;
use justconfig::processors::Trim;
use justconfig::sources::env::Env;
use justconfig::sources::text::ConfigText;
use justconfig::ConfPath;
use justconfig::Config;

use crate::data::RatingScale;
use crate::factor::FactorConfig;
use crate::knn::{NeighborhoodConfig, NeighborhoodVariant};

// Set some default values
const DEFAULT_TEST_FRACTION: f64 = 0.2;
const DEFAULT_SPLIT_SEED: u64 = 17;
const DEFAULT_NUM_ITEMS_TO_RECOMMEND: usize = 10;

pub struct AppConfig {
    pub data: DataConfig,
    pub model: ModelConfig,
    pub eval: EvalConfig,
    pub reco: RecoConfig,
}

pub struct DataConfig {
    pub items_path: String,
    pub ratings_path: String,
}

pub struct ModelConfig {
    pub k_neighbors: usize,
    pub user_based: bool,
    pub factor_count: usize,
    pub learning_rate: f64,
    pub regularization: f64,
    pub epochs: usize,
    pub random_seed: u64,
    pub use_stop_words: bool,
}

pub struct EvalConfig {
    pub test_fraction: f64,
    pub split_seed: u64,
}

pub struct RecoConfig {
    pub num_items_to_recommend: usize,
}

impl AppConfig {
    pub fn new(config_path: String) -> AppConfig {
        // Initialize config object
        let mut conf = Config::default();

        // Check if there is a config file
        if let Ok(config_file) = File::open(&config_path) {
            let config_text = ConfigText::new(config_file, &config_path)
                .expect("Loading configuration file failed.");
            conf.add_source(config_text);
        }

        // Define config params from environment variables
        let config_env = Env::new(&[
            (
                ConfPath::from(&["data", "items_path"]),
                OsStr::new("ITEMS_DATA"),
            ),
            (
                ConfPath::from(&["data", "ratings_path"]),
                OsStr::new("RATINGS_DATA"),
            ),
        ]);
        conf.add_source(config_env);

        // Parse into custom config struct
        AppConfig::parse(conf)
    }

    fn parse(conf: justconfig::Config) -> AppConfig {
        AppConfig {
            data: DataConfig::parse(&conf, ConfPath::from(&["data"])),
            model: ModelConfig::parse(&conf, ConfPath::from(&["model"])),
            eval: EvalConfig::parse(&conf, ConfPath::from(&["eval"])),
            reco: RecoConfig::parse(&conf, ConfPath::from(&["reco"])),
        }
    }

    pub fn neighborhood_config(&self) -> NeighborhoodConfig {
        NeighborhoodConfig {
            variant: if self.model.user_based {
                NeighborhoodVariant::UserBased
            } else {
                NeighborhoodVariant::ItemBased
            },
            k_neighbors: self.model.k_neighbors,
            scale: RatingScale::default(),
        }
    }

    pub fn factor_config(&self) -> FactorConfig {
        FactorConfig {
            factor_count: self.model.factor_count,
            learning_rate: self.model.learning_rate,
            regularization: self.model.regularization,
            epochs: self.model.epochs,
            random_seed: self.model.random_seed,
            scale: RatingScale::default(),
        }
    }
}

impl DataConfig {
    fn parse(conf: &Config, path: ConfPath) -> DataConfig {
        DataConfig {
            items_path: conf
                .get(path.push("items_path"))
                .trim()
                .value()
                .unwrap_or_else(|_| String::from("data/items.csv")),
            ratings_path: conf
                .get(path.push("ratings_path"))
                .trim()
                .value()
                .unwrap_or_else(|_| String::from("data/ratings.txt")),
        }
    }
}

impl ModelConfig {
    fn parse(conf: &Config, path: ConfPath) -> ModelConfig {
        let knn_defaults = NeighborhoodConfig::default();
        let factor_defaults = FactorConfig::default();
        ModelConfig {
            k_neighbors: conf
                .get(path.push("k_neighbors"))
                .trim()
                .value()
                .unwrap_or(knn_defaults.k_neighbors),
            user_based: conf
                .get(path.push("user_based"))
                .trim()
                .value()
                .unwrap_or(true),
            factor_count: conf
                .get(path.push("factor_count"))
                .trim()
                .value()
                .unwrap_or(factor_defaults.factor_count),
            learning_rate: conf
                .get(path.push("learning_rate"))
                .trim()
                .value()
                .unwrap_or(factor_defaults.learning_rate),
            regularization: conf
                .get(path.push("regularization"))
                .trim()
                .value()
                .unwrap_or(factor_defaults.regularization),
            epochs: conf
                .get(path.push("epochs"))
                .trim()
                .value()
                .unwrap_or(factor_defaults.epochs),
            random_seed: conf
                .get(path.push("random_seed"))
                .trim()
                .value()
                .unwrap_or(factor_defaults.random_seed),
            use_stop_words: conf
                .get(path.push("use_stop_words"))
                .trim()
                .value()
                .unwrap_or(true),
        }
    }
}

impl EvalConfig {
    fn parse(conf: &Config, path: ConfPath) -> EvalConfig {
        EvalConfig {
            test_fraction: conf
                .get(path.push("test_fraction"))
                .trim()
                .value()
                .unwrap_or(DEFAULT_TEST_FRACTION),
            split_seed: conf
                .get(path.push("split_seed"))
                .trim()
                .value()
                .unwrap_or(DEFAULT_SPLIT_SEED),
        }
    }
}

impl RecoConfig {
    fn parse(conf: &Config, path: ConfPath) -> RecoConfig {
        RecoConfig {
            num_items_to_recommend: conf
                .get(path.push("num_items_to_recommend"))
                .trim()
                .value()
                .unwrap_or(DEFAULT_NUM_ITEMS_TO_RECOMMEND),
        }
    }
}
