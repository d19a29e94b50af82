//! Medley: a hybrid recommender that merges item-content similarity with
//! collaborative filtering (neighborhood KNN and biased matrix factorization).

pub mod config;
pub mod content;
pub mod data;
pub mod error;
pub mod eval;
pub mod factor;
pub mod hybrid;
pub mod hyperparameter;
pub mod io;
pub mod knn;
pub mod stopwatch;
