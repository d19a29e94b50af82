use thiserror::Error;

use crate::data::{ItemId, UserId};

pub type Result<T> = std::result::Result<T, RecError>;

/// Errors reported by the recommender core. The mean/bias fallback for known
/// but unrated entities is a designed feature and never surfaces here; these
/// variants cover ids outside the training universe and malformed inputs.
#[derive(Debug, Error, PartialEq)]
pub enum RecError {
    #[error("unknown item id {0}")]
    UnknownItem(ItemId),

    #[error("unknown user id {0}")]
    UnknownUser(UserId),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no ground truth rating for prediction (user {user_id}, item {item_id})")]
    MismatchedSets { user_id: UserId, item_id: ItemId },

    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("duplicate rating for (user {user_id}, item {item_id})")]
    DuplicateRating { user_id: UserId, item_id: ItemId },

    #[error("duplicate item id {0} in catalog")]
    DuplicateItem(ItemId),
}
