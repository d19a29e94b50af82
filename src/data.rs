use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashMap;
use serde_derive::Deserialize;

use crate::error::{RecError, Result};

pub type UserId = u32;
pub type ItemId = u64;

/// A catalog entry. `attributes` is free text describing the item and is the
/// only input to the content-similarity path.
#[derive(Clone, Debug, Deserialize)]
pub struct Item {
    #[serde(rename = "item_id")]
    pub id: ItemId,
    pub title: String,
    pub attributes: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rating {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub value: f64,
}

/// The closed interval all rating values and predictions live in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingScale {
    pub min: f64,
    pub max: f64,
}

impl RatingScale {
    pub fn new(min: f64, max: f64) -> Result<RatingScale> {
        if min >= max {
            return Err(RecError::InvalidConfiguration(format!(
                "rating scale min {} must be below max {}",
                min, max
            )));
        }
        Ok(RatingScale { min, max })
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }
}

impl Default for RatingScale {
    fn default() -> Self {
        RatingScale { min: 1.0, max: 5.0 }
    }
}

/// Immutable item catalog keyed by unique item id, stored in ascending id
/// order for deterministic iteration.
pub struct Catalog {
    items: Vec<Item>,
    id_to_pos: HashMap<ItemId, usize>,
}

impl Catalog {
    pub fn new(mut items: Vec<Item>) -> Result<Catalog> {
        if items.is_empty() {
            return Err(RecError::EmptyInput("item catalog"));
        }
        items.sort_unstable_by_key(|item| item.id);
        let mut id_to_pos = HashMap::with_capacity(items.len());
        for (pos, item) in items.iter().enumerate() {
            if id_to_pos.insert(item.id, pos).is_some() {
                return Err(RecError::DuplicateItem(item.id));
            }
        }
        Ok(Catalog { items, id_to_pos })
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, item_id: ItemId) -> bool {
        self.id_to_pos.contains_key(&item_id)
    }

    pub fn get(&self, item_id: ItemId) -> Option<&Item> {
        self.id_to_pos.get(&item_id).map(|pos| &self.items[*pos])
    }

    /// All items in ascending id order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }
}

/// Read-only training view over a rating set: per-user and per-item rating
/// vectors sorted by id, a canonical sorted triple list and the global mean.
/// Rejects duplicate (user, item) pairs.
#[derive(Clone)]
pub struct RatingMatrix {
    ratings: Vec<Rating>,
    by_user: HashMap<UserId, Vec<(ItemId, f64)>>,
    by_item: HashMap<ItemId, Vec<(UserId, f64)>>,
    global_mean: f64,
}

impl RatingMatrix {
    pub fn from_ratings(ratings: &[Rating]) -> Result<RatingMatrix> {
        if ratings.is_empty() {
            return Err(RecError::EmptyInput("rating set"));
        }
        let mut sorted: Vec<Rating> = ratings.to_vec();
        sorted.sort_unstable_by(|a, b| {
            (a.user_id, a.item_id).cmp(&(b.user_id, b.item_id))
        });
        for pair in sorted.windows(2) {
            if pair[0].user_id == pair[1].user_id && pair[0].item_id == pair[1].item_id {
                return Err(RecError::DuplicateRating {
                    user_id: pair[0].user_id,
                    item_id: pair[0].item_id,
                });
            }
        }

        let mut by_user: HashMap<UserId, Vec<(ItemId, f64)>> = HashMap::new();
        let mut by_item: HashMap<ItemId, Vec<(UserId, f64)>> = HashMap::new();
        let mut value_sum = 0.0;
        for rating in &sorted {
            by_user
                .entry(rating.user_id)
                .or_insert_with(Vec::new)
                .push((rating.item_id, rating.value));
            by_item
                .entry(rating.item_id)
                .or_insert_with(Vec::new)
                .push((rating.user_id, rating.value));
            value_sum += rating.value;
        }
        for item_ratings in by_user.values_mut() {
            item_ratings.sort_unstable_by_key(|(item_id, _)| *item_id);
        }
        for user_ratings in by_item.values_mut() {
            user_ratings.sort_unstable_by_key(|(user_id, _)| *user_id);
        }
        let global_mean = value_sum / sorted.len() as f64;

        Ok(RatingMatrix {
            ratings: sorted,
            by_user,
            by_item,
            global_mean,
        })
    }

    pub fn len(&self) -> usize {
        self.ratings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ratings.is_empty()
    }

    /// Canonical triple list, sorted by (user, item).
    pub fn ratings(&self) -> &[Rating] {
        &self.ratings
    }

    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn knows_user(&self, user_id: UserId) -> bool {
        self.by_user.contains_key(&user_id)
    }

    pub fn knows_item(&self, item_id: ItemId) -> bool {
        self.by_item.contains_key(&item_id)
    }

    /// Ratings of one user, sorted by item id.
    pub fn user_ratings(&self, user_id: UserId) -> Option<&[(ItemId, f64)]> {
        self.by_user.get(&user_id).map(Vec::as_slice)
    }

    /// Ratings of one item, sorted by user id.
    pub fn item_ratings(&self, item_id: ItemId) -> Option<&[(UserId, f64)]> {
        self.by_item.get(&item_id).map(Vec::as_slice)
    }

    pub fn user_has_rated(&self, user_id: UserId, item_id: ItemId) -> bool {
        match self.by_user.get(&user_id) {
            Some(rated) => rated
                .binary_search_by_key(&item_id, |(id, _)| *id)
                .is_ok(),
            None => false,
        }
    }

    pub fn user_ids(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.by_user.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn item_ids(&self) -> Vec<ItemId> {
        let mut ids: Vec<ItemId> = self.by_item.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// An item with a ranking score. The ordering is reversed on score so a
/// `BinaryHeap` keeps the lowest-scored entry on top while retaining the top
/// `k`, and `into_sorted_vec` yields descending scores. Ties resolve by
/// ascending item id for determinism.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoredItem {
    pub id: ItemId,
    pub score: f64,
}

impl ScoredItem {
    pub fn new(id: ItemId, score: f64) -> Self {
        ScoredItem { id, score }
    }
}

impl Eq for ScoredItem {}

impl Ord for ScoredItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse order by score, ties by ascending item id
        match other.score.partial_cmp(&self.score) {
            Some(Ordering::Equal) | None => self.id.cmp(&other.id),
            Some(ordering) => ordering,
        }
    }
}

impl PartialOrd for ScoredItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Retains the `how_many` best-scored items, descending by score with ties by
/// ascending item id.
pub fn take_top<I>(scored: I, how_many: usize) -> Vec<ScoredItem>
where
    I: IntoIterator<Item = ScoredItem>,
{
    if how_many == 0 {
        return Vec::new();
    }
    let mut top_items: BinaryHeap<ScoredItem> = BinaryHeap::with_capacity(how_many);
    for candidate in scored {
        if top_items.len() < how_many {
            top_items.push(candidate);
        } else {
            let mut bottom = top_items.peek_mut().unwrap();
            if candidate.cmp(&*bottom) == Ordering::Less {
                *bottom = candidate;
            }
        }
    }
    top_items.into_sorted_vec()
}

#[cfg(test)]
mod data_test {
    use float_cmp::approx_eq;

    use super::*;

    fn item(id: ItemId) -> Item {
        Item {
            id,
            title: format!("Item {}", id),
            attributes: String::new(),
        }
    }

    #[test]
    fn should_reject_duplicate_item_ids() {
        let result = Catalog::new(vec![item(1), item(2), item(1)]);
        assert_eq!(Err(RecError::DuplicateItem(1)), result.map(|_| ()));
    }

    #[test]
    fn should_reject_empty_catalog() {
        let result = Catalog::new(Vec::new());
        assert_eq!(Err(RecError::EmptyInput("item catalog")), result.map(|_| ()));
    }

    #[test]
    fn should_order_catalog_by_ascending_id() {
        let catalog = Catalog::new(vec![item(3), item(1), item(2)]).unwrap();
        let ids: Vec<ItemId> = catalog.items().iter().map(|item| item.id).collect();
        assert_eq!(vec![1, 2, 3], ids);
        assert!(catalog.contains(2));
        assert!(!catalog.contains(4));
    }

    #[test]
    fn should_reject_duplicate_ratings() {
        let ratings = vec![
            Rating { user_id: 1, item_id: 10, value: 4.0 },
            Rating { user_id: 1, item_id: 10, value: 2.0 },
        ];
        let result = RatingMatrix::from_ratings(&ratings);
        assert_eq!(
            Err(RecError::DuplicateRating { user_id: 1, item_id: 10 }),
            result.map(|_| ())
        );
    }

    #[test]
    fn should_compute_global_mean() {
        let ratings = vec![
            Rating { user_id: 1, item_id: 1, value: 5.0 },
            Rating { user_id: 1, item_id: 2, value: 3.0 },
            Rating { user_id: 2, item_id: 1, value: 4.0 },
            Rating { user_id: 2, item_id: 2, value: 5.0 },
        ];
        let matrix = RatingMatrix::from_ratings(&ratings).unwrap();
        assert!(approx_eq!(f64, 4.25, matrix.global_mean(), epsilon = 1e-12));
        assert!(matrix.user_has_rated(1, 2));
        assert!(!matrix.user_has_rated(1, 3));
        assert_eq!(vec![1, 2], matrix.user_ids());
        assert_eq!(vec![1, 2], matrix.item_ids());
    }

    #[test]
    fn should_reject_inverted_rating_scale() {
        assert!(RatingScale::new(5.0, 1.0).is_err());
        let scale = RatingScale::default();
        assert_eq!(5.0, scale.clamp(7.2));
        assert_eq!(1.0, scale.clamp(-3.0));
        assert_eq!(3.3, scale.clamp(3.3));
    }

    #[test]
    fn should_keep_top_scores_in_descending_order() {
        let scored = vec![
            ScoredItem::new(543, 1.0),
            ScoredItem::new(123, 5000.0),
            ScoredItem::new(234, 100.0),
        ];
        let top = take_top(scored, 2);
        let ids: Vec<ItemId> = top.iter().map(|scored| scored.id).collect();
        assert_eq!(vec![123, 234], ids);
    }

    #[test]
    fn should_break_score_ties_by_ascending_id() {
        let scored = vec![
            ScoredItem::new(9, 1.0),
            ScoredItem::new(3, 1.0),
            ScoredItem::new(7, 1.0),
        ];
        let top = take_top(scored, 3);
        let ids: Vec<ItemId> = top.iter().map(|scored| scored.id).collect();
        assert_eq!(vec![3, 7, 9], ids);
    }

    #[test]
    fn should_return_nothing_for_zero_requested() {
        let scored = vec![ScoredItem::new(1, 1.0)];
        assert!(take_top(scored, 0).is_empty());
    }
}
