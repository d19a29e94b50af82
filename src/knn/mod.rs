use std::cmp::Ordering;

use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;

use crate::data::{Catalog, ItemId, RatingMatrix, RatingScale, UserId};
use crate::error::{RecError, Result};
use crate::eval::RatingPredictor;

const DEFAULT_K_NEIGHBORS: usize = 40;

/// Selects which axis of the rating matrix the neighborhood is computed over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NeighborhoodVariant {
    UserBased,
    ItemBased,
}

#[derive(Clone, Debug)]
pub struct NeighborhoodConfig {
    pub variant: NeighborhoodVariant,
    pub k_neighbors: usize,
    pub scale: RatingScale,
}

impl Default for NeighborhoodConfig {
    fn default() -> Self {
        NeighborhoodConfig {
            variant: NeighborhoodVariant::UserBased,
            k_neighbors: DEFAULT_K_NEIGHBORS,
            scale: RatingScale::default(),
        }
    }
}

impl NeighborhoodConfig {
    pub fn validate(&self) -> Result<()> {
        if self.k_neighbors == 0 {
            return Err(RecError::InvalidConfiguration(
                "k_neighbors must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Peer similarity lists precomputed at fit time, sorted descending by
/// similarity with ties by ascending id. Only positive similarities are kept.
enum PeerSimilarities {
    Users(HashMap<UserId, Vec<(UserId, f64)>>),
    Items(HashMap<ItemId, Vec<(ItemId, f64)>>),
}

/// KNN collaborative filter. `fit` is a pure precomputation over the training
/// ratings; the model is immutable afterwards and safe for concurrent reads.
pub struct NeighborhoodModel {
    config: NeighborhoodConfig,
    matrix: RatingMatrix,
    known_items: HashSet<ItemId>,
    peers: PeerSimilarities,
}

impl NeighborhoodModel {
    pub fn fit(
        config: NeighborhoodConfig,
        catalog: &Catalog,
        matrix: &RatingMatrix,
    ) -> Result<NeighborhoodModel> {
        config.validate()?;
        let peers = match config.variant {
            NeighborhoodVariant::UserBased => {
                let user_ids = matrix.user_ids();
                let similarities = user_ids
                    .par_iter()
                    .map(|&user_id| {
                        let own_ratings = matrix.user_ratings(user_id).unwrap_or(&[]);
                        let neighbors = rank_peers(&user_ids, user_id, |peer| {
                            support_cosine(own_ratings, matrix.user_ratings(peer).unwrap_or(&[]))
                        });
                        (user_id, neighbors)
                    })
                    .collect();
                PeerSimilarities::Users(similarities)
            }
            NeighborhoodVariant::ItemBased => {
                let item_ids = matrix.item_ids();
                let similarities = item_ids
                    .par_iter()
                    .map(|&item_id| {
                        let own_ratings = matrix.item_ratings(item_id).unwrap_or(&[]);
                        let neighbors = rank_peers(&item_ids, item_id, |peer| {
                            support_cosine(own_ratings, matrix.item_ratings(peer).unwrap_or(&[]))
                        });
                        (item_id, neighbors)
                    })
                    .collect();
                PeerSimilarities::Items(similarities)
            }
        };
        Ok(NeighborhoodModel {
            config,
            matrix: matrix.clone(),
            known_items: catalog.items().iter().map(|item| item.id).collect(),
            peers,
        })
    }

    /// Similarity-weighted average over the k most similar peers with support
    /// for the target. Zero support falls back to the training global mean.
    pub fn predict(&self, user_id: UserId, item_id: ItemId) -> Result<f64> {
        if !self.matrix.knows_user(user_id) {
            return Err(RecError::UnknownUser(user_id));
        }
        if !self.known_items.contains(&item_id) {
            return Err(RecError::UnknownItem(item_id));
        }

        let estimate = match &self.peers {
            PeerSimilarities::Users(similarities) => {
                let raters: HashMap<UserId, f64> = self
                    .matrix
                    .item_ratings(item_id)
                    .unwrap_or(&[])
                    .iter()
                    .copied()
                    .collect();
                self.weighted_average(similarities.get(&user_id), &raters)
            }
            PeerSimilarities::Items(similarities) => {
                let rated: HashMap<ItemId, f64> = self
                    .matrix
                    .user_ratings(user_id)
                    .unwrap_or(&[])
                    .iter()
                    .copied()
                    .collect();
                self.weighted_average(similarities.get(&item_id), &rated)
            }
        };
        Ok(self.config.scale.clamp(estimate))
    }

    fn weighted_average<K: Eq + std::hash::Hash>(
        &self,
        neighbors: Option<&Vec<(K, f64)>>,
        peer_ratings: &HashMap<K, f64>,
    ) -> f64 {
        let mut weighted_sum = 0.0;
        let mut similarity_sum = 0.0;
        let mut qty_taken = 0;
        if let Some(neighbors) = neighbors {
            for (peer, similarity) in neighbors {
                if let Some(rating) = peer_ratings.get(peer) {
                    weighted_sum += similarity * rating;
                    similarity_sum += similarity;
                    qty_taken += 1;
                    if qty_taken == self.config.k_neighbors {
                        break;
                    }
                }
            }
        }
        if similarity_sum > 0.0 {
            weighted_sum / similarity_sum
        } else {
            self.matrix.global_mean()
        }
    }

    pub fn config(&self) -> &NeighborhoodConfig {
        &self.config
    }
}

impl RatingPredictor for NeighborhoodModel {
    fn predict(&self, user_id: UserId, item_id: ItemId) -> Result<f64> {
        NeighborhoodModel::predict(self, user_id, item_id)
    }

    fn get_name(&self) -> String {
        let variant = match self.config.variant {
            NeighborhoodVariant::UserBased => "user",
            NeighborhoodVariant::ItemBased => "item",
        };
        format!("knn-{}(k={})", variant, self.config.k_neighbors)
    }
}

/// Similarities of `own` against every other id, positive entries only,
/// sorted descending with ties by ascending id.
fn rank_peers<K, F>(all_ids: &[K], own: K, mut similarity_to: F) -> Vec<(K, f64)>
where
    K: Copy + Ord,
    F: FnMut(K) -> f64,
{
    let mut neighbors: Vec<(K, f64)> = all_ids
        .iter()
        .filter(|&&peer| peer != own)
        .filter_map(|&peer| {
            let similarity = similarity_to(peer);
            if similarity > 0.0 {
                Some((peer, similarity))
            } else {
                None
            }
        })
        .collect();
    neighbors.sort_unstable_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    neighbors
}

/// Cosine similarity over the co-rated support only: missing ratings are
/// absent, not zero, so both the dot product and the norms run over the
/// overlapping pairs. Both inputs are sorted by id.
fn support_cosine<K: Ord>(a: &[(K, f64)], b: &[(K, f64)]) -> f64 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                norm_a += a[i].1 * a[i].1;
                norm_b += b[j].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    if dot > 0.0 {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    } else {
        0.0
    }
}
