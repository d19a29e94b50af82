use hashbrown::HashSet;

use crate::content::SimilarityIndex;
use crate::data::{take_top, Catalog, ItemId, RatingMatrix, ScoredItem, UserId};
use crate::error::{RecError, Result};
use crate::factor::FactorModel;

#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub title: String,
    pub score: f64,
}

/// Merges content-similarity candidates with collaborative candidates and
/// ranks the union by the factor model's predicted rating. All collaborators
/// are constructed elsewhere and borrowed here; the ranker holds no state of
/// its own.
pub struct HybridRanker<'a> {
    index: &'a SimilarityIndex,
    model: &'a FactorModel,
    matrix: &'a RatingMatrix,
    catalog: &'a Catalog,
}

impl<'a> HybridRanker<'a> {
    pub fn new(
        index: &'a SimilarityIndex,
        model: &'a FactorModel,
        matrix: &'a RatingMatrix,
        catalog: &'a Catalog,
    ) -> Self {
        HybridRanker {
            index,
            model,
            matrix,
            catalog,
        }
    }

    /// Up to `how_many` recommendations for the user, seeded by one item the
    /// content path expands from. Items the user has already rated never
    /// appear; a union smaller than `how_many` is returned as-is, not padded.
    pub fn recommend(
        &self,
        user_id: UserId,
        seed_item_id: ItemId,
        how_many: usize,
    ) -> Result<Vec<Recommendation>> {
        if !self.matrix.knows_user(user_id) {
            return Err(RecError::UnknownUser(user_id));
        }

        let content_candidates = self.index.similar(seed_item_id, how_many)?;

        // Collaborative candidates: best predicted ratings over the catalog
        // items the user has not rated yet.
        let collaborative_candidates = take_top(
            self.catalog
                .items()
                .iter()
                .filter(|item| !self.matrix.user_has_rated(user_id, item.id))
                .map(|item| ScoredItem::new(item.id, self.model.predict(user_id, item.id))),
            how_many,
        );

        let mut candidate_ids: HashSet<ItemId> = HashSet::new();
        candidate_ids.extend(content_candidates.iter().map(|scored| scored.id));
        candidate_ids.extend(collaborative_candidates.iter().map(|scored| scored.id));
        candidate_ids.retain(|id| !self.matrix.user_has_rated(user_id, *id));

        let ranked = take_top(
            candidate_ids
                .iter()
                .map(|&id| ScoredItem::new(id, self.model.predict(user_id, id))),
            how_many,
        );

        Ok(ranked
            .into_iter()
            .map(|scored| {
                let title = self
                    .catalog
                    .get(scored.id)
                    .map(|item| item.title.clone())
                    .unwrap_or_default();
                Recommendation {
                    item_id: scored.id,
                    title,
                    score: scored.score,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod hybrid_test {
    use crate::content::TextVectorizer;
    use crate::data::{Item, Rating};
    use crate::factor::{FactorConfig, FactorModel};

    use super::*;

    fn catalog() -> Catalog {
        let genres = [
            (1, "Heist", "crime drama heist"),
            (2, "Court", "drama courtroom"),
            (3, "Nebula", "space opera sci fi"),
            (4, "Android", "sci fi android"),
            (5, "Slapstick", "comedy slapstick"),
            (6, "Mockumentary", "comedy mockumentary"),
        ];
        let items = genres
            .iter()
            .map(|(id, title, attributes)| Item {
                id: *id,
                title: (*title).to_string(),
                attributes: (*attributes).to_string(),
            })
            .collect();
        Catalog::new(items).unwrap()
    }

    fn ratings() -> Vec<Rating> {
        vec![
            Rating { user_id: 1, item_id: 1, value: 5.0 },
            Rating { user_id: 1, item_id: 3, value: 2.0 },
            Rating { user_id: 2, item_id: 1, value: 4.0 },
            Rating { user_id: 2, item_id: 2, value: 5.0 },
            Rating { user_id: 2, item_id: 5, value: 3.0 },
            Rating { user_id: 3, item_id: 2, value: 4.0 },
            Rating { user_id: 3, item_id: 4, value: 2.0 },
            Rating { user_id: 3, item_id: 6, value: 4.0 },
        ]
    }

    struct Fixture {
        catalog: Catalog,
        matrix: RatingMatrix,
        index: SimilarityIndex,
        model: FactorModel,
    }

    fn fixture() -> Fixture {
        let catalog = catalog();
        let matrix = RatingMatrix::from_ratings(&ratings()).unwrap();
        let index = SimilarityIndex::build(&catalog, &TextVectorizer::new()).unwrap();
        let config = FactorConfig {
            epochs: 5,
            ..FactorConfig::default()
        };
        let model = FactorModel::fit(config, &matrix).unwrap();
        Fixture {
            catalog,
            matrix,
            index,
            model,
        }
    }

    #[test]
    fn should_never_recommend_rated_items() {
        let fixture = fixture();
        let ranker = HybridRanker::new(
            &fixture.index,
            &fixture.model,
            &fixture.matrix,
            &fixture.catalog,
        );
        let recommendations = ranker.recommend(1, 1, 4).unwrap();
        assert!(!recommendations.is_empty());
        for recommendation in &recommendations {
            assert!(!fixture.matrix.user_has_rated(1, recommendation.item_id));
        }
    }

    #[test]
    fn should_rank_descending_with_titles() {
        let fixture = fixture();
        let ranker = HybridRanker::new(
            &fixture.index,
            &fixture.model,
            &fixture.matrix,
            &fixture.catalog,
        );
        let recommendations = ranker.recommend(1, 1, 4).unwrap();
        for pair in recommendations.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        for recommendation in &recommendations {
            assert!(!recommendation.title.is_empty());
        }
    }

    #[test]
    fn should_return_fewer_than_requested_without_padding() {
        let fixture = fixture();
        let ranker = HybridRanker::new(
            &fixture.index,
            &fixture.model,
            &fixture.matrix,
            &fixture.catalog,
        );
        // User 1 rated 2 of the 6 items, so at most 4 candidates survive.
        let recommendations = ranker.recommend(1, 1, 100).unwrap();
        assert!(recommendations.len() <= 4);
    }

    #[test]
    fn should_fail_for_unknown_user_or_seed() {
        let fixture = fixture();
        let ranker = HybridRanker::new(
            &fixture.index,
            &fixture.model,
            &fixture.matrix,
            &fixture.catalog,
        );
        assert_eq!(
            Err(RecError::UnknownUser(42)),
            ranker.recommend(42, 1, 3).map(|_| ())
        );
        assert_eq!(
            Err(RecError::UnknownItem(42)),
            ranker.recommend(1, 42, 3).map(|_| ())
        );
    }
}
