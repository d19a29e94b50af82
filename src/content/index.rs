use hashbrown::HashMap;
use rayon::prelude::*;

use crate::content::vectorizer::{cosine, TermVector, TextVectorizer};
use crate::data::{take_top, Catalog, ItemId, ScoredItem};
use crate::error::{RecError, Result};

/// Pairwise cosine similarities over the vectorized catalog. The matrix is
/// square and symmetric with entries in [0, 1] and an all-ones diagonal.
/// A catalog change invalidates the index; callers rebuild a fresh instance
/// and swap it in rather than mutating this one.
pub struct SimilarityIndex {
    item_ids: Vec<ItemId>,
    id_to_row: HashMap<ItemId, usize>,
    rows: Vec<Vec<f64>>,
}

impl SimilarityIndex {
    pub fn build(catalog: &Catalog, vectorizer: &TextVectorizer) -> Result<SimilarityIndex> {
        let vectors_by_id = vectorizer.vectorize(catalog)?;
        let item_ids: Vec<ItemId> = catalog.items().iter().map(|item| item.id).collect();
        let vectors: Vec<&TermVector> = item_ids.iter().map(|id| &vectors_by_id[id]).collect();

        let rows: Vec<Vec<f64>> = (0..item_ids.len())
            .into_par_iter()
            .map(|row| {
                (0..item_ids.len())
                    .map(|col| {
                        if row == col {
                            1.0
                        } else {
                            cosine(vectors[row], vectors[col])
                        }
                    })
                    .collect()
            })
            .collect();

        let id_to_row = item_ids
            .iter()
            .enumerate()
            .map(|(row, item_id)| (*item_id, row))
            .collect();

        Ok(SimilarityIndex {
            item_ids,
            id_to_row,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.item_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.item_ids.is_empty()
    }

    pub fn similarity(&self, a: ItemId, b: ItemId) -> Result<f64> {
        let row = *self.id_to_row.get(&a).ok_or(RecError::UnknownItem(a))?;
        let col = *self.id_to_row.get(&b).ok_or(RecError::UnknownItem(b))?;
        Ok(self.rows[row][col])
    }

    /// The `how_many` most similar items to the query item, excluding the
    /// query itself, descending by similarity with ties by ascending id.
    pub fn similar(&self, item_id: ItemId, how_many: usize) -> Result<Vec<ScoredItem>> {
        let row = *self
            .id_to_row
            .get(&item_id)
            .ok_or(RecError::UnknownItem(item_id))?;
        let scored = self.rows[row]
            .iter()
            .enumerate()
            .filter(|(col, _)| *col != row)
            .map(|(col, similarity)| ScoredItem::new(self.item_ids[col], *similarity));
        Ok(take_top(scored, how_many))
    }
}

#[cfg(test)]
mod index_test {
    use float_cmp::approx_eq;

    use crate::data::Item;

    use super::*;

    fn build_index(attribute_texts: &[(&str, &str)]) -> SimilarityIndex {
        let items = attribute_texts
            .iter()
            .enumerate()
            .map(|(pos, (title, attributes))| Item {
                id: pos as ItemId + 1,
                title: (*title).to_string(),
                attributes: (*attributes).to_string(),
            })
            .collect();
        let catalog = Catalog::new(items).unwrap();
        SimilarityIndex::build(&catalog, &TextVectorizer::new()).unwrap()
    }

    fn genre_index() -> SimilarityIndex {
        build_index(&[
            ("A", "Drama"),
            ("B", "Crime,Drama"),
            ("C", "Action,Sci-Fi"),
        ])
    }

    #[test]
    fn should_find_item_sharing_a_term() {
        let index = genre_index();
        // B shares the term "drama" with A, C shares nothing.
        let similar = index.similar(1, 1).unwrap();
        assert_eq!(1, similar.len());
        assert_eq!(2, similar[0].id);
        assert!(similar[0].score > 0.0);
    }

    #[test]
    fn should_return_empty_result_for_zero_requested() {
        let index = genre_index();
        assert!(index.similar(1, 0).unwrap().is_empty());
    }

    #[test]
    fn should_never_return_the_query_item() {
        let index = genre_index();
        for item_id in 1..=3 {
            let similar = index.similar(item_id, 10).unwrap();
            assert!(similar.len() <= 2);
            assert!(similar.iter().all(|scored| scored.id != item_id));
        }
    }

    #[test]
    fn should_be_symmetric_with_unit_diagonal() {
        let index = genre_index();
        for a in 1..=3 {
            assert_eq!(1.0, index.similarity(a, a).unwrap());
            for b in 1..=3 {
                let forward = index.similarity(a, b).unwrap();
                let backward = index.similarity(b, a).unwrap();
                assert!(approx_eq!(f64, forward, backward, epsilon = 1e-12));
                assert!((0.0..=1.0).contains(&forward));
            }
        }
    }

    #[test]
    fn should_fail_for_unknown_item() {
        let index = genre_index();
        assert_eq!(
            Err(RecError::UnknownItem(99)),
            index.similar(99, 1).map(|_| ())
        );
        assert_eq!(
            Err(RecError::UnknownItem(99)),
            index.similarity(1, 99).map(|_| ())
        );
    }

    #[test]
    fn should_order_by_descending_similarity() {
        let index = build_index(&[
            ("A", "drama heist"),
            ("B", "drama heist"),
            ("C", "drama"),
            ("D", "comedy"),
        ]);
        let similar = index.similar(1, 3).unwrap();
        let ids: Vec<ItemId> = similar.iter().map(|scored| scored.id).collect();
        // B is identical to A, C overlaps on one term, D not at all.
        assert_eq!(vec![2, 3, 4], ids);
        assert!(similar[0].score > similar[1].score);
        assert!(similar[1].score > similar[2].score);
    }
}
