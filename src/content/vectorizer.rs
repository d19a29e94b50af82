use hashbrown::{HashMap, HashSet};

use crate::content::stopwords;
use crate::data::{Catalog, ItemId};
use crate::error::{RecError, Result};

/// Sparse term-weight vector derived from one item's attribute text,
/// L2-normalized so cosine similarity reduces to a dot product.
pub type TermVector = HashMap<String, f64>;

/// Turns item attribute text into TF-IDF weighted term vectors. Pure function
/// of the catalog; vectors must be recomputed whenever the catalog changes.
pub struct TextVectorizer {
    stop_words: Option<HashSet<String>>,
}

impl TextVectorizer {
    pub fn new() -> Self {
        TextVectorizer {
            stop_words: Some(stopwords::english()),
        }
    }

    pub fn without_stop_words() -> Self {
        TextVectorizer { stop_words: None }
    }

    pub fn with_stop_words(stop_words: HashSet<String>) -> Self {
        TextVectorizer {
            stop_words: Some(stop_words),
        }
    }

    pub fn vectorize(&self, catalog: &Catalog) -> Result<HashMap<ItemId, TermVector>> {
        if catalog.is_empty() {
            return Err(RecError::EmptyInput("item catalog"));
        }
        let qty_items = catalog.len();
        let tokenized: Vec<(ItemId, Vec<String>)> = catalog
            .items()
            .iter()
            .map(|item| (item.id, self.tokenize(&item.attributes)))
            .collect();

        let mut document_frequency: HashMap<&str, usize> = HashMap::new();
        for (_, terms) in &tokenized {
            let unique_terms: HashSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique_terms {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let mut vectors = HashMap::with_capacity(qty_items);
        for (item_id, terms) in &tokenized {
            let mut term_counts: HashMap<&str, usize> = HashMap::new();
            for term in terms {
                *term_counts.entry(term.as_str()).or_insert(0) += 1;
            }
            let mut vector: TermVector = HashMap::with_capacity(term_counts.len());
            for (term, count) in term_counts {
                let df = document_frequency[term] as f64;
                // Smoothed idf keeps every present term at a finite positive
                // weight, including terms occurring in all items.
                let idf = ((1.0 + qty_items as f64) / (1.0 + df)).ln() + 1.0;
                vector.insert(term.to_string(), count as f64 * idf);
            }
            l2_normalize(&mut vector);
            vectors.insert(*item_id, vector);
        }
        Ok(vectors)
    }

    /// Splits on non-alphanumeric boundaries, lower-cases and drops stop words.
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|token| !token.is_empty())
            .map(str::to_lowercase)
            .filter(|token| match &self.stop_words {
                Some(stop_words) => !stop_words.contains(token.as_str()),
                None => true,
            })
            .collect()
    }
}

impl Default for TextVectorizer {
    fn default() -> Self {
        Self::new()
    }
}

fn l2_normalize(vector: &mut TermVector) {
    let norm = vector.values().map(|weight| weight * weight).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
}

/// Both vectors are L2-normalized, so cosine similarity is the sparse dot
/// product iterated over the smaller map.
pub fn cosine(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, weight_a)| large.get(term).map(|weight_b| weight_a * weight_b))
        .sum()
}

#[cfg(test)]
mod vectorizer_test {
    use float_cmp::approx_eq;

    use crate::data::Item;

    use super::*;

    fn catalog(attribute_texts: &[&str]) -> Catalog {
        let items = attribute_texts
            .iter()
            .enumerate()
            .map(|(pos, text)| Item {
                id: pos as ItemId + 1,
                title: format!("Item {}", pos + 1),
                attributes: (*text).to_string(),
            })
            .collect();
        Catalog::new(items).unwrap()
    }

    #[test]
    fn should_tokenize_on_non_alphanumeric_boundaries() {
        let catalog = catalog(&["Action,Sci-Fi", "Drama"]);
        let vectorizer = TextVectorizer::new();
        let vectors = vectorizer.vectorize(&catalog).unwrap();
        let first = &vectors[&1];
        assert!(first.contains_key("action"));
        assert!(first.contains_key("sci"));
        assert!(first.contains_key("fi"));
        assert!(!first.contains_key("Action"));
    }

    #[test]
    fn should_drop_stop_words_by_default() {
        let catalog = catalog(&["the gritty story of a heist", "gritty noir"]);
        let vectors = TextVectorizer::new().vectorize(&catalog).unwrap();
        assert!(!vectors[&1].contains_key("the"));
        assert!(!vectors[&1].contains_key("of"));
        assert!(vectors[&1].contains_key("heist"));

        let unfiltered = TextVectorizer::without_stop_words()
            .vectorize(&catalog)
            .unwrap();
        assert!(unfiltered[&1].contains_key("the"));
    }

    #[test]
    fn should_produce_unit_length_vectors() {
        let catalog = catalog(&["drama thriller heist", "drama", "comedy drama"]);
        let vectors = TextVectorizer::new().vectorize(&catalog).unwrap();
        for vector in vectors.values() {
            let norm: f64 = vector.values().map(|w| w * w).sum();
            assert!(approx_eq!(f64, 1.0, norm, epsilon = 1e-9));
        }
    }

    #[test]
    fn should_weigh_rare_terms_above_common_terms() {
        let catalog = catalog(&["drama thriller", "drama", "drama"]);
        let vectors = TextVectorizer::new().vectorize(&catalog).unwrap();
        let first = &vectors[&1];
        assert!(first["thriller"] > first["drama"]);
    }

    #[test]
    fn should_keep_all_stop_word_text_as_empty_vector() {
        let catalog = catalog(&["the of and", "drama"]);
        let vectors = TextVectorizer::new().vectorize(&catalog).unwrap();
        assert!(vectors[&1].is_empty());
        assert_eq!(0.0, cosine(&vectors[&1], &vectors[&2]));
    }
}
