pub mod index;
pub mod stopwords;
pub mod vectorizer;

pub use index::SimilarityIndex;
pub use vectorizer::{TermVector, TextVectorizer};
