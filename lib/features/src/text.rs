// TF-IDF text extractor with a frequency-capped vocabulary
use ahash::{AHashMap, AHashSet};
use fusionrec_core::{Error, Matrix, Result, SparseVector};
use serde::{Deserialize, Serialize};

/// Default vocabulary cap
pub const DEFAULT_MAX_FEATURES: usize = 100;

/// Tokenize text for vectorization.
///
/// Lowercases, splits on anything that is not alphanumeric or `_`, and
/// drops tokens shorter than two characters.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| s.chars().nth(1).is_some())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TfidfExtractor {
    // sorted; a term's position is its column
    terms: Vec<String>,
    idf: Vec<f32>,
    max_features: usize,
}

impl TfidfExtractor {
    /// Learn the vocabulary and idf weights.
    ///
    /// Keeps the `max_features` terms with the highest total count across
    /// the corpus (ties broken alphabetically). Columns are the kept terms
    /// in alphabetical order.
    pub fn fit<S: AsRef<str>>(documents: &[S], max_features: usize) -> Result<Self> {
        if max_features == 0 {
            return Err(Error::configuration("max_features must be at least 1"));
        }
        if documents.is_empty() {
            return Err(Error::invalid_training_data("cannot fit text extractor on zero documents"));
        }

        let mut term_counts: AHashMap<String, usize> = AHashMap::new();
        let mut doc_freq: AHashMap<String, usize> = AHashMap::new();

        for doc in documents {
            let tokens = tokenize(doc.as_ref());
            let mut seen: AHashSet<&str> = AHashSet::new();
            for token in &tokens {
                *term_counts.entry(token.clone()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *doc_freq.entry(token.clone()).or_insert(0) += 1;
                }
            }
        }

        if term_counts.is_empty() {
            return Err(Error::invalid_training_data(
                "empty vocabulary: no document contains a term of two or more characters",
            ));
        }

        let mut ranked: Vec<(String, usize)> = term_counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(max_features);

        let mut terms: Vec<String> = ranked.into_iter().map(|(term, _)| term).collect();
        terms.sort();

        // smoothed idf: ln((1 + n) / (1 + df)) + 1
        let n = documents.len() as f64;
        let idf = terms
            .iter()
            .map(|t| {
                let df = doc_freq.get(t).copied().unwrap_or(0) as f64;
                (((1.0 + n) / (1.0 + df)).ln() + 1.0) as f32
            })
            .collect();

        tracing::debug!(
            documents = documents.len(),
            vocabulary = terms.len(),
            max_features,
            "fitted text extractor"
        );

        Ok(Self {
            terms,
            idf,
            max_features,
        })
    }

    /// Weighted, L2-normalized term vector for one text.
    ///
    /// Out-of-vocabulary terms are ignored; a text with no known term maps
    /// to the zero vector.
    pub fn transform_one(&self, text: &str) -> SparseVector {
        let mut counts: Vec<(u32, f32)> = Vec::new();
        for token in tokenize(text) {
            if let Ok(col) = self.terms.binary_search(&token) {
                counts.push((col as u32, 1.0));
            }
        }
        counts.sort_unstable_by_key(|&(col, _)| col);

        let mut weighted: Vec<(u32, f32)> = Vec::with_capacity(counts.len());
        for (col, c) in counts {
            match weighted.last_mut() {
                Some((last, w)) if *last == col => *w += c,
                _ => weighted.push((col, c)),
            }
        }
        for (col, w) in weighted.iter_mut() {
            *w *= self.idf[*col as usize];
        }

        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for (_, w) in weighted.iter_mut() {
                *w /= norm;
            }
        }

        SparseVector::from_sorted_pairs(self.vocabulary_size(), weighted)
    }

    pub fn transform<S: AsRef<str>>(&self, documents: &[S]) -> Vec<SparseVector> {
        documents.iter().map(|d| self.transform_one(d.as_ref())).collect()
    }

    /// Dense block, one row per document.
    pub fn transform_dense<S: AsRef<str>>(&self, documents: &[S]) -> Matrix {
        let mut block = Matrix::zeros(documents.len(), self.vocabulary_size());
        for (i, doc) in documents.iter().enumerate() {
            self.transform_one(doc.as_ref()).write_dense(block.row_mut(i));
        }
        block
    }

    /// Check that a decoded extractor is usable: a non-empty, strictly
    /// sorted vocabulary with one finite idf weight per term.
    pub fn validate(&self) -> Result<()> {
        if self.terms.is_empty() {
            return Err(Error::invalid_argument("text extractor has an empty vocabulary"));
        }
        if self.terms.len() != self.idf.len() {
            return Err(Error::invalid_argument(format!(
                "text extractor has {} terms but {} idf weights",
                self.terms.len(),
                self.idf.len()
            )));
        }
        if self.terms.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::invalid_argument("vocabulary must be strictly sorted"));
        }
        if self.idf.iter().any(|w| !w.is_finite()) {
            return Err(Error::invalid_argument("idf weights must be finite"));
        }
        Ok(())
    }

    #[inline]
    pub fn vocabulary_size(&self) -> usize {
        self.terms.len()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn column_of(&self, term: &str) -> Option<usize> {
        self.terms.binary_search_by(|t| t.as_str().cmp(term)).ok()
    }

    pub fn idf(&self, term: &str) -> Option<f32> {
        self.column_of(term).map(|c| self.idf[c])
    }

    pub fn max_features(&self) -> usize {
        self.max_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Whole-Milk, 3.5% fat; e_150a a"),
            vec!["whole", "milk", "fat", "e_150a"]
        );
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_vocabulary_is_alphabetical() {
        let docs = ["sugar milk cocoa", "milk oats", "oats honey milk"];
        let tfidf = TfidfExtractor::fit(&docs, 100).unwrap();
        assert_eq!(tfidf.terms(), &["cocoa", "honey", "milk", "oats", "sugar"]);
    }

    #[test]
    fn test_max_features_keeps_most_frequent() {
        let docs = ["milk milk oats", "milk oats sugar", "cocoa"];
        let tfidf = TfidfExtractor::fit(&docs, 2).unwrap();
        assert_eq!(tfidf.terms(), &["milk", "oats"]);
    }

    #[test]
    fn test_smoothed_idf() {
        let docs = ["milk oats", "milk"];
        let tfidf = TfidfExtractor::fit(&docs, 10).unwrap();
        // milk: df = 2 -> ln(3/3) + 1
        assert!((tfidf.idf("milk").unwrap() - 1.0).abs() < 1e-6);
        // oats: df = 1 -> ln(3/2) + 1
        assert!((tfidf.idf("oats").unwrap() - (1.5f32.ln() + 1.0)).abs() < 1e-6);
    }

    #[test]
    fn test_transform_is_unit_length_and_drops_oov() {
        let docs = ["milk oats", "milk sugar"];
        let tfidf = TfidfExtractor::fit(&docs, 10).unwrap();

        let v = tfidf.transform_one("milk milk unknownword");
        assert_eq!(v.nnz(), 1);
        assert!((v.norm() - 1.0).abs() < 1e-6);

        let empty = tfidf.transform_one("nothing known here");
        assert_eq!(empty.nnz(), 0);
        assert_eq!(empty.dim, tfidf.vocabulary_size());
    }

    #[test]
    fn test_empty_vocabulary_rejected() {
        let docs = ["", "", "a"];
        assert!(matches!(
            TfidfExtractor::fit(&docs, 100),
            Err(Error::InvalidTrainingData(_))
        ));
    }

    #[test]
    fn test_dense_block_matches_sparse() {
        let docs = ["cocoa milk", "oats"];
        let tfidf = TfidfExtractor::fit(&docs, 10).unwrap();
        let block = tfidf.transform_dense(&docs);
        assert_eq!(block.shape(), (2, 3));
        assert_eq!(block.row(0), tfidf.transform_one(docs[0]).to_dense().as_slice());
    }

    #[test]
    fn test_validate_catches_inconsistent_parts() {
        let tfidf = TfidfExtractor::fit(&["cocoa milk", "oats"], 10).unwrap();
        assert!(tfidf.validate().is_ok());

        let mut short_idf = tfidf.clone();
        short_idf.idf.pop();
        assert!(short_idf.validate().is_err());

        let mut unsorted = tfidf;
        unsorted.terms.reverse();
        assert!(unsorted.validate().is_err());
    }
}
