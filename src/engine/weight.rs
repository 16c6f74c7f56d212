//! BM25 term weighting.
//!
//! ```text
//! w(t, d) = wqf · IDF(t) · (wdf · (k1 + 1)) / (wdf + k1 · (1 - b + b · |d| / avgdl))
//! IDF(t)  = ln(1 + (N - n + 0.5) / (n + 0.5))
//! ```
//!
//! `|d|` is the document length (sum of within-document frequencies), `N`
//! the number of documents and `n` the number containing `t`.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bm25 {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25 {
    fn default() -> Self {
        Self { k1: 1.2, b: 0.75 }
    }
}

/// Collection statistics needed to weight a term.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollectionStats {
    pub doc_count: u64,
    pub avg_length: f64,
}

impl Bm25 {
    pub fn idf(&self, stats: &CollectionStats, term_freq: u64) -> f64 {
        let n = stats.doc_count as f64;
        let df = term_freq as f64;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    pub fn weight(
        &self,
        stats: &CollectionStats,
        term_freq: u64,
        wdf: u32,
        doc_length: u64,
        wqf: u32,
    ) -> f64 {
        if wdf == 0 {
            return 0.0;
        }
        let tf = wdf as f64;
        let avg = if stats.avg_length > 0.0 {
            stats.avg_length
        } else {
            1.0
        };
        let norm = 1.0 - self.b + self.b * doc_length as f64 / avg;
        wqf as f64 * self.idf(stats, term_freq) * (tf * (self.k1 + 1.0)) / (tf + self.k1 * norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rarer_terms_weigh_more() {
        let bm25 = Bm25::default();
        let stats = CollectionStats {
            doc_count: 10,
            avg_length: 5.0,
        };
        let rare = bm25.weight(&stats, 1, 1, 5, 1);
        let common = bm25.weight(&stats, 9, 1, 5, 1);
        assert!(rare > common);
        assert!(common > 0.0);
    }

    #[test]
    fn test_shorter_documents_weigh_more() {
        let bm25 = Bm25::default();
        let stats = CollectionStats {
            doc_count: 2,
            avg_length: 5.0,
        };
        assert!(bm25.weight(&stats, 2, 1, 4, 1) > bm25.weight(&stats, 2, 1, 6, 1));
        assert_eq!(bm25.weight(&stats, 2, 0, 4, 1), 0.0);
    }
}
