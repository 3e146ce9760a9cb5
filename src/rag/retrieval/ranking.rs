//! Cross-store merge: global sort by score, then signature dedup

use std::collections::HashSet;

use crate::rag::retrieval::Hit;

/// Sort descending by score and keep the first hit per document signature,
/// stopping once `total_k` unique hits are kept.
///
/// The sort is stable, so equal scores keep store-registration order.
pub fn rank_hits(mut hits: Vec<Hit>, total_k: usize) -> Vec<Hit> {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut seen = HashSet::new();
    let mut ranked = Vec::with_capacity(total_k.min(hits.len()));
    for hit in hits {
        if ranked.len() >= total_k {
            break;
        }
        if seen.insert(hit.document.signature()) {
            ranked.push(hit);
        }
    }
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Document;
    use quickcheck_macros::quickcheck;

    fn hit(score: f32, store: &str, url: &str, content: &str) -> Hit {
        Hit {
            score,
            id: 0,
            store: store.to_string(),
            document: Document::new(content, url, "", ""),
        }
    }

    #[test]
    fn test_cross_store_duplicate_keeps_higher_score() {
        let hits = vec![
            hit(0.61, "v2_site", "https://esilv.fr/admissions", "Admission sur concours"),
            hit(0.83, "v3_pdf", "https://esilv.fr/admissions", "Admission sur concours"),
            hit(0.70, "v2_site", "https://esilv.fr/international", "Semestre à l'étranger"),
        ];
        let ranked = rank_hits(hits, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].store, "v3_pdf");
        assert_eq!(ranked[0].score, 0.83);
        assert_eq!(ranked[1].document.url, "https://esilv.fr/international");
    }

    #[test]
    fn test_whitespace_differences_still_duplicate() {
        let hits = vec![
            hit(0.9, "a", " https://esilv.fr/x ", "  Bachelor  "),
            hit(0.8, "b", "https://esilv.fr/x", "Bachelor"),
        ];
        assert_eq!(rank_hits(hits, 10).len(), 1);
    }

    #[test]
    fn test_stops_at_total_k() {
        let hits = (0..20)
            .map(|i| hit(i as f32, "a", "u", &format!("doc {}", i)))
            .collect();
        let ranked = rank_hits(hits, 5);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].score, 19.0);
    }

    #[test]
    fn test_underflow_returns_what_exists() {
        let hits = vec![hit(0.5, "a", "u", "same"), hit(0.4, "b", "u", "same")];
        assert_eq!(rank_hits(hits, 10).len(), 1);
        assert!(rank_hits(Vec::new(), 10).is_empty());
        assert!(rank_hits(vec![hit(0.1, "a", "u", "x")], 0).is_empty());
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let hits = vec![hit(0.5, "first", "u1", "a"), hit(0.5, "second", "u2", "b")];
        let ranked = rank_hits(hits, 10);
        assert_eq!(ranked[0].store, "first");
    }

    #[quickcheck]
    fn prop_sorted_bounded_unique(entries: Vec<(i16, u8, u8)>, total_k: u8) -> bool {
        let hits: Vec<Hit> = entries
            .iter()
            .map(|(score, url, content)| {
                hit(
                    *score as f32,
                    "s",
                    &format!("https://esilv.fr/{}", url % 4),
                    &format!("content {}", content % 4),
                )
            })
            .collect();
        let ranked = rank_hits(hits, total_k as usize);

        let sorted = ranked.windows(2).all(|w| w[0].score >= w[1].score);
        let bounded = ranked.len() <= total_k as usize;
        let unique = ranked
            .iter()
            .map(|h| h.document.signature())
            .collect::<HashSet<_>>()
            .len()
            == ranked.len();
        sorted && bounded && unique
    }

    #[quickcheck]
    fn prop_kept_duplicate_is_the_best_scoring(entries: Vec<(i16, u8)>) -> bool {
        let hits: Vec<Hit> = entries
            .iter()
            .map(|(score, key)| hit(*score as f32, "s", "u", &format!("k{}", key % 3)))
            .collect();
        let ranked = rank_hits(hits.clone(), usize::MAX);
        ranked.iter().all(|kept| {
            hits.iter()
                .filter(|h| h.document.signature() == kept.document.signature())
                .all(|h| h.score <= kept.score)
        })
    }
}
