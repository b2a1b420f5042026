use super::*;
use crate::embeddings::HashingEmbedder;
use std::collections::HashMap;

/// Embeds known texts to fixed vectors
struct TableEmbedder {
    table: HashMap<String, Vec<f32>>,
}

impl TableEmbedder {
    fn new(entries: &[(&str, Vec<f32>)]) -> Self {
        Self {
            table: entries
                .iter()
                .map(|(text, vector)| ((*text).to_string(), vector.clone()))
                .collect(),
        }
    }
}

impl Embedder for TableEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.table
            .get(text)
            .cloned()
            .ok_or_else(|| QaError::Embedding(format!("unknown text: {text}")))
    }

    fn model_name(&self) -> &str {
        "table"
    }
}

fn segments(texts: &[&str]) -> Vec<Segment> {
    texts
        .iter()
        .enumerate()
        .map(|(ordinal, text)| Segment {
            ordinal,
            text: (*text).to_string(),
            source: "kb.txt".to_string(),
        })
        .collect()
}

fn four_point_index(metric: DistanceMetric) -> VectorIndex {
    let embedder = TableEmbedder::new(&[
        ("a", vec![0.0, 0.0]),
        ("b", vec![1.0, 0.0]),
        ("c", vec![3.0, 0.0]),
        ("d", vec![0.0, 2.0]),
    ]);
    VectorIndex::build(segments(&["a", "b", "c", "d"]), &embedder, metric)
        .expect("index should build")
}

#[test]
fn l2_distance() {
    let d = DistanceMetric::L2.distance(&[0.0, 0.0], &[3.0, 4.0]);
    assert!((d - 5.0).abs() < 1e-6);
}

#[test]
fn cosine_distance() {
    let same = DistanceMetric::Cosine.distance(&[1.0, 1.0], &[2.0, 2.0]);
    let orthogonal = DistanceMetric::Cosine.distance(&[1.0, 0.0], &[0.0, 5.0]);
    let zero = DistanceMetric::Cosine.distance(&[0.0, 0.0], &[1.0, 0.0]);

    assert!(same.abs() < 1e-6);
    assert!((orthogonal - 1.0).abs() < 1e-6);
    assert!((zero - 1.0).abs() < 1e-6);
}

#[test]
fn build_records_every_segment() {
    let index = four_point_index(DistanceMetric::L2);

    assert_eq!(index.len(), 4);
    assert!(!index.is_empty());
    assert_eq!(index.dimension(), 2);
    assert_eq!(index.metric(), DistanceMetric::L2);
    let ordinals: Vec<usize> = index.segments().map(|s| s.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3]);
}

#[test]
fn search_orders_by_ascending_distance() {
    let index = four_point_index(DistanceMetric::L2);

    let hits = index.search(&[0.9, 0.0], 3).expect("search should succeed");

    let texts: Vec<&str> = hits.iter().map(|h| h.segment.text.as_str()).collect();
    assert_eq!(texts, vec!["b", "a", "c"]);
    for pair in hits.windows(2) {
        assert!(pair[0].distance <= pair[1].distance);
    }
}

#[test]
fn search_returns_at_most_k() {
    let index = four_point_index(DistanceMetric::L2);

    assert_eq!(index.search(&[0.0, 0.0], 3).expect("search").len(), 3);
    assert_eq!(index.search(&[0.0, 0.0], 10).expect("search").len(), 4);
    assert!(index.search(&[0.0, 0.0], 0).expect("search").is_empty());
}

#[test]
fn ties_keep_file_order() {
    let embedder = TableEmbedder::new(&[
        ("first", vec![1.0, 0.0]),
        ("second", vec![0.0, 1.0]),
        ("third", vec![-1.0, 0.0]),
    ]);
    let index = VectorIndex::build(
        segments(&["third", "first", "second"]),
        &embedder,
        DistanceMetric::L2,
    )
    .expect("index should build");

    let hits = index.search(&[0.0, 0.0], 3).expect("search");

    let ordinals: Vec<usize> = hits.iter().map(|h| h.segment.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2]);
}

#[test]
fn empty_index_returns_no_hits() {
    let embedder = HashingEmbedder::default();
    let index =
        VectorIndex::build(Vec::new(), &embedder, DistanceMetric::L2).expect("empty build");

    assert!(index.is_empty());
    assert_eq!(index.dimension(), 0);
    assert!(index.search(&[1.0, 2.0], 3).expect("search").is_empty());
}

#[test]
fn build_fails_atomically_when_any_segment_fails() {
    let embedder = TableEmbedder::new(&[("known", vec![1.0, 0.0])]);

    let result = VectorIndex::build(
        segments(&["known", "unknown"]),
        &embedder,
        DistanceMetric::L2,
    );

    assert!(matches!(result, Err(QaError::Embedding(_))));
}

#[test]
fn build_rejects_mixed_dimensions() {
    let embedder = TableEmbedder::new(&[("x", vec![1.0, 0.0]), ("y", vec![1.0, 0.0, 0.0])]);

    let result = VectorIndex::build(segments(&["x", "y"]), &embedder, DistanceMetric::L2);

    assert!(matches!(result, Err(QaError::Embedding(_))));
}

#[test]
fn build_rejects_empty_vectors() {
    let embedder = TableEmbedder::new(&[("x", Vec::new())]);

    let result = VectorIndex::build(segments(&["x"]), &embedder, DistanceMetric::L2);

    assert!(matches!(result, Err(QaError::Embedding(_))));
}

#[test]
fn query_dimension_mismatch_is_error() {
    let index = four_point_index(DistanceMetric::Cosine);

    let result = index.search(&[1.0, 0.0, 0.0], 3);

    assert!(matches!(result, Err(QaError::Embedding(_))));
}

#[test]
fn metric_display_matches_serde_names() {
    assert_eq!(DistanceMetric::L2.to_string(), "l2");
    assert_eq!(DistanceMetric::Cosine.to_string(), "cosine");
    assert_eq!(
        serde_json::to_string(&DistanceMetric::Cosine).expect("serialize"),
        "\"cosine\""
    );
}
