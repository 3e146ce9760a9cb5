//! Nearest-neighbor index seam and the flat index read from FAISS files

use crate::errors::{AssistantError, Result};
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Distance convention of an index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Higher is more similar
    InnerProduct,
    /// Squared euclidean distance, lower is more similar
    L2,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::InnerProduct => write!(f, "inner_product"),
            Metric::L2 => write!(f, "l2"),
        }
    }
}

/// k-NN answer in the FAISS shape. Unfilled slots carry id -1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResult {
    pub scores: Vec<f32>,
    pub ids: Vec<i64>,
}

impl SearchResult {
    pub fn iter(&self) -> impl Iterator<Item = (f32, i64)> + '_ {
        self.scores.iter().copied().zip(self.ids.iter().copied())
    }
}

/// Read-only nearest-neighbor structure. Search must not mutate.
pub trait NearestNeighborIndex: Send + Sync {
    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn metric(&self) -> Metric;

    fn kind(&self) -> &'static str;

    /// Top `k` neighbors of `query` by the native metric
    fn search(&self, query: &[f32], k: usize) -> Result<SearchResult>;
}

/// Exhaustive index over row-major vectors
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    metric: Metric,
    vectors: Vec<f32>,
}

impl FlatIndex {
    /// `vectors` is row-major, one row per id starting at 0
    pub fn new(dimension: usize, metric: Metric, vectors: Vec<f32>) -> Result<Self> {
        if dimension == 0 {
            return Err(AssistantError::IndexSearch("dimension must be positive".to_string()));
        }
        if vectors.len() % dimension != 0 {
            return Err(AssistantError::IndexSearch(format!(
                "{} values is not a multiple of dimension {}",
                vectors.len(),
                dimension
            )));
        }
        Ok(Self {
            dimension,
            metric,
            vectors,
        })
    }

    pub fn from_rows(metric: Metric, rows: &[Vec<f32>]) -> Result<Self> {
        let dimension = rows.first().map(|r| r.len()).unwrap_or(0);
        if rows.iter().any(|r| r.len() != dimension) {
            return Err(AssistantError::IndexSearch("rows differ in length".to_string()));
        }
        Self::new(dimension, metric, rows.concat())
    }

    /// Load a FAISS `IndexFlat*` file written by `faiss.write_index`
    pub fn read_faiss(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        parse_faiss_flat(&bytes).map_err(|reason| AssistantError::InvalidIndex {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn score(&self, query: &[f32], row: &[f32]) -> f32 {
        match self.metric {
            Metric::InnerProduct => query.iter().zip(row).map(|(a, b)| a * b).sum(),
            Metric::L2 => query.iter().zip(row).map(|(a, b)| (a - b) * (a - b)).sum(),
        }
    }
}

impl NearestNeighborIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    fn metric(&self) -> Metric {
        self.metric
    }

    fn kind(&self) -> &'static str {
        "IndexFlat"
    }

    fn search(&self, query: &[f32], k: usize) -> Result<SearchResult> {
        if query.len() != self.dimension {
            return Err(AssistantError::IndexSearch(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<(f32, i64)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, row)| (self.score(query, row), id as i64))
            .collect();

        let best_first = |a: &(f32, i64), b: &(f32, i64)| match self.metric {
            Metric::InnerProduct => b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal),
            Metric::L2 => a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal),
        };
        scored.sort_by(best_first);
        scored.truncate(k);

        let filler = match self.metric {
            Metric::InnerProduct => f32::NEG_INFINITY,
            Metric::L2 => f32::INFINITY,
        };
        let mut result = SearchResult {
            scores: scored.iter().map(|s| s.0).collect(),
            ids: scored.iter().map(|s| s.1).collect(),
        };
        while result.ids.len() < k {
            result.scores.push(filler);
            result.ids.push(-1);
        }
        Ok(result)
    }
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn take(&mut self, n: usize) -> std::result::Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.bytes.len())
            .ok_or_else(|| format!("truncated at byte {}", self.pos))?;
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> std::result::Result<[u8; N], String> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn i32(&mut self) -> std::result::Result<i32, String> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> std::result::Result<i64, String> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> std::result::Result<u64, String> {
        Ok(u64::from_le_bytes(self.array()?))
    }
}

/// Header: fourcc, d:i32, ntotal:i64, two i64 placeholders, is_trained:u8,
/// metric_type:i32 (+ f32 arg when > 1), then the vector count and floats.
pub(crate) fn parse_faiss_flat(bytes: &[u8]) -> std::result::Result<FlatIndex, String> {
    let mut r = ByteReader { bytes, pos: 0 };

    let fourcc = r.array::<4>()?;
    if !matches!(&fourcc, b"IxFI" | b"IxF2" | b"IxFl") {
        return Err(format!(
            "unsupported index type {:?}, only flat indexes are readable",
            String::from_utf8_lossy(&fourcc)
        ));
    }

    let d = r.i32()?;
    let ntotal = r.i64()?;
    let _ = r.i64()?;
    let _ = r.i64()?;
    let _is_trained = r.take(1)?;
    let metric_type = r.i32()?;
    if metric_type > 1 {
        let _metric_arg = r.take(4)?;
    }
    let metric = match metric_type {
        0 => Metric::InnerProduct,
        1 => Metric::L2,
        other => return Err(format!("unsupported metric type {}", other)),
    };

    if d <= 0 || ntotal < 0 {
        return Err(format!("bad header d={} ntotal={}", d, ntotal));
    }
    let count = r.u64()? as usize;
    let expected = (d as usize)
        .checked_mul(ntotal as usize)
        .ok_or_else(|| "vector count overflows".to_string())?;
    if count != expected {
        return Err(format!(
            "stored {} floats, header implies {}",
            count, expected
        ));
    }

    let raw = r.take(count.checked_mul(4).ok_or_else(|| "size overflows".to_string())?)?;
    let vectors = raw
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    FlatIndex::new(d as usize, metric, vectors).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn faiss_bytes(fourcc: &[u8; 4], metric: i32, d: i32, rows: &[Vec<f32>]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(fourcc);
        out.extend_from_slice(&d.to_le_bytes());
        out.extend_from_slice(&(rows.len() as i64).to_le_bytes());
        out.extend_from_slice(&(1i64 << 20).to_le_bytes());
        out.extend_from_slice(&(1i64 << 20).to_le_bytes());
        out.push(1);
        out.extend_from_slice(&metric.to_le_bytes());
        let floats: Vec<f32> = rows.concat();
        out.extend_from_slice(&(floats.len() as u64).to_le_bytes());
        for f in floats {
            out.extend_from_slice(&f.to_le_bytes());
        }
        out
    }

    #[test]
    fn test_inner_product_search_orders_descending() {
        let index = FlatIndex::from_rows(
            Metric::InnerProduct,
            &[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7, 0.7]],
        )
        .unwrap();
        let result = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(result.ids, vec![0, 2]);
        assert!(result.scores[0] >= result.scores[1]);
    }

    #[test]
    fn test_l2_search_orders_ascending() {
        let index =
            FlatIndex::from_rows(Metric::L2, &[vec![5.0, 5.0], vec![0.0, 0.1]]).unwrap();
        let result = index.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(result.ids, vec![1, 0]);
    }

    #[test]
    fn test_search_pads_with_minus_one() {
        let index = FlatIndex::from_rows(Metric::InnerProduct, &[vec![1.0]]).unwrap();
        let result = index.search(&[1.0], 3).unwrap();
        assert_eq!(result.ids, vec![0, -1, -1]);
        assert_eq!(result.scores.len(), 3);
    }

    #[test]
    fn test_dimension_mismatch_is_search_error() {
        let index = FlatIndex::from_rows(Metric::InnerProduct, &[vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(AssistantError::IndexSearch(_))
        ));
    }

    #[test]
    fn test_parse_faiss_flat_ip() {
        let rows = vec![vec![0.1, 0.2, 0.3], vec![0.4, 0.5, 0.6]];
        let index = parse_faiss_flat(&faiss_bytes(b"IxFI", 0, 3, &rows)).unwrap();
        assert_eq!(index.dimension(), 3);
        assert_eq!(index.len(), 2);
        assert_eq!(index.metric(), Metric::InnerProduct);
    }

    #[test]
    fn test_parse_faiss_flat_l2() {
        let rows = vec![vec![1.0, 2.0]];
        let index = parse_faiss_flat(&faiss_bytes(b"IxF2", 1, 2, &rows)).unwrap();
        assert_eq!(index.metric(), Metric::L2);
    }

    #[test]
    fn test_parse_rejects_other_index_types() {
        let bytes = faiss_bytes(b"IHNf", 0, 2, &[vec![1.0, 2.0]]);
        assert!(parse_faiss_flat(&bytes).unwrap_err().contains("unsupported"));
    }

    #[test]
    fn test_parse_rejects_truncated_file() {
        let mut bytes = faiss_bytes(b"IxFI", 0, 2, &[vec![1.0, 2.0]]);
        bytes.truncate(bytes.len() - 3);
        assert!(parse_faiss_flat(&bytes).unwrap_err().contains("truncated"));
    }
}
