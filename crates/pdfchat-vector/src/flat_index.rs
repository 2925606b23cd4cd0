//! Flat exact nearest-neighbor index over L2 distance
//!
//! Vectors are stored row-major in a single buffer and every search scans
//! all rows. Rows are never updated or removed; a changed document set
//! means building a new index.
//!
//! Author: hephaex@gmail.com

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use pdfchat_core::DocumentFingerprint;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Result, SearchHit, VectorError};

/// Bumped whenever the on-disk layout changes
const FORMAT_VERSION: u32 = 2;

/// Flat L2 index
#[derive(Debug, Clone, PartialEq)]
pub struct FlatL2Index {
    dimension: usize,
    data: Vec<f32>,
}

/// On-disk form of the index
#[derive(Serialize, Deserialize)]
struct StoredIndex {
    format_version: u32,
    dimension: usize,
    data: Vec<f32>,
    /// Document embedded by each row, in row order
    rows: Vec<DocumentFingerprint>,
}

impl FlatL2Index {
    /// Build an index from vectors; row `i` is `vectors[i]`
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let first = vectors.first().ok_or(VectorError::EmptyIndex)?;
        let dimension = first.len();
        if dimension == 0 {
            return Err(VectorError::DimensionMismatch {
                expected: 1,
                actual: 0,
            });
        }

        let mut data = Vec::with_capacity(dimension * vectors.len());
        for vector in vectors {
            if vector.len() != dimension {
                return Err(VectorError::DimensionMismatch {
                    expected: dimension,
                    actual: vector.len(),
                });
            }
            data.extend_from_slice(vector);
        }

        debug!(rows = vectors.len(), dimension, "Built flat L2 index");
        Ok(Self { dimension, data })
    }

    /// Number of stored vectors
    pub fn len(&self) -> usize {
        self.data.len() / self.dimension
    }

    /// Whether the index has no vectors
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Vector dimension
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Return the `min(k, len)` nearest rows, closest first.
    ///
    /// Equal distances keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>> {
        if k == 0 {
            return Err(VectorError::InvalidK);
        }
        if query.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .data
            .chunks_exact(self.dimension)
            .map(|row| squared_l2(row, query))
            .enumerate()
            .collect();

        // sort_by is stable, so ties stay in row order
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(position, dist)| SearchHit {
                position,
                distance: dist.sqrt(),
            })
            .collect())
    }

    /// Write the index and the identity of each row's document to `path`,
    /// creating parent directories
    pub fn persist(&self, path: impl AsRef<Path>, rows: &[DocumentFingerprint]) -> Result<()> {
        let path = path.as_ref();
        if rows.len() != self.len() {
            return Err(VectorError::Persistence(format!(
                "{} row fingerprints for {} rows",
                rows.len(),
                self.len()
            )));
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let stored = StoredIndex {
            format_version: FORMAT_VERSION,
            dimension: self.dimension,
            data: self.data.clone(),
            rows: rows.to_vec(),
        };

        let mut writer = BufWriter::new(File::create(path)?);
        bincode::serialize_into(&mut writer, &stored)
            .map_err(|e| VectorError::Persistence(format!("Failed to serialize index: {e}")))?;
        writer.flush()?;

        info!(path = %path.display(), rows = self.len(), "Persisted index");
        Ok(())
    }

    /// Read an index written by [`FlatL2Index::persist`] together with its
    /// row fingerprints
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, Vec<DocumentFingerprint>)> {
        let path = path.as_ref();
        let reader = BufReader::new(File::open(path)?);
        let stored: StoredIndex = bincode::deserialize_from(reader)
            .map_err(|e| VectorError::Persistence(format!("Failed to parse index: {e}")))?;

        if stored.format_version != FORMAT_VERSION {
            return Err(VectorError::Persistence(format!(
                "Unsupported index format version {}",
                stored.format_version
            )));
        }
        if stored.dimension == 0 || stored.data.len() % stored.dimension != 0 {
            return Err(VectorError::Persistence(format!(
                "Corrupt index: {} values for dimension {}",
                stored.data.len(),
                stored.dimension
            )));
        }
        if stored.data.is_empty() {
            return Err(VectorError::EmptyIndex);
        }

        let index = Self {
            dimension: stored.dimension,
            data: stored.data,
        };
        if stored.rows.len() != index.len() {
            return Err(VectorError::Persistence(format!(
                "Corrupt index: {} row fingerprints for {} rows",
                stored.rows.len(),
                index.len()
            )));
        }

        info!(path = %path.display(), rows = index.len(), "Loaded index");
        Ok((index, stored.rows))
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
