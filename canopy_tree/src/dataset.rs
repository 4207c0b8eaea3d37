// Copyright 2025 the Canopy Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Column-major point storage.

use serde::{Deserialize, Deserializer, Serialize};

use crate::TreeError;

/// A dense column-major matrix of `f64`: one column per point.
///
/// Trees refer to points by column index, so a dataset owned by a tree only
/// ever grows. Every coordinate is finite.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dataset {
    dim: usize,
    values: Vec<f64>,
}

impl Dataset {
    /// An empty dataset of the given dimensionality.
    pub fn new(dim: usize) -> Result<Self, TreeError> {
        if dim == 0 {
            return Err(TreeError::ZeroDimension);
        }
        Ok(Self {
            dim,
            values: Vec::new(),
        })
    }

    /// A dataset from raw column-major values.
    pub fn from_columns(dim: usize, values: Vec<f64>) -> Result<Self, TreeError> {
        let dataset = Self { dim, values };
        dataset.validate()?;
        Ok(dataset)
    }

    /// A dataset with one column per point; every point must have the same
    /// positive number of coordinates.
    pub fn from_points<P: AsRef<[f64]>>(points: &[P]) -> Result<Self, TreeError> {
        let dim = points.first().map_or(0, |p| p.as_ref().len());
        let mut out = Self::new(dim)?;
        out.values.reserve(dim * points.len());
        for p in points {
            out.push(p.as_ref())?;
        }
        Ok(out)
    }

    /// Number of coordinates per point.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of points (columns).
    pub fn len(&self) -> usize {
        self.values.len() / self.dim
    }

    /// Returns true if the dataset holds no points.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Coordinates of point `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn col(&self, index: usize) -> &[f64] {
        let start = index * self.dim;
        &self.values[start..start + self.dim]
    }

    /// Coordinates of point `index`, or `None` if out of range.
    pub fn get(&self, index: usize) -> Option<&[f64]> {
        (index < self.len()).then(|| self.col(index))
    }

    /// Iterate over all columns in order.
    pub fn columns(&self) -> impl ExactSizeIterator<Item = &[f64]> + '_ {
        self.values.chunks_exact(self.dim)
    }

    /// Overwrite point `index`.
    pub fn set_col(&mut self, index: usize, coords: &[f64]) -> Result<(), TreeError> {
        self.check_point(index, coords)?;
        let len = self.len();
        if index >= len {
            return Err(TreeError::IndexOutOfBounds { index, len });
        }
        let start = index * self.dim;
        self.values[start..start + self.dim].copy_from_slice(coords);
        Ok(())
    }

    /// Append a point and return its index.
    pub fn push(&mut self, coords: &[f64]) -> Result<usize, TreeError> {
        self.check_point(self.len(), coords)?;
        self.values.extend_from_slice(coords);
        Ok(self.len() - 1)
    }

    /// Grow or shrink to `len` points; new points are at the origin.
    pub fn resize(&mut self, len: usize) {
        self.values.resize(len * self.dim, 0.0);
    }

    /// Shape and finiteness check shared by every way of building a dataset.
    pub(crate) fn validate(&self) -> Result<(), TreeError> {
        if self.dim == 0 {
            return Err(TreeError::ZeroDimension);
        }
        if self.values.len() % self.dim != 0 {
            return Err(TreeError::DimensionMismatch {
                expected: self.dim,
                found: self.values.len() % self.dim,
            });
        }
        match self.values.iter().position(|v| !v.is_finite()) {
            Some(pos) => Err(TreeError::NonFiniteCoordinate {
                index: pos / self.dim,
                axis: pos % self.dim,
            }),
            None => Ok(()),
        }
    }

    /// Check a point about to be stored as column `index`.
    fn check_point(&self, index: usize, coords: &[f64]) -> Result<(), TreeError> {
        if coords.len() != self.dim {
            return Err(TreeError::DimensionMismatch {
                expected: self.dim,
                found: coords.len(),
            });
        }
        match coords.iter().position(|v| !v.is_finite()) {
            Some(axis) => Err(TreeError::NonFiniteCoordinate { index, axis }),
            None => Ok(()),
        }
    }
}

impl<'de> Deserialize<'de> for Dataset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            dim: usize,
            values: Vec<f64>,
        }

        let Raw { dim, values } = Raw::deserialize(deserializer)?;
        Self::from_columns(dim, values).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn points_become_columns() {
        let d = Dataset::from_points(&[[0.0, 1.0], [2.0, 3.0], [4.0, 5.0]]).unwrap();
        assert_eq!(d.dim(), 2);
        assert_eq!(d.len(), 3);
        assert_eq!(d.col(1), &[2.0, 3.0]);
        assert_eq!(d.get(3), None);
        let cols: Vec<_> = d.columns().collect();
        assert_eq!(cols, vec![&[0.0, 1.0][..], &[2.0, 3.0][..], &[4.0, 5.0][..]]);
    }

    #[test]
    fn rejects_bad_shapes() {
        assert_eq!(Dataset::new(0), Err(TreeError::ZeroDimension));
        let empty: [[f64; 2]; 0] = [];
        assert_eq!(Dataset::from_points(&empty), Err(TreeError::ZeroDimension));
        assert_eq!(
            Dataset::from_points(&[vec![0.0, 1.0], vec![2.0]]),
            Err(TreeError::DimensionMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(Dataset::from_columns(3, vec![0.0; 7]).is_err());
    }

    #[test]
    fn grows_and_overwrites() {
        let mut d = Dataset::new(2).unwrap();
        assert!(d.is_empty());
        assert_eq!(d.push(&[1.0, 1.0]), Ok(0));
        assert_eq!(d.push(&[2.0, 2.0]), Ok(1));
        d.set_col(0, &[5.0, 6.0]).unwrap();
        assert_eq!(d.col(0), &[5.0, 6.0]);
        assert_eq!(
            d.set_col(4, &[0.0, 0.0]),
            Err(TreeError::IndexOutOfBounds { index: 4, len: 2 })
        );
        d.resize(4);
        assert_eq!(d.len(), 4);
        assert_eq!(d.col(3), &[0.0, 0.0]);
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let mut d = Dataset::from_points(&[[0.0, 1.0]]).unwrap();
        assert_eq!(
            d.push(&[f64::NAN, 0.5]),
            Err(TreeError::NonFiniteCoordinate { index: 1, axis: 0 })
        );
        assert_eq!(
            d.set_col(0, &[0.0, f64::INFINITY]),
            Err(TreeError::NonFiniteCoordinate { index: 0, axis: 1 })
        );
        assert_eq!(d.len(), 1);
        assert_eq!(d.col(0), &[0.0, 1.0]);
        assert_eq!(
            Dataset::from_columns(2, vec![0.0, 1.0, 2.0, f64::NEG_INFINITY]),
            Err(TreeError::NonFiniteCoordinate { index: 1, axis: 1 })
        );
        assert_eq!(
            Dataset::from_points(&[[0.0], [f64::NAN]]),
            Err(TreeError::NonFiniteCoordinate { index: 1, axis: 0 })
        );
    }

    #[test]
    fn deserialization_applies_constructor_checks() {
        let err = serde_json::from_str::<Dataset>(r#"{ "dim": 0, "values": [] }"#).unwrap_err();
        assert!(err.to_string().contains("dimensionality must be positive"), "{err}");
        let err =
            serde_json::from_str::<Dataset>(r#"{ "dim": 2, "values": [1.0, 2.0, 3.0] }"#)
                .unwrap_err();
        assert!(err.to_string().contains("expected 2 coordinates"), "{err}");
        let d: Dataset = serde_json::from_str(r#"{ "dim": 2, "values": [1.0, 2.0] }"#).unwrap();
        assert_eq!(d.col(0), &[1.0, 2.0]);
    }

    #[test]
    fn json_round_trip_is_bit_exact() {
        let values: Vec<f64> = (1..=600_u32)
            .map(|i| f64::from(i).sqrt().fract() + f64::from(i) * 1e-3)
            .chain([0.915_464_128_025_657_9, 1e-300, -7.25e12])
            .collect();
        let d = Dataset::from_columns(3, values).unwrap();
        let json = serde_json::to_string(&d).unwrap();
        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back.dim(), d.dim());
        let bits = |d: &Dataset| -> Vec<u64> {
            d.columns().flatten().map(|v| v.to_bits()).collect()
        };
        assert_eq!(bits(&back), bits(&d));
    }
}
