use crate::core::error::ModelError;
use nalgebra::Vector3;
use std::fmt;

/// A rectangular finite-difference mesh: the region between two corner
/// points, split into `n` cells along each axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    p1: Vector3<f64>,
    p2: Vector3<f64>,
    n: [usize; 3],
}

impl Mesh {
    /// Creates a mesh over the region spanned by `p1` and `p2`.
    ///
    /// # Errors
    ///
    /// Returns an error if the region is degenerate along any axis or a cell
    /// count is zero.
    pub fn new(
        p1: impl Into<Vector3<f64>>,
        p2: impl Into<Vector3<f64>>,
        n: [usize; 3],
    ) -> Result<Self, ModelError> {
        let p1 = p1.into();
        let p2 = p2.into();
        for axis in 0..3 {
            if p2[axis] - p1[axis] <= 0.0 {
                return Err(ModelError::InvalidValue {
                    kind: "Mesh",
                    attribute: "p2",
                    reason: format!(
                        "region extent must be positive along every axis, got {:?} along axis {axis}",
                        p2[axis] - p1[axis]
                    ),
                });
            }
            if n[axis] == 0 {
                return Err(ModelError::InvalidValue {
                    kind: "Mesh",
                    attribute: "n",
                    reason: format!("cell count must be at least 1 along axis {axis}"),
                });
            }
        }
        Ok(Self { p1, p2, n })
    }

    pub fn p1(&self) -> Vector3<f64> {
        self.p1
    }

    pub fn p2(&self) -> Vector3<f64> {
        self.p2
    }

    pub fn n(&self) -> [usize; 3] {
        self.n
    }

    pub fn cell_count(&self) -> usize {
        self.n[0] * self.n[1] * self.n[2]
    }

    /// Edge lengths of a single cell.
    pub fn cell_size(&self) -> Vector3<f64> {
        Vector3::new(
            (self.p2.x - self.p1.x) / self.n[0] as f64,
            (self.p2.y - self.p1.y) / self.n[1] as f64,
            (self.p2.z - self.p1.z) / self.n[2] as f64,
        )
    }
}

/// A 3-vector field over the cells of a [`Mesh`], ordered x-fastest.
///
/// This is the magnetization value type drivers read and write; the modeling
/// layer itself never interprets the values.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    mesh: Mesh,
    values: Vec<Vector3<f64>>,
}

impl Field {
    /// A spatially uniform field.
    pub fn uniform(mesh: Mesh, value: impl Into<Vector3<f64>>) -> Self {
        let value = value.into();
        let values = vec![value; mesh.cell_count()];
        Self { mesh, values }
    }

    /// A spatially uniform field whose vectors are rescaled to magnitude
    /// `norm`.
    ///
    /// # Errors
    ///
    /// Returns an error if `norm` is not positive or `value` has zero
    /// magnitude.
    pub fn uniform_with_norm(
        mesh: Mesh,
        value: impl Into<Vector3<f64>>,
        norm: f64,
    ) -> Result<Self, ModelError> {
        if norm <= 0.0 {
            return Err(ModelError::InvalidValue {
                kind: "Field",
                attribute: "norm",
                reason: format!("must be positive, got {norm:?}"),
            });
        }
        let value = value.into();
        let magnitude = value.norm();
        if magnitude == 0.0 {
            return Err(ModelError::InvalidValue {
                kind: "Field",
                attribute: "value",
                reason: "cannot rescale a zero vector to a finite norm".to_string(),
            });
        }
        Ok(Self::uniform(mesh, value * (norm / magnitude)))
    }

    /// A field from explicit per-cell values, x-fastest.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of values does not match the mesh cell
    /// count.
    pub fn from_values(mesh: Mesh, values: Vec<Vector3<f64>>) -> Result<Self, ModelError> {
        if values.len() != mesh.cell_count() {
            return Err(ModelError::InvalidValue {
                kind: "Field",
                attribute: "values",
                reason: format!(
                    "expected {} values for the mesh, got {}",
                    mesh.cell_count(),
                    values.len()
                ),
            });
        }
        Ok(Self { mesh, values })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn values(&self) -> &[Vector3<f64>] {
        &self.values
    }

    /// Elementwise scaling; returns a new field.
    pub fn scaled(&self, factor: f64) -> Field {
        Field {
            mesh: self.mesh.clone(),
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    /// Mean vector over all cells.
    pub fn mean(&self) -> Vector3<f64> {
        let sum: Vector3<f64> = self.values.iter().copied().sum();
        sum / self.values.len() as f64
    }

    /// Componentwise approximate equality on the same mesh.
    pub fn allclose(&self, other: &Field, tolerance: f64) -> bool {
        self.mesh == other.mesh
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|(a, b)| (a - b).abs().max() <= tolerance)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [nx, ny, nz] = self.mesh.n;
        write!(f, "Field({nx}x{ny}x{nz})")
    }
}
