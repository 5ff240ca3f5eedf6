use std::collections::BTreeMap;

use faer::Mat;

use crate::types::DmdError;

/// In-process producer of snapshot matrices.
///
/// Implementations turn stored simulation or measurement output into dense
/// matrices whose columns are the snapshots at the requested write times.
/// This crate performs no file I/O; loaders that read mesh-oriented output
/// formats live behind this contract.
pub trait Dataloader {
    /// Available time labels, ascending.
    fn write_times(&self) -> &[String];

    /// Field names available at each write time.
    fn field_names(&self) -> BTreeMap<String, Vec<String>>;

    /// Load one field at the given write times.
    ///
    /// Columns follow the order of `times`; result shape is
    /// rows × `times.len()`.
    fn load_snapshot(&self, field_name: &str, times: &[String]) -> Result<Mat<f64>, DmdError>;

    /// Load several fields at the given write times, one matrix per field.
    fn load_snapshots(
        &self,
        field_names: &[String],
        times: &[String],
    ) -> Result<Vec<Mat<f64>>, DmdError> {
        field_names
            .iter()
            .map(|name| self.load_snapshot(name, times))
            .collect()
    }

    /// Vertex positions of the underlying mesh.
    fn vertices(&self) -> Result<Mat<f64>, DmdError>;

    /// Quadrature weights per degree of freedom.
    fn weights(&self) -> Result<Vec<f64>, DmdError> {
        Err(DmdError::NotImplemented(
            "The weights property is not yet implemented.".to_string(),
        ))
    }
}

/// Dataloader over matrices already in memory; one matrix per field, one
/// column per write time. Mainly used in tests and examples.
#[derive(Debug, Clone)]
pub struct InMemoryDataloader {
    write_times: Vec<String>,
    fields: BTreeMap<String, Mat<f64>>,
    vertices: Option<Mat<f64>>,
}

impl InMemoryDataloader {
    /// Create a loader from field matrices.
    ///
    /// Every matrix must have one column per write time.
    pub fn new(
        write_times: Vec<String>,
        fields: BTreeMap<String, Mat<f64>>,
    ) -> Result<Self, DmdError> {
        for (name, matrix) in &fields {
            if matrix.ncols() != write_times.len() {
                return Err(DmdError::Validation(format!(
                    "field '{name}' has {} columns, expected one per write time ({})",
                    matrix.ncols(),
                    write_times.len()
                )));
            }
        }
        Ok(Self {
            write_times,
            fields,
            vertices: None,
        })
    }

    /// Attach vertex positions.
    pub fn with_vertices(mut self, vertices: Mat<f64>) -> Self {
        self.vertices = Some(vertices);
        self
    }
}

impl Dataloader for InMemoryDataloader {
    fn write_times(&self) -> &[String] {
        &self.write_times
    }

    fn field_names(&self) -> BTreeMap<String, Vec<String>> {
        let names: Vec<String> = self.fields.keys().cloned().collect();
        self.write_times
            .first()
            .map(|t| BTreeMap::from([(t.clone(), names)]))
            .unwrap_or_default()
    }

    fn load_snapshot(&self, field_name: &str, times: &[String]) -> Result<Mat<f64>, DmdError> {
        let matrix = self
            .fields
            .get(field_name)
            .ok_or_else(|| DmdError::Validation(format!("unknown field '{field_name}'")))?;

        let mut out = Mat::<f64>::zeros(matrix.nrows(), times.len());
        for (col, time) in times.iter().enumerate() {
            let idx = self
                .write_times
                .iter()
                .position(|t| t == time)
                .ok_or_else(|| DmdError::Validation(format!("unknown write time '{time}'")))?;
            for i in 0..matrix.nrows() {
                out[(i, col)] = matrix[(i, idx)];
            }
        }
        Ok(out)
    }

    fn vertices(&self) -> Result<Mat<f64>, DmdError> {
        self.vertices.clone().ok_or_else(|| {
            DmdError::NotImplemented("no vertex positions attached to this loader".to_string())
        })
    }
}
