//! Generic numeric matrix payload.
//!
//! Two wire forms exist. Standalone matrix payloads use a flat form,
//! `{"rows": r, "cols": c, "data": [..]}` with row-major data. Matrices
//! embedded in the comparison-statistics payload use a nested form where
//! each row is an object keyed `value0`, `value1` and so on, the host's
//! legacy tuple serialization.
use serde::Deserialize;
use serde_json::Value as Json;

use crate::error::LinkError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(try_from = "FlatMatrix")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct FlatMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<FlatMatrix> for Matrix {
    type Error = String;

    fn try_from(flat: FlatMatrix) -> Result<Self, Self::Error> {
        if flat.data.len() != flat.rows * flat.cols {
            return Err(format!(
                "matrix data holds {} values, expected {}x{}",
                flat.data.len(),
                flat.rows,
                flat.cols
            ));
        }
        Ok(Self {
            rows: flat.rows,
            cols: flat.cols,
            data: flat.data,
        })
    }
}

impl Matrix {
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, LinkError> {
        FlatMatrix { rows, cols, data }
            .try_into()
            .map_err(LinkError::InvalidTransform)
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Decode the nested `value{r}.value{c}` form used inside the
    /// comparison-statistics payload. Row and column counts are discovered
    /// by walking the keys; missing cells read as zero.
    pub fn from_nested(json: &Json) -> Result<Self, LinkError> {
        let obj = json
            .as_object()
            .ok_or_else(|| invalid("nested matrix is not an object"))?;

        let mut rows = 0;
        while obj.contains_key(&format!("value{rows}")) {
            rows += 1;
        }
        if rows == 0 {
            return Ok(Self::zeros(0, 0));
        }

        let first = obj["value0"]
            .as_object()
            .ok_or_else(|| invalid("nested matrix row is not an object"))?;
        let mut cols = 0;
        while first.contains_key(&format!("value{cols}")) {
            cols += 1;
        }

        let mut out = Self::zeros(rows, cols);
        for r in 0..rows {
            let row = obj[&format!("value{r}")]
                .as_object()
                .ok_or_else(|| invalid("nested matrix row is not an object"))?;
            for c in 0..cols {
                if let Some(cell) = row.get(&format!("value{c}")).and_then(Json::as_f64) {
                    out.data[r * cols + c] = cell;
                }
            }
        }
        Ok(out)
    }

    /// Decode a standalone `{"GMatrix": {...}}` payload.
    pub fn from_payload(json: &str) -> Result<Self, LinkError> {
        #[derive(Deserialize)]
        struct Envelope {
            #[serde(rename = "GMatrix")]
            matrix: Matrix,
        }
        let envelope: Envelope = serde_json::from_str(json)?;
        Ok(envelope.matrix)
    }
}

fn invalid(msg: &str) -> LinkError {
    LinkError::InvalidTransform(msg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_payload_reshapes_row_major() {
        let m = Matrix::from_payload(
            r#"{"GMatrix": {"rows": 2, "cols": 3, "data": [1, 2, 3, 4, 5, 6]}}"#,
        )
        .unwrap();

        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert_eq!(m.at(0, 2), 3.0);
        assert_eq!(m.at(1, 0), 4.0);
    }

    #[test]
    fn flat_payload_with_wrong_length_is_rejected() {
        let res = Matrix::from_payload(r#"{"GMatrix": {"rows": 2, "cols": 2, "data": [1.0]}}"#);
        assert!(res.is_err());
    }

    #[test]
    fn nested_form_walks_value_keys() {
        let json: Json = serde_json::from_str(
            r#"{
                "value0": {"value0": 1.0, "value1": 2.0},
                "value1": {"value0": 3.0, "value1": 4.0}
            }"#,
        )
        .unwrap();
        let m = Matrix::from_nested(&json).unwrap();

        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 2);
        assert_eq!(m.at(1, 0), 3.0);
    }

    #[test]
    fn empty_nested_form_is_zero_by_zero() {
        let json: Json = serde_json::from_str("{}").unwrap();
        let m = Matrix::from_nested(&json).unwrap();
        assert_eq!(m.rows(), 0);
        assert_eq!(m.cols(), 0);
    }
}
