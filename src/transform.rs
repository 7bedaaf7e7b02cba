//! Rigid transformation matrices.
//!
//! A [`TransformationMatrix`] is a validated 4x4 homogeneous transform
//! received from the host, typically as the result of an alignment. The
//! rotation block must be orthonormal up to a uniform scale.
use crate::error::LinkError;
use crate::payload::Matrix;

const ORTHONORMALITY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct TransformationMatrix {
    data: [[f64; 4]; 4],
}

impl TransformationMatrix {
    /// Validate a 4x4 host matrix as a rigid transform.
    pub fn from_matrix(src: &Matrix) -> Result<Self, LinkError> {
        if src.rows() != 4 || src.cols() != 4 {
            return Err(LinkError::InvalidTransform(format!(
                "expected a 4x4 matrix, got {}x{}",
                src.rows(),
                src.cols()
            )));
        }

        let mut data = [[0.0; 4]; 4];
        for (r, row) in data.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = src.at(r, c);
            }
        }
        let transform = Self { data };

        // R^T * R must be the identity once scale is divided out.
        let rotation = transform.rotation_matrix();
        let mut deviation: f64 = 0.0;
        for i in 0..3 {
            for j in 0..3 {
                let mut dot = 0.0;
                for k in 0..3 {
                    dot += rotation[k][i] * rotation[k][j];
                }
                let expected = if i == j { 1.0 } else { 0.0 };
                deviation += (dot - expected) * (dot - expected);
            }
        }
        if deviation.sqrt() > ORTHONORMALITY_TOLERANCE {
            return Err(LinkError::InvalidTransform(
                "rotation block is not orthonormal".to_string(),
            ));
        }

        Ok(transform)
    }

    /// Uniform scale factor, taken from the first column of the rotation
    /// block.
    pub fn scale(&self) -> f64 {
        let r = &self.data;
        (r[0][0] * r[0][0] + r[1][0] * r[1][0] + r[2][0] * r[2][0]).sqrt()
    }

    /// Translation component.
    pub fn shift(&self) -> (f64, f64, f64) {
        (self.data[0][3], self.data[1][3], self.data[2][3])
    }

    /// The 3x3 rotation block with scale divided out.
    pub fn rotation_matrix(&self) -> [[f64; 3]; 3] {
        let s = 1.0 / self.scale();
        let mut rotation = [[0.0; 3]; 3];
        for (r, row) in rotation.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                *cell = self.data[r][c] * s;
            }
        }
        rotation
    }

    /// Euler angles (x, y, z) of the rotation block, in radians.
    pub fn euler_angles(&self) -> (f64, f64, f64) {
        let r = self.rotation_matrix();
        let sy = (r[0][0] * r[0][0] + r[1][0] * r[1][0]).sqrt();

        if sy < 1e-6 {
            // Gimbal lock; z is unrecoverable and reported as zero.
            (
                (-r[1][2]).atan2(r[1][1]),
                (-r[2][0]).atan2(sy),
                0.0,
            )
        } else {
            (
                r[2][1].atan2(r[2][2]),
                (-r[2][0]).atan2(sy),
                r[1][0].atan2(r[0][0]),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn matrix(values: [[f64; 4]; 4]) -> Matrix {
        Matrix::new(4, 4, values.into_iter().flatten().collect()).unwrap()
    }

    fn rotation_z(angle: f64, shift: (f64, f64, f64)) -> Matrix {
        let (s, c) = angle.sin_cos();
        matrix([
            [c, -s, 0.0, shift.0],
            [s, c, 0.0, shift.1],
            [0.0, 0.0, 1.0, shift.2],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    #[test]
    fn accepts_identity() {
        let t = TransformationMatrix::from_matrix(&rotation_z(0.0, (0.0, 0.0, 0.0))).unwrap();
        assert_eq!(t.scale(), 1.0);
        assert_eq!(t.shift(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn rejects_wrong_shape() {
        let m = Matrix::zeros(3, 3);
        assert!(matches!(
            TransformationMatrix::from_matrix(&m),
            Err(LinkError::InvalidTransform(_))
        ));
    }

    #[test]
    fn rejects_non_orthonormal_rotation() {
        let m = matrix([
            [1.0, 0.5, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]);
        assert!(TransformationMatrix::from_matrix(&m).is_err());
    }

    #[test]
    fn extracts_shift_and_euler_z() {
        let t =
            TransformationMatrix::from_matrix(&rotation_z(FRAC_PI_2, (10.0, -5.0, 2.5))).unwrap();

        assert_eq!(t.shift(), (10.0, -5.0, 2.5));
        let (x, y, z) = t.euler_angles();
        assert!(x.abs() < 1e-9);
        assert!(y.abs() < 1e-9);
        assert!((z - FRAC_PI_2).abs() < 1e-9);
    }

    #[test]
    fn scaled_rotation_is_still_rigid() {
        let values = [
            [0.0, -2.0, 0.0, 0.0],
            [2.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 2.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        let t = TransformationMatrix::from_matrix(&matrix(values)).unwrap();
        assert!((t.scale() - 2.0).abs() < 1e-12);
    }
}
