use ndarray::Array2;
use num_traits::Float;

/// Render a matrix as a MATLAB/Octave literal, e.g. `[1, 2; 3, 4]`
///
///     use ndarray::arr2;
///     use exemplar::to_matlab;
///
///     assert_eq!(to_matlab(&arr2(&[[1., -2.5], [0., 4.]])), "[1, -2.5; 0, 4]");
pub fn to_matlab<F>(matrix: &Array2<F>) -> String
where
    F: Float,
{
    let rows: Vec<String> = matrix
        .rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|v| v.to_f64().unwrap_or(f64::NAN).to_string())
                .collect::<Vec<String>>()
                .join(", ")
        })
        .collect();
    format!("[{}]", rows.join("; "))
}

#[cfg(test)]
mod test {
    use ndarray::{arr2, Array2};

    use crate::to_matlab;

    #[test]
    fn matlab_literal() {
        let m = arr2(&[[0.25_f32, -1.], [3., 0.5], [-7., 8.]]);
        assert_eq!(to_matlab(&m), "[0.25, -1; 3, 0.5; -7, 8]");
    }

    #[test]
    fn empty_matrix() {
        let m: Array2<f64> = Array2::zeros((0, 0));
        assert_eq!(to_matlab(&m), "[]");
    }
}
