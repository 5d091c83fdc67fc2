use crate::ValidationError;
use serde::Deserialize;
use serde::Serialize;

/// Dense row-major array of reals with an explicit shape.
///
/// This is the exchange format for per-state payoff arrays
/// (`[N, |A_0|, …, |A_{N-1}|]`) and transition arrays
/// (`[|A_0|, …, |A_{N-1}|, S]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Tensor {
    pub fn new(shape: Vec<usize>, data: Vec<f64>) -> Result<Self, ValidationError> {
        let tensor = Self { shape, data };
        tensor.check()?;
        Ok(tensor)
    }
    /// Filled with a constant.
    pub fn full(shape: Vec<usize>, value: f64) -> Self {
        let size = shape.iter().product();
        Self {
            shape,
            data: vec![value; size],
        }
    }
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }
    pub fn data(&self) -> &[f64] {
        &self.data
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
    /// Deserialized tensors skip the constructor, so the
    /// game constructor re-checks them through here.
    pub(crate) fn check(&self) -> Result<(), ValidationError> {
        if self.shape.iter().product::<usize>() != self.data.len() {
            Err(ValidationError::TensorSize {
                shape: self.shape.clone(),
                found: self.data.len(),
            })
        } else if self.data.iter().any(|x| !x.is_finite()) {
            Err(ValidationError::NonFinite { what: "tensor" })
        } else {
            Ok(())
        }
    }
}

impl std::ops::Index<&[usize]> for Tensor {
    type Output = f64;
    fn index(&self, index: &[usize]) -> &f64 {
        let flat = index
            .iter()
            .zip(self.shape.iter())
            .fold(0, |acc, (i, n)| acc * n + i);
        &self.data[flat]
    }
}
