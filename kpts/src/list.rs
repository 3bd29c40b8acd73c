use crate::{KptsError, KPTS};
use vector3::*;

/// Explicit k-points with (normalized) weights.
pub struct KptsList {
    k_frac: Vec<Vector3f64>,
    k_weight: Vec<f64>,
}

impl KptsList {
    pub fn new(points: &[[f64; 3]], weights: Option<&[f64]>) -> Result<KptsList, KptsError> {
        let nk = points.len();

        if nk == 0 {
            return Err(KptsError::Empty);
        }

        let raw = match weights {
            Some(w) if w.len() != nk => {
                return Err(KptsError::WeightsLengthMismatch {
                    points: nk,
                    weights: w.len(),
                })
            }
            Some(w) => w.to_vec(),
            None => vec![1.0; nk],
        };

        if let Some(k_index) = raw.iter().position(|w| !(w.is_finite() && *w >= 0.0)) {
            return Err(KptsError::InvalidWeight {
                k_index,
                weight: raw[k_index],
            });
        }

        let total: f64 = raw.iter().sum();

        if total <= 0.0 {
            return Err(KptsError::ZeroWeightSum);
        }

        Ok(KptsList {
            k_frac: points.iter().map(|p| Vector3f64::from_array(*p)).collect(),
            k_weight: raw.iter().map(|w| w / total).collect(),
        })
    }
}

impl KPTS for KptsList {
    fn get_k_frac(&self, k_index: usize) -> Vector3f64 {
        self.k_frac[k_index]
    }

    fn get_k_weight(&self, k_index: usize) -> f64 {
        self.k_weight[k_index]
    }

    fn get_n_kpts(&self) -> usize {
        self.k_frac.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_weights_are_normalized() {
        let third = 1.0 / 3.0;
        let kpts = KptsList::new(
            &[[0.0, 0.0, 0.0], [third, 0.0, 0.0], [third, third, 0.0], [-third, third, 0.0]],
            Some(&[1.0, 8.0, 6.0, 12.0]),
        )
        .unwrap();

        assert_eq!(kpts.get_n_kpts(), 4);
        assert_abs_diff_eq!(kpts.get_k_weight(1), 8.0 / 27.0, epsilon = 1e-15);
        assert_abs_diff_eq!(kpts.get_k_weights().iter().sum::<f64>(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn test_invalid_lists() {
        assert_eq!(KptsList::new(&[], None).err(), Some(KptsError::Empty));

        assert_eq!(
            KptsList::new(&[[0.0; 3]], Some(&[1.0, 2.0])).err(),
            Some(KptsError::WeightsLengthMismatch { points: 1, weights: 2 })
        );

        assert_eq!(
            KptsList::new(&[[0.0; 3], [0.5, 0.0, 0.0]], Some(&[1.0, -1.0])).err(),
            Some(KptsError::InvalidWeight { k_index: 1, weight: -1.0 })
        );

        assert_eq!(KptsList::new(&[[0.0; 3]], Some(&[0.0])).err(), Some(KptsError::ZeroWeightSum));
    }
}
