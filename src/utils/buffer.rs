use rustfft::num_complex::Complex;
use rustfft::num_traits::Zero;

use crate::float::Float;

pub fn new_real_buffer<T: Float>(size: usize) -> Vec<T> {
    vec![T::zero(); size]
}

pub fn new_complex_buffer<T: Float>(size: usize) -> Vec<Complex<T>> {
    vec![Complex::zero(); size]
}

/// Copy `input` into the real part of `output`, zero-padding the remainder.
pub fn copy_real_to_complex<T: Float>(input: &[T], output: &mut [Complex<T>]) {
    assert!(input.len() <= output.len());
    input.iter().zip(output.iter_mut()).for_each(|(i, o)| {
        o.re = *i;
        o.im = T::zero();
    });
    output[input.len()..]
        .iter_mut()
        .for_each(|o| *o = Complex::zero())
}

/// Copy the real part of `input` into `output`, zero-padding the remainder.
pub fn copy_complex_to_real<T: Float>(input: &[Complex<T>], output: &mut [T]) {
    let n = input.len().min(output.len());
    input[..n]
        .iter()
        .zip(output.iter_mut())
        .for_each(|(i, o)| *o = i.re);
    output[n..].iter_mut().for_each(|o| *o = T::zero());
}

/// Compute the sum of the square of each element of `arr`.
pub fn square_sum<T: Float>(arr: &[T]) -> T {
    arr.iter().map(|&s| s * s).sum::<T>()
}

/// Root mean square of `arr`; zero for an empty slice.
///
/// This is the block amplitude the tracker gates on when the capture side
/// does not supply one.
pub fn rms<T: Float>(arr: &[T]) -> T {
    if arr.is_empty() {
        return T::zero();
    }
    (square_sum(arr) / T::from_len(arr.len())).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_of_square_wave_is_amplitude() {
        let signal: Vec<f64> = (0..64).map(|i| if i % 2 == 0 { 0.5 } else { -0.5 }).collect();
        assert!((rms(&signal) - 0.5).abs() < 1e-12);
        assert_eq!(rms::<f32>(&[]), 0.0);
    }

    #[test]
    fn complex_round_trip_truncates_and_pads() {
        let signal: Vec<f64> = vec![1., 2., 3.];
        let mut complex = new_complex_buffer(4);
        copy_real_to_complex(&signal, &mut complex);
        assert_eq!(complex[3], Complex::zero());

        let mut real = vec![9.; 5];
        copy_complex_to_real(&complex[..2], &mut real);
        assert_eq!(real, vec![1., 2., 0., 0., 0.]);
    }
}
