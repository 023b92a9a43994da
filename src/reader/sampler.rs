use super::perspective::Homography;
use crate::{
    bitmatrix::BitMatrix,
    error::{Error, ScanResult},
};

// Grid sampling
//------------------------------------------------------------------------------

/// Reads one nearest-neighbour pixel per module center through the
/// homography. A sample outside the image rejects the candidate with
/// `Format`.
pub fn sample_grid(bits: &BitMatrix, h: &Homography, dim: usize) -> ScanResult<BitMatrix> {
    let (w, ht) = (bits.width() as f64, bits.height() as f64);
    let mut out = BitMatrix::square(dim);

    for y in 0..dim {
        for x in 0..dim {
            let p = h.map(x as f64 + 0.5, y as f64 + 0.5);
            if !(0.0..w).contains(&p.x) || !(0.0..ht).contains(&p.y) {
                return Err(Error::Format("sample point outside image"));
            }
            if bits.get(p.x as usize, p.y as usize) {
                out.set(x, y);
            }
        }
    }
    Ok(out)
}
