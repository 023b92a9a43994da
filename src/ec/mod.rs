pub mod galois;

use self::galois::{poly_eval, G};

use crate::error::{Error, ScanResult};

// Reed-Solomon block correction
//------------------------------------------------------------------------------

/// One de-interleaved unit of data plus error-correction codewords.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    codewords: Vec<u8>,
    data_len: usize,
}

impl Block {
    pub fn with_encoded(codewords: &[u8], data_len: usize) -> Self {
        debug_assert!(data_len <= codewords.len(), "Data longer than block");
        Self { codewords: codewords.to_vec(), data_len }
    }

    pub fn ec_len(&self) -> usize {
        self.codewords.len() - self.data_len
    }

    /// Corrects the block in place and returns the data codewords.
    pub fn rectify(&mut self) -> ScanResult<&[u8]> {
        let ec_len = self.ec_len();
        correct_errors(&mut self.codewords, ec_len)?;
        Ok(&self.codewords[..self.data_len])
    }
}

/// Corrects up to `ec_len / 2` byte errors in `codewords` (data followed by
/// EC, first byte being the highest-order coefficient). The generator roots
/// start at alpha^0 per ISO 18004.
pub fn correct_errors(codewords: &mut [u8], ec_len: usize) -> ScanResult<()> {
    let n = codewords.len();
    debug_assert!(ec_len < n, "EC codewords exceed block");

    let syndromes = compute_syndromes(codewords, ec_len);
    if syndromes.iter().all(|s| s.is_zero()) {
        return Ok(());
    }

    let locator = berlekamp_massey(&syndromes)?;
    let degree = locator.len() - 1;
    if degree > ec_len / 2 {
        return Err(Error::Checksum("error locator degree exceeds capacity"));
    }

    let positions = chien_search(&locator, n);
    if positions.len() != degree {
        return Err(Error::Checksum("error locator roots don't match degree"));
    }

    let magnitudes = forney(&locator, &syndromes, &positions, n);
    for (&p, &m) in positions.iter().zip(magnitudes.iter()) {
        codewords[p] ^= m.0;
    }

    // The corrected word must be a codeword again.
    let check = compute_syndromes(codewords, ec_len);
    if check.iter().any(|s| !s.is_zero()) {
        return Err(Error::Checksum("correction did not converge"));
    }
    Ok(())
}

fn compute_syndromes(codewords: &[u8], ec_len: usize) -> Vec<G> {
    (0..ec_len)
        .map(|i| {
            let x = G::gen_pow(i);
            let mut acc = G::ZERO;
            for &c in codewords {
                acc = acc * x + G(c);
            }
            acc
        })
        .collect()
}

// Iteratively builds the error locator polynomial (ascending powers,
// constant term 1) from the syndromes.
fn berlekamp_massey(syndromes: &[G]) -> ScanResult<Vec<G>> {
    let mut locator = vec![G::ONE];
    let mut prev = vec![G::ONE];
    let mut l = 0usize;
    let mut m = 1usize;
    let mut b = G::ONE;

    for (n, &sn) in syndromes.iter().enumerate() {
        let mut delta = sn;
        for i in 1..=l.min(locator.len() - 1) {
            delta += locator[i] * syndromes[n - i];
        }

        if delta.is_zero() {
            m += 1;
            continue;
        }

        let scale = delta / b;
        let mut next = locator.clone();
        next.resize(next.len().max(prev.len() + m), G::ZERO);
        for (i, &p) in prev.iter().enumerate() {
            next[i + m] += scale * p;
        }

        if 2 * l <= n {
            prev = locator;
            b = delta;
            l = n + 1 - l;
            m = 1;
        } else {
            m += 1;
        }
        locator = next;
    }

    while locator.len() > 1 && locator.last() == Some(&G::ZERO) {
        locator.pop();
    }
    if locator.len() - 1 > l {
        return Err(Error::Checksum("error locator is inconsistent"));
    }
    Ok(locator)
}

// Trial evaluation at every codeword position; returns indices whose
// locator value vanishes.
fn chien_search(locator: &[G], n: usize) -> Vec<usize> {
    let mut positions = Vec::with_capacity(locator.len() - 1);
    for p in 0..n {
        let x_inv = G::gen_pow(255 - (n - 1 - p) % 255);
        if poly_eval(locator, x_inv).is_zero() {
            positions.push(p);
        }
    }
    positions
}

fn forney(locator: &[G], syndromes: &[G], positions: &[usize], n: usize) -> Vec<G> {
    // Omega(x) = S(x) * Lambda(x) mod x^ec_len
    let mut omega = vec![G::ZERO; syndromes.len()];
    for (i, om) in omega.iter_mut().enumerate() {
        for (j, &lc) in locator.iter().enumerate().take(i + 1) {
            *om += lc * syndromes[i - j];
        }
    }

    // Formal derivative keeps the odd-power terms only.
    let derivative: Vec<G> =
        locator.iter().enumerate().skip(1).step_by(2).map(|(_, &c)| c).collect();
    let derivative_at = |x: G| {
        let mut acc = G::ZERO;
        let x_sq = x * x;
        let mut pow = G::ONE;
        for &c in &derivative {
            acc += c * pow;
            pow *= x_sq;
        }
        acc
    };

    positions
        .iter()
        .map(|&p| {
            let x = G::gen_pow((n - 1 - p) % 255);
            let x_inv = x.inv();
            x * poly_eval(&omega, x_inv) / derivative_at(x_inv)
        })
        .collect()
}

// Rectifier for format and version infos
//------------------------------------------------------------------------------

/// Picks the valid codeword closest in Hamming distance, within the code's
/// correction capacity.
pub fn rectify_info(info: u32, valid_numbers: &[u32], err_capacity: u32) -> ScanResult<u32> {
    let res = *valid_numbers.iter().min_by_key(|&n| (info ^ n).count_ones()).unwrap();

    if (info ^ res).count_ones() <= err_capacity {
        Ok(res)
    } else {
        Err(Error::Format("info unrecoverable"))
    }
}
