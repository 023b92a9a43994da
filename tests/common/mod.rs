//! Reference encoder used to synthesize test inputs. Kept deliberately
//! independent of the library internals: tables are recomputed here and the
//! module placement follows the writer convention rather than the reader's.

use deqr::{BitMatrix, ECLevel, MaskPattern, Version};
use image::GrayImage;

// GF(256) scratch arithmetic
//------------------------------------------------------------------------------

fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut r = 0u8;
    while b > 0 {
        if b & 1 != 0 {
            r ^= a;
        }
        let carry = a & 0x80 != 0;
        a <<= 1;
        if carry {
            a ^= 0x1d;
        }
        b >>= 1;
    }
    r
}

fn rs_ecc(data: &[u8], ec_len: usize) -> Vec<u8> {
    // Generator polynomial prod (x - alpha^i), descending coefficients
    let mut gen = vec![1u8];
    let mut root = 1u8;
    for _ in 0..ec_len {
        let mut next = vec![0u8; gen.len() + 1];
        for (j, &g) in gen.iter().enumerate() {
            next[j] ^= g; // times x
            next[j + 1] ^= gf_mul(g, root);
        }
        gen = next;
        root = gf_mul(root, 2);
    }

    let mut rem = vec![0u8; ec_len];
    for &d in data {
        let factor = d ^ rem[0];
        rem.rotate_left(1);
        rem[ec_len - 1] = 0;
        for (r, &g) in rem.iter_mut().zip(gen[1..].iter()) {
            *r ^= gf_mul(factor, g);
        }
    }
    rem
}

// Protected info words
//------------------------------------------------------------------------------

fn bch15_5(data: u32) -> u32 {
    let mut rem = data << 10;
    for i in (10..15).rev() {
        if rem & (1 << i) != 0 {
            rem ^= 0x537 << (i - 10);
        }
    }
    (data << 10) | rem
}

fn golay18_6(data: u32) -> u32 {
    let mut rem = data << 12;
    for i in (12..18).rev() {
        if rem & (1 << i) != 0 {
            rem ^= 0x1f25 << (i - 12);
        }
    }
    (data << 12) | rem
}

// Bit assembly
//------------------------------------------------------------------------------

#[derive(Default)]
struct Bits(Vec<bool>);

impl Bits {
    fn push(&mut self, value: u32, n: usize) {
        for i in (0..n).rev() {
            self.0.push((value >> i) & 1 != 0);
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

pub enum Seg<'a> {
    Numeric(&'a str),
    Alnum(&'a str),
    Bytes(&'a [u8]),
    Eci(u32),
    StructuredAppend { index: u8, count: u8, parity: u8 },
}

const ALNUM: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

fn alnum_code(c: u8) -> u32 {
    ALNUM.iter().position(|&a| a == c).expect("not an alphanumeric character") as u32
}

fn push_numeric(bits: &mut Bits, digits: &str) {
    let bytes = digits.as_bytes();
    let mut chunks = bytes.chunks_exact(3);
    for ch in &mut chunks {
        let v = (ch[0] - b'0') as u32 * 100 + (ch[1] - b'0') as u32 * 10 + (ch[2] - b'0') as u32;
        bits.push(v, 10);
    }
    match chunks.remainder() {
        [a, b] => bits.push((a - b'0') as u32 * 10 + (b - b'0') as u32, 7),
        [a] => bits.push((a - b'0') as u32, 4),
        _ => {}
    }
}

fn push_alnum(bits: &mut Bits, text: &str) {
    let bytes = text.as_bytes();
    let mut chunks = bytes.chunks_exact(2);
    for ch in &mut chunks {
        bits.push(alnum_code(ch[0]) * 45 + alnum_code(ch[1]), 11);
    }
    if let [a] = chunks.remainder() {
        bits.push(alnum_code(*a), 6);
    }
}

fn count_bits_qr(mode: u8, v: usize) -> usize {
    let bucket = match v {
        1..=9 => 0,
        10..=26 => 1,
        _ => 2,
    };
    match mode {
        1 => [10, 12, 14][bucket],
        2 => [9, 11, 13][bucket],
        4 => [8, 16, 16][bucket],
        _ => unreachable!(),
    }
}

// QR encoder (model 2)
//------------------------------------------------------------------------------

/// Builds the logical matrix of a QR symbol carrying `segments`, with a
/// forced mask pattern.
pub fn encode_qr(segments: &[Seg], v: usize, ecl: ECLevel, mask: u8) -> BitMatrix {
    let ver = Version::Normal(v);
    let mut bits = Bits::default();

    for seg in segments {
        match seg {
            Seg::Eci(designator) => {
                assert!(*designator < 128, "only the short ECI form is emitted");
                bits.push(0b0111, 4);
                bits.push(*designator, 8);
            }
            Seg::StructuredAppend { index, count, parity } => {
                bits.push(0b0011, 4);
                bits.push(*index as u32, 4);
                bits.push(*count as u32 - 1, 4);
                bits.push(*parity as u32, 8);
            }
            Seg::Numeric(digits) => {
                bits.push(0b0001, 4);
                bits.push(digits.len() as u32, count_bits_qr(1, v));
                push_numeric(&mut bits, digits);
            }
            Seg::Alnum(text) => {
                bits.push(0b0010, 4);
                bits.push(text.len() as u32, count_bits_qr(2, v));
                push_alnum(&mut bits, text);
            }
            Seg::Bytes(data) => {
                bits.push(0b0100, 4);
                bits.push(data.len() as u32, count_bits_qr(4, v));
                for &b in *data {
                    bits.push(b as u32, 8);
                }
            }
        }
    }

    let capacity = ver.data_codewords(ecl) * 8;
    assert!(bits.len() <= capacity, "segments exceed version capacity");
    bits.push(0, 4.min(capacity - bits.len())); // terminator
    while bits.len() % 8 != 0 {
        bits.push(0, 1);
    }
    let mut pad = 0xec;
    while bits.len() < capacity {
        bits.push(pad, 8);
        pad ^= 0xec ^ 0x11;
    }

    let data: Vec<u8> = bits
        .0
        .chunks(8)
        .map(|ch| ch.iter().fold(0u8, |acc, &b| (acc << 1) | b as u8))
        .collect();

    let stream = interleave(&data, ver, ecl);
    build_qr_matrix(&stream, ver, ecl, mask)
}

fn interleave(data: &[u8], ver: Version, ecl: ECLevel) -> Vec<u8> {
    let (s1, c1, s2, c2) = ver.codewords_per_block(ecl);
    let ec_len = ver.ecc_per_block(ecl);

    let mut blocks: Vec<&[u8]> = Vec::with_capacity(c1 + c2);
    let mut off = 0;
    for _ in 0..c1 {
        blocks.push(&data[off..off + s1]);
        off += s1;
    }
    for _ in 0..c2 {
        blocks.push(&data[off..off + s2]);
        off += s2;
    }
    assert_eq!(off, data.len());
    let eccs: Vec<Vec<u8>> = blocks.iter().map(|b| rs_ecc(b, ec_len)).collect();

    let mut out = Vec::with_capacity(ver.total_codewords(ecl));
    let max_len = s1.max(s2);
    for i in 0..max_len {
        for b in &blocks {
            if i < b.len() {
                out.push(b[i]);
            }
        }
    }
    for i in 0..ec_len {
        for e in &eccs {
            out.push(e[i]);
        }
    }
    out
}

// Matrix drawing
//------------------------------------------------------------------------------

fn draw_finder_into(m: &mut BitMatrix, ox: i32, oy: i32) {
    for dy in 0..7 {
        for dx in 0..7 {
            let ring = dx == 0 || dx == 6 || dy == 0 || dy == 6;
            let stone = (2..=4).contains(&dx) && (2..=4).contains(&dy);
            if ring || stone {
                m.set((ox + dx) as usize, (oy + dy) as usize);
            }
        }
    }
}

fn is_function_qr(ver: Version, x: usize, y: usize) -> bool {
    let dim = ver.width();
    if (x <= 8 && y <= 8) || (x >= dim - 8 && y <= 8) || (x <= 8 && y >= dim - 8) {
        return true;
    }
    if x == 6 || y == 6 {
        return true;
    }
    if *ver >= 7 && ((x < 6 && y >= dim - 11) || (y < 6 && x >= dim - 11)) {
        return true;
    }
    let aps = ver.alignment_pattern();
    if let Some(&last) = aps.last() {
        let last = last as usize;
        for &cy in aps {
            for &cx in aps {
                let (cx, cy) = (cx as usize, cy as usize);
                let corner =
                    (cx == 6 && cy == 6) || (cx == 6 && cy == last) || (cx == last && cy == 6);
                if !corner && x.abs_diff(cx) <= 2 && y.abs_diff(cy) <= 2 {
                    return true;
                }
            }
        }
    }
    false
}

fn build_qr_matrix(stream: &[u8], ver: Version, ecl: ECLevel, mask: u8) -> BitMatrix {
    let dim = ver.width();
    let mut m = BitMatrix::square(dim);

    draw_finder_into(&mut m, 0, 0);
    draw_finder_into(&mut m, dim as i32 - 7, 0);
    draw_finder_into(&mut m, 0, dim as i32 - 7);
    for i in (8..dim - 8).step_by(2) {
        m.set(i, 6);
        m.set(6, i);
    }
    let aps = ver.alignment_pattern();
    if let Some(&last) = aps.last() {
        for &cy in aps {
            for &cx in aps {
                let corner = (cx == 6 && cy == 6) || (cx == 6 && cy == last) || (cx == last && cy == 6);
                if corner {
                    continue;
                }
                for dy in -2i32..=2 {
                    for dx in -2i32..=2 {
                        let edge = dx.abs() == 2 || dy.abs() == 2 || (dx == 0 && dy == 0);
                        if edge {
                            m.set((cx as i32 + dx) as usize, (cy as i32 + dy) as usize);
                        }
                    }
                }
            }
        }
    }
    m.set(8, dim - 8); // dark module

    if *ver >= 7 {
        let info = golay18_6(*ver as u32);
        for k in 0..18 {
            if (info >> k) & 1 != 0 {
                m.set(dim - 11 + k % 3, k / 3);
                m.set(k / 3, dim - 11 + k % 3);
            }
        }
    }

    let format = bch15_5(((ecl.to_bits() << 3) | mask as u32) & 0x1f) ^ 0x5412;
    draw_format_qr(&mut m, dim, format);

    // Data placement: column pairs from the right, serpentine, skipping
    // the vertical timing column
    let mask_fn = MaskPattern::new(mask).mask_function();
    let total_bits = stream.len() * 8;
    let mut i = 0usize;
    let mut right = dim as i32 - 1;
    while right >= 1 {
        if right == 6 {
            right = 5;
        }
        for vert in 0..dim as i32 {
            for j in 0..2 {
                let x = right - j;
                let upward = (right + 1) & 2 == 0;
                let y = if upward { dim as i32 - 1 - vert } else { vert };
                let (xu, yu) = (x as usize, y as usize);
                if is_function_qr(ver, xu, yu) {
                    continue;
                }
                // Remainder cells beyond the last codeword stay zero and
                // only receive the mask
                let bit = if i < total_bits {
                    let b = (stream[i >> 3] >> (7 - (i & 7))) & 1 != 0;
                    i += 1;
                    b
                } else {
                    false
                };
                if bit ^ mask_fn(y, x) {
                    m.set(xu, yu);
                }
            }
        }
        right -= 2;
    }
    assert_eq!(i, total_bits, "codewords did not fill the encoding region");

    m
}

fn draw_format_qr(m: &mut BitMatrix, dim: usize, format: u32) {
    let main: [(usize, usize); 15] = [
        (0, 8), (1, 8), (2, 8), (3, 8), (4, 8), (5, 8), (7, 8), (8, 8), (8, 7),
        (8, 5), (8, 4), (8, 3), (8, 2), (8, 1), (8, 0),
    ];
    let side: [(usize, usize); 15] = [
        (8, dim - 1), (8, dim - 2), (8, dim - 3), (8, dim - 4), (8, dim - 5), (8, dim - 6),
        (8, dim - 7), (dim - 8, 8), (dim - 7, 8), (dim - 6, 8), (dim - 5, 8), (dim - 4, 8),
        (dim - 3, 8), (dim - 2, 8), (dim - 1, 8),
    ];
    for (k, &(x, y)) in main.iter().enumerate() {
        if (format >> (14 - k)) & 1 != 0 {
            m.set(x, y);
        }
    }
    for (k, &(x, y)) in side.iter().enumerate() {
        if (format >> (14 - k)) & 1 != 0 {
            m.set(x, y);
        }
    }
}

// Micro QR encoder
//------------------------------------------------------------------------------

pub enum MicroSeg<'a> {
    Numeric(&'a str),
    Alnum(&'a str),
    Bytes(&'a [u8]),
}

fn micro_symbol_number(m: usize, ecl: ECLevel) -> u32 {
    match (m, ecl) {
        (1, ECLevel::L) => 0,
        (2, ECLevel::L) => 1,
        (2, ECLevel::M) => 2,
        (3, ECLevel::L) => 3,
        (3, ECLevel::M) => 4,
        (4, ECLevel::L) => 5,
        (4, ECLevel::M) => 6,
        (4, ECLevel::Q) => 7,
        _ => panic!("EC level unavailable for this micro version"),
    }
}

fn micro_count_bits(m: usize, mode: usize) -> usize {
    // modes indexed numeric, alnum, byte
    match mode {
        0 => [3, 4, 5, 6][m - 1],
        1 => [0, 3, 4, 5][m - 1],
        2 => [0, 0, 4, 5][m - 1],
        _ => unreachable!(),
    }
}

/// Builds the logical matrix of a micro QR symbol.
pub fn encode_micro(seg: &MicroSeg, m: usize, ecl: ECLevel, mask_idx: u8) -> BitMatrix {
    let ver = Version::Micro(m);
    let mode_len = m - 1;
    let mut bits = Bits::default();

    match seg {
        MicroSeg::Numeric(digits) => {
            bits.push(0, mode_len);
            bits.push(digits.len() as u32, micro_count_bits(m, 0));
            push_numeric(&mut bits, digits);
        }
        MicroSeg::Alnum(text) => {
            assert!(m >= 2, "alphanumeric needs M2 or later");
            bits.push(1, mode_len);
            bits.push(text.len() as u32, micro_count_bits(m, 1));
            push_alnum(&mut bits, text);
        }
        MicroSeg::Bytes(data) => {
            assert!(m >= 3, "byte mode needs M3 or later");
            bits.push(2, mode_len);
            bits.push(data.len() as u32, micro_count_bits(m, 2));
            for &b in *data {
                bits.push(b as u32, 8);
            }
        }
    }

    let capacity = ver.data_bit_capacity(ecl);
    assert!(bits.len() <= capacity, "segment exceeds micro capacity");
    bits.push(0, (2 * m + 1).min(capacity - bits.len())); // terminator
    // Pad to the next codeword boundary, then with pad codewords; the last
    // codeword of M1/M3 is only four bits wide
    let full_bytes_end = capacity - capacity % 8;
    while bits.len() < full_bytes_end && bits.len() % 8 != 0 {
        bits.push(0, 1);
    }
    let mut pad = 0xec;
    while bits.len() + 8 <= full_bytes_end {
        bits.push(pad, 8);
        pad ^= 0xec ^ 0x11;
    }
    while bits.len() < capacity {
        bits.push(0, 1);
    }

    // Codewords; the trailing half codeword occupies the high nibble
    let mut data: Vec<u8> = Vec::with_capacity(ver.data_codewords(ecl));
    let mut k = 0;
    while k + 8 <= capacity {
        let mut b = 0u8;
        for _ in 0..8 {
            b = (b << 1) | bits.0[k] as u8;
            k += 1;
        }
        data.push(b);
    }
    if k < capacity {
        let mut b = 0u8;
        for _ in 0..4 {
            b = (b << 1) | bits.0[k] as u8;
            k += 1;
        }
        data.push(b << 4);
    }

    let mut stream = data.clone();
    stream.extend(rs_ecc(&data, ver.ecc_per_block(ecl)));

    build_micro_matrix(&stream, ver, capacity, m, ecl, mask_idx)
}

fn build_micro_matrix(
    stream: &[u8],
    ver: Version,
    data_bits: usize,
    m: usize,
    ecl: ECLevel,
    mask_idx: u8,
) -> BitMatrix {
    let dim = ver.width();
    let mut mat = BitMatrix::square(dim);

    draw_finder_into(&mut mat, 0, 0);
    for i in (8..dim).step_by(2) {
        mat.set(i, 0);
        mat.set(0, i);
    }

    let data = ((micro_symbol_number(m, ecl) << 2) | mask_idx as u32) & 0x1f;
    let format = bch15_5(data) ^ 0x4445;
    let coords: [(usize, usize); 15] = [
        (1, 8), (2, 8), (3, 8), (4, 8), (5, 8), (6, 8), (7, 8), (8, 8),
        (8, 7), (8, 6), (8, 5), (8, 4), (8, 3), (8, 2), (8, 1),
    ];
    for (k, &(x, y)) in coords.iter().enumerate() {
        if (format >> (14 - k)) & 1 != 0 {
            mat.set(x, y);
        }
    }

    let is_function = |x: usize, y: usize| (x <= 8 && y <= 8) || x == 0 || y == 0;
    let mask_fn = MaskPattern::new_micro(mask_idx).mask_function();
    let total_bits = data_bits + 8 * ver.ecc_per_block(ecl);
    let bit_at = |i: usize| -> bool {
        // The half codeword's bits live in the high nibble
        (stream[i >> 3] >> (7 - (i & 7))) & 1 != 0
    };

    let mut i = 0usize;
    let mut pair = 0usize;
    let mut right = dim as i32 - 1;
    while right >= 1 {
        for vert in 0..dim as i32 {
            for j in 0..2 {
                let x = right - j;
                let upward = pair % 2 == 0;
                let y = if upward { dim as i32 - 1 - vert } else { vert };
                let (xu, yu) = (x as usize, y as usize);
                if is_function(xu, yu) || i >= total_bits {
                    continue;
                }
                // Skip the unused low nibble of a trailing half codeword
                let src = if data_bits % 8 != 0 && i >= data_bits {
                    i + 4
                } else {
                    i
                };
                if bit_at(src) ^ mask_fn(y, x) {
                    mat.set(xu, yu);
                }
                i += 1;
            }
        }
        pair += 1;
        right -= 2;
    }
    assert_eq!(i, total_bits, "codewords did not fill the encoding region");

    mat
}

// Rendering
//------------------------------------------------------------------------------

/// Renders a logical matrix into a grayscale image with `scale` pixels per
/// module and `quiet` modules of white border.
pub fn render(matrix: &BitMatrix, scale: usize, quiet: usize) -> GrayImage {
    let dim = matrix.width();
    let size = ((dim + 2 * quiet) * scale) as u32;
    let mut img = GrayImage::from_pixel(size, size, image::Luma([255u8]));
    for y in 0..dim {
        for x in 0..dim {
            if matrix.get(x, y) {
                for py in 0..scale {
                    for px in 0..scale {
                        img.put_pixel(
                            ((quiet + x) * scale + px) as u32,
                            ((quiet + y) * scale + py) as u32,
                            image::Luma([0u8]),
                        );
                    }
                }
            }
        }
    }
    img
}

#[cfg(test)]
mod encoder_self_checks {
    use super::*;

    #[test]
    fn test_format_word_matches_standard() {
        // L, mask 0 is the textbook value
        assert_eq!(bch15_5(0b01000) ^ 0x5412, 0x77c4);
        // M, mask 0 is the null data word
        assert_eq!(bch15_5(0) ^ 0x5412, 0x5412);
    }

    #[test]
    fn test_version_word_matches_standard() {
        assert_eq!(golay18_6(7), 0x07c94);
        assert_eq!(golay18_6(40), 0x28c69);
    }

    #[test]
    fn test_rs_ecc_known_vector() {
        let ecc = rs_ecc(b" [\x0bx\xd1r\xdcMC@\xec\x11\xec\x11\xec\x11", 10);
        assert_eq!(&ecc, b"\xc4#'w\xeb\xd7\xe7\xe2]\x17");
    }
}
