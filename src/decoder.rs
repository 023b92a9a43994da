use crate::{
    bitmatrix::BitMatrix,
    codec::{self, DecoderResult},
    ec::{rectify_info, Block},
    error::{Error, ScanResult},
    geometry::PointI,
    mask::MaskPattern,
    metadata::{
        parse_format_info_micro, parse_format_info_qr, ECLevel, Version, FORMAT_ERROR_CAPACITY,
        FORMAT_INFOS_QR, FORMAT_MASK, FORMAT_MASK_MICRO, VERSION_ERROR_BIT_LEN,
        VERSION_ERROR_CAPACITY, VERSION_INFOS,
    },
    options::ReaderOptions,
    result::{Barcode, Position},
    utils::{BitArray, BitStream},
};

// Grid
//------------------------------------------------------------------------------

// Sampled matrix with wrap-around addressing, so info coordinates near the
// far edges can be written as small negatives.
struct Grid<'a> {
    bits: &'a BitMatrix,
    dim: i32,
}

impl<'a> Grid<'a> {
    fn new(bits: &'a BitMatrix) -> Self {
        Self { bits, dim: bits.width() as i32 }
    }

    fn get(&self, x: i32, y: i32) -> bool {
        debug_assert!(-self.dim <= x && x < self.dim, "Column out of range");
        debug_assert!(-self.dim <= y && y < self.dim, "Row out of range");
        let x = if x < 0 { x + self.dim } else { x };
        let y = if y < 0 { y + self.dim } else { y };
        self.bits.get(x as usize, y as usize)
    }

    fn get_number(&self, coords: &[(i32, i32)]) -> u32 {
        let mut num = 0;
        for &(x, y) in coords {
            num = (num << 1) | self.get(x, y) as u32;
        }
        num
    }
}

// Read format & version info
//------------------------------------------------------------------------------

static FORMAT_COORDS_MAIN: [(i32, i32); 15] = [
    (0, 8), (1, 8), (2, 8), (3, 8), (4, 8), (5, 8), (7, 8), (8, 8), (8, 7),
    (8, 5), (8, 4), (8, 3), (8, 2), (8, 1), (8, 0),
];

static FORMAT_COORDS_SIDE: [(i32, i32); 15] = [
    (8, -1), (8, -2), (8, -3), (8, -4), (8, -5), (8, -6), (8, -7),
    (-8, 8), (-7, 8), (-6, 8), (-5, 8), (-4, 8), (-3, 8), (-2, 8), (-1, 8),
];

static FORMAT_COORDS_MICRO: [(i32, i32); 15] = [
    (1, 8), (2, 8), (3, 8), (4, 8), (5, 8), (6, 8), (7, 8), (8, 8),
    (8, 7), (8, 6), (8, 5), (8, 4), (8, 3), (8, 2), (8, 1),
];

fn read_format_info_qr(grid: &Grid) -> ScanResult<(ECLevel, MaskPattern)> {
    for coords in [&FORMAT_COORDS_MAIN, &FORMAT_COORDS_SIDE] {
        let raw = grid.get_number(coords);
        if let Ok(code) = rectify_info(raw, &FORMAT_INFOS_QR, FORMAT_ERROR_CAPACITY) {
            return Ok(parse_format_info_qr(code ^ FORMAT_MASK));
        }
    }
    Err(Error::Format("format info unrecoverable"))
}

fn read_format_info_micro(grid: &Grid) -> ScanResult<(Version, ECLevel, MaskPattern)> {
    let raw = grid.get_number(&FORMAT_COORDS_MICRO);
    // Re-mask into the QR domain so one codeword table serves both
    let code = rectify_info(
        raw ^ FORMAT_MASK_MICRO ^ FORMAT_MASK,
        &FORMAT_INFOS_QR,
        FORMAT_ERROR_CAPACITY,
    )
    .map_err(|_| Error::Format("format info unrecoverable"))?;
    Ok(parse_format_info_micro(code ^ FORMAT_MASK))
}

fn read_version_info(grid: &Grid) -> ScanResult<Version> {
    let dim = grid.dim;

    // Top-right block, 3 wide by 6 tall, read bottom-up per column
    let mut tr = 0;
    for j in (0..6).rev() {
        for i in (dim - 11..=dim - 9).rev() {
            tr = (tr << 1) | grid.get(i, j) as u32;
        }
    }
    // Bottom-left block, transposed layout
    let mut bl = 0;
    for i in (0..6).rev() {
        for j in (dim - 11..=dim - 9).rev() {
            bl = (bl << 1) | grid.get(i, j) as u32;
        }
    }

    for raw in [tr, bl] {
        if let Ok(info) = rectify_info(raw, &VERSION_INFOS, VERSION_ERROR_CAPACITY) {
            return Ok(Version::Normal((info >> VERSION_ERROR_BIT_LEN) as usize));
        }
    }
    Err(Error::Format("version info unrecoverable"))
}

// Function modules
//------------------------------------------------------------------------------

/// Whether `(x, y)` belongs to a function pattern rather than the encoding
/// region.
pub(crate) fn is_function_module(ver: Version, x: i32, y: i32) -> bool {
    let dim = ver.width() as i32;
    match ver {
        Version::Micro(_) => {
            // Finder, separator and format info around the only corner,
            // timing along both edges
            (x <= 8 && y <= 8) || x == 0 || y == 0
        }
        Version::Normal(v) => {
            // Finders with separators and format info
            if (x <= 8 && y <= 8) || (x >= dim - 8 && y <= 8) || (x <= 8 && y >= dim - 8) {
                return true;
            }
            // Timing
            if x == 6 || y == 6 {
                return true;
            }
            // Version info blocks
            if v >= 7 && ((x < 6 && y >= dim - 11) || (y < 6 && x >= dim - 11)) {
                return true;
            }
            // Alignment patterns, skipping the three finder corners
            let aps = ver.alignment_pattern();
            let last = *aps.last().unwrap() as i32;
            for &cy in aps {
                for &cx in aps {
                    let (cx, cy) = (cx as i32, cy as i32);
                    let corner =
                        (cx == 6 && cy == 6) || (cx == 6 && cy == last) || (cx == last && cy == 6);
                    if !corner && (x - cx).abs() <= 2 && (y - cy).abs() <= 2 {
                        return true;
                    }
                }
            }
            false
        }
    }
}

// Iterator over the encoding region placement order: column pairs from the
// right, serpentine, hopping the vertical timing column.
#[derive(Clone)]
struct RegionIter {
    r: i32,
    c: i32,
    width: i32,
    vert_timing_col: i32,
}

impl RegionIter {
    const fn new(ver: Version) -> Self {
        let w = ver.width() as i32;
        let vert_timing_col = match ver {
            Version::Micro(_) => 0,
            Version::Normal(_) => 6,
        };
        Self { r: w - 1, c: w - 1, width: w, vert_timing_col }
    }
}

impl Iterator for RegionIter {
    type Item = (i32, i32);
    fn next(&mut self) -> Option<Self::Item> {
        let adjusted_col = if self.c <= self.vert_timing_col { self.c + 1 } else { self.c };
        if self.c < 0 {
            return None;
        }
        let res = (self.r, self.c);
        let col_type = (self.width - adjusted_col) % 4;
        match col_type {
            2 if self.r > 0 => {
                self.r -= 1;
                self.c += 1;
            }
            0 if self.r < self.width - 1 => {
                self.r += 1;
                self.c += 1;
            }
            0 | 2 if self.c == self.vert_timing_col + 1 => {
                self.c -= 2;
            }
            _ => {
                self.c -= 1;
            }
        }
        Some(res)
    }
}

// Codeword extraction
//------------------------------------------------------------------------------

/// Walks the encoding region, strips the data mask and packs the bits into
/// raw codewords in reading order. For M1/M3 the final data codeword
/// occupies the high nibble of its byte.
fn extract_codewords(bits: &BitMatrix, ver: Version, ecl: ECLevel, mask: MaskPattern) -> Vec<u8> {
    let mask_fn = mask.mask_function();
    let data_bits = ver.data_bit_capacity(ecl);
    let ec_bits = ver.ecc_per_block(ecl)
        * 8
        * match ver {
            Version::Micro(_) => 1,
            Version::Normal(_) => {
                let (_, c1, _, c2) = ver.codewords_per_block(ecl);
                c1 + c2
            }
        };

    let data_bytes = data_bits.div_ceil(8);
    let mut stream = BitArray::new((data_bytes + ec_bits / 8) * 8);
    let mut taken = 0usize;

    for (r, c) in RegionIter::new(ver) {
        if taken == data_bits + ec_bits {
            break;
        }
        if is_function_module(ver, c, r) {
            continue;
        }
        let bit = bits.get(c as usize, r as usize) ^ mask_fn(r, c);
        // EC codewords restart on a byte boundary after a half codeword
        let pos =
            if taken < data_bits { taken } else { data_bytes * 8 + taken - data_bits };
        stream.put(pos, bit);
        taken += 1;
    }
    debug_assert_eq!(taken, data_bits + ec_bits, "Encoding region too small");
    stream.data().to_vec()
}

// De-interleave & rectify
//------------------------------------------------------------------------------

fn deinterleave(data: &[u8], blk_info: (usize, usize, usize, usize), ec_len: usize) -> Vec<Block> {
    // b1s = block1_size, b1c = block1_count
    let (b1s, b1c, b2s, b2c) = blk_info;

    let total_blks = b1c + b2c;
    let spl = b1s * total_blks;
    let data_sz = b1s * b1c + b2s * b2c;

    let mut dilvd = vec![Vec::with_capacity(b1s.max(b2s) + ec_len); total_blks];

    // Deinterleaving data
    data[..spl]
        .chunks(total_blks)
        .for_each(|ch| ch.iter().enumerate().for_each(|(i, v)| dilvd[i].push(*v)));
    if b2c > 0 {
        data[spl..data_sz]
            .chunks(b2c)
            .for_each(|ch| ch.iter().enumerate().for_each(|(i, v)| dilvd[b1c + i].push(*v)));
    }

    // Deinterleaving ecc
    data[data_sz..]
        .chunks(total_blks)
        .for_each(|ch| ch.iter().enumerate().for_each(|(i, v)| dilvd[i].push(*v)));

    dilvd.iter().map(|b| Block::with_encoded(b, b.len() - ec_len)).collect()
}

// Matrix decoding
//------------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub(crate) struct DecodedMatrix {
    pub result: DecoderResult,
    pub ver: Version,
    pub ecl: ECLevel,
    pub is_mirrored: bool,
}

fn decode_oriented(bits: &BitMatrix, opts: &ReaderOptions) -> ScanResult<DecodedMatrix> {
    let dim = bits.width();
    let mut ver =
        Version::from_dimension(dim).ok_or(Error::Format("no symbol has this dimension"))?;
    let grid = Grid::new(bits);

    let (ecl, mask) = match ver {
        Version::Micro(_) => {
            let (fmt_ver, ecl, mask) = read_format_info_micro(&grid)?;
            if fmt_ver != ver {
                return Err(Error::Format("format info version mismatch"));
            }
            (ecl, mask)
        }
        Version::Normal(v) => {
            let (ecl, mask) = read_format_info_qr(&grid)?;
            if v >= 7 {
                ver = read_version_info(&grid)?;
                if ver.width() != dim {
                    return Err(Error::Format("version info mismatch"));
                }
            }
            (ecl, mask)
        }
    };

    if !ver.supports_ec_level(ecl) {
        return Err(Error::Format("EC level unavailable for this version"));
    }

    let codewords = extract_codewords(bits, ver, ecl, mask);
    let blk_info = ver.codewords_per_block(ecl);
    let ec_len = ver.ecc_per_block(ecl);

    let mut enc = BitStream::new(ver.data_bit_capacity(ecl));
    let mut blocks = deinterleave(&codewords, blk_info, ec_len);
    let last_block = blocks.len() - 1;
    let half_codeword = ver.data_bit_capacity(ecl) % 8 != 0;
    for (i, b) in blocks.iter_mut().enumerate() {
        let rectified = b.rectify()?;
        if half_codeword && i == last_block {
            let (body, last) = rectified.split_at(rectified.len() - 1);
            enc.extend(body);
            enc.append_bits((last[0] >> 4) as u32, 4);
        } else {
            enc.extend(rectified);
        }
    }

    let result =
        codec::decode(&mut enc, ver, opts.text_codec(), opts.character_set, opts.text_mode)?;
    Ok(DecodedMatrix { result, ver, ecl, is_mirrored: false })
}

/// Decodes a sampled matrix; a failed read is retried on the transposed
/// matrix, which recovers symbols seen through a mirror.
pub(crate) fn decode(bits: &BitMatrix, opts: &ReaderOptions) -> ScanResult<DecodedMatrix> {
    match decode_oriented(bits, opts) {
        Ok(res) => Ok(res),
        Err(first) => {
            let mut mirrored = bits.clone();
            mirrored.mirror();
            match decode_oriented(&mirrored, opts) {
                Ok(mut res) => {
                    res.is_mirrored = true;
                    Ok(res)
                }
                Err(_) => Err(first),
            }
        }
    }
}

/// Decodes an already-sampled logical bit matrix (set bit = dark module).
/// This is the entry point for callers that did their own detection.
pub fn decode_matrix(bits: &BitMatrix, opts: &ReaderOptions) -> ScanResult<Barcode> {
    if bits.width() != bits.height() {
        return Err(Error::Unsupported("rMQR decoding is not implemented"));
    }
    let decoded = decode(bits, opts)?;
    if !opts.accepts(decoded.ver.format()) {
        return Err(Error::Unsupported("format excluded by configuration"));
    }
    let last = bits.width() as i32 - 1;
    let position = Position([
        PointI::new(0, 0),
        PointI::new(last, 0),
        PointI::new(last, last),
        PointI::new(0, last),
    ]);
    Ok(Barcode::from_decode(
        decoded.result,
        decoded.ver,
        decoded.ecl,
        position,
        decoded.is_mirrored,
    ))
}
