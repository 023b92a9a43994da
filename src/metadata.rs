use std::fmt::{Display, Error as FmtError, Formatter};
use std::ops::Deref;

use crate::mask::MaskPattern;

// Symbology
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum BarcodeFormat {
    QRCode,
    MicroQRCode,
    RMQRCode,
}

impl Display for BarcodeFormat {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        let name = match self {
            Self::QRCode => "QRCode",
            Self::MicroQRCode => "MicroQRCode",
            Self::RMQRCode => "rMQRCode",
        };
        f.write_str(name)
    }
}

// Error correction level
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub enum ECLevel {
    L = 0,
    M = 1,
    Q = 2,
    H = 3,
}

impl ECLevel {
    /// The two format-info bits encode L=01, M=00, Q=11, H=10; xor 1 maps
    /// between the wire bits and the enum order.
    pub fn from_bits(bits: u32) -> Self {
        match bits ^ 1 {
            0 => Self::L,
            1 => Self::M,
            2 => Self::Q,
            3 => Self::H,
            _ => unreachable!(),
        }
    }

    pub fn to_bits(self) -> u32 {
        (self as u32) ^ 1
    }
}

impl Display for ECLevel {
    fn fmt(&self, f: &mut Formatter) -> Result<(), FmtError> {
        let s = match self {
            Self::L => "L",
            Self::M => "M",
            Self::Q => "Q",
            Self::H => "H",
        };
        f.write_str(s)
    }
}

// Version
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Version {
    Micro(usize),
    Normal(usize),
}

impl Deref for Version {
    type Target = usize;
    fn deref(&self) -> &Self::Target {
        match self {
            Self::Micro(v) => v,
            Self::Normal(v) => v,
        }
    }
}

impl Version {
    pub const fn width(self) -> usize {
        debug_assert!(matches!(self, Self::Micro(1..=4) | Self::Normal(1..=40)), "Invalid version");
        match self {
            Self::Micro(v) => v * 2 + 9,
            Self::Normal(v) => v * 4 + 17,
        }
    }

    /// Provisional version from a sampled grid size; `None` for sizes no QR
    /// or micro QR symbol can have.
    pub fn from_dimension(dim: usize) -> Option<Self> {
        match dim {
            11 | 13 | 15 | 17 => Some(Self::Micro((dim - 9) / 2)),
            21..=177 if dim % 4 == 1 => Some(Self::Normal((dim - 17) / 4)),
            _ => None,
        }
    }

    pub fn is_micro(self) -> bool {
        matches!(self, Self::Micro(_))
    }

    pub fn format(self) -> BarcodeFormat {
        match self {
            Self::Micro(_) => BarcodeFormat::MicroQRCode,
            Self::Normal(_) => BarcodeFormat::QRCode,
        }
    }

    /// Alignment pattern center coordinates, both axes.
    pub fn alignment_pattern(self) -> &'static [i16] {
        match self {
            Self::Micro(_) => &[],
            Self::Normal(v) => ALIGNMENT_PATTERN_POSITIONS[v - 1],
        }
    }

    /// `(block1_size, block1_count, block2_size, block2_count)` in data
    /// codewords, per EC level.
    pub fn codewords_per_block(self, ecl: ECLevel) -> (usize, usize, usize, usize) {
        match self {
            Self::Micro(v) => {
                let (_, size) = EC_BLOCKS_MICRO[v - 1][ecl as usize];
                debug_assert!(size > 0, "EC level unavailable for this micro version");
                (size, 1, 0, 0)
            }
            Self::Normal(v) => {
                let (_, c1, s1, c2, s2) = EC_BLOCKS[v - 1][ecl as usize];
                (s1, c1, s2, c2)
            }
        }
    }

    pub fn ecc_per_block(self, ecl: ECLevel) -> usize {
        match self {
            Self::Micro(v) => EC_BLOCKS_MICRO[v - 1][ecl as usize].0,
            Self::Normal(v) => EC_BLOCKS[v - 1][ecl as usize].0,
        }
    }

    pub fn total_codewords(self, ecl: ECLevel) -> usize {
        let (s1, c1, s2, c2) = self.codewords_per_block(ecl);
        let blocks = c1 + c2;
        s1 * c1 + s2 * c2 + blocks * self.ecc_per_block(ecl)
    }

    pub fn data_codewords(self, ecl: ECLevel) -> usize {
        let (s1, c1, s2, c2) = self.codewords_per_block(ecl);
        s1 * c1 + s2 * c2
    }

    /// Capacity of the encoding region in bits. M1 and M3 end in a 4-bit
    /// codeword, every other symbol is a whole number of bytes.
    pub fn data_bit_capacity(self, ecl: ECLevel) -> usize {
        let bytes = self.data_codewords(ecl) * 8;
        match self {
            Self::Micro(1) | Self::Micro(3) => bytes - 4,
            _ => bytes,
        }
    }

    /// Bits in the encoding region left over after the last codeword.
    pub fn remainder_bits(self) -> usize {
        match self {
            Self::Micro(_) => 0,
            Self::Normal(v) => match v {
                2..=6 => 7,
                14..=20 | 28..=34 => 3,
                21..=27 => 4,
                _ => 0,
            },
        }
    }

    /// EC levels a symbol of this version can carry.
    pub fn supports_ec_level(self, ecl: ECLevel) -> bool {
        match self {
            Self::Normal(_) => true,
            Self::Micro(v) => EC_BLOCKS_MICRO[v - 1][ecl as usize].1 > 0,
        }
    }
}

// Format information
//------------------------------------------------------------------------------

pub const FORMAT_MASK: u32 = 0x5412;
pub const FORMAT_MASK_MICRO: u32 = 0x4445;
pub const FORMAT_ERROR_CAPACITY: u32 = 3;
pub const VERSION_ERROR_CAPACITY: u32 = 3;
pub const VERSION_ERROR_BIT_LEN: u32 = 12;

/// Splits an unmasked 15-bit format codeword into its QR payload.
pub fn parse_format_info_qr(format: u32) -> (ECLevel, MaskPattern) {
    let data = format >> 10;
    let ecl = ECLevel::from_bits(data >> 3);
    let mask = MaskPattern::new((data & 7) as u8);
    (ecl, mask)
}

/// Splits an unmasked 15-bit format codeword into its micro QR payload:
/// 3-bit symbol number plus 2-bit mask index.
pub fn parse_format_info_micro(format: u32) -> (Version, ECLevel, MaskPattern) {
    let data = format >> 10;
    let mask = MaskPattern::new_micro((data & 3) as u8);
    let (ver, ecl) = match data >> 2 {
        0 => (Version::Micro(1), ECLevel::L),
        1 => (Version::Micro(2), ECLevel::L),
        2 => (Version::Micro(2), ECLevel::M),
        3 => (Version::Micro(3), ECLevel::L),
        4 => (Version::Micro(3), ECLevel::M),
        5 => (Version::Micro(4), ECLevel::L),
        6 => (Version::Micro(4), ECLevel::M),
        7 => (Version::Micro(4), ECLevel::Q),
        _ => unreachable!(),
    };
    (ver, ecl, mask)
}

// Global constants
//------------------------------------------------------------------------------

static ALIGNMENT_PATTERN_POSITIONS: [&[i16]; 40] = [
    &[],
    &[6, 18],
    &[6, 22],
    &[6, 26],
    &[6, 30],
    &[6, 34],
    &[6, 22, 38],
    &[6, 24, 42],
    &[6, 26, 46],
    &[6, 28, 50],
    &[6, 30, 54],
    &[6, 32, 58],
    &[6, 34, 62],
    &[6, 26, 46, 66],
    &[6, 26, 48, 70],
    &[6, 26, 50, 74],
    &[6, 30, 54, 78],
    &[6, 30, 56, 82],
    &[6, 30, 58, 86],
    &[6, 34, 62, 90],
    &[6, 28, 50, 72, 94],
    &[6, 26, 50, 74, 98],
    &[6, 30, 54, 78, 102],
    &[6, 28, 54, 80, 106],
    &[6, 32, 58, 84, 110],
    &[6, 30, 58, 86, 114],
    &[6, 34, 62, 90, 118],
    &[6, 26, 50, 74, 98, 122],
    &[6, 30, 54, 78, 102, 126],
    &[6, 26, 52, 78, 104, 130],
    &[6, 30, 56, 82, 108, 134],
    &[6, 34, 60, 86, 112, 138],
    &[6, 30, 58, 86, 114, 142],
    &[6, 34, 62, 90, 118, 146],
    &[6, 30, 54, 78, 102, 126, 150],
    &[6, 24, 50, 76, 102, 128, 154],
    &[6, 28, 54, 80, 106, 132, 158],
    &[6, 32, 58, 84, 110, 136, 162],
    &[6, 26, 54, 82, 110, 138, 166],
    &[6, 30, 58, 86, 114, 142, 170],
];

/// Golay-protected version words for versions 7..=40; the version number
/// occupies the top 6 bits.
pub static VERSION_INFOS: [u32; 34] = [
    0x07c94, 0x085bc, 0x09a99, 0x0a4d3, 0x0bbf6, 0x0c762, 0x0d847, 0x0e60d, 0x0f928, 0x10b78,
    0x1145d, 0x12a17, 0x13532, 0x149a6, 0x15683, 0x168c9, 0x177ec, 0x18ec4, 0x191e1, 0x1afab,
    0x1b08e, 0x1cc1a, 0x1d33f, 0x1ed75, 0x1f250, 0x209d5, 0x216f0, 0x228ba, 0x2379f, 0x24b0b,
    0x2542e, 0x26a64, 0x27541, 0x28c69,
];

/// All 32 BCH(15,5) format codewords, already xored with [`FORMAT_MASK`];
/// index is `(ec_bits << 3) | mask`.
pub static FORMAT_INFOS_QR: [u32; 32] = [
    0x5412, 0x5125, 0x5e7c, 0x5b4b, 0x45f9, 0x40ce, 0x4f97, 0x4aa0, 0x77c4, 0x72f3, 0x7daa, 0x789d,
    0x662f, 0x6318, 0x6c41, 0x6976, 0x1689, 0x13be, 0x1ce7, 0x19d0, 0x0762, 0x0255, 0x0d0c, 0x083b,
    0x355f, 0x3068, 0x3f31, 0x3a06, 0x24b4, 0x2183, 0x2eda, 0x2bed,
];

// (ec_per_block, count1, data1, count2, data2) ordered L, M, Q, H.
#[rustfmt::skip]
static EC_BLOCKS: [[(usize, usize, usize, usize, usize); 4]; 40] = [
    [(7, 1, 19, 0, 0), (10, 1, 16, 0, 0), (13, 1, 13, 0, 0), (17, 1, 9, 0, 0)],
    [(10, 1, 34, 0, 0), (16, 1, 28, 0, 0), (22, 1, 22, 0, 0), (28, 1, 16, 0, 0)],
    [(15, 1, 55, 0, 0), (26, 1, 44, 0, 0), (18, 2, 17, 0, 0), (22, 2, 13, 0, 0)],
    [(20, 1, 80, 0, 0), (18, 2, 32, 0, 0), (26, 2, 24, 0, 0), (16, 4, 9, 0, 0)],
    [(26, 1, 108, 0, 0), (24, 2, 43, 0, 0), (18, 2, 15, 2, 16), (22, 2, 11, 2, 12)],
    [(18, 2, 68, 0, 0), (16, 4, 27, 0, 0), (24, 4, 19, 0, 0), (28, 4, 15, 0, 0)],
    [(20, 2, 78, 0, 0), (18, 4, 31, 0, 0), (18, 2, 14, 4, 15), (26, 4, 13, 1, 14)],
    [(24, 2, 97, 0, 0), (22, 2, 38, 2, 39), (22, 4, 18, 2, 19), (26, 4, 14, 2, 15)],
    [(30, 2, 116, 0, 0), (22, 3, 36, 2, 37), (20, 4, 16, 4, 17), (24, 4, 12, 4, 13)],
    [(18, 2, 68, 2, 69), (26, 4, 43, 1, 44), (24, 6, 19, 2, 20), (28, 6, 15, 2, 16)],
    [(20, 4, 81, 0, 0), (30, 1, 50, 4, 51), (28, 4, 22, 4, 23), (24, 3, 12, 8, 13)],
    [(24, 2, 92, 2, 93), (22, 6, 36, 2, 37), (26, 4, 20, 6, 21), (28, 7, 14, 4, 15)],
    [(26, 4, 107, 0, 0), (22, 8, 37, 1, 38), (24, 8, 20, 4, 21), (22, 12, 11, 4, 12)],
    [(30, 3, 115, 1, 116), (24, 4, 40, 5, 41), (20, 11, 16, 5, 17), (24, 11, 12, 5, 13)],
    [(22, 5, 87, 1, 88), (24, 5, 41, 5, 42), (30, 5, 24, 7, 25), (24, 11, 12, 7, 13)],
    [(24, 5, 98, 1, 99), (28, 7, 45, 3, 46), (24, 15, 19, 2, 20), (30, 3, 15, 13, 16)],
    [(28, 1, 107, 5, 108), (28, 10, 46, 1, 47), (28, 1, 22, 15, 23), (28, 2, 14, 17, 15)],
    [(30, 5, 120, 1, 121), (26, 9, 43, 4, 44), (28, 17, 22, 1, 23), (28, 2, 14, 19, 15)],
    [(28, 3, 113, 4, 114), (26, 3, 44, 11, 45), (26, 17, 21, 4, 22), (26, 9, 13, 16, 14)],
    [(28, 3, 107, 5, 108), (26, 3, 41, 13, 42), (30, 15, 24, 5, 25), (28, 15, 15, 10, 16)],
    [(28, 4, 116, 4, 117), (26, 17, 42, 0, 0), (28, 17, 22, 6, 23), (30, 19, 16, 6, 17)],
    [(28, 2, 111, 7, 112), (28, 17, 46, 0, 0), (30, 7, 24, 16, 25), (24, 34, 13, 0, 0)],
    [(30, 4, 121, 5, 122), (28, 4, 47, 14, 48), (30, 11, 24, 14, 25), (30, 16, 15, 14, 16)],
    [(30, 6, 117, 4, 118), (28, 6, 45, 14, 46), (30, 11, 24, 16, 25), (30, 30, 16, 2, 17)],
    [(26, 8, 106, 4, 107), (28, 8, 47, 13, 48), (30, 7, 24, 22, 25), (30, 22, 15, 13, 16)],
    [(28, 10, 114, 2, 115), (28, 19, 46, 4, 47), (28, 28, 22, 6, 23), (30, 33, 16, 4, 17)],
    [(30, 8, 122, 4, 123), (28, 22, 45, 3, 46), (30, 8, 23, 26, 24), (30, 12, 15, 28, 16)],
    [(30, 3, 117, 10, 118), (28, 3, 45, 23, 46), (30, 4, 24, 31, 25), (30, 11, 15, 31, 16)],
    [(30, 7, 116, 7, 117), (28, 21, 45, 7, 46), (30, 1, 23, 37, 24), (30, 19, 15, 26, 16)],
    [(30, 5, 115, 10, 116), (28, 19, 47, 10, 48), (30, 15, 24, 25, 25), (30, 23, 15, 25, 16)],
    [(30, 13, 115, 3, 116), (28, 2, 46, 29, 47), (30, 42, 24, 1, 25), (30, 23, 15, 28, 16)],
    [(30, 17, 115, 0, 0), (28, 10, 46, 23, 47), (30, 10, 24, 35, 25), (30, 19, 15, 35, 16)],
    [(30, 17, 115, 1, 116), (28, 14, 46, 21, 47), (30, 29, 24, 19, 25), (30, 11, 15, 46, 16)],
    [(30, 13, 115, 6, 116), (28, 14, 46, 23, 47), (30, 44, 24, 7, 25), (30, 59, 16, 1, 17)],
    [(30, 12, 121, 7, 122), (28, 12, 47, 26, 48), (30, 39, 24, 14, 25), (30, 22, 15, 41, 16)],
    [(30, 6, 121, 14, 122), (28, 6, 47, 34, 48), (30, 46, 24, 10, 25), (30, 2, 15, 64, 16)],
    [(30, 17, 122, 4, 123), (28, 29, 46, 14, 47), (30, 49, 24, 10, 25), (30, 24, 15, 46, 16)],
    [(30, 4, 122, 18, 123), (28, 13, 46, 32, 47), (30, 48, 24, 14, 25), (30, 42, 15, 32, 16)],
    [(30, 20, 117, 4, 118), (28, 40, 47, 7, 48), (30, 43, 24, 22, 25), (30, 10, 15, 67, 16)],
    [(30, 19, 118, 6, 119), (28, 18, 47, 31, 48), (30, 34, 24, 34, 25), (30, 20, 15, 61, 16)],
];

// (ec_per_block, data_codewords); zero marks an EC level the version lacks.
static EC_BLOCKS_MICRO: [[(usize, usize); 4]; 4] = [
    [(2, 3), (0, 0), (0, 0), (0, 0)],
    [(5, 5), (6, 4), (0, 0), (0, 0)],
    [(6, 11), (8, 9), (0, 0), (0, 0)],
    [(8, 16), (10, 14), (14, 10), (0, 0)],
];
