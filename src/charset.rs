use encoding_rs::Encoding;

use crate::error::{Error, ScanResult};

// Character sets
//------------------------------------------------------------------------------

/// Character sets a byte segment can declare through ECI or receive from
/// guessing. `Binary` passes bytes through untranslated.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum CharacterSet {
    Iso8859_1,
    Iso8859_2,
    Iso8859_3,
    Iso8859_4,
    Iso8859_5,
    Iso8859_6,
    Iso8859_7,
    Iso8859_8,
    Iso8859_9,
    Iso8859_10,
    Iso8859_11,
    Iso8859_13,
    Iso8859_14,
    Iso8859_15,
    Iso8859_16,
    ShiftJIS,
    Cp1250,
    Cp1251,
    Cp1252,
    Cp1256,
    Utf16BE,
    Utf16LE,
    Utf8,
    Ascii,
    Big5,
    Gb18030,
    EucKr,
    Binary,
}

impl CharacterSet {
    /// AIM ECI designator to character set. Unassigned designators come back
    /// as `None`; 899 explicitly selects binary passthrough.
    pub fn from_eci(designator: u32) -> Option<Self> {
        use CharacterSet::*;
        Some(match designator {
            0 | 1 | 3 => Iso8859_1,
            4 => Iso8859_2,
            5 => Iso8859_3,
            6 => Iso8859_4,
            7 => Iso8859_5,
            8 => Iso8859_6,
            9 => Iso8859_7,
            10 => Iso8859_8,
            11 => Iso8859_9,
            12 => Iso8859_10,
            13 => Iso8859_11,
            15 => Iso8859_13,
            16 => Iso8859_14,
            17 => Iso8859_15,
            18 => Iso8859_16,
            20 => ShiftJIS,
            21 => Cp1250,
            22 => Cp1251,
            23 => Cp1252,
            24 => Cp1256,
            25 => Utf16BE,
            26 => Utf8,
            27 | 170 => Ascii,
            28 => Big5,
            29 | 32 => Gb18030,
            30 => EucKr,
            33 => Utf16LE,
            899 => Binary,
            _ => return None,
        })
    }

    /// Canonical ECI designator for this set.
    pub fn eci(self) -> u32 {
        use CharacterSet::*;
        match self {
            Iso8859_1 => 3,
            Iso8859_2 => 4,
            Iso8859_3 => 5,
            Iso8859_4 => 6,
            Iso8859_5 => 7,
            Iso8859_6 => 8,
            Iso8859_7 => 9,
            Iso8859_8 => 10,
            Iso8859_9 => 11,
            Iso8859_10 => 12,
            Iso8859_11 => 13,
            Iso8859_13 => 15,
            Iso8859_14 => 16,
            Iso8859_15 => 17,
            Iso8859_16 => 18,
            ShiftJIS => 20,
            Cp1250 => 21,
            Cp1251 => 22,
            Cp1252 => 23,
            Cp1256 => 24,
            Utf16BE => 25,
            Utf8 => 26,
            Ascii => 27,
            Big5 => 28,
            Gb18030 => 32,
            EucKr => 30,
            Utf16LE => 33,
            Binary => 899,
        }
    }

    fn encoding(self) -> Option<&'static Encoding> {
        use CharacterSet::*;
        Some(match self {
            Iso8859_2 => encoding_rs::ISO_8859_2,
            Iso8859_3 => encoding_rs::ISO_8859_3,
            Iso8859_4 => encoding_rs::ISO_8859_4,
            Iso8859_5 => encoding_rs::ISO_8859_5,
            Iso8859_6 => encoding_rs::ISO_8859_6,
            Iso8859_7 => encoding_rs::ISO_8859_7,
            Iso8859_8 => encoding_rs::ISO_8859_8,
            Iso8859_9 => encoding_rs::WINDOWS_1254,
            Iso8859_10 => encoding_rs::ISO_8859_10,
            Iso8859_11 => encoding_rs::WINDOWS_874,
            Iso8859_13 => encoding_rs::ISO_8859_13,
            Iso8859_14 => encoding_rs::ISO_8859_14,
            Iso8859_15 => encoding_rs::ISO_8859_15,
            Iso8859_16 => encoding_rs::ISO_8859_16,
            ShiftJIS => encoding_rs::SHIFT_JIS,
            Cp1250 => encoding_rs::WINDOWS_1250,
            Cp1251 => encoding_rs::WINDOWS_1251,
            Cp1252 => encoding_rs::WINDOWS_1252,
            Cp1256 => encoding_rs::WINDOWS_1256,
            Utf16BE => encoding_rs::UTF_16BE,
            Utf16LE => encoding_rs::UTF_16LE,
            Utf8 => encoding_rs::UTF_8,
            Big5 => encoding_rs::BIG5,
            Gb18030 => encoding_rs::GB18030,
            EucKr => encoding_rs::EUC_KR,
            Iso8859_1 | Ascii | Binary => return None,
        })
    }
}

// Codec service
//------------------------------------------------------------------------------

/// Narrow transcoding interface the bit-stream decoder depends on. The
/// default implementation sits on `encoding_rs`; callers may install their
/// own through `ReaderOptions`.
pub trait TextCodec: Send + Sync {
    fn to_utf8(&self, bytes: &[u8], charset: CharacterSet) -> ScanResult<String>;

    /// Picks a character set for undeclared byte content. `fallback` is the
    /// configured default, tried before ISO-8859-1.
    fn guess(&self, bytes: &[u8], fallback: CharacterSet) -> CharacterSet;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EncodingRsCodec;

impl TextCodec for EncodingRsCodec {
    fn to_utf8(&self, bytes: &[u8], charset: CharacterSet) -> ScanResult<String> {
        match charset {
            // Latin-1 maps bytes straight onto U+0000..U+00FF; the WHATWG
            // latin1 label would pull in windows-1252 instead.
            CharacterSet::Iso8859_1 | CharacterSet::Binary => {
                Ok(encoding_rs::mem::decode_latin1(bytes).into_owned())
            }
            CharacterSet::Ascii => {
                if bytes.is_ascii() {
                    Ok(encoding_rs::mem::decode_latin1(bytes).into_owned())
                } else {
                    Err(Error::Format("non-ASCII byte in ASCII segment"))
                }
            }
            _ => {
                let enc = charset.encoding().expect("every remaining set has an encoding");
                let (text, _, _) = enc.decode(bytes);
                Ok(text.into_owned())
            }
        }
    }

    fn guess(&self, bytes: &[u8], fallback: CharacterSet) -> CharacterSet {
        if bytes.is_ascii() {
            return if fallback == CharacterSet::ShiftJIS { fallback } else { CharacterSet::Utf8 };
        }
        if encoding_rs::UTF_8.decode_without_bom_handling_and_without_replacement(bytes).is_some() {
            return CharacterSet::Utf8;
        }
        if let Some(enc) = fallback.encoding() {
            if enc.decode_without_bom_handling_and_without_replacement(bytes).is_some() {
                return fallback;
            }
        }
        if encoding_rs::SHIFT_JIS.decode_without_bom_handling_and_without_replacement(bytes).is_some()
        {
            return CharacterSet::ShiftJIS;
        }
        CharacterSet::Iso8859_1
    }
}

static DEFAULT_CODEC: EncodingRsCodec = EncodingRsCodec;

pub fn default_codec() -> &'static dyn TextCodec {
    &DEFAULT_CODEC
}
