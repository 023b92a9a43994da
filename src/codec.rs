use crate::{
    charset::{CharacterSet, TextCodec},
    error::{Error, ScanResult},
    metadata::Version,
    options::TextMode,
    utils::BitStream,
};

// Segment modes
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
enum Mode {
    Numeric,
    Alphanumeric,
    Byte,
    Kanji,
    Eci,
    Fnc1First,
    Fnc1Second,
    StructuredAppend,
    Terminator,
}

impl Mode {
    fn from_indicator(bits: u32) -> ScanResult<Self> {
        match bits {
            0x0 => Ok(Self::Terminator),
            0x1 => Ok(Self::Numeric),
            0x2 => Ok(Self::Alphanumeric),
            0x3 => Ok(Self::StructuredAppend),
            0x4 => Ok(Self::Byte),
            0x5 => Ok(Self::Fnc1First),
            0x7 => Ok(Self::Eci),
            0x8 => Ok(Self::Kanji),
            0x9 => Ok(Self::Fnc1Second),
            _ => Err(Error::Format("unknown mode indicator")),
        }
    }

    fn from_micro_indicator(bits: u32, ver: usize) -> ScanResult<Self> {
        let mode = match bits {
            0 => Self::Numeric,
            1 => Self::Alphanumeric,
            2 => Self::Byte,
            3 => Self::Kanji,
            _ => return Err(Error::Format("unknown micro mode indicator")),
        };
        let allowed = match ver {
            1 => matches!(mode, Self::Numeric),
            2 => matches!(mode, Self::Numeric | Self::Alphanumeric),
            _ => true,
        };
        if allowed {
            Ok(mode)
        } else {
            Err(Error::Format("mode unavailable in this micro version"))
        }
    }

    /// Character-count field width per version bucket (1-9, 10-26, 27-40)
    /// or per micro version.
    fn char_count_bits(self, ver: Version) -> usize {
        match ver {
            Version::Normal(v) => {
                let bucket = match v {
                    1..=9 => 0,
                    10..=26 => 1,
                    _ => 2,
                };
                match self {
                    Self::Numeric => [10, 12, 14][bucket],
                    Self::Alphanumeric => [9, 11, 13][bucket],
                    Self::Byte => [8, 16, 16][bucket],
                    Self::Kanji => [8, 10, 12][bucket],
                    _ => 0,
                }
            }
            Version::Micro(v) => match self {
                Self::Numeric => [3, 4, 5, 6][v - 1],
                Self::Alphanumeric => [0, 3, 4, 5][v - 1],
                Self::Byte => [0, 0, 4, 5][v - 1],
                Self::Kanji => [0, 0, 3, 4][v - 1],
                _ => 0,
            },
        }
    }
}

// Decoder result
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Fnc1 {
    #[default]
    None,
    FirstPosition,
    SecondPosition(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredAppendInfo {
    pub index: u32,
    pub count: u32,
    /// Parity byte rendered as decimal; symbols of one sequence share it.
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct DecoderResult {
    pub bytes: Vec<u8>,
    pub text: String,
    pub character_set: CharacterSet,
    pub structured_append: Option<StructuredAppendInfo>,
    pub fnc1: Fnc1,
    pub has_eci: bool,
}

impl DecoderResult {
    /// AIM symbology modifier digit for the `]Qn` identifier.
    pub fn symbology_modifier(&self) -> char {
        let base = match self.fnc1 {
            Fnc1::None => 1,
            Fnc1::FirstPosition => 3,
            Fnc1::SecondPosition(_) => 5,
        };
        char::from_digit(base + self.has_eci as u32, 10).unwrap()
    }
}

// Bit-stream decoding
//------------------------------------------------------------------------------

enum Seg {
    Decoded(String),
    Bytes(Vec<u8>, Option<CharacterSet>),
}

/// Parses the corrected data bit stream into segments and renders the text
/// field. The stream cursor is left after the last consumed segment.
pub fn decode(
    bs: &mut BitStream,
    ver: Version,
    codec: &dyn TextCodec,
    fallback: CharacterSet,
    text_mode: TextMode,
) -> ScanResult<DecoderResult> {
    let mut segs: Vec<Seg> = Vec::new();
    let mut bytes: Vec<u8> = Vec::new();
    let mut eci: Option<CharacterSet> = None;
    let mut has_eci = false;
    let mut fnc1 = Fnc1::None;
    let mut structured_append = None;

    let mode_len = match ver {
        Version::Micro(v) => v - 1,
        Version::Normal(_) => 4,
    };

    loop {
        let mode = match ver {
            Version::Normal(_) => {
                match bs.take_bits(4) {
                    // Header at or beyond the end terminates cleanly
                    None => break,
                    Some(0x0) => break,
                    Some(bits) => Mode::from_indicator(bits)?,
                }
            }
            Version::Micro(v) => {
                // Micro terminators are all-zero runs of 2v+1 bits; a
                // truncated all-zero tail counts too.
                let term_len = (2 * v + 1).min(bs.remaining());
                if term_len == 0 || bs.peek_bits(term_len) == Some(0) {
                    break;
                }
                match bs.take_bits(mode_len) {
                    None => break,
                    Some(bits) => Mode::from_micro_indicator(bits, v)?,
                }
            }
        };

        match mode {
            Mode::Terminator => break,
            Mode::Eci => {
                let designator = take_eci_designator(bs)?;
                eci = CharacterSet::from_eci(designator);
                has_eci = true;
            }
            Mode::Fnc1First => fnc1 = Fnc1::FirstPosition,
            Mode::Fnc1Second => {
                let ai = bs.take_bits(8).ok_or(Error::Format("FNC1 indicator overruns stream"))?;
                fnc1 = Fnc1::SecondPosition(ai as u8);
            }
            Mode::StructuredAppend => {
                let index = bs.take_bits(4).ok_or(Error::Format("SA header overruns stream"))?;
                let count = bs.take_bits(4).ok_or(Error::Format("SA header overruns stream"))?;
                let parity = bs.take_bits(8).ok_or(Error::Format("SA header overruns stream"))?;
                structured_append =
                    Some(StructuredAppendInfo { index, count: count + 1, id: parity.to_string() });
            }
            Mode::Numeric => {
                let n = bs
                    .take_bits(mode.char_count_bits(ver))
                    .ok_or(Error::Format("character count overruns stream"))?;
                let text = decode_numeric(bs, n as usize)?;
                bytes.extend_from_slice(text.as_bytes());
                segs.push(Seg::Decoded(text));
            }
            Mode::Alphanumeric => {
                let n = bs
                    .take_bits(mode.char_count_bits(ver))
                    .ok_or(Error::Format("character count overruns stream"))?;
                let text = decode_alphanumeric(bs, n as usize, fnc1 != Fnc1::None)?;
                bytes.extend_from_slice(text.as_bytes());
                segs.push(Seg::Decoded(text));
            }
            Mode::Byte => {
                let n = bs
                    .take_bits(mode.char_count_bits(ver))
                    .ok_or(Error::Format("character count overruns stream"))?;
                let mut raw = Vec::with_capacity(n as usize);
                for _ in 0..n {
                    let b = bs.take_bits(8).ok_or(Error::Format("byte segment overruns stream"))?;
                    raw.push(b as u8);
                }
                bytes.extend_from_slice(&raw);
                segs.push(Seg::Bytes(raw, eci));
            }
            Mode::Kanji => {
                let n = bs
                    .take_bits(mode.char_count_bits(ver))
                    .ok_or(Error::Format("character count overruns stream"))?;
                let sjis = decode_kanji(bs, n as usize)?;
                bytes.extend_from_slice(&sjis);
                let text = codec.to_utf8(&sjis, CharacterSet::ShiftJIS)?;
                segs.push(Seg::Decoded(text));
            }
        }
    }

    // Undeclared byte content gets one guess over its full concatenation so
    // multi-segment payloads stay in a single character set.
    let undeclared: Vec<u8> = segs
        .iter()
        .filter_map(|s| match s {
            Seg::Bytes(b, None) => Some(b.as_slice()),
            _ => None,
        })
        .flat_map(|b| b.iter().copied())
        .collect();
    let guessed =
        if undeclared.is_empty() { fallback } else { codec.guess(&undeclared, fallback) };

    let character_set = eci.unwrap_or(guessed);
    let text = render_text(&segs, &bytes, codec, guessed, text_mode)?;

    Ok(DecoderResult { bytes, text, character_set, structured_append, fnc1, has_eci })
}

fn take_eci_designator(bs: &mut BitStream) -> ScanResult<u32> {
    let overrun = Error::Format("ECI designator overruns stream");
    let head = bs.take_bits(8).ok_or(overrun.clone())?;
    if head & 0x80 == 0 {
        Ok(head)
    } else if head & 0xc0 == 0x80 {
        let tail = bs.take_bits(8).ok_or(overrun)?;
        Ok(((head & 0x3f) << 8) | tail)
    } else if head & 0xe0 == 0xc0 {
        let tail = bs.take_bits(16).ok_or(overrun)?;
        Ok(((head & 0x1f) << 16) | tail)
    } else {
        Err(Error::Format("invalid ECI designator prefix"))
    }
}

fn decode_numeric(bs: &mut BitStream, mut count: usize) -> ScanResult<String> {
    let overrun = Error::Format("numeric segment overruns stream");
    let invalid = Error::Format("invalid digit group");
    let mut out = String::with_capacity(count);

    while count >= 3 {
        let v = bs.take_bits(10).ok_or(overrun.clone())?;
        if v >= 1000 {
            return Err(invalid);
        }
        out.push_str(&format!("{v:03}"));
        count -= 3;
    }
    match count {
        2 => {
            let v = bs.take_bits(7).ok_or(overrun)?;
            if v >= 100 {
                return Err(invalid);
            }
            out.push_str(&format!("{v:02}"));
        }
        1 => {
            let v = bs.take_bits(4).ok_or(overrun)?;
            if v >= 10 {
                return Err(invalid);
            }
            out.push_str(&format!("{v}"));
        }
        _ => {}
    }
    Ok(out)
}

static ALNUM_TABLE: &[u8; 45] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

fn decode_alphanumeric(bs: &mut BitStream, mut count: usize, fnc1: bool) -> ScanResult<String> {
    let overrun = Error::Format("alphanumeric segment overruns stream");
    let invalid = Error::Format("invalid alphanumeric pair");
    let mut chars = Vec::with_capacity(count);

    while count >= 2 {
        let v = bs.take_bits(11).ok_or(overrun.clone())? as usize;
        if v >= 45 * 45 {
            return Err(invalid);
        }
        chars.push(ALNUM_TABLE[v / 45]);
        chars.push(ALNUM_TABLE[v % 45]);
        count -= 2;
    }
    if count == 1 {
        let v = bs.take_bits(6).ok_or(overrun)? as usize;
        if v >= 45 {
            return Err(invalid);
        }
        chars.push(ALNUM_TABLE[v]);
    }

    // In a FNC1 symbol "%" transports GS and "%%" a literal percent.
    if fnc1 {
        let mut folded = Vec::with_capacity(chars.len());
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == b'%' {
                if chars.get(i + 1) == Some(&b'%') {
                    folded.push(b'%');
                    i += 2;
                } else {
                    folded.push(0x1d);
                    i += 1;
                }
            } else {
                folded.push(chars[i]);
                i += 1;
            }
        }
        chars = folded;
    }

    Ok(String::from_utf8(chars).expect("alphanumeric output is ASCII"))
}

fn decode_kanji(bs: &mut BitStream, count: usize) -> ScanResult<Vec<u8>> {
    let overrun = Error::Format("kanji segment overruns stream");
    let mut sjis = Vec::with_capacity(count * 2);
    for _ in 0..count {
        let v = bs.take_bits(13).ok_or(overrun.clone())?;
        let folded = ((v / 0xc0) << 8) | (v % 0xc0);
        let code = if folded < 0x1f00 { folded + 0x8140 } else { folded + 0xc140 };
        sjis.push((code >> 8) as u8);
        sjis.push((code & 0xff) as u8);
    }
    Ok(sjis)
}

// Text rendering
//------------------------------------------------------------------------------

static CONTROL_NAMES: [&str; 33] = [
    "<NUL>", "<SOH>", "<STX>", "<ETX>", "<EOT>", "<ENQ>", "<ACK>", "<BEL>", "<BS>", "<HT>",
    "<LF>", "<VT>", "<FF>", "<CR>", "<SO>", "<SI>", "<DLE>", "<DC1>", "<DC2>", "<DC3>", "<DC4>",
    "<NAK>", "<SYN>", "<ETB>", "<CAN>", "<EM>", "<SUB>", "<ESC>", "<FS>", "<GS>", "<RS>", "<US>",
    "<DEL>",
];

fn escape_controls(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\0'..='\x1f' => out.push_str(CONTROL_NAMES[ch as usize]),
            '\x7f' => out.push_str(CONTROL_NAMES[32]),
            _ => out.push(ch),
        }
    }
    out
}

fn render_text(
    segs: &[Seg],
    bytes: &[u8],
    codec: &dyn TextCodec,
    guessed: CharacterSet,
    mode: TextMode,
) -> ScanResult<String> {
    if mode == TextMode::Hex {
        let mut out = String::with_capacity(bytes.len() * 3);
        for (i, b) in bytes.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            out.push_str(&format!("{b:02X}"));
        }
        return Ok(out);
    }

    let mut out = String::new();
    let mut current_eci: Option<u32> = None;
    for seg in segs {
        let (text, cs) = match seg {
            // Numeric/alphanumeric/kanji segments are already unicode
            Seg::Decoded(t) => (t.clone(), CharacterSet::Utf8),
            Seg::Bytes(raw, declared) => {
                let cs = declared.unwrap_or(guessed);
                (codec.to_utf8(raw, cs)?, cs)
            }
        };
        if mode == TextMode::Eci && current_eci != Some(cs.eci()) {
            out.push_str(&format!("\\{:06}", cs.eci()));
            current_eci = Some(cs.eci());
        }
        match mode {
            TextMode::Escaped | TextMode::Hri => out.push_str(&escape_controls(&text)),
            TextMode::Eci => out.push_str(&text.replace('\\', "\\\\")),
            _ => out.push_str(&text),
        }
    }
    Ok(out)
}
