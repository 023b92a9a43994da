use crate::{
    codec::DecoderResult,
    error::Error,
    geometry::PointI,
    metadata::{BarcodeFormat, ECLevel, Version},
};

// Position
//------------------------------------------------------------------------------

/// The four image-space corners of a symbol: top-left, top-right,
/// bottom-right, bottom-left in symbol coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position(pub [PointI; 4]);

impl Position {
    pub fn top_left(&self) -> PointI {
        self.0[0]
    }

    pub fn top_right(&self) -> PointI {
        self.0[1]
    }

    pub fn bottom_right(&self) -> PointI {
        self.0[2]
    }

    pub fn bottom_left(&self) -> PointI {
        self.0[3]
    }

    /// Rotation of the symbol in the image, snapped to a quarter turn.
    pub fn orientation(&self) -> i32 {
        let d = (self.top_right() - self.top_left()).to_f64();
        let deg = d.y.atan2(d.x).to_degrees();
        (((deg / 90.0).round() as i32 * 90) % 360 + 360) % 360
    }

    fn bounds(&self) -> (i32, i32, i32, i32) {
        let xs = self.0.iter().map(|p| p.x);
        let ys = self.0.iter().map(|p| p.y);
        (
            xs.clone().min().unwrap(),
            ys.clone().min().unwrap(),
            xs.max().unwrap(),
            ys.max().unwrap(),
        )
    }

    /// Bounding boxes intersect; used to deduplicate repeated reads of the
    /// same symbol across pipeline attempts.
    pub fn overlaps(&self, other: &Position) -> bool {
        let (al, at, ar, ab) = self.bounds();
        let (bl, bt, br, bb) = other.bounds();
        al <= br && bl <= ar && at <= bb && bt <= ab
    }
}

// Barcode
//------------------------------------------------------------------------------

/// One decoded symbol, or (with `return_errors`) one failed candidate with
/// its error attached.
#[derive(Debug, Clone, Default)]
pub struct Barcode {
    pub text: String,
    pub bytes: Vec<u8>,
    pub format: Option<BarcodeFormat>,
    pub position: Position,
    pub orientation: i32,
    pub ec_level: String,
    pub symbology_identifier: String,
    pub sequence_size: i32,
    pub sequence_index: i32,
    pub sequence_id: String,
    pub reader_init: bool,
    pub line_count: usize,
    pub is_mirrored: bool,
    pub error: Option<Error>,
}

impl Barcode {
    pub(crate) fn from_decode(
        res: DecoderResult,
        ver: Version,
        ecl: ECLevel,
        position: Position,
        is_mirrored: bool,
    ) -> Self {
        let modifier = res.symbology_modifier();
        let (seq_size, seq_index, seq_id) = match &res.structured_append {
            Some(sa) => (sa.count as i32, sa.index as i32, sa.id.clone()),
            None => (-1, -1, String::new()),
        };
        Self {
            text: res.text,
            bytes: res.bytes,
            format: Some(ver.format()),
            position,
            orientation: position.orientation(),
            ec_level: ecl.to_string(),
            symbology_identifier: format!("]Q{modifier}"),
            sequence_size: seq_size,
            sequence_index: seq_index,
            sequence_id: seq_id,
            reader_init: false,
            line_count: 0,
            is_mirrored,
            error: None,
        }
    }

    pub(crate) fn from_error(err: Error, position: Position) -> Self {
        Self { position, orientation: position.orientation(), error: Some(err), ..Self::default() }
    }

    pub fn is_valid(&self) -> bool {
        self.error.is_none() && self.format.is_some()
    }
}
