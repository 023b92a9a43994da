use std::sync::Arc;

use crate::{
    charset::{CharacterSet, TextCodec},
    metadata::BarcodeFormat,
};

// Reader options
//------------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum Binarizer {
    #[default]
    LocalAverage,
    GlobalHistogram,
    FixedThreshold,
    BoolCast,
}

/// How decoded content is rendered into the `text` field.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub enum TextMode {
    #[default]
    Plain,
    Eci,
    Hri,
    Hex,
    Escaped,
}

/// Configuration for a read call; chained setters after the builder idiom.
#[derive(Clone)]
pub struct ReaderOptions {
    pub(crate) formats: Vec<BarcodeFormat>,
    pub(crate) try_harder: bool,
    pub(crate) try_rotate: bool,
    pub(crate) try_invert: bool,
    pub(crate) try_downscale: bool,
    pub(crate) is_pure: bool,
    pub(crate) binarizer: Binarizer,
    pub(crate) max_number_of_symbols: usize,
    pub(crate) return_errors: bool,
    pub(crate) text_mode: TextMode,
    pub(crate) character_set: CharacterSet,
    pub(crate) codec: Option<Arc<dyn TextCodec>>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            formats: Vec::new(),
            try_harder: true,
            try_rotate: true,
            try_invert: true,
            try_downscale: true,
            is_pure: false,
            binarizer: Binarizer::default(),
            max_number_of_symbols: 255,
            return_errors: false,
            text_mode: TextMode::default(),
            character_set: CharacterSet::Iso8859_1,
            codec: None,
        }
    }
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts reading to a subset of symbologies; empty means all.
    pub fn formats(&mut self, formats: &[BarcodeFormat]) -> &mut Self {
        self.formats = formats.to_vec();
        self
    }

    pub fn try_harder(&mut self, v: bool) -> &mut Self {
        self.try_harder = v;
        self
    }

    pub fn try_rotate(&mut self, v: bool) -> &mut Self {
        self.try_rotate = v;
        self
    }

    pub fn try_invert(&mut self, v: bool) -> &mut Self {
        self.try_invert = v;
        self
    }

    pub fn try_downscale(&mut self, v: bool) -> &mut Self {
        self.try_downscale = v;
        self
    }

    /// Assume a clean, axis-aligned symbol with quiet zone and skip the
    /// detection heuristics.
    pub fn is_pure(&mut self, v: bool) -> &mut Self {
        self.is_pure = v;
        self
    }

    pub fn binarizer(&mut self, b: Binarizer) -> &mut Self {
        self.binarizer = b;
        self
    }

    pub fn max_number_of_symbols(&mut self, n: usize) -> &mut Self {
        debug_assert!(n > 0, "Symbol cap must be positive");
        self.max_number_of_symbols = n;
        self
    }

    /// Also return symbols whose late pipeline stages failed, with their
    /// `error` populated.
    pub fn return_errors(&mut self, v: bool) -> &mut Self {
        self.return_errors = v;
        self
    }

    pub fn text_mode(&mut self, m: TextMode) -> &mut Self {
        self.text_mode = m;
        self
    }

    /// Fallback character set for byte segments without an ECI.
    pub fn character_set(&mut self, cs: CharacterSet) -> &mut Self {
        self.character_set = cs;
        self
    }

    /// Installs a transcoder; decoding falls back to the built-in
    /// `encoding_rs` codec otherwise.
    pub fn codec(&mut self, codec: Arc<dyn TextCodec>) -> &mut Self {
        self.codec = Some(codec);
        self
    }

    pub(crate) fn text_codec(&self) -> &dyn TextCodec {
        match &self.codec {
            Some(c) => c.as_ref(),
            None => crate::charset::default_codec(),
        }
    }

    pub(crate) fn accepts(&self, format: BarcodeFormat) -> bool {
        self.formats.is_empty() || self.formats.contains(&format)
    }
}

impl std::fmt::Debug for ReaderOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderOptions")
            .field("formats", &self.formats)
            .field("try_harder", &self.try_harder)
            .field("try_rotate", &self.try_rotate)
            .field("try_invert", &self.try_invert)
            .field("try_downscale", &self.try_downscale)
            .field("is_pure", &self.is_pure)
            .field("binarizer", &self.binarizer)
            .field("max_number_of_symbols", &self.max_number_of_symbols)
            .field("return_errors", &self.return_errors)
            .field("text_mode", &self.text_mode)
            .field("character_set", &self.character_set)
            .finish()
    }
}
