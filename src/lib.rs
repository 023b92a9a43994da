//! Matrix-barcode decoding engine with QR Code as the reference symbology.
//!
//! The pipeline takes a borrowed luminance image and yields the decoded
//! text plus structural metadata for every symbol found: binarization,
//! finder and alignment pattern detection, perspective sampling, format and
//! version recovery, data-mask removal, block de-interleaving, Reed-Solomon
//! correction and multi-mode bit-stream parsing.
//!
//! ```no_run
//! use deqr::{read_barcodes, ImageFormat, ImageView, ReaderOptions};
//!
//! let (data, w, h) = (vec![0u8; 640 * 480], 640, 480);
//! let image = ImageView::packed(&data, w, h, ImageFormat::Lum).unwrap();
//! for symbol in read_barcodes(&image, &ReaderOptions::new()) {
//!     println!("{}: {}", symbol.format.unwrap(), symbol.text);
//! }
//! ```
//!
//! The engine is synchronous and keeps no state between calls; concurrent
//! reads on disjoint inputs are safe.

mod bitmatrix;
mod charset;
mod codec;
mod decoder;
mod ec;
mod error;
mod geometry;
mod image;
mod mask;
mod metadata;
mod options;
mod reader;
mod result;
mod utils;

pub use bitmatrix::BitMatrix;
pub use charset::{default_codec, CharacterSet, TextCodec};
pub use codec::{Fnc1, StructuredAppendInfo};
pub use decoder::decode_matrix;
pub use error::{Error, ScanResult};
pub use geometry::{Point, PointF, PointI};
pub use self::image::{ImageFormat, ImageView};
pub use mask::MaskPattern;
pub use metadata::{BarcodeFormat, ECLevel, Version};
pub use options::{Binarizer, ReaderOptions, TextMode};
pub use reader::{read_barcode, read_barcodes};
pub use result::{Barcode, Position};
pub use utils::{BitArray, BitStream};
