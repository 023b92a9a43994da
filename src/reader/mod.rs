pub mod alignment;
pub mod binarize;
pub mod detect;
pub mod finder;
pub mod perspective;
pub mod sampler;

use crate::{
    bitmatrix::BitMatrix,
    decoder,
    geometry::PointI,
    image::{ImageFormat, ImageView},
    metadata::BarcodeFormat,
    options::ReaderOptions,
    result::{Barcode, Position},
};

// Orchestrator
//------------------------------------------------------------------------------

const DOWNSCALE_THRESHOLD: usize = 500;

/// Runs the full pipeline over one image: binarize, locate, sample, decode.
/// Tries the plain image first, then inversion and quarter turns per the
/// options, then downscaled passes for very large inputs. Results are
/// deterministic for a given input and configuration.
pub fn read_barcodes(image: &ImageView, opts: &ReaderOptions) -> Vec<Barcode> {
    let mut results: Vec<Barcode> = Vec::new();
    if !opts.accepts(BarcodeFormat::QRCode) && !opts.accepts(BarcodeFormat::MicroQRCode) {
        // rMQR alone leaves nothing this pipeline can decode
        return results;
    }

    let bin = binarize::binarize(image, opts.binarizer);
    scan_attempts(&bin, opts, 1, &mut results);

    if opts.try_downscale
        && !results.iter().any(|r| r.is_valid())
        && image.width().min(image.height()) >= DOWNSCALE_THRESHOLD
    {
        for factor in [2usize, 3] {
            let (buf, w, h) = image.downscale(factor);
            let view = ImageView::packed(&buf, w, h, ImageFormat::Lum)
                .expect("downscaled buffer is consistent");
            let bin = binarize::binarize(&view, opts.binarizer);
            scan_attempts(&bin, opts, factor, &mut results);
            if results.iter().any(|r| r.is_valid()) {
                break;
            }
        }
    }

    // Failed candidates survive only when asked for and only where no
    // successful read covers the same area
    let valid: Vec<Position> = results.iter().filter(|r| r.is_valid()).map(|r| r.position).collect();
    results.retain(|r| {
        r.is_valid() || (opts.return_errors && !valid.iter().any(|p| p.overlaps(&r.position)))
    });
    results
}

/// First result, if any.
pub fn read_barcode(image: &ImageView, opts: &ReaderOptions) -> Option<Barcode> {
    let mut capped = opts.clone();
    capped.max_number_of_symbols(1);
    read_barcodes(image, &capped).into_iter().next()
}

// Attempts
//------------------------------------------------------------------------------

type Unmap = Box<dyn Fn(PointI) -> PointI>;

fn scan_attempts(bin: &BitMatrix, opts: &ReaderOptions, scale: usize, out: &mut Vec<Barcode>) {
    let (w, h) = (bin.width() as i32, bin.height() as i32);
    let mut attempts: Vec<(BitMatrix, Unmap)> = Vec::new();

    attempts.push((bin.clone(), Box::new(|p| p)));
    if opts.try_invert {
        let mut inv = bin.clone();
        inv.flip_all();
        attempts.push((inv, Box::new(|p| p)));
    }
    if opts.try_rotate {
        let r90 = bin.rotate90();
        let r180 = {
            let mut m = bin.clone();
            m.rotate180();
            m
        };
        let r270 = r90.rotate90().rotate90();
        attempts.push((r90, Box::new(move |p| PointI::new(p.y, h - 1 - p.x))));
        attempts.push((r180, Box::new(move |p| PointI::new(w - 1 - p.x, h - 1 - p.y))));
        attempts.push((r270, Box::new(move |p| PointI::new(w - 1 - p.y, p.x))));
    }

    for (bits, unmap) in &attempts {
        if valid_count(out) >= opts.max_number_of_symbols {
            break;
        }
        scan_one(bits, opts, unmap, scale, out);
    }
}

fn scan_one(
    bits: &BitMatrix,
    opts: &ReaderOptions,
    unmap: &Unmap,
    scale: usize,
    out: &mut Vec<Barcode>,
) {
    let map_position = |pos: &Position| -> Position {
        let mut corners = [PointI::new(0, 0); 4];
        for (c, p) in corners.iter_mut().zip(pos.0.iter()) {
            let q = unmap(*p);
            *c = PointI::new(q.x * scale as i32, q.y * scale as i32);
        }
        Position(corners)
    };

    if opts.is_pure {
        let detected = match detect::detect_pure(bits) {
            Ok(d) => d,
            Err(_) => return,
        };
        let position = map_position(&detected.position);
        match decoder::decode(&detected.bits, opts) {
            Ok(dec) if opts.accepts(dec.ver.format()) => {
                let mut barcode =
                    Barcode::from_decode(dec.result, dec.ver, dec.ecl, position, dec.is_mirrored);
                barcode.line_count = detected.line_count;
                push_deduped(out, barcode);
            }
            Ok(_) => push_deduped(
                out,
                Barcode::from_error(
                    crate::error::Error::Unsupported("format excluded by configuration"),
                    position,
                ),
            ),
            Err(e) => push_deduped(out, Barcode::from_error(e, position)),
        }
        return;
    }

    let finders = finder::locate_finders(bits, opts.try_harder);
    for set in finder::group_finders(&finders) {
        if valid_count(out) >= opts.max_number_of_symbols {
            return;
        }
        let detected = match detect::detect_from_set(bits, &set) {
            Ok(d) => d,
            Err(_) => continue, // this triple was not a symbol; keep looking
        };
        let position = map_position(&detected.position);
        match decoder::decode(&detected.bits, opts) {
            Ok(dec) if opts.accepts(dec.ver.format()) => {
                let mut barcode =
                    Barcode::from_decode(dec.result, dec.ver, dec.ecl, position, dec.is_mirrored);
                barcode.line_count = detected.line_count;
                push_deduped(out, barcode);
            }
            Ok(_) => push_deduped(
                out,
                Barcode::from_error(
                    crate::error::Error::Unsupported("format excluded by configuration"),
                    position,
                ),
            ),
            Err(e) => push_deduped(out, Barcode::from_error(e, position)),
        }
    }
}

fn valid_count(out: &[Barcode]) -> usize {
    out.iter().filter(|r| r.is_valid()).count()
}

// Overlapping re-reads of one symbol collapse onto the first (best-scored)
// occurrence.
fn push_deduped(out: &mut Vec<Barcode>, candidate: Barcode) {
    if candidate.is_valid() {
        let dup = out.iter().any(|r| {
            r.is_valid() && r.text == candidate.text && r.position.overlaps(&candidate.position)
        });
        if !dup {
            out.push(candidate);
        }
    } else {
        let covered = out.iter().any(|r| r.position.overlaps(&candidate.position));
        if !covered {
            out.push(candidate);
        }
    }
}

#[cfg(test)]
mod reader_tests {
    use super::*;
    use crate::options::ReaderOptions;

    #[test]
    fn test_blank_image_yields_no_results_and_no_error() {
        let data = vec![255u8; 64 * 64];
        let img = ImageView::packed(&data, 64, 64, ImageFormat::Lum).unwrap();
        let results = read_barcodes(&img, &ReaderOptions::new());
        assert!(results.is_empty());
    }

    #[test]
    fn test_rmqr_only_filter_short_circuits() {
        let data = vec![255u8; 32 * 32];
        let img = ImageView::packed(&data, 32, 32, ImageFormat::Lum).unwrap();
        let mut opts = ReaderOptions::new();
        opts.formats(&[crate::metadata::BarcodeFormat::RMQRCode]);
        assert!(read_barcodes(&img, &opts).is_empty());
    }
}
