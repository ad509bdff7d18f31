//! Overlay ROI rectangles and detected meniscus lines on retained frames.

use std::path::Path;

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::batch::{TimeSeries, CONTAINERS};
use crate::output::OutputError;
use crate::roi::Roi;

pub const ROI_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const MENISCUS_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

const MENISCUS_THICKNESS: u32 = 2;

/// Copy of `frame` with both ROIs outlined and each detected meniscus drawn
/// as a horizontal line across its ROI.
pub fn annotate_frame(
    frame: &RgbImage,
    rois: &[Roi; CONTAINERS],
    meniscus_rows: &[Option<u32>; CONTAINERS],
) -> RgbImage {
    let mut out = frame.clone();
    for (roi, row) in rois.iter().zip(meniscus_rows) {
        draw_hollow_rect_mut(
            &mut out,
            Rect::at(roi.x as i32, roi.y as i32).of_size(roi.width, roi.height),
            ROI_COLOR,
        );
        let Some(row) = *row else {
            continue;
        };
        let x0 = roi.x as f32;
        let x1 = (roi.x + roi.width - 1) as f32;
        for dy in 0..MENISCUS_THICKNESS {
            let y = (row + dy) as f32;
            draw_line_segment_mut(&mut out, (x0, y), (x1, y), MENISCUS_COLOR);
        }
    }
    out
}

/// Write one annotated image per retained frame into `dir`, named after the
/// source frame. Returns the number of images written.
pub fn write_annotated_frames(
    series: &TimeSeries,
    rois: &[Roi; CONTAINERS],
    dir: &Path,
) -> Result<usize, OutputError> {
    if series.frames.is_empty() {
        tracing::warn!("no retained frames to annotate");
        return Ok(0);
    }
    std::fs::create_dir_all(dir).map_err(|source| OutputError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut written = 0;
    for (frame, sample) in series.frames.iter().zip(&series.samples) {
        let annotated = annotate_frame(&frame.image, rois, &sample.meniscus_rows);
        annotated.save(dir.join(&frame.file_name))?;
        written += 1;
    }
    tracing::info!("{} annotated frames written to {}", written, dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rois() -> [Roi; 2] {
        [
            Roi::new(2, 2, 10, 20).unwrap(),
            Roi::new(20, 2, 10, 20).unwrap(),
        ]
    }

    #[test]
    fn draws_rois_and_lines() {
        let frame = RgbImage::new(40, 30);
        let out = annotate_frame(&frame, &rois(), &[Some(10), None]);
        assert_eq!(*out.get_pixel(2, 2), ROI_COLOR);
        assert_eq!(*out.get_pixel(29, 21), ROI_COLOR);
        assert_eq!(*out.get_pixel(6, 10), MENISCUS_COLOR);
        assert_eq!(*out.get_pixel(6, 11), MENISCUS_COLOR);
        assert_eq!(*out.get_pixel(6, 12), Rgb([0, 0, 0]));
        // No line in the second container.
        assert_eq!(*out.get_pixel(25, 10), Rgb([0, 0, 0]));
        // Source is untouched.
        assert_eq!(*frame.get_pixel(6, 10), Rgb([0, 0, 0]));
    }

    #[test]
    fn nothing_retained_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let n = write_annotated_frames(&TimeSeries::default(), &rois(), dir.path()).unwrap();
        assert_eq!(n, 0);
    }
}
