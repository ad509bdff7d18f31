use std::path::Path;

use image::{Rgb, RgbImage};
use meniscus::{
    write_annotated_frames, write_csv_file, Calibration, ContainerShape, DirectorySink,
    DirectorySource, PipelineConfig, Roi, VolumeTracker, BLUR_DIR, CSV_HEADER, PROCESSED_DIR,
};

const W: u32 = 160;
const H: u32 = 200;

fn rois() -> [Roi; 2] {
    [
        Roi::new(20, 20, 40, 150).unwrap(),
        Roi::new(100, 20, 40, 150).unwrap(),
    ]
}

/// Dark air above bright liquid inside each ROI, mid-grey elsewhere.
fn render(levels: [u32; 2]) -> RgbImage {
    let mut img = RgbImage::from_pixel(W, H, Rgb([90, 90, 90]));
    for (roi, level) in rois().iter().zip(levels) {
        for y in roi.y..roi.y + roi.height {
            let v = if y >= level { 220 } else { 20 };
            for x in roi.x..roi.x + roi.width {
                img.put_pixel(x, y, Rgb([v, v, v]));
            }
        }
    }
    img
}

fn write_frames(dir: &Path) {
    // Container 1 fills step by step, container 2 drains.
    let frames = [
        ("20240601-090000.jpg", [140, 60]),
        ("20240601-090100.jpg", [110, 90]),
        ("20240601-090200.jpg", [80, 120]),
    ];
    for (name, levels) in frames {
        render(levels).save(dir.join(name)).unwrap();
    }
    std::fs::write(dir.join("notes.txt"), "not a frame").unwrap();
    std::fs::write(dir.join("20240601-090300.jpg"), b"truncated").unwrap();
}

#[test]
fn csv_totals_match_row_sums() {
    let dir = tempfile::tempdir().unwrap();
    write_frames(dir.path());

    let cal = Calibration::new(ContainerShape::Cylindrical, 0.0, 6.0).unwrap();
    let tracker = VolumeTracker::new(rois(), cal).unwrap();
    let result = tracker.track_dir(dir.path()).unwrap();

    assert_eq!(result.cleaned.len(), 3);
    assert_eq!(result.raw.skipped_files, vec!["20240601-090300.jpg".to_string()]);

    let h1 = result.raw.height_column(0);
    let h2 = result.raw.height_column(1);
    assert!(h1[0] < h1[1] && h1[1] < h1[2], "{:?}", h1);
    assert!(h2[0] > h2[1] && h2[1] > h2[2], "{:?}", h2);
    for (h, expected) in h1.iter().zip([30i64, 60, 90]) {
        assert!((*h as i64 - expected).abs() <= 4, "{:?}", h1);
    }

    let csv_path = dir.path().join("volumes.csv");
    write_csv_file(&result.cleaned, &csv_path).unwrap();

    let mut rdr = csv::Reader::from_path(&csv_path).unwrap();
    let header: Vec<String> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
    assert_eq!(header, CSV_HEADER);
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 3);
    assert_eq!(&rows[0][0], "2024-06-01 09:00:00");
    assert_eq!(&rows[2][0], "2024-06-01 09:02:00");
    for row in &rows {
        let v1: f64 = row[3].parse().unwrap();
        let v2: f64 = row[4].parse().unwrap();
        let total: f64 = row[5].parse().unwrap();
        approx::assert_abs_diff_eq!(total, v1 + v2, epsilon = 1e-9);
        assert!((0.0..=6.0).contains(&v1) && (0.0..=6.0).contains(&v2));
    }
}

#[test]
fn diagnostics_and_annotations_land_on_disk() {
    let frames = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    write_frames(frames.path());

    let cal = Calibration::new(ContainerShape::Cylindrical, 1.0, 5.0).unwrap();
    let config = PipelineConfig {
        retain_frames: true,
        ..Default::default()
    };
    let tracker = VolumeTracker::with_config(rois(), cal, config).unwrap();
    let mut sink = DirectorySink::new(out.path());
    let result = tracker
        .track(&DirectorySource::new(frames.path()), &mut sink)
        .unwrap();

    for container in 1..=2 {
        for kind in [BLUR_DIR, PROCESSED_DIR] {
            let p = out
                .path()
                .join(kind)
                .join(format!("container{}", container))
                .join("20240601-090100.jpg");
            assert!(p.is_file(), "{}", p.display());
        }
    }

    assert!(result.raw.frames.is_empty());
    assert_eq!(result.cleaned.frames.len(), 3);

    let annotated_dir = out.path().join("annotated");
    let n = write_annotated_frames(&result.cleaned, tracker.rois(), &annotated_dir).unwrap();
    assert_eq!(n, 3);
    assert!(annotated_dir.join("20240601-090200.jpg").is_file());
}
