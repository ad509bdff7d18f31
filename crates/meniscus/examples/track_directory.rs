use meniscus::{write_csv_file, write_json_file, Roi, VolumeTracker, DEFAULT_CSV_NAME};
use std::error::Error;
use std::path::Path;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        eprintln!(
            "Usage: {} <frames_dir> <calibration.txt> <roi1 x,y,w,h> <roi2 x,y,w,h> [out.json]",
            args[0]
        );
        std::process::exit(2);
    }

    let frames_dir = Path::new(&args[1]);
    let rois: [Roi; 2] = [args[3].parse()?, args[4].parse()?];
    let tracker = VolumeTracker::from_files(rois, Path::new(&args[2]), None)?;
    let result = tracker.track_dir(frames_dir)?;

    let last = result.cleaned.samples.last();
    println!(
        "Tracked {} frames; last total volume: {}",
        result.cleaned.len(),
        last.and_then(|s| s.total_volume())
            .map(|v| format!("{v:.2}"))
            .unwrap_or_else(|| "n/a".to_string())
    );

    let csv_path = frames_dir.join(DEFAULT_CSV_NAME);
    write_csv_file(&result.cleaned, &csv_path)?;
    println!("Wrote {}", csv_path.display());

    if let Some(out_path) = args.get(5) {
        write_json_file(&result, Path::new(out_path))?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
