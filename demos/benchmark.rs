use std::fs;
use std::process::Command;
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // First, check if the large trace file exists, if not generate it
    let trace_file = "large_trace.out";
    let output_dir = "bench_cut";

    if !std::path::Path::new(trace_file).exists() {
        println!("Large trace file not found. Generating it first...");
        Command::new("cargo")
            .args(["run", "--release", "--example", "generate_large_trace"])
            .status()?;
    }

    let file_info = fs::metadata(trace_file)?;
    let input_size_mb = file_info.len() as f64 / (1024.0 * 1024.0);
    println!("Input file size: {:.2} MB", input_size_mb);

    // Segment size, description
    let segment_sizes = [
        (1_000, "Tiny segments"),
        (100_000, "Small segments"),
        (500_000, "Medium segments"),
        (1_000_000, "Large segments (60% of input)"),
        (2_000_000, "Oversized (skipped)"),
    ];

    for (segment_size, description) in segment_sizes {
        println!("\nRunning benchmark for {} ({} lines)", description, segment_size);
        let start_time = Instant::now();

        let status = Command::new("cargo")
            .args([
                "run",
                "--release",
                "--",
                &segment_size.to_string(),
                trace_file,
                output_dir,
            ])
            .status()?;

        if status.success() {
            let duration = start_time.elapsed();
            println!("Processing completed in {:.2} seconds", duration.as_secs_f64());
            println!("Processing speed: {:.2} MB/s", 2.0 * input_size_mb / duration.as_secs_f64());

            match fs::metadata(format!("{output_dir}/large_trace_cutted.out")) {
                Ok(output_info) => {
                    let output_size_mb = output_info.len() as f64 / (1024.0 * 1024.0);
                    println!("Output file size: {:.2} MB", output_size_mb);
                }
                Err(_) => println!("No output file produced"),
            }
            let _ = fs::remove_file(format!("{output_dir}/large_trace_cutted.out"));
        } else {
            println!("Failed to process trace file");
        }
    }

    Ok(())
}
