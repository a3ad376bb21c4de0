use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration
    const NUM_BRANCHES: u64 = 5_000_000;
    const OUTPUT_FILE: &str = "large_trace.out";

    println!("Generating trace with {} branch records...", NUM_BRANCHES);
    let start_time = Instant::now();

    let file = File::create(OUTPUT_FILE)?;
    let mut writer = BufWriter::with_capacity(8 * 1024 * 1024, file); // 8MB buffer

    // Pseudo-random but reproducible branch stream
    let mut state: u64 = 0x9e37_79b9_7f4a_7c15;
    let mut pc: u64 = 0x40_0000;

    let progress_interval = NUM_BRANCHES / 10;

    for i in 0..NUM_BRANCHES {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;

        let kind = match state % 8 {
            0 => "CALL",
            1 => "RET",
            2 | 3 => "JMP",
            _ => "JCC",
        };
        let taken = u8::from(kind != "JCC" || state & 0x10 != 0);
        let target = pc.wrapping_add((state >> 32) & 0xfff);

        writeln!(writer, "{i} {pc:#x} {target:#x} {kind} {taken}")?;
        pc = if taken == 1 { target } else { pc + 4 };

        if i > 0 && i % progress_interval == 0 {
            println!("Progress: {}% ({}/{} records)", i * 100 / NUM_BRANCHES, i, NUM_BRANCHES);
        }
    }

    writer.flush()?;
    drop(writer); // Close the file

    let file_info = std::fs::metadata(OUTPUT_FILE)?;
    let file_size_mb = file_info.len() as f64 / (1024.0 * 1024.0);

    let duration = start_time.elapsed();
    println!("Generation completed in {:.2} seconds", duration.as_secs_f64());
    println!("Generated file: {}", OUTPUT_FILE);
    println!("File size: {:.2} MB", file_size_mb);
    println!("Records: {}", NUM_BRANCHES);
    println!("Bytes per record: {:.2}", file_info.len() as f64 / NUM_BRANCHES as f64);

    Ok(())
}
