//! Runs the forensic pipeline on one image and prints the JSON response.
//!
//! Run with: cargo run --example analyze -- <image_path> [ela_output.png]

use std::env;

use forensic_pipeline::{ForensicsAnalyzer, error::Result, report::AnalysisResponse};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        println!("Usage: {} <image_path> [ela_output.png]", args[0]);
        return Ok(());
    }

    let analyzer = ForensicsAnalyzer::open(&args[1])?;
    let record = analyzer.full_analysis();

    match AnalysisResponse::from(&record).to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize response: {}", e),
    }

    if let Some(output) = args.get(2) {
        let ela = analyzer.ela(90)?;
        ela.save(output)?;
        println!("ELA image written to {}", output);
    }

    Ok(())
}
