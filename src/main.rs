// Ticket/bill field extraction demo
// Feeds recognized text and/or a raw QR payload through the pipeline and
// prints the merged record

use std::fs;
use std::path::PathBuf;

use clap::Parser;

use farescan::models::BillRecord;
use farescan::utils::ScanError;
use farescan::BillScanner;

#[derive(Parser)]
#[command(name = "farescan", about = "Extract structured fields from scanned tickets and QR payloads")]
struct Args {
    /// Path to a file holding text recognized from a ticket photo
    #[arg(long)]
    text_file: Option<PathBuf>,

    /// Raw payload string decoded from a QR/barcode scan
    #[arg(long)]
    payload: Option<String>,

    /// Print the merged record as JSON instead of the report
    #[arg(long)]
    json: bool,
}

fn print_report(record: &BillRecord) {
    println!("\n===============================================");
    println!("         TICKET EXTRACTION REPORT");
    println!("===============================================\n");

    println!("  Ticket Number: {}", record.ticket_number.as_deref().unwrap_or("-"));
    match record.amount {
        Some(amount) => println!("  Amount: {:.2}", amount),
        None => println!("  Amount: -"),
    }
    match record.date {
        Some(date) => println!("  Date: {}", date.format("%d/%m/%Y %H:%M")),
        None => println!("  Date: -"),
    }
    println!("  Origin: {}", record.origin.as_deref().unwrap_or("-"));
    println!("  Destination: {}", record.destination.as_deref().unwrap_or("-"));
    println!(
        "  Emissions Saved: {}",
        record.emissions_saved.as_deref().unwrap_or("-")
    );
}

fn main() -> Result<(), ScanError> {
    env_logger::init();
    let args = Args::parse();

    if args.text_file.is_none() && args.payload.is_none() {
        return Err(ScanError::MissingInput(
            "pass --text-file and/or --payload".to_string(),
        ));
    }

    let scanner = BillScanner::new();

    // Each modality produces a candidate; a missing input contributes an
    // empty candidate to the merge
    let ocr_candidate = match &args.text_file {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            scanner.extract_from_text(&text)
        }
        None => BillRecord::default(),
    };

    let qr_candidate = match &args.payload {
        Some(payload) => scanner.extract_from_payload(payload),
        None => BillRecord::default(),
    };

    let merged = scanner.merge(ocr_candidate, qr_candidate);

    if args.json {
        match serde_json::to_string_pretty(&merged) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => eprintln!("failed to render record: {}", e),
        }
    } else {
        print_report(&merged);
    }

    Ok(())
}
