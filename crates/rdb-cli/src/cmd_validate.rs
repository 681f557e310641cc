/// Implementation of `rdb validate`.
///
/// Decodes every object and verifies the checksum trailer, then reports
/// either a series of success checkmarks (`✓`) or a diagnostic failure
/// line (`✗`) naming the byte offset. Verification is always on; the
/// command does not take `--no-verify-checksum`.
///
/// # Success output
///
/// ```text
/// ✓ Header: version 12
/// ✓ Objects: 1042 objects in 2 databases
/// ✓ Checksum: 0x3c1a9f0e5b7d2a41 matches
/// ```
///
/// # Failure output
///
/// ```text
/// ✗ Error at offset 1893: unknown object type 6 at offset 1893
/// ```
use anyhow::{Result, anyhow};
use rdb_decoder::{Control, DecodeError, DecodeSummary, RdbDecoder};

use crate::ValidateArgs;

/// Run the `rdb validate` command.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or fails validation.
pub fn run(args: &ValidateArgs) -> Result<()> {
    let reader = crate::open(&args.file)?;
    let config = args.format.to_config(true);

    match RdbDecoder::with_config(config).parse(reader, |_| Control::Continue) {
        Ok(summary) => {
            for line in report(&summary) {
                println!("{line}");
            }
            Ok(())
        }
        Err(e) => {
            println!("✗ {}", diagnostic(&e));
            Err(anyhow!("validation failed"))
        }
    }
}

fn report(summary: &DecodeSummary) -> Vec<String> {
    let objects = summary.objects;
    let databases = summary.databases.len().max(1);
    let checksum = match (summary.stored_checksum, summary.computed_checksum) {
        (None, _) => format!("none (version {} has no trailer)", summary.version),
        (Some(0), _) => "not stored (trailer is zero)".to_string(),
        (Some(stored), _) => format!("{stored:#018x} matches"),
    };

    vec![
        format!("✓ Header: version {}", summary.version),
        format!(
            "✓ Objects: {objects} object{} in {databases} database{}",
            if objects == 1 { "" } else { "s" },
            if databases == 1 { "" } else { "s" }
        ),
        format!("✓ Checksum: {checksum}"),
    ]
}

fn diagnostic(e: &DecodeError) -> String {
    match e.offset() {
        Some(offset) => format!("Error at offset {offset}: {e}"),
        None => format!("Error: {e}"),
    }
}
