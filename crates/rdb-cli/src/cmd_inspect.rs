/// Implementation of `rdb inspect`.
///
/// Streams the dump and prints one line per object, optionally followed by
/// its elements. Objects are printed as they are decoded, so the command
/// works on dumps larger than memory, and `--limit` stops reading early.
///
/// # Output format
///
/// ```text
/// db=0 string "greeting" 5 bytes [string]
/// db=0 hash "user:1" 2 fields [hash-listpack] expire=2024-01-01T00:00:00.000Z
///     name => ada
///     role => admin
/// ---
/// version 12, 2 objects printed
/// ```
use anyhow::{Context, Result};
use rdb_decoder::{Control, RdbDecoder};

use crate::InspectArgs;
use crate::render;

/// Run the `rdb inspect` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to decode. Objects
/// printed before the failure stay on stdout.
pub fn run(args: &InspectArgs) -> Result<()> {
    let reader = crate::open(&args.file)?;
    let decoder = RdbDecoder::with_config(args.decode.to_config());

    let mut printed = 0u64;
    let summary = decoder
        .parse(reader, |object| {
            if args.db.is_some_and(|db| db != object.db) {
                return Control::Continue;
            }

            println!("{}", render::object_line(&object));
            if args.show_values {
                for line in render::value_lines(&object.payload) {
                    println!("    {line}");
                }
            }

            printed += 1;
            if args.limit.is_some_and(|limit| printed >= limit) {
                Control::Stop
            } else {
                Control::Continue
            }
        })
        .with_context(|| format!("failed to decode {}", args.file.display()))?;

    println!("---");
    println!(
        "version {}, {printed} object{} printed{}",
        summary.version,
        if printed == 1 { "" } else { "s" },
        if summary.stopped_early { " (stopped at limit)" } else { "" }
    );
    Ok(())
}
