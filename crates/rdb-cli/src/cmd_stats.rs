/// Implementation of `rdb stats`.
///
/// Streams the dump and prints object counts by type and by database,
/// how many keys carry an expire time, and the auxiliary fields.
///
/// # Example output
///
/// ```text
/// File:    dump.rdb  (48213 bytes read)
/// Version: 12
/// Objects: 1042 total, 17 with expiry
///
/// Type        Count
/// ─────────────────
/// string        800
/// hash          200
/// zset           42
///
/// Database    Count
/// ─────────────────
/// 0            1000
/// 1              42
///
/// Aux fields:
///   redis-ver = 7.2.4
/// ```
use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rdb_decoder::{DecodeSummary, RdbDecoder};
use rdb_types::{ObjectKind, RedisObject};

use crate::StatsArgs;

/// Running tallies, filled one object at a time.
#[derive(Debug, Default)]
struct Tally {
    by_kind: BTreeMap<ObjectKind, u64>,
    by_db: BTreeMap<u64, u64>,
    with_expiry: u64,
}

impl Tally {
    fn add(&mut self, object: &RedisObject) {
        *self.by_kind.entry(object.kind()).or_default() += 1;
        *self.by_db.entry(object.db).or_default() += 1;
        if object.metadata.expire.is_some() {
            self.with_expiry += 1;
        }
    }

    fn render(&self, summary: &DecodeSummary) -> Vec<String> {
        let mut lines = vec![
            format!("Version: {}", summary.version),
            format!(
                "Objects: {} total, {} with expiry",
                summary.objects, self.with_expiry
            ),
            String::new(),
            format!("{:<10}{:>7}", "Type", "Count"),
            "─".repeat(17),
        ];
        lines.extend(
            self.by_kind
                .iter()
                .map(|(kind, count)| format!("{:<10}{count:>7}", kind.as_str())),
        );

        lines.push(String::new());
        lines.push(format!("{:<10}{:>7}", "Database", "Count"));
        lines.push("─".repeat(17));
        lines.extend(
            self.by_db
                .iter()
                .map(|(db, count)| format!("{db:<10}{count:>7}")),
        );

        if !summary.aux.is_empty() {
            lines.push(String::new());
            lines.push("Aux fields:".to_string());
            lines.extend(summary.aux.iter().map(|(k, v)| {
                format!(
                    "  {} = {}",
                    String::from_utf8_lossy(k),
                    String::from_utf8_lossy(v)
                )
            }));
        }
        lines
    }
}

/// Run the `rdb stats` command.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails to decode.
pub fn run(args: &StatsArgs) -> Result<()> {
    let reader = crate::open(&args.file)?;
    let decoder = RdbDecoder::with_config(args.decode.to_config());

    let mut tally = Tally::default();
    let mut stream = decoder.stream(reader);
    for object in &mut stream {
        let object = object.with_context(|| format!("failed to decode {}", args.file.display()))?;
        tally.add(&object);
    }

    println!(
        "File:    {}  ({} bytes read)",
        args.file.display(),
        stream.position()
    );
    for line in tally.render(stream.summary()) {
        println!("{line}");
    }
    Ok(())
}
