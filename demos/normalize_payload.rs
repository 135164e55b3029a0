//! Keyfold payload normalization demo
//!
//! Rewrites the keys of an inbound JSON payload under each policy and prints
//! the result. Collisions and skipped keys show up as debug/trace logs.
//!
//! Run with: cargo run --example normalize_payload

use keyfold_tree::{parse_json, KeyPolicy, RewriteConfig, Rewriter};
use tracing_subscriber::filter::LevelFilter;

const PAYLOAD: &str = r#"{
  "Effective Date": "4/8/2016",
  "Amount": "20.00",
  "Recursive-Item": {
    "one two": [1, 2],
    "Boolean-here": true
  },
  "Line Items": [
    {"SKU Code": "A-1", "Unit Price": 4.5},
    {"SKU Code": "B-2", "unit-price": 3.0, "Unit Price": 3.25}
  ]
}"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(LevelFilter::DEBUG)
        .with_writer(std::io::stderr)
        .init();

    println!("━━━ Input ━━━");
    println!("{PAYLOAD}");
    println!();

    let tree = parse_json(PAYLOAD)?;

    for policy in KeyPolicy::ALL {
        let rewriter = Rewriter::with_config(RewriteConfig {
            policy,
            max_depth: Some(32),
            ..RewriteConfig::default()
        });
        let out = rewriter.rewrite(&tree)?;

        println!("━━━ Policy: {policy} ━━━");
        println!("  debug:  {out:?}");
        println!("  json:   {}", serde_json::to_string(&out)?);
        println!("  symbols interned: {}", rewriter.interner().len());
        println!();
    }

    Ok(())
}
