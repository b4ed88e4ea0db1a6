// Dump recent snapshots as JSON (record blobs re-validated on read).
//
// Usage: cargo run --example dump_snapshots -- [DB_PATH] [LIMIT]
//   DB_PATH  default: ./data/dealerboard.db
//   LIMIT    default: 5

use dealerboard::snapshot_repo::{SnapshotRepo, SnapshotStore};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    let path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("./data/dealerboard.db");
    let limit: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(5);

    let repo = SnapshotRepo::connect(path, 1).await?;
    repo.init().await?;
    let snapshots = repo.list(limit).await?;

    for s in snapshots.iter().filter(|s| s.has_data_issues) {
        eprintln!("{}: {:?}", s.snapshot.id, s.data_issues);
    }
    println!("{}", serde_json::to_string_pretty(&snapshots)?);
    Ok(())
}
