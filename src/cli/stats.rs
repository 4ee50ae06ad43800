use anyhow::Result;

use nomadish::config::NomadishConfig;
use nomadish::memory::stats::memory_stats;

/// Display memory statistics in the terminal.
pub async fn stats(config: &NomadishConfig) -> Result<()> {
    let coordinator = super::open_coordinator(config).await?;
    let response = memory_stats(&coordinator.records());

    println!("Memory Statistics");
    println!("{}", "=".repeat(40));
    println!("  Total memories:      {}", response.total_memories);
    println!("  Synced:              {}", response.synced_memories);
    println!("  Local only:          {}", response.pending_memories);
    println!("  Average rating:      {:.2}", response.average_rating);
    println!("  This month:          {}", response.memories_this_month);
    println!();

    println!("By Rating:");
    for (stars, count) in response.by_rating.iter().rev() {
        println!("  {:<12} {}", "*".repeat(usize::from(*stars)), count);
    }
    println!();

    if let Some(ref oldest) = response.oldest_memory {
        println!("Oldest memory:         {oldest}");
    }
    if let Some(ref newest) = response.newest_memory {
        println!("Newest memory:         {newest}");
    }
    if let Some(ref dish) = response.most_recent_dish {
        println!("Most recent dish:      {dish}");
    }

    Ok(())
}
