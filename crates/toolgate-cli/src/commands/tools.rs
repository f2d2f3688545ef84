//! Tools command implementation

use toolgate_core::ToolRegistry;

/// Print registered tools with their capabilities
pub fn show_tools(registry: &ToolRegistry) -> anyhow::Result<()> {
    println!("{:<12} {:<10} {:<10} DESCRIPTION", "NAME", "STREAMING", "CACHE");

    for tool in registry.list() {
        let cache = match (tool.cache.cacheable, tool.cache.ttl) {
            (false, _) => "off".to_string(),
            (true, Some(ttl)) => format!("{}s", ttl.as_secs()),
            (true, None) => "default".to_string(),
        };
        let streaming = if tool.streaming { "yes" } else { "no" };
        println!(
            "{:<12} {:<10} {:<10} {}",
            tool.name, streaming, cache, tool.description
        );
    }

    println!();
    println!("Total tools available: {}", registry.len());
    Ok(())
}
