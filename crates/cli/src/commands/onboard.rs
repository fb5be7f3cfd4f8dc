//! `pathfinder onboard`: First-time setup.

use pathfinder_config::AppConfig;
use std::path::Path;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();

    println!("Pathfinder — First-Time Setup");
    println!("=============================\n");

    if write_default_config(&config_dir)? {
        println!("✅ Created config.toml at: {}", config_dir.join("config.toml").display());
        println!("\n📝 Next steps:");
        println!("   1. Set GROQ_API_KEY and/or GEMINI_API_KEY (optional; offline answers work without them)");
        println!("   2. Adjust the [offline] institution lists for your region");
        println!("   3. Run: pathfinder chat --name \"Your Name\" --region \"Your Town\"\n");
    } else {
        println!("⚠️  Config already exists at: {}", config_dir.join("config.toml").display());
        println!("   Edit it manually or delete and re-run onboard.\n");
    }

    Ok(())
}

/// Write the default config unless one exists. Returns whether a file was
/// written.
fn write_default_config(config_dir: &Path) -> std::io::Result<bool> {
    let config_path = config_dir.join("config.toml");
    if config_path.exists() {
        return Ok(false);
    }
    std::fs::create_dir_all(config_dir)?;
    std::fs::write(&config_path, AppConfig::default_toml())?;
    Ok(true)
}
