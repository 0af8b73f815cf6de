use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::AgendaConfig;

pub fn run(config: &AgendaConfig) -> Result<()> {
    let config_path = AgendaConfig::config_path()?;
    let window = config.window()?;

    println!("{}", "Paths".bold());
    println!("  Config:     {}", config_path.display());
    println!("  Agendas:    {}", config.data_path().display());

    println!();
    println!("{}", "Defaults".bold());
    println!(
        "  Window:     {}-{}",
        window.start.format("%H:%M"),
        window.end.format("%H:%M")
    );
    println!("  Days:       {}", config.default_days);
    println!("  Free label: {}", config.free_label);
    println!("  Timezone:   {}", config.timezone()?.name());

    Ok(())
}
