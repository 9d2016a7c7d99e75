/// Example program to print the loaded configuration
///
/// Run with: cargo run -p glide-config --example print_config

fn main() {
    // Load configuration from glide.toml
    let config = glide_config::GlideConfig::load();

    println!("=== Glide Configuration ===\n");

    println!("Motion Settings:");
    println!("  Reduced Motion: {}", config.motion.reduced_motion);
    println!("  Respect Reduced Motion: {}", config.motion.respect_reduced_motion);
    println!("  Epilepsy Safe: {}", config.motion.epilepsy_safe);
    println!("  Min Safe Duration: {}ms", config.motion.min_safe_duration_ms);
    println!();

    println!("Timing Settings:");
    println!("  Preset: {}", config.timing.preset);
    println!("  Enter: {:?}", config.timing.enter_ms);
    println!("  Exit: {:?}", config.timing.exit_ms);
    match config.timing.resolve() {
        Ok(preset) => println!(
            "  Resolved: {}",
            glide_motion::presets::css_transition("all", &preset)
        ),
        Err(e) => eprintln!("  Resolved: {e}"),
    }
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
