use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let msg = format!("{:#}", err).to_lowercase();

    if msg.contains("task '") && msg.contains("not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  List configured tasks with:");
        eprintln!("  {} homewatch task list", "$".dimmed());
    }

    if msg.contains("unknown task field") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Task fields use camelCase names, for example:");
        eprintln!(
            "  {} homewatch task set <name> cronExpression \"0 3 * * *\"",
            "$".dimmed()
        );
    }

    if msg.contains("database already open") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Another homewatch process holds the database.");
        eprintln!("  Run CLI commands with the same HOMEWATCH_DIR as `homewatch start` so they reach the daemon.");
    }

    if msg.contains("connection refused") || msg.contains("network") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check the [home_assistant] and [bridge] URLs in your config file.");
    }

    std::process::exit(1);
}
