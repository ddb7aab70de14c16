use alanvm::interpreter::core::game::Game;
use alanvm::interpreter::core::interpreter::Interpreter;
use alanvm::interpreter::display::display_terminal::TerminalDisplay;
use alanvm::interpreter::input::input_stdin::StdinInput;
use alanvm::interpreter::utils::config::EngineConfig;
use log::{debug, info};
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Initialize logging
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    // Help is not an error
    if args.len() < 2 {
        println!("alanvm - interpreter for compiled Alan-style adventure games");
        println!();
        println!("Usage: {} <game.acd> [config.toml]", args[0]);
        println!();
        println!("The configuration file sets engine limits, the random seed and");
        println!("where save files go. Set ALANVM_TRACE to log every instruction.");
        return;
    }

    let game_path = &args[1];
    let config_path = args.get(2).map(String::as_str).unwrap_or("alanvm.toml");
    let config = match EngineConfig::load(Path::new(config_path)) {
        Ok(config) => config.with_env(),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    debug!("Loading game: {}", game_path);
    let data = match fs::read(game_path) {
        Ok(data) => data,
        Err(e) => {
            match e.kind() {
                std::io::ErrorKind::NotFound => {
                    eprintln!("Error: Game file not found: {}", game_path);
                }
                std::io::ErrorKind::PermissionDenied => {
                    eprintln!(
                        "Error: Permission denied accessing game file: {}",
                        game_path
                    );
                }
                _ => {
                    eprintln!("Error: Cannot read game file '{}': {}", game_path, e);
                }
            }
            std::process::exit(1);
        }
    };

    let game = match Game::from_image(&data) {
        Ok(game) => game,
        Err(e) => {
            eprintln!("Error: '{}' is not a playable game: {}", game_path, e);
            std::process::exit(1);
        }
    };
    info!("{}", game.header);

    let mut interpreter = Interpreter::new(
        game,
        config,
        Box::new(TerminalDisplay::default()),
        Box::new(StdinInput::new()),
    );
    if let Err(e) = interpreter.run() {
        eprintln!("\nError during execution: {e}");
        std::process::exit(1);
    }
    debug!(
        "Game ended normally after {} instructions",
        interpreter.instruction_count()
    );
}
