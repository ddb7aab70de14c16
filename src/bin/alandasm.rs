use alanvm::interpreter::core::game::Game;
use alanvm::interpreter::core::instruction::Aword;
use alanvm::interpreter::utils::disassembler::Disassembler;
use log::debug;
use std::env;
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = env::args().collect();

    let mut show_header = false;
    let mut start = None;
    let mut filename = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-H" => show_header = true,
            "-a" => {
                i += 1;
                let addr = args
                    .get(i)
                    .and_then(|a| a.parse::<Aword>().ok())
                    .ok_or("-a needs a word address")?;
                start = Some(addr);
            }
            "-h" | "--help" => {
                eprintln!("Usage: {} [options] <game-file>", args[0]);
                eprintln!("\nOptions:");
                eprintln!("  -H        Show the game header");
                eprintln!("  -a ADDR   Disassemble only the block at ADDR");
                eprintln!("  -h        Show this help message");
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                filename = Some(arg.to_string());
                break;
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let filename = match filename {
        Some(f) => f,
        None => {
            eprintln!("Usage: {} [options] <game-file>", args[0]);
            std::process::exit(1);
        }
    };

    let data = fs::read(&filename)?;
    debug!("Loaded {} bytes from {}", data.len(), filename);
    let game = Game::from_image(&data)?;

    if show_header {
        println!("{}", game.header);
    }

    let dis = Disassembler::new(&game.memory);
    match start {
        Some(addr) => print!("{}", dis.block(addr)),
        None => {
            // address 0 is the "no code" word
            for addr in 1..game.memory.len() {
                println!("{}", dis.instruction_at(addr as Aword));
            }
        }
    }
    Ok(())
}
