use clap::Parser;
use coordinator::command::Command;
use coordinator::link::{LinkEvent, WorkerLink};
use coordinator::roster::Roster;
use log::{debug, error, info, warn};
use shared::{Character, Message};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(author, version, about = "Drives a combat worker from text commands", long_about = None)]
struct Args {
    /// Path to the combat-worker binary; runs the worker in-process when omitted
    #[arg(short = 'w', long)]
    worker: Option<PathBuf>,

    /// Collision tick period in milliseconds
    #[arg(short = 't', long, default_value_t = shared::TICK_INTERVAL_MS)]
    tick_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    if args.tick_ms == 0 {
        return Err("tick period must be at least 1ms".into());
    }

    let mut link = match &args.worker {
        Some(path) => WorkerLink::spawn_process(path, args.tick_ms)?,
        None => WorkerLink::in_process(Duration::from_millis(args.tick_ms)),
    };

    let mut roster = Roster::new();
    link.send(roster.snapshot())?;

    info!("Commands: join ID | move ID X Y | upsert ID X Y | leave ID | attack ID DIR | quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };
                if line.trim().is_empty() {
                    continue;
                }

                match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Some(message) = apply_command(&mut roster, command) {
                            if let Err(e) = link.send(message) {
                                debug!("Not forwarded: {}", e);
                            }
                        }
                    }
                    Err(e) => warn!("{}", e),
                }
            }

            event = link.next_event(), if !link.is_closed() => {
                match event {
                    Some(LinkEvent::Hit(victim)) => {
                        println!("attackHit {}", victim);
                    }
                    // The roster keeps serving sessions without combat.
                    Some(LinkEvent::Exited(description)) => {
                        error!("Combat worker exited ({}); attacks will not resolve", description);
                    }
                    None => error!("Combat worker channel closed; attacks will not resolve"),
                }
            }
        }
    }

    if let Some(description) = link.shutdown().await {
        info!("Worker {}", description);
    }

    Ok(())
}

/// Applies a command to the roster and returns the message for the worker
fn apply_command(roster: &mut Roster, command: Command) -> Option<Message> {
    match command {
        Command::Join { id } => {
            let message = roster.join(&id);
            println!("joined {}", id);
            Some(message)
        }
        Command::Move { id, x, y } => {
            if roster.get(&id).is_none() {
                warn!("No character {}", id);
                return None;
            }
            let message = roster.apply_movement(&id, Character::new(id.as_str(), x, y));
            println!("updatedMovement {} ({}, {})", id, x, y);
            Some(message)
        }
        Command::Upsert { id, x, y } => {
            if roster.get(&id).is_none() {
                warn!("No character {}", id);
                return None;
            }
            roster.apply_movement(&id, Character::new(id.as_str(), x, y));
            println!("updatedMovement {} ({}, {})", id, x, y);
            roster.upsert_message(&id)
        }
        Command::Leave { id } => {
            let (character, message) = roster.leave(&id)?;
            println!("left {}", character.id);
            Some(message)
        }
        Command::Attack { id, direction } => {
            let (attack, message) = roster.attack(&id, direction)?;
            let hitbox = attack.hitbox;
            println!(
                "attackUpdate {} ({}, {}, {}x{})",
                attack.attacker_id, hitbox.x, hitbox.y, hitbox.width, hitbox.height
            );
            Some(message)
        }
        Command::Quit => None,
    }
}
