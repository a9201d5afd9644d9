//! Console interactive pilotant le lecteur
//!
//! Une commande par ligne sur stdin :
//!
//! ```text
//! search <texte>   play <n>   toggle   next   prev   seek <0-100>   status   quit
//! ```

use anyhow::Result;
use pmoplayer::{PlaybackState, PlayerHandle, PlayerStatus, SearchStatus};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

const HELP: &str = "Commands: search <text> | play <n> | toggle | next | prev | seek <0-100> | status | quit";

/// Commande saisie par l'utilisateur
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Search(String),
    /// Index dans la file (0-based, l'utilisateur saisit 1-based)
    Play(usize),
    Toggle,
    Next,
    Previous,
    Seek(f64),
    Status,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Parse une ligne, `Ok(None)` pour une ligne vide
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "search" | "s" => {
                if arg.is_empty() {
                    return Err("usage: search <text>".to_string());
                }
                ConsoleCommand::Search(arg.to_string())
            }
            "play" | "p" => match arg.parse::<usize>() {
                Ok(n) if n >= 1 => ConsoleCommand::Play(n - 1),
                _ => return Err("usage: play <n> (n starts at 1)".to_string()),
            },
            "toggle" | "t" => ConsoleCommand::Toggle,
            "next" | "n" => ConsoleCommand::Next,
            "prev" | "previous" => ConsoleCommand::Previous,
            "seek" => match arg.trim_end_matches('%').parse::<f64>() {
                Ok(percent) if percent.is_finite() => ConsoleCommand::Seek(percent),
                _ => return Err("usage: seek <0-100>".to_string()),
            },
            "status" | "st" => ConsoleCommand::Status,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" | "q" => ConsoleCommand::Quit,
            other => return Err(format!("unknown command: {}", other)),
        };

        Ok(Some(command))
    }
}

/// Lit stdin jusqu'à `quit` ou EOF
pub async fn run(player: PlayerHandle) -> Result<()> {
    tokio::spawn(announce_changes(player.clone()));

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        debug!(?command, "Console command");
        match command {
            ConsoleCommand::Search(query) => player.search(query)?,
            ConsoleCommand::Play(index) => player.select_track(index)?,
            ConsoleCommand::Toggle => player.toggle_play_pause()?,
            ConsoleCommand::Next => player.next()?,
            ConsoleCommand::Previous => player.previous()?,
            ConsoleCommand::Seek(percent) => player.seek(percent)?,
            ConsoleCommand::Status => println!("{}", render_status(&player.state())),
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Quit => break,
        }
    }

    Ok(())
}

/// Affiche les résultats de recherche et les changements de piste
async fn announce_changes(player: PlayerHandle) {
    let mut rx = player.subscribe();
    let mut previous = rx.borrow().clone();

    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();

        if state.search != previous.search {
            match &state.search {
                SearchStatus::Ready { .. } => println!("{}", render_queue(&state)),
                SearchStatus::Searching { .. } => {}
                other => println!("{}", other),
            }
        }

        if state.now_playing != previous.now_playing {
            if let Some(item) = &state.now_playing {
                println!("▶️  {} - {}", item.title, item.artist_name);
            }
        }

        if state.status == PlayerStatus::Idle
            && previous.status == PlayerStatus::Resolving
            && state.now_playing.is_none()
        {
            warn!("Nothing playable from the selected track onwards");
        }

        previous = state;
    }
}

/// Liste numérotée de la file, la piste courante marquée
pub fn render_queue(state: &PlaybackState) -> String {
    let mut out = state.search.to_string();
    for (i, item) in state.queue.iter().enumerate() {
        let marker = if state.current_index == Some(i) { '>' } else { ' ' };
        out.push_str(&format!(
            "\n{} {:>2}. {} - {}",
            marker,
            i + 1,
            item.title,
            item.artist_name
        ));
    }
    out
}

/// `[playing] Title - Artist  1:05 / 3:20 (32%)`
pub fn render_status(state: &PlaybackState) -> String {
    let track = match &state.now_playing {
        Some(item) => format!("{} - {}", item.title, item.artist_name),
        None => "Nothing playing".to_string(),
    };

    format!(
        "[{}] {}  {} ({:.0}%)\n{}",
        state.status,
        track,
        state.time_display(),
        state.progress_percent(),
        state.search
    )
}
