use anyhow::{Context, Result, bail};
use colored::*;
use pairroom_client::{
    ChannelConfig, HttpRoomService, LogNavigator, MediaResourceManager, RoomSessionController,
    RoomSessionHandle, RoomView, RtcTransportFactory, SessionConfig, SessionDeps, SessionStatus,
    SignalingChannel, SyntheticDevices, TransportConfig,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;

pub struct JoinArgs {
    pub relay: String,
    pub token: String,
    pub room: String,
    pub api: String,
    pub auto_call: bool,
}

pub async fn run(args: JoinArgs) -> Result<()> {
    let rooms = HttpRoomService::new(args.api).context("Failed to build HTTP client")?;
    let deps = SessionDeps {
        media: Arc::new(MediaResourceManager::new(Arc::new(SyntheticDevices))),
        channel: SignalingChannel::from_config(&ChannelConfig::new(args.relay)),
        transports: Arc::new(RtcTransportFactory::new(TransportConfig::default())),
        rooms: Arc::new(rooms),
        navigator: Arc::new(LogNavigator),
    };
    let config = SessionConfig {
        auto_call: args.auto_call,
        ..SessionConfig::default()
    };

    let handle = RoomSessionController::spawn(deps, config);
    tokio::spawn(print_updates(handle.subscribe()));

    handle
        .join(args.room.as_str(), args.token)
        .await
        .context("Failed to join room")?;
    if handle.view().status == SessionStatus::NotAuthenticated {
        bail!("Not authenticated: the token was missing or rejected");
    }
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !handle_line(&handle, line.trim()).await? {
            break;
        }
    }

    handle.leave();
    // Let the controller finish teardown before the runtime goes away.
    let mut view = handle.subscribe();
    let _ = view
        .wait_for(|v| v.status != SessionStatus::Joined && v.status != SessionStatus::Joining)
        .await;
    Ok(())
}

/// Returns false when the session should end.
async fn handle_line(handle: &RoomSessionHandle, line: &str) -> Result<bool> {
    let (command, rest) = match line.split_once(' ') {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "" => {}
        "/code" => handle.edit_code(rest.replace("\\n", "\n")),
        "/lang" if !rest.is_empty() => handle.change_language(rest),
        "/mute" => {
            let enabled = handle.toggle_audio().await?;
            println!("{}", describe_toggle("Microphone", enabled).as_str().yellow());
        }
        "/video" => {
            let enabled = handle.toggle_video().await?;
            println!("{}", describe_toggle("Camera", enabled).as_str().yellow());
        }
        "/call" if !rest.is_empty() => handle.call(rest),
        "/delete" => {
            let result = handle.delete_room().await?;
            if result.success {
                return Ok(false);
            }
            let message = result.message.unwrap_or_else(|| "unknown error".to_owned());
            println!("{} {}", "Delete failed:".red(), message);
        }
        "/leave" | "/quit" => return Ok(false),
        "/help" => print_help(),
        text if text.starts_with('/') => {
            println!("{} {}", "Unknown command:".red(), text);
        }
        _ => handle.send_chat(line),
    }
    Ok(true)
}

fn describe_toggle(device: &str, enabled: Option<bool>) -> String {
    match enabled {
        Some(true) => format!("{} on", device),
        Some(false) => format!("{} off", device),
        None => format!("No {} available", device.to_lowercase()),
    }
}

fn print_help() {
    println!("{}", "Type to chat. Commands:".cyan().bold());
    println!("  /code <text>   replace the shared code (\\n for newlines)");
    println!("  /lang <name>   change the room language");
    println!("  /mute          toggle the microphone");
    println!("  /video         toggle the camera");
    println!("  /call <user>   start a video call");
    println!("  /delete        delete the room");
    println!("  /leave         leave the room");
}

async fn print_updates(mut view: watch::Receiver<RoomView>) {
    let mut last = view.borrow().clone();
    while view.changed().await.is_ok() {
        let current = view.borrow_and_update().clone();
        print_diff(&last, &current);
        last = current;
    }
}

fn print_diff(old: &RoomView, new: &RoomView) {
    if old.status != new.status {
        println!("{} {:?}", "Session:".cyan().bold(), new.status);
    }
    if old.name != new.name && !new.name.is_empty() {
        println!("{} {}", "Room:".cyan().bold(), new.name);
    }
    for message in new.chat.iter().skip(old.chat.len()) {
        println!("{} {}", format!("{}:", message.sender_name).as_str().green(), message.text);
    }
    if old.participants != new.participants {
        let names: Vec<&str> = new.participants.iter().map(|p| p.username.as_str()).collect();
        println!("{} {}", "In the room:".cyan(), names.join(", "));
    }
    if old.language != new.language {
        println!("{} {}", "Language:".cyan(), new.language);
    }
    if old.code != new.code && !new.saving {
        println!("{}\n{}", "Code:".cyan(), new.code.dimmed());
    }
    if old.negotiation != new.negotiation {
        println!("{} {}", "Call:".magenta(), new.negotiation);
    }
    if old.last_error != new.last_error
        && let Some(error) = &new.last_error
    {
        println!("{} {}", "Error:".red().bold(), error);
    }
}
