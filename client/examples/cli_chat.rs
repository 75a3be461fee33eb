use std::collections::BTreeSet;
use std::io::{self, Write};

use anyhow::Result;
use chatsync_client::{ChatClient, ClientConfig, ClientError, SyncEvent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

fn print_help() {
    println!("Commands:");
    println!("  /rooms                 - List chatrooms");
    println!("  /users                 - List users you can invite");
    println!("  /join <id>             - Open a chatroom");
    println!("  /create <ids> [name]   - Create a chatroom, e.g. /create 2,3 Team");
    println!("  /leave                 - Close the current chatroom");
    println!("  /logout                - Log out and exit");
    println!("  /quit                  - Exit");
    println!("  <message>              - Send message to current chatroom");
}

fn report(error: &ClientError) {
    println!("{} ({})", error.user_message(), error);
}

/// Print messages the user has not seen yet
fn show_new_messages(client: &ChatClient, shown: &mut usize) {
    let messages = client.sync().messages();
    if messages.len() < *shown {
        *shown = 0;
    }
    for message in &messages[*shown..] {
        println!("{}: {}", message.sender_display_name, message.content);
    }
    *shown = messages.len();
}

fn parse_ids(arg: &str) -> Option<BTreeSet<u64>> {
    arg.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().parse().ok())
        .collect()
}

async fn handle_input(line: &str, client: &mut ChatClient, shown: &mut usize) -> bool {
    let line = line.trim();
    if line.is_empty() {
        return true;
    }

    let Some(command) = line.strip_prefix('/') else {
        match client.sync().send(line).await {
            Ok(()) => show_new_messages(client, shown),
            Err(e) => report(&e),
        }
        return true;
    };

    let parts: Vec<&str> = command.splitn(2, ' ').collect();
    let arg = parts.get(1).map(|s| s.trim());

    match parts[0] {
        "help" => print_help(),
        "rooms" => {
            let current = client.sync().active_chatroom();
            match client.directory_mut().list_chatrooms().await {
                Ok(rooms) if rooms.is_empty() => println!("No chatrooms yet"),
                Ok(rooms) => {
                    for room in rooms {
                        let marker = if Some(room.id) == current { " *" } else { "" };
                        println!("  [{}] {}{}", room.id, room.display_name(), marker);
                    }
                }
                Err(e) => report(&e),
            }
        }
        "users" => match client.directory().list_users().await {
            Ok(users) => {
                for user in users {
                    println!("  [{}] {}", user.id, user.first_name);
                }
            }
            Err(e) => report(&e),
        },
        "join" => match arg.and_then(|a| a.parse().ok()) {
            Some(id) => {
                client.sync().select_chatroom(Some(id));
                *shown = 0;
                let name = client
                    .directory()
                    .chatroom(id)
                    .map(|c| c.display_name())
                    .unwrap_or_else(|| format!("Chatroom {}", id));
                println!("Opened {}", name);
            }
            None => println!("Usage: /join <id>"),
        },
        "create" => {
            let mut args = arg.unwrap_or_default().splitn(2, ' ');
            match args.next().and_then(parse_ids) {
                Some(ids) => {
                    let name = args.next().map(str::trim);
                    match client.directory_mut().create_chatroom(&ids, name).await {
                        Ok(room) => println!(
                            "Chatroom created successfully! [{}] {}",
                            room.id,
                            room.display_name()
                        ),
                        Err(e) => report(&e),
                    }
                }
                None => println!("Usage: /create <id,id,...> [name]"),
            }
        }
        "leave" => {
            client.sync().select_chatroom(None);
            *shown = 0;
        }
        "logout" => {
            client.logout();
            println!("Logged out");
            return false;
        }
        "quit" | "exit" => return false,
        other => println!("Unknown command: /{}. Type /help for commands.", other),
    }

    true
}

fn prompt(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let config = ClientConfig::from_env()?;
    let mut client = ChatClient::new(&config)?;
    let mut events = client
        .take_events()
        .ok_or_else(|| anyhow::anyhow!("event receiver already taken"))?;

    println!("Chat Application ({})", config.base_url);
    println!("================");

    let email = prompt("Email")?;
    let password = prompt("Password")?;
    match client.login(&email, &password).await {
        Ok(session) => println!("Welcome back, {}!", session.display_name()),
        Err(e) => {
            report(&e);
            return Ok(());
        }
    }

    if let Err(e) = client.directory_mut().list_chatrooms().await {
        report(&e);
    }
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = 0;

    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if !handle_input(&line, &mut client, &mut shown).await {
                        break;
                    }
                }
                None => break,
            },
            Some(event) = events.recv() => match event {
                SyncEvent::MessagesUpdated { .. } => show_new_messages(&client, &mut shown),
                SyncEvent::SessionExpired => {
                    println!("{}", ClientError::SessionExpired.user_message());
                    break;
                }
                SyncEvent::Transient { message } => println!("Error occurred! {}", message),
            },
        }
    }

    client.sync().shutdown();
    Ok(())
}
