//! Line-oriented front-end over [`ConversationController`].

use log::info;
use std::error::Error;
use std::sync::Arc;
use tokio::io::{ AsyncBufReadExt, BufReader };

use super::attachment::{ Attachment, MAX_ATTACHMENTS };
use super::capability::Notifier;
use super::controller::{ ConversationController, RecordingOutcome, SendOutcome };
use super::transport::HttpChatTransport;
use crate::cli::ChatArgs;
use crate::models::chat::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalCommand {
    Send(String),
    Attach(Vec<String>),
    Detach,
    Record,
    Stop,
    History,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> TerminalCommand {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();
    match words.next() {
        Some("/attach") => TerminalCommand::Attach(words.map(str::to_string).collect()),
        Some("/detach") => TerminalCommand::Detach,
        Some("/record") => TerminalCommand::Record,
        Some("/stop") => TerminalCommand::Stop,
        Some("/history") => TerminalCommand::History,
        Some("/help") => TerminalCommand::Help,
        Some("/quit") | Some("/exit") => TerminalCommand::Quit,
        _ => TerminalCommand::Send(trimmed.to_string()),
    }
}

struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, message: &str) {
        eprintln!("! {}", message);
    }
}

const HELP: &str =
    "Type a message and press enter to send it.\n  /attach <path>...  attach up to 4 images to the next message\n  /detach            drop pending images\n  /record, /stop     dictate the next message\n  /history           show the conversation\n  /quit              leave";

pub async fn run(args: &ChatArgs) -> Result<(), Box<dyn Error + Send + Sync>> {
    let transport = Arc::new(HttpChatTransport::new(&args.relay_url)?);
    info!("Chatting through relay at {}", transport.endpoint());
    let controller = ConversationController::new(transport).with_notifier(Arc::new(StderrNotifier));

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            TerminalCommand::Quit => {
                break;
            }
            TerminalCommand::Help => println!("{}", HELP),
            TerminalCommand::Attach(paths) => {
                let requested = paths.len();
                let kept = controller.attach_files(
                    paths.into_iter().map(Attachment::from_path).collect()
                ).await;
                if requested > kept {
                    println!("Only the first {} images are kept.", MAX_ATTACHMENTS);
                }
                println!("{} image(s) attached", kept);
            }
            TerminalCommand::Detach => {
                controller.clear_attachments().await;
                println!("Attachments cleared");
            }
            TerminalCommand::Record => {
                if controller.start_recording().await == RecordingOutcome::Started {
                    println!("Listening...");
                }
            }
            TerminalCommand::Stop => {
                controller.stop_recording().await;
            }
            TerminalCommand::History => {
                for msg in controller.messages().await {
                    let who = match msg.role {
                        Role::User => "you",
                        Role::Assistant => "assistant",
                        Role::System => "system",
                    };
                    if msg.images.is_empty() {
                        println!("{}> {}", who, msg.content);
                    } else {
                        println!("{}> {} [{} image(s)]", who, msg.content, msg.images.len());
                    }
                }
            }
            TerminalCommand::Send(text) => {
                controller.set_input(text).await;
                match controller.send_message().await {
                    SendOutcome::Replied(msg) => println!("assistant> {}", msg.content),
                    SendOutcome::Failed(e) => eprintln!("! {}", e),
                    SendOutcome::Unanswered => eprintln!("! no reply"),
                    SendOutcome::Skipped | SendOutcome::Busy => {}
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_are_recognised() {
        assert_eq!(
            parse_command("/attach a.png  b.jpg"),
            TerminalCommand::Attach(vec!["a.png".into(), "b.jpg".into()])
        );
        assert_eq!(parse_command(" /record "), TerminalCommand::Record);
        assert_eq!(parse_command("/detach"), TerminalCommand::Detach);
        assert_eq!(parse_command("/exit"), TerminalCommand::Quit);
        assert_eq!(parse_command("  what is this?  "), TerminalCommand::Send("what is this?".into()));
        assert_eq!(parse_command(""), TerminalCommand::Send(String::new()));
    }
}
