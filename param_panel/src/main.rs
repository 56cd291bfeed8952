use anyhow::Context;
use clap::Parser;
use param_panel::feed::{self, FeedEvent, FeedHandle};
use param_panel::settings::{self, SettingsAction};
use param_panel::{render, FeedConfig, NodeNames, PanelState};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

const HELP: &str = "\
commands:
  fetch                   request every parameter from the feed
  nodes                   list nodes seen in the last message
  select <node>           load the editable parameters of a node
  set <index|leaf> <v>    change one parameter and send it
  show                    print the current controls
  settings                print the settings tree as JSON
  action <json>           apply a raw settings action
  help                    this text
  quit                    exit";

#[derive(Parser, Debug)]
#[command(name = "param_panel")]
struct Args {
    /// Feed endpoint; falls back to PARAM_PANEL_URL, then the built-in address.
    #[arg(long)]
    url: Option<String>,

    /// WebSocket sub-protocol; falls back to PARAM_PANEL_SUBPROTOCOL.
    #[arg(long)]
    subprotocol: Option<String>,

    /// Select this node as soon as a message lists it.
    #[arg(long)]
    node: Option<String>,

    #[arg(long, default_value_t = false)]
    fetch_on_open: bool,
}

#[derive(Debug, PartialEq)]
enum Command {
    Fetch,
    Nodes,
    Select(String),
    Set { target: Target, value: f64 },
    Show,
    Settings,
    Action(String),
    Help,
    Quit,
}

#[derive(Debug, PartialEq)]
enum Target {
    Index(usize),
    Leaf(String),
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = FeedConfig::resolve(args.url.as_deref(), args.subprotocol.as_deref())
        .context("invalid feed configuration")?;

    let (feed, mut events) = feed::spawn(config);
    let mut state = PanelState::new();
    let mut pending_node = args.node.clone();
    let mut feed_done = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    println!("{HELP}");

    loop {
        tokio::select! {
            event = events.recv(), if !feed_done => match event {
                Some(FeedEvent::Opened) => {
                    if args.fetch_on_open {
                        state.fetch_parameters(&feed);
                    }
                }
                Some(FeedEvent::Message(raw)) => {
                    if let NodeNames::Nodes(nodes) = state.on_feed_message(raw) {
                        println!("nodes: {}", nodes.join(", "));
                    }
                    if let Some(node) = pending_node.take() {
                        if state.node_options().contains(&node) {
                            select(&mut state, &node);
                        } else {
                            pending_node = Some(node);
                        }
                    }
                }
                // Already logged by the feed task.
                Some(FeedEvent::Error(_)) | Some(FeedEvent::Closed) => {}
                None => feed_done = true,
            },
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else { break };
                match parse_command(&line) {
                    Ok(Some(cmd)) => {
                        if !execute(cmd, &mut state, &feed) {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(msg) => eprintln!("{msg}"),
                }
            }
        }
    }

    feed.close();
    Ok(())
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let cmd = match word {
        "" => return Ok(None),
        "fetch" => Command::Fetch,
        "nodes" => Command::Nodes,
        "show" => Command::Show,
        "settings" => Command::Settings,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "select" if !rest.is_empty() => Command::Select(rest.to_string()),
        "action" if !rest.is_empty() => Command::Action(rest.to_string()),
        "set" => {
            let mut parts = rest.split_whitespace();
            let (Some(target), Some(value), None) = (parts.next(), parts.next(), parts.next())
            else {
                return Err("usage: set <index|leaf> <value>".to_string());
            };
            let value: f64 = value
                .parse()
                .map_err(|_| format!("not a number: {value:?}"))?;
            let target = match target.parse::<usize>() {
                Ok(i) => Target::Index(i),
                Err(_) => Target::Leaf(target.to_string()),
            };
            Command::Set { target, value }
        }
        other => return Err(format!("unknown command {other:?} (try `help`)")),
    };
    Ok(Some(cmd))
}

fn execute(cmd: Command, state: &mut PanelState, feed: &FeedHandle) -> bool {
    match cmd {
        Command::Fetch => state.fetch_parameters(feed),
        Command::Nodes => print!(
            "{}",
            render::render_nodes(state.node_options(), state.selected_node())
        ),
        Command::Select(node) => select(state, &node),
        Command::Set { target, value } => {
            let res = match target {
                Target::Index(i) => state.edit(i, value, feed),
                Target::Leaf(leaf) => state.edit_by_name(&leaf, value, feed),
            };
            match res {
                Ok(()) => show(state),
                Err(e) => eprintln!("set failed: {e}"),
            }
        }
        Command::Show => show(state),
        Command::Settings => match serde_json::to_string_pretty(&settings::settings_tree(state)) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("settings encoding failed: {e}"),
        },
        Command::Action(raw) => match serde_json::from_str::<SettingsAction>(&raw) {
            Ok(action) => match settings::handle_action(state, action) {
                Ok(Some(_)) => show(state),
                Ok(None) => {}
                Err(e) => eprintln!("selection failed: {e}"),
            },
            Err(e) => eprintln!("invalid settings action: {e}"),
        },
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
    }
    true
}

fn select(state: &mut PanelState, node: &str) {
    match state.select_node(node) {
        Ok(_) => show(state),
        Err(e) => eprintln!("cannot load node {node:?}: {e}"),
    }
}

fn show(state: &PanelState) {
    match state.selected_node() {
        Some(node) => print!("{}", render::render_rows(node, &state.rows())),
        None => println!("  no node selected"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_set_by_index_and_leaf() {
        assert_eq!(
            parse_command("set 2 0.5").unwrap(),
            Some(Command::Set { target: Target::Index(2), value: 0.5 })
        );
        assert_eq!(
            parse_command("  set exposure -3 ").unwrap(),
            Some(Command::Set { target: Target::Leaf("exposure".into()), value: -3.0 })
        );
    }

    #[test]
    fn rejects_bad_set() {
        assert!(parse_command("set 1").is_err());
        assert!(parse_command("set 1 abc").is_err());
        assert!(parse_command("set 1 2 3").is_err());
    }

    #[test]
    fn blank_lines_and_unknown_words() {
        assert_eq!(parse_command("   ").unwrap(), None);
        assert!(parse_command("frobnicate").is_err());
        assert_eq!(parse_command("select camA").unwrap(), Some(Command::Select("camA".into())));
        assert!(parse_command("select").is_err());
    }
}
