//! A line-based console front end.
//!
//! Every input line becomes a private message from user 0 and is dispatched
//! through an in-memory [`Dispatcher`]; replies produced by the handlers are
//! written back one per line. Lines starting with `:` are console commands:
//!
//! - `:plugins` lists registered plugins
//! - `:enable <plugin>` and `:disable <plugin>` toggle a plugin

use std::sync::Arc;

use brass_core::{BoxedHandler, Context, Dispatcher, Event, handler_fn};
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::debug;

/// User id assigned to console input.
pub const CONSOLE_USER: i64 = 0;

/// Sends handler replies back to the console.
#[derive(Debug, Clone)]
pub struct Replier {
    tx: mpsc::UnboundedSender<String>,
}

impl Replier {
    pub fn send(&self, text: impl Into<String>) {
        // The receiver only goes away at shutdown.
        let _ = self.tx.send(text.into());
    }
}

pub fn reply_channel() -> (Replier, mpsc::UnboundedReceiver<String>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Replier { tx }, rx)
}

/// Replies `pong`.
pub fn ping_handler(replier: Replier) -> BoxedHandler {
    handler_fn(move |_ctx: Arc<Context>| {
        let replier = replier.clone();
        async move { replier.send("pong") }
    })
}

/// Settings of the echo handler, read from `plugins.echo` in the public
/// configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct EchoSettings {
    #[serde(default)]
    pub prefix: String,
}

/// Replies with the trigger arguments.
pub fn echo_handler(replier: Replier, settings: EchoSettings) -> BoxedHandler {
    let prefix = Arc::new(settings.prefix);
    handler_fn(move |ctx: Arc<Context>| {
        let replier = replier.clone();
        let prefix = Arc::clone(&prefix);
        async move { replier.send(format!("{}{}", prefix, ctx.args())) }
    })
}

fn console_command(dispatcher: &Dispatcher, command: &str) -> String {
    let mut parts = command.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("plugins"), None) => {
            let names = dispatcher.engine_names();
            if names.is_empty() {
                "no plugins".to_string()
            } else {
                names.join(", ")
            }
        }
        (Some(action @ ("enable" | "disable")), Some(name)) => {
            if dispatcher.set_enabled(name, action == "enable") {
                format!("{action}d {name}")
            } else {
                format!("no plugin named {name}")
            }
        }
        _ => format!("unknown console command: {command}"),
    }
}

/// Reads `input` until it is exhausted, returning the number of events
/// dispatched.
pub async fn run_console<R, W>(
    dispatcher: &Dispatcher,
    mut replies: mpsc::UnboundedReceiver<String>,
    input: R,
    mut output: W,
) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut dispatched = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = line.strip_prefix(':') {
            let reply = console_command(dispatcher, command);
            output.write_all(format!("{reply}\n").as_bytes()).await?;
            output.flush().await?;
            continue;
        }

        let event = Event::private(CONSOLE_USER, line).with_sender("console");
        let outcome = dispatcher.dispatch(event).await;
        dispatched += 1;
        debug!(
            handled = outcome.handled,
            blocked = outcome.blocked,
            "Console event dispatched"
        );

        while let Ok(reply) = replies.try_recv() {
            output.write_all(format!("{reply}\n").as_bytes()).await?;
        }
        output.flush().await?;
    }

    Ok(dispatched)
}
