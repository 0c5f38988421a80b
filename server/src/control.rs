use common::command::parse_command;
use common::models::InjectionState;
use proxy::ProxyState;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tokio::sync::oneshot;

const RULE: &str = "============================================================";

const COMMAND_HELP: &str = "\
Commands:
  n      - No error (pass through) - permanent
  c      - Context length exceeded (1 time)
  c 4    - Context length exceeded (4 times)
  c 0.3  - Context length exceeded (30% of requests)
  c 30%  - Context length exceeded (30% of requests)
  c *    - Context length exceeded (100% of requests)
  r      - Rate limit error (1 time)
  u      - Unknown server error (1 time)
  q      - Quit
";

/// What the control loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Continue,
    Quit,
}

/// The operator status panel: current mode, requests handled, command reference.
pub fn render_status_panel(state: &InjectionState, requests: u64) -> String {
    let label = state.mode.label();
    let mode = match state.quantity() {
        Some(q) if state.percentage > 0.0 => format!("{} ({} of requests)", label, q),
        Some(q) => format!("{} ({})", label, q),
        None => label.to_string(),
    };
    format!(
        "\n{RULE}\nCurrent mode: {mode}\nRequests handled: {requests}\n{RULE}\n\n{COMMAND_HELP}"
    )
}

/// Apply one operator line to the shared state.
///
/// A rejected command is reported and leaves the state untouched.
pub fn handle_line<W: Write>(
    line: &str,
    state: &ProxyState,
    out: &mut W,
) -> io::Result<ControlAction> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ControlAction::Continue);
    }
    if line.eq_ignore_ascii_case("q") {
        writeln!(out, "\nShutting down proxy...")?;
        return Ok(ControlAction::Quit);
    }

    match parse_command(line) {
        Ok(new_state) => {
            state.injector.set_mode(new_state);
            log::info!("Error mode set: {}", new_state.status_line());
            writeln!(
                out,
                "{}",
                render_status_panel(&state.injector.snapshot(), state.request_count())
            )?;
        }
        Err(e) => writeln!(out, "Error: {}", e)?,
    }
    Ok(ControlAction::Continue)
}

/// Read commands until `q` or end of input.
pub fn run_control_loop<R: BufRead, W: Write>(
    mut input: R,
    out: &mut W,
    state: &ProxyState,
) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        render_status_panel(&state.injector.snapshot(), state.request_count())
    )?;

    let mut buf = Vec::new();
    loop {
        write!(out, "Enter command: ")?;
        out.flush()?;

        buf.clear();
        if input.read_until(b'\n', &mut buf)? == 0 {
            writeln!(out, "\nShutting down proxy...")?;
            return Ok(());
        }
        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(e) => {
                log::warn!("Ignoring non UTF-8 control input: {}", e);
                writeln!(out, "Error: input is not valid UTF-8")?;
                continue;
            }
        };
        if handle_line(line, state, out)? == ControlAction::Quit {
            return Ok(());
        }
    }
}

/// Run the control loop on stdin in its own thread and signal `shutdown`
/// when it ends. Stdin reads block, so this stays off the async runtime.
pub fn spawn_stdin_reader(
    state: Arc<ProxyState>,
    shutdown: oneshot::Sender<()>,
) -> io::Result<std::thread::JoinHandle<()>> {
    std::thread::Builder::new()
        .name("control".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            if let Err(e) = run_control_loop(stdin.lock(), &mut stdout, &state) {
                log::error!("Error reading stdin: {}", e);
            }
            let _ = shutdown.send(());
        })
}
