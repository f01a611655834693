mod holidays;
mod ipc;
mod model;
mod schedule;
mod store;

use std::io::{self, BufRead, Write};

fn main() {
    let holiday_source: Box<dyn holidays::HolidaySource> = match holidays::NagerClient::new() {
        Ok(client) => Box::new(client),
        Err(e) => {
            eprintln!("preceptord: failed to build http client: {e:#}");
            std::process::exit(1);
        }
    };
    let mut state = ipc::AppState::new(holiday_source);

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply with an id; report and keep reading.
                let _ = writeln!(
                    stdout,
                    "{{\"ok\":false,\"error\":{{\"code\":\"bad_json\",\"message\":\"{}\"}}}}",
                    e
                );
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
