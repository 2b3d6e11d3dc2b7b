use std::io::{self, BufRead, Write};

use docrag_core::Error;
use docrag_pipeline::{ChatSession, QueryClient};

const HELP: &str = "Commands: /download <id> saves a cited document, /quit exits. Anything else is a question.";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = docrag_cli::load_settings()?;
    let client = QueryClient::new(settings.chat.api_url.clone());
    let download_dir = settings.download_dir();
    let mut session = ChatSession::new();

    println!("docrag chat ({})", client.url());
    println!("{HELP}");

    let stdin = io::stdin();
    loop {
        print!("\n> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" {
            break;
        }
        if input == "/help" {
            println!("{HELP}");
            continue;
        }
        if let Some(arg) = input.strip_prefix("/download") {
            match arg.trim().parse::<usize>() {
                Ok(id) => match session.download(id, &download_dir) {
                    Ok(path) => println!("Saved {} ({} downloads this session)", path.display(), session.download_count()),
                    Err(err) => println!("Download failed: {err}"),
                },
                Err(_) => println!("Usage: /download <id>"),
            }
            continue;
        }

        match client.ask(input).await {
            Ok(response) => {
                let turn = session.record(input, response);
                println!("\n{}", turn.answer);
                if !turn.citations.is_empty() {
                    println!("\nSources:");
                    for doc in &turn.citations {
                        println!("  [{}] {} ({})", doc.id, doc.file_name(), doc.path);
                    }
                }
            }
            Err(Error::Upstream { status, body }) => println!("Service error ({status}): {body}"),
            Err(err) => println!("Request failed: {err}"),
        }
    }
    Ok(())
}
