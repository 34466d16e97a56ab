use std::io::Write as _;
use std::time::Duration;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use etalase::backend::HttpBackend;
use etalase::catalog::{self, Category};
use etalase::config::Config;
use etalase::session::{AssistantSession, SubmitOutcome, QUICK_REPLIES};
use etalase::store::FileSlot;
use etalase::wishlist::Wishlist;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    if let Err(e) = dotenvy::dotenv() {
        info!("No .env file found or failed to load: {}", e);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = Config::from_env();
    info!(backend = %config.backend_url, "Etalase assistant starting...");

    let mut wishlist = Wishlist::open(FileSlot::new(&config.data_dir));
    info!(entries = wishlist.len(), "wishlist loaded from {}", config.data_dir.display());

    let backend = HttpBackend::new(&config.backend_url);
    let mut session = AssistantSession::support(backend, config.reveal.clone());

    println!("Etalase AI support. Type a question, or:");
    println!("  /products [category]   list the catalog");
    println!("  /product <id>          focus the chat on one product");
    println!("  /support               back to free-form support chat");
    println!("  /wish <id>             toggle a product on the wishlist");
    println!("  /wishlist              show the wishlist");
    println!("  /quick <n>             send quick reply n (0..{})", QUICK_REPLIES.len() - 1);
    println!("  /clear                 start a fresh conversation");
    println!("  /quit                  exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        match line.split_once(' ').map_or((line.as_str(), ""), |(a, b)| (a, b.trim())) {
            ("/quit", _) => break,
            ("/clear", _) => {
                session.clear();
                println!("(conversation cleared)");
            }
            ("/products", rest) => {
                let category = rest.parse::<Category>().ok();
                if !rest.is_empty() && category.is_none() {
                    println!("unknown category {rest:?} (Electronics, Apparel, Home)");
                } else {
                    for p in catalog::by_category(category) {
                        let star = if p.ai_recommended { "*" } else { " " };
                        let liked = if wishlist.contains(p.id) { "<3" } else { "  " };
                        println!("{star}{liked} #{:<3} {:<22} Rp{:>9.0}  [{}]", p.id, p.title, p.price, p.category);
                    }
                }
            }
            ("/product", rest) => match rest.parse::<i64>().ok().and_then(catalog::find) {
                Some(p) => {
                    session.select_product(p.id);
                    println!("(now asking about {} — {})", p.title, p.description);
                }
                None => println!("no product with id {rest:?}"),
            },
            ("/support", _) => {
                let backend = HttpBackend::new(&config.backend_url);
                session = AssistantSession::support(backend, config.reveal.clone());
                println!("(back to support chat)");
            }
            ("/wish", rest) => match rest.parse::<i64>().ok().and_then(catalog::find) {
                Some(p) => {
                    wishlist.toggle(p.wishlist_entry());
                    if wishlist.contains(p.id) {
                        println!("added {} to the wishlist", p.title);
                    } else {
                        println!("removed {} from the wishlist", p.title);
                    }
                }
                None => println!("no product with id {rest:?}"),
            },
            ("/wishlist", _) => {
                if wishlist.is_empty() {
                    println!("(wishlist is empty)");
                }
                for entry in wishlist.entries() {
                    println!("#{:<3} {:<22} Rp{:>9.0}", entry.id, entry.title, entry.price);
                }
            }
            ("/quick", rest) => match rest.parse::<usize>() {
                Ok(n) if n < QUICK_REPLIES.len() => {
                    println!("> {}", QUICK_REPLIES[n]);
                    let outcome = session.quick_reply(n).await;
                    render_reply(&session, outcome).await;
                }
                _ => println!("quick replies: 0..{}", QUICK_REPLIES.len() - 1),
            },
            _ => {
                let outcome = session.submit(&line).await;
                render_reply(&session, outcome).await;
            }
        }
        prompt();
    }

    info!("Etalase assistant shutting down");
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

/// Repaints the assistant's revealed prefix until the turn settles, so the
/// typing animation is visible on a plain terminal.
async fn render_reply(session: &AssistantSession<HttpBackend>, outcome: SubmitOutcome) {
    if outcome == SubmitOutcome::Ignored {
        println!("(ignored: empty input or a reply is still in progress)");
        return;
    }
    loop {
        let busy = session.is_busy();
        let text = session
            .messages()
            .last()
            .map(|m| m.text.clone())
            .unwrap_or_default();
        print!("\rassistant: {text}");
        let _ = std::io::stdout().flush();
        if !busy {
            println!();
            return;
        }
        tokio::time::sleep(Duration::from_millis(30)).await;
    }
}
