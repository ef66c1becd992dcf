//! reading-tracker entry point.

use clap::Parser;
use reading_tracker::{
    AppError, Library,
    config::{Cli, Command, Config},
    db::{Book, BookDetails, Database, NewBook},
    pdf, progress, server,
};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.command {
        Command::Serve { .. } => "reading_tracker=info,tower_http=info",
        _ => "reading_tracker=warn",
    };
    init_logging(default_filter);

    // Find or load config
    let config_path = cli.config.clone().or_else(Config::find_config_file);

    let config = if let Some(ref path) = config_path {
        Config::load(path)?
    } else {
        Config::default()
    };

    // Handle command
    match cli.command {
        Command::Init { force } => cmd_init(force),
        Command::Serve { bind } => cmd_serve(config, bind).await,
        command => cmd_library(command, &config),
    }
}

/// Library commands.
fn cmd_library(command: Command, config: &Config) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)?;
    let library = Library::new(db, config.export.dir.clone());

    match command {
        Command::Add {
            title,
            cover,
            pdf,
            pages,
            read,
        } => cmd_add(&library, title, cover, pdf, pages, read)?,

        Command::List { status } => {
            let books = library.books(status)?;
            if books.is_empty() {
                println!("No books found.");
            } else {
                println!(
                    "{:<6} {:<40} {:<10} {:>11} {:>6}",
                    "ID", "TITLE", "STATUS", "PAGES", "DONE"
                );
                println!("{}", "-".repeat(77));
                for book in books {
                    println!(
                        "{:<6} {:<40} {:<10} {:>11} {:>5.0}%",
                        book.id,
                        truncate(&book.title, 40),
                        book.status.as_str(),
                        format!("{}/{}", book.pages_read, book.total_pages),
                        progress::progress_percent(book.pages_read, book.total_pages)
                    );
                }
            }
        }

        Command::Show { id } => print_book(&library.book(id)?),

        Command::Progress { id, pages } => {
            let book = library.record_progress_input(id, &pages)?;
            println!(
                "{}: {}/{} pages ({})",
                book.title, book.pages_read, book.total_pages, book.status
            );
        }

        Command::Edit {
            id,
            title,
            pages,
            cover,
            pdf,
            yes,
        } => {
            let current = library.book(id)?;
            let mut details = BookDetails::of(&current);
            if let Some(title) = title {
                details.title = title;
            }
            if let Some(pages) = pages {
                details.total_pages = pages;
            }
            if let Some(cover) = cover {
                details.cover = cover;
            }
            if let Some(pdf) = pdf {
                details.pdf_path = Some(pdf).filter(|p| !p.trim().is_empty());
            }

            let book = match library.edit_book(id, &details, yes) {
                Err(e @ AppError::ConfirmationRequired { .. }) => {
                    println!("{}", e);
                    if !confirm("Reset reading progress to 0? [y/N] ")? {
                        println!("Edit cancelled.");
                        return Ok(());
                    }
                    library.edit_book(id, &details, true)?
                }
                other => other?,
            };
            print_book(&book);
        }

        Command::Delete { id } => {
            if library.remove_book(id)? {
                println!("Deleted book: {}", id);
            } else {
                println!("Book not found: {}", id);
            }
        }

        Command::Stats => {
            let stats = library.statistics()?;
            println!("Books:             {}", stats.total_books);
            println!("Completed:         {}", stats.completed_books);
            println!("Currently reading: {}", stats.currently_reading);
            println!(
                "Pages read:        {} / {} ({:.0}%)",
                stats.total_pages_read,
                stats.total_pages_goal,
                progress::progress_percent(stats.total_pages_read, stats.total_pages_goal)
            );
        }

        Command::Reset { yes, schema } => {
            if !yes
                && !confirm("Delete all books and reading progress? This cannot be undone. [y/N] ")?
            {
                println!("Reset cancelled.");
                return Ok(());
            }
            if schema {
                library.reset_schema()?;
                println!("Recreated the books table.");
            } else {
                let deleted = library.reset()?;
                println!("Deleted {} books.", deleted);
            }
        }

        Command::Export { dir } => {
            let path = match dir {
                Some(dir) => library.export_to(&dir)?,
                None => library.export()?,
            };
            println!("Exported library to: {}", path.display());
        }

        Command::Import { file } => {
            let summary = library.import_file(&file)?;
            println!(
                "Imported {} books (format version {}).",
                summary.imported, summary.version
            );
        }

        Command::Sample => {
            let books = library.seed_samples()?;
            println!("Added {} sample books.", books.len());
        }

        Command::Init { .. } | Command::Serve { .. } => {}
    }

    Ok(())
}

fn init_logging(default_filter: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Initialize config and database.
fn cmd_init(force: bool) -> anyhow::Result<()> {
    let config_path = PathBuf::from("config.toml");

    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    // Write default config
    std::fs::write(&config_path, Config::generate_default())?;
    println!("Created config file: {}", config_path.display());

    let config = Config::default();
    let _db = Database::open(&config.database.path)?;
    println!("Initialized database: {}", config.database.path.display());

    println!("\nAdd your first book with: reading-tracker add \"<title>\" --pages <count>");
    println!("Or try the sample library: reading-tracker sample");

    Ok(())
}

/// Add a book, taking the page count from an attached PDF if needed.
fn cmd_add(
    library: &Library,
    title: String,
    cover: String,
    pdf: Option<PathBuf>,
    pages: Option<i64>,
    read: i64,
) -> anyhow::Result<()> {
    let total_pages = match (pages, &pdf) {
        (Some(pages), _) => pages,
        (None, Some(path)) => {
            let info = pdf::inspect(path)?;
            if info.estimated {
                println!("Estimated {} pages from file size.", info.page_count);
            } else {
                println!("Detected {} pages.", info.page_count);
            }
            i64::from(info.page_count)
        }
        (None, None) => anyhow::bail!("Total pages required: pass --pages or --pdf"),
    };

    let book = library.add_book(NewBook {
        title,
        cover,
        pdf_path: pdf.map(|p| p.to_string_lossy().to_string()),
        total_pages,
        pages_read: read,
        status: None,
    })?;

    println!("Added book {}: {}", book.id, book.title);
    Ok(())
}

/// Start the server.
async fn cmd_serve(mut config: Config, bind: Option<std::net::SocketAddr>) -> anyhow::Result<()> {
    // Override bind address if specified
    if let Some(addr) = bind {
        config.server.bind = addr;
    }

    let db = Database::open(&config.database.path)?;
    let library = Library::new(db, config.export.dir.clone());

    tracing::info!(
        bind = %config.server.bind,
        database = %config.database.path.display(),
        exports = %config.export.dir.display(),
        "Starting reading-tracker server"
    );

    let app = server::create_router(server::AppState::new(library));

    let listener = TcpListener::bind(config.server.bind).await?;
    tracing::info!(address = %config.server.bind, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

fn print_book(book: &Book) {
    println!("#{} {}", book.id, book.title);
    println!(
        "  Progress: {}/{} pages ({:.0}%), {}",
        book.pages_read,
        book.total_pages,
        progress::progress_percent(book.pages_read, book.total_pages),
        book.status
    );
    if !book.cover.is_empty() {
        println!("  Cover:    {}", book.cover);
    }
    if let Some(ref pdf) = book.pdf_path {
        println!("  PDF:      {}", pdf);
    }
    println!("  Added:    {}", book.created_at.format("%Y-%m-%d %H:%M"));
    println!("  Updated:  {}", book.updated_at.format("%Y-%m-%d %H:%M"));
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Ask a yes/no question on stdin.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
