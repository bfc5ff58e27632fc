// Command-line entry point for the board client core.
//
// This file's job is to:
// 1. Load configuration
// 2. Wire the configured backend into the services (dependency injection)
// 3. Run one command and print the result

use anyhow::{bail, Context, Result};
use doppelganger_board::config::{AppConfig, BackendConfig};
use doppelganger_board::core::auth::AuthService;
use doppelganger_board::core::avatar::{AvatarPipeline, AvatarService, ObjectStore, PreviewUrl};
use doppelganger_board::core::board::{BoardService, BoardStore, PageRequest};
use doppelganger_board::core::identity::IdentityProvider;
use doppelganger_board::core::moderation::{
    check_content, check_title, ModerationService, ModerationVerdict, ReportStore,
};
use doppelganger_board::core::profile::{ProfileCache, ProfileStore};
use doppelganger_board::infra::memory::{InMemoryObjectStore, StaticIdentity};
use doppelganger_board::infra::sqlite::SqliteBackend;
use doppelganger_board::infra::supabase::SupabaseClient;
use std::path::Path;
use std::sync::Arc;

const USAGE: &str = "\
usage: doppelganger <command> [args]

  check-content <text>           run the post body filter
  check-title <text>             run the title filter
  avatar <input> <output>        normalize an image to a 200x200 avatar
  upload-avatar <input>          normalize and store as the current user's avatar
  report <post_id> <reason>      report a post
  post <thread_id> <content>     reply to a thread
  like <post_id>                 toggle a like
  threads <board_id> [page]      list threads on a board";

/// The collaborators every service is built from.
struct Backend {
    identity: Arc<dyn IdentityProvider>,
    reports: Arc<dyn ReportStore>,
    profiles: Arc<dyn ProfileStore>,
    boards: Arc<dyn BoardStore>,
    objects: Arc<dyn ObjectStore>,
    cache: Arc<ProfileCache>,
}

async fn connect(config: &AppConfig) -> Result<Backend> {
    let cache = Arc::new(ProfileCache::new());

    match &config.backend {
        BackendConfig::Supabase {
            url,
            anon_key,
            credentials,
        } => {
            let client = Arc::new(
                SupabaseClient::new(url, anon_key).context("Failed to create backend client")?,
            );

            if let Some((email, password)) = credentials {
                let auth = AuthService::new(
                    Arc::clone(&client),
                    Arc::clone(&client),
                    Arc::clone(&cache),
                );
                auth.sign_in(email, password)
                    .await
                    .context("Sign-in failed")?;
            }

            Ok(Backend {
                identity: client.clone(),
                reports: client.clone(),
                profiles: client.clone(),
                boards: client.clone(),
                objects: client,
                cache,
            })
        }
        BackendConfig::Sqlite {
            database_path,
            local_user,
        } => {
            let db = Arc::new(
                SqliteBackend::new(database_path)
                    .await
                    .with_context(|| format!("Failed to open {}", database_path))?,
            );

            // The local user needs a profile row for avatar and profile writes.
            if let Err(e) = db.create_profile(local_user).await {
                if !e.is_conflict() {
                    return Err(e).context("Failed to create local profile");
                }
            }

            Ok(Backend {
                identity: Arc::new(StaticIdentity::signed_in(local_user.clone())),
                reports: db.clone(),
                profiles: db.clone(),
                boards: db,
                objects: Arc::new(InMemoryObjectStore::new("memory://objects")),
                cache,
            })
        }
    }
}

fn print_verdict(verdict: ModerationVerdict) {
    match verdict.reason() {
        None => println!("accepted"),
        Some(reason) => println!("rejected: {}", reason),
    }
}

fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        _ => "application/octet-stream",
    }
}

fn parse_id(value: &str, what: &str) -> Result<i64> {
    value
        .parse()
        .with_context(|| format!("{} must be a number, got {:?}", what, value))
}

async fn run(args: &[String], config: &AppConfig) -> Result<()> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    // Offline commands first; they never touch a backend.
    match args.as_slice() {
        ["check-content", text] => {
            print_verdict(check_content(Some(*text)));
            return Ok(());
        }
        ["check-title", text] => {
            print_verdict(check_title(Some(*text)));
            return Ok(());
        }
        ["avatar", input, output] => {
            let input = Path::new(input);
            let bytes =
                std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
            let pipeline = AvatarPipeline::with_default_codec();
            let blob = pipeline.process_image(&bytes, mime_from_path(input), bytes.len() as u64)?;
            println!(
                "{} q={} {} bytes (preview {} chars)",
                blob.mime_type(),
                blob.quality.percent(),
                blob.size_bytes(),
                PreviewUrl::from_blob(&blob).as_str().len()
            );
            std::fs::write(output, &blob.bytes)
                .with_context(|| format!("Failed to write {}", output))?;
            return Ok(());
        }
        _ => {}
    }

    let backend = connect(config).await?;

    match args.as_slice() {
        ["upload-avatar", input] => {
            let input = Path::new(input);
            let bytes =
                std::fs::read(input).with_context(|| format!("Failed to read {:?}", input))?;
            let service = AvatarService::new(
                backend.identity,
                backend.objects,
                backend.profiles,
                AvatarPipeline::with_default_codec(),
                backend.cache,
                config.avatar_bucket.clone(),
            );
            let url = service
                .process_and_upload(&bytes, mime_from_path(input), bytes.len() as u64)
                .await?;
            println!("{}", url);
        }
        ["report", post_id, reason] => {
            let post_id = parse_id(post_id, "post_id")?;
            let service = ModerationService::new(backend.identity, backend.reports);
            service.submit_report(post_id, reason).await?;
            println!("reported post {}", post_id);
        }
        ["post", thread_id, content] => {
            let thread_id = parse_id(thread_id, "thread_id")?;
            let service = BoardService::new(backend.identity, backend.boards);
            let post = service.create_post(thread_id, content).await?;
            println!("created post {}", post.id);
        }
        ["like", post_id] => {
            let post_id = parse_id(post_id, "post_id")?;
            let service = BoardService::new(backend.identity, backend.boards);
            let liked = service.toggle_like(post_id).await?;
            println!("{}", if liked { "liked" } else { "unliked" });
        }
        ["threads", board_id, rest @ ..] => {
            let board_id = parse_id(board_id, "board_id")?;
            let page = match rest {
                [] => PageRequest::THREADS,
                [page] => PageRequest::new(
                    page.parse().context("page must be a number")?,
                    PageRequest::THREADS.limit(),
                ),
                _ => bail!("{}", USAGE),
            };
            let service = BoardService::new(backend.identity, backend.boards);
            let threads = service.list_threads(board_id, page).await?;
            for thread in &threads.items {
                let pin = if thread.is_pinned { "📌 " } else { "" };
                println!("{:>6}  {}{} ({})", thread.id, pin, thread.title, thread.reply_count);
            }
            if let Some(total) = threads.total {
                println!("{} threads total", total);
            }
        }
        _ => bail!("{}", USAGE),
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let args: Vec<String> = std::env::args().skip(1).collect();

    run(&args, &config).await
}
