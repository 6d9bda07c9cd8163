//! Command-line client for the artfeed backend
//!
//! Every command prints JSON on stdout; logs go to stderr. The access token
//! of the last sign in is kept in the session file so later commands run as
//! that user.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use artfeed_core::common::{AppError, CommentId, PostId, UserId};
use artfeed_core::config::Config;
use artfeed_core::domains::auth::{session_file, AuthContext, AuthState, StoredSession};
use artfeed_core::domains::comments::activities::{
    add_comment, delete_comment, fetch_comments, update_comment,
};
use artfeed_core::domains::images::activities::{download_image, generate_filename, generate_image};
use artfeed_core::domains::images::{GenerationOptions, ImageQuality, ImageSize, ImageStyle};
use artfeed_core::domains::likes::activities::toggle_like;
use artfeed_core::domains::posts::activities::{
    fetch_dashboard, fetch_global_feed, fetch_news, fetch_user_posts, generate_and_save_post,
    save_image_post,
};
use artfeed_core::domains::profiles::activities::fetch_profile;
use artfeed_core::domains::storage::activities::{
    check_storage, create_images_bucket, test_bucket_access,
};
use artfeed_core::kernel::AppDeps;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "artfeed")]
#[command(about = "Generate, share and browse AI images")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account (signs in when no email confirmation is needed)
    Signup { email: String, password: String },

    /// Sign in and remember the session
    Login { email: String, password: String },

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Generate an image without publishing it
    Generate {
        prompt: String,
        #[command(flatten)]
        options: OptionArgs,
        /// Write the PNG here
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Generate an image and publish it as a post
    Create {
        prompt: String,
        #[arg(long)]
        caption: Option<String>,
        #[command(flatten)]
        options: OptionArgs,
        /// Publish this PNG instead of generating one
        #[arg(long)]
        image: Option<PathBuf>,
    },

    /// Newest posts from everyone
    Feed {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// The ten newest posts
    News,

    /// A profile and its posts (your own by default)
    Profile { user_id: Option<UserId> },

    /// Your profile, latest posts and stats
    Home,

    Like { post_id: PostId },

    Unlike { post_id: PostId },

    /// Comments on a post, oldest first
    Comments { post_id: PostId },

    #[command(subcommand)]
    Comment(CommentCommands),

    /// Save a posted image locally
    Download {
        url: String,
        /// Prompt used to name the file
        #[arg(long)]
        prompt: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    #[command(subcommand)]
    Storage(StorageCommands),
}

#[derive(Subcommand)]
enum CommentCommands {
    Add { post_id: PostId, content: String },
    Edit { comment_id: CommentId, content: String },
    Delete { comment_id: CommentId },
}

#[derive(Subcommand)]
enum StorageCommands {
    /// List buckets and check the images bucket
    Check,
    /// Create the images bucket
    CreateBucket,
    /// Upload and remove a test file as the signed-in user
    Test,
}

#[derive(Args)]
struct OptionArgs {
    #[arg(long, default_value_t = ImageSize::Square)]
    size: ImageSize,
    #[arg(long, default_value_t = ImageQuality::Standard)]
    quality: ImageQuality,
    #[arg(long, default_value_t = ImageStyle::Vivid)]
    style: ImageStyle,
}

impl From<OptionArgs> for GenerationOptions {
    fn from(args: OptionArgs) -> Self {
        Self {
            size: args.size,
            quality: args.quality,
            style: args.style,
        }
    }
}

// ============================================================================
// Output
// ============================================================================

fn output<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn output_error(err: &AppError) -> Result<()> {
    output(&json!({
        "success": false,
        "error": err.kind(),
        "message": err.to_string(),
    }))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,artfeed_core=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let result = async { App::connect().await?.run(cli.command).await }.await;

    if let Err(err) = result {
        match err.downcast_ref::<AppError>() {
            Some(app_err) => {
                output_error(app_err)?;
                std::process::exit(1);
            }
            None => return Err(err),
        }
    }
    Ok(())
}

struct App {
    config: Config,
    deps: AppDeps,
    auth: AuthContext,
}

impl App {
    async fn connect() -> Result<Self> {
        let config = Config::from_env()?;
        let deps = AppDeps::from_config(&config);
        let auth = AuthContext::init(deps.identity.clone());

        // A restore error leaves the file alone; the tokens may still be good.
        let stored = session_file::load(&config.session_file).await?;
        match auth.restore(stored.as_ref()).await? {
            AuthState::SignedIn(session) => {
                if stored.as_ref() != Some(&StoredSession::from(&session)) {
                    session_file::save(&config.session_file, &session).await?;
                }
            }
            _ if stored.is_some() => session_file::forget(&config.session_file).await?,
            _ => {}
        }

        Ok(Self { config, deps, auth })
    }

    async fn run(&self, command: Commands) -> Result<()> {
        let (deps, auth) = (&self.deps, &self.auth);

        match command {
            Commands::Signup { email, password } => {
                let session = auth.sign_up(&email, &password).await?;
                if let Some(session) = &session {
                    session_file::save(&self.config.session_file, session).await?;
                }
                output(&json!({
                    "success": true,
                    "signed_in": session.is_some(),
                    "user": session.map(|s| s.user),
                }))
            }
            Commands::Login { email, password } => {
                let session = auth.sign_in(&email, &password).await?;
                session_file::save(&self.config.session_file, &session).await?;
                output(&json!({"success": true, "user": session.user}))
            }
            Commands::Logout => {
                auth.sign_out().await?;
                session_file::forget(&self.config.session_file).await?;
                output(&json!({"success": true}))
            }
            Commands::Whoami => output(&json!({"user": auth.user()})),
            Commands::Generate {
                prompt,
                options,
                out,
            } => {
                let image = generate_image(&prompt, options.into(), auth, deps).await?;
                let bytes = image.decode()?;
                if let Some(path) = &out {
                    write_file(path, &bytes).await?;
                }
                output(&json!({
                    "prompt": image.prompt,
                    "options": image.options,
                    "bytes": bytes.len(),
                    "saved_to": out,
                }))
            }
            Commands::Create {
                prompt,
                caption,
                options,
                image,
            } => {
                let post = match image {
                    Some(path) => {
                        let raw = tokio::fs::read(&path)
                            .await
                            .with_context(|| format!("Failed to read {}", path.display()))?;
                        save_image_post(&STANDARD.encode(raw), &prompt, caption.as_deref(), auth, deps)
                            .await?
                    }
                    None => {
                        generate_and_save_post(
                            &prompt,
                            options.into(),
                            caption.as_deref(),
                            auth,
                            deps,
                        )
                        .await?
                    }
                };
                output(&post)
            }
            Commands::Feed { limit } => output(&fetch_global_feed(limit, deps).await?),
            Commands::News => output(&fetch_news(deps).await?),
            Commands::Profile { user_id } => {
                let user_id = match user_id {
                    Some(id) => id,
                    None => auth.require_user_id()?,
                };
                let profile = fetch_profile(user_id, deps).await?;
                let posts = fetch_user_posts(user_id, None, deps).await?;
                output(&json!({"profile": profile, "posts": posts}))
            }
            Commands::Home => output(&fetch_dashboard(auth, deps).await?),
            Commands::Like { post_id } => {
                let liked = toggle_like(post_id, false, auth, deps).await?;
                output(&json!({"post_id": post_id, "liked": liked}))
            }
            Commands::Unlike { post_id } => {
                let liked = toggle_like(post_id, true, auth, deps).await?;
                output(&json!({"post_id": post_id, "liked": liked}))
            }
            Commands::Comments { post_id } => output(&fetch_comments(post_id, deps).await),
            Commands::Comment(CommentCommands::Add { post_id, content }) => {
                output(&add_comment(post_id, &content, auth, deps).await?)
            }
            Commands::Comment(CommentCommands::Edit {
                comment_id,
                content,
            }) => output(&update_comment(comment_id, &content, auth, deps).await?),
            Commands::Comment(CommentCommands::Delete { comment_id }) => {
                let removed = delete_comment(comment_id, auth, deps).await?;
                output(&json!({"comment_id": comment_id, "removed": removed}))
            }
            Commands::Download { url, prompt, out } => {
                let bytes = download_image(&url).await?;
                let path = out.unwrap_or_else(|| {
                    generate_filename(prompt.as_deref().unwrap_or("image"), "png").into()
                });
                write_file(&path, &bytes).await?;
                output(&json!({"saved_to": path, "bytes": bytes.len()}))
            }
            Commands::Storage(StorageCommands::Check) => output(&check_storage(deps).await),
            Commands::Storage(StorageCommands::CreateBucket) => {
                output(&create_images_bucket(deps).await?)
            }
            Commands::Storage(StorageCommands::Test) => {
                output(&test_bucket_access(auth, deps).await?)
            }
        }
    }
}

// ============================================================================
// Files
// ============================================================================

async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
