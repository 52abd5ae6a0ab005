use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use datewatch::connectivity::AssumeOnline;
use datewatch::db::repository;
use datewatch::lms::{LmsConfig, LmsHttpClient};
use datewatch::models::DueDateSection;
use datewatch::routing::LogRouter;
use datewatch::services::{DatesController, UiMessage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "datewatch=debug".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://datewatch.db?mode=rwc".to_string());

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    repository::init_schema(&pool).await?;

    let config = LmsConfig::new_from_env()?;
    let username = config.username.clone();
    let api = Arc::new(LmsHttpClient::new(config)?);

    let controller = DatesController::new(
        pool,
        api,
        Arc::new(AssumeOnline),
        Arc::new(LogRouter),
        username.clone(),
    );

    let mut messages = controller
        .take_messages()
        .ok_or("UI message stream already taken")?;
    tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            match message {
                UiMessage::NoConnection => warn!("no network connection"),
                UiMessage::UnknownError => warn!("something went wrong"),
                UiMessage::DueDatesShifted { courses } => {
                    info!("due dates shifted for {} courses", courses)
                }
            }
        }
    });

    info!("loading due dates for {}", username);
    controller.start().await;
    controller.wait_for_fetch().await;
    while controller.state().can_load_more {
        controller.fetch_more().await;
        controller.wait_for_fetch().await;
    }

    let state = controller.state();
    if state.sections.is_empty() {
        println!("No upcoming due dates.");
        return Ok(());
    }

    for (section, records) in &state.sections {
        println!("{} ({})", section_title(*section), records.len());
        for record in records {
            println!(
                "  {}  {}  [{}]",
                record.due_at.format("%Y-%m-%d %H:%M"),
                record.title,
                record.course_name
            );
        }
    }

    Ok(())
}

fn section_title(section: DueDateSection) -> &'static str {
    match section {
        DueDateSection::PastDue => "Past due",
        DueDateSection::Today => "Today",
        DueDateSection::ThisWeek => "This week",
        DueDateSection::NextWeek => "Next week",
        DueDateSection::Upcoming => "Upcoming",
        DueDateSection::Completed => "Completed",
    }
}
