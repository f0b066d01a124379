//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a content tree database (file path argument, or in memory).
//! - Seed a sample tree when empty and print its outline and stats.
//!
//! Set `CONTENT_TREE_LOG_DIR` to an absolute directory to enable file logging.

use content_tree_core::db::{open_db, open_db_in_memory};
use content_tree_core::{
    core_version, default_log_level, init_logging, ContentNode, ContentTreeService, NewNode,
    NodeRef, SqliteDocumentStore,
};
use std::error::Error;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("content_tree error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    if let Ok(log_dir) = std::env::var("CONTENT_TREE_LOG_DIR") {
        init_logging(default_log_level(), &log_dir)?;
    }

    let conn = match std::env::args().nth(1) {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let service = ContentTreeService::new(SqliteDocumentStore::try_new(conn)?);

    let mut tree = service.get_content_tree().await?;
    if tree.is_empty() {
        seed_sample(&service).await?;
        log::info!("event=cli_seed module=cli status=ok");
        tree = service.get_content_tree().await?;
    }

    println!("content_tree_core version={}", core_version());
    for category in &tree {
        print_node(category, 0);
    }
    let stats = service.get_content_stats().await?;
    println!(
        "categories={} topics={} content={}",
        stats.total_categories, stats.total_topics, stats.total_content
    );
    Ok(())
}

async fn seed_sample(service: &ContentTreeService<SqliteDocumentStore>) -> CliResult<()> {
    let layout = &service.config().layout;
    let math = service
        .create_root_category(NewNode::titled("Mathematics"))
        .await?;
    let math_path = NodeRef::category(math.as_str()).encode(layout);
    for (order, topic) in ["Algebra", "Geometry"].into_iter().enumerate() {
        let topic_id = service
            .create_child(
                &math,
                NewNode::titled(topic).with_order(order as f64),
                &math_path,
            )
            .await?;
        service
            .create_child(
                &topic_id,
                NewNode::titled(format!("{topic} basics"))
                    .with_content(format!("First steps in {topic}.")),
                &NodeRef::topic(math.as_str(), topic_id.as_str()).encode(layout),
            )
            .await?;
    }
    Ok(())
}

fn print_node(node: &ContentNode, depth: usize) {
    println!("{}- {} ({})", "  ".repeat(depth), node.title, node.id());
    for child in node.children.iter().flatten() {
        print_node(child, depth + 1);
    }
}
