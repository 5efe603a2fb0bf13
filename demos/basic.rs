//! Basic example demonstrating the notebook API client.
//!
//! Run with:
//! ```
//! NOTEBOOK_API_KEY=your-key NOTEBOOK_API_URL=https://notebook.example.com/api/rest/v1.0 \
//!     cargo run --example basic
//! ```

use notebookapi::{
    Entity, EntityListQuery, List, Notebook, NotebookClient, PageParams, Sample, User,
    UserListQuery,
};

#[tokio::main]
async fn main() -> notebookapi::Result<()> {
    // Initialize tracing for debugging (optional)
    tracing_subscriber::fmt::init();

    // Create client from environment variables
    println!("Creating notebook client...");
    let client = NotebookClient::from_env()?;
    println!("Connected to: {}", client.base_url());

    // Walk every notebook; pages are fetched as the loop reaches them
    println!("\n--- Listing Notebooks ---");
    let mut notebooks = Entity::list(&client, &EntityListQuery::of_type(Notebook::TYPE))?;
    while let Some(notebook) = notebooks.try_next().await? {
        println!("  - {} ({})", notebook.name(), notebook.eid());
    }
    println!("Issued {} list requests", notebooks.requests_issued());

    // Stop after the first sample; later pages are never requested
    let mut samples = Entity::list(&client, &EntityListQuery::of_type(Sample::TYPE))?;
    let first_sample = match samples.try_next().await? {
        Some(Entity::Sample(sample)) => Some(sample),
        _ => None,
    };

    // Properties load once, on first access
    if let Some(mut sample) = first_sample {
        println!("\n--- Sample Properties: {} ---", sample.attributes.name);
        for property in sample.properties().iter(&client).await? {
            let read_only = if property.read_only { " (read-only)" } else { "" };
            println!(
                "  {}: {}{}",
                property.name,
                property.display_value(),
                read_only
            );
        }
    }

    // First page of users
    println!("\n--- Users (first page) ---");
    let query = UserListQuery {
        page: PageParams::window(0, 10),
        ..Default::default()
    };
    let users = User::list_page(&client, &query).await?;
    for user in users.iter() {
        println!("  - {} <{}>", user.full_name(), user.email.as_deref().unwrap_or("-"));
    }

    let me = User::me(&client).await?;
    println!("\nAuthenticated as {}", me.user_name);

    Ok(())
}
