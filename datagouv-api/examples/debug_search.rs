use datagouv_api::{CatalogClient, Configuration};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Arc::new(Configuration::from_env().with_user_agent("debug-test/1.0"));
    println!("Environment: {}", config.environment);

    let client = CatalogClient::new(config);

    println!("Testing basic search...");

    match client.search_datasets("climat", 1, 1, None).await {
        Ok(result) => {
            println!("Success! Total: {}", result.total);
            println!("Results length: {}", result.data.len());

            if let Some(first) = result.data.first() {
                println!("First result title: {:?}", first.title);
                println!("First result tags: {:?}", first.tags);
            }
        }
        Err(e) => {
            println!("Error: {}", e);
            if let Some(status) = e.status() {
                println!("Status: {}", status);
            }
        }
    }

    Ok(())
}
