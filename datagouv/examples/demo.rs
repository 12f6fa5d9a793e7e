use datagouv::DataGouvClient;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    println!("data.gouv.fr Rust Client Demo");
    println!("=============================\n");

    let client = DataGouvClient::new()?;

    // 1. Search for datasets
    println!("Searching for 'qualité de l'air' datasets...");
    let page = client
        .catalog()
        .search_datasets("qualité de l'air", 1, 5, None)
        .await?;
    println!("Found {} results:\n", page.total);

    for (i, dataset) in page.data.iter().enumerate() {
        println!("{}. {} ({})", i + 1, dataset.title, dataset.id);
        println!("   {} resources, {}", dataset.resources_count, dataset.url);
    }
    println!();

    // 2. Preview the first parseable resource of the first dataset
    let Some(first) = page.data.first() else {
        return Ok(());
    };
    let details = client.catalog().get_dataset_details(&first.id, None).await?;
    for resource in &details.resources {
        match client.download_and_parse(&resource.id, 5).await {
            Ok(parsed) => {
                println!(
                    "Preview of {} ({}, {} rows):",
                    resource.title.as_deref().unwrap_or(&resource.id),
                    parsed.format,
                    parsed.table.total_rows
                );
                println!("  columns: {}", parsed.table.columns.join(", "));
                break;
            }
            Err(e) => println!("Skipping {}: {}", resource.id, e),
        }
    }

    Ok(())
}
