use flowai::Client;
use flowai_tools::ToolRegistry;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = std::env::var("EXA_API_KEY")?;

    let mut registry = ToolRegistry::new();
    flowai::flowai_tools_exa::install(&mut registry)?;
    let client = Client::new(registry)?;

    let outcome = client
        .run(
            "exa_find_similar_links",
            &json!({
                "url": "https://news.ycombinator.com",
                "numResults": 5,
                "text": true,
                "apiKey": api_key,
            }),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&outcome.output)?);
    Ok(())
}
