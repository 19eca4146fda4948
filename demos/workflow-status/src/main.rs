use flowai_client::WorkflowClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let workflow_id = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demo-workflow".to_string());

    let client = WorkflowClient::from_env()?;
    let deployed = client.validate_workflow(&workflow_id).await;

    println!("workflow {workflow_id} deployed: {deployed}");
    Ok(())
}
